//! Top-level application state.
//!
//! `AppState` owns the [`EffectEngine`] and the most recent detector frame.
//! It applies [`SourceEvent`]s as they arrive and steps the engine exactly
//! once per window frame with the newest hands.

use std::sync::mpsc::{self, Receiver, TryRecvError};

use tracing::{info, warn};

use handfx::landmark::{DetectorFrame, Handedness, Surface};
use handfx::{EffectConfig, EffectEngine, FrameReport, FusionEvent, Mode};

use crate::error::ViewError;
use crate::source::{spawn_landmark_source, SimHandSource, SimInput, SourceEvent};
use crate::visualizer::Visualizer;

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    pub effect: EffectConfig,
    /// Fixed RNG seed; `None` seeds from the OS.
    pub seed:   Option<u64>,
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    engine:      EffectEngine,
    latest:      DetectorFrame,
    explosions:  u32,
    pub status:  String,
}

impl AppState {
    pub fn new(cfg: AppConfig) -> Self {
        let engine = match cfg.seed {
            Some(seed) => EffectEngine::with_seed(cfg.effect, seed),
            None       => EffectEngine::new(cfg.effect),
        };
        let status = format!("Ready  mode: {}", engine.mode().name());
        AppState { engine, latest: DetectorFrame::empty(), explosions: 0, status }
    }

    /// Apply one source event.  Returns false on `Quit`.
    pub fn handle_event(&mut self, event: SourceEvent) -> bool {
        match event {
            SourceEvent::Frame(frame) => self.latest = frame,
            SourceEvent::Mode(mode)   => {
                self.engine.set_mode(mode);
                info!(mode = mode.name(), "mode selected");
            }
            SourceEvent::Clear        => self.engine.clear(),
            SourceEvent::Quit         => return false,
        }
        true
    }

    /// Drain everything queued on `rx`.  Returns false on `Quit` or when the
    /// source hung up.
    ///
    /// With `frames` false only control events are applied and hand frames
    /// are dropped, so a control-only source never overwrites real hands.
    pub fn drain(&mut self, rx: &Receiver<SourceEvent>, frames: bool) -> bool {
        loop {
            match rx.try_recv() {
                Ok(SourceEvent::Frame(_)) if !frames => {}
                Ok(evt) => {
                    if !self.handle_event(evt) { return false; }
                }
                Err(TryRecvError::Empty)        => return true,
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }

    // ── Per-frame tick ────────────────────────────────────────────────────

    pub fn tick(&mut self, surface: Surface) -> FrameReport {
        let report = self.engine.step(&self.latest, surface);
        if let FusionEvent::Exploded(ball) = report.fusion {
            self.explosions += 1;
            info!(size = ball.size, total = self.explosions, "explosion");
        }
        self.status = self.describe(&report);
        report
    }

    fn describe(&self, report: &FrameReport) -> String {
        let hand = |side: Handedness| match report.hand(side) {
            Some(f) => format!("{:.2}{}", f.intensity, if f.pinch { "p" } else { "" }),
            None    => "-".to_string(),
        };
        let orb = match report.fusion {
            FusionEvent::Holding(b)  => format!("  orb {:.0}", b.size),
            FusionEvent::Touching    => "  touch".to_string(),
            _                        => String::new(),
        };
        let bolts = if self.engine.mode() == Mode::Lightning {
            format!("  bolts {}  charge {:.2}", self.engine.bolts().len(), self.engine.lightning_intensity())
        } else {
            String::new()
        };
        format!(
            "{}  L {}  R {}  particles {}{}{}",
            self.engine.mode().name(),
            hand(Handedness::Left),
            hand(Handedness::Right),
            self.engine.particles().len(),
            orb,
            bolts,
        )
    }

    pub fn engine(&self) -> &EffectEngine { &self.engine }
    pub fn explosions(&self) -> u32 { self.explosions }
}

// ════════════════════════════════════════════════════════════════════════════
// run() — the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the viewer until the window closes or `Q` is pressed.
///
/// Landmarks come from the keyboard/mouse simulator, or from LeapMotion
/// hardware when built with `--features leap`.  The simulator is always
/// wired so mode and clear keys keep working; with hardware attached its
/// synthetic hands are ignored.
pub fn run(cfg: AppConfig) -> Result<(), ViewError> {
    // ── Sim input channel ─────────────────────────────────────────────────
    let (sim_tx, sim_rx) = mpsc::channel::<SimInput>();
    let sim_events = spawn_landmark_source(SimHandSource::new(sim_rx));

    #[cfg(feature = "leap")]
    let hw_events = Some(spawn_landmark_source(crate::source::LeapLandmarkSource));
    #[cfg(not(feature = "leap"))]
    let hw_events: Option<Receiver<SourceEvent>> = None;

    // ── Window ────────────────────────────────────────────────────────────
    let mut vis = Visualizer::new(sim_tx)?;
    let mut app = AppState::new(cfg);

    // ── Main loop ─────────────────────────────────────────────────────────
    while vis.is_open() {
        if !vis.poll_input() { break; }

        if !app.drain(&sim_events, hw_events.is_none()) { break; }
        if let Some(rx) = &hw_events {
            if !app.drain(rx, true) {
                warn!("hardware source stopped");
                return Err(ViewError::SourceGone);
            }
        }

        let (w, h) = vis.surface_size();
        app.tick(Surface::new(w, h));
        vis.set_status(app.status.clone());
        app.engine().render(&mut vis);
    }

    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SimHands;
    use handfx::pose::Pose;

    fn make_app() -> AppState {
        AppState::new(AppConfig { seed: Some(7), ..AppConfig::default() })
    }

    fn surface() -> Surface { Surface::new(960.0, 510.0) }

    fn hands(pose: Pose, x: f32) -> SourceEvent {
        SourceEvent::Frame(SimHands { pose, x, ..SimHands::default() }.frame())
    }

    #[test]
    fn mode_event_switches_engine() {
        let mut app = make_app();
        assert!(app.handle_event(SourceEvent::Mode(Mode::Lightning)));
        assert_eq!(app.engine().mode(), Mode::Lightning);
    }

    #[test]
    fn quit_event_stops() {
        let mut app = make_app();
        assert!(!app.handle_event(SourceEvent::Quit));
    }

    #[test]
    fn latest_frame_is_reused_between_events() {
        let mut app = make_app();
        app.handle_event(hands(Pose::Open, 0.8));
        for _ in 0..10 { app.tick(surface()); }
        assert!(app.engine().hand_state(Handedness::Right).intensity() > 0.4);
        assert!(!app.engine().particles().is_empty());
    }

    #[test]
    fn clear_event_empties_particles() {
        let mut app = make_app();
        app.handle_event(hands(Pose::Open, 0.8));
        for _ in 0..10 { app.tick(surface()); }
        app.handle_event(SourceEvent::Clear);
        assert!(app.engine().particles().is_empty());
    }

    #[test]
    fn sim_hands_can_fuse_and_explode() {
        let mut app = make_app();
        // Pointer at the centre: mirrored hands overlap.
        app.handle_event(hands(Pose::Open, 0.5));
        app.tick(surface());
        assert!(app.engine().proximity().is_touching());

        app.handle_event(hands(Pose::Open, 0.7));
        app.tick(surface());
        assert!(app.engine().ball().is_some());

        app.handle_event(hands(Pose::Fist, 0.7));
        app.tick(surface());
        assert_eq!(app.explosions(), 1);
        assert!(app.engine().ball().is_none());
    }

    #[test]
    fn status_names_mode_and_hands() {
        let mut app = make_app();
        app.handle_event(hands(Pose::Open, 0.8));
        app.tick(surface());
        assert!(app.status.starts_with("fire & ice"));
        assert!(app.status.contains("particles"));
    }

    #[test]
    fn drain_stops_on_disconnect() {
        let mut app = make_app();
        let (tx, rx) = mpsc::channel();
        tx.send(SourceEvent::Mode(Mode::RedBlue)).unwrap();
        assert!(app.drain(&rx, true));
        assert_eq!(app.engine().mode(), Mode::RedBlue);
        drop(tx);
        assert!(!app.drain(&rx, true));
    }

    #[test]
    fn hardware_hands_are_not_replaced_by_sim_hands() {
        let mut app = make_app();
        let (sim_tx, sim_rx) = mpsc::channel();
        let (hw_tx, hw_rx) = mpsc::channel();
        let right_only = SimHands { pose: Pose::Open, left: false, ..SimHands::default() };

        sim_tx.send(hands(Pose::Open, 0.5)).unwrap();
        sim_tx.send(SourceEvent::Mode(Mode::RedBlue)).unwrap();
        hw_tx.send(SourceEvent::Frame(right_only.frame())).unwrap();
        assert!(app.drain(&sim_rx, false));
        assert!(app.drain(&hw_rx, true));
        let r = app.tick(surface());
        assert!(r.hand(Handedness::Right).is_some());
        assert!(r.hand(Handedness::Left).is_none());
        assert_eq!(app.engine().mode(), Mode::RedBlue);

        // No hardware frame this tick: the last real frame stays in place.
        sim_tx.send(hands(Pose::Open, 0.5)).unwrap();
        assert!(app.drain(&sim_rx, false));
        assert!(app.drain(&hw_rx, true));
        let r = app.tick(surface());
        assert!(r.hand(Handedness::Right).is_some());
        assert!(r.hand(Handedness::Left).is_none());
        assert!(!app.engine().proximity().is_touching());
    }
}
