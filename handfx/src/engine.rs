//! The per-frame simulation context.
//!
//! [`EffectEngine`] owns every piece of mutable effect state: both hands'
//! trackers, the proximity machine, lightning intensity, and the live
//! particle / bolt / ring collections.  One call to [`EffectEngine::step`]
//! runs a whole frame:
//!
//! ```text
//!   adapt → slot by handedness → observe / miss (tracker)
//!         → lightning intensity → fusion (may explode)
//!         → flash + bolts → glows, trails, ambient spawns
//!         → integrate + cull → particle cap
//! ```
//!
//! Randomness comes from two seeded streams: `jitter` for every visual
//! draw and `family` for explosion family selection only.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace};

use crate::config::{EffectConfig, Mode};
use crate::fusion::{explode, pulse_factor, FusionEvent, PairReading, ProximityState};
use crate::landmark::{
    adapt, DetectorFrame, Handedness, HandLandmarks, Surface, TrackedHand, FINGERTIPS,
    HAND_CONNECTIONS,
};
use crate::lightning::{LightningBolt, LightningState};
use crate::particle::{spawn_ambient, spawn_trail, ExplosionBurst, Family, Particle};
use crate::render::{EffectRenderer, FusionBallView, Glow, HandView, RenderFrame};
use crate::tracker::{HandFrame, HandState};

/// What happened during one [`EffectEngine::step`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameReport {
    /// Indexed by [`Handedness::index`]; `None` when that hand was absent.
    pub hands:   [Option<HandFrame>; 2],
    pub fusion:  FusionEvent,
    pub flash:   Option<f32>,
    /// Particles created this frame, burst included.
    pub spawned: usize,
}

impl FrameReport {
    pub fn hand(&self, side: Handedness) -> Option<&HandFrame> {
        self.hands[side.index()].as_ref()
    }
}

pub struct EffectEngine {
    cfg:       EffectConfig,
    mode:      Mode,
    jitter:    ChaCha8Rng,
    family:    ChaCha8Rng,

    hands:     [HandState; 2],
    present:   [Option<TrackedHand>; 2],
    proximity: ProximityState,
    lightning: LightningState,

    particles: Vec<Particle>,
    bolts:     Vec<LightningBolt>,
    bursts:    Vec<ExplosionBurst>,
    glows:     Vec<Glow>,
    flash:     Option<f32>,

    surface:   Surface,
    frame:     u64,
}

impl EffectEngine {
    /// Engine seeded from OS entropy.
    pub fn new(cfg: EffectConfig) -> Self {
        let jitter = ChaCha8Rng::from_entropy();
        let mut family = ChaCha8Rng::from_entropy();
        family.set_stream(1);
        Self::with_rngs(cfg, jitter, family)
    }

    /// Reproducible engine: the same seed and inputs give the same frames.
    pub fn with_seed(cfg: EffectConfig, seed: u64) -> Self {
        let jitter = ChaCha8Rng::seed_from_u64(seed);
        let mut family = ChaCha8Rng::seed_from_u64(seed);
        family.set_stream(1);
        Self::with_rngs(cfg, jitter, family)
    }

    fn with_rngs(cfg: EffectConfig, jitter: ChaCha8Rng, family: ChaCha8Rng) -> Self {
        EffectEngine {
            mode:      cfg.mode,
            jitter,
            family,
            hands:     Default::default(),
            present:   [None, None],
            proximity: ProximityState::default(),
            lightning: LightningState::default(),
            particles: Vec::new(),
            bolts:     Vec::new(),
            bursts:    Vec::new(),
            glows:     Vec::new(),
            flash:     None,
            surface:   Surface::new(1.0, 1.0),
            frame:     0,
            cfg,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn config(&self) -> &EffectConfig { &self.cfg }
    pub fn mode(&self) -> Mode { self.mode }
    pub fn frame(&self) -> u64 { self.frame }
    pub fn elapsed_ms(&self) -> f32 { self.frame as f32 * self.cfg.frame_ms }

    pub fn hand_state(&self, side: Handedness) -> &HandState { &self.hands[side.index()] }
    pub fn proximity(&self) -> &ProximityState { &self.proximity }
    pub fn lightning_intensity(&self) -> f32 { self.lightning.intensity() }

    pub fn particles(&self) -> &[Particle] { &self.particles }
    pub fn bolts(&self) -> &[LightningBolt] { &self.bolts }
    pub fn bursts(&self) -> &[ExplosionBurst] { &self.bursts }
    pub fn glows(&self) -> &[Glow] { &self.glows }
    pub fn flash(&self) -> Option<f32> { self.flash }

    pub fn ball(&self) -> Option<FusionBallView> {
        let pulse = pulse_factor(self.elapsed_ms(), &self.cfg.fusion);
        self.proximity
            .ball()
            .map(|b| FusionBallView { position: b.position, size: b.size, pulse })
    }

    // ── Control ───────────────────────────────────────────────────────────

    /// Switch modes.  Live particles keep decaying under their own rules;
    /// lightning intensity drains on its own outside lightning mode.
    pub fn set_mode(&mut self, mode: Mode) {
        if mode != self.mode {
            debug!(from = self.mode.name(), to = mode.name(), "mode switch");
            self.mode = mode;
        }
    }

    /// Drop every live particle, bolt and ring.  Hand state is kept.
    pub fn clear(&mut self) {
        self.particles.clear();
        self.bolts.clear();
        self.bursts.clear();
        self.glows.clear();
        self.flash = None;
    }

    // ── Frame ─────────────────────────────────────────────────────────────

    /// Run one frame from raw detector output.
    pub fn step(&mut self, input: &DetectorFrame, surface: Surface) -> FrameReport {
        let hands = adapt(input);
        self.step_hands(&hands, surface)
    }

    /// Run one frame from already-adapted hands.
    pub fn step_hands(&mut self, hands: &[TrackedHand], surface: Surface) -> FrameReport {
        let surface = if self.cfg.mirror_x { surface.mirrored(true) } else { surface };
        let slots = assign_slots(hands);
        let paired = self.mode.is_paired();

        // Tracker
        let mut frames: [Option<HandFrame>; 2] = [None, None];
        for (i, slot) in slots.iter().enumerate() {
            match slot {
                Some(hand) => {
                    frames[i] = Some(self.hands[i].observe(
                        &hand.landmarks,
                        &self.cfg.classifier,
                        &self.cfg.tracker,
                        paired,
                    ));
                }
                None => {
                    if self.hands[i].miss(self.cfg.tracker.hand_grace_frames) {
                        debug!(hand = Handedness::from_index(i).label(), "hand lost, state reset");
                    }
                }
            }
        }

        let any_open = frames.iter().flatten().any(HandFrame::open);
        self.lightning.update(self.mode == Mode::Lightning, any_open, &self.cfg.lightning);

        let mut spawned = 0;
        let fusion = self.step_fusion(hands.len(), &slots, &frames, &surface, &mut spawned);

        // Lightning
        self.flash = self.lightning.roll_flash(&mut self.jitter, &self.cfg.lightning);
        if self.lightning.is_active(&self.cfg.lightning) {
            for (slot, frame) in slots.iter().zip(frames.iter()) {
                if let (Some(hand), Some(f)) = (slot, frame) {
                    if f.open() {
                        self.spawn_bolts(&hand.landmarks, &surface);
                    }
                }
            }
        }

        // Glows, trails, ambient
        self.glows.clear();
        if let Some(palette) = self.cfg.palettes.for_mode(self.mode).copied() {
            for (i, (slot, frame)) in slots.iter().zip(frames.iter()).enumerate() {
                if let (Some(hand), Some(f)) = (slot, frame) {
                    let family = match Handedness::from_index(i) {
                        Handedness::Left  => palette.left,
                        Handedness::Right => palette.right,
                    };
                    spawned += self.emit(&hand.landmarks, f, family, &surface);
                }
            }
        }

        // Integrate + cull
        let easing = self.cfg.fusion.ring_easing;
        self.bursts.retain_mut(|b| b.advance(easing));
        self.particles.retain_mut(Particle::advance);
        self.bolts.retain_mut(LightningBolt::advance);

        let max_live = self.cfg.particles.max_live;
        if self.particles.len() > max_live {
            let excess = self.particles.len() - max_live;
            self.particles.drain(..excess);
        }

        self.present = slots;
        self.surface = surface;
        self.frame += 1;

        FrameReport { hands: frames, fusion, flash: self.flash, spawned }
    }

    fn step_fusion(
        &mut self,
        hand_count: usize,
        slots:      &[Option<TrackedHand>; 2],
        frames:     &[Option<HandFrame>; 2],
        surface:    &Surface,
        spawned:    &mut usize,
    ) -> FusionEvent {
        let reading = match (self.mode.is_paired(), hand_count, slots, frames) {
            (true, 2, [Some(left), Some(right)], [Some(lf), Some(rf)]) => Some(PairReading::measure(
                &left.landmarks,
                &right.landmarks,
                lf.fist() && rf.fist(),
                surface,
                &self.cfg.fusion,
            )),
            _ => None,
        };

        let event = self.proximity.update(reading, &self.cfg.fusion);
        if let FusionEvent::Exploded(ball) = event {
            let (burst, rings) = explode(&mut self.jitter, &mut self.family, ball, &self.cfg.fusion);
            debug!(size = ball.size, particles = burst.len(), "fusion ball exploded");
            *spawned += burst.len();
            self.particles.extend(burst);
            self.bursts.extend(rings);
        }
        event
    }

    fn spawn_bolts(&mut self, hand: &HandLandmarks, surface: &Surface) {
        let cfg = &self.cfg.lightning;
        for &tip in FINGERTIPS.iter() {
            let origin = surface.project(hand[tip]);
            if let Some(b) = self.lightning.try_bolt(&mut self.jitter, origin, cfg.tip_chance, cfg) {
                self.bolts.push(b);
            }
        }
        for &(a, b) in HAND_CONNECTIONS.iter() {
            let origin = surface.project(hand[a].midpoint(&hand[b]));
            if let Some(b) = self.lightning.try_bolt(&mut self.jitter, origin, cfg.connection_chance, cfg) {
                self.bolts.push(b);
            }
        }
    }

    /// Glow, pinch trail and ambient particles for one charged hand.
    /// Returns the number of particles spawned.
    fn emit(&mut self, hand: &HandLandmarks, frame: &HandFrame, family: Family, surface: &Surface) -> usize {
        let intensity = frame.intensity;
        if intensity <= self.cfg.tracker.spawn_floor {
            return 0;
        }
        let profile = self.cfg.profiles.get(family);
        let pcfg = &self.cfg.particles;
        let t = self.frame as f32 * self.cfg.frame_ms;

        let g = &profile.glow;
        self.glows.push(Glow {
            family,
            center: surface.project(hand.palm()),
            radius: g.radius + (t * g.flicker_rate).sin() * g.flicker_amp,
            alpha:  g.alpha * intensity,
        });

        let before = self.particles.len();
        if frame.pinch {
            let at = surface.project(hand.pinch_point());
            for _ in 0..pcfg.trail_count {
                self.particles.push(spawn_trail(&mut self.jitter, family, at, pcfg));
            }
        }

        let joints = hand.points().iter().map(|&p| surface.project(p));
        let bones = HAND_CONNECTIONS
            .iter()
            .map(|&(a, b)| surface.project(hand[a].midpoint(&hand[b])));
        let palm = std::iter::once(surface.project(hand.palm_center()));
        let anchors: Vec<Vec2> = joints.chain(bones).chain(palm).collect();
        for at in anchors {
            if self.jitter.gen::<f32>() > intensity {
                continue;
            }
            self.particles
                .push(spawn_ambient(&mut self.jitter, family, at, frame.surge, profile, pcfg));
        }
        self.particles.len() - before
    }

    // ── Output ────────────────────────────────────────────────────────────

    /// Borrowed view of everything a renderer needs for the last frame.
    pub fn render_frame(&self) -> RenderFrame<'_> {
        let hands = self
            .present
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| {
                slot.as_ref().map(|h| HandView {
                    handedness: h.handedness,
                    landmarks:  &h.landmarks,
                    intensity:  self.hands[i].intensity(),
                    pinch:      self.hands[i].pinch_active(),
                })
            })
            .collect();
        RenderFrame {
            surface:   self.surface,
            particles: &self.particles,
            bolts:     &self.bolts,
            bursts:    &self.bursts,
            ball:      self.ball(),
            glows:     &self.glows,
            flash:     self.flash,
            hands,
        }
    }

    pub fn render<R: EffectRenderer + ?Sized>(&self, renderer: &mut R) {
        renderer.render(&self.render_frame());
    }
}

/// One hand per side; the first detection of a side wins.
fn assign_slots(hands: &[TrackedHand]) -> [Option<TrackedHand>; 2] {
    let mut slots: [Option<TrackedHand>; 2] = [None, None];
    for hand in hands {
        let slot = &mut slots[hand.handedness.index()];
        if slot.is_some() {
            trace!(hand = hand.handedness.label(), "duplicate handedness ignored");
            continue;
        }
        *slot = Some(hand.clone());
    }
    slots
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
