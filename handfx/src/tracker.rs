//! Per-hand temporal state.
//!
//! Turns noisy per-frame classifications into stable signals:
//!
//! * **Pinch latch** — engages on the first raw pinch, stays on for
//!   `pinch_latch_frames` after the last one.  No on-debounce.
//! * **Intensity** — charges slowly while the hand is open or pinching,
//!   drains fast otherwise; clamped to `[0, 1]`.
//! * **Surge** — set to 1 on the open-palm rising edge only, then decays
//!   geometrically and snaps to 0 under the floor.
//! * **Grace period** — a hand missing from detection keeps its state for
//!   `hand_grace_frames` frames before being reset.

use crate::config::{ClassifierConfig, TrackerConfig};
use crate::gesture::{classify, Gestures};
use crate::landmark::{HandLandmarks, Landmark};

// ════════════════════════════════════════════════════════════════════════════
// PinchLatch
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PinchLatch {
    frames_left: u32,
    active:      bool,
}

impl PinchLatch {
    /// Feed one raw reading; returns the latched state.
    pub fn update(&mut self, raw: bool, latch_frames: u32) -> bool {
        if raw {
            self.frames_left = latch_frames;
            self.active = true;
        } else {
            self.frames_left = self.frames_left.saturating_sub(1);
            if self.frames_left == 0 {
                self.active = false;
            }
        }
        self.active
    }

    pub fn is_active(&self) -> bool { self.active }
}

// ════════════════════════════════════════════════════════════════════════════
// HandFrame — what the tracker concluded this frame
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HandFrame {
    pub gestures:  Gestures,
    /// Latched pinch.
    pub pinch:     bool,
    /// Open palm went false → true on this frame.
    pub surged:    bool,
    pub intensity: f32,
    pub surge:     f32,
}

impl HandFrame {
    pub fn open(&self) -> bool { self.gestures.open }
    pub fn fist(&self) -> bool { self.gestures.fist }
}

// ════════════════════════════════════════════════════════════════════════════
// HandState
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, Default, PartialEq)]
pub struct HandState {
    intensity:     f32,
    surge:         f32,
    pinch:         PinchLatch,
    last_wrist:    Option<Landmark>,
    was_open:      bool,
    missed_frames: u32,
}

impl HandState {
    pub fn intensity(&self) -> f32 { self.intensity }
    pub fn surge(&self) -> f32 { self.surge }
    pub fn pinch_active(&self) -> bool { self.pinch.is_active() }
    pub fn missed_frames(&self) -> u32 { self.missed_frames }

    /// Classify this frame's landmarks and advance all temporal state.
    ///
    /// `charging` is false in modes where hands don't build intensity; the
    /// hand then only drains and never surges.
    pub fn observe(
        &mut self,
        hand:       &HandLandmarks,
        classifier: &ClassifierConfig,
        cfg:        &TrackerConfig,
        charging:   bool,
    ) -> HandFrame {
        let gestures = classify(hand, self.last_wrist, classifier);
        self.last_wrist = Some(hand.wrist());
        self.missed_frames = 0;

        let pinch = self.pinch.update(gestures.pinch_raw, cfg.pinch_latch_frames);
        let surged = self.advance(gestures.open, gestures.open || pinch, charging, cfg);

        HandFrame {
            gestures,
            pinch,
            surged,
            intensity: self.intensity,
            surge:     self.surge,
        }
    }

    /// Intensity/surge integration; returns whether a surge fired.
    fn advance(&mut self, open: bool, active: bool, charging: bool, cfg: &TrackerConfig) -> bool {
        let mut surged = false;
        if charging {
            self.intensity += if active { cfg.intensity_rise } else { -cfg.intensity_fall };
            if open && !self.was_open {
                self.surge = 1.0;
                surged = true;
            }
        } else {
            self.intensity -= cfg.intensity_fall;
        }
        self.was_open = open;

        self.surge *= cfg.surge_decay;
        if self.surge < cfg.surge_floor {
            self.surge = 0.0;
        }
        self.intensity = self.intensity.clamp(0.0, 1.0);
        surged
    }

    /// Record a frame without this hand.  Returns true when the grace period
    /// ran out and the state was reset on this call.
    pub fn miss(&mut self, grace_frames: u32) -> bool {
        if *self == HandState::default() {
            return false;
        }
        self.missed_frames += 1;
        if self.missed_frames > grace_frames {
            self.reset();
            return true;
        }
        false
    }

    pub fn reset(&mut self) { *self = HandState::default(); }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::Handedness;
    use crate::pose::{synth_hand, Pose};

    fn hand(p: Pose) -> HandLandmarks {
        synth_hand(p, Handedness::Left, 0.4, 0.8, 0.25)
    }

    fn observe(s: &mut HandState, p: Pose) -> HandFrame {
        s.observe(&hand(p), &ClassifierConfig::default(), &TrackerConfig::default(), true)
    }

    #[test]
    fn latch_holds_for_five_frames() {
        let mut latch = PinchLatch::default();
        // frame 1: raw true, frames 2..=5: raw false
        let readings = [true, false, false, false, false, false];
        let active: Vec<bool> = readings.iter().map(|&r| latch.update(r, 5)).collect();
        assert_eq!(active, vec![true, true, true, true, true, false]);
    }

    #[test]
    fn latch_rearms_on_new_reading() {
        let mut latch = PinchLatch::default();
        latch.update(true, 5);
        for _ in 0..3 { latch.update(false, 5); }
        latch.update(true, 5);
        for _ in 0..4 { assert!(latch.update(false, 5)); }
        assert!(!latch.update(false, 5));
    }

    #[test]
    fn latch_never_engages_without_reading() {
        let mut latch = PinchLatch::default();
        for _ in 0..10 { assert!(!latch.update(false, 5)); }
    }

    #[test]
    fn intensity_charges_slowly_and_drains_fast() {
        let mut s = HandState::default();
        for _ in 0..10 { observe(&mut s, Pose::Open); }
        assert!((s.intensity() - 0.5).abs() < 1e-4);
        observe(&mut s, Pose::Relaxed);
        assert!((s.intensity() - 0.35).abs() < 1e-4);
    }

    #[test]
    fn intensity_clamped() {
        let mut s = HandState::default();
        for _ in 0..40 { observe(&mut s, Pose::Open); }
        assert_eq!(s.intensity(), 1.0);
        for _ in 0..20 { observe(&mut s, Pose::Fist); }
        assert_eq!(s.intensity(), 0.0);
    }

    #[test]
    fn surge_only_on_rising_edge() {
        let mut s = HandState::default();
        let f = observe(&mut s, Pose::Open);
        assert!(f.surged);
        assert!((s.surge() - 0.92).abs() < 1e-6);
        let f = observe(&mut s, Pose::Open);
        assert!(!f.surged);
        assert!(s.surge() < 0.92);
    }

    #[test]
    fn surge_snaps_to_zero_within_56_frames() {
        let mut s = HandState::default();
        observe(&mut s, Pose::Open);
        let mut frames = 1;
        while s.surge() > 0.0 {
            observe(&mut s, Pose::Open);
            frames += 1;
            assert!(frames <= 56, "surge still {} after {} frames", s.surge(), frames);
        }
        assert!(frames >= 55);
    }

    #[test]
    fn no_charge_or_surge_when_not_charging() {
        let mut s = HandState::default();
        let f = s.observe(&hand(Pose::Open), &ClassifierConfig::default(), &TrackerConfig::default(), false);
        assert!(!f.surged);
        assert_eq!(s.intensity(), 0.0);
    }

    #[test]
    fn pinch_counts_as_active() {
        let mut s = HandState::default();
        let f = observe(&mut s, Pose::Pinch);
        assert!(f.pinch);
        assert!(s.intensity() > 0.0);
    }

    #[test]
    fn grace_period_then_reset() {
        let mut s = HandState::default();
        for _ in 0..5 { observe(&mut s, Pose::Open); }
        let before = s.intensity();
        assert!(!s.miss(3));
        assert!(!s.miss(3));
        assert!(!s.miss(3));
        assert_eq!(s.intensity(), before);
        assert!(s.miss(3));
        assert_eq!(s, HandState::default());
        // Already default: further misses are no-ops.
        assert!(!s.miss(3));
    }

    #[test]
    fn reappearing_hand_clears_miss_count() {
        let mut s = HandState::default();
        observe(&mut s, Pose::Open);
        s.miss(3);
        s.miss(3);
        observe(&mut s, Pose::Open);
        assert_eq!(s.missed_frames(), 0);
    }
}
