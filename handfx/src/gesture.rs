//! Stateless gesture predicates over one hand's landmarks.
//!
//! Distances are measured from the wrist and, for pinch, relative to the
//! hand's own size, so the predicates hold regardless of how far the hand is
//! from the camera.  No trained model is involved.

use crate::config::{ClassifierConfig, OpenPalmRule, PinchRule};
use crate::landmark::{
    HandLandmarks, Landmark, Surface,
    INDEX_MCP, INDEX_PIP, INDEX_TIP, MIDDLE_MCP, MIDDLE_PIP, MIDDLE_TIP,
    PINKY_MCP, PINKY_PIP, PINKY_TIP, RING_PIP, RING_TIP, THUMB_TIP, WRIST,
};

/// Floor for hand size so relative thresholds never divide by ~0.
pub const MIN_HAND_SIZE: f32 = 1e-3;

/// (tip, pip) for index, middle, ring, pinky.
const FINGERS: [(usize, usize); 4] = [
    (INDEX_TIP, INDEX_PIP),
    (MIDDLE_TIP, MIDDLE_PIP),
    (RING_TIP, RING_PIP),
    (PINKY_TIP, PINKY_PIP),
];

/// The three fingers that must stay up for a pinch, and down for an OK sign.
const OTHER_FINGERS: [(usize, usize); 3] = [
    (MIDDLE_TIP, MIDDLE_PIP),
    (RING_TIP, RING_PIP),
    (PINKY_TIP, PINKY_PIP),
];

// ════════════════════════════════════════════════════════════════════════════
// Per-finger measurements
// ════════════════════════════════════════════════════════════════════════════

fn is_extended(hand: &HandLandmarks, tip: usize, pip: usize) -> bool {
    let wrist = hand[WRIST];
    hand[tip].distance(&wrist) > hand[pip].distance(&wrist)
}

fn is_curled(hand: &HandLandmarks, tip: usize, pip: usize, ratio: f32) -> bool {
    let wrist = hand[WRIST];
    hand[tip].distance(&wrist) < hand[pip].distance(&wrist) * ratio
}

fn count(fingers: &[(usize, usize)], pred: impl Fn(usize, usize) -> bool) -> usize {
    fingers.iter().filter(|&&(tip, pip)| pred(tip, pip)).count()
}

/// Wrist → middle-finger base, floored at [`MIN_HAND_SIZE`].
pub fn hand_size(hand: &HandLandmarks) -> f32 {
    hand[MIDDLE_MCP].distance(&hand[WRIST]).max(MIN_HAND_SIZE)
}

/// Palm size in pixels, for scaling effects to the hand on screen.
pub fn palm_size_px(hand: &HandLandmarks, surface: &Surface) -> f32 {
    let along  = hand[WRIST].distance_3d(&hand[MIDDLE_MCP]);
    let across = hand[INDEX_MCP].distance_3d(&hand[PINKY_MCP]);
    let norm   = along.max(across).max(0.08);
    (norm * surface.longest_side() * 1.2).clamp(60.0, 200.0)
}

// ════════════════════════════════════════════════════════════════════════════
// Predicates
// ════════════════════════════════════════════════════════════════════════════

/// At least `min_fingers` of index..pinky have the tip farther from the wrist
/// than the PIP joint.
pub fn is_open_palm(hand: &HandLandmarks, min_fingers: usize) -> bool {
    count(&FINGERS, |tip, pip| is_extended(hand, tip, pip)) >= min_fingers
}

/// Looser 2D variant for top-down detectors: any finger whose tip is above
/// its PIP (within `margin`), unless the hand is making an OK sign.
pub fn is_open_palm_top_down(hand: &HandLandmarks, margin: f32, ok_threshold: f32) -> bool {
    if is_ok_sign(hand, ok_threshold) {
        return false;
    }
    FINGERS.iter().any(|&(tip, pip)| hand[tip].y < hand[pip].y + margin)
}

/// At least `min_fingers` have `dist(tip, wrist) < ratio × dist(pip, wrist)`.
pub fn is_fist(hand: &HandLandmarks, ratio: f32, min_fingers: usize) -> bool {
    count(&FINGERS, |tip, pip| is_curled(hand, tip, pip, ratio)) >= min_fingers
}

/// Wrist displacement since the previous frame; 0 without history.
pub fn wrist_velocity(hand: &HandLandmarks, prev_wrist: Option<Landmark>) -> f32 {
    prev_wrist.map_or(0.0, |p| hand[WRIST].distance(&p))
}

/// Raw (unlatched) pinch.  All three must hold:
/// the wrist is nearly still, at least `pinch_min_extended` of
/// middle/ring/pinky are extended, and the thumb/index gap is below
/// `pinch_ratio × hand_size`.
pub fn is_pinch_raw(hand: &HandLandmarks, prev_wrist: Option<Landmark>, cfg: &ClassifierConfig) -> bool {
    if wrist_velocity(hand, prev_wrist) > cfg.wrist_velocity_gate {
        return false;
    }
    if count(&OTHER_FINGERS, |tip, pip| is_extended(hand, tip, pip)) < cfg.pinch_min_extended {
        return false;
    }
    hand[THUMB_TIP].distance(&hand[INDEX_TIP]) < hand_size(hand) * cfg.pinch_ratio
}

/// Thumb/index tips within an absolute `threshold` and middle/ring/pinky
/// tips below their PIPs.
pub fn is_ok_sign(hand: &HandLandmarks, threshold: f32) -> bool {
    let close = hand[THUMB_TIP].distance_3d(&hand[INDEX_TIP]) < threshold;
    close && OTHER_FINGERS.iter().all(|&(tip, pip)| hand[tip].y >= hand[pip].y)
}

// ════════════════════════════════════════════════════════════════════════════
// Gestures — one frame's classification of one hand
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Gestures {
    pub open:      bool,
    pub fist:      bool,
    /// Before hysteresis.
    pub pinch_raw: bool,
}

/// Evaluate every predicate for one hand, honouring the configured variants.
pub fn classify(hand: &HandLandmarks, prev_wrist: Option<Landmark>, cfg: &ClassifierConfig) -> Gestures {
    let open = match cfg.open_rule {
        OpenPalmRule::WristDistance => is_open_palm(hand, cfg.open_min_fingers),
        OpenPalmRule::TopDown       => is_open_palm_top_down(hand, cfg.top_down_margin, cfg.ok_threshold),
    };
    let pinch_raw = match cfg.pinch_rule {
        PinchRule::Gated  => is_pinch_raw(hand, prev_wrist, cfg),
        PinchRule::OkSign => is_ok_sign(hand, cfg.ok_threshold),
    };
    Gestures {
        open,
        fist: is_fist(hand, cfg.fist_ratio, cfg.fist_min_fingers),
        pinch_raw,
    }
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
        synth_hand(p, Handedness::Right, 0.5, 0.8, 0.25)
    }

    fn cfg() -> ClassifierConfig { ClassifierConfig::default() }

    #[test]
    fn open_palm_is_open_not_fist() {
        let h = hand(Pose::Open);
        assert!(is_open_palm(&h, 3));
        assert!(!is_fist(&h, 1.1, 3));
    }

    #[test]
    fn fist_is_fist_not_open() {
        let h = hand(Pose::Fist);
        assert!(is_fist(&h, 1.1, 3));
        assert!(!is_open_palm(&h, 3));
        assert!(!is_pinch_raw(&h, None, &cfg()));
    }

    #[test]
    fn relaxed_is_nothing() {
        let g = classify(&hand(Pose::Relaxed), None, &cfg());
        assert_eq!(g, Gestures::default());
    }

    #[test]
    fn pinch_detected_when_still() {
        let h = hand(Pose::Pinch);
        assert!(is_pinch_raw(&h, Some(h.wrist()), &cfg()));
        assert!(is_pinch_raw(&h, None, &cfg()));
    }

    #[test]
    fn pinch_gated_by_wrist_velocity() {
        let h = hand(Pose::Pinch);
        let prev = Landmark::new(h.wrist().x - 0.08, h.wrist().y, 0.0);
        assert!(!is_pinch_raw(&h, Some(prev), &cfg()));
    }

    #[test]
    fn pinch_works_for_left_hand_too() {
        let h = synth_hand(Pose::Pinch, Handedness::Left, 0.3, 0.7, 0.2);
        assert!(is_pinch_raw(&h, None, &cfg()));
    }

    #[test]
    fn pinch_is_scale_invariant() {
        for scale in [0.08, 0.25, 0.6] {
            let h = synth_hand(Pose::Pinch, Handedness::Right, 0.5, 0.9, scale);
            assert!(is_pinch_raw(&h, None, &cfg()), "scale {}", scale);
            let o = synth_hand(Pose::Open, Handedness::Right, 0.5, 0.9, scale);
            assert!(!is_pinch_raw(&o, None, &cfg()), "scale {}", scale);
        }
    }

    #[test]
    fn collapsed_hand_does_not_divide_by_zero() {
        let h = HandLandmarks::new([Landmark::new(0.5, 0.5, 0.0); 21]);
        assert_eq!(hand_size(&h), MIN_HAND_SIZE);
        // Thumb/index distance is 0 < 0.35 × floor, but no finger is extended.
        assert!(!is_pinch_raw(&h, None, &cfg()));
    }

    #[test]
    fn ok_sign_needs_curled_fingers() {
        assert!(is_ok_sign(&hand(Pose::OkSign), 0.22));
        assert!(!is_ok_sign(&hand(Pose::Pinch), 0.22));
        assert!(!is_ok_sign(&hand(Pose::Open), 0.22));
    }

    #[test]
    fn ok_sign_pinch_rule() {
        let c = ClassifierConfig { pinch_rule: PinchRule::OkSign, ..cfg() };
        assert!(classify(&hand(Pose::OkSign), None, &c).pinch_raw);
        assert!(!classify(&hand(Pose::Pinch), None, &c).pinch_raw);
    }

    #[test]
    fn top_down_rule() {
        assert!(is_open_palm_top_down(&hand(Pose::Open), 0.05, 0.22));
        assert!(!is_open_palm_top_down(&hand(Pose::OkSign), 0.05, 0.22));
    }

    #[test]
    fn palm_size_clamped() {
        let s = Surface::new(1280.0, 720.0);
        let px = palm_size_px(&hand(Pose::Open), &s);
        assert!((60.0..=200.0).contains(&px));
    }
}
