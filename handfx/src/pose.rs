//! Synthetic hand poses.
//!
//! Builds plausible 21-point skeletons for a handful of poses so the engine
//! can be driven without a camera: the viewer's keyboard simulator uses
//! them, and so do the tests.  The hand points up the image (−y) with the
//! wrist at the given position.

use crate::landmark::{Handedness, HandLandmarks, Landmark, LANDMARK_COUNT};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pose {
    /// All four fingers extended.
    Open,
    /// All four fingers curled, thumb tucked.
    Fist,
    /// Thumb and index tips touching, other three fingers extended.
    Pinch,
    /// Thumb and index tips touching, other three fingers curled.
    OkSign,
    /// Index and middle extended, ring and pinky curled; classifies as nothing.
    Relaxed,
}

impl Pose {
    pub fn name(self) -> &'static str {
        match self {
            Pose::Open    => "open",
            Pose::Fist    => "fist",
            Pose::Pinch   => "pinch",
            Pose::OkSign  => "ok",
            Pose::Relaxed => "relaxed",
        }
    }
}

// Finger-base x offsets (index → pinky) for a right hand, in hand units.
const BASE_DX: [f32; 4] = [-0.12, -0.04, 0.04, 0.12];
const BASE_DY: f32 = -0.4;

// (dy of PIP, DIP, TIP) relative to the base.
const STRAIGHT: [f32; 3] = [-0.15, -0.25, -0.33];
const CURLED:   [f32; 3] = [-0.10, -0.05,  0.02];

/// Build a hand with its wrist at `(x, y)`; `scale` is the wrist-to-fingertip
/// span in normalized units (≈ 0.25 for a hand at arm's length).
pub fn synth_hand(pose: Pose, handedness: Handedness, x: f32, y: f32, scale: f32) -> HandLandmarks {
    // Right hands have the thumb on −x in image space; mirror for left.
    let side = match handedness {
        Handedness::Right =>  1.0,
        Handedness::Left  => -1.0,
    };
    let at = |dx: f32, dy: f32| Landmark::new(x + dx * side * scale, y + dy * scale, 0.0);

    let mut pts = [Landmark::default(); LANDMARK_COUNT];
    pts[0] = at(0.0, 0.0);

    let extended: [bool; 4] = match pose {
        Pose::Open | Pose::Pinch    => [true,  true,  true,  true ],
        Pose::Fist | Pose::OkSign   => [false, false, false, false],
        Pose::Relaxed               => [true,  true,  false, false],
    };

    for f in 0..4 {
        let base = 5 + f * 4;
        let dx = BASE_DX[f];
        let bend = if extended[f] { STRAIGHT } else { CURLED };
        pts[base] = at(dx, BASE_DY);
        for (j, dy) in bend.iter().enumerate() {
            pts[base + 1 + j] = at(dx, BASE_DY + dy);
        }
    }

    match pose {
        Pose::Pinch | Pose::OkSign => {
            // Index hooks down toward the thumb; tips meet.
            pts[6] = at(-0.14, -0.52);
            pts[7] = at(-0.18, -0.48);
            pts[8] = at(-0.19, -0.44);
            pts[1] = at(-0.10, -0.10);
            pts[2] = at(-0.17, -0.20);
            pts[3] = at(-0.20, -0.32);
            pts[4] = at(-0.20, -0.43);
        }
        Pose::Fist => {
            pts[1] = at(-0.10, -0.10);
            pts[2] = at(-0.15, -0.20);
            pts[3] = at(-0.10, -0.30);
            pts[4] = at(-0.02, -0.34);
        }
        Pose::Open | Pose::Relaxed => {
            pts[1] = at(-0.10, -0.10);
            pts[2] = at(-0.20, -0.18);
            pts[3] = at(-0.28, -0.24);
            pts[4] = at(-0.35, -0.30);
        }
    }

    HandLandmarks::new(pts)
}

/// Same hand as raw `[x, y, z]` triples, as a detector would emit it.
pub fn synth_triples(pose: Pose, handedness: Handedness, x: f32, y: f32, scale: f32) -> Vec<[f32; 3]> {
    synth_hand(pose, handedness, x, y, scale)
        .points()
        .iter()
        .map(|p| [p.x, p.y, p.z])
        .collect()
}
