//! Hand landmarks and the detector-output adapter.
//!
//! Detectors hand over landmarks in several shapes (point structs, `[x, y, z]`
//! triples, 2D pairs, one flat buffer for all hands).  [`adapt`] normalizes any
//! of them into [`TrackedHand`]s holding exactly 21 points, once, at the
//! boundary.  A hand with fewer than 21 points or with non-finite coordinates
//! is treated as absent, never padded with zeros.

use std::ops::Index;

use glam::Vec2;

// ════════════════════════════════════════════════════════════════════════════
// Hand topology
// ════════════════════════════════════════════════════════════════════════════

pub const LANDMARK_COUNT: usize = 21;

pub const WRIST:      usize = 0;
pub const THUMB_CMC:  usize = 1;
pub const THUMB_MCP:  usize = 2;
pub const THUMB_IP:   usize = 3;
pub const THUMB_TIP:  usize = 4;
pub const INDEX_MCP:  usize = 5;
pub const INDEX_PIP:  usize = 6;
pub const INDEX_DIP:  usize = 7;
pub const INDEX_TIP:  usize = 8;
/// Middle-finger base; doubles as the "palm" point.
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP:   usize = 13;
pub const RING_PIP:   usize = 14;
pub const RING_DIP:   usize = 15;
pub const RING_TIP:   usize = 16;
pub const PINKY_MCP:  usize = 17;
pub const PINKY_PIP:  usize = 18;
pub const PINKY_DIP:  usize = 19;
pub const PINKY_TIP:  usize = 20;

pub const PALM: usize = MIDDLE_MCP;

pub const FINGERTIPS: [usize; 5] = [THUMB_TIP, INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

/// Points averaged for the palm centre.
pub const PALM_RING: [usize; 5] = [WRIST, INDEX_MCP, MIDDLE_MCP, RING_MCP, PINKY_MCP];

/// Skeleton connections, used both for drawing and as emission anchors.
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    (WRIST, THUMB_CMC), (THUMB_CMC, THUMB_MCP), (THUMB_MCP, THUMB_IP), (THUMB_IP, THUMB_TIP),
    (WRIST, INDEX_MCP), (INDEX_MCP, INDEX_PIP), (INDEX_PIP, INDEX_DIP), (INDEX_DIP, INDEX_TIP),
    (INDEX_MCP, MIDDLE_MCP), (MIDDLE_MCP, MIDDLE_PIP), (MIDDLE_PIP, MIDDLE_DIP), (MIDDLE_DIP, MIDDLE_TIP),
    (MIDDLE_MCP, RING_MCP), (RING_MCP, RING_PIP), (RING_PIP, RING_DIP), (RING_DIP, RING_TIP),
    (RING_MCP, PINKY_MCP), (PINKY_MCP, PINKY_PIP), (PINKY_PIP, PINKY_DIP), (PINKY_DIP, PINKY_TIP),
    (WRIST, PINKY_MCP),
];

// ════════════════════════════════════════════════════════════════════════════
// Landmark
// ════════════════════════════════════════════════════════════════════════════

/// One joint in normalized image space: `x, y ∈ [0, 1]`, `z` relative depth.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self { Landmark { x, y, z } }

    /// Image-plane distance; depth is ignored.
    pub fn distance(&self, other: &Landmark) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn distance_3d(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn midpoint(&self, other: &Landmark) -> Landmark {
        Landmark {
            x: (self.x + other.x) * 0.5,
            y: (self.y + other.y) * 0.5,
            z: (self.z + other.z) * 0.5,
        }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Handedness
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    /// Slot index for per-hand state arrays.
    pub fn index(self) -> usize {
        match self {
            Handedness::Left  => 0,
            Handedness::Right => 1,
        }
    }

    pub fn from_index(i: usize) -> Self {
        if i == 0 { Handedness::Left } else { Handedness::Right }
    }

    /// Detector labels vary in case and decoration ("Left", "left_hand").
    pub fn from_label(label: &str) -> Option<Self> {
        let l = label.to_ascii_lowercase();
        if l.contains("left") {
            Some(Handedness::Left)
        } else if l.contains("right") {
            Some(Handedness::Right)
        } else {
            None
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Handedness::Left  => "Left",
            Handedness::Right => "Right",
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandLandmarks — the fixed 21-point contract
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub struct HandLandmarks {
    points: [Landmark; LANDMARK_COUNT],
}

impl HandLandmarks {
    pub fn new(points: [Landmark; LANDMARK_COUNT]) -> Self { HandLandmarks { points } }

    /// `None` unless `points` holds at least 21 finite landmarks.  Extra
    /// points are ignored.
    pub fn from_slice(points: &[Landmark]) -> Option<Self> {
        let head = points.get(..LANDMARK_COUNT)?;
        if !head.iter().all(Landmark::is_finite) {
            return None;
        }
        let mut out = [Landmark::default(); LANDMARK_COUNT];
        out.copy_from_slice(head);
        Some(HandLandmarks { points: out })
    }

    pub fn points(&self) -> &[Landmark; LANDMARK_COUNT] { &self.points }

    pub fn wrist(&self) -> Landmark { self.points[WRIST] }
    pub fn palm(&self)  -> Landmark { self.points[PALM] }

    /// Mean of the wrist and the four finger bases.
    pub fn palm_center(&self) -> Landmark {
        let n = PALM_RING.len() as f32;
        let (x, y, z) = PALM_RING.iter().fold((0.0, 0.0, 0.0), |(x, y, z), &i| {
            let p = self.points[i];
            (x + p.x, y + p.y, z + p.z)
        });
        Landmark { x: x / n, y: y / n, z: z / n }
    }

    /// Midpoint of the thumb and index tips, where pinch trails are drawn.
    pub fn pinch_point(&self) -> Landmark {
        self.points[THUMB_TIP].midpoint(&self.points[INDEX_TIP])
    }
}

impl Index<usize> for HandLandmarks {
    type Output = Landmark;
    fn index(&self, i: usize) -> &Landmark { &self.points[i] }
}

/// A hand that passed the adapter.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackedHand {
    pub handedness: Handedness,
    pub landmarks:  HandLandmarks,
    /// Detector confidence; only carried through.
    pub score:      f32,
}

// ════════════════════════════════════════════════════════════════════════════
// Raw detector output
// ════════════════════════════════════════════════════════════════════════════

/// Landmarks in whichever shape the detector produced.
#[derive(Clone, Debug, PartialEq)]
pub enum RawLandmarks {
    Points(Vec<Landmark>),
    Triples(Vec<[f32; 3]>),
    /// 2D-only detectors; `z` becomes 0.
    Pairs(Vec<[f32; 2]>),
}

impl RawLandmarks {
    fn to_points(&self) -> Vec<Landmark> {
        match self {
            RawLandmarks::Points(p)  => p.clone(),
            RawLandmarks::Triples(t) => t.iter().map(|&[x, y, z]| Landmark { x, y, z }).collect(),
            RawLandmarks::Pairs(p)   => p.iter().map(|&[x, y]| Landmark { x, y, z: 0.0 }).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RawHand {
    pub landmarks: RawLandmarks,
    pub label:     Option<String>,
    pub score:     Option<f32>,
}

impl RawHand {
    pub fn labelled(landmarks: RawLandmarks, label: &str) -> Self {
        RawHand { landmarks, label: Some(label.to_string()), score: None }
    }
}

/// One detector result: everything seen in a single video frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetectorFrame {
    pub hands: Vec<RawHand>,
}

impl DetectorFrame {
    pub fn empty() -> Self { DetectorFrame::default() }

    /// Build from a flat `num_hands × 21 × 3` buffer.  Hands whose slice is
    /// cut short by the buffer end are dropped.
    pub fn from_flat(data: &[f32], num_hands: usize, labels: &[&str]) -> Self {
        let stride = LANDMARK_COUNT * 3;
        let hands = data
            .chunks_exact(stride)
            .take(num_hands)
            .enumerate()
            .map(|(h, chunk)| RawHand {
                landmarks: RawLandmarks::Triples(
                    chunk.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect(),
                ),
                label: labels.get(h).map(|s| s.to_string()),
                score: None,
            })
            .collect();
        DetectorFrame { hands }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Adapter
// ════════════════════════════════════════════════════════════════════════════

/// Normalize detector output into tracked hands.
///
/// Unlabelled hands fall back to `Right` for the first detector slot and
/// `Left` for any later one.
pub fn adapt(frame: &DetectorFrame) -> Vec<TrackedHand> {
    frame
        .hands
        .iter()
        .enumerate()
        .filter_map(|(i, raw)| {
            let landmarks = HandLandmarks::from_slice(&raw.landmarks.to_points())?;
            let handedness = raw
                .label
                .as_deref()
                .and_then(Handedness::from_label)
                .unwrap_or(if i == 0 { Handedness::Right } else { Handedness::Left });
            Some(TrackedHand {
                handedness,
                landmarks,
                score: raw.score.unwrap_or(1.0),
            })
        })
        .collect()
}

// ════════════════════════════════════════════════════════════════════════════
// Surface — normalized → pixel mapping
// ════════════════════════════════════════════════════════════════════════════

/// Pixel size of the drawing surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Surface {
    pub width:    f32,
    pub height:   f32,
    pub mirror_x: bool,
}

impl Surface {
    pub fn new(width: f32, height: f32) -> Self {
        Surface { width, height, mirror_x: false }
    }

    pub fn mirrored(self, mirror_x: bool) -> Self { Surface { mirror_x, ..self } }

    pub fn project(&self, l: Landmark) -> Vec2 {
        let x = if self.mirror_x { 1.0 - l.x } else { l.x };
        Vec2::new(x * self.width, l.y * self.height)
    }

    pub fn longest_side(&self) -> f32 { self.width.max(self.height) }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
