//! Landmark sources: LeapMotion hardware or keyboard/mouse simulation.
//!
//! Either way the app receives [`SourceEvent`]s over an `mpsc` channel and
//! never learns where the hands came from.  Each `Frame` is one detector
//! snapshot; the app only ever steps the engine with the newest one.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use tracing::debug;

use handfx::landmark::{DetectorFrame, Handedness, RawHand, RawLandmarks};
use handfx::pose::{synth_triples, Pose};
use handfx::Mode;

// ════════════════════════════════════════════════════════════════════════════
// SourceEvent
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub enum SourceEvent {
    /// Latest hands seen by the source.
    Frame(DetectorFrame),
    Mode(Mode),
    Clear,
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// LandmarkSource trait
// ════════════════════════════════════════════════════════════════════════════

pub trait LandmarkSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<SourceEvent>);
}

/// Spawn a landmark source on its own thread and return the receiving end.
pub fn spawn_landmark_source<S: LandmarkSource>(source: S) -> Receiver<SourceEvent> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

// ════════════════════════════════════════════════════════════════════════════
// SimHandSource — keyboard + mouse (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Raw input from the viewer window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SimInput {
    KeyDown(SimKey),
    /// Mouse position in normalized window coordinates.  Sent once per
    /// window frame; each one yields a `Frame`.
    Pointer { x: f32, y: f32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimKey {
    Mode(Mode),  // 1 / 2 / 3
    Pose(Pose),  // O / F / P / K / N
    ToggleLeft,  // Z
    ToggleRight, // X
    Clear,       // C
    Quit,        // Q
}

/// Two synthetic hands: the right wrist follows the pointer, the left one
/// mirrors it about the vertical centre line.  Both share one pose.
#[derive(Clone, Debug, PartialEq)]
pub struct SimHands {
    pub pose:  Pose,
    pub left:  bool,
    pub right: bool,
    pub x:     f32,
    pub y:     f32,
    /// Wrist-to-fingertip span, normalized.
    pub scale: f32,
}

impl Default for SimHands {
    fn default() -> Self {
        SimHands { pose: Pose::Relaxed, left: true, right: true, x: 0.6, y: 0.8, scale: 0.25 }
    }
}

impl SimHands {
    /// Apply a hand-shaping key; returns false for keys that aren't about
    /// the hands.
    pub fn apply(&mut self, key: SimKey) -> bool {
        match key {
            SimKey::Pose(p)     => self.pose = p,
            SimKey::ToggleLeft  => self.left = !self.left,
            SimKey::ToggleRight => self.right = !self.right,
            _ => return false,
        }
        true
    }

    pub fn frame(&self) -> DetectorFrame {
        let mut hands = Vec::with_capacity(2);
        if self.right {
            hands.push(self.hand(Handedness::Right, self.x));
        }
        if self.left {
            hands.push(self.hand(Handedness::Left, 1.0 - self.x));
        }
        DetectorFrame { hands }
    }

    fn hand(&self, side: Handedness, x: f32) -> RawHand {
        let points = synth_triples(self.pose, side, x, self.y, self.scale);
        RawHand::labelled(RawLandmarks::Triples(points), side.label())
    }
}

pub struct SimHandSource {
    pub rx:    Receiver<SimInput>,
    pub hands: SimHands,
}

impl SimHandSource {
    pub fn new(rx: Receiver<SimInput>) -> Self {
        SimHandSource { rx, hands: SimHands::default() }
    }
}

impl LandmarkSource for SimHandSource {
    fn run(self: Box<Self>, tx: Sender<SourceEvent>) {
        let SimHandSource { rx, mut hands } = *self;
        for input in rx {
            let event = match input {
                SimInput::Pointer { x, y } => {
                    hands.x = x.clamp(0.0, 1.0);
                    hands.y = y.clamp(0.0, 1.0);
                    SourceEvent::Frame(hands.frame())
                }
                SimInput::KeyDown(SimKey::Mode(m)) => SourceEvent::Mode(m),
                SimInput::KeyDown(SimKey::Clear)   => SourceEvent::Clear,
                SimInput::KeyDown(SimKey::Quit)    => {
                    let _ = tx.send(SourceEvent::Quit);
                    return;
                }
                SimInput::KeyDown(key) => {
                    if hands.apply(key) {
                        debug!(pose = hands.pose.name(), left = hands.left, right = hands.right, "sim hands");
                    }
                    continue;
                }
            };
            if tx.send(event).is_err() { return; }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LeapLandmarkSource — real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Landmark source backed by a LeapMotion controller.
///
/// Requires the `leap` feature flag and the LeapC shared library installed.
///
/// Each tracking frame's skeleton is mapped onto the 21-point layout:
///
/// * wrist → middle metacarpal's proximal joint
/// * thumb CMC / MCP / IP / tip → proximal, intermediate and distal joints
/// * finger MCP / PIP / DIP / tip → proximal, intermediate and distal joints
///
/// Millimetres are mapped onto `[0, 1]` over an interaction box above the
/// device, with image `y` growing downward.
#[cfg(feature = "leap")]
pub struct LeapLandmarkSource;

#[cfg(feature = "leap")]
impl LandmarkSource for LeapLandmarkSource {
    fn run(self: Box<Self>, tx: Sender<SourceEvent>) {
        use leaprs::*;
        use tracing::{error, info};

        let mut connection = match Connection::create(ConnectionConfig::default()) {
            Ok(c)  => c,
            Err(e) => {
                error!(?e, "failed to create LeapC connection");
                let _ = tx.send(SourceEvent::Quit);
                return;
            }
        };
        if let Err(e) = connection.open() {
            error!(?e, "failed to open LeapMotion device");
            let _ = tx.send(SourceEvent::Quit);
            return;
        }
        info!("LeapMotion connected");

        loop {
            let msg = match connection.poll(100) {
                Ok(m)  => m,
                Err(_) => continue,
            };

            if let Event::Tracking(frame) = msg.event() {
                let hands = frame
                    .hands()
                    .map(|hand| {
                        let label = match hand.hand_type() {
                            HandType::Left  => "Left",
                            HandType::Right => "Right",
                        };
                        RawHand::labelled(RawLandmarks::Triples(leap_landmarks(&hand)), label)
                    })
                    .collect();
                if tx.send(SourceEvent::Frame(DetectorFrame { hands })).is_err() {
                    return;
                }
            }
        }
    }
}

#[cfg(feature = "leap")]
fn leap_landmarks(hand: &leaprs::Hand) -> Vec<[f32; 3]> {
    // Interaction box in millimetres: x ∈ ±200, y ∈ 80..480, z ∈ ±200.
    const HALF_W: f32 = 200.0;
    const FLOOR:  f32 = 80.0;
    const SPAN:   f32 = 400.0;
    macro_rules! norm {
        ($v:expr) => {{
            let v = $v;
            [(v.x + HALF_W) / SPAN, 1.0 - (v.y - FLOOR) / SPAN, v.z / SPAN]
        }};
    }

    let digits: Vec<_> = hand.digits().collect();
    if digits.len() < 5 {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(21);
    out.push(norm!(digits[2].metacarpal().prev_joint()));
    for digit in &digits {
        out.push(norm!(digit.proximal().prev_joint()));
        out.push(norm!(digit.intermediate().prev_joint()));
        out.push(norm!(digit.distal().prev_joint()));
        out.push(norm!(digit.distal().next_joint()));
    }
    out
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
