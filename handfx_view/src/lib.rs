//! # handfx_view
//!
//! Interactive window for the `handfx` effects engine, with a synthetic
//! hand simulator and optional LeapMotion input.
//!
//! ## Feature flags
//!
//! * (default) — **Simulation mode**: the mouse moves the hands, keys pick
//!   the pose.
//! * `leap` — **Hardware mode**: polls a real LeapMotion controller via
//!   LeapC and maps its skeleton onto 21 landmarks.
//!
//! ### Keyboard shortcuts
//!
//! | Key | Action |
//! |---|---|
//! | `1` / `2` / `3` | Fire & Ice / Lightning / Red & Blue |
//! | `O` | Open palms |
//! | `F` | Fists (explodes a live orb) |
//! | `P` | Pinch (draws trails) |
//! | `K` | OK sign |
//! | `N` | Relaxed (no gesture) |
//! | `Z` / `X` | Toggle left / right hand |
//! | `C` | Clear all particles |
//! | `Q` | Quit |
//!
//! The right wrist follows the mouse and the left wrist mirrors it, so
//! moving the mouse to the centre brings the palms together.

pub mod app;
pub mod error;
pub mod source;
pub mod visualizer;
