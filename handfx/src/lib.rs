//! # handfx
//!
//! Hand-pose driven visual effects: fire, ice, coloured energy, lightning,
//! and a two-hand fusion orb that explodes when both hands close.
//!
//! Input is one [`DetectorFrame`] per video frame (21 normalized landmarks
//! plus a left/right label per hand); output is a borrowed [`RenderFrame`]
//! of particles, bolts, rings, glows and the orb for any
//! [`EffectRenderer`] to draw.  Nothing here draws or touches a camera.
//!
//! ## Gesture → effect mapping
//!
//! | Gesture | Mode | Effect |
//! |---|---|---|
//! | Open palm | Fire & Ice / Red & Blue | Charges the hand; particles rise from every joint |
//! | Open palm (rising edge) | Fire & Ice / Red & Blue | Surge: upward kick that decays over ~55 frames |
//! | Pinch | Fire & Ice / Red & Blue | Charges the hand and lays slow trail particles |
//! | Palms touch, then separate | Fire & Ice / Red & Blue | Fusion orb sized by hand distance |
//! | Both fists with an orb live | Fire & Ice / Red & Blue | Orb explodes: burst + two shock rings |
//! | Open palm | Lightning | Flash and bolts from fingertips and bones |
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use handfx::{DetectorFrame, EffectConfig, EffectEngine, Surface};
//!
//! let mut engine = EffectEngine::with_seed(EffectConfig::default(), 7);
//! let report = engine.step(&DetectorFrame::empty(), Surface::new(1280.0, 720.0));
//! assert!(report.hands.iter().all(Option::is_none));
//! let frame = engine.render_frame();
//! println!("{} live particles", frame.particles.len());
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod fusion;
pub mod gesture;
pub mod landmark;
pub mod lightning;
pub mod particle;
pub mod pose;
pub mod render;
pub mod tracker;

pub use config::{EffectConfig, Mode};
pub use engine::{EffectEngine, FrameReport};
pub use error::{ConfigError, Result};
pub use fusion::{FusionBall, FusionEvent};
pub use landmark::{DetectorFrame, Handedness, HandLandmarks, Landmark, RawHand, RawLandmarks, Surface, TrackedHand};
pub use lightning::{BoltColor, LightningBolt};
pub use particle::{ExplosionBurst, Family, Particle};
pub use render::{EffectRenderer, FusionBallView, Glow, HandView, RenderFrame};
