//! Render output contract.
//!
//! The engine never draws.  Each frame it hands a borrowed [`RenderFrame`]
//! to whatever implements [`EffectRenderer`]; the renderer owns blend modes,
//! gradients and strokes.  Opacity of every particle, bolt and ring is its
//! `life`.

use glam::Vec2;

use crate::landmark::{Handedness, HandLandmarks, Surface};
use crate::lightning::LightningBolt;
use crate::particle::{ExplosionBurst, Family, Particle};

/// Screen-blended radial glow under a charged palm.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Glow {
    pub family: Family,
    pub center: Vec2,
    pub radius: f32,
    pub alpha:  f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FusionBallView {
    pub position: Vec2,
    pub size:     f32,
    /// Multiply `size` by this to get the drawn radius.
    pub pulse:    f32,
}

impl FusionBallView {
    pub fn radius(&self) -> f32 { self.size * self.pulse }
}

/// A hand as seen this frame, for skeleton overlays.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandView<'a> {
    pub handedness: Handedness,
    pub landmarks:  &'a HandLandmarks,
    pub intensity:  f32,
    pub pinch:      bool,
}

pub struct RenderFrame<'a> {
    pub surface:   Surface,
    pub particles: &'a [Particle],
    pub bolts:     &'a [LightningBolt],
    pub bursts:    &'a [ExplosionBurst],
    pub ball:      Option<FusionBallView>,
    pub glows:     &'a [Glow],
    /// Full-screen lightning flash alpha, when one fired this frame.
    pub flash:     Option<f32>,
    pub hands:     Vec<HandView<'a>>,
}

pub trait EffectRenderer {
    fn render(&mut self, frame: &RenderFrame<'_>);
}
