//! Particle families, particles, and explosion rings.
//!
//! Particles never shrink here: a renderer fades them purely by `life`,
//! which is the only fade driver.  Every live entity satisfies
//! `0 < life ≤ 1`; `advance` reports death and the owner culls.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{FamilyProfile, ParticleConfig};

// ════════════════════════════════════════════════════════════════════════════
// Family
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Fire,
    Ice,
    Red,
    Blue,
    Fusion,
}

/// One colour stop of a radial gradient.  Opacity at the stop is
/// `alpha × life`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub rgb:    [u8; 3],
    pub alpha:  f32,
}

const fn stop(offset: f32, r: u8, g: u8, b: u8, alpha: f32) -> GradientStop {
    GradientStop { offset, rgb: [r, g, b], alpha }
}

const FIRE_STOPS: [GradientStop; 4] = [
    stop(0.0, 255, 255, 220, 1.0),
    stop(0.2, 255, 180,   0, 0.8),
    stop(0.5, 255,  40,   0, 0.4),
    stop(1.0,   0,   0,   0, 0.0),
];

const ICE_STOPS: [GradientStop; 4] = [
    stop(0.0, 255, 255, 255, 1.0),
    stop(0.3, 180, 240, 255, 0.8),
    stop(0.6,   0, 150, 255, 0.4),
    stop(1.0,   0,   0,   0, 0.0),
];

const RED_STOPS: [GradientStop; 4] = [
    stop(0.0, 255, 200, 200, 1.0),
    stop(0.3, 255,   0,   0, 0.8),
    stop(0.6, 100,   0,   0, 0.4),
    stop(1.0,   0,   0,   0, 0.0),
];

const BLUE_STOPS: [GradientStop; 4] = [
    stop(0.0, 200, 200, 255, 1.0),
    stop(0.3,   0,   0, 255, 0.8),
    stop(0.6,   0,   0, 100, 0.4),
    stop(1.0,   0,   0,   0, 0.0),
];

const FUSION_STOPS: [GradientStop; 6] = [
    stop(0.0, 255, 255, 255, 1.0),
    stop(0.2, 255, 180, 100, 0.9),
    stop(0.4, 255,  80,   0, 0.7),
    stop(0.6, 100, 150, 255, 0.5),
    stop(0.8,   0, 100, 255, 0.3),
    stop(1.0,   0,   0,   0, 0.0),
];

// Hand glows: centre and half-way colours; the edge is transparent.
const FIRE_GLOW:   [GradientStop; 3] = [stop(0.0, 255, 60, 0, 1.0),   stop(0.5, 255, 30, 0, 1.0 / 3.0),  stop(1.0, 0, 0, 0, 0.0)];
const ICE_GLOW:    [GradientStop; 3] = [stop(0.0, 100, 200, 255, 1.0), stop(0.5, 0, 100, 255, 0.25),  stop(1.0, 0, 0, 0, 0.0)];
const RED_GLOW:    [GradientStop; 3] = [stop(0.0, 255, 0, 0, 1.0),    stop(0.5, 200, 0, 0, 1.0 / 3.0),   stop(1.0, 0, 0, 0, 0.0)];
const BLUE_GLOW:   [GradientStop; 3] = [stop(0.0, 0, 0, 255, 1.0),    stop(0.5, 0, 50, 255, 0.25),       stop(1.0, 0, 0, 0, 0.0)];
const FUSION_GLOW: [GradientStop; 3] = [stop(0.0, 255, 200, 255, 1.0), stop(0.5, 120, 140, 255, 0.3),    stop(1.0, 0, 0, 0, 0.0)];

impl Family {
    pub fn all() -> [Family; 5] {
        [Family::Fire, Family::Ice, Family::Red, Family::Blue, Family::Fusion]
    }

    pub fn name(self) -> &'static str {
        match self {
            Family::Fire   => "fire",
            Family::Ice    => "ice",
            Family::Red    => "red",
            Family::Blue   => "blue",
            Family::Fusion => "fusion",
        }
    }

    /// Radial gradient for one particle disc, centre (0) to rim (1).
    pub fn gradient(self) -> &'static [GradientStop] {
        match self {
            Family::Fire   => &FIRE_STOPS,
            Family::Ice    => &ICE_STOPS,
            Family::Red    => &RED_STOPS,
            Family::Blue   => &BLUE_STOPS,
            Family::Fusion => &FUSION_STOPS,
        }
    }

    /// Screen-blended hand glow; multiply alphas by the glow's own alpha.
    pub fn glow_gradient(self) -> &'static [GradientStop] {
        match self {
            Family::Fire   => &FIRE_GLOW,
            Family::Ice    => &ICE_GLOW,
            Family::Red    => &RED_GLOW,
            Family::Blue   => &BLUE_GLOW,
            Family::Fusion => &FUSION_GLOW,
        }
    }
}

/// Sample a gradient at `t ∈ [0, 1]`, returning `(rgb, alpha)` with linear
/// interpolation between stops.
pub fn sample_gradient(stops: &[GradientStop], t: f32) -> ([f32; 3], f32) {
    let t = t.clamp(0.0, 1.0);
    let Some(first) = stops.first() else { return ([0.0; 3], 0.0) };
    if t <= first.offset {
        return (rgb_f32(first.rgb), first.alpha);
    }
    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t <= b.offset {
            let span = (b.offset - a.offset).max(f32::EPSILON);
            let k = (t - a.offset) / span;
            let ca = rgb_f32(a.rgb);
            let cb = rgb_f32(b.rgb);
            let rgb = [
                ca[0] + (cb[0] - ca[0]) * k,
                ca[1] + (cb[1] - ca[1]) * k,
                ca[2] + (cb[2] - ca[2]) * k,
            ];
            return (rgb, a.alpha + (b.alpha - a.alpha) * k);
        }
    }
    let last = stops[stops.len() - 1];
    (rgb_f32(last.rgb), last.alpha)
}

fn rgb_f32(c: [u8; 3]) -> [f32; 3] { [c[0] as f32, c[1] as f32, c[2] as f32] }

// ════════════════════════════════════════════════════════════════════════════
// Particle
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub family:   Family,
    pub position: Vec2,
    pub velocity: Vec2,
    pub life:     f32,
    pub decay:    f32,
    /// Disc radius in pixels.
    pub size:     f32,
    /// Drawn along a pinch path: spawned at rest, decays slowly.
    pub is_trail: bool,
}

impl Particle {
    /// Integrate one frame.  Returns false once the particle is dead.
    pub fn advance(&mut self) -> bool {
        self.position += self.velocity;
        self.life -= self.decay;
        self.life > 0.0
    }
}

fn centered<R: Rng>(rng: &mut R, span: f32) -> f32 {
    (rng.gen::<f32>() - 0.5) * span
}

/// Ballistic particle thrown off a charged hand.  Upward speed grows with
/// the hand's surge.
pub fn spawn_ambient<R: Rng>(
    rng:     &mut R,
    family:  Family,
    at:      Vec2,
    surge:   f32,
    profile: &FamilyProfile,
    cfg:     &ParticleConfig,
) -> Particle {
    let position = at + Vec2::new(centered(rng, cfg.ambient_jitter), centered(rng, cfg.ambient_jitter));
    let vx = centered(rng, cfg.lateral_spread);
    let vy = -(rng.gen::<f32>() * profile.rise_spread) - profile.rise_min - surge * profile.surge_gain;
    Particle {
        family,
        position,
        velocity: Vec2::new(vx, vy),
        life:     1.0,
        decay:    cfg.ambient_decay,
        size:     rng.gen::<f32>() * profile.size_spread + profile.size_min,
        is_trail: false,
    }
}

/// Stationary particle laid down along a pinch stroke.
pub fn spawn_trail<R: Rng>(rng: &mut R, family: Family, at: Vec2, cfg: &ParticleConfig) -> Particle {
    let position = at + Vec2::new(centered(rng, cfg.trail_jitter), centered(rng, cfg.trail_jitter));
    Particle {
        family,
        position,
        velocity: Vec2::ZERO,
        life:     1.0,
        decay:    cfg.trail_decay,
        size:     rng.gen::<f32>() * cfg.trail_size_spread + cfg.trail_size_min,
        is_trail: true,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ExplosionBurst — expanding shock ring
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub struct ExplosionBurst {
    pub position:   Vec2,
    pub radius:     f32,
    pub max_radius: f32,
    pub life:       f32,
    pub decay:      f32,
}

impl ExplosionBurst {
    pub fn new(position: Vec2, max_radius: f32, decay: f32) -> Self {
        ExplosionBurst { position, radius: 0.0, max_radius, life: 1.0, decay }
    }

    /// Ease the radius toward `max_radius` and fade.  Returns false once dead.
    pub fn advance(&mut self, easing: f32) -> bool {
        self.radius += (self.max_radius - self.radius) * easing;
        self.life -= self.decay;
        self.life > 0.0
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Profiles;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng { ChaCha8Rng::seed_from_u64(7) }

    #[test]
    fn trail_particles_start_at_rest() {
        let cfg = ParticleConfig::default();
        let p = spawn_trail(&mut rng(), Family::Fire, Vec2::new(100.0, 100.0), &cfg);
        assert_eq!(p.velocity, Vec2::ZERO);
        assert!(p.is_trail);
        assert!((p.position - Vec2::new(100.0, 100.0)).abs().max_element() <= 5.0);
        assert!((20.0..40.0).contains(&p.size));
    }

    #[test]
    fn ambient_particles_rise() {
        let cfg = ParticleConfig::default();
        let profiles = Profiles::default();
        let mut r = rng();
        for _ in 0..100 {
            let p = spawn_ambient(&mut r, Family::Ice, Vec2::ZERO, 0.0, &profiles.ice, &cfg);
            assert!(p.velocity.y <= -2.0 && p.velocity.y >= -7.0);
            assert!(p.velocity.x.abs() <= 2.0);
            assert!(!p.is_trail);
        }
    }

    #[test]
    fn surge_kicks_upward() {
        let cfg = ParticleConfig::default();
        let profiles = Profiles::default();
        let calm  = spawn_ambient(&mut rng(), Family::Fire, Vec2::ZERO, 0.0, &profiles.fire, &cfg);
        let kick  = spawn_ambient(&mut rng(), Family::Fire, Vec2::ZERO, 1.0, &profiles.fire, &cfg);
        assert!((calm.velocity.y - kick.velocity.y - 20.0).abs() < 1e-4);
    }

    #[test]
    fn burst_eases_toward_max() {
        let mut b = ExplosionBurst::new(Vec2::ZERO, 100.0, 0.12);
        b.advance(0.25);
        assert_eq!(b.radius, 25.0);
        b.advance(0.25);
        assert_eq!(b.radius, 43.75);
        let mut frames = 2;
        while b.advance(0.25) { frames += 1; }
        assert_eq!(frames, 8);
        assert!(b.radius < b.max_radius);
    }

    #[test]
    fn gradient_endpoints() {
        let (rgb, a) = sample_gradient(Family::Fire.gradient(), 0.0);
        assert_eq!(rgb, [255.0, 255.0, 220.0]);
        assert_eq!(a, 1.0);
        let (_, a) = sample_gradient(Family::Fire.gradient(), 1.0);
        assert_eq!(a, 0.0);
        let (rgb, a) = sample_gradient(Family::Ice.gradient(), 0.15);
        assert!((a - 0.9).abs() < 1e-5);
        assert!((rgb[0] - 217.5).abs() < 1e-3);
    }

    #[test]
    fn every_family_gradient_fades_to_transparent() {
        for f in Family::all() {
            assert_eq!(f.gradient().last().unwrap().alpha, 0.0, "{}", f.name());
            assert_eq!(f.glow_gradient().last().unwrap().alpha, 0.0, "{}", f.name());
        }
    }

    proptest! {
        #[test]
        fn life_stays_in_unit_interval_while_alive(decay in 0.001f32..1.0, frames in 1usize..400) {
            let mut p = Particle {
                family: Family::Blue, position: Vec2::ZERO, velocity: Vec2::ONE,
                life: 1.0, decay, size: 10.0, is_trail: false,
            };
            for _ in 0..frames {
                if !p.advance() {
                    prop_assert!(p.life <= 0.0);
                    break;
                }
                prop_assert!(p.life > 0.0 && p.life <= 1.0);
            }
        }
    }
}
