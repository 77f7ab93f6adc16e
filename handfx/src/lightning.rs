//! Procedural lightning: the mode-wide intensity accumulator, flash rolls,
//! and fixed-length random-walk bolts.

use glam::Vec2;
use rand::Rng;

use crate::config::LightningConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoltColor {
    /// `#e0ffff`
    Pale,
    /// `#00bfff`
    Sky,
}

impl BoltColor {
    pub fn rgb(self) -> [u8; 3] {
        match self {
            BoltColor::Pale => [0xe0, 0xff, 0xff],
            BoltColor::Sky  => [0x00, 0xbf, 0xff],
        }
    }
}

/// One bolt.  Life is derived from an integer age so a bolt with decay
/// `1/n` dies after exactly `n` frames.
#[derive(Clone, Debug, PartialEq)]
pub struct LightningBolt {
    pub path:  Vec<Vec2>,
    pub color: BoltColor,
    age:       u32,
    decay:     f32,
}

impl LightningBolt {
    pub fn life(&self) -> f32 { 1.0 - self.age as f32 * self.decay }

    /// Returns false once the bolt is dead.
    pub fn advance(&mut self) -> bool {
        self.age += 1;
        self.life() > 1e-6
    }
}

/// Random walk of `cfg.segments` points starting at `origin`.  Horizontal
/// steps are centred; vertical steps lean upward by `vertical_bias`.
pub fn generate_bolt<R: Rng>(rng: &mut R, origin: Vec2, cfg: &LightningConfig) -> LightningBolt {
    let mut path = Vec::with_capacity(cfg.segments);
    let mut at = origin;
    for _ in 0..cfg.segments {
        path.push(at);
        at.x += (rng.gen::<f32>() - 0.5) * cfg.step_px;
        at.y += (rng.gen::<f32>() - cfg.vertical_bias) * cfg.step_px;
    }
    let color = if rng.gen::<f32>() > 0.5 { BoltColor::Pale } else { BoltColor::Sky };
    LightningBolt { path, color, age: 0, decay: cfg.decay }
}

// ════════════════════════════════════════════════════════════════════════════
// LightningState
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LightningState {
    intensity: f32,
}

impl LightningState {
    pub fn intensity(&self) -> f32 { self.intensity }

    pub fn is_active(&self, cfg: &LightningConfig) -> bool {
        self.intensity > cfg.active_floor
    }

    /// Ramp while any hand is open in lightning mode; drain otherwise.
    pub fn update(&mut self, lightning_mode: bool, any_open: bool, cfg: &LightningConfig) {
        self.intensity += match (lightning_mode, any_open) {
            (true, true)  => cfg.rise,
            (true, false) => -cfg.fall,
            (false, _)    => -cfg.off_mode_fall,
        };
        self.intensity = self.intensity.clamp(0.0, 1.0);
    }

    /// Full-screen flash alpha for this frame, if one fires.
    pub fn roll_flash<R: Rng>(&self, rng: &mut R, cfg: &LightningConfig) -> Option<f32> {
        if !self.is_active(cfg) {
            return None;
        }
        (rng.gen::<f32>() < cfg.flash_chance * self.intensity).then(|| cfg.flash_alpha * self.intensity)
    }

    /// Attempt a bolt at `origin`: the anchor roll with `chance`, then an
    /// acceptance roll against the current intensity.
    pub fn try_bolt<R: Rng>(
        &self,
        rng:    &mut R,
        origin: Vec2,
        chance: f32,
        cfg:    &LightningConfig,
    ) -> Option<LightningBolt> {
        if rng.gen::<f32>() >= chance {
            return None;
        }
        if rng.gen::<f32>() > self.intensity {
            return None;
        }
        Some(generate_bolt(rng, origin, cfg))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn cfg() -> LightningConfig { LightningConfig::default() }

    #[test]
    fn bolts_have_exactly_25_points() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..50 {
            let b = generate_bolt(&mut rng, Vec2::new(200.0, 300.0), &cfg());
            assert_eq!(b.path.len(), 25);
            assert_eq!(b.path[0], Vec2::new(200.0, 300.0));
        }
    }

    #[test]
    fn bolt_steps_bounded() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let b = generate_bolt(&mut rng, Vec2::ZERO, &cfg());
        for w in b.path.windows(2) {
            let d = w[1] - w[0];
            assert!(d.x.abs() <= 40.0);
            assert!(d.y >= -64.0 && d.y <= 16.0);
        }
    }

    #[test]
    fn bolt_dies_after_exactly_ten_frames() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut b = generate_bolt(&mut rng, Vec2::ZERO, &cfg());
        for frame in 1..10 {
            assert!(b.advance(), "died early at frame {}", frame);
            assert!(b.life() > 0.0);
        }
        assert!(!b.advance());
        assert!(b.life() <= 1e-6);
    }

    #[test]
    fn intensity_ramps_and_drains() {
        let mut s = LightningState::default();
        for _ in 0..5 { s.update(true, true, &cfg()); }
        assert!((s.intensity() - 0.4).abs() < 1e-5);
        s.update(true, false, &cfg());
        assert!((s.intensity() - 0.35).abs() < 1e-5);
        s.update(false, true, &cfg());
        assert!((s.intensity() - 0.25).abs() < 1e-5);
        for _ in 0..10 { s.update(false, true, &cfg()); }
        assert_eq!(s.intensity(), 0.0);
        for _ in 0..30 { s.update(true, true, &cfg()); }
        assert_eq!(s.intensity(), 1.0);
    }

    #[test]
    fn no_flash_or_bolts_when_idle() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let s = LightningState::default();
        for _ in 0..100 {
            assert!(s.roll_flash(&mut rng, &cfg()).is_none());
            assert!(s.try_bolt(&mut rng, Vec2::ZERO, 1.0, &cfg()).is_none());
        }
    }

    #[test]
    fn flash_alpha_scales_with_intensity() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut s = LightningState::default();
        for _ in 0..20 { s.update(true, true, &cfg()); }
        let alphas: Vec<f32> = (0..200).filter_map(|_| s.roll_flash(&mut rng, &cfg())).collect();
        assert!(!alphas.is_empty());
        assert!(alphas.iter().all(|&a| (a - 0.25).abs() < 1e-6));
    }
}
