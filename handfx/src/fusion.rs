//! Two-hand proximity state machine and the fusion orb.
//!
//! Palms that touch and then separate grow an orb whose size tracks their
//! distance.  Closing both hands into fists while the orb is live blows it
//! up into a radial particle burst and two shock rings.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use crate::config::FusionConfig;
use crate::landmark::{HandLandmarks, Surface};
use crate::particle::{ExplosionBurst, Family, Particle};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FusionBall {
    /// Pixel position.
    pub position: Vec2,
    /// Radius in pixels.
    pub size:     f32,
}

/// This frame's measurement of a left/right hand pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PairReading {
    /// Normalized palm-to-palm distance.
    pub distance:   f32,
    /// Palm midpoint in pixels, already lifted by the palm offset.
    pub midpoint:   Vec2,
    pub both_fists: bool,
}

impl PairReading {
    pub fn measure(
        left:       &HandLandmarks,
        right:      &HandLandmarks,
        both_fists: bool,
        surface:    &Surface,
        cfg:        &FusionConfig,
    ) -> Self {
        let (l, r) = (left.palm(), right.palm());
        let mid = surface.project(l.midpoint(&r));
        PairReading {
            distance: l.distance(&r),
            midpoint: mid - Vec2::new(0.0, cfg.palm_offset_px),
            both_fists,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FusionEvent {
    Idle,
    Touching,
    Holding(FusionBall),
    Exploded(FusionBall),
}

/// Orb radius for a palm distance: linear over
/// `[touch_threshold, touch_threshold + distance_range]`, clamped outside.
pub fn ball_size_px(distance: f32, cfg: &FusionConfig) -> f32 {
    let range = cfg.distance_range.max(f32::EPSILON);
    let t = ((distance - cfg.touch_threshold) / range).clamp(0.0, 1.0);
    (cfg.min_cm + t * (cfg.max_cm - cfg.min_cm)) * cfg.px_per_cm
}

/// Slow breathing of the orb radius, in `[1 − 2·depth, 1]`.
pub fn pulse_factor(elapsed_ms: f32, cfg: &FusionConfig) -> f32 {
    (1.0 - cfg.pulse_depth) + cfg.pulse_depth * (elapsed_ms * cfg.pulse_rate).sin()
}

// ════════════════════════════════════════════════════════════════════════════
// ProximityState
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProximityState {
    touching:    bool,
    touch_point: Option<Vec2>,
    ball:        Option<FusionBall>,
}

impl ProximityState {
    pub fn ball(&self) -> Option<FusionBall> { self.ball }
    pub fn is_touching(&self) -> bool { self.touching }

    /// Advance one frame.  `None` means the hands aren't a left/right pair
    /// this frame, which drops all state.
    pub fn update(&mut self, reading: Option<PairReading>, cfg: &FusionConfig) -> FusionEvent {
        let Some(r) = reading else {
            self.reset();
            return FusionEvent::Idle;
        };

        if let (Some(ball), true) = (self.ball, r.both_fists) {
            self.reset();
            return FusionEvent::Exploded(ball);
        }

        if r.distance < cfg.touch_threshold {
            self.touching = true;
            self.touch_point = Some(r.midpoint);
            self.ball = None;
            return FusionEvent::Touching;
        }

        let separated = self.touching && self.touch_point.is_some();
        self.touching = false;
        self.touch_point = None;
        if separated || self.ball.is_some() {
            let ball = FusionBall { position: r.midpoint, size: ball_size_px(r.distance, cfg) };
            self.ball = Some(ball);
            return FusionEvent::Holding(ball);
        }
        FusionEvent::Idle
    }

    pub fn reset(&mut self) { *self = ProximityState::default(); }
}

// ════════════════════════════════════════════════════════════════════════════
// Explosion
// ════════════════════════════════════════════════════════════════════════════

/// Number of burst particles for an orb of `size` pixels.
pub fn burst_count(size: f32, cfg: &FusionConfig) -> usize {
    cfg.burst_base_count + (size / cfg.burst_size_divisor).max(0.0).floor() as usize
}

/// Draw a burst particle's family from the dedicated family stream.
pub fn burst_family<R: Rng>(rng: &mut R, cfg: &FusionConfig) -> Family {
    let r = rng.gen::<f32>();
    if r < cfg.burst_ice_share {
        Family::Ice
    } else if r < cfg.burst_ice_share + cfg.burst_fire_share {
        Family::Fire
    } else {
        Family::Fusion
    }
}

/// Blow up `ball`: a ring of particles flung outward with an upward bias,
/// plus an outer and an inner shock ring.
pub fn explode<J: Rng, F: Rng>(
    jitter: &mut J,
    family: &mut F,
    ball:   FusionBall,
    cfg:    &FusionConfig,
) -> (Vec<Particle>, [ExplosionBurst; 2]) {
    let rings = [
        ExplosionBurst::new(ball.position, ball.size * cfg.outer_ring_ratio, cfg.outer_ring_decay),
        ExplosionBurst::new(ball.position, ball.size * cfg.inner_ring_ratio, cfg.inner_ring_decay),
    ];

    let count = burst_count(ball.size, cfg);
    let scatter = ball.size * cfg.burst_scatter;
    let vj = cfg.burst_velocity_jitter;
    let particles = (0..count)
        .map(|i| {
            let angle = TAU * i as f32 / count as f32 + jitter.gen::<f32>() * cfg.burst_angle_jitter;
            let speed = cfg.burst_speed_min + jitter.gen::<f32>() * cfg.burst_speed_spread;
            let vx = angle.cos() * speed + (jitter.gen::<f32>() - 0.5) * vj;
            let vy = angle.sin() * speed - cfg.burst_upward_bias + (jitter.gen::<f32>() - 0.5) * vj;
            let kind = burst_family(family, cfg);
            let offset = Vec2::new(
                (jitter.gen::<f32>() - 0.5) * scatter,
                (jitter.gen::<f32>() - 0.5) * scatter,
            );
            Particle {
                family:   kind,
                position: ball.position + offset,
                velocity: Vec2::new(vx, vy),
                life:     1.0,
                decay:    cfg.burst_decay,
                size:     cfg.burst_size_min + jitter.gen::<f32>() * cfg.burst_size_spread,
                is_trail: false,
            }
        })
        .collect();

    (particles, rings)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::Landmark;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn cfg() -> FusionConfig { FusionConfig::default() }

    fn reading(distance: f32, both_fists: bool) -> Option<PairReading> {
        Some(PairReading { distance, midpoint: Vec2::new(320.0, 170.0), both_fists })
    }

    const PX_PER_CM: f32 = 96.0 / 2.54;

    #[test]
    fn size_extremes() {
        assert!((ball_size_px(0.0, &cfg()) - PX_PER_CM).abs() < 1e-3);
        assert!((ball_size_px(0.18, &cfg()) - PX_PER_CM).abs() < 1e-3);
        assert!((ball_size_px(0.48, &cfg()) - 9.0 * PX_PER_CM).abs() < 1e-3);
        assert!((ball_size_px(2.0, &cfg()) - 9.0 * PX_PER_CM).abs() < 1e-3);
        assert!((ball_size_px(0.33, &cfg()) - 5.0 * PX_PER_CM).abs() < 1e-2);
    }

    #[test]
    fn pulse_bounds() {
        for ms in [0.0, 500.0, 1047.2, 3141.6, 10_000.0] {
            let p = pulse_factor(ms, &cfg());
            assert!((0.88 - 1e-5..=1.0 + 1e-5).contains(&p));
        }
        assert!((pulse_factor(0.0, &cfg()) - 0.94).abs() < 1e-6);
    }

    fn flat_hand(x: f32, y: f32) -> HandLandmarks {
        HandLandmarks::new([Landmark::new(x, y, 0.0); 21])
    }

    #[test]
    fn pair_reading_lifts_midpoint_above_palms() {
        let (l, r) = (flat_hand(0.4, 0.7), flat_hand(0.5, 0.7));
        let surface = Surface::new(640.0, 480.0);
        let reading = PairReading::measure(&l, &r, false, &surface, &cfg());
        assert!((reading.distance - 0.1).abs() < 1e-6);
        assert!((reading.midpoint - Vec2::new(288.0, 266.0)).length() < 1e-3);
        assert!(!reading.both_fists);

        let mirrored = PairReading::measure(&l, &r, true, &surface.mirrored(true), &cfg());
        assert!((mirrored.midpoint - Vec2::new(352.0, 266.0)).length() < 1e-3);
        assert!(mirrored.both_fists);
    }

    #[test]
    fn touch_then_separate_grows_ball() {
        let mut s = ProximityState::default();
        assert_eq!(s.update(reading(0.05, false), &cfg()), FusionEvent::Touching);
        assert!(s.is_touching());
        assert!(s.ball().is_none());

        match s.update(reading(0.25, false), &cfg()) {
            FusionEvent::Holding(b) => {
                assert!((b.size - ball_size_px(0.25, &cfg())).abs() < 1e-4);
                assert_eq!(b.position, Vec2::new(320.0, 170.0));
            }
            other => panic!("expected Holding, got {:?}", other),
        }
        assert!(!s.is_touching());

        // Ball persists and keeps following the distance.
        match s.update(reading(0.4, false), &cfg()) {
            FusionEvent::Holding(b) => assert!(b.size > ball_size_px(0.25, &cfg())),
            other => panic!("expected Holding, got {:?}", other),
        }
    }

    #[test]
    fn no_ball_without_prior_touch() {
        let mut s = ProximityState::default();
        assert_eq!(s.update(reading(0.25, false), &cfg()), FusionEvent::Idle);
        assert!(s.ball().is_none());
    }

    #[test]
    fn fists_without_ball_do_nothing() {
        let mut s = ProximityState::default();
        assert_eq!(s.update(reading(0.3, true), &cfg()), FusionEvent::Idle);
    }

    #[test]
    fn explodes_once_on_sustained_fists() {
        let mut s = ProximityState::default();
        s.update(reading(0.05, false), &cfg());
        s.update(reading(0.25, false), &cfg());
        let live = s.ball().unwrap();
        assert_eq!(s.update(reading(0.25, true), &cfg()), FusionEvent::Exploded(live));
        assert!(s.ball().is_none());
        assert!(!s.is_touching());
        assert_eq!(s.update(reading(0.25, true), &cfg()), FusionEvent::Idle);
    }

    #[test]
    fn re_touching_hides_ball() {
        let mut s = ProximityState::default();
        s.update(reading(0.05, false), &cfg());
        s.update(reading(0.3, false), &cfg());
        assert_eq!(s.update(reading(0.1, false), &cfg()), FusionEvent::Touching);
        assert!(s.ball().is_none());
    }

    #[test]
    fn losing_the_pair_resets() {
        let mut s = ProximityState::default();
        s.update(reading(0.05, false), &cfg());
        s.update(reading(0.3, false), &cfg());
        assert_eq!(s.update(None, &cfg()), FusionEvent::Idle);
        assert_eq!(s, ProximityState::default());
    }

    #[test]
    fn explosion_counts_and_rings() {
        let mut j = ChaCha8Rng::seed_from_u64(10);
        let mut f = ChaCha8Rng::seed_from_u64(11);
        let ball = FusionBall { position: Vec2::new(100.0, 100.0), size: 200.0 };
        let (particles, rings) = explode(&mut j, &mut f, ball, &cfg());
        assert_eq!(particles.len(), 35);
        assert_eq!(rings[0].max_radius, 500.0);
        assert_eq!(rings[1].max_radius, 360.0);
        assert_eq!(rings[0].decay, 0.12);
        assert_eq!(rings[1].decay, 0.18);
        for p in &particles {
            assert_eq!(p.decay, 0.008);
            assert!((20.0..55.0).contains(&p.size));
            assert!((p.position - ball.position).abs().max_element() <= 50.0);
        }
    }

    #[test]
    fn family_stream_is_independent_of_jitter() {
        let ball = FusionBall { position: Vec2::ZERO, size: 150.0 };
        let kinds = |jitter_seed: u64| {
            let mut j = ChaCha8Rng::seed_from_u64(jitter_seed);
            let mut f = ChaCha8Rng::seed_from_u64(99);
            explode(&mut j, &mut f, ball, &cfg()).0.iter().map(|p| p.family).collect::<Vec<_>>()
        };
        assert_eq!(kinds(1), kinds(2));
    }

    #[test]
    fn family_shares_roughly_match() {
        let mut f = ChaCha8Rng::seed_from_u64(5);
        let n = 10_000;
        let ice = (0..n).filter(|_| burst_family(&mut f, &cfg()) == Family::Ice).count();
        let share = ice as f32 / n as f32;
        assert!((share - 0.45).abs() < 0.03, "ice share {}", share);
    }

    proptest! {
        #[test]
        fn size_monotone_in_distance(a in 0.0f32..1.0, b in 0.0f32..1.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(ball_size_px(lo, &cfg()) <= ball_size_px(hi, &cfg()));
        }

        #[test]
        fn size_within_cm_range(d in -1.0f32..3.0) {
            let s = ball_size_px(d, &cfg());
            prop_assert!(s >= PX_PER_CM - 1e-3 && s <= 9.0 * PX_PER_CM + 1e-3);
        }
    }
}
