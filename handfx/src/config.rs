//! Tunable constants, grouped the way the engine consumes them.
//!
//! Every section derives `Deserialize` with `#[serde(default)]`, so a TOML
//! file only has to name the values it changes:
//!
//! ```toml
//! mirror_x = true
//!
//! [fusion]
//! touch_threshold = 0.2
//!
//! [palettes.red_blue]
//! left  = "red"
//! right = "fusion"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::particle::Family;

// ════════════════════════════════════════════════════════════════════════════
// Mode
// ════════════════════════════════════════════════════════════════════════════

/// The effect family currently driven by the hands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Left hand burns, right hand freezes; two-hand fusion orb enabled.
    #[default]
    FireIce,
    /// Open hands throw lightning bolts.
    Lightning,
    /// Left hand red energy, right hand blue energy; fusion orb enabled.
    RedBlue,
}

impl Mode {
    pub fn name(self) -> &'static str {
        match self {
            Mode::FireIce   => "fire & ice",
            Mode::Lightning => "lightning",
            Mode::RedBlue   => "red & blue",
        }
    }

    /// Modes where hands charge intensity, spawn particles and can fuse.
    pub fn is_paired(self) -> bool { !matches!(self, Mode::Lightning) }
}

// ════════════════════════════════════════════════════════════════════════════
// Classifier
// ════════════════════════════════════════════════════════════════════════════

/// Which open-palm predicate to use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenPalmRule {
    /// Tip farther from the wrist than the PIP joint, for ≥ `open_min_fingers`.
    #[default]
    WristDistance,
    /// Tip above PIP (with a y margin) for at least one finger, and not an
    /// OK sign.  Suited to 2D-only detectors looking down on the hand.
    TopDown,
}

/// Which pinch predicate feeds the latch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinchRule {
    /// Velocity-gated, hand-size-relative thumb/index distance.
    #[default]
    Gated,
    /// Absolute thumb/index distance with the other three fingers curled.
    /// Needs no wrist history.
    OkSign,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub open_rule:           OpenPalmRule,
    pub pinch_rule:          PinchRule,
    pub open_min_fingers:    usize,
    pub top_down_margin:     f32,
    /// A finger is curled when `dist(tip, wrist) < fist_ratio × dist(pip, wrist)`.
    pub fist_ratio:          f32,
    pub fist_min_fingers:    usize,
    /// Wrist movement per frame (normalized units) above which pinch is ignored.
    pub wrist_velocity_gate: f32,
    /// Of middle/ring/pinky, how many must be extended for a pinch.
    pub pinch_min_extended:  usize,
    /// Thumb/index gap relative to hand size that counts as pinched.
    pub pinch_ratio:         f32,
    pub ok_threshold:        f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            open_rule:           OpenPalmRule::WristDistance,
            pinch_rule:          PinchRule::Gated,
            open_min_fingers:    3,
            top_down_margin:     0.05,
            fist_ratio:          1.1,
            fist_min_fingers:    3,
            wrist_velocity_gate: 0.05,
            pinch_min_extended:  2,
            pinch_ratio:         0.35,
            ok_threshold:        0.22,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tracker
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Frames pinch stays active after the last raw pinch reading.
    pub pinch_latch_frames: u32,
    pub intensity_rise:     f32,
    pub intensity_fall:     f32,
    pub surge_decay:        f32,
    /// Surge below this snaps to zero.
    pub surge_floor:        f32,
    /// Hands at or below this intensity spawn nothing.
    pub spawn_floor:        f32,
    /// Missed detector frames tolerated before a hand's state is reset.
    pub hand_grace_frames:  u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            pinch_latch_frames: 5,
            intensity_rise:     0.05,
            intensity_fall:     0.15,
            surge_decay:        0.92,
            surge_floor:        0.01,
            spawn_floor:        0.01,
            hand_grace_frames:  3,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Fusion ball + explosion
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Palm-to-palm distance (normalized) below which hands touch.
    pub touch_threshold: f32,
    /// Distance span above the threshold mapped onto the ball size range.
    pub distance_range:  f32,
    pub min_cm:          f32,
    pub max_cm:          f32,
    pub px_per_cm:       f32,
    /// The orb floats this many pixels above the palm midpoint.
    pub palm_offset_px:  f32,
    /// Pulse angular rate per elapsed millisecond.
    pub pulse_rate:      f32,
    pub pulse_depth:     f32,

    pub outer_ring_ratio: f32,
    pub outer_ring_decay: f32,
    pub inner_ring_ratio: f32,
    pub inner_ring_decay: f32,
    pub ring_easing:      f32,

    pub burst_base_count:   usize,
    pub burst_size_divisor: f32,
    pub burst_speed_min:    f32,
    pub burst_speed_spread: f32,
    pub burst_angle_jitter: f32,
    pub burst_velocity_jitter: f32,
    pub burst_upward_bias:  f32,
    /// Spawn scatter around the ball centre, as a fraction of ball size.
    pub burst_scatter:      f32,
    pub burst_decay:        f32,
    pub burst_size_min:     f32,
    pub burst_size_spread:  f32,
    /// Probability a burst particle is ice.
    pub burst_ice_share:    f32,
    /// Probability a burst particle is fire; the remainder is fusion.
    pub burst_fire_share:   f32,
}

impl Default for FusionConfig {
    fn default() -> Self {
        FusionConfig {
            touch_threshold: 0.18,
            distance_range:  0.3,
            min_cm:          1.0,
            max_cm:          9.0,
            px_per_cm:       96.0 / 2.54,
            palm_offset_px:  70.0,
            pulse_rate:      0.0015,
            pulse_depth:     0.06,

            outer_ring_ratio: 2.5,
            outer_ring_decay: 0.12,
            inner_ring_ratio: 1.8,
            inner_ring_decay: 0.18,
            ring_easing:      0.25,

            burst_base_count:      25,
            burst_size_divisor:    20.0,
            burst_speed_min:       8.0,
            burst_speed_spread:    14.0,
            burst_angle_jitter:    1.2,
            burst_velocity_jitter: 4.0,
            burst_upward_bias:     6.0,
            burst_scatter:         0.5,
            burst_decay:           0.008,
            burst_size_min:        20.0,
            burst_size_spread:     35.0,
            burst_ice_share:       0.45,
            burst_fire_share:      0.25,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Lightning
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightningConfig {
    pub rise:              f32,
    pub fall:              f32,
    /// Per-frame decay while another mode is selected.
    pub off_mode_fall:     f32,
    pub active_floor:      f32,
    pub flash_chance:      f32,
    pub flash_alpha:       f32,
    pub tip_chance:        f32,
    pub connection_chance: f32,
    pub segments:          usize,
    /// Maximum random-walk step in pixels, per axis.
    pub step_px:           f32,
    /// Vertical jitter is `(u − vertical_bias) × step_px`; 0.5 is unbiased.
    pub vertical_bias:     f32,
    pub decay:             f32,
}

impl Default for LightningConfig {
    fn default() -> Self {
        LightningConfig {
            rise:              0.08,
            fall:              0.05,
            off_mode_fall:     0.1,
            active_floor:      0.01,
            flash_chance:      0.5,
            flash_alpha:       0.25,
            tip_chance:        0.07,
            connection_chance: 0.005,
            segments:          25,
            step_px:           80.0,
            vertical_bias:     0.8,
            decay:             0.1,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Particles
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    /// Oldest particles are dropped beyond this count.
    pub max_live:          usize,
    /// Trail particles spawned per pinching hand per frame.
    pub trail_count:       usize,
    pub trail_jitter:      f32,
    pub trail_decay:       f32,
    pub trail_size_min:    f32,
    pub trail_size_spread: f32,
    pub ambient_jitter:    f32,
    pub ambient_decay:     f32,
    pub lateral_spread:    f32,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        ParticleConfig {
            max_live:          3000,
            trail_count:       2,
            trail_jitter:      10.0,
            trail_decay:       0.0055,
            trail_size_min:    20.0,
            trail_size_spread: 20.0,
            ambient_jitter:    15.0,
            ambient_decay:     1.0 / 6.0,
            lateral_spread:    4.0,
        }
    }
}

/// Glow drawn under a charged hand.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GlowProfile {
    pub radius:       f32,
    pub flicker_amp:  f32,
    /// Flicker angular rate per elapsed millisecond.
    pub flicker_rate: f32,
    /// Peak alpha at full intensity.
    pub alpha:        f32,
}

/// Kinematics of ambient particles for one family.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FamilyProfile {
    /// Upward speed is `rise_min + u × rise_spread + surge × surge_gain`.
    pub rise_min:    f32,
    pub rise_spread: f32,
    pub surge_gain:  f32,
    pub size_min:    f32,
    pub size_spread: f32,
    pub glow:        GlowProfile,
}

impl FamilyProfile {
    fn hot() -> Self {
        FamilyProfile {
            rise_min: 4.0, rise_spread: 10.0, surge_gain: 20.0,
            size_min: 8.0, size_spread: 22.0,
            glow: GlowProfile { radius: 550.0, flicker_amp: 25.0, flicker_rate: 0.02, alpha: 0.45 },
        }
    }

    fn cold() -> Self {
        FamilyProfile {
            rise_min: 2.0, rise_spread: 5.0, surge_gain: 15.0,
            size_min: 5.0, size_spread: 20.0,
            glow: GlowProfile { radius: 400.0, flicker_amp: 20.0, flicker_rate: 0.01, alpha: 0.4 },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profiles {
    pub fire:   FamilyProfile,
    pub ice:    FamilyProfile,
    pub red:    FamilyProfile,
    pub blue:   FamilyProfile,
    pub fusion: FamilyProfile,
}

impl Default for Profiles {
    fn default() -> Self {
        let mut fusion = FamilyProfile::hot();
        fusion.glow = GlowProfile { radius: 480.0, flicker_amp: 22.0, flicker_rate: 0.015, alpha: 0.4 };
        Profiles {
            fire:  FamilyProfile::hot(),
            ice:   FamilyProfile::cold(),
            red:   FamilyProfile::hot(),
            blue:  FamilyProfile::cold(),
            fusion,
        }
    }
}

impl Profiles {
    pub fn get(&self, family: Family) -> &FamilyProfile {
        match family {
            Family::Fire   => &self.fire,
            Family::Ice    => &self.ice,
            Family::Red    => &self.red,
            Family::Blue   => &self.blue,
            Family::Fusion => &self.fusion,
        }
    }
}

/// Which family each hand emits in a paired mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModePalette {
    pub left:  Family,
    pub right: Family,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palettes {
    pub fire_ice: ModePalette,
    pub red_blue: ModePalette,
}

impl Default for Palettes {
    fn default() -> Self {
        Palettes {
            fire_ice: ModePalette { left: Family::Fire, right: Family::Ice  },
            red_blue: ModePalette { left: Family::Red,  right: Family::Blue },
        }
    }
}

impl Palettes {
    /// Palette for a paired mode; `None` in lightning mode.
    pub fn for_mode(&self, mode: Mode) -> Option<&ModePalette> {
        match mode {
            Mode::FireIce   => Some(&self.fire_ice),
            Mode::RedBlue   => Some(&self.red_blue),
            Mode::Lightning => None,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// EffectConfig
// ════════════════════════════════════════════════════════════════════════════

/// Complete engine configuration.  `Default` reproduces the tuned constants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectConfig {
    pub mode:       Mode,
    /// Nominal frame period, used for time-based pulse and flicker.
    pub frame_ms:   f32,
    /// Map landmark x to `(1 − x) × width` (selfie view).
    pub mirror_x:   bool,
    pub classifier: ClassifierConfig,
    pub tracker:    TrackerConfig,
    pub fusion:     FusionConfig,
    pub lightning:  LightningConfig,
    pub particles:  ParticleConfig,
    pub profiles:   Profiles,
    pub palettes:   Palettes,
}

impl Default for EffectConfig {
    fn default() -> Self {
        EffectConfig {
            mode:       Mode::FireIce,
            frame_ms:   1000.0 / 60.0,
            mirror_x:   false,
            classifier: ClassifierConfig::default(),
            tracker:    TrackerConfig::default(),
            fusion:     FusionConfig::default(),
            lightning:  LightningConfig::default(),
            particles:  ParticleConfig::default(),
            profiles:   Profiles::default(),
            palettes:   Palettes::default(),
        }
    }
}

impl EffectConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let cfg: EffectConfig = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        positive("frame_ms", self.frame_ms)?;

        let c = &self.classifier;
        in_range("classifier.open_min_fingers", c.open_min_fingers as f32, 1.0, 4.0)?;
        in_range("classifier.fist_min_fingers", c.fist_min_fingers as f32, 1.0, 4.0)?;
        in_range("classifier.pinch_min_extended", c.pinch_min_extended as f32, 0.0, 3.0)?;
        positive("classifier.fist_ratio", c.fist_ratio)?;
        positive("classifier.wrist_velocity_gate", c.wrist_velocity_gate)?;
        positive("classifier.pinch_ratio", c.pinch_ratio)?;
        positive("classifier.ok_threshold", c.ok_threshold)?;

        let t = &self.tracker;
        if t.pinch_latch_frames == 0 {
            return Err(out_of_range("tracker.pinch_latch_frames", "must be at least 1"));
        }
        unit("tracker.intensity_rise", t.intensity_rise)?;
        unit("tracker.intensity_fall", t.intensity_fall)?;
        unit("tracker.surge_decay", t.surge_decay)?;
        unit("tracker.surge_floor", t.surge_floor)?;

        let f = &self.fusion;
        positive("fusion.touch_threshold", f.touch_threshold)?;
        positive("fusion.distance_range", f.distance_range)?;
        positive("fusion.min_cm", f.min_cm)?;
        if f.max_cm < f.min_cm {
            return Err(out_of_range("fusion.max_cm", format!(
                "{} is smaller than min_cm {}", f.max_cm, f.min_cm
            )));
        }
        positive("fusion.px_per_cm", f.px_per_cm)?;
        unit("fusion.ring_easing", f.ring_easing)?;
        positive("fusion.outer_ring_decay", f.outer_ring_decay)?;
        positive("fusion.inner_ring_decay", f.inner_ring_decay)?;
        positive("fusion.burst_size_divisor", f.burst_size_divisor)?;
        positive("fusion.burst_decay", f.burst_decay)?;
        unit("fusion.burst_ice_share", f.burst_ice_share)?;
        unit("fusion.burst_fire_share", f.burst_fire_share)?;
        if f.burst_ice_share + f.burst_fire_share > 1.0 {
            return Err(out_of_range("fusion.burst_fire_share", "ice + fire shares exceed 1"));
        }

        let l = &self.lightning;
        unit("lightning.rise", l.rise)?;
        unit("lightning.fall", l.fall)?;
        unit("lightning.off_mode_fall", l.off_mode_fall)?;
        unit("lightning.flash_chance", l.flash_chance)?;
        unit("lightning.tip_chance", l.tip_chance)?;
        unit("lightning.connection_chance", l.connection_chance)?;
        unit("lightning.vertical_bias", l.vertical_bias)?;
        positive("lightning.decay", l.decay)?;
        if l.segments < 2 {
            return Err(out_of_range("lightning.segments", "a bolt needs at least 2 points"));
        }

        let p = &self.particles;
        if p.max_live == 0 {
            return Err(out_of_range("particles.max_live", "must be at least 1"));
        }
        positive("particles.trail_decay", p.trail_decay)?;
        positive("particles.ambient_decay", p.ambient_decay)?;
        Ok(())
    }
}

fn out_of_range(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::OutOfRange { field, reason: reason.into() }
}

fn positive(field: &'static str, v: f32) -> Result<()> {
    if v.is_finite() && v > 0.0 { Ok(()) }
    else { Err(out_of_range(field, format!("{} must be > 0", v))) }
}

fn unit(field: &'static str, v: f32) -> Result<()> {
    in_range(field, v, 0.0, 1.0)
}

fn in_range(field: &'static str, v: f32, lo: f32, hi: f32) -> Result<()> {
    if v.is_finite() && v >= lo && v <= hi { Ok(()) }
    else { Err(out_of_range(field, format!("{} not in [{}, {}]", v, lo, hi))) }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(EffectConfig::default().validate().is_ok());
    }

    #[test]
    fn empty_toml_is_default() {
        let cfg = EffectConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, EffectConfig::default());
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let cfg = EffectConfig::from_toml_str(r#"
            mode = "red_blue"
            mirror_x = true

            [fusion]
            touch_threshold = 0.2

            [palettes.red_blue]
            left  = "red"
            right = "fusion"
        "#).unwrap();
        assert_eq!(cfg.mode, Mode::RedBlue);
        assert!(cfg.mirror_x);
        assert_eq!(cfg.fusion.touch_threshold, 0.2);
        assert_eq!(cfg.fusion.distance_range, 0.3);
        assert_eq!(cfg.palettes.red_blue.right, Family::Fusion);
        assert_eq!(cfg.palettes.fire_ice.left, Family::Fire);
    }

    #[test]
    fn bad_toml_is_parse_error() {
        let err = EffectConfig::from_toml_str("mode = 7").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn inverted_ball_range_rejected() {
        let err = EffectConfig::from_toml_str("[fusion]\nmin_cm = 5.0\nmax_cm = 2.0\n").unwrap_err();
        match err {
            ConfigError::OutOfRange { field, .. } => assert_eq!(field, "fusion.max_cm"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn zero_latch_rejected() {
        let mut cfg = EffectConfig::default();
        cfg.tracker.pinch_latch_frames = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn burst_shares_must_fit() {
        let mut cfg = EffectConfig::default();
        cfg.fusion.burst_ice_share = 0.8;
        cfg.fusion.burst_fire_share = 0.3;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = EffectConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn lightning_has_no_palette() {
        let p = Palettes::default();
        assert!(p.for_mode(Mode::Lightning).is_none());
        assert_eq!(p.for_mode(Mode::FireIce).unwrap().right, Family::Ice);
    }
}
