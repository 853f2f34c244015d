#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Procedural trait derivation for freshly spawned targets.
//!
//! [`TraitDeriver::derive`] is a pure, monotonic function of the difficulty
//! scalar: targets fall faster, shrink, animate faster, and arrive more often
//! as difficulty grows. [`TraitDeriver::stamp`] then layers independent
//! cosmetic multipliers drawn from a [`VarianceSource`] on top.

pub mod variance;

pub use variance::{
    derive_stream_seed, FixedVariance, SeededVariance, VarianceSource, STREAM_SPAWN_POSITION,
    STREAM_TARGET_TRAITS,
};

use std::time::Duration;

use serde::{Deserialize, Serialize};
use target_rush_core::{
    duration_from_secs, ensure_at_least, ConfigError, EffectTraits, LateralBias, TargetTraits,
    Vec2,
};

/// Coefficients relating the difficulty scalar to target traits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraitTuning {
    /// Fall speed at difficulty 0, in world units per second.
    pub base_fall_speed: f32,
    /// Fall speed added per unit of difficulty.
    pub fall_speed_per_level: f32,
    /// Target scale at difficulty 0.
    pub base_scale: f32,
    /// Scale removed per unit of difficulty.
    pub scale_per_level: f32,
    /// Smallest scale a target may be derived with.
    pub min_scale: f32,
    /// Animation rate contributed per unit of fall speed.
    pub animation_rate_per_speed: f32,
    /// Animation rate added per unit of difficulty.
    pub animation_rate_per_level: f32,
    /// Spawn interval at difficulty 0, in seconds.
    pub base_interval_secs: f32,
    /// Multiplicative interval decay per unit of difficulty, in `(0, 1]`.
    pub interval_decay: f32,
    /// Shortest derived spawn interval, in seconds.
    pub min_interval_secs: f32,
    /// Lower bound of the cosmetic multiplier.
    pub variance_low: f32,
    /// Upper bound of the cosmetic multiplier.
    pub variance_high: f32,
}

impl Default for TraitTuning {
    fn default() -> Self {
        Self {
            base_fall_speed: 35.0,
            fall_speed_per_level: 3.0,
            base_scale: 2.0,
            scale_per_level: 0.12,
            min_scale: 0.4,
            animation_rate_per_speed: 0.01,
            animation_rate_per_level: 0.1,
            base_interval_secs: 3.0,
            interval_decay: 0.77,
            min_interval_secs: 0.3,
            variance_low: 0.7,
            variance_high: 1.3,
        }
    }
}

/// Traits implied by a difficulty scalar before cosmetic variance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BaseTraits {
    /// Downward speed in world units per second.
    pub fall_speed: f32,
    /// Uniform visual scale.
    pub scale: f32,
    /// Sway animation playback rate.
    pub animation_rate: f32,
    /// Delay before the next target should spawn.
    pub cadence_interval: Duration,
}

/// Maps difficulty onto target traits.
#[derive(Clone, Debug)]
pub struct TraitDeriver {
    tuning: TraitTuning,
    min_interval: Duration,
}

impl TraitDeriver {
    /// Validates `tuning` and creates a deriver.
    pub fn new(tuning: TraitTuning) -> Result<Self, ConfigError> {
        let _ = ensure_at_least("base_fall_speed", tuning.base_fall_speed, 0.0)?;
        let _ = ensure_at_least("fall_speed_per_level", tuning.fall_speed_per_level, 0.0)?;
        let _ = ensure_at_least("min_scale", tuning.min_scale, f32::MIN_POSITIVE)?;
        let _ = ensure_at_least("base_scale", tuning.base_scale, tuning.min_scale)?;
        let _ = ensure_at_least("scale_per_level", tuning.scale_per_level, 0.0)?;
        let _ = ensure_at_least(
            "animation_rate_per_speed",
            tuning.animation_rate_per_speed,
            0.0,
        )?;
        let _ = ensure_at_least(
            "animation_rate_per_level",
            tuning.animation_rate_per_level,
            0.0,
        )?;
        let _ = duration_from_secs("base_interval_secs", tuning.base_interval_secs)?;
        if !(tuning.interval_decay > 0.0 && tuning.interval_decay <= 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "interval_decay",
                value: tuning.interval_decay,
            });
        }
        let min_interval = duration_from_secs("min_interval_secs", tuning.min_interval_secs)?;
        if min_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "min_interval_secs",
                value: tuning.min_interval_secs,
            });
        }
        let _ = ensure_at_least("variance_low", tuning.variance_low, f32::MIN_POSITIVE)?;
        let _ = ensure_at_least("variance_high", tuning.variance_high, tuning.variance_low)?;

        Ok(Self {
            tuning,
            min_interval,
        })
    }

    /// Tuning the deriver was built with.
    #[must_use]
    pub const fn tuning(&self) -> &TraitTuning {
        &self.tuning
    }

    /// Derives traits for `scalar`. Negative and non-finite scalars count as zero.
    #[must_use]
    pub fn derive(&self, scalar: f32) -> BaseTraits {
        let level = if scalar.is_finite() && scalar > 0.0 {
            scalar
        } else {
            0.0
        };
        let tuning = &self.tuning;

        let fall_speed = tuning.base_fall_speed + tuning.fall_speed_per_level * level;
        let scale = (tuning.base_scale - tuning.scale_per_level * level).max(tuning.min_scale);
        let animation_rate = fall_speed * tuning.animation_rate_per_speed
            + tuning.animation_rate_per_level * level;
        let interval_secs = tuning.base_interval_secs * tuning.interval_decay.powf(level);
        let cadence_interval = Duration::try_from_secs_f32(interval_secs)
            .unwrap_or(self.min_interval)
            .max(self.min_interval);

        BaseTraits {
            fall_speed,
            scale,
            animation_rate,
            cadence_interval,
        }
    }

    /// Applies independent cosmetic multipliers and picks the sway direction.
    ///
    /// Draw order is fall speed, animation rate, scale, then lateral bias.
    pub fn stamp(&self, base: &BaseTraits, source: &mut impl VarianceSource) -> TargetTraits {
        let low = self.tuning.variance_low;
        let high = self.tuning.variance_high;
        TargetTraits {
            fall_speed: base.fall_speed * source.uniform(low, high),
            animation_rate: base.animation_rate * source.uniform(low, high),
            scale: base.scale * source.uniform(low, high),
            lateral: if source.coin_flip() {
                LateralBias::Left
            } else {
                LateralBias::Right
            },
        }
    }
}

/// Explosion parameters for a destroyed target.
///
/// The effect covers the target and plays slower for larger targets so its
/// waves travel at the same apparent speed.
#[must_use]
pub fn explosion_traits(target: &TargetTraits) -> EffectTraits {
    if target.scale.is_finite() && target.scale > 0.0 {
        EffectTraits {
            scale: target.scale,
            animation_rate: 1.0 / target.scale,
        }
    } else {
        EffectTraits::default()
    }
}

/// Horizontal band above the playfield in which targets appear.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnArea {
    /// Half of the playfield width.
    pub half_width: f32,
    /// Distance kept from each side so swaying targets stay on screen.
    pub edge_margin: f32,
    /// Height at which targets spawn, just above the visible playfield.
    pub spawn_height: f32,
}

impl Default for SpawnArea {
    fn default() -> Self {
        Self {
            half_width: 180.0,
            edge_margin: 15.0,
            spawn_height: 320.0,
        }
    }
}

impl SpawnArea {
    /// Checks that every dimension is finite and the widths are non-negative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let _ = ensure_at_least("half_width", self.half_width, 0.0)?;
        let _ = ensure_at_least("edge_margin", self.edge_margin, 0.0)?;
        let _ = ensure_at_least("spawn_height", self.spawn_height, f32::MIN)?;
        Ok(())
    }

    /// Largest absolute x a target may spawn at.
    #[must_use]
    pub fn lane_half_width(&self) -> f32 {
        (self.half_width - self.edge_margin).max(0.0)
    }

    /// Picks a spawn position uniformly across the lane.
    pub fn sample_position(&self, source: &mut impl VarianceSource) -> Vec2 {
        let range = self.lane_half_width();
        let x = if range > 0.0 {
            source.uniform(-range, range)
        } else {
            0.0
        };
        Vec2::new(x, self.spawn_height)
    }
}
