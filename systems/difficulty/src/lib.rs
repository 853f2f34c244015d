#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Time-driven difficulty scheduler.
//!
//! Difficulty is a pure function of elapsed session time and the configured
//! milestones. Crossing a milestone unlocks the next discrete tier; a
//! continuous component layered on top keeps the curve ramping between
//! milestones. The resulting scalar is clamped to a configured maximum.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use target_rush_core::{
    duration_from_secs, ensure_at_least, ConfigError, DifficultyLevel, Event,
};

const DEFAULT_MILESTONES_SECS: [f32; 8] = [2.0, 5.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0];

/// Tunable coefficients of the difficulty curve.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyConfig {
    /// Session times, in seconds, at which the tier increases. Must be strictly ascending.
    pub milestones_secs: Vec<f32>,
    /// Difficulty at tier 0 before any time has elapsed.
    pub base_difficulty: f32,
    /// Ceiling of the difficulty scalar.
    pub max_difficulty: f32,
    /// Seconds per step of the continuous component; zero disables it.
    pub ramp_period_secs: f32,
    /// Difficulty added per elapsed ramp period.
    pub ramp_step: f32,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            milestones_secs: DEFAULT_MILESTONES_SECS.to_vec(),
            base_difficulty: 0.0,
            max_difficulty: 10.0,
            ramp_period_secs: 20.0,
            ramp_step: 1.0,
        }
    }
}

/// Tracks elapsed session time and derives the current difficulty.
#[derive(Clone, Debug)]
pub struct DifficultyScheduler {
    milestones: Vec<Duration>,
    base: f32,
    max: f32,
    ramp_period: Duration,
    ramp_step: f32,
    elapsed: Duration,
    tier: u32,
    scalar: f32,
}

impl DifficultyScheduler {
    /// Validates `config` and creates a scheduler at tier 0.
    pub fn new(config: &DifficultyConfig) -> Result<Self, ConfigError> {
        let mut milestones = Vec::with_capacity(config.milestones_secs.len());
        for (index, &value) in config.milestones_secs.iter().enumerate() {
            let milestone = duration_from_secs("milestones_secs", value)
                .map_err(|_| ConfigError::InvalidMilestone { index, value })?;
            if milestones.last().is_some_and(|previous| milestone <= *previous) {
                return Err(ConfigError::UnorderedMilestones { index });
            }
            milestones.push(milestone);
        }
        if u32::try_from(milestones.len()).is_err() {
            return Err(ConfigError::InvalidValue {
                field: "milestones_secs",
                value: milestones.len() as f32,
            });
        }

        let base = ensure_at_least("base_difficulty", config.base_difficulty, 0.0)?;
        let max = ensure_at_least("max_difficulty", config.max_difficulty, base)?;
        let ramp_step = ensure_at_least("ramp_step", config.ramp_step, 0.0)?;
        let ramp_period = duration_from_secs("ramp_period_secs", config.ramp_period_secs)?;

        Ok(Self {
            milestones,
            base,
            max,
            ramp_period,
            ramp_step,
            elapsed: Duration::ZERO,
            tier: 0,
            scalar: 0.0,
        })
    }

    /// Advances session time by `dt` and re-derives tier and scalar.
    ///
    /// A single call may cross several milestones, for example after a long
    /// stall; the tier catches up in one step and a single
    /// [`Event::DifficultyRaised`] reports the whole jump.
    pub fn advance(&mut self, dt: Duration, out_events: &mut Vec<Event>) -> DifficultyLevel {
        self.elapsed = self.elapsed.saturating_add(dt);

        let from = self.tier;
        while let Some(milestone) = self.milestones.get(self.tier as usize) {
            if self.elapsed <= *milestone {
                break;
            }
            self.tier += 1;
        }
        if self.tier != from {
            log::info!(
                "difficulty tier {from} -> {} at {:.2}s",
                self.tier,
                self.elapsed.as_secs_f32()
            );
            out_events.push(Event::DifficultyRaised {
                from,
                to: self.tier,
                elapsed: self.elapsed,
            });
        }

        self.scalar = self.derive_scalar();
        self.level()
    }

    /// Returns the scheduler to the start of a session.
    pub fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
        self.tier = 0;
        self.scalar = 0.0;
    }

    /// Session time accumulated since the last reset.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Number of milestones crossed so far.
    #[must_use]
    pub const fn tier(&self) -> u32 {
        self.tier
    }

    /// Current continuous difficulty.
    #[must_use]
    pub const fn scalar(&self) -> f32 {
        self.scalar
    }

    /// Tier and scalar as a single value.
    #[must_use]
    pub const fn level(&self) -> DifficultyLevel {
        DifficultyLevel {
            tier: self.tier,
            scalar: self.scalar,
        }
    }

    /// Ceiling of the difficulty scalar.
    #[must_use]
    pub const fn max_difficulty(&self) -> f32 {
        self.max
    }

    /// Highest reachable tier.
    #[must_use]
    pub fn max_tier(&self) -> u32 {
        self.milestones.len() as u32
    }

    fn derive_scalar(&self) -> f32 {
        let raw = self.base + self.tier as f32 + self.continuous_component();
        raw.min(self.max)
    }

    fn continuous_component(&self) -> f32 {
        if self.ramp_period.is_zero() || self.ramp_step == 0.0 {
            return 0.0;
        }
        let periods = self.elapsed.as_nanos() / self.ramp_period.as_nanos();
        periods as f32 * self.ramp_step
    }
}
