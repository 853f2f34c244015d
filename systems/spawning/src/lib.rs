#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawn cadence controller deciding when the next target is due.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use target_rush_core::{duration_from_secs, ConfigError};

const DEFAULT_INITIAL_INTERVAL_SECS: f32 = 1.15;
const DEFAULT_MIN_INTERVAL_SECS: f32 = 0.3;

/// Configuration parameters required to construct the cadence controller.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Interval, in seconds, used until the first spawn derives a new one.
    pub initial_interval_secs: f32,
    /// Lower bound, in seconds, applied to every interval. Must be positive.
    pub min_interval_secs: f32,
}

impl Config {
    /// Creates a new configuration using the provided cadence bounds.
    #[must_use]
    pub const fn new(initial_interval_secs: f32, min_interval_secs: f32) -> Self {
        Self {
            initial_interval_secs,
            min_interval_secs,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_INTERVAL_SECS, DEFAULT_MIN_INTERVAL_SECS)
    }
}

/// Accumulates tick time and reports when a spawn is due.
///
/// At most one spawn is reported per [`SpawnCadence::advance`] call. Time in
/// excess of the interval stays in the accumulator, so a long stall is paid
/// back one spawn per tick instead of as a burst.
#[derive(Clone, Debug)]
pub struct SpawnCadence {
    initial_interval: Duration,
    min_interval: Duration,
    interval: Duration,
    accumulator: Duration,
}

impl SpawnCadence {
    /// Creates a new cadence controller using the supplied configuration.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        let min_interval = duration_from_secs("min_interval_secs", config.min_interval_secs)?;
        if min_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "min_interval_secs",
                value: config.min_interval_secs,
            });
        }
        let initial_interval =
            duration_from_secs("initial_interval_secs", config.initial_interval_secs)?
                .max(min_interval);

        Ok(Self {
            initial_interval,
            min_interval,
            interval: initial_interval,
            accumulator: Duration::ZERO,
        })
    }

    /// Adds `dt` to the accumulator and reports whether a spawn is due.
    pub fn advance(&mut self, dt: Duration) -> bool {
        self.accumulator = self.accumulator.saturating_add(dt);
        if self.accumulator > self.interval {
            self.accumulator -= self.interval;
            true
        } else {
            false
        }
    }

    /// Replaces the interval, clamping it to the configured minimum.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval.max(self.min_interval);
    }

    /// Clears accumulated time and restores the initial interval.
    pub fn reset(&mut self) {
        self.accumulator = Duration::ZERO;
        self.interval = self.initial_interval;
    }

    /// Interval that must be exceeded before the next spawn.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Smallest interval the controller accepts.
    #[must_use]
    pub const fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Time accumulated toward the next spawn.
    #[must_use]
    pub const fn accumulated(&self) -> Duration {
        self.accumulator
    }
}
