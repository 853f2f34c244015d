//! Aggregated configuration for a play session.

use serde::{Deserialize, Serialize};
use target_rush_core::{ConfigError, PoolCapacities};
use target_rush_system_difficulty::DifficultyConfig;
use target_rush_system_spawning::Config as CadenceConfig;
use target_rush_system_traits::{SpawnArea, TraitTuning};

/// Every tunable a [`crate::Session`] is constructed from.
///
/// Missing TOML tables and keys fall back to the tuned defaults, so a config
/// file only needs to name the values it overrides.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seed from which every variance stream of the session is derived.
    pub seed: u64,
    /// Slot counts for each entity kind.
    pub pools: PoolCapacities,
    /// Difficulty curve.
    pub difficulty: DifficultyConfig,
    /// Spawn cadence bounds.
    pub cadence: CadenceConfig,
    /// Coefficients mapping difficulty onto target traits.
    pub traits: TraitTuning,
    /// Band in which targets appear.
    pub spawn_area: SpawnArea,
}

impl SessionConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|error| ConfigError::Malformed {
            reason: error.to_string(),
        })
    }

    /// Returns a copy of the configuration using `seed`.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
