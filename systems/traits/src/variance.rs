//! Injectable randomness for cosmetic spawn variety.
//!
//! Nothing in the difficulty contract depends on these samples; they only add
//! visual variety. Keeping them behind [`VarianceSource`] lets tests pin every
//! draw and lets replays reproduce a run from its seed.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

/// Stream label used for spawn position sampling.
pub const STREAM_SPAWN_POSITION: &str = "spawn-position";
/// Stream label used for per-target trait variance.
pub const STREAM_TARGET_TRAITS: &str = "target-traits";

/// Source of the random draws applied at spawn time.
pub trait VarianceSource {
    /// Uniform sample in `[low, high)`. Returns `low` when the range is empty.
    fn uniform(&mut self, low: f32, high: f32) -> f32;

    /// Fair coin flip.
    fn coin_flip(&mut self) -> bool;
}

/// ChaCha-backed variance source seeded deterministically.
#[derive(Clone, Debug)]
pub struct SeededVariance {
    rng: ChaCha8Rng,
}

impl SeededVariance {
    /// Creates a source from a raw seed.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Creates a source for the labeled stream derived from `seed`.
    ///
    /// Distinct labels yield independent streams, so draws consumed by one
    /// concern never shift the sequence observed by another.
    #[must_use]
    pub fn for_stream(seed: u64, label: &str) -> Self {
        Self::from_seed(derive_stream_seed(seed, label))
    }
}

impl VarianceSource for SeededVariance {
    fn uniform(&mut self, low: f32, high: f32) -> f32 {
        if !(low.is_finite() && high.is_finite()) || low >= high {
            return low;
        }
        self.rng.gen_range(low..high)
    }

    fn coin_flip(&mut self) -> bool {
        self.rng.gen_bool(0.5)
    }
}

/// Variance source that always lands at the same relative point of the range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedVariance {
    /// Relative position within `[low, high]`, where 0 selects `low` and 1 selects `high`.
    pub fraction: f32,
    /// Result of every coin flip.
    pub coin: bool,
}

impl FixedVariance {
    /// Source that always selects the lower bound and loses every coin flip.
    pub const LOW: Self = Self {
        fraction: 0.0,
        coin: false,
    };
}

impl VarianceSource for FixedVariance {
    fn uniform(&mut self, low: f32, high: f32) -> f32 {
        if low >= high {
            return low;
        }
        low + (high - low) * self.fraction
    }

    fn coin_flip(&mut self) -> bool {
        self.coin
    }
}

/// Derives the seed of a labeled stream from a global seed.
#[must_use]
pub fn derive_stream_seed(seed: u64, label: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(seed.to_le_bytes());
    hasher.update(label.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_seeds_replay_identical_draws() {
        let mut first = SeededVariance::for_stream(7, STREAM_TARGET_TRAITS);
        let mut second = SeededVariance::for_stream(7, STREAM_TARGET_TRAITS);
        for _ in 0..32 {
            assert_eq!(first.uniform(0.7, 1.3), second.uniform(0.7, 1.3));
            assert_eq!(first.coin_flip(), second.coin_flip());
        }
    }

    #[test]
    fn labels_separate_streams() {
        assert_ne!(
            derive_stream_seed(7, STREAM_SPAWN_POSITION),
            derive_stream_seed(7, STREAM_TARGET_TRAITS)
        );
    }

    #[test]
    fn samples_stay_within_range() {
        let mut source = SeededVariance::from_seed(99);
        for _ in 0..1_000 {
            let sample = source.uniform(-120.0, 120.0);
            assert!((-120.0..120.0).contains(&sample));
        }
    }

    #[test]
    fn empty_ranges_collapse_to_low() {
        let mut source = SeededVariance::from_seed(1);
        assert_eq!(source.uniform(2.0, 2.0), 2.0);
        assert_eq!(source.uniform(3.0, 1.0), 3.0);
        let mut fixed = FixedVariance {
            fraction: 0.5,
            coin: true,
        };
        assert_eq!(fixed.uniform(5.0, 5.0), 5.0);
    }
}
