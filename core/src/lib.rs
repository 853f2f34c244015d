#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Target Rush engine.
//!
//! This crate defines the message surface that connects adapters, the pool
//! registry, and the pure systems. Adapters submit [`Command`] values describing
//! desired pool mutations, the registry executes those commands via its `apply`
//! entry point, and every component reports what happened by pushing [`Event`]
//! values into caller-owned buffers. Presentation, physics and audio
//! collaborators only ever observe the engine through those events.

use std::time::Duration;

pub use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of target slots allocated per session.
pub const DEFAULT_TARGET_CAPACITY: u32 = 50;
/// Default number of projectile slots allocated per session.
pub const DEFAULT_PROJECTILE_CAPACITY: u32 = 10;
/// Default number of explosion effect slots allocated per session.
pub const DEFAULT_EFFECT_CAPACITY: u32 = 10;

/// Kinds of transient entities managed by the recycling pools.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    /// Falling target the player must destroy before it reaches the defended zone.
    Target,
    /// Projectile fired by the player.
    Projectile,
    /// Explosion effect left behind by a destroyed target.
    Effect,
}

impl EntityKind {
    /// Every entity kind in registry order.
    pub const ALL: [EntityKind; 3] = [Self::Target, Self::Projectile, Self::Effect];

    /// Dense index of the kind, stable across runs.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Target => 0,
            Self::Projectile => 1,
            Self::Effect => 2,
        }
    }
}

/// Generation-checked reference to a pooled entity slot.
///
/// Handles are plain values. A handle stays valid from the acquisition that
/// produced it until the slot is released or force-recycled; afterwards the
/// slot's generation no longer matches and every use of the handle is rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotHandle {
    kind: EntityKind,
    index: u32,
    generation: u32,
}

impl SlotHandle {
    /// Creates a handle addressing `index` within the pool for `kind`.
    #[must_use]
    pub const fn new(kind: EntityKind, index: u32, generation: u32) -> Self {
        Self {
            kind,
            index,
            generation,
        }
    }

    /// Kind of entity the handle refers to.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Slot index within the owning pool.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Generation the slot had when the handle was issued.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

/// Horizontal drift direction handed to the animator when a target spawns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LateralBias {
    /// Target sways toward decreasing x first.
    Left,
    /// Target sways toward increasing x first.
    Right,
}

/// Procedural attributes stamped onto a target when it spawns.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetTraits {
    /// Downward speed in world units per second.
    pub fall_speed: f32,
    /// Uniform visual scale of the target.
    pub scale: f32,
    /// Playback rate multiplier for the target's sway animation.
    pub animation_rate: f32,
    /// Direction of the initial sway.
    pub lateral: LateralBias,
}

impl Default for TargetTraits {
    fn default() -> Self {
        Self {
            fall_speed: 35.0,
            scale: 2.0,
            animation_rate: 0.35,
            lateral: LateralBias::Right,
        }
    }
}

/// Presentation parameters of an explosion effect.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EffectTraits {
    /// Uniform visual scale of the effect.
    pub scale: f32,
    /// Playback rate multiplier for the effect animation.
    pub animation_rate: f32,
}

impl Default for EffectTraits {
    fn default() -> Self {
        Self {
            scale: 1.0,
            animation_rate: 1.0,
        }
    }
}

/// Per-projectile bookkeeping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectileState {
    /// Number of targets destroyed by the projectile since it was launched.
    pub hit_count: u32,
}

/// Kind-specific data carried by a pooled slot.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum SlotPayload {
    /// Traits of a target slot.
    Target(TargetTraits),
    /// State of a projectile slot.
    Projectile(ProjectileState),
    /// Traits of an effect slot.
    Effect(EffectTraits),
}

impl SlotPayload {
    /// Payload a freshly allocated slot of `kind` starts with.
    #[must_use]
    pub fn pristine(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Target => Self::Target(TargetTraits::default()),
            EntityKind::Projectile => Self::Projectile(ProjectileState::default()),
            EntityKind::Effect => Self::Effect(EffectTraits::default()),
        }
    }

    /// Entity kind the payload belongs to.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Target(_) => EntityKind::Target,
            Self::Projectile(_) => EntityKind::Projectile,
            Self::Effect(_) => EntityKind::Effect,
        }
    }
}

/// Phases of a play session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionPhase {
    /// No session is in progress; pools are empty.
    Idle,
    /// Time advances and targets spawn.
    Running,
    /// Time is frozen; state is preserved.
    Paused,
    /// A terminal condition fired; spawning is disabled until the session is ended.
    Ending,
}

/// Discrete tier and continuous scalar describing the current difficulty.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DifficultyLevel {
    /// Number of milestones crossed so far.
    pub tier: u32,
    /// Continuous difficulty fed into trait derivation.
    pub scalar: f32,
}

/// Outcome of a finished session.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Score frozen when the session ended.
    pub final_score: u32,
    /// Highest final score observed since the process started.
    pub best_score: u32,
    /// Simulated time that elapsed while the session was running.
    pub elapsed: Duration,
    /// Difficulty reached when the session ended.
    pub difficulty: DifficultyLevel,
}

/// Number of slots allocated for each entity kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolCapacities {
    /// Slots reserved for falling targets.
    pub targets: u32,
    /// Slots reserved for projectiles.
    pub projectiles: u32,
    /// Slots reserved for explosion effects.
    pub effects: u32,
}

impl PoolCapacities {
    /// Capacity configured for `kind`.
    #[must_use]
    pub const fn capacity(&self, kind: EntityKind) -> u32 {
        match kind {
            EntityKind::Target => self.targets,
            EntityKind::Projectile => self.projectiles,
            EntityKind::Effect => self.effects,
        }
    }
}

impl Default for PoolCapacities {
    fn default() -> Self {
        Self {
            targets: DEFAULT_TARGET_CAPACITY,
            projectiles: DEFAULT_PROJECTILE_CAPACITY,
            effects: DEFAULT_EFFECT_CAPACITY,
        }
    }
}

/// Pool mutations an adapter may submit directly.
///
/// Acquisitions are not commands: targets, projectiles and effects are only
/// acquired by the session operations that also stamp their payloads.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Returns a slot to its pool.
    ReleaseEntity {
        /// Handle of the slot to release.
        handle: SlotHandle,
    },
    /// Returns every active slot of every kind to its pool.
    ReleaseAllKinds,
}

/// Events broadcast by the engine after processing commands and ticks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// Indicates that the session clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a slot became active.
    EntityAcquired {
        /// Handle of the newly active slot.
        handle: SlotHandle,
        /// Position assigned to the slot.
        position: Vec2,
    },
    /// Reports that a pool had no available slot and reclaimed its oldest active entity.
    PoolExhausted {
        /// Kind of the exhausted pool.
        kind: EntityKind,
        /// Handle of the entity that was reclaimed; it is no longer valid.
        reclaimed: SlotHandle,
    },
    /// Confirms that a slot returned to its pool.
    EntityReleased {
        /// Handle of the released slot.
        handle: SlotHandle,
    },
    /// Confirms a bulk release of every active slot of one kind.
    EntitiesReleased {
        /// Kind of the pool that was drained.
        kind: EntityKind,
        /// Number of slots that returned to the pool.
        count: u32,
    },
    /// Reports that a handle was rejected and the operation had no effect.
    HandleRejected {
        /// Offending handle.
        handle: SlotHandle,
        /// Specific reason the handle was refused.
        reason: HandleError,
    },
    /// Reports that an acquisition could not be served.
    AcquireRejected {
        /// Kind that was requested.
        kind: EntityKind,
        /// Specific reason the request failed.
        reason: HandleError,
    },
    /// Announces that the difficulty tier increased.
    DifficultyRaised {
        /// Tier before the advance.
        from: u32,
        /// Tier after the advance.
        to: u32,
        /// Session time at which the new tier was reached.
        elapsed: Duration,
    },
    /// Announces a freshly spawned target and the traits collaborators must apply.
    TargetSpawned {
        /// Handle of the target slot.
        handle: SlotHandle,
        /// Spawn position above the playfield.
        position: Vec2,
        /// Procedural traits derived for the target.
        traits: TargetTraits,
    },
    /// Announces a projectile launch.
    ProjectileLaunched {
        /// Handle of the projectile slot.
        handle: SlotHandle,
        /// Launch position.
        position: Vec2,
    },
    /// Confirms that a target was destroyed by the player.
    TargetDestroyed {
        /// Handle of the destroyed target; it is no longer valid.
        target: SlotHandle,
        /// Projectile responsible for the hit, if it is still tracked.
        projectile: Option<SlotHandle>,
        /// Number of targets the projectile has destroyed, including this one.
        hit_count: u32,
    },
    /// Announces an explosion effect that collaborators should animate.
    EffectSpawned {
        /// Handle of the effect slot.
        handle: SlotHandle,
        /// Position of the effect.
        position: Vec2,
        /// Presentation parameters of the effect.
        traits: EffectTraits,
    },
    /// Reports the running score after it changed.
    ScoreChanged {
        /// Current score.
        score: u32,
    },
    /// Announces a session phase transition.
    SessionPhaseChanged {
        /// Phase before the transition.
        from: SessionPhase,
        /// Phase after the transition.
        to: SessionPhase,
    },
    /// Reports that a target reached the defended zone and the run is over.
    TerminalConditionReached {
        /// Where the terminal condition was detected, if known.
        position: Option<Vec2>,
        /// Score frozen at the moment the run ended.
        final_score: u32,
    },
    /// Announces that the session returned to idle.
    SessionFinished {
        /// Outcome of the finished session.
        summary: SessionSummary,
    },
}

/// Reasons a slot handle or acquisition may be rejected.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleError {
    /// No pool is registered for the requested kind.
    #[error("no pool is registered for this entity kind")]
    UnregisteredKind,
    /// The handle addresses a pool of another kind.
    #[error("handle belongs to a pool of another entity kind")]
    KindMismatch,
    /// The handle's index lies outside the pool.
    #[error("handle index lies outside the pool")]
    OutOfRange,
    /// The slot was re-acquired since the handle was issued.
    #[error("handle generation is stale")]
    Stale,
    /// The slot is already available; typically a double release.
    #[error("slot is already available")]
    AlreadyAvailable,
}

/// Invalid configuration detected while constructing engine components.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    /// A pool was configured without any slots.
    #[error("pool capacity for {kind:?} must be positive")]
    ZeroCapacity {
        /// Kind of the offending pool.
        kind: EntityKind,
    },
    /// A pool capacity does not fit the slot index type.
    #[error("pool capacity {capacity} for {kind:?} exceeds the addressable slot range")]
    CapacityTooLarge {
        /// Kind of the offending pool.
        kind: EntityKind,
        /// Requested capacity.
        capacity: usize,
    },
    /// A pool was registered twice.
    #[error("a pool for {kind:?} is already registered")]
    DuplicateKind {
        /// Kind registered twice.
        kind: EntityKind,
    },
    /// A milestone is not a finite, non-negative number of seconds.
    #[error("milestone {index} ({value}s) is not a finite, non-negative number of seconds")]
    InvalidMilestone {
        /// Position of the milestone in the configured list.
        index: usize,
        /// Offending value.
        value: f32,
    },
    /// Milestones are not strictly ascending.
    #[error("milestone {index} must be later than the milestone before it")]
    UnorderedMilestones {
        /// Position of the first out-of-order milestone.
        index: usize,
    },
    /// A tuning value is outside its permitted range.
    #[error("{field} is out of range: {value}")]
    InvalidValue {
        /// Name of the offending configuration field.
        field: &'static str,
        /// Offending value.
        value: f32,
    },
    /// The configuration source could not be parsed.
    #[error("malformed configuration: {reason}")]
    Malformed {
        /// Parser diagnostic.
        reason: String,
    },
}

/// Converts a configured number of seconds into a [`Duration`].
///
/// Negative, NaN and infinite values are reported as
/// [`ConfigError::InvalidValue`] for `field`.
pub fn duration_from_secs(field: &'static str, value: f32) -> Result<Duration, ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidValue { field, value });
    }
    Duration::try_from_secs_f32(value).map_err(|_| ConfigError::InvalidValue { field, value })
}

/// Checks that `value` is finite and at least `minimum`.
pub fn ensure_at_least(field: &'static str, value: f32, minimum: f32) -> Result<f32, ConfigError> {
    if value.is_finite() && value >= minimum {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue { field, value })
    }
}
