#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Session controller orchestrating pools, difficulty, cadence and traits.
//!
//! A [`Session`] owns every piece of mutable engine state. Adapters drive it
//! with lifecycle calls and [`Session::tick`], and observe the outcome through
//! the [`Event`] values pushed into caller-owned buffers.

pub mod config;

pub use config::SessionConfig;

use std::time::Duration;

use target_rush_core::{
    Command, DifficultyLevel, EntityKind, Event, HandleError, ProjectileState, SessionPhase,
    SessionSummary, SlotHandle, SlotPayload, Vec2,
};
use target_rush_system_difficulty::DifficultyScheduler;
use target_rush_system_spawning::SpawnCadence;
use target_rush_system_traits::{
    explosion_traits, SeededVariance, SpawnArea, TraitDeriver, VarianceSource,
    STREAM_SPAWN_POSITION, STREAM_TARGET_TRAITS,
};
use target_rush_world::{self as world, PoolRegistry};
use thiserror::Error;

pub use target_rush_core::ConfigError;

/// Operations whose legality depends on the session phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionAction {
    /// [`Session::start`].
    Start,
    /// [`Session::pause`].
    Pause,
    /// [`Session::resume`].
    Resume,
    /// [`Session::end`].
    End,
    /// [`Session::notify_terminal_condition`].
    TerminalCondition,
    /// [`Session::launch_projectile`].
    LaunchProjectile,
    /// [`Session::notify_hit`].
    Hit,
}

/// Errors reported by session operations. A failed call leaves the session untouched.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The action is not permitted in the current phase.
    #[error("{action:?} is not permitted while the session is {phase:?}")]
    Rejected {
        /// Phase the session was in.
        phase: SessionPhase,
        /// Action that was refused.
        action: SessionAction,
    },
    /// A slot handle was rejected by the pool registry.
    #[error(transparent)]
    Handle(#[from] HandleError),
}

/// One play session and all of the state it owns.
#[derive(Debug)]
pub struct Session<P = SeededVariance, V = SeededVariance> {
    phase: SessionPhase,
    registry: PoolRegistry,
    difficulty: DifficultyScheduler,
    cadence: SpawnCadence,
    deriver: TraitDeriver,
    spawn_area: SpawnArea,
    positions: P,
    variance: V,
    score: u32,
    best_score: u32,
    last_summary: Option<SessionSummary>,
}

impl Session<SeededVariance> {
    /// Creates an idle session whose variance streams derive from `config.seed`.
    pub fn new(config: &SessionConfig) -> Result<Self, ConfigError> {
        Self::with_sources(
            config,
            SeededVariance::for_stream(config.seed, STREAM_SPAWN_POSITION),
            SeededVariance::for_stream(config.seed, STREAM_TARGET_TRAITS),
        )
    }
}

impl<P: VarianceSource, V: VarianceSource> Session<P, V> {
    /// Creates an idle session drawing spawn positions from `positions` and
    /// cosmetic trait variance from `variance`.
    pub fn with_sources(
        config: &SessionConfig,
        positions: P,
        variance: V,
    ) -> Result<Self, ConfigError> {
        config.spawn_area.validate()?;
        Ok(Self {
            phase: SessionPhase::Idle,
            registry: PoolRegistry::with_capacities(&config.pools)?,
            difficulty: DifficultyScheduler::new(&config.difficulty)?,
            cadence: SpawnCadence::new(config.cadence)?,
            deriver: TraitDeriver::new(config.traits.clone())?,
            spawn_area: config.spawn_area,
            positions,
            variance,
            score: 0,
            best_score: 0,
            last_summary: None,
        })
    }

    /// Begins a run: Idle to Running with a fresh clock, cadence and score.
    pub fn start(&mut self, out_events: &mut Vec<Event>) -> Result<(), SessionError> {
        self.require(SessionAction::Start, &[SessionPhase::Idle])?;
        self.difficulty.reset();
        self.cadence.reset();
        self.score = 0;
        self.transition(SessionPhase::Running, out_events);
        Ok(())
    }

    /// Freezes time: Running to Paused.
    pub fn pause(&mut self, out_events: &mut Vec<Event>) -> Result<(), SessionError> {
        self.require(SessionAction::Pause, &[SessionPhase::Running])?;
        self.transition(SessionPhase::Paused, out_events);
        Ok(())
    }

    /// Unfreezes time: Paused to Running.
    pub fn resume(&mut self, out_events: &mut Vec<Event>) -> Result<(), SessionError> {
        self.require(SessionAction::Resume, &[SessionPhase::Paused])?;
        self.transition(SessionPhase::Running, out_events);
        Ok(())
    }

    /// Pauses a running session when the host loses focus; ignored otherwise.
    pub fn notify_focus_lost(&mut self, out_events: &mut Vec<Event>) {
        if self.phase == SessionPhase::Running {
            self.transition(SessionPhase::Paused, out_events);
        }
    }

    /// Advances the session by `dt`. Does nothing unless the session is running.
    pub fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if self.phase != SessionPhase::Running {
            return;
        }

        out_events.push(Event::TimeAdvanced { dt });
        let level = self.difficulty.advance(dt, out_events);
        if self.cadence.advance(dt) {
            if let Err(reason) = self.spawn_target(level, out_events) {
                log::error!("failed to spawn target: {reason}");
            }
        }
    }

    /// Fires a projectile from `position`.
    pub fn launch_projectile(
        &mut self,
        position: Vec2,
        out_events: &mut Vec<Event>,
    ) -> Result<SlotHandle, SessionError> {
        self.require(SessionAction::LaunchProjectile, &[SessionPhase::Running])?;
        let handle = self
            .registry
            .acquire(EntityKind::Projectile, position, out_events)?;
        self.registry
            .set_payload(handle, SlotPayload::Projectile(ProjectileState::default()))?;
        out_events.push(Event::ProjectileLaunched { handle, position });
        Ok(handle)
    }

    /// Records that `target` was struck, optionally by `projectile`.
    ///
    /// The target returns to its pool, an explosion sized after it appears at
    /// its last recorded position, and the score increases by one. A projectile
    /// that is no longer tracked is reported as `None` in
    /// [`Event::TargetDestroyed`].
    pub fn notify_hit(
        &mut self,
        projectile: Option<SlotHandle>,
        target: SlotHandle,
        out_events: &mut Vec<Event>,
    ) -> Result<(), SessionError> {
        self.require(SessionAction::Hit, &[SessionPhase::Running])?;

        let (position, traits) = match self.registry.slot(target) {
            Ok(slot) => match slot.payload() {
                SlotPayload::Target(traits) => (slot.position(), *traits),
                _ => {
                    return Err(self.reject_handle(target, HandleError::KindMismatch, out_events))
                }
            },
            Err(reason) => return Err(self.reject_handle(target, reason, out_events)),
        };
        self.registry.release(target, out_events)?;

        let (projectile, hit_count) = match projectile {
            Some(handle) => self.register_projectile_hit(handle),
            None => (None, 1),
        };
        out_events.push(Event::TargetDestroyed {
            target,
            projectile,
            hit_count,
        });

        let effect_traits = explosion_traits(&traits);
        let effect = self
            .registry
            .acquire(EntityKind::Effect, position, out_events)?;
        self.registry
            .set_payload(effect, SlotPayload::Effect(effect_traits))?;
        out_events.push(Event::EffectSpawned {
            handle: effect,
            position,
            traits: effect_traits,
        });

        self.score = self.score.saturating_add(1);
        out_events.push(Event::ScoreChanged { score: self.score });
        Ok(())
    }

    /// Returns an entity to its pool, e.g. when it leaves the playfield or
    /// its effect finished playing.
    pub fn release(
        &mut self,
        handle: SlotHandle,
        out_events: &mut Vec<Event>,
    ) -> Result<(), SessionError> {
        self.registry.release(handle, out_events)?;
        Ok(())
    }

    /// Submits a pool command on behalf of an adapter. Rejected handles are
    /// reported as [`Event::HandleRejected`].
    pub fn apply(&mut self, command: Command, out_events: &mut Vec<Event>) {
        world::apply(&mut self.registry, command, out_events);
    }

    /// Records the latest position of a live entity as reported by the motion applier.
    pub fn set_position(&mut self, handle: SlotHandle, position: Vec2) -> Result<(), SessionError> {
        self.registry.set_position(handle, position)?;
        Ok(())
    }

    /// Ends the run because a target reached the defended zone.
    pub fn notify_terminal_condition(
        &mut self,
        position: Option<Vec2>,
        out_events: &mut Vec<Event>,
    ) -> Result<(), SessionError> {
        self.require(SessionAction::TerminalCondition, &[SessionPhase::Running])?;
        self.best_score = self.best_score.max(self.score);
        self.transition(SessionPhase::Ending, out_events);
        out_events.push(Event::TerminalConditionReached {
            position,
            final_score: self.score,
        });
        Ok(())
    }

    /// Tears the session down and returns to Idle.
    ///
    /// Accepted from Ending, and from Running or Paused as an abort. Every
    /// pooled entity is released and the clock, cadence and score are reset.
    pub fn end(&mut self, out_events: &mut Vec<Event>) -> Result<SessionSummary, SessionError> {
        self.require(
            SessionAction::End,
            &[
                SessionPhase::Ending,
                SessionPhase::Running,
                SessionPhase::Paused,
            ],
        )?;

        self.best_score = self.best_score.max(self.score);
        let summary = SessionSummary {
            final_score: self.score,
            best_score: self.best_score,
            elapsed: self.difficulty.elapsed(),
            difficulty: self.difficulty.level(),
        };

        world::apply(&mut self.registry, Command::ReleaseAllKinds, out_events);
        self.difficulty.reset();
        self.cadence.reset();
        self.score = 0;
        self.last_summary = Some(summary);

        self.transition(SessionPhase::Idle, out_events);
        out_events.push(Event::SessionFinished { summary });
        Ok(summary)
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Score of the current run.
    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }

    /// Highest final score recorded by this session.
    #[must_use]
    pub const fn best_score(&self) -> u32 {
        self.best_score
    }

    /// Summary of the most recently finished run.
    #[must_use]
    pub const fn last_summary(&self) -> Option<SessionSummary> {
        self.last_summary
    }

    /// Difficulty reached by the current run.
    #[must_use]
    pub const fn difficulty(&self) -> DifficultyLevel {
        self.difficulty.level()
    }

    /// Simulated time the current run has been running.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.difficulty.elapsed()
    }

    /// Interval the next spawn waits for.
    #[must_use]
    pub const fn spawn_interval(&self) -> Duration {
        self.cadence.interval()
    }

    /// Read-only view of the pools, for use with [`target_rush_world::query`].
    #[must_use]
    pub const fn registry(&self) -> &PoolRegistry {
        &self.registry
    }

    fn spawn_target(
        &mut self,
        level: DifficultyLevel,
        out_events: &mut Vec<Event>,
    ) -> Result<(), HandleError> {
        let position = self.spawn_area.sample_position(&mut self.positions);
        let handle = self
            .registry
            .acquire(EntityKind::Target, position, out_events)?;
        let base = self.deriver.derive(level.scalar);
        let traits = self.deriver.stamp(&base, &mut self.variance);
        self.registry
            .set_payload(handle, SlotPayload::Target(traits))?;
        self.cadence.set_interval(base.cadence_interval);

        log::debug!(
            "spawned target {} at ({:.1}, {:.1}) with difficulty {:.2}",
            handle.index(),
            position.x,
            position.y,
            level.scalar
        );
        out_events.push(Event::TargetSpawned {
            handle,
            position,
            traits,
        });
        Ok(())
    }

    fn register_projectile_hit(&mut self, handle: SlotHandle) -> (Option<SlotHandle>, u32) {
        match self.registry.payload_mut(handle) {
            Ok(SlotPayload::Projectile(state)) => {
                state.hit_count = state.hit_count.saturating_add(1);
                (Some(handle), state.hit_count)
            }
            _ => {
                log::warn!("hit credited to untracked projectile {handle:?}");
                (None, 1)
            }
        }
    }

    fn reject_handle(
        &self,
        handle: SlotHandle,
        reason: HandleError,
        out_events: &mut Vec<Event>,
    ) -> SessionError {
        log::error!("rejected hit on {handle:?}: {reason}");
        out_events.push(Event::HandleRejected { handle, reason });
        SessionError::Handle(reason)
    }

    fn require(&self, action: SessionAction, allowed: &[SessionPhase]) -> Result<(), SessionError> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            log::warn!("{action:?} rejected while {:?}", self.phase);
            Err(SessionError::Rejected {
                phase: self.phase,
                action,
            })
        }
    }

    fn transition(&mut self, to: SessionPhase, out_events: &mut Vec<Event>) {
        let from = self.phase;
        self.phase = to;
        log::info!("session {from:?} -> {to:?}");
        out_events.push(Event::SessionPhaseChanged { from, to });
    }
}
