#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative pool state for Target Rush.
//!
//! The [`PoolRegistry`] owns one fixed-capacity [`EntityPool`] per
//! [`EntityKind`]. Every mutation reports its outcome as [`Event`] values so
//! that presentation collaborators and tests observe diagnostics such as pool
//! exhaustion or rejected handles without querying the registry.

pub mod pool;

pub use pool::{Acquisition, EntityPool, Slot, SlotState};

use target_rush_core::{
    Command, ConfigError, EntityKind, Event, HandleError, PoolCapacities, SlotHandle, SlotPayload,
    Vec2,
};

/// Owns one recycling pool per entity kind.
#[derive(Debug, Default)]
pub struct PoolRegistry {
    pools: [Option<EntityPool>; 3],
}

impl PoolRegistry {
    /// Creates a registry without any pools.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with a pool for every kind sized by `capacities`.
    pub fn with_capacities(capacities: &PoolCapacities) -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        for kind in EntityKind::ALL {
            registry.register_kind(kind, capacities.capacity(kind) as usize, |_| {
                SlotPayload::pristine(kind)
            })?;
        }
        Ok(registry)
    }

    /// Allocates a pool of `capacity` slots for `kind`, seeding payloads with `factory`.
    pub fn register_kind(
        &mut self,
        kind: EntityKind,
        capacity: usize,
        factory: impl FnMut(usize) -> SlotPayload,
    ) -> Result<(), ConfigError> {
        let entry = &mut self.pools[kind.index()];
        if entry.is_some() {
            return Err(ConfigError::DuplicateKind { kind });
        }
        *entry = Some(EntityPool::new(kind, capacity, factory)?);
        Ok(())
    }

    /// Provides read-only access to the pool registered for `kind`.
    #[must_use]
    pub fn pool(&self, kind: EntityKind) -> Option<&EntityPool> {
        self.pools[kind.index()].as_ref()
    }

    /// Activates a slot of `kind` at `position`.
    ///
    /// When the pool has no available slot its oldest active entity is
    /// reclaimed and an [`Event::PoolExhausted`] diagnostic precedes the
    /// [`Event::EntityAcquired`] confirmation.
    pub fn acquire(
        &mut self,
        kind: EntityKind,
        position: Vec2,
        out_events: &mut Vec<Event>,
    ) -> Result<SlotHandle, HandleError> {
        let Some(pool) = self.pools[kind.index()].as_mut() else {
            log::error!("acquire requested for {kind:?} but no pool is registered");
            out_events.push(Event::AcquireRejected {
                kind,
                reason: HandleError::UnregisteredKind,
            });
            return Err(HandleError::UnregisteredKind);
        };

        let acquisition = pool.acquire(position);
        if let Some(reclaimed) = acquisition.reclaimed {
            log::warn!(
                "{kind:?} pool exhausted at {} slots; recycled oldest active entity {}",
                pool.capacity(),
                reclaimed.index()
            );
            out_events.push(Event::PoolExhausted { kind, reclaimed });
        }
        out_events.push(Event::EntityAcquired {
            handle: acquisition.handle,
            position,
        });
        Ok(acquisition.handle)
    }

    /// Returns a slot to its pool. Invalid handles are logged, reported, and otherwise ignored.
    pub fn release(
        &mut self,
        handle: SlotHandle,
        out_events: &mut Vec<Event>,
    ) -> Result<(), HandleError> {
        match self
            .pool_mut(handle.kind())
            .and_then(|pool| pool.release(handle))
        {
            Ok(()) => {
                out_events.push(Event::EntityReleased { handle });
                Ok(())
            }
            Err(reason) => {
                log::error!("rejected release of {handle:?}: {reason}");
                out_events.push(Event::HandleRejected { handle, reason });
                Err(reason)
            }
        }
    }

    /// Returns every active slot of every kind to its pool.
    pub fn release_all_kinds(&mut self, out_events: &mut Vec<Event>) -> u32 {
        let mut total = 0;
        for pool in self.pools.iter_mut().flatten() {
            let count = pool.release_all();
            if count > 0 {
                out_events.push(Event::EntitiesReleased {
                    kind: pool.kind(),
                    count,
                });
            }
            total += count;
        }
        total
    }

    /// Looks up the slot addressed by a live handle.
    pub fn slot(&self, handle: SlotHandle) -> Result<&Slot, HandleError> {
        self.pool(handle.kind())
            .ok_or(HandleError::UnregisteredKind)?
            .slot(handle)
    }

    /// Replaces the payload of a live slot. The payload must match the handle's kind.
    pub fn set_payload(
        &mut self,
        handle: SlotHandle,
        payload: SlotPayload,
    ) -> Result<(), HandleError> {
        if payload.kind() != handle.kind() {
            return Err(HandleError::KindMismatch);
        }
        *self.pool_mut(handle.kind())?.payload_mut(handle)? = payload;
        Ok(())
    }

    /// Mutable access to the payload of a live slot.
    pub fn payload_mut(&mut self, handle: SlotHandle) -> Result<&mut SlotPayload, HandleError> {
        self.pool_mut(handle.kind())?.payload_mut(handle)
    }

    /// Moves a live slot to `position`.
    pub fn set_position(&mut self, handle: SlotHandle, position: Vec2) -> Result<(), HandleError> {
        self.pool_mut(handle.kind())?.set_position(handle, position)
    }

    fn pool_mut(&mut self, kind: EntityKind) -> Result<&mut EntityPool, HandleError> {
        self.pools[kind.index()]
            .as_mut()
            .ok_or(HandleError::UnregisteredKind)
    }
}

/// Applies the provided command to the registry, reporting outcomes as events.
pub fn apply(registry: &mut PoolRegistry, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ReleaseEntity { handle } => {
            let _ = registry.release(handle, out_events);
        }
        Command::ReleaseAllKinds => {
            let _ = registry.release_all_kinds(out_events);
        }
    }
}

/// Query functions that provide read-only access to the registry state.
pub mod query {
    use target_rush_core::{EntityKind, SlotHandle, SlotPayload, TargetTraits, Vec2};

    use super::PoolRegistry;

    /// Occupancy of a single pool.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct PoolCounts {
        /// Total number of slots owned by the pool.
        pub capacity: usize,
        /// Slots waiting to be acquired.
        pub available: usize,
        /// Slots currently in play.
        pub active: usize,
    }

    /// Immutable copy of a live slot.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct SlotSnapshot {
        /// Handle addressing the slot.
        pub handle: SlotHandle,
        /// Position of the entity.
        pub position: Vec2,
        /// Kind-specific data.
        pub payload: SlotPayload,
    }

    /// Reports the occupancy of the pool registered for `kind`.
    #[must_use]
    pub fn counts(registry: &PoolRegistry, kind: EntityKind) -> Option<PoolCounts> {
        registry.pool(kind).map(|pool| PoolCounts {
            capacity: pool.capacity(),
            available: pool.available_count(),
            active: pool.active_count(),
        })
    }

    /// Lists live handles of `kind` from oldest to newest.
    #[must_use]
    pub fn active_handles(registry: &PoolRegistry, kind: EntityKind) -> Vec<SlotHandle> {
        registry
            .pool(kind)
            .map(|pool| pool.active_handles().collect())
            .unwrap_or_default()
    }

    /// Reports whether `handle` still addresses an active slot.
    #[must_use]
    pub fn is_live(registry: &PoolRegistry, handle: SlotHandle) -> bool {
        registry.slot(handle).is_ok()
    }

    /// Captures the slot addressed by `handle`, if it is still live.
    #[must_use]
    pub fn slot_snapshot(registry: &PoolRegistry, handle: SlotHandle) -> Option<SlotSnapshot> {
        registry.slot(handle).ok().map(|slot| SlotSnapshot {
            handle,
            position: slot.position(),
            payload: *slot.payload(),
        })
    }

    /// Traits stamped onto a live target.
    #[must_use]
    pub fn target_traits(registry: &PoolRegistry, handle: SlotHandle) -> Option<TargetTraits> {
        match registry.slot(handle).ok()?.payload() {
            SlotPayload::Target(traits) => Some(*traits),
            _ => None,
        }
    }
}
