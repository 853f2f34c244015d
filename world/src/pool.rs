//! Fixed-capacity recycling pool for a single entity kind.

use std::collections::VecDeque;

use target_rush_core::{ConfigError, EntityKind, HandleError, SlotHandle, SlotPayload, Vec2};

/// Length of the active queue, in multiples of the capacity, that triggers compaction.
const ACTIVE_QUEUE_SLACK: usize = 2;

/// Whether a slot is waiting on the available stack or in play.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlotState {
    /// The slot sits on the available stack.
    Available,
    /// The slot is owned by whoever holds its current handle.
    Active,
}

/// Reusable record backing one pooled entity.
#[derive(Clone, Debug, PartialEq)]
pub struct Slot {
    generation: u32,
    state: SlotState,
    position: Vec2,
    payload: SlotPayload,
}

impl Slot {
    /// Generation bumped on every acquisition of the slot.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SlotState {
        self.state
    }

    /// Position assigned at the last acquisition or update.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Kind-specific data stored in the slot.
    #[must_use]
    pub const fn payload(&self) -> &SlotPayload {
        &self.payload
    }
}

/// Result of [`EntityPool::acquire`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Acquisition {
    /// Handle of the slot that is now active.
    pub handle: SlotHandle,
    /// Handle of the entity that was force-recycled to serve the request, if any.
    pub reclaimed: Option<SlotHandle>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ActiveEntry {
    index: u32,
    generation: u32,
}

/// Fixed-size store of reusable slots for one entity kind.
///
/// Available slots form a LIFO stack so the most recently freed slot is reused
/// first. Active slots are tracked in acquisition order so that, once the stack
/// runs dry, the oldest active entity is reclaimed first. Releases leave their
/// queue entry behind; stale entries are recognised by their generation and
/// skipped when the queue is popped or compacted.
#[derive(Debug)]
pub struct EntityPool {
    kind: EntityKind,
    slots: Vec<Slot>,
    available: Vec<u32>,
    active: VecDeque<ActiveEntry>,
    active_count: usize,
}

impl EntityPool {
    /// Allocates `capacity` available slots whose payloads are produced by `factory`.
    pub fn new(
        kind: EntityKind,
        capacity: usize,
        mut factory: impl FnMut(usize) -> SlotPayload,
    ) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity { kind });
        }
        let Ok(slot_count) = u32::try_from(capacity) else {
            return Err(ConfigError::CapacityTooLarge { kind, capacity });
        };

        let slots = (0..capacity)
            .map(|index| Slot {
                generation: 0,
                state: SlotState::Available,
                position: Vec2::ZERO,
                payload: factory(index),
            })
            .collect();
        // Reversed so that slot 0 sits on top of the stack.
        let available = (0..slot_count).rev().collect();

        Ok(Self {
            kind,
            slots,
            available,
            active: VecDeque::with_capacity(capacity * ACTIVE_QUEUE_SLACK),
            active_count: 0,
        })
    }

    /// Kind of entity stored in the pool.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Total number of slots owned by the pool.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots waiting on the available stack.
    #[must_use]
    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    /// Number of slots currently in play.
    #[must_use]
    pub const fn active_count(&self) -> usize {
        self.active_count
    }

    /// Activates a slot at `position`, reclaiming the oldest active slot when none is available.
    ///
    /// The returned handle must be treated as a brand-new entity: a reused slot
    /// keeps whatever payload it last carried until the caller overwrites it.
    pub fn acquire(&mut self, position: Vec2) -> Acquisition {
        let (index, reclaimed) = match self.available.pop() {
            Some(index) => {
                self.active_count += 1;
                (index, None)
            }
            None => {
                let index = self
                    .pop_oldest_active()
                    .expect("a pool without available slots tracks every slot as active");
                (index, Some(self.handle_at(index)))
            }
        };

        let slot = &mut self.slots[index as usize];
        slot.generation = next_generation(slot.generation);
        slot.state = SlotState::Active;
        slot.position = position;
        let generation = slot.generation;

        self.push_active(ActiveEntry { index, generation });

        Acquisition {
            handle: SlotHandle::new(self.kind, index, generation),
            reclaimed,
        }
    }

    /// Returns the slot addressed by `handle` to the available stack.
    pub fn release(&mut self, handle: SlotHandle) -> Result<(), HandleError> {
        let index = self.validate(handle)?;
        self.slots[index].state = SlotState::Available;
        self.available.push(handle.index());
        self.active_count -= 1;
        Ok(())
    }

    /// Returns every active slot to the pool, oldest first, and reports how many were released.
    pub fn release_all(&mut self) -> u32 {
        let mut released = 0;
        while let Some(entry) = self.active.pop_front() {
            if !self.is_live(entry) {
                continue;
            }
            self.slots[entry.index as usize].state = SlotState::Available;
            self.available.push(entry.index);
            released += 1;
        }
        self.active_count = 0;
        released
    }

    /// Looks up the slot addressed by a live handle.
    pub fn slot(&self, handle: SlotHandle) -> Result<&Slot, HandleError> {
        let index = self.validate(handle)?;
        Ok(&self.slots[index])
    }

    /// Mutable access to the payload of a live slot.
    pub fn payload_mut(&mut self, handle: SlotHandle) -> Result<&mut SlotPayload, HandleError> {
        let index = self.validate(handle)?;
        Ok(&mut self.slots[index].payload)
    }

    /// Moves a live slot to `position`.
    pub fn set_position(&mut self, handle: SlotHandle, position: Vec2) -> Result<(), HandleError> {
        let index = self.validate(handle)?;
        self.slots[index].position = position;
        Ok(())
    }

    /// Iterates live handles from the oldest to the most recent acquisition.
    pub fn active_handles(&self) -> impl Iterator<Item = SlotHandle> + '_ {
        self.active
            .iter()
            .copied()
            .filter(move |entry| self.is_live(*entry))
            .map(move |entry| SlotHandle::new(self.kind, entry.index, entry.generation))
    }

    fn validate(&self, handle: SlotHandle) -> Result<usize, HandleError> {
        if handle.kind() != self.kind {
            return Err(HandleError::KindMismatch);
        }
        let index = handle.index() as usize;
        let Some(slot) = self.slots.get(index) else {
            return Err(HandleError::OutOfRange);
        };
        if slot.generation != handle.generation() {
            return Err(HandleError::Stale);
        }
        if slot.state == SlotState::Available {
            return Err(HandleError::AlreadyAvailable);
        }
        Ok(index)
    }

    fn handle_at(&self, index: u32) -> SlotHandle {
        SlotHandle::new(self.kind, index, self.slots[index as usize].generation)
    }

    fn is_live(&self, entry: ActiveEntry) -> bool {
        let slot = &self.slots[entry.index as usize];
        slot.state == SlotState::Active && slot.generation == entry.generation
    }

    fn pop_oldest_active(&mut self) -> Option<u32> {
        while let Some(entry) = self.active.pop_front() {
            if self.is_live(entry) {
                return Some(entry.index);
            }
        }
        None
    }

    fn push_active(&mut self, entry: ActiveEntry) {
        if self.active.len() >= self.slots.len() * ACTIVE_QUEUE_SLACK {
            let slots = &self.slots;
            self.active.retain(|queued| {
                let slot = &slots[queued.index as usize];
                slot.state == SlotState::Active && slot.generation == queued.generation
            });
        }
        self.active.push_back(entry);
    }
}

/// Generation following `current`. Zero is reserved for never-acquired slots and skipped on wrap.
fn next_generation(current: u32) -> u32 {
    match current.wrapping_add(1) {
        0 => 1,
        next => next,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(capacity: usize) -> EntityPool {
        EntityPool::new(EntityKind::Target, capacity, |_| {
            SlotPayload::pristine(EntityKind::Target)
        })
        .expect("valid capacity")
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let result = EntityPool::new(EntityKind::Effect, 0, |_| {
            SlotPayload::pristine(EntityKind::Effect)
        });
        assert_eq!(
            result.err(),
            Some(ConfigError::ZeroCapacity {
                kind: EntityKind::Effect
            })
        );
    }

    #[test]
    fn most_recently_released_slot_is_reused_first() {
        let mut pool = pool(3);
        let first = pool.acquire(Vec2::ZERO).handle;
        let second = pool.acquire(Vec2::ZERO).handle;
        pool.release(first).expect("release first");
        pool.release(second).expect("release second");

        let reused = pool.acquire(Vec2::ZERO).handle;
        assert_eq!(reused.index(), second.index());
        assert_ne!(reused.generation(), second.generation());
    }

    #[test]
    fn stale_handles_are_rejected_after_reuse() {
        let mut pool = pool(1);
        let first = pool.acquire(Vec2::ZERO).handle;
        pool.release(first).expect("release");
        let _second = pool.acquire(Vec2::ONE).handle;

        assert_eq!(pool.release(first), Err(HandleError::Stale));
        assert_eq!(pool.active_count(), 1);
    }

    #[test]
    fn double_release_is_reported_without_corrupting_counts() {
        let mut pool = pool(2);
        let handle = pool.acquire(Vec2::ZERO).handle;
        pool.release(handle).expect("first release");

        assert_eq!(pool.release(handle), Err(HandleError::AlreadyAvailable));
        assert_eq!(pool.available_count(), 2);
        assert_eq!(pool.active_count(), 0);
    }

    #[test]
    fn never_acquired_handle_is_rejected_without_side_effects() {
        let mut pool = pool(2);
        let never_issued = SlotHandle::new(EntityKind::Target, 0, 0);

        assert_eq!(pool.release(never_issued), Err(HandleError::AlreadyAvailable));
        assert_eq!(pool.slot(never_issued).err(), Some(HandleError::AlreadyAvailable));
        assert_eq!(pool.available_count(), 2);
        assert_eq!(pool.active_count(), 0);

        let issued = pool.acquire(Vec2::ZERO).handle;
        assert_eq!(issued.index(), 0);
        assert_eq!(pool.release(never_issued), Err(HandleError::Stale));
        assert_eq!(pool.active_count(), 1);
    }

    #[test]
    fn generation_wrap_skips_the_never_issued_value() {
        let mut pool = pool(1);
        pool.slots[0].generation = u32::MAX;

        let handle = pool.acquire(Vec2::ZERO).handle;

        assert_eq!(handle.generation(), 1);
        assert_eq!(
            pool.release(SlotHandle::new(EntityKind::Target, 0, 0)),
            Err(HandleError::Stale)
        );
        assert_eq!(pool.release(handle), Ok(()));
    }

    #[test]
    fn foreign_and_out_of_range_handles_are_rejected() {
        let mut pool = pool(2);
        let foreign = SlotHandle::new(EntityKind::Projectile, 0, 1);
        let beyond = SlotHandle::new(EntityKind::Target, 9, 1);

        assert_eq!(pool.release(foreign), Err(HandleError::KindMismatch));
        assert_eq!(pool.release(beyond), Err(HandleError::OutOfRange));
    }

    #[test]
    fn force_recycle_skips_released_entries() {
        let mut pool = pool(2);
        let first = pool.acquire(Vec2::ZERO).handle;
        let second = pool.acquire(Vec2::ZERO).handle;
        pool.release(first).expect("release first");
        let third = pool.acquire(Vec2::ZERO).handle;

        let recycled = pool.acquire(Vec2::new(4.0, 2.0));
        assert_eq!(recycled.reclaimed, Some(second));
        assert_eq!(recycled.handle.index(), second.index());
        assert_eq!(pool.slot(third).map(Slot::state), Ok(SlotState::Active));
    }

    #[test]
    fn active_queue_stays_bounded_under_churn() {
        let mut pool = pool(4);
        let anchor = pool.acquire(Vec2::ZERO).handle;
        for _ in 0..10_000 {
            let handle = pool.acquire(Vec2::ZERO).handle;
            pool.release(handle).expect("release churned slot");
        }

        assert!(pool.active.len() <= pool.capacity() * ACTIVE_QUEUE_SLACK);
        assert_eq!(pool.active_handles().collect::<Vec<_>>(), vec![anchor]);
    }

    #[test]
    fn release_all_is_idempotent() {
        let mut pool = pool(3);
        let _a = pool.acquire(Vec2::ZERO);
        let _b = pool.acquire(Vec2::ZERO);

        assert_eq!(pool.release_all(), 2);
        assert_eq!(pool.release_all(), 0);
        assert_eq!(pool.available_count(), 3);
        assert_eq!(pool.active_count(), 0);
    }
}
