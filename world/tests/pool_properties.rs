use proptest::prelude::*;
use target_rush_core::{EntityKind, Event, SlotHandle, SlotPayload, Vec2};
use target_rush_world::{EntityPool, PoolRegistry};

#[derive(Clone, Debug)]
enum Op {
    Acquire,
    ReleaseHeld(usize),
    ReleaseStale(usize),
    ReleaseAll,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => Just(Op::Acquire),
        3 => any::<usize>().prop_map(Op::ReleaseHeld),
        1 => any::<usize>().prop_map(Op::ReleaseStale),
        1 => Just(Op::ReleaseAll),
    ]
}

fn target_pool(capacity: usize) -> EntityPool {
    EntityPool::new(EntityKind::Target, capacity, |_| {
        SlotPayload::pristine(EntityKind::Target)
    })
    .expect("valid capacity")
}

proptest! {
    #[test]
    fn counts_always_sum_to_capacity(
        capacity in 1usize..12,
        ops in prop::collection::vec(op_strategy(), 0..200),
    ) {
        let mut pool = target_pool(capacity);
        let mut held: Vec<SlotHandle> = Vec::new();
        let mut retired: Vec<SlotHandle> = Vec::new();

        for op in ops {
            match op {
                Op::Acquire => {
                    let acquisition = pool.acquire(Vec2::ZERO);
                    if let Some(reclaimed) = acquisition.reclaimed {
                        held.retain(|handle| *handle != reclaimed);
                        retired.push(reclaimed);
                    }
                    held.push(acquisition.handle);
                }
                Op::ReleaseHeld(pick) => {
                    if !held.is_empty() {
                        let handle = held.remove(pick % held.len());
                        prop_assert!(pool.release(handle).is_ok());
                        retired.push(handle);
                    }
                }
                Op::ReleaseStale(pick) => {
                    if !retired.is_empty() {
                        let handle = retired[pick % retired.len()];
                        prop_assert!(pool.release(handle).is_err());
                    }
                }
                Op::ReleaseAll => {
                    let released = pool.release_all();
                    prop_assert_eq!(released as usize, held.len());
                    retired.append(&mut held);
                }
            }

            prop_assert_eq!(pool.available_count() + pool.active_count(), pool.capacity());
            prop_assert_eq!(pool.active_count(), held.len());
            prop_assert_eq!(pool.capacity(), capacity);
        }
    }

    #[test]
    fn full_pool_acquire_recycles_oldest_and_reports_once(
        capacity in 1usize..16,
        extra in 1usize..32,
    ) {
        let mut registry = PoolRegistry::new();
        registry
            .register_kind(EntityKind::Effect, capacity, |_| SlotPayload::pristine(EntityKind::Effect))
            .expect("register");
        let mut events = Vec::new();
        let mut order = Vec::new();
        for _ in 0..capacity {
            order.push(registry.acquire(EntityKind::Effect, Vec2::ZERO, &mut events).expect("fill"));
        }

        for _ in 0..extra {
            events.clear();
            let oldest = order.remove(0);
            let handle = registry.acquire(EntityKind::Effect, Vec2::ONE, &mut events).expect("recycle");
            let exhausted: Vec<_> = events
                .iter()
                .filter_map(|event| match event {
                    Event::PoolExhausted { reclaimed, .. } => Some(*reclaimed),
                    _ => None,
                })
                .collect();

            prop_assert_eq!(exhausted, vec![oldest]);
            prop_assert_eq!(handle.index(), oldest.index());
            order.push(handle);

            let pool = registry.pool(EntityKind::Effect).expect("pool");
            prop_assert_eq!(pool.available_count(), 0);
            prop_assert_eq!(pool.active_count(), capacity);
        }
    }
}
