use std::time::Duration;

use proptest::prelude::*;
use target_rush_system_spawning::{Config, SpawnCadence};

fn cadence(interval_secs: f32) -> SpawnCadence {
    SpawnCadence::new(Config::new(interval_secs, 0.1)).expect("valid config")
}

#[test]
fn large_dt_yields_one_spawn_and_keeps_the_remainder() {
    let mut cadence = cadence(1.0);

    assert!(cadence.advance(Duration::from_millis(2_600)));
    assert_eq!(cadence.accumulated(), Duration::from_millis(1_600));

    assert!(cadence.advance(Duration::ZERO), "backlog pays out on the next call");
    assert_eq!(cadence.accumulated(), Duration::from_millis(600));

    assert!(!cadence.advance(Duration::ZERO));
    assert_eq!(cadence.accumulated(), Duration::from_millis(600));
}

#[test]
fn interval_must_be_exceeded_not_just_reached() {
    let mut cadence = cadence(0.5);

    assert!(!cadence.advance(Duration::from_millis(500)));
    assert!(cadence.advance(Duration::from_millis(1)));
    assert_eq!(cadence.accumulated(), Duration::from_millis(1));
}

#[test]
fn subtracting_the_interval_preserves_long_run_cadence() {
    let mut cadence = cadence(0.5);
    let mut spawns = 0;

    for _ in 0..600 {
        if cadence.advance(Duration::from_millis(17)) {
            spawns += 1;
        }
    }

    // 10.2 seconds at one spawn per half second.
    assert_eq!(spawns, 20);
}

#[test]
fn set_interval_clamps_to_the_floor() {
    let mut cadence = SpawnCadence::new(Config::new(1.0, 0.3)).expect("valid config");

    cadence.set_interval(Duration::ZERO);
    assert_eq!(cadence.interval(), cadence.min_interval());

    cadence.set_interval(Duration::from_secs(2));
    assert_eq!(cadence.interval(), Duration::from_secs(2));
}

#[test]
fn reset_restores_initial_interval_and_clears_backlog() {
    let mut cadence = cadence(1.15);
    let initial = cadence.interval();
    cadence.set_interval(Duration::from_millis(400));
    let _ = cadence.advance(Duration::from_millis(300));

    cadence.reset();

    assert_eq!(cadence.interval(), initial);
    assert_eq!(cadence.accumulated(), Duration::ZERO);
}

proptest! {
    #[test]
    fn spawned_time_plus_backlog_equals_supplied_time(
        interval_millis in 1u64..2_000,
        steps in prop::collection::vec(0u64..10_000, 0..200),
    ) {
        let mut cadence = SpawnCadence::new(Config::new(
            interval_millis as f32 / 1_000.0,
            0.001,
        ))
        .expect("valid config");
        let interval = cadence.interval();
        let mut supplied = Duration::ZERO;
        let mut spawned = Duration::ZERO;

        for millis in steps {
            let dt = Duration::from_millis(millis);
            supplied += dt;
            if cadence.advance(dt) {
                spawned += interval;
            }
            prop_assert!(spawned <= supplied);
            prop_assert_eq!(spawned + cadence.accumulated(), supplied);
        }
    }
}
