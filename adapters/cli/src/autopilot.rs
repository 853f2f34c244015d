//! Scripted stand-ins for the motion, input and presentation collaborators.
//!
//! The autopilot moves every spawned target down at its stamped fall speed,
//! shoots the lowest target at a fixed rate, lets explosions play for a fixed
//! lifetime, and reports a breach once a target falls below the defense line.

use std::{fmt, time::Duration};

use anyhow::{ensure, Context, Result};
use target_rush_core::{Command, EntityKind, Event, SessionSummary, SlotHandle, Vec2};
use target_rush_system_session::{Session, SessionConfig};

/// Highest simulation rate the autopilot accepts.
pub(crate) const MAX_TICK_HZ: u32 = 10_000;

/// Parameters of the scripted player.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct AutopilotSettings {
    /// Longest simulated run.
    pub(crate) duration: Duration,
    /// Simulation ticks per second.
    pub(crate) tick_hz: u32,
    /// Delay between shots.
    pub(crate) fire_interval: Duration,
    /// Height below which a target ends the run.
    pub(crate) defense_line: f32,
    /// Time an explosion stays in play before it is released.
    pub(crate) effect_lifetime: Duration,
}

impl Default for AutopilotSettings {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(120),
            tick_hz: 60,
            fire_interval: Duration::from_millis(600),
            defense_line: -260.0,
            effect_lifetime: Duration::from_millis(500),
        }
    }
}

/// Outcome of a headless run.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct RunReport {
    /// Summary returned when the session ended.
    pub(crate) summary: SessionSummary,
    /// Targets spawned during the run.
    pub(crate) spawned: u32,
    /// Targets destroyed by the autopilot.
    pub(crate) destroyed: u32,
    /// Entities force-recycled because their pool was full.
    pub(crate) recycled: u32,
    /// Whether a target crossed the defense line.
    pub(crate) breached: bool,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "run ended after {:.2}s ({})",
            self.summary.elapsed.as_secs_f32(),
            if self.breached {
                "defense line breached"
            } else {
                "time limit reached"
            }
        )?;
        writeln!(
            f,
            "final score {} (best {})",
            self.summary.final_score, self.summary.best_score
        )?;
        writeln!(
            f,
            "difficulty tier {} scalar {:.2}",
            self.summary.difficulty.tier, self.summary.difficulty.scalar
        )?;
        write!(
            f,
            "targets spawned {}, destroyed {}, force-recycled entities {}",
            self.spawned, self.destroyed, self.recycled
        )
    }
}

#[derive(Clone, Copy, Debug)]
struct FallingTarget {
    handle: SlotHandle,
    position: Vec2,
    fall_speed: f32,
}

#[derive(Clone, Copy, Debug)]
struct PlayingEffect {
    handle: SlotHandle,
    remaining: Duration,
}

#[derive(Debug)]
struct Autopilot {
    settings: AutopilotSettings,
    targets: Vec<FallingTarget>,
    effects: Vec<PlayingEffect>,
    cooldown: Duration,
    spawned: u32,
    destroyed: u32,
    recycled: u32,
}

impl Autopilot {
    fn new(settings: AutopilotSettings) -> Self {
        let cooldown = settings.fire_interval;
        Self {
            settings,
            targets: Vec::new(),
            effects: Vec::new(),
            cooldown,
            spawned: 0,
            destroyed: 0,
            recycled: 0,
        }
    }

    /// Consumes pending events and mirrors them into the tracked entities.
    fn observe(&mut self, events: &mut Vec<Event>) {
        for event in events.drain(..) {
            match event {
                Event::TargetSpawned {
                    handle,
                    position,
                    traits,
                } => {
                    self.spawned += 1;
                    self.targets.push(FallingTarget {
                        handle,
                        position,
                        fall_speed: traits.fall_speed,
                    });
                }
                Event::EffectSpawned { handle, .. } => self.effects.push(PlayingEffect {
                    handle,
                    remaining: self.settings.effect_lifetime,
                }),
                Event::TargetDestroyed { target, .. } => {
                    self.destroyed += 1;
                    self.targets.retain(|falling| falling.handle != target);
                }
                Event::PoolExhausted { kind, reclaimed } => {
                    self.recycled += 1;
                    match kind {
                        EntityKind::Target => {
                            self.targets.retain(|falling| falling.handle != reclaimed);
                        }
                        EntityKind::Effect => {
                            self.effects.retain(|effect| effect.handle != reclaimed);
                        }
                        EntityKind::Projectile => {}
                    }
                }
                _ => {}
            }
        }
    }

    /// Plays one frame. Returns the breach position when a target crossed the line.
    fn act(
        &mut self,
        session: &mut Session,
        dt: Duration,
        events: &mut Vec<Event>,
    ) -> Result<Option<Vec2>> {
        for falling in &mut self.targets {
            falling.position.y -= falling.fall_speed * dt.as_secs_f32();
            session.set_position(falling.handle, falling.position)?;
        }
        if let Some(breach) = self
            .targets
            .iter()
            .find(|falling| falling.position.y < self.settings.defense_line)
        {
            return Ok(Some(breach.position));
        }

        let mut expired = Vec::new();
        self.effects.retain_mut(|effect| {
            effect.remaining = effect.remaining.saturating_sub(dt);
            if effect.remaining.is_zero() {
                expired.push(effect.handle);
                false
            } else {
                true
            }
        });
        for handle in expired {
            session.apply(Command::ReleaseEntity { handle }, events);
        }

        self.cooldown = self.cooldown.saturating_sub(dt);
        if self.cooldown.is_zero() {
            if let Some(lowest) = self
                .targets
                .iter()
                .min_by(|a, b| a.position.y.total_cmp(&b.position.y))
                .copied()
            {
                let muzzle = Vec2::new(lowest.position.x, self.settings.defense_line);
                let projectile = session.launch_projectile(muzzle, events)?;
                session.notify_hit(Some(projectile), lowest.handle, events)?;
                session.release(projectile, events)?;
                self.cooldown = self.settings.fire_interval;
            }
        }
        Ok(None)
    }

    fn into_report(self, summary: SessionSummary, breached: bool) -> RunReport {
        RunReport {
            summary,
            spawned: self.spawned,
            destroyed: self.destroyed,
            recycled: self.recycled,
            breached,
        }
    }
}

/// Plays a full session with `settings` and reports the outcome.
pub(crate) fn run(config: &SessionConfig, settings: &AutopilotSettings) -> Result<RunReport> {
    ensure!(
        (1..=MAX_TICK_HZ).contains(&settings.tick_hz),
        "tick rate {} Hz is outside 1..={MAX_TICK_HZ}",
        settings.tick_hz
    );
    let tick = Duration::from_secs(1) / settings.tick_hz;
    ensure!(!tick.is_zero(), "tick rate {} Hz yields an empty tick", settings.tick_hz);
    let mut session = Session::new(config).context("invalid session configuration")?;
    let frames = settings.duration.as_nanos().div_ceil(tick.as_nanos());
    let mut pilot = Autopilot::new(settings.clone());
    let mut events = Vec::new();
    let mut breached = false;

    session.start(&mut events)?;
    pilot.observe(&mut events);
    for _ in 0..frames {
        session.tick(tick, &mut events);
        pilot.observe(&mut events);
        let breach = pilot.act(&mut session, tick, &mut events)?;
        pilot.observe(&mut events);
        if let Some(position) = breach {
            log::info!("target crossed the defense line at x = {:.1}", position.x);
            session.notify_terminal_condition(Some(position), &mut events)?;
            breached = true;
            break;
        }
    }

    let summary = session.end(&mut events)?;
    pilot.observe(&mut events);
    Ok(pilot.into_report(summary, breached))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(duration_secs: u64) -> AutopilotSettings {
        AutopilotSettings {
            duration: Duration::from_secs(duration_secs),
            ..AutopilotSettings::default()
        }
    }

    #[test]
    fn out_of_range_tick_rates_are_rejected() {
        let config = SessionConfig::default();
        for tick_hz in [0, MAX_TICK_HZ + 1, 2_000_000_000] {
            let result = run(
                &config,
                &AutopilotSettings {
                    tick_hz,
                    ..settings(1)
                },
            );
            assert!(result.is_err(), "{tick_hz} Hz should be rejected");
        }
    }

    #[test]
    fn highest_tick_rate_still_runs() {
        let report = run(
            &SessionConfig::default(),
            &AutopilotSettings {
                tick_hz: MAX_TICK_HZ,
                ..settings(1)
            },
        )
        .expect("run");
        assert!(report.summary.elapsed >= Duration::from_secs(1));
    }

    #[test]
    fn identical_seeds_replay_identical_runs() {
        let config = SessionConfig::default().with_seed(42);
        let first = run(&config, &settings(60)).expect("run");
        let second = run(&config, &settings(60)).expect("run");
        assert_eq!(first, second);
    }

    #[test]
    fn rapid_fire_holds_the_line() {
        let config = SessionConfig::default().with_seed(3);
        let report = run(
            &config,
            &AutopilotSettings {
                fire_interval: Duration::ZERO,
                ..settings(30)
            },
        )
        .expect("run");

        assert!(!report.breached);
        assert_eq!(report.summary.final_score, report.destroyed);
        assert!(report.destroyed > 0);
        assert!(report.summary.elapsed >= Duration::from_secs(30));
    }

    #[test]
    fn idle_pilot_loses_to_the_first_target() {
        let config = SessionConfig::default().with_seed(5);
        let report = run(
            &config,
            &AutopilotSettings {
                fire_interval: Duration::from_secs(1_000),
                ..settings(120)
            },
        )
        .expect("run");

        assert!(report.breached);
        assert_eq!(report.summary.final_score, 0);
        assert!(report.summary.elapsed < Duration::from_secs(120));
    }
}
