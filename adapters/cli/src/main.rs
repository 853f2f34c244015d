#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a headless Target Rush session.

mod autopilot;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{ensure, Context, Result};
use clap::Parser;
use target_rush_core::duration_from_secs;
use target_rush_system_session::SessionConfig;

use crate::autopilot::{AutopilotSettings, MAX_TICK_HZ};

/// Runs a session with a scripted player and prints the outcome.
#[derive(Debug, Parser)]
#[command(name = "target-rush", version, about)]
struct CliArgs {
    /// TOML file overriding the built-in tuning.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Seed for every variance stream. Overrides the configuration file.
    #[arg(long)]
    seed: Option<u64>,
    /// Longest simulated run, in seconds.
    #[arg(long, default_value_t = 120.0)]
    duration_secs: f32,
    /// Simulation ticks per second.
    #[arg(long, default_value_t = 60)]
    tick_hz: u32,
    /// Seconds between shots fired by the autopilot.
    #[arg(long, default_value_t = 0.6)]
    fire_interval_secs: f32,
    /// Height a target must fall below to end the run.
    #[arg(long, default_value_t = -260.0, allow_negative_numbers = true)]
    defense_line: f32,
}

/// Entry point for the Target Rush command-line interface.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = CliArgs::parse();
    let mut config = load_config(args.config.as_deref())?;
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    let settings = settings_from_args(&args)?;

    log::info!(
        "running headless session with seed {} for up to {:?}",
        config.seed,
        settings.duration
    );
    let report = autopilot::run(&config, &settings)?;
    println!("{report}");
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<SessionConfig> {
    let Some(path) = path else {
        return Ok(SessionConfig::default());
    };
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration from {}", path.display()))?;
    SessionConfig::from_toml_str(&source)
        .with_context(|| format!("failed to parse configuration in {}", path.display()))
}

fn settings_from_args(args: &CliArgs) -> Result<AutopilotSettings> {
    ensure!(
        (1..=MAX_TICK_HZ).contains(&args.tick_hz),
        "--tick-hz must be between 1 and {MAX_TICK_HZ}"
    );
    ensure!(
        args.defense_line.is_finite(),
        "--defense-line must be a finite height"
    );
    let fire_interval = duration_from_secs("fire_interval_secs", args.fire_interval_secs)
        .context("invalid --fire-interval-secs")?;
    let duration = duration_from_secs("duration_secs", args.duration_secs)
        .context("invalid --duration-secs")?;

    Ok(AutopilotSettings {
        duration,
        tick_hz: args.tick_hz,
        fire_interval,
        defense_line: args.defense_line,
        ..AutopilotSettings::default()
    })
}
