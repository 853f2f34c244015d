use std::process::Command;

#[test]
fn headless_run_prints_a_summary() {
    let output = Command::new(env!("CARGO_BIN_EXE_target-rush"))
        .args(["--seed", "11", "--duration-secs", "5", "--fire-interval-secs", "0.2"])
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to launch target-rush");

    assert!(output.status.success(), "target-rush should exit cleanly");
    let stdout = String::from_utf8(output.stdout).expect("utf-8 output");
    assert!(stdout.contains("final score"), "unexpected output: {stdout}");
    assert!(stdout.contains("time limit reached"));
}

#[test]
fn missing_config_file_is_reported() {
    let output = Command::new(env!("CARGO_BIN_EXE_target-rush"))
        .args(["--config", "does/not/exist.toml"])
        .output()
        .expect("failed to launch target-rush");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to read configuration"));
}

#[test]
fn excessive_tick_rate_is_refused() {
    let output = Command::new(env!("CARGO_BIN_EXE_target-rush"))
        .args(["--tick-hz", "2000000000", "--duration-secs", "1"])
        .output()
        .expect("failed to launch target-rush");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--tick-hz must be between 1 and 10000"), "{stderr}");
}
