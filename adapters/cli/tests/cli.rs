use std::process::Command;

fn emberfall() -> Command {
    Command::new(env!("CARGO_BIN_EXE_emberfall"))
}

#[test]
fn scripted_session_prints_banner_and_summary() {
    let output = emberfall()
        .args(["--frames", "120", "--seed", "7", "--config"])
        .arg(concat!(env!("CARGO_MANIFEST_DIR"), "/demo.toml"))
        .output()
        .expect("binary runs");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Welcome to Emberfall."));
    assert!(stdout.contains("frames: 120"));
    assert!(stdout.contains("enemies slain:"));
}

#[test]
fn default_configuration_needs_no_file() {
    let output = emberfall()
        .args(["--frames", "10"])
        .output()
        .expect("binary runs");

    assert!(output.status.success());
}

#[test]
fn missing_config_file_is_reported() {
    let output = emberfall()
        .args(["--config", "does-not-exist.toml"])
        .output()
        .expect("binary runs");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to read config"));
}
