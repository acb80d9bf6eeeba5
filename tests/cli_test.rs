use std::process::{Command, Output};

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_elevator_sim"))
        .args(args)
        .env("RUST_LOG", "warn,elevator_sim=info")
        .output()
        .expect("Failed to execute simulation")
}

/// Test that the simulation runs headless and reports its statistics
#[test]
fn test_headless_simulation_runs() {
    let output = run_cli(&["--ticks", "200", "--seed", "7", "--report-every", "0"]);

    assert!(
        output.status.success(),
        "Simulation failed to run. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("SIMULATION COMPLETE"),
        "Simulation did not complete properly. stderr: {}",
        stderr
    );
    for key in [
        "Total requests:",
        "Completed requests:",
        "Pending requests:",
        "Mean wait:",
        "Max travel:",
        "Completion rate:",
    ] {
        assert!(stderr.contains(key), "Missing '{}' statistic", key);
    }
}

/// Test that requests get delivered during a run
#[test]
fn test_requests_completed_during_simulation() {
    let output = run_cli(&["--ticks", "300", "--seed", "11", "--report-every", "0"]);
    assert!(output.status.success(), "Simulation failed to run");

    let stderr = String::from_utf8_lossy(&output.stderr);
    let completed = stderr
        .lines()
        .find_map(|line| line.split("Completed requests: ").nth(1))
        .and_then(|n| n.trim().parse::<u64>().ok())
        .expect("Completed requests line present");
    assert!(completed > 0, "No requests were completed");
}

#[test]
fn test_json_snapshot_printed() {
    let output = run_cli(&[
        "--ticks",
        "50",
        "--seed",
        "1",
        "--elevators",
        "4",
        "--rush-hour",
        "morning",
        "--report-every",
        "0",
        "--json",
    ]);
    assert!(output.status.success(), "Simulation failed to run");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout.lines().last().expect("stdout not empty");
    let snapshot: serde_json::Value = serde_json::from_str(line).expect("valid json");
    assert_eq!(snapshot["tick"], 50);
    assert_eq!(snapshot["elevators"].as_array().map(Vec::len), Some(4));
    assert_eq!(snapshot["rush_hour"], true);
}

#[test]
fn test_invalid_arguments_fail() {
    let output = run_cli(&["--elevators", "0", "--ticks", "5"]);
    assert!(!output.status.success());

    let output = run_cli(&["--speed", "0", "--ticks", "5"]);
    assert!(!output.status.success());

    let output = run_cli(&["--rate", "1e12", "--ticks", "5"]);
    assert!(!output.status.success());
}
