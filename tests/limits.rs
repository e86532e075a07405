use assert_cmd::Command;
use predicates::prelude::*;
use std::time::Duration;

fn cargo_bin() -> Command {
    Command::cargo_bin("bfvm").unwrap()
}

fn infinite_bf() -> &'static str {
    "+[]" // increments to 1, then [] does nothing forever (infinite loop)
}

#[test]
fn test_timeout_aborts_infinite_program() {
    cargo_bin()
        .timeout(Duration::from_secs(5))
        .arg("--timeout")
        .arg("100")
        .arg(infinite_bf())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Execution aborted").and(predicate::str::contains("timeout")))
        .stdout(predicate::str::contains("Execution aborted").not());
}

#[test]
fn test_step_limit_aborts_infinite_program() {
    cargo_bin()
        .timeout(Duration::from_secs(2))
        .arg("--max-steps")
        .arg("50")
        .arg(infinite_bf())
        .assert()
        .failure()
        .stderr(predicate::str::contains("step limit exceeded (50)"))
        .stdout(predicate::str::contains("Execution aborted").not());
}

#[test]
fn test_step_limit_does_not_trip_for_short_program() {
    cargo_bin()
        .timeout(Duration::from_secs(2))
        .arg("--max-steps")
        .arg("1000")
        .arg("+++.")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("\u{3}"));
}
