use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use std::time::Duration;

fn cargo_bin() -> Command {
    let mut cmd = Command::cargo_bin("nbf").unwrap();
    cmd.env("NBF_CONFIG", "/nonexistent/nbf.toml");
    cmd
}

fn infinite_bf() -> &'static str {
    "+[>+<]" // cell 0 stays 1 while cell 1 counts forever
}

fn read_to_tempfile(content: &str) -> tempfile::NamedTempFile {
    let mut tf = tempfile::NamedTempFile::new().expect("tempfile");
    write!(tf, "{}", content).unwrap();
    tf
}

#[test]
fn test_repl_bare_timeout_infinite() {
    // Pipe infinite program to stdin so auto-bare triggers
    cargo_bin()
        .timeout(Duration::from_secs(2))
        .env_remove("NBF_MAX_STEPS")
        .env("NBF_TIMEOUT_MS", "100")
        .write_stdin(infinite_bf())
        .assert()
        .stderr(predicate::str::contains("Execution aborted").and(predicate::str::contains("timeout")))
        .stdout(predicate::str::contains("Execution aborted").not());
}

#[test]
fn test_repl_bare_step_limit_infinite() {
    cargo_bin()
        .timeout(Duration::from_secs(2))
        .env("NBF_MAX_STEPS", "50")
        .env_remove("NBF_TIMEOUT_MS")
        .write_stdin(infinite_bf())
        .assert()
        .stderr(predicate::str::contains("step limit exceeded (50)"))
        .stdout(predicate::str::contains("Execution aborted").not());
}

#[test]
fn test_run_timeout_infinite_flag() {
    let tf = read_to_tempfile(infinite_bf());
    cargo_bin()
        .arg("run").arg("--timeout").arg("100").arg("--file").arg(tf.path())
        .timeout(Duration::from_secs(2))
        .assert()
        .failure()
        .stderr(predicate::str::contains("timeout"))
        .stdout(predicate::str::contains("Execution aborted").not());
}

#[test]
fn test_run_step_limit_infinite_flag() {
    let tf = read_to_tempfile(infinite_bf());
    cargo_bin()
        .arg("run").arg("--max-steps").arg("50").arg("--file").arg(tf.path())
        .timeout(Duration::from_secs(2))
        .assert()
        .failure()
        .stderr(predicate::str::contains("step limit exceeded (50)"))
        .stdout(predicate::str::contains("Execution aborted").not());
}

#[test]
fn test_legacy_entry_cell_loop_needs_the_watchdog() {
    // Terminates under the live-pointer test, spins under the entry-cell test.
    cargo_bin()
        .args(["run", "--max-steps", "200", "++>+<[>-]"])
        .timeout(Duration::from_secs(2))
        .assert()
        .success();

    cargo_bin()
        .args(["run", "--legacy", "--max-steps", "200", "++>+<[>-]"])
        .timeout(Duration::from_secs(2))
        .assert()
        .failure()
        .stderr(predicate::str::contains("step limit exceeded (200)"));
}
