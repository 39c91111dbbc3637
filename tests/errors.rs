use assert_cmd::Command;
use predicates::prelude::*;
use std::time::Duration;

fn cargo_bin() -> Command {
    let mut cmd = Command::cargo_bin("nbf").unwrap();
    cmd.env("NBF_CONFIG", "/nonexistent/nbf.toml");
    cmd
}

#[test]
fn test_comments_are_not_errors() {
    cargo_bin()
        .timeout(Duration::from_secs(2)).arg("run").arg("+a+")
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
}

#[test]
fn test_unmatched_brackets_error_points_at_bracket() {
    cargo_bin()
        .timeout(Duration::from_secs(2)).arg("run").arg("++]")
        .assert()
        .failure()
        .stderr(
            predicate::str::contains("nbf")
                .and(predicate::str::contains("Parse error: unmatched bracket ']' at instruction 2"))
                .and(predicate::str::contains("  ++]\n    ^")),
        );
}

#[test]
fn test_unclosed_bracket_error() {
    cargo_bin()
        .timeout(Duration::from_secs(2)).arg("run").arg("[")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unmatched bracket '['"));
}

#[test]
fn test_lenient_runs_unbalanced_program() {
    cargo_bin()
        .timeout(Duration::from_secs(2)).args(["run", "--lenient", "]+++."])
        .assert()
        .success()
        .stdout("\u{3}\n");
}

#[test]
fn test_edge_error_policy_reports_pointer() {
    cargo_bin()
        .timeout(Duration::from_secs(2)).args(["run", "--edge", "error", "<"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("pointer out of range (ptr=0, op=<)"));
}

#[test]
fn test_clamped_left_edge_is_silent() {
    cargo_bin()
        .timeout(Duration::from_secs(2)).args(["run", "<<<+++."])
        .assert()
        .success()
        .stdout("\u{3}\n")
        .stderr(predicate::str::is_empty());
}

#[test]
fn test_empty_input_is_an_error_by_default() {
    cargo_bin()
        .timeout(Duration::from_secs(2)).args(["run", ","])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no input available"));
}

#[test]
fn test_unknown_policy_value_is_rejected() {
    cargo_bin()
        .args(["run", "--on-eof", "sometimes", "+"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("sometimes"));
}

#[test]
fn test_nesting_at_default_limit_runs_and_one_more_is_refused() {
    let deep = |n: usize| format!("+{}-{}", "[".repeat(n), "]".repeat(n));

    cargo_bin()
        .timeout(Duration::from_secs(10))
        .args(["run", &deep(1_000)])
        .assert()
        .success()
        .stderr(predicate::str::is_empty());

    cargo_bin()
        .timeout(Duration::from_secs(10))
        .args(["run", &deep(1_001)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Loops nested 1001 deep exceed the limit of 1000"));
}
