use predicates::prelude::*;

// Utilities
fn make_cmd() -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::cargo_bin("nbf").expect("nbf binary");
    cmd.env("NBF_CONFIG", "/nonexistent/nbf.toml");
    cmd
}

#[test]
fn repl_empty_input_exits_clean_and_quiet() {
    let mut cmd = make_cmd();
    // In non-TTY (piped) stdin, REPL auto-selects bare mode and prints no prompt.
    cmd.write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::is_empty());
}

#[test]
fn repl_valid_program_then_eof_outputs_and_exits() {
    let mut cmd = make_cmd();
    let program = "+".repeat(65) + "."; // 'A'

    cmd.env("NBF_REPL_ONCE", "1")
        .write_stdin(program)
        .assert()
        .success()
        .stdout(predicate::str::contains("A\n"))
        .stderr(predicate::str::is_empty());
}

#[test]
fn repl_invalid_program_reports_error_and_exits() {
    let mut cmd = make_cmd();

    cmd.env("NBF_REPL_ONCE", "1")
        .write_stdin("]") // stray closing bracket is a parse error
        .assert()
        .success() // exits cleanly in our bare-mode pipeline when stdin closes
        .stderr(predicate::str::contains("Parse error: unmatched bracket"))
        // REPL prints a trailing newline on stdout after each execution for readability
        .stdout(predicate::str::contains("\n"));
}

#[test]
fn repl_meta_lines_in_bare_mode_are_comments() {
    let mut cmd = make_cmd();
    cmd.write_stdin(":help\n:exit\n")
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::is_empty());
}

#[test]
fn repl_legacy_flag_uses_unbounded_cells() {
    let mut cmd = make_cmd();
    cmd.args(["repl", "--bare", "--legacy"])
        .write_stdin("-.")
        .assert()
        .success()
        .stderr(predicate::str::contains("not a printable code point"));
}
