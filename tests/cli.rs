use assert_cmd::Command;
use predicates::prelude::*;
use std::time::Duration;

fn cargo_bin() -> Command {
    let mut cmd = Command::cargo_bin("bf-tape").unwrap();
    cmd.env_remove("RUST_LOG").timeout(Duration::from_secs(5));
    cmd
}

#[test]
fn reverses_stdin_until_eof() {
    cargo_bin()
        .write_stdin("AB")
        .assert()
        .success()
        .stdout(&b"BA\0"[..])
        .stderr(predicate::str::is_empty());
}

#[test]
fn empty_stdin_prints_only_nul() {
    cargo_bin()
        .write_stdin("")
        .assert()
        .success()
        .stdout(&b"\0"[..]);
}

#[test]
fn multiline_input_is_reversed_bytewise() {
    cargo_bin()
        .write_stdin("hi\nyo")
        .assert()
        .success()
        .stdout(&b"oy\nih\0"[..]);
}

#[test]
fn debug_logs_go_to_stderr() {
    cargo_bin()
        .env("RUST_LOG", "bf_tape=debug")
        .write_stdin("x")
        .assert()
        .success()
        .stdout(&b"x\0"[..])
        .stderr(predicate::str::contains("execution finished"));
}

#[test]
fn long_input_runs_off_the_tape() {
    cargo_bin()
        .write_stdin(vec![b'a'; 32767])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("tape overflow").and(predicate::str::contains("index 2")));
}
