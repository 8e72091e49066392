//! Integration tests for the fanout CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn fanout() -> Command {
    Command::cargo_bin("fanout").unwrap()
}

/// Test CLI binary exists and responds to --help
#[test]
fn test_cli_help() {
    fanout()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("parallel"));
}

/// Test CLI responds to --version
#[test]
fn test_cli_version() {
    fanout()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("fanout"));
}

/// Test a template is required
#[test]
fn test_missing_template_is_usage_error() {
    fanout()
        .assert()
        .failure()
        .stderr(predicate::str::contains("TEMPLATE"));
}

#[test]
fn test_literal_source_runs_every_argument() {
    fanout()
        .args(["echo", ":::", "alpha", "beta", "gamma"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("alpha")
                .and(predicate::str::contains("beta"))
                .and(predicate::str::contains("gamma")),
        );
}

/// Cartesian product in odometer order, pinned with --keep-order
#[test]
fn test_cartesian_expansion_order() {
    fanout()
        .args(["-k", "echo", "{1}-{2}", ":::", "A", "B", ":::", "1", "2"])
        .assert()
        .success()
        .stdout("A-1\nA-2\nB-1\nB-2\n");
}

/// Linked mode pairs sources positionally
#[test]
fn test_linked_expansion() {
    fanout()
        .args(["--link", "-k", "echo", "{1}{2}", ":::", "A", "B", ":::", "1", "2"])
        .assert()
        .success()
        .stdout("A1\nB2\n");
}

/// Linked mode with unequal lengths fails before running anything
#[test]
fn test_linked_length_mismatch_is_fatal() {
    fanout()
        .args(["--link", "echo", "{1}{2}", ":::", "A", "B", ":::", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("equal-length"))
        .stdout(predicate::str::is_empty());
}

/// Positional placeholders substitute by 1-based tuple index
#[test]
fn test_placeholder_positions() {
    fanout()
        .args(["echo", "{2}", "{1}", ":::", "A", ":::", "1"])
        .assert()
        .success()
        .stdout("1 A\n");
}

#[test]
fn test_placeholder_out_of_range_is_fatal() {
    fanout()
        .args(["echo", "{3}", ":::", "a", ":::", "b"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of range"))
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_unknown_placeholder_is_fatal() {
    fanout()
        .args(["echo", "{name}", ":::", "a"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown placeholder"));
}

/// `::::` reads one record per line from each named file
#[test]
fn test_file_source() {
    let dir = TempDir::new().unwrap();
    let list = dir.path().join("args.txt");
    fs::write(&list, "one\ntwo\n").unwrap();

    fanout()
        .args(["-k", "echo", "::::"])
        .arg(&list)
        .assert()
        .success()
        .stdout("one\ntwo\n");
}

#[test]
fn test_missing_arg_file_is_fatal() {
    fanout()
        .args(["echo", "::::", "/no/such/args.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read argument source"));
}

/// With no source on the command line, records come from piped stdin
#[test]
fn test_stdin_source() {
    fanout()
        .args(["-k", "echo"])
        .write_stdin("red\nblue\n")
        .assert()
        .success()
        .stdout("red\nblue\n");
}

/// A failing job fails the batch but not its siblings
#[test]
fn test_failing_job_sets_exit_code() {
    fanout()
        .args(["-k", "sh", "-c", "test {} != b && echo {}", ":::", "a", "b", "c"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("did not succeed"))
        .stdout("a\nc\n");
}

/// Dry run prints every built command and executes nothing
#[test]
fn test_dry_run_builds_without_dispatch() {
    fanout()
        .args(["--dry-run", "/no/such/program", "{}", ":::", "x", "y"])
        .assert()
        .success()
        .stdout("/no/such/program x\n/no/such/program y\n");
}

/// Unknown programs are rejected before any job is dispatched
#[test]
fn test_unknown_program_preflight() {
    fanout()
        .args(["/no/such/program", ":::", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found in PATH"));
}

/// A template without placeholders gets the tuple appended
#[test]
fn test_appended_arguments() {
    fanout()
        .args(["-k", "echo", "prefix", ":::", "1", "2"])
        .assert()
        .success()
        .stdout("prefix 1\nprefix 2\n");
}

/// One worker slot serializes jobs in input order
#[test]
fn test_single_slot_runs_in_order() {
    fanout()
        .args(["-j", "1", "echo", "{}", ":::", "1", "2", "3"])
        .assert()
        .success()
        .stdout("1\n2\n3\n");
}

/// Config file defaults are picked up and CLI flags override them
#[test]
fn test_config_file_defaults() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("fanout.toml");
    fs::write(&config, "jobs = 1\nkeep_order = true\n").unwrap();

    fanout()
        .arg("--config")
        .arg(&config)
        .args(["echo", "{}", ":::", "x", "y"])
        .assert()
        .success()
        .stdout("x\ny\n");
}
