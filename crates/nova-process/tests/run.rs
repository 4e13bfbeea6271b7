#![cfg(unix)]

use nova_process::{run_command, RunOptions};
use std::{
    path::Path,
    time::{Duration, Instant},
};

fn sh(script: &str, opts: &RunOptions) -> nova_process::CommandResult {
    run_command(
        Path::new("."),
        Path::new("sh"),
        &["-c".into(), script.into()],
        opts,
    )
    .unwrap()
}

#[test]
fn captures_both_streams() {
    let result = sh("echo out; echo err 1>&2; exit 3", &RunOptions::default());

    assert_eq!(result.status.code(), Some(3));
    assert!(!result.timed_out);
    assert_eq!(result.output.stdout, "out\n");
    assert_eq!(result.output.stderr, "err\n");
    assert_eq!(result.output.combined(), "out\nerr\n");
}

#[test]
fn truncates_large_stdout() {
    let opts = RunOptions {
        max_bytes: 1024,
        ..RunOptions::default()
    }
    .with_timeout(Duration::from_secs(10));

    let result = sh("head -c 1048576 /dev/zero | tr '\\0' a", &opts);

    assert!(result.status.success());
    assert!(!result.timed_out);
    assert!(result.output.stdout_truncated);
    assert!(!result.output.stderr_truncated);
    assert_eq!(result.output.stdout.len(), 1024);
}

#[test]
fn runs_in_the_requested_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("marker.txt"), "here").unwrap();

    let result = run_command(
        dir.path(),
        Path::new("cat"),
        &["marker.txt".into()],
        &RunOptions::default(),
    )
    .unwrap();

    assert_eq!(result.output.stdout, "here");
}

#[test]
fn timeout_kills_process_tree() {
    let opts = RunOptions::default().with_timeout(Duration::from_millis(100));

    let start = Instant::now();
    // The background `sleep` inherits the pipes; only a group kill lets the
    // readers see EOF.
    let result = sh("sleep 30 & sleep 30", &opts);

    assert!(result.timed_out);
    assert!(!result.status.success());
    assert!(
        start.elapsed() < Duration::from_secs(5),
        "expected timeout kill to return promptly, took {:?}",
        start.elapsed()
    );
}

#[test]
fn missing_program_is_a_spawn_error() {
    let err = run_command(
        Path::new("."),
        Path::new("/definitely/not/a/real/program"),
        &[],
        &RunOptions::default(),
    )
    .unwrap_err();

    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
}
