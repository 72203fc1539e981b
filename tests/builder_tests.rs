// SPDX-License-Identifier: MIT OR Apache-2.0
//! Spawn-configuration tests for `ProcessBuilder`: validation ordering,
//! stream wiring, environment policy, and argv fidelity.
#![cfg(unix)]

use std::time::Duration;

use exec_kit::{AccessMode, ExecError, ProcessBuilder, StreamDescriptor, StreamSlot};

const COLLECT: Option<Duration> = Some(Duration::from_secs(10));

// ---------------------------------------------------------------------------
// 1. Validation ordering
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_command_is_invalid() {
    let result = ProcessBuilder::new("").spawn();
    assert!(matches!(result, Err(ExecError::InvalidCommand)));
}

#[tokio::test]
async fn missing_working_dir_is_invalid() {
    let result = ProcessBuilder::new("true")
        .working_dir("/definitely/not/a/real/dir")
        .spawn();
    assert!(matches!(result, Err(ExecError::InvalidWorkingDirectory(_))));
}

#[tokio::test]
async fn empty_command_wins_over_bad_working_dir() {
    let result = ProcessBuilder::new("")
        .working_dir("/definitely/not/a/real/dir")
        .spawn();
    assert!(matches!(result, Err(ExecError::InvalidCommand)));
}

#[tokio::test]
async fn unknown_binary_is_a_spawn_error() {
    let result = ProcessBuilder::new("exec-kit-no-such-binary-xyz").spawn();
    assert!(matches!(result, Err(ExecError::Spawn(_))));
}

// ---------------------------------------------------------------------------
// 2. Pipe endpoints mirror the stream table
// ---------------------------------------------------------------------------

#[tokio::test]
async fn endpoints_exist_exactly_for_piped_slots() {
    let mut process = ProcessBuilder::new("cat")
        .stdin(StreamDescriptor::pipe())
        .stdout(StreamDescriptor::pipe())
        .stderr(StreamDescriptor::null())
        .spawn()
        .expect("spawn cat");

    assert!(process.has_endpoint(StreamSlot::Stdin));
    assert!(process.has_endpoint(StreamSlot::Stdout));
    assert!(!process.has_endpoint(StreamSlot::Stderr));

    process.close_slot(StreamSlot::Stdin);
    assert!(!process.has_endpoint(StreamSlot::Stdin));

    process.wait(COLLECT).await.expect("cat exits on stdin EOF");
}

// ---------------------------------------------------------------------------
// 3. File redirection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stdout_redirects_to_a_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("out.txt");

    let mut process = ProcessBuilder::new("sh")
        .args(["-c", "printf 'to file'"])
        .stdout(StreamDescriptor::file(&path, AccessMode::Write))
        .spawn()
        .expect("spawn");
    process.wait(COLLECT).await.expect("wait");

    let written = std::fs::read_to_string(&path).expect("file written");
    assert_eq!(written, "to file");
}

#[tokio::test]
async fn stdin_redirects_from_a_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("in.txt");
    std::fs::write(&path, "from file\n").expect("seed file");

    let mut process = ProcessBuilder::new("cat")
        .stdin(StreamDescriptor::file(&path, AccessMode::Read))
        .stdout(StreamDescriptor::pipe())
        .stderr(StreamDescriptor::pipe())
        .spawn()
        .expect("spawn");
    let output = process.output(COLLECT).await.expect("collect");
    assert_eq!(output.stdout_str(), "from file\n");
}

#[tokio::test]
async fn append_mode_preserves_existing_content() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("log.txt");
    std::fs::write(&path, "first\n").expect("seed file");

    let mut process = ProcessBuilder::new("sh")
        .args(["-c", "printf 'second\\n'"])
        .stdout(StreamDescriptor::file(&path, AccessMode::Append))
        .spawn()
        .expect("spawn");
    process.wait(COLLECT).await.expect("wait");

    let written = std::fs::read_to_string(&path).expect("file written");
    assert_eq!(written, "first\nsecond\n");
}

// ---------------------------------------------------------------------------
// 4. Working directory
// ---------------------------------------------------------------------------

#[tokio::test]
async fn child_runs_in_configured_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    let expected = dir.path().canonicalize().expect("canonicalize");

    let mut process = ProcessBuilder::new("pwd")
        .working_dir(dir.path())
        .stdout(StreamDescriptor::pipe())
        .stderr(StreamDescriptor::pipe())
        .spawn()
        .expect("spawn");
    let output = process.output(COLLECT).await.expect("collect");
    assert_eq!(output.stdout_str().trim(), expected.to_string_lossy());
}

// ---------------------------------------------------------------------------
// 5. Environment policy
// ---------------------------------------------------------------------------

#[tokio::test]
async fn inherited_environment_is_overlaid_with_explicit_entries() {
    let mut process = ProcessBuilder::new("sh")
        .args(["-c", "printf '%s' \"$EXEC_KIT_OVERLAY\""])
        .env("EXEC_KIT_OVERLAY", "explicit")
        .stdout(StreamDescriptor::pipe())
        .stderr(StreamDescriptor::pipe())
        .spawn()
        .expect("spawn");
    let output = process.output(COLLECT).await.expect("collect");
    assert_eq!(output.stdout_str(), "explicit");
}

#[tokio::test]
async fn cleared_environment_contains_exactly_the_explicit_entries() {
    let mut process = ProcessBuilder::new("/usr/bin/env")
        .clear_env()
        .env("ONLY", "1")
        .stdout(StreamDescriptor::pipe())
        .stderr(StreamDescriptor::pipe())
        .spawn()
        .expect("spawn");
    let output = process.output(COLLECT).await.expect("collect");
    assert_eq!(output.stdout_str(), "ONLY=1\n");
}

// ---------------------------------------------------------------------------
// 6. Argv fidelity: no shell re-parsing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn metacharacters_reach_the_child_verbatim() {
    let tricky = ["$HOME", "two words", "a;b|c", "\"quoted\"", "*"];
    let mut process = ProcessBuilder::new("/bin/echo")
        .args(tricky)
        .stdout(StreamDescriptor::pipe())
        .stderr(StreamDescriptor::pipe())
        .spawn()
        .expect("spawn");
    let output = process.output(COLLECT).await.expect("collect");
    assert_eq!(
        output.stdout_str(),
        "$HOME two words a;b|c \"quoted\" *\n"
    );
}
