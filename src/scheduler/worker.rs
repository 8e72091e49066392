//! Single-job process execution
//!
//! One worker call per job: spawn the process with piped stdout/stderr,
//! drain both pipes on helper threads (a full pipe would otherwise deadlock
//! the child), and poll for exit so a cancellation request can kill the
//! process promptly.

use super::{JobOutcome, JobState};
use crate::template::BuiltCommand;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Terminal record for a job that was never spawned because the run was
/// already cancelled when a worker picked it up
pub(super) fn cancelled_outcome(command: &BuiltCommand) -> JobOutcome {
    JobOutcome {
        index: command.index,
        command_line: command.to_string(),
        state: JobState::Cancelled,
        exit_code: None,
        stdout: Vec::new(),
        stderr: Vec::new(),
        error: None,
        duration: Duration::ZERO,
    }
}

/// Spawn and reap one job's process, honoring the cancellation flag
pub(super) fn run_one(
    command: &BuiltCommand,
    cancel: &AtomicBool,
    working_dir: Option<&Path>,
) -> JobOutcome {
    let started = Instant::now();
    let mut outcome = JobOutcome {
        index: command.index,
        command_line: command.to_string(),
        state: JobState::Running,
        exit_code: None,
        stdout: Vec::new(),
        stderr: Vec::new(),
        error: None,
        duration: Duration::ZERO,
    };

    let mut process = Command::new(&command.program);
    process
        .args(&command.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = working_dir {
        process.current_dir(dir);
    }

    let mut child = match process.spawn() {
        Ok(child) => child,
        Err(e) => {
            tracing::debug!(job = command.index, "spawn failed: {e}");
            outcome.state = JobState::Failed;
            outcome.error = Some(format!("failed to spawn '{}': {e}", command.program));
            outcome.duration = started.elapsed();
            return outcome;
        }
    };

    let stdout_reader = child.stdout.take().map(drain_pipe);
    let stderr_reader = child.stderr.take().map(drain_pipe);

    let mut killed = false;
    let status = loop {
        if !killed && cancel.load(Ordering::SeqCst) {
            // Best effort; the wait below reaps it either way.
            let _ = child.kill();
            killed = true;
        }
        match child.try_wait() {
            Ok(Some(status)) => break Some(status),
            Ok(None) => std::thread::sleep(EXIT_POLL_INTERVAL),
            Err(e) => {
                outcome.error = Some(format!("wait failed: {e}"));
                let _ = child.kill();
                let _ = child.wait();
                break None;
            }
        }
    };

    if let Some(reader) = stdout_reader {
        outcome.stdout = reader.join().unwrap_or_default();
    }
    if let Some(reader) = stderr_reader {
        outcome.stderr = reader.join().unwrap_or_default();
    }

    outcome.duration = started.elapsed();
    outcome.exit_code = status.and_then(|s| s.code());
    outcome.state = if killed {
        JobState::Cancelled
    } else {
        match status {
            Some(status) if status.success() => JobState::Succeeded,
            _ => JobState::Failed,
        }
    };
    outcome
}

fn drain_pipe<R: Read + Send + 'static>(mut pipe: R) -> std::thread::JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}
