//! Bounded-concurrency job scheduling
//!
//! The scheduler owns the only mutable shared state of a run: the pending
//! queue (a bounded crossbeam channel) and the running-slot count. Worker
//! threads pull built commands off the queue in expansion order and run one
//! OS process each; a coordinator on the calling thread collects outcomes and
//! feeds them to the collator. At most `limit` processes are ever alive at
//! once because there are exactly `limit` workers.
//!
//! Per-job state machine: `Pending → Dispatched → Running → {Succeeded,
//! Failed, Cancelled}`. Terminal states are final; nothing is retried.

mod worker;

use crate::collate::Collator;
use crate::template::BuiltCommand;
use anyhow::Result;
use crossbeam::channel::{bounded, Receiver, Sender};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Lifecycle of a single job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Built, waiting in the queue
    Pending,
    /// Picked up by a worker, process not yet spawned
    Dispatched,
    /// Process alive
    Running,
    /// Process exited 0
    Succeeded,
    /// Process exited nonzero, or could not be spawned
    Failed,
    /// Skipped or killed because the run was cancelled
    Cancelled,
}

/// Terminal record for one job
#[derive(Debug, Clone)]
pub struct JobOutcome {
    /// Index from expansion order; stable however jobs finish
    pub index: usize,
    /// The command line that ran, for reporting
    pub command_line: String,
    pub state: JobState,
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Spawn or wait error, when the process never ran cleanly
    pub error: Option<String>,
    pub duration: Duration,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        self.state == JobState::Succeeded
    }
}

/// Aggregate counters for a finished batch
#[derive(Debug, Default, Clone)]
pub struct BatchStats {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
    /// High-water mark of simultaneously running processes
    pub peak_running: usize,
    pub wall_time: Duration,
}

impl BatchStats {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0 && self.cancelled == 0
    }
}

/// Called with each command just before its process is spawned
pub type DispatchHook = Arc<dyn Fn(&BuiltCommand) + Send + Sync>;

/// Coordinates a bounded pool of job-running workers
pub struct Scheduler {
    limit: usize,
    working_dir: Option<PathBuf>,
    cancel: Arc<AtomicBool>,
    on_dispatch: Option<DispatchHook>,
}

impl Scheduler {
    /// `limit` of 0 means one slot per available CPU
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            working_dir: None,
            cancel: Arc::new(AtomicBool::new(false)),
            on_dispatch: None,
        }
    }

    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = Some(dir);
        self
    }

    /// Install a cancellation flag shared with the caller (e.g. a ctrl-c
    /// handler). Once set, no further process is spawned and running
    /// processes are killed; every job still reports an outcome.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_dispatch_hook(mut self, hook: DispatchHook) -> Self {
        self.on_dispatch = Some(hook);
        self
    }

    /// Worker slots for a batch: the configured limit (or CPU count when 0),
    /// never more than there are jobs.
    pub fn worker_slots(&self, job_count: usize) -> usize {
        let limit = if self.limit > 0 {
            self.limit
        } else {
            num_cpus::get()
        };
        limit.min(job_count).max(1)
    }

    /// Run the whole batch, feeding each outcome to the collator, and return
    /// the aggregate stats once every job has reached a terminal state.
    pub fn run<O: Write, E: Write>(
        &self,
        commands: Vec<BuiltCommand>,
        collator: &mut Collator<O, E>,
    ) -> Result<BatchStats> {
        let total = commands.len();
        if total == 0 {
            return Ok(BatchStats::default());
        }

        let started = std::time::Instant::now();
        let slots = self.worker_slots(total);
        tracing::debug!(jobs = total, slots, "starting batch");

        let (work_tx, work_rx): (Sender<BuiltCommand>, Receiver<BuiltCommand>) =
            bounded(slots * 2);
        let (result_tx, result_rx): (Sender<JobOutcome>, Receiver<JobOutcome>) =
            bounded(slots * 4);

        let running = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);

        let mut stats = crossbeam::thread::scope(|s| {
            for _ in 0..slots {
                let work_rx = work_rx.clone();
                let result_tx = result_tx.clone();
                let running = &running;
                let peak = &peak;
                let cancel = &*self.cancel;
                let on_dispatch = self.on_dispatch.clone();
                let working_dir = self.working_dir.as_deref();

                s.spawn(move |_| {
                    while let Ok(command) = work_rx.recv() {
                        // Dispatched. Cancellation short-circuits the job to
                        // a terminal state without spawning anything.
                        let outcome = if cancel.load(Ordering::SeqCst) {
                            worker::cancelled_outcome(&command)
                        } else {
                            if let Some(hook) = &on_dispatch {
                                hook(&command);
                            }
                            let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                            peak.fetch_max(now, Ordering::SeqCst);
                            let outcome = worker::run_one(&command, cancel, working_dir);
                            running.fetch_sub(1, Ordering::SeqCst);
                            outcome
                        };
                        if result_tx.send(outcome).is_err() {
                            break; // Coordinator gone
                        }
                    }
                });
            }

            // Producer: hand out pending commands in expansion order. Jobs
            // queued after cancellation still flow through so the outcome
            // count stays exact; workers mark them Cancelled.
            let work_tx_clone = work_tx.clone();
            s.spawn(move |_| {
                for command in commands {
                    if work_tx_clone.send(command).is_err() {
                        break;
                    }
                }
                drop(work_tx_clone);
            });

            drop(work_tx);
            drop(result_tx);

            // Coordinator: collect exactly one outcome per job, in
            // completion order, on the calling thread.
            let mut stats = BatchStats {
                total,
                ..BatchStats::default()
            };
            let mut received = 0;
            while let Ok(outcome) = result_rx.recv() {
                match outcome.state {
                    JobState::Succeeded => stats.succeeded += 1,
                    JobState::Cancelled => stats.cancelled += 1,
                    _ => stats.failed += 1,
                }
                if let Err(e) = collator.push(&outcome) {
                    tracing::warn!(job = outcome.index, "emit failed: {e}");
                }
                received += 1;
                if received >= total {
                    break;
                }
            }
            stats
        })
        .map_err(|_| anyhow::anyhow!("worker thread panicked during batch execution"))?;

        collator.finish()?;
        stats.peak_running = peak.load(Ordering::SeqCst);
        stats.wall_time = started.elapsed();
        tracing::debug!(
            succeeded = stats.succeeded,
            failed = stats.failed,
            cancelled = stats.cancelled,
            "batch finished"
        );
        Ok(stats)
    }
}
