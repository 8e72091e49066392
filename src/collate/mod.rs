//! Output collation
//!
//! Jobs run concurrently but their captured output must never interleave:
//! each job's stdout is written to the out sink as one contiguous block, then
//! its stderr to the err sink. The default policy emits blocks as jobs
//! finish; `Index` holds early finishers back so blocks appear in job-index
//! order instead.

use crate::scheduler::JobOutcome;
use std::collections::BTreeMap;
use std::io::Write;

/// Order in which finished jobs' output blocks are emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderPolicy {
    /// Emit each block as soon as its job finishes
    #[default]
    Completion,
    /// Buffer and emit strictly by job index (`--keep-order`)
    Index,
}

/// Collects job outcomes and writes their output blocks in policy order
pub struct Collator<O: Write, E: Write> {
    policy: OrderPolicy,
    out: O,
    err: E,
    held: BTreeMap<usize, JobOutcome>,
    next_index: usize,
}

impl<O: Write, E: Write> Collator<O, E> {
    pub fn new(policy: OrderPolicy, out: O, err: E) -> Self {
        Self {
            policy,
            out,
            err,
            held: BTreeMap::new(),
            next_index: 0,
        }
    }

    /// Accept one finished job. Depending on policy this emits its block now,
    /// or holds it until every earlier-indexed job has been emitted.
    pub fn push(&mut self, outcome: &JobOutcome) -> std::io::Result<()> {
        match self.policy {
            OrderPolicy::Completion => self.emit(outcome),
            OrderPolicy::Index => {
                if outcome.index == self.next_index {
                    self.emit(outcome)?;
                    self.next_index += 1;
                    self.flush_ready()
                } else {
                    self.held.insert(outcome.index, outcome.clone());
                    Ok(())
                }
            }
        }
    }

    /// Drain anything still held. Gaps can exist after cancellation; held
    /// blocks are emitted in index order regardless.
    pub fn finish(&mut self) -> std::io::Result<()> {
        let held = std::mem::take(&mut self.held);
        for outcome in held.values() {
            self.emit(outcome)?;
        }
        Ok(())
    }

    fn flush_ready(&mut self) -> std::io::Result<()> {
        while let Some(outcome) = self.held.remove(&self.next_index) {
            self.emit(&outcome)?;
            self.next_index += 1;
        }
        Ok(())
    }

    // One atomic block per job: all stdout bytes, then all stderr bytes.
    fn emit(&mut self, outcome: &JobOutcome) -> std::io::Result<()> {
        if !outcome.stdout.is_empty() {
            self.out.write_all(&outcome.stdout)?;
        }
        if !outcome.stderr.is_empty() {
            self.err.write_all(&outcome.stderr)?;
        }
        self.out.flush()?;
        self.err.flush()
    }
}
