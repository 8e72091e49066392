//! Combination expansion
//!
//! Turns N argument sequences into the ordered list of job tuples to run.
//! Cartesian mode produces every combination in odometer order (last source
//! varies fastest); linked mode pairs the sources positionally and requires
//! equal lengths. Expansion order defines the job index, which downstream
//! components never reorder.

use crate::error::EngineError;
use crate::source::ArgumentSequence;

/// How multiple argument sources combine into job tuples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CombineMode {
    /// Every combination, nested-loop order, first source outermost
    #[default]
    Cartesian,
    /// Element i of every source forms tuple i; lengths must match
    Linked,
}

/// One job to run: the selected tuple plus its position in expansion order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    /// 0-based, monotonically increasing in expansion order
    pub index: usize,
    /// One element per argument source; arity equals the source count
    pub values: Vec<String>,
}

/// A validated expansion over a set of argument sequences.
///
/// Construction performs all length validation, so a [`JobSpec`] iterator
/// obtained from this can never fail. The iterator is restartable: `iter()`
/// always starts from job 0.
#[derive(Debug)]
pub struct Expansion {
    mode: CombineMode,
    sequences: Vec<ArgumentSequence>,
}

impl Expansion {
    pub fn new(mode: CombineMode, sequences: Vec<ArgumentSequence>) -> Result<Self, EngineError> {
        if mode == CombineMode::Linked {
            if let Some(first) = sequences.first() {
                let expected = first.len();
                for (i, seq) in sequences.iter().enumerate().skip(1) {
                    if seq.len() != expected {
                        return Err(EngineError::LengthMismatch {
                            source_index: i,
                            expected,
                            actual: seq.len(),
                        });
                    }
                }
            }
        }
        Ok(Self { mode, sequences })
    }

    /// Number of argument sources, and therefore the arity of every tuple
    pub fn arity(&self) -> usize {
        self.sequences.len()
    }

    /// Total number of jobs this expansion produces
    pub fn job_count(&self) -> usize {
        if self.sequences.is_empty() {
            return 0;
        }
        match self.mode {
            CombineMode::Cartesian => self.sequences.iter().map(ArgumentSequence::len).product(),
            CombineMode::Linked => self.sequences[0].len(),
        }
    }

    pub fn iter(&self) -> JobIter<'_> {
        JobIter {
            expansion: self,
            next_index: 0,
        }
    }
}

/// Lazy iterator over an expansion's job specs, in expansion order
pub struct JobIter<'a> {
    expansion: &'a Expansion,
    next_index: usize,
}

impl Iterator for JobIter<'_> {
    type Item = JobSpec;

    fn next(&mut self) -> Option<JobSpec> {
        let exp = self.expansion;
        if self.next_index >= exp.job_count() {
            return None;
        }
        let index = self.next_index;
        self.next_index += 1;

        let values = match exp.mode {
            CombineMode::Linked => exp
                .sequences
                .iter()
                .map(|seq| seq.get(index).unwrap_or_default().to_string())
                .collect(),
            CombineMode::Cartesian => {
                // Decode the flat index as mixed-radix digits, last source
                // varying fastest.
                let mut rem = index;
                let mut values = vec![String::new(); exp.sequences.len()];
                for (slot, seq) in exp.sequences.iter().enumerate().rev() {
                    let pick = rem % seq.len();
                    rem /= seq.len();
                    values[slot] = seq.get(pick).unwrap_or_default().to_string();
                }
                values
            }
        };

        Some(JobSpec { index, values })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.expansion.job_count().saturating_sub(self.next_index);
        (left, Some(left))
    }
}

impl ExactSizeIterator for JobIter<'_> {}
