//! Error taxonomy for the dispatch pipeline
//!
//! Everything in this enum is a pre-dispatch validation failure: it aborts the
//! whole batch before any process is spawned. Per-job failures (nonzero exit,
//! spawn error, cancellation) are not errors here; they are recorded in the
//! job's outcome and surfaced through the aggregate exit code.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal pipeline errors, all raised before the first job is dispatched
#[derive(Debug, Error)]
pub enum EngineError {
    /// An argument source could not be read
    #[error("cannot read argument source '{}': {source}", .path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Linked mode requires every source to have the same length
    #[error(
        "linked mode needs equal-length sources: source {source_index} has {actual} records, expected {expected}"
    )]
    LengthMismatch {
        source_index: usize,
        expected: usize,
        actual: usize,
    },

    /// A `{...}` token in the template is not a recognized placeholder
    #[error("unknown placeholder '{{{token}}}' in command template")]
    UnknownPlaceholder { token: String },

    /// A placeholder references a tuple position that does not exist
    #[error("placeholder {{{index}}} is out of range: job tuples have {arity} element(s)")]
    PlaceholderOutOfRange { index: usize, arity: usize },
}
