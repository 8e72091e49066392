//! # Fanout - Parallel Command Dispatch
//!
//! Runs a command template once per combination of argument records, under a
//! bounded concurrency limit, with per-job output kept in contiguous blocks.
//!
//! ## Pipeline
//!
//! - **source**: read `:::` word lists, `::::`/`--arg-file` files, or stdin
//! - **expand**: cartesian or linked combination into ordered job tuples
//! - **template**: placeholder substitution into concrete command lines
//! - **scheduler**: bounded worker pool, one OS process per job
//! - **collate**: atomic per-job output blocks, completion or input order
//!
//! ## Quick Start
//!
//! ```bash
//! # Compress four logs, two at a time
//! fanout -j 2 gzip -9 ::: a.log b.log c.log d.log
//!
//! # Pair sources positionally
//! fanout --link cp {1} {2} ::: old new ::: old.bak new.bak
//! ```

pub mod cli;
pub mod collate;
pub mod config;
pub mod error;
pub mod expand;
pub mod scheduler;
pub mod source;
pub mod template;

pub use cli::{Cli, Output};
pub use config::FanoutConfig;
pub use error::EngineError;

/// Result type alias for fanout operations
pub type Result<T> = anyhow::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
