//! Command-line interface for fanout
//!
//! Everything before the first `:::`/`::::` separator is the command
//! template; each `:::` group supplies literal arguments and each `::::`
//! group names argument files. With no source at all, records are read from
//! piped stdin.
//!
//! ```text
//! fanout -j 4 gzip -9 ::: *.log
//! fanout --link cp {1} {2} ::: a b ::: x y
//! ```

use anyhow::Result;
use clap::Parser;

mod output;
mod run;

pub use output::Output;

/// Run commands in parallel over expanded argument lists
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Maximum concurrent jobs (0 = one per CPU)
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Pair argument sources positionally instead of taking their product
    #[arg(long)]
    pub link: bool,

    /// Emit job output in input order instead of completion order
    #[arg(short, long)]
    pub keep_order: bool,

    /// Read argument records from a file, one per line (repeatable)
    #[arg(short = 'a', long = "arg-file", value_name = "FILE")]
    pub arg_files: Vec<std::path::PathBuf>,

    /// Print every built command without running anything
    #[arg(long)]
    pub dry_run: bool,

    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    pub config: Option<String>,

    /// Echo each command as it is dispatched
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress the run summary
    #[arg(short, long)]
    pub quiet: bool,

    /// Command template, then argument sources: TEMPLATE... [::: ARG...] [:::: FILE...]
    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "TEMPLATE"
    )]
    pub command: Vec<String>,
}

impl Cli {
    /// Execute the CLI command
    pub async fn run(self) -> Result<()> {
        let output = Output::new(self.verbose, self.quiet);
        run::execute(self, &output).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_separators_as_plain_words() {
        let cli = Cli::parse_from(["fanout", "echo", "{}", ":::", "a", "b"]);
        assert_eq!(cli.command, vec!["echo", "{}", ":::", "a", "b"]);
    }

    #[test]
    fn template_may_contain_hyphen_words() {
        let cli = Cli::parse_from(["fanout", "-j", "2", "gzip", "-9", ":::", "x.log"]);
        assert_eq!(cli.jobs, Some(2));
        assert_eq!(cli.command[1], "-9");
    }
}
