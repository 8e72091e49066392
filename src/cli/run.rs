//! The run pipeline: words → sources → expansion → commands → scheduler
//!
//! All validation happens before the first dispatch; a malformed batch never
//! half-runs. Per-job failures are reported through the summary and the exit
//! code, never by aborting sibling jobs.

use super::{Cli, Output};
use crate::collate::{Collator, OrderPolicy};
use crate::config::FanoutConfig;
use crate::expand::{CombineMode, Expansion};
use crate::scheduler::Scheduler;
use crate::source::{read_sources, ArgSource};
use crate::template::{BuiltCommand, CommandTemplate};
use anyhow::{bail, Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub async fn execute(cli: Cli, output: &Output) -> Result<()> {
    let config = FanoutConfig::load(cli.config.as_deref())?;
    let jobs = cli.jobs.unwrap_or(config.jobs);
    let keep_order = cli.keep_order || config.keep_order;

    let (template_words, mut sources) = split_command_line(&cli.command);
    for path in &cli.arg_files {
        sources.push(ArgSource::File(path.clone()));
    }
    if sources.is_empty() {
        if atty::is(atty::Stream::Stdin) {
            bail!("no argument source given: add ':::', '::::' or --arg-file, or pipe records on stdin");
        }
        sources.push(ArgSource::Stdin);
    }
    if template_words.is_empty() {
        bail!("empty command template before ':::'");
    }

    let sequences = read_sources(&sources)?;
    let mode = if cli.link {
        CombineMode::Linked
    } else {
        CombineMode::Cartesian
    };
    let expansion = Expansion::new(mode, sequences)?;

    let template = CommandTemplate::parse(&template_words)?;
    template.validate(expansion.arity())?;

    // Every job spec becomes exactly one command, all built up front.
    let commands: Vec<BuiltCommand> = expansion.iter().map(|spec| template.build(&spec)).collect();
    output.verbose(&format!("expanded {} job(s)", commands.len()));

    if cli.dry_run {
        for command in &commands {
            println!("{command}");
        }
        return Ok(());
    }
    if commands.is_empty() {
        output.info("nothing to run: argument expansion produced 0 jobs");
        return Ok(());
    }

    if let Some(program) = template.static_program() {
        which::which(program)
            .with_context(|| format!("command '{program}' not found in PATH"))?;
    }

    let cancel = Arc::new(AtomicBool::new(false));
    let signal_flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_flag.store(true, Ordering::SeqCst);
        }
    });

    let mut scheduler = Scheduler::new(jobs).with_cancel_flag(cancel.clone());
    if output.is_verbose() {
        scheduler = scheduler.with_dispatch_hook(Arc::new(|command: &BuiltCommand| {
            Output::new(true, false).command_echo(&command.to_string());
        }));
    }

    let policy = if keep_order {
        OrderPolicy::Index
    } else {
        OrderPolicy::Completion
    };

    let stats = tokio::task::spawn_blocking(move || {
        // Unlocked handles: the coordinator is the only writer of job output,
        // and a persistent stderr lock would deadlock the dispatch echo
        // running on worker threads.
        let mut collator = Collator::new(policy, std::io::stdout(), std::io::stderr());
        scheduler.run(commands, &mut collator)
    })
    .await
    .context("scheduler task panicked")??;

    if cancel.load(Ordering::SeqCst) {
        output.warning(&format!(
            "cancelled: {} job(s) interrupted, {} completed",
            stats.cancelled, stats.succeeded
        ));
    }
    if stats.all_succeeded() {
        output.success(&format!(
            "{} job(s) completed in {:.2?}",
            stats.succeeded, stats.wall_time
        ));
        Ok(())
    } else {
        bail!(
            "{} of {} job(s) did not succeed ({} failed, {} cancelled)",
            stats.failed + stats.cancelled,
            stats.total,
            stats.failed,
            stats.cancelled
        )
    }
}

/// What the words between two separators belong to
enum Group {
    Template,
    Literal(Vec<String>),
    Files,
}

/// Split the trailing words into the template and its argument sources.
///
/// `:::` opens a literal group, which becomes one source. `::::` opens a
/// group of file names, each of which becomes its own source. Groups may
/// alternate and repeat.
fn split_command_line(words: &[String]) -> (Vec<String>, Vec<ArgSource>) {
    let mut template = Vec::new();
    let mut sources = Vec::new();
    let mut group = Group::Template;

    for word in words {
        match word.as_str() {
            ":::" => {
                flush_group(&mut group, &mut sources);
                group = Group::Literal(Vec::new());
            }
            "::::" => {
                flush_group(&mut group, &mut sources);
                group = Group::Files;
            }
            _ => match &mut group {
                Group::Template => template.push(word.clone()),
                Group::Literal(items) => items.push(word.clone()),
                Group::Files => sources.push(ArgSource::File(word.into())),
            },
        }
    }
    flush_group(&mut group, &mut sources);
    (template, sources)
}

fn flush_group(group: &mut Group, sources: &mut Vec<ArgSource>) {
    if let Group::Literal(items) = std::mem::replace(group, Group::Template) {
        sources.push(ArgSource::Literal(items));
    }
}
