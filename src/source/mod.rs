//! Argument source reading
//!
//! A run takes one or more argument sources: literal word lists given after
//! `:::`, files named after `::::` or `--arg-file`, or piped standard input.
//! Each source is read fully up front into an [`ArgumentSequence`] before
//! expansion starts; linked mode needs total lengths, so streaming sources
//! are out of scope.

use crate::error::EngineError;
use std::io::{BufRead, Read};
use std::path::PathBuf;

/// Descriptor for a single argument source, as parsed from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgSource {
    /// Words given inline after a `:::` separator
    Literal(Vec<String>),
    /// One record per line of a file (`::::` or `--arg-file`)
    File(PathBuf),
    /// One record per line of piped standard input
    Stdin,
}

/// An ordered, fully materialized sequence of argument records.
///
/// Immutable once read; the expander owns these for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentSequence {
    records: Vec<String>,
}

impl ArgumentSequence {
    pub fn new(records: Vec<String>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&str> {
        self.records.get(i).map(String::as_str)
    }

    pub fn records(&self) -> &[String] {
        &self.records
    }
}

/// Read every source into memory, in the order given.
///
/// Fails with [`EngineError::SourceUnavailable`] on the first unreadable
/// source; nothing is dispatched in that case.
pub fn read_sources(sources: &[ArgSource]) -> Result<Vec<ArgumentSequence>, EngineError> {
    sources.iter().map(read_source).collect()
}

fn read_source(source: &ArgSource) -> Result<ArgumentSequence, EngineError> {
    match source {
        ArgSource::Literal(words) => Ok(ArgumentSequence::new(words.clone())),
        ArgSource::File(path) => {
            let file = std::fs::File::open(path).map_err(|e| EngineError::SourceUnavailable {
                path: path.clone(),
                source: e,
            })?;
            read_lines(std::io::BufReader::new(file)).map_err(|e| EngineError::SourceUnavailable {
                path: path.clone(),
                source: e,
            })
        }
        ArgSource::Stdin => {
            let stdin = std::io::stdin();
            read_lines(stdin.lock()).map_err(|e| EngineError::SourceUnavailable {
                path: PathBuf::from("<stdin>"),
                source: e,
            })
        }
    }
}

/// Split a reader into records, one per line, trimming the trailing
/// `\n` / `\r\n`. Interior whitespace and empty lines are kept as-is.
fn read_lines<R: Read + BufRead>(reader: R) -> std::io::Result<ArgumentSequence> {
    let mut records = Vec::new();
    for line in reader.lines() {
        records.push(line?);
    }
    Ok(ArgumentSequence::new(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn literal_source_passes_words_through() {
        let seqs = read_sources(&[ArgSource::Literal(vec!["a".into(), "b c".into()])]).unwrap();
        assert_eq!(seqs.len(), 1);
        assert_eq!(seqs[0].records(), &["a".to_string(), "b c".to_string()]);
    }

    #[test]
    fn file_source_trims_trailing_newlines() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "one\r\ntwo\nthree").unwrap();

        let seqs = read_sources(&[ArgSource::File(file.path().to_path_buf())]).unwrap();
        assert_eq!(
            seqs[0].records(),
            &["one".to_string(), "two".to_string(), "three".to_string()]
        );
    }

    #[test]
    fn empty_lines_are_records_too() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "a\n\nb\n").unwrap();

        let seqs = read_sources(&[ArgSource::File(file.path().to_path_buf())]).unwrap();
        assert_eq!(seqs[0].len(), 3);
        assert_eq!(seqs[0].get(1), Some(""));
    }

    #[test]
    fn missing_file_is_source_unavailable() {
        let err = read_sources(&[ArgSource::File(PathBuf::from("/no/such/file.txt"))]).unwrap_err();
        assert!(matches!(err, EngineError::SourceUnavailable { .. }));
    }

    #[test]
    fn sources_keep_their_order() {
        let seqs = read_sources(&[
            ArgSource::Literal(vec!["x".into()]),
            ArgSource::Literal(vec!["y".into()]),
        ])
        .unwrap();
        assert_eq!(seqs[0].get(0), Some("x"));
        assert_eq!(seqs[1].get(0), Some("y"));
    }
}
