//! Command template parsing and substitution
//!
//! The command template is everything on the command line before the first
//! `:::` separator. Each word is parsed once into a list of literal and
//! placeholder segments; building a concrete command for a job is then a
//! single pass over those segments, no string scanning at dispatch time.
//!
//! Placeholder forms: `{N}` for the N-th tuple element (1-based) and `{}` as
//! shorthand for `{1}`. A template without any placeholder gets the whole
//! tuple appended as trailing arguments, xargs-style.

use crate::error::EngineError;
use crate::expand::JobSpec;
use std::fmt;

/// One piece of a template word
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// 0-based tuple slot (already converted from the 1-based surface form)
    Placeholder(usize),
}

/// A template word: literal text interleaved with placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    segments: Vec<Segment>,
}

impl Token {
    fn parse(word: &str) -> Result<Self, EngineError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = word;

        while let Some(open) = rest.find('{') {
            let (before, after_open) = rest.split_at(open);
            literal.push_str(before);
            match after_open[1..].find('}') {
                None => {
                    // No closing brace in this word; the rest is literal.
                    literal.push_str(after_open);
                    rest = "";
                    break;
                }
                Some(close) => {
                    let body = &after_open[1..1 + close];
                    let slot = parse_placeholder(body)?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(slot));
                    rest = &after_open[close + 2..];
                }
            }
        }
        literal.push_str(rest);
        if !literal.is_empty() || segments.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Self { segments })
    }

    fn max_slot(&self) -> Option<usize> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Placeholder(i) => Some(*i),
                Segment::Literal(_) => None,
            })
            .max()
    }

    fn has_placeholder(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Placeholder(_)))
    }

    fn render(&self, spec: &JobSpec) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                // Range was checked at template validation time.
                Segment::Placeholder(slot) => out.push_str(&spec.values[*slot]),
            }
        }
        out
    }
}

/// `{}` ↦ slot 0, `{N}` ↦ slot N-1, anything else is an error
fn parse_placeholder(body: &str) -> Result<usize, EngineError> {
    if body.is_empty() {
        return Ok(0);
    }
    match body.parse::<usize>() {
        Ok(0) | Err(_) => Err(EngineError::UnknownPlaceholder {
            token: body.to_string(),
        }),
        Ok(n) => Ok(n - 1),
    }
}

/// A parsed command template: program word plus argument words
#[derive(Debug, Clone)]
pub struct CommandTemplate {
    program: Token,
    args: Vec<Token>,
}

impl CommandTemplate {
    /// Parse the template words. The first word is the program.
    ///
    /// Fails with [`EngineError::UnknownPlaceholder`] on a malformed `{...}`
    /// token; an empty word list is a caller bug surfaced as such.
    pub fn parse(words: &[String]) -> Result<Self, EngineError> {
        let (program, args) = words.split_first().ok_or_else(|| {
            EngineError::UnknownPlaceholder {
                token: "<empty template>".to_string(),
            }
        })?;
        Ok(Self {
            program: Token::parse(program)?,
            args: args
                .iter()
                .map(|w| Token::parse(w))
                .collect::<Result<_, _>>()?,
        })
    }

    /// True if any word references a tuple position
    pub fn has_placeholders(&self) -> bool {
        self.program.has_placeholder() || self.args.iter().any(Token::has_placeholder)
    }

    /// The program word, if it contains no placeholder (used for preflight
    /// lookups before dispatch)
    pub fn static_program(&self) -> Option<&str> {
        match self.program.segments.as_slice() {
            [Segment::Literal(text)] => Some(text),
            _ => None,
        }
    }

    /// Check every placeholder against the tuple arity, before any job is
    /// built or dispatched.
    pub fn validate(&self, arity: usize) -> Result<(), EngineError> {
        let max = std::iter::once(&self.program)
            .chain(&self.args)
            .filter_map(Token::max_slot)
            .max();
        match max {
            Some(slot) if slot >= arity => Err(EngineError::PlaceholderOutOfRange {
                index: slot + 1,
                arity,
            }),
            _ => Ok(()),
        }
    }

    /// Substitute a job's tuple into the template.
    ///
    /// Pure function of (template, spec): building twice yields identical
    /// commands. Call [`validate`](Self::validate) first; slots are not
    /// re-checked here.
    pub fn build(&self, spec: &JobSpec) -> BuiltCommand {
        let mut args: Vec<String> = self.args.iter().map(|t| t.render(spec)).collect();
        if !self.has_placeholders() {
            args.extend(spec.values.iter().cloned());
        }
        BuiltCommand {
            index: spec.index,
            program: self.program.render(spec),
            args,
        }
    }
}

/// A fully substituted, executable command line for one job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltCommand {
    /// Job index, carried through from expansion order
    pub index: usize,
    pub program: String,
    pub args: Vec<String>,
}

impl fmt::Display for BuiltCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(values: &[&str]) -> JobSpec {
        JobSpec {
            index: 0,
            values: values.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn template(words: &[&str]) -> CommandTemplate {
        let words: Vec<String> = words.iter().map(|s| s.to_string()).collect();
        CommandTemplate::parse(&words).unwrap()
    }

    #[test]
    fn positional_placeholders_swap_arguments() {
        let t = template(&["cmd", "{2}", "{1}"]);
        t.validate(2).unwrap();
        let built = t.build(&spec(&["A", "1"]));
        assert_eq!(built.program, "cmd");
        assert_eq!(built.args, vec!["1", "A"]);
        assert_eq!(built.to_string(), "cmd 1 A");
    }

    #[test]
    fn build_is_idempotent() {
        let t = template(&["echo", "{1}-{2}"]);
        let s = spec(&["x", "y"]);
        assert_eq!(t.build(&s), t.build(&s));
    }

    #[test]
    fn bare_braces_mean_first_slot() {
        let t = template(&["echo", "{}"]);
        t.validate(1).unwrap();
        assert_eq!(t.build(&spec(&["hello"])).args, vec!["hello"]);
    }

    #[test]
    fn no_placeholder_appends_tuple() {
        let t = template(&["gzip", "-9"]);
        assert!(!t.has_placeholders());
        let built = t.build(&spec(&["a.log", "b.log"]));
        assert_eq!(built.args, vec!["-9", "a.log", "b.log"]);
    }

    #[test]
    fn placeholder_embedded_in_literal_text() {
        let t = template(&["cp", "{1}", "backup/{1}.bak"]);
        let built = t.build(&spec(&["notes.txt"]));
        assert_eq!(built.args, vec!["notes.txt", "backup/notes.txt.bak"]);
    }

    #[test]
    fn non_numeric_placeholder_is_unknown() {
        let words = vec!["cmd".to_string(), "{name}".to_string()];
        let err = CommandTemplate::parse(&words).unwrap_err();
        assert!(matches!(err, EngineError::UnknownPlaceholder { token } if token == "name"));
    }

    #[test]
    fn zero_is_not_a_valid_position() {
        let words = vec!["cmd".to_string(), "{0}".to_string()];
        let err = CommandTemplate::parse(&words).unwrap_err();
        assert!(matches!(err, EngineError::UnknownPlaceholder { .. }));
    }

    #[test]
    fn out_of_range_placeholder_fails_validation() {
        let t = template(&["cmd", "{3}"]);
        let err = t.validate(2).unwrap_err();
        assert!(
            matches!(err, EngineError::PlaceholderOutOfRange { index: 3, arity: 2 })
        );
    }

    #[test]
    fn unclosed_brace_stays_literal() {
        let t = template(&["awk", "{print"]);
        assert!(!t.has_placeholders());
        let built = t.build(&spec(&["f"]));
        assert_eq!(built.args, vec!["{print", "f"]);
    }

    #[test]
    fn placeholder_in_program_word() {
        let t = template(&["{1}", "--version"]);
        assert!(t.static_program().is_none());
        let built = t.build(&spec(&["rustc"]));
        assert_eq!(built.program, "rustc");
    }

    #[test]
    fn static_program_is_exposed_for_preflight() {
        let t = template(&["echo", "{}"]);
        assert_eq!(t.static_program(), Some("echo"));
    }
}
