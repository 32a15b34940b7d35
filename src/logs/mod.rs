//! Parsers for the engine's log files.
//!
//! JSON Lines is the schema every parser understands first. The bracketed
//! `[timestamp] [KEY:value] text` format is handled by [`structured`] as a
//! compatibility adapter for older engine builds.

mod reader;
mod rebloom;
mod reflection;
mod sigil;
mod structured;
mod thought;

use std::path::PathBuf;

use thiserror::Error;

use crate::error::FeedError;

pub use reader::LogReader;
pub use rebloom::{RebloomEvent, RebloomParser};
pub use reflection::{ReflectionEntry, ReflectionParser, RiskLevel};
pub use sigil::{SigilEmission, SigilParser};
pub use thought::{ThoughtEntry, ThoughtParser};

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("blank line")]
    Blank,
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("unrecognised line format")]
    Unrecognised,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ParseOutcome<T> {
    Parsed(T),
    Skipped(SkipReason),
}

pub trait LineParser {
    type Entry;

    fn parse_line(&self, line: &str) -> ParseOutcome<Self::Entry>;
}

#[derive(Clone, Debug)]
pub struct ParsedLog<T> {
    pub entries: Vec<T>,
    /// Non-blank lines the parser rejected.
    pub skipped: usize,
}

pub fn parse_lines<P, I, S>(parser: &P, lines: I) -> ParsedLog<P::Entry>
where
    P: LineParser,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut entries = Vec::new();
    let mut skipped = 0usize;
    for line in lines {
        match parser.parse_line(line.as_ref()) {
            ParseOutcome::Parsed(entry) => entries.push(entry),
            ParseOutcome::Skipped(SkipReason::Blank) => {}
            ParseOutcome::Skipped(_) => skipped += 1,
        }
    }
    ParsedLog { entries, skipped }
}

#[derive(Clone, Debug, Default)]
pub struct LogPaths {
    pub reflection: Option<PathBuf>,
    pub sigil: Option<PathBuf>,
    pub rebloom: Option<PathBuf>,
    pub thought: Option<PathBuf>,
}

impl LogPaths {
    pub fn is_empty(&self) -> bool {
        self.reflection.is_none()
            && self.sigil.is_none()
            && self.rebloom.is_none()
            && self.thought.is_none()
    }
}

/// Parsed tails of every configured log, newest last.
#[derive(Clone, Debug, Default)]
pub struct LogDigest {
    pub reflections: Vec<ReflectionEntry>,
    pub sigils: Vec<SigilEmission>,
    pub reblooms: Vec<RebloomEvent>,
    pub thoughts: Vec<ThoughtEntry>,
    pub skipped: usize,
}

pub fn read_digest(
    reader: &LogReader,
    paths: &LogPaths,
    max_lines: usize,
) -> Result<LogDigest, FeedError> {
    let mut digest = LogDigest::default();

    if let Some(path) = &paths.reflection {
        let parsed = parse_lines(&ReflectionParser, reader.read_tail(path, max_lines)?);
        digest.reflections = parsed.entries;
        digest.skipped += parsed.skipped;
    }

    if let Some(path) = &paths.sigil {
        let parsed = parse_lines(&SigilParser, reader.read_tail(path, max_lines)?);
        digest.sigils = parsed.entries;
        digest.skipped += parsed.skipped;
    }

    if let Some(path) = &paths.rebloom {
        let parsed = parse_lines(&RebloomParser, reader.read_tail(path, max_lines)?);
        digest.reblooms = parsed.entries;
        digest.skipped += parsed.skipped;
    }

    if let Some(path) = &paths.thought {
        let parsed = parse_lines(&ThoughtParser, reader.read_tail(path, max_lines)?);
        digest.thoughts = parsed.entries;
        digest.skipped += parsed.skipped;
    }

    Ok(digest)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn parse_lines_ignores_blank_lines_in_skip_count() {
        let parsed = parse_lines(
            &SigilParser,
            ["", "[t] [SIGIL:A]", "garbage", "   ", r#"{"name": "B"}"#],
        );
        assert_eq!(parsed.entries.len(), 2);
        assert_eq!(parsed.skipped, 1);
    }

    #[test]
    fn digest_reads_all_configured_logs() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::create_dir_all(dir.path().join("logs")).expect("logs dir");
        fs::write(
            dir.path().join("logs/reflection.log"),
            "2025-01-14T22:31:30 | REFLECTION: Memory cascade triggered: drift entropy critical\n",
        )
        .expect("write reflection log");
        fs::write(
            dir.path().join("logs/rebloom_log.jsonl"),
            "{\"source_id\": \"a\", \"rebloom_id\": \"b\"}\nnot a rebloom\n",
        )
        .expect("write rebloom log");
        fs::write(
            dir.path().join("logs/thought_trace.log"),
            "[t1] [FORECAST:surge] watching heat\n{\"thought\": \"settling\", \"tick\": 9}\n",
        )
        .expect("write thought log");

        let paths = LogPaths {
            reflection: Some(PathBuf::from("logs/reflection.log")),
            sigil: Some(PathBuf::from("logs/sigil_emission.log")),
            rebloom: Some(PathBuf::from("logs/rebloom_log.jsonl")),
            thought: Some(PathBuf::from("logs/thought_trace.log")),
        };
        assert!(!paths.is_empty());
        assert!(LogPaths::default().is_empty());
        let digest = read_digest(&LogReader::new(dir.path()), &paths, 100).expect("digest");
        assert_eq!(digest.reflections.len(), 1);
        assert_eq!(digest.reflections[0].risk_level, RiskLevel::Critical);
        assert!(digest.sigils.is_empty());
        assert_eq!(digest.reblooms.len(), 1);
        assert_eq!(digest.thoughts.len(), 2);
        assert_eq!(digest.thoughts[0].forecast.as_deref(), Some("surge"));
        assert_eq!(digest.thoughts[1].tick, Some(9));
        assert_eq!(digest.skipped, 1);
    }
}
