use serde::Deserialize;

use super::structured::StructuredLine;
use super::{LineParser, ParseOutcome, SkipReason};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RebloomEvent {
    pub timestamp: Option<String>,
    /// Parent memory chunk.
    pub source_id: String,
    /// Re-activated chunk.
    pub rebloom_id: String,
    pub method: String,
    pub topic: String,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawRebloom {
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    source_id: Option<String>,
    #[serde(default)]
    rebloom_id: Option<String>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RebloomParser;

impl LineParser for RebloomParser {
    type Entry = RebloomEvent;

    fn parse_line(&self, line: &str) -> ParseOutcome<RebloomEvent> {
        let line = line.trim();
        if line.is_empty() {
            return ParseOutcome::Skipped(SkipReason::Blank);
        }

        if line.starts_with('{') {
            let raw: RawRebloom = match serde_json::from_str(line) {
                Ok(raw) => raw,
                Err(error) => {
                    return ParseOutcome::Skipped(SkipReason::InvalidJson(error.to_string()));
                }
            };
            let Some(source_id) = non_empty(raw.source_id) else {
                return ParseOutcome::Skipped(SkipReason::MissingField("source_id"));
            };
            let Some(rebloom_id) = non_empty(raw.rebloom_id) else {
                return ParseOutcome::Skipped(SkipReason::MissingField("rebloom_id"));
            };
            return ParseOutcome::Parsed(RebloomEvent {
                timestamp: non_empty(raw.timestamp),
                source_id,
                rebloom_id,
                method: non_empty(raw.method).unwrap_or_else(|| "unknown".to_owned()),
                topic: non_empty(raw.topic).unwrap_or_else(|| "unknown".to_owned()),
                reason: non_empty(raw.reason),
            });
        }

        let Some(structured) = StructuredLine::parse(line) else {
            return ParseOutcome::Skipped(SkipReason::Unrecognised);
        };
        let Some(source_id) = structured.first_field(&["SOURCE", "SOURCE_ID"]) else {
            return ParseOutcome::Skipped(SkipReason::MissingField("source_id"));
        };
        let Some(rebloom_id) = structured.first_field(&["REBLOOM", "REBLOOM_ID"]) else {
            return ParseOutcome::Skipped(SkipReason::MissingField("rebloom_id"));
        };

        ParseOutcome::Parsed(RebloomEvent {
            timestamp: structured.timestamp.clone(),
            source_id: source_id.to_owned(),
            rebloom_id: rebloom_id.to_owned(),
            method: structured.field("METHOD").unwrap_or("unknown").to_owned(),
            topic: structured.field("TOPIC").unwrap_or("unknown").to_owned(),
            reason: Some(structured.text.clone()).filter(|text| !text.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_rebloom_line() {
        let line = concat!(
            r#"{"timestamp": "2025-01-14T22:31:30", "source_id": "manual_journal", "#,
            r#""rebloom_id": "chunk_0042", "method": "manual", "topic": "introspection", "#,
            r#""reason": "Manual journal injection: 40 chars"}"#,
        );
        let ParseOutcome::Parsed(event) = RebloomParser.parse_line(line) else {
            panic!("expected parsed rebloom");
        };
        assert_eq!(event.source_id, "manual_journal");
        assert_eq!(event.rebloom_id, "chunk_0042");
        assert_eq!(event.method, "manual");
        assert_eq!(event.topic, "introspection");
        assert_eq!(event.timestamp.as_deref(), Some("2025-01-14T22:31:30"));
    }

    #[test]
    fn bracket_rebloom_line() {
        let line = concat!(
            "[2025-01-14 22:31:30] [SOURCE:chunk_a] [REBLOOM:chunk_b] [METHOD:auto] ",
            "surfaced by drift",
        );
        let ParseOutcome::Parsed(event) = RebloomParser.parse_line(line) else {
            panic!("expected parsed rebloom");
        };
        assert_eq!(event.source_id, "chunk_a");
        assert_eq!(event.rebloom_id, "chunk_b");
        assert_eq!(event.method, "auto");
        assert_eq!(event.topic, "unknown");
        assert_eq!(event.reason.as_deref(), Some("surfaced by drift"));
    }

    #[test]
    fn unmatched_lines_are_skipped() {
        assert_eq!(
            RebloomParser.parse_line("rebloom happened somewhere"),
            ParseOutcome::Skipped(SkipReason::Unrecognised)
        );
        assert_eq!(
            RebloomParser.parse_line(r#"{"source_id": "a"}"#),
            ParseOutcome::Skipped(SkipReason::MissingField("rebloom_id"))
        );
        assert_eq!(
            RebloomParser.parse_line("[t] [REBLOOM:b]"),
            ParseOutcome::Skipped(SkipReason::MissingField("source_id"))
        );
    }
}
