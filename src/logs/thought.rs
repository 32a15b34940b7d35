use serde::Deserialize;
use serde_json::Value;

use super::structured::StructuredLine;
use super::{LineParser, ParseOutcome, SkipReason};

/// One line of the thought trace: what the engine is thinking, what it
/// expects next and what it decided to do.
#[derive(Clone, Debug, PartialEq)]
pub struct ThoughtEntry {
    pub timestamp: Option<String>,
    pub tick: Option<u64>,
    pub text: String,
    pub forecast: Option<String>,
    pub action: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawThought {
    #[serde(default)]
    timestamp: Option<Value>,
    #[serde(default, alias = "tick_count")]
    tick: Option<u64>,
    #[serde(default, alias = "text", alias = "content")]
    thought: Option<String>,
    #[serde(default)]
    forecast: Option<String>,
    #[serde(default)]
    action: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn entry(
    timestamp: Option<String>,
    tick: Option<u64>,
    text: Option<String>,
    forecast: Option<String>,
    action: Option<String>,
) -> ParseOutcome<ThoughtEntry> {
    let (text, forecast, action) = (non_empty(text), non_empty(forecast), non_empty(action));
    if text.is_none() && forecast.is_none() && action.is_none() {
        return ParseOutcome::Skipped(SkipReason::MissingField("thought"));
    }
    ParseOutcome::Parsed(ThoughtEntry {
        timestamp,
        tick,
        text: text.unwrap_or_default(),
        forecast,
        action,
    })
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ThoughtParser;

impl LineParser for ThoughtParser {
    type Entry = ThoughtEntry;

    fn parse_line(&self, line: &str) -> ParseOutcome<ThoughtEntry> {
        let line = line.trim();
        if line.is_empty() {
            return ParseOutcome::Skipped(SkipReason::Blank);
        }

        if line.starts_with('{') {
            let raw: RawThought = match serde_json::from_str(line) {
                Ok(raw) => raw,
                Err(error) => {
                    return ParseOutcome::Skipped(SkipReason::InvalidJson(error.to_string()));
                }
            };
            let timestamp = raw.timestamp.and_then(|value| match value {
                Value::String(stamp) => Some(stamp),
                Value::Number(number) => Some(number.to_string()),
                _ => None,
            });
            return entry(timestamp, raw.tick, raw.thought, raw.forecast, raw.action);
        }

        let Some(structured) = StructuredLine::parse(line) else {
            return ParseOutcome::Skipped(SkipReason::Unrecognised);
        };
        let text = structured
            .field("THOUGHT")
            .map(str::to_owned)
            .or_else(|| Some(structured.text.clone()));
        entry(
            structured.timestamp.clone(),
            structured.field("TICK").and_then(|tick| tick.parse().ok()),
            text,
            structured.field("FORECAST").map(str::to_owned),
            structured.field("ACTION").map(str::to_owned),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json_thoughts() {
        let ParseOutcome::Parsed(thought) = ThoughtParser.parse_line(concat!(
            r#"{"timestamp": 1736893890, "tick": 4120, "#,
            r#""thought": "pressure rising in sector 3", "#,
            r#""forecast": "entropy spike", "action": "stabilize"}"#,
        )) else {
            panic!("expected parsed thought");
        };
        assert_eq!(thought.timestamp.as_deref(), Some("1736893890"));
        assert_eq!(thought.tick, Some(4120));
        assert_eq!(thought.text, "pressure rising in sector 3");
        assert_eq!(thought.forecast.as_deref(), Some("entropy spike"));
        assert_eq!(thought.action.as_deref(), Some("stabilize"));
    }

    #[test]
    fn parses_bracketed_thoughts() {
        let ParseOutcome::Parsed(thought) = ThoughtParser
            .parse_line("[22:31:30] [TICK:88] [FORECAST:calm] [ACTION:] drifting toward rest")
        else {
            panic!("expected parsed thought");
        };
        assert_eq!(thought.timestamp.as_deref(), Some("22:31:30"));
        assert_eq!(thought.tick, Some(88));
        assert_eq!(thought.text, "drifting toward rest");
        assert_eq!(thought.forecast.as_deref(), Some("calm"));
        assert_eq!(thought.action, None);
    }

    #[test]
    fn empty_or_unknown_lines_are_skipped() {
        assert_eq!(
            ThoughtParser.parse_line(r#"{"tick": 3, "thought": "  "}"#),
            ParseOutcome::Skipped(SkipReason::MissingField("thought"))
        );
        assert!(matches!(
            ThoughtParser.parse_line("{ broken"),
            ParseOutcome::Skipped(SkipReason::InvalidJson(_))
        ));
        assert_eq!(
            ThoughtParser.parse_line("plain words"),
            ParseOutcome::Skipped(SkipReason::Unrecognised)
        );
        assert_eq!(ThoughtParser.parse_line("   "), ParseOutcome::Skipped(SkipReason::Blank));
    }
}
