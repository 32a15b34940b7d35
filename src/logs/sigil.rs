use serde::Deserialize;
use serde_json::Value;

use super::structured::StructuredLine;
use super::{LineParser, ParseOutcome, SkipReason};

#[derive(Clone, Debug, PartialEq)]
pub struct SigilEmission {
    pub name: String,
    pub timestamp: Option<String>,
    pub entropy: Option<f32>,
    pub heat: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct RawSigil {
    #[serde(default, alias = "sigil", alias = "symbol")]
    name: Option<String>,
    #[serde(default)]
    timestamp: Option<Value>,
    #[serde(default)]
    entropy: Option<f32>,
    #[serde(default)]
    heat: Option<f32>,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SigilParser;

impl LineParser for SigilParser {
    type Entry = SigilEmission;

    fn parse_line(&self, line: &str) -> ParseOutcome<SigilEmission> {
        let line = line.trim();
        if line.is_empty() {
            return ParseOutcome::Skipped(SkipReason::Blank);
        }

        if line.starts_with('{') {
            let raw: RawSigil = match serde_json::from_str(line) {
                Ok(raw) => raw,
                Err(error) => {
                    return ParseOutcome::Skipped(SkipReason::InvalidJson(error.to_string()));
                }
            };
            let Some(name) = raw.name.filter(|name| !name.trim().is_empty()) else {
                return ParseOutcome::Skipped(SkipReason::MissingField("sigil"));
            };
            let timestamp = raw.timestamp.and_then(|value| match value {
                Value::String(stamp) => Some(stamp),
                Value::Number(number) => Some(number.to_string()),
                _ => None,
            });
            return ParseOutcome::Parsed(SigilEmission {
                name,
                timestamp,
                entropy: raw.entropy.filter(|value| value.is_finite()),
                heat: raw.heat.filter(|value| value.is_finite()),
            });
        }

        let Some(structured) = StructuredLine::parse(line) else {
            return ParseOutcome::Skipped(SkipReason::Unrecognised);
        };
        let Some(name) = structured.first_field(&["SIGIL", "NAME"]) else {
            return ParseOutcome::Skipped(SkipReason::MissingField("sigil"));
        };

        ParseOutcome::Parsed(SigilEmission {
            name: name.to_owned(),
            timestamp: structured.timestamp.clone(),
            entropy: structured.number("ENTROPY"),
            heat: structured.number("HEAT"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_formats() {
        let ParseOutcome::Parsed(json) = SigilParser.parse_line(
            r#"{"sigil": "DEEP_FOCUS", "timestamp": 1736893890.5, "entropy": 0.3, "heat": 41.0}"#,
        ) else {
            panic!("expected parsed sigil");
        };
        assert_eq!(json.name, "DEEP_FOCUS");
        assert_eq!(json.timestamp.as_deref(), Some("1736893890.5"));
        assert_eq!(json.heat, Some(41.0));

        let ParseOutcome::Parsed(text) =
            SigilParser.parse_line("[22:31:30] [SIGIL:STABILIZE] [ENTROPY:0.8] [HEAT:n/a]")
        else {
            panic!("expected parsed sigil");
        };
        assert_eq!(text.name, "STABILIZE");
        assert_eq!(text.entropy, Some(0.8));
        assert_eq!(text.heat, None);
    }

    #[test]
    fn lines_without_a_sigil_are_skipped() {
        assert_eq!(
            SigilParser.parse_line("[t] [ENTROPY:0.2]"),
            ParseOutcome::Skipped(SkipReason::MissingField("sigil"))
        );
        assert_eq!(
            SigilParser.parse_line("emitted something"),
            ParseOutcome::Skipped(SkipReason::Unrecognised)
        );
    }
}
