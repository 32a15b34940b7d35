use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use super::structured::StructuredLine;
use super::{LineParser, ParseOutcome, SkipReason};

const RISK_WORDS: [&str; 14] = [
    "cascade", "drift", "entropy", "critical", "collapse", "fragment", "unstable", "chaos",
    "overload", "spike", "rupture", "surge", "anomaly", "pressure",
];

const MOOD_KEYWORDS: [(Mood, &[&str]); 6] = [
    (Mood::Calm, &["peaceful", "tranquil", "steady", "stable", "quiet"]),
    (Mood::Focused, &["sharp", "clear", "directed", "intentional", "precise"]),
    (Mood::Energetic, &["dynamic", "active", "vibrant", "flowing", "cascad"]),
    (Mood::Contemplative, &["contemplat", "reflect", "ponder", "meditat", "consider"]),
    (Mood::Anxious, &["concern", "alert", "uncertain", "shift", "different"]),
    (Mood::Neutral, &["observe", "process", "monitor", "aware", "exist"]),
];

static RE_PIPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d[^|]*?)\s*\|\s*(?:REFLECTION:\s*)?(.*)$").expect("valid pipe regex")
});

static RE_TICK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:tick|cycle|milestone|pulse)\s*#?\s*(\d+)").expect("valid tick regex")
});

static RE_ENTROPY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bentropy\s*[:=]?\s*(\d+(?:\.\d+)?)").expect("valid entropy regex")
});

static RE_HEAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bheat\s*[:=]?\s*(\d+(?:\.\d+)?)").expect("valid heat regex")
});

static RE_SCUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bscup\s*[:=]?\s*(\d+(?:\.\d+)?)\s*(%)?").expect("valid scup regex")
});

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskLevel {
    Stable,
    Low,
    Elevated,
    Critical,
}

impl RiskLevel {
    pub fn from_hits(hits: usize) -> Self {
        match hits {
            0 => Self::Stable,
            1 => Self::Low,
            2 => Self::Elevated,
            _ => Self::Critical,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Low => "low",
            Self::Elevated => "elevated",
            Self::Critical => "critical",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mood {
    Calm,
    Focused,
    Energetic,
    Contemplative,
    Anxious,
    Neutral,
}

impl Mood {
    pub fn label(self) -> &'static str {
        match self {
            Self::Calm => "calm",
            Self::Focused => "focused",
            Self::Energetic => "energetic",
            Self::Contemplative => "contemplative",
            Self::Anxious => "anxious",
            Self::Neutral => "neutral",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ReflectionState {
    pub entropy: Option<f32>,
    pub heat: Option<f32>,
    /// Normalised to `0..=1`.
    pub scup: Option<f32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReflectionEntry {
    pub timestamp: Option<String>,
    pub text: String,
    pub risk_level: RiskLevel,
    pub risk_hits: usize,
    pub tick: Option<u64>,
    pub state: ReflectionState,
    pub mood: Mood,
}

impl ReflectionEntry {
    fn classify(timestamp: Option<String>, text: String, tick: Option<u64>) -> Self {
        let lowered = text.to_lowercase();
        let risk_hits = RISK_WORDS
            .iter()
            .filter(|word| lowered.contains(*word))
            .count();

        Self {
            timestamp,
            risk_level: RiskLevel::from_hits(risk_hits),
            risk_hits,
            tick: tick.or_else(|| extract_tick(&text)),
            state: extract_state(&text),
            mood: infer_mood(&lowered),
            text,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawReflection {
    #[serde(default)]
    timestamp: Option<Value>,
    #[serde(default, alias = "content", alias = "reflection", alias = "message")]
    text: Option<String>,
    #[serde(default, alias = "tick_id", alias = "tick_number")]
    tick: Option<u64>,
}

/// Reflection lines are never dropped for being unstructured: anything that
/// is not JSON, pipe or bracket formatted becomes an opaque free-text entry.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReflectionParser;

impl LineParser for ReflectionParser {
    type Entry = ReflectionEntry;

    fn parse_line(&self, line: &str) -> ParseOutcome<ReflectionEntry> {
        let line = line.trim();
        if line.is_empty() {
            return ParseOutcome::Skipped(SkipReason::Blank);
        }

        if line.starts_with('{') {
            let raw: RawReflection = match serde_json::from_str(line) {
                Ok(raw) => raw,
                Err(error) => {
                    return ParseOutcome::Skipped(SkipReason::InvalidJson(error.to_string()));
                }
            };
            let Some(text) = raw.text.filter(|text| !text.trim().is_empty()) else {
                return ParseOutcome::Skipped(SkipReason::MissingField("text"));
            };
            let timestamp = raw.timestamp.and_then(|value| match value {
                Value::String(stamp) => Some(stamp),
                Value::Number(number) => Some(number.to_string()),
                _ => None,
            });
            return ParseOutcome::Parsed(ReflectionEntry::classify(
                timestamp,
                strip_marker(&text).to_owned(),
                raw.tick,
            ));
        }

        if let Some(captures) = RE_PIPE.captures(line) {
            let timestamp = captures.get(1).map(|m| m.as_str().trim().to_owned());
            let text = captures.get(2).map_or("", |m| m.as_str()).trim().to_owned();
            return ParseOutcome::Parsed(ReflectionEntry::classify(timestamp, text, None));
        }

        if let Some(structured) = StructuredLine::parse(line) {
            let tick = structured
                .field("TICK")
                .and_then(|value| value.parse::<u64>().ok());
            let text = strip_marker(&structured.text).to_owned();
            let mut entry = ReflectionEntry::classify(structured.timestamp.clone(), text, tick);
            if let Some(entropy) = structured.number("ENTROPY") {
                entry.state.entropy = Some(entropy);
            }
            if let Some(heat) = structured.number("HEAT") {
                entry.state.heat = Some(heat);
            }
            if let Some(scup) = structured.number("SCUP") {
                entry.state.scup = Some(normalize_percent(scup));
            }
            return ParseOutcome::Parsed(entry);
        }

        ParseOutcome::Parsed(ReflectionEntry::classify(
            None,
            strip_marker(line).to_owned(),
            None,
        ))
    }
}

fn strip_marker(text: &str) -> &str {
    let text = text.trim();
    text.strip_prefix("REFLECTION:")
        .map(str::trim_start)
        .unwrap_or(text)
}

fn extract_tick(text: &str) -> Option<u64> {
    RE_TICK
        .captures(text)
        .and_then(|captures| captures.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn capture_number(regex: &Regex, text: &str) -> Option<f32> {
    regex
        .captures(text)
        .and_then(|captures| captures.get(1))
        .and_then(|m| m.as_str().parse::<f32>().ok())
}

fn normalize_percent(value: f32) -> f32 {
    if value > 1.0 { value / 100.0 } else { value }
}

fn extract_state(text: &str) -> ReflectionState {
    ReflectionState {
        entropy: capture_number(&RE_ENTROPY, text),
        heat: capture_number(&RE_HEAT, text),
        scup: capture_number(&RE_SCUP, text).map(normalize_percent),
    }
}

fn infer_mood(lowered: &str) -> Mood {
    let mut best = (Mood::Neutral, 0usize);
    for (mood, keywords) in MOOD_KEYWORDS {
        let score = keywords
            .iter()
            .filter(|keyword| lowered.contains(*keyword))
            .count();
        if score > best.1 {
            best = (mood, score);
        }
    }
    best.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> ReflectionEntry {
        match ReflectionParser.parse_line(line) {
            ParseOutcome::Parsed(entry) => entry,
            ParseOutcome::Skipped(reason) => panic!("line skipped: {reason}"),
        }
    }

    #[test]
    fn pipe_format_with_critical_risk() {
        let entry = parse(
            "2025-01-14T22:31:30 | REFLECTION: Memory cascade triggered: drift entropy critical",
        );
        assert_eq!(entry.timestamp.as_deref(), Some("2025-01-14T22:31:30"));
        assert_eq!(entry.risk_level, RiskLevel::Critical);
        assert!(entry.risk_hits >= 3);
        assert_eq!(
            entry.text,
            "Memory cascade triggered: drift entropy critical"
        );
    }

    #[test]
    fn risk_levels_follow_hit_count() {
        assert_eq!(parse("all quiet in the garden").risk_level, RiskLevel::Stable);
        assert_eq!(parse("a small drift").risk_level, RiskLevel::Low);
        assert_eq!(parse("drift under pressure").risk_level, RiskLevel::Elevated);
    }

    #[test]
    fn bracket_format_reads_fields() {
        let entry =
            parse("[2025-01-14 22:31:30] [TICK:812] [SCUP:64%] REFLECTION: steady and clear");
        assert_eq!(entry.timestamp.as_deref(), Some("2025-01-14 22:31:30"));
        assert_eq!(entry.tick, Some(812));
        assert_eq!(entry.state.scup, Some(0.64));
        assert_eq!(entry.text, "steady and clear");
    }

    #[test]
    fn json_lines_are_primary() {
        let entry = parse(concat!(
            r#"{"timestamp": "2025-01-15T01:00:00", "content": "I ponder at entropy 0.71", "#,
            r#""tick_id": 9}"#,
        ));
        assert_eq!(entry.timestamp.as_deref(), Some("2025-01-15T01:00:00"));
        assert_eq!(entry.tick, Some(9));
        assert_eq!(entry.state.entropy, Some(0.71));
        assert_eq!(entry.mood, Mood::Contemplative);
    }

    #[test]
    fn free_text_is_kept_and_broken_json_is_skipped() {
        let entry = parse("Tick 42: internal observation, heat 3.5");
        assert_eq!(entry.timestamp, None);
        assert_eq!(entry.tick, Some(42));
        assert_eq!(entry.state.heat, Some(3.5));

        assert!(matches!(
            ReflectionParser.parse_line("{not json"),
            ParseOutcome::Skipped(SkipReason::InvalidJson(_))
        ));
        assert!(matches!(
            ReflectionParser.parse_line(r#"{"timestamp": 1}"#),
            ParseOutcome::Skipped(SkipReason::MissingField("text"))
        ));
        assert!(matches!(
            ReflectionParser.parse_line("   "),
            ParseOutcome::Skipped(SkipReason::Blank)
        ));
    }
}
