use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

static RE_LEADING_BRACKET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[([^\]]*)\]\s*").expect("valid bracket regex"));

static RE_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[([A-Za-z_][A-Za-z0-9_]*):\s*([^\]]*)\]\s*").expect("valid field regex")
});

/// A line in the legacy `[timestamp] [KEY:value] ... free text` format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructuredLine {
    pub timestamp: Option<String>,
    /// Keys are upper-cased.
    pub fields: BTreeMap<String, String>,
    pub text: String,
}

impl StructuredLine {
    /// Returns `None` unless the line has a bracketed timestamp or at least one field.
    pub fn parse(line: &str) -> Option<Self> {
        let mut rest = line.trim();
        let mut timestamp = None;

        if !RE_FIELD.is_match(rest)
            && let Some(captures) = RE_LEADING_BRACKET.captures(rest)
        {
            let stamp = captures.get(1).map_or("", |m| m.as_str()).trim();
            if !stamp.is_empty() {
                timestamp = Some(stamp.to_owned());
            }
            rest = &rest[captures.get(0).map_or(0, |m| m.end())..];
        }

        let mut fields = BTreeMap::new();
        while let Some(captures) = RE_FIELD.captures(rest) {
            let key = captures.get(1).map_or("", |m| m.as_str()).to_ascii_uppercase();
            let value = captures.get(2).map_or("", |m| m.as_str()).trim().to_owned();
            fields.entry(key).or_insert(value);
            rest = &rest[captures.get(0).map_or(0, |m| m.end())..];
        }

        if timestamp.is_none() && fields.is_empty() {
            return None;
        }

        Some(Self {
            timestamp,
            fields,
            text: rest.trim().to_owned(),
        })
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn first_field(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|key| self.field(key))
    }

    pub fn number(&self, key: &str) -> Option<f32> {
        self.field(key)
            .and_then(|value| value.trim_end_matches('%').parse::<f32>().ok())
            .filter(|value| value.is_finite())
    }
}
