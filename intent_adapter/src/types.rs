//! Core data types for registration input and match output

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Tag identifying this adapter in match results.
pub const INTENT_ENGINE: &str = "adapt";

/// Intent type reported by the zero-confidence sentinel.
pub const UNKNOWN_INTENT: &str = "unknown";

/// Structured match returned to the arbitration layer.
///
/// Field names are the wire contract shared with other extraction
/// strategies, so `confidence` serializes as `conf`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub intent_type: String,
    #[serde(rename = "conf")]
    pub confidence: f64,
    pub entities: BTreeMap<String, String>,
    pub utterance: String,
    pub utterance_remainder: String,
    pub intent_engine: String,
}

impl MatchResult {
    /// Zero-confidence result used when the adapter is configured to
    /// report misses instead of returning nothing.
    pub fn unknown(utterance: &str) -> Self {
        Self {
            intent_type: UNKNOWN_INTENT.to_string(),
            confidence: 0.0,
            entities: BTreeMap::new(),
            utterance: utterance.to_string(),
            utterance_remainder: utterance.to_string(),
            intent_engine: INTENT_ENGINE.to_string(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.intent_type == UNKNOWN_INTENT && self.confidence == 0.0
    }
}

/// Where a tag came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagSource {
    Keyword,
    Regex,
    Context,
}

/// An entity occurrence found by the engine's tagger.
///
/// `start`/`end` are byte offsets into the trimmed utterance. Context tags
/// do not occupy a span and carry `start == end == 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub entity: String,
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub confidence: f64,
    pub source: TagSource,
    /// Named capture groups of a regex tag, in pattern order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub captures: Vec<(String, String)>,
}

impl Tag {
    pub fn keyword(entity: &str, text: &str, start: usize, end: usize, confidence: f64) -> Self {
        Self {
            entity: entity.to_string(),
            text: text.to_string(),
            start,
            end,
            confidence,
            source: TagSource::Keyword,
            captures: Vec::new(),
        }
    }

    pub fn context(entity: &str, value: &str) -> Self {
        Self {
            entity: entity.to_string(),
            text: value.to_string(),
            start: 0,
            end: 0,
            confidence: 1.0,
            source: TagSource::Context,
            captures: Vec::new(),
        }
    }

    /// Whether this tag can stand in for `entity` in a parser requirement.
    pub fn provides(&self, entity: &str) -> bool {
        self.entity == entity || self.captures.iter().any(|(name, _)| name == entity)
    }

    pub fn overlaps(&self, other: &Tag) -> bool {
        if self.source == TagSource::Context || other.source == TagSource::Context {
            return false;
        }
        self.start < other.end && other.start < self.end
    }

    /// Entity bindings this tag contributes to a match.
    pub fn bindings(&self) -> Vec<(String, String)> {
        if self.captures.is_empty() {
            vec![(self.entity.clone(), self.text.clone())]
        } else {
            self.captures.clone()
        }
    }
}

/// A ranked engine output before the adapter reshapes it.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub intent_type: String,
    pub confidence: f64,
    pub bindings: BTreeMap<String, String>,
    /// Present only when the caller asked for tags.
    pub tags: Option<Vec<Tag>>,
}

/// Declarative keyword intent as a caller or a skill file states it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentDefinition {
    pub name: String,
    #[serde(default, alias = "required")]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub optional: Vec<String>,
    #[serde(default)]
    pub at_least_one: Vec<Vec<String>>,
    #[serde(default)]
    pub excluded: Vec<String>,
}

impl IntentDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn require(mut self, entity: impl Into<String>) -> Self {
        self.keywords.push(entity.into());
        self
    }

    pub fn optionally(mut self, entity: impl Into<String>) -> Self {
        self.optional.push(entity.into());
        self
    }

    pub fn one_of<I, S>(mut self, group: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.at_least_one.push(group.into_iter().map(Into::into).collect());
        self
    }

    pub fn exclude(mut self, entity: impl Into<String>) -> Self {
        self.excluded.push(entity.into());
        self
    }
}

/// Regex samples as handed over by a caller: one pattern, a list of
/// patterns, or something else that is dropped without registering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSamples {
    One(String),
    Many(Vec<String>),
    Unsupported,
}

impl PatternSamples {
    pub fn patterns(&self) -> &[String] {
        match self {
            PatternSamples::One(p) => std::slice::from_ref(p),
            PatternSamples::Many(ps) => ps,
            PatternSamples::Unsupported => &[],
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, PatternSamples::Unsupported)
    }
}

impl From<&str> for PatternSamples {
    fn from(pattern: &str) -> Self {
        PatternSamples::One(pattern.to_string())
    }
}

impl From<String> for PatternSamples {
    fn from(pattern: String) -> Self {
        PatternSamples::One(pattern)
    }
}

impl From<Vec<String>> for PatternSamples {
    fn from(patterns: Vec<String>) -> Self {
        PatternSamples::Many(patterns)
    }
}

impl From<&[&str]> for PatternSamples {
    fn from(patterns: &[&str]) -> Self {
        PatternSamples::Many(patterns.iter().map(|p| p.to_string()).collect())
    }
}

impl From<&Value> for PatternSamples {
    /// A list containing anything other than strings is unsupported as a whole.
    fn from(value: &Value) -> Self {
        match value {
            Value::String(s) => PatternSamples::One(s.clone()),
            Value::Array(items) => items
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .map(PatternSamples::Many)
                .unwrap_or(PatternSamples::Unsupported),
            _ => PatternSamples::Unsupported,
        }
    }
}

impl<'de> Deserialize<'de> for PatternSamples {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(PatternSamples::from(&value))
    }
}
