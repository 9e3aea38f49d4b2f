//! Adapter configuration
//!
//! Every field has a default, so an empty JSON object is a valid config.

use crate::error::{AdapterError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What `calc_intent` reports when no candidate clears the threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoMatchPolicy {
    /// Return nothing.
    #[default]
    Absent,
    /// Return a zero-confidence result labeled `unknown`.
    UnknownSentinel,
}

/// How `calc_intents` splits an utterance into several intents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStrategy {
    SingleIntent,
    Segment,
    Remainder,
    #[default]
    SegmentRemainder,
}

/// Priority reported to the layer that arbitrates between strategies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentPriority {
    #[default]
    KeywordsHigh,
    KeywordsMedium,
    KeywordsLow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    pub min_conf: f64,
    pub max_candidates: usize,
    pub no_match_policy: NoMatchPolicy,
    /// Minimum similarity for a fuzzy keyword tag. `1.0` means exact only.
    pub fuzzy_threshold: f64,
    pub strategy: IntentStrategy,
    pub priority: IntentPriority,
    pub segment_markers: Vec<String>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            min_conf: 0.5,
            max_candidates: 100,
            no_match_policy: NoMatchPolicy::default(),
            fuzzy_threshold: 1.0,
            strategy: IntentStrategy::default(),
            priority: IntentPriority::default(),
            segment_markers: [" and then ", " and ", " then ", ", "]
                .iter()
                .map(|m| m.to_string())
                .collect(),
        }
    }
}

impl AdapterConfig {
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|source| AdapterError::Io {
            path: path.as_ref().display().to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }
}
