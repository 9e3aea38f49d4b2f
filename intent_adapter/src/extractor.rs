//! Shared intent-extractor surface
//!
//! [`IntentExtractor`] is the contract every extraction strategy offers to
//! the surrounding framework. [`ExtractorState`] is the name bookkeeping
//! that is updated alongside a strategy's own registration work, and the
//! free functions are the helpers strategies share.

use crate::builder::IntentParser;
use crate::config::{AdapterConfig, IntentStrategy};
use crate::error::Result;
use crate::types::{IntentDefinition, MatchResult, PatternSamples};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    Keyword,
    Regex,
    Plain,
}

/// Names registered through an extractor, with the language they were
/// registered for.
#[derive(Debug, Default, Clone)]
pub struct ExtractorState {
    entities: BTreeMap<String, Option<String>>,
    regex_entities: BTreeMap<String, Option<String>>,
    intents: BTreeMap<String, (IntentKind, Option<String>)>,
}

impl ExtractorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_entity(&mut self, entity_name: &str, lang: Option<&str>) {
        self.entities
            .insert(entity_name.to_string(), lang.map(str::to_string));
    }

    pub fn register_regex_entity(&mut self, entity_name: &str, lang: Option<&str>) {
        self.regex_entities
            .insert(entity_name.to_string(), lang.map(str::to_string));
    }

    /// Later registrations of the same name overwrite its kind.
    pub fn register_intent(&mut self, intent_name: &str, kind: IntentKind, lang: Option<&str>) {
        self.intents
            .insert(intent_name.to_string(), (kind, lang.map(str::to_string)));
    }

    pub fn detach_intent(&mut self, intent_name: &str) {
        self.intents.remove(intent_name);
    }

    /// Plain string prefix, no namespace separator is implied.
    pub fn detach_skill(&mut self, skill_id: &str) {
        self.intents.retain(|name, _| !name.starts_with(skill_id));
    }

    pub fn intent_kind(&self, intent_name: &str) -> Option<IntentKind> {
        self.intents.get(intent_name).map(|(kind, _)| *kind)
    }

    pub fn intent_lang(&self, intent_name: &str) -> Option<&str> {
        self.intents.get(intent_name).and_then(|(_, lang)| lang.as_deref())
    }

    pub fn intent_names(&self) -> Vec<&str> {
        self.intents.keys().map(String::as_str).collect()
    }

    pub fn entity_names(&self) -> Vec<&str> {
        self.entities.keys().map(String::as_str).collect()
    }

    pub fn regex_entity_names(&self) -> Vec<&str> {
        self.regex_entities.keys().map(String::as_str).collect()
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.regex_entities.clear();
        self.intents.clear();
    }
}

/// Remove every occurrence of each matched sample from `utterance`.
///
/// This is literal string removal, not span subtraction. When nothing was
/// removed the utterance comes back untouched; otherwise whitespace is
/// collapsed and the result trimmed.
pub fn get_utterance_remainder(utterance: &str, samples: &[String]) -> String {
    let mut remainder = utterance.to_string();
    let mut removed = false;

    for sample in samples.iter().filter(|s| !s.is_empty()) {
        if remainder.contains(sample.as_str()) {
            remainder = remainder.replace(sample.as_str(), " ");
            removed = true;
        }
    }

    if !removed {
        return utterance.to_string();
    }
    remainder.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split an utterance on literal markers such as `" and "`.
pub fn segment_utterance(utterance: &str, markers: &[String]) -> Vec<String> {
    let mut chunks = vec![utterance.to_string()];
    for marker in markers.iter().filter(|m| !m.is_empty()) {
        chunks = chunks
            .iter()
            .flat_map(|chunk| chunk.split(marker.as_str()))
            .map(str::to_string)
            .collect();
    }
    chunks
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

pub trait IntentExtractor {
    fn config(&self) -> &AdapterConfig;

    /// Empty `samples` registers the entity name itself as its only sample.
    fn register_entity(&mut self, entity_name: &str, samples: &[String], lang: Option<&str>);

    fn register_regex_entity(&mut self, entity_name: &str, samples: PatternSamples, lang: Option<&str>) -> Result<()>;

    fn register_regex_intent(&mut self, intent_name: &str, samples: PatternSamples, lang: Option<&str>) -> Result<IntentParser>;

    fn register_keyword_intent(&mut self, definition: IntentDefinition, lang: Option<&str>) -> IntentParser;

    /// An intent triggered by any of `samples`.
    fn register_intent(&mut self, intent_name: &str, samples: &[String], lang: Option<&str>) -> IntentParser;

    fn calc_intent(&self, utterance: &str, min_conf: f64, lang: Option<&str>) -> Option<MatchResult>;

    fn detach_intent(&mut self, intent_name: &str);

    fn detach_skill(&mut self, skill_id: &str);

    fn manifest(&self) -> Vec<String>;

    fn segment(&self, utterance: &str) -> Vec<String> {
        segment_utterance(utterance, &self.config().segment_markers)
    }

    /// All intents in `utterance` according to the configured strategy.
    /// Unknown sentinels are never part of the result.
    fn calc_intents(&self, utterance: &str, min_conf: f64, lang: Option<&str>) -> Vec<MatchResult> {
        let utterance = utterance.trim();
        let strategy = self.config().strategy;
        let segments = match strategy {
            IntentStrategy::SingleIntent | IntentStrategy::Remainder => vec![utterance.to_string()],
            IntentStrategy::Segment | IntentStrategy::SegmentRemainder => self.segment(utterance),
        };

        let mut results = Vec::new();
        for segment in segments {
            let mut current = segment;
            loop {
                let Some(result) = self
                    .calc_intent(&current, min_conf, lang)
                    .filter(|r| !r.is_unknown())
                else {
                    break;
                };
                let next = result.utterance_remainder.clone();
                results.push(result);

                let follow_remainder = matches!(
                    strategy,
                    IntentStrategy::Remainder | IntentStrategy::SegmentRemainder
                );
                // stop once the remainder no longer shrinks
                if !follow_remainder || next.is_empty() || next.len() >= current.len() {
                    break;
                }
                current = next;
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_remainder_removes_samples() {
        let remainder = get_utterance_remainder("turn on the light", &strings(&["light"]));
        assert_eq!(remainder, "turn on the");
    }

    #[test]
    fn test_remainder_without_matches_is_unchanged() {
        let utterance = "turn  on the light";
        assert_eq!(get_utterance_remainder(utterance, &[]), utterance);
        assert_eq!(get_utterance_remainder(utterance, &strings(&["lamp", ""])), utterance);
    }

    #[test]
    fn test_remainder_removes_every_occurrence() {
        let remainder = get_utterance_remainder("light the light please", &strings(&["light"]));
        assert_eq!(remainder, "the please");
    }

    #[test]
    fn test_segment_utterance() {
        let markers = AdapterConfig::default().segment_markers;
        assert_eq!(
            segment_utterance("turn on the light and then set a timer, thanks", &markers),
            strings(&["turn on the light", "set a timer", "thanks"])
        );
        assert_eq!(segment_utterance("hello", &markers), strings(&["hello"]));
    }

    #[test]
    fn test_state_detach_skill_is_prefix() {
        let mut state = ExtractorState::new();
        state.register_intent("alarm:set", IntentKind::Keyword, Some("en-us"));
        state.register_intent("alarmclock:delete", IntentKind::Keyword, None);
        state.register_intent("timer:start", IntentKind::Regex, None);

        assert_eq!(state.intent_lang("alarm:set"), Some("en-us"));
        state.detach_skill("alarm");
        assert_eq!(state.intent_names(), vec!["timer:start"]);
        assert_eq!(state.intent_kind("timer:start"), Some(IntentKind::Regex));
    }

    #[test]
    fn test_state_kind_overwrite() {
        let mut state = ExtractorState::new();
        state.register_intent("set_timer", IntentKind::Keyword, None);
        state.register_intent("set_timer", IntentKind::Regex, None);
        assert_eq!(state.intent_kind("set_timer"), Some(IntentKind::Regex));

        state.detach_intent("set_timer");
        state.detach_intent("set_timer");
        assert!(state.intent_names().is_empty());
    }
}
