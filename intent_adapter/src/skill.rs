//! Skill vocabulary files
//!
//! A skill ships its entities and intents as one JSON document. Loading
//! it namespaces every intent as `<skill_id>:<intent_name>` so the whole
//! skill can later be removed with `detach_skill`.

use crate::adapter::IntentAdapter;
use crate::engine::MatchingEngine;
use crate::error::{AdapterError, Result};
use crate::extractor::IntentExtractor;
use crate::types::{IntentDefinition, PatternSamples};
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Separator between skill id and intent name.
pub const SKILL_SEPARATOR: char = ':';

#[derive(Debug, Clone, Deserialize)]
pub struct SkillVocabulary {
    pub skill_id: String,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub entities: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub regex_entities: BTreeMap<String, PatternSamples>,
    #[serde(default)]
    pub intents: Vec<IntentDefinition>,
    #[serde(default)]
    pub regex_intents: BTreeMap<String, PatternSamples>,
}

impl SkillVocabulary {
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

    pub fn intent_name(&self, name: &str) -> String {
        format!("{}{}{}", self.skill_id, SKILL_SEPARATOR, name)
    }

    /// Compile every regex sample so a bad pattern is reported before
    /// anything is registered.
    pub fn validate(&self) -> Result<()> {
        for (name, samples) in self.regex_entities.iter().chain(&self.regex_intents) {
            for pattern in samples.patterns() {
                Regex::new(pattern).map_err(|source| AdapterError::InvalidPattern {
                    entity: name.clone(),
                    source,
                })?;
            }
        }
        Ok(())
    }
}

impl<E: MatchingEngine> IntentAdapter<E> {
    /// Register a skill's vocabulary. Returns the namespaced intent names.
    ///
    /// Entities keep their own names; regex intents are namespaced like
    /// keyword intents. A keyword intent without keywords is anchored on
    /// its unqualified name, so "stop" in skill "media" is triggered by the
    /// word "stop". Nothing is registered when any pattern fails to compile.
    pub fn load_skill(&mut self, vocab: &SkillVocabulary) -> Result<Vec<String>> {
        vocab.validate()?;

        let lang = vocab.lang.as_deref();
        let mut installed = Vec::new();

        for (name, samples) in &vocab.entities {
            self.register_entity(name, samples, lang);
        }
        for (name, samples) in &vocab.regex_entities {
            self.register_regex_entity(name, samples.clone(), lang)?;
        }

        for definition in &vocab.intents {
            let mut definition = definition.clone();
            if definition.keywords.is_empty() {
                self.register_entity(&definition.name, &[], lang);
                definition.keywords = vec![definition.name.clone()];
            }
            definition.name = vocab.intent_name(&definition.name);
            let parser = self.register_keyword_intent(definition, lang);
            for entity in parser.entity_names().filter(|e| !self.entities().contains(e)) {
                tracing::warn!(skill = %vocab.skill_id, intent = %parser.name, entity, "Intent references unregistered entity");
            }
            installed.push(parser.name);
        }

        for (name, samples) in &vocab.regex_intents {
            let parser = self.register_regex_intent(&vocab.intent_name(name), samples.clone(), lang)?;
            installed.push(parser.name);
        }

        tracing::debug!(skill = %vocab.skill_id, intents = installed.len(), "Loaded skill vocabulary");
        Ok(installed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdapterConfig;
    use crate::extractor::IntentKind;

    const TIMER_SKILL: &str = r#"{
        "skill_id": "timer",
        "lang": "en-us",
        "entities": {"timer": ["timer", "countdown"], "cancel": ["cancel", "stop"]},
        "intents": [
            {"name": "start", "required": ["timer"], "excluded": ["cancel"]},
            {"name": "cancel_timer", "keywords": ["cancel", "timer"]}
        ],
        "regex_intents": {"duration": "(?P<TimerDuration>\\d+ minutes)"},
        "regex_entities": {"ignored": 7}
    }"#;

    #[test]
    fn test_load_skill() {
        let vocab = SkillVocabulary::from_json_str(TIMER_SKILL).unwrap();
        let mut adapter = IntentAdapter::new(AdapterConfig::default());
        let installed = adapter.load_skill(&vocab).unwrap();

        assert_eq!(installed, vec!["timer:start", "timer:cancel_timer", "timer:duration"]);
        assert_eq!(adapter.manifest(), installed);
        assert!(!adapter.entities().contains("ignored"));

        let result = adapter.calc_intent("start a countdown", 0.3, None).unwrap();
        assert_eq!(result.intent_type, "timer:start");

        let result = adapter.calc_intent("stop the timer", 0.3, None).unwrap();
        assert_eq!(result.intent_type, "timer:cancel_timer");

        let result = adapter.calc_intent("5 minutes", 0.3, None).unwrap();
        assert_eq!(result.intent_type, "timer:duration");
        assert_eq!(result.entities.get("TimerDuration").map(String::as_str), Some("5 minutes"));
    }

    #[test]
    fn test_detach_loaded_skill() {
        let vocab = SkillVocabulary::from_json_str(TIMER_SKILL).unwrap();
        let mut adapter = IntentAdapter::new(AdapterConfig::default());
        adapter.load_skill(&vocab).unwrap();
        adapter.register_intent("weather", &[], None);

        adapter.detach_skill("timer:");
        assert_eq!(adapter.manifest(), vec!["weather"]);
    }

    #[test]
    fn test_bad_regex_in_skill() {
        let vocab = SkillVocabulary::from_json_str(r#"{"skill_id": "x", "regex_intents": {"bad": "("}}"#).unwrap();
        let mut adapter = IntentAdapter::new(AdapterConfig::default());
        assert!(adapter.load_skill(&vocab).is_err());
        assert!(adapter.manifest().is_empty());
    }

    #[test]
    fn test_bad_regex_registers_nothing() {
        let vocab = SkillVocabulary::from_json_str(
            r#"{
                "skill_id": "x",
                "entities": {"timer": ["timer"]},
                "regex_entities": {"duration": "\\d+ minutes"},
                "intents": [{"name": "start", "keywords": ["timer"]}],
                "regex_intents": {"bad": "("}
            }"#,
        )
        .unwrap();
        let mut adapter = IntentAdapter::new(AdapterConfig::default());

        assert!(adapter.load_skill(&vocab).is_err());
        assert!(adapter.entities().entity_names().is_empty());
        assert!(adapter.state().entity_names().is_empty());
        assert!(adapter.manifest().is_empty());
    }

    #[test]
    fn test_skill_regex_intent_kind() {
        let vocab = SkillVocabulary::from_json_str(TIMER_SKILL).unwrap();
        let mut adapter = IntentAdapter::new(AdapterConfig::default());
        adapter.load_skill(&vocab).unwrap();

        assert_eq!(adapter.state().intent_kind("timer:duration"), Some(IntentKind::Regex));
        assert_eq!(adapter.state().intent_kind("timer:start"), Some(IntentKind::Keyword));
        assert_eq!(adapter.state().intent_lang("timer:duration"), Some("en-us"));
    }
}
