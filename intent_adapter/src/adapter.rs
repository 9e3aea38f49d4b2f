//! Intent adapter - registration, matching and lifecycle on top of a
//! [`MatchingEngine`]
//!
//! The adapter owns its entity registry and its engine; nothing else
//! writes to either. It does no locking: callers that share an adapter
//! across threads must serialize access themselves.

use crate::builder::{IntentBuilder, IntentParser};
use crate::config::{AdapterConfig, IntentPriority, NoMatchPolicy};
use crate::context::ContextManager;
use crate::engine::{KeywordEngine, MatchingEngine};
use crate::entities::EntityRegistry;
use crate::error::{AdapterError, Result};
use crate::extractor::{get_utterance_remainder, ExtractorState, IntentExtractor, IntentKind};
use crate::types::{Candidate, IntentDefinition, MatchResult, PatternSamples, INTENT_ENGINE};
use regex::Regex;

pub struct IntentAdapter<E: MatchingEngine = KeywordEngine> {
    config: AdapterConfig,
    engine: E,
    entities: EntityRegistry,
    state: ExtractorState,
    context: ContextManager,
}

impl IntentAdapter<KeywordEngine> {
    pub fn new(config: AdapterConfig) -> Self {
        let engine = KeywordEngine::new(config.fuzzy_threshold);
        Self::with_engine(config, engine)
    }
}

impl Default for IntentAdapter<KeywordEngine> {
    fn default() -> Self {
        Self::new(AdapterConfig::default())
    }
}

impl<E: MatchingEngine> IntentAdapter<E> {
    pub fn with_engine(config: AdapterConfig, engine: E) -> Self {
        Self {
            config,
            engine,
            entities: EntityRegistry::new(),
            state: ExtractorState::new(),
            context: ContextManager::new(),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn entities(&self) -> &EntityRegistry {
        &self.entities
    }

    pub fn state(&self) -> &ExtractorState {
        &self.state
    }

    pub fn context(&self) -> &ContextManager {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut ContextManager {
        &mut self.context
    }

    pub fn priority(&self) -> IntentPriority {
        self.config.priority
    }

    /// `calc_intent` with the configured `min_conf`.
    pub fn calc_intent_default(&self, utterance: &str) -> Option<MatchResult> {
        self.calc_intent(utterance, self.config.min_conf, None)
    }

    /// Drop every entity, intent and context value.
    pub fn reset(&mut self) {
        tracing::debug!("Resetting intent adapter");
        self.engine.clear();
        self.entities.clear();
        self.state.clear();
        self.context.clear();
    }

    fn reshape(&self, candidate: Candidate, utterance: &str) -> MatchResult {
        let samples: Vec<String> = candidate.bindings.values().cloned().collect();
        let utterance_remainder = get_utterance_remainder(utterance, &samples);
        tracing::debug!(
            intent = %candidate.intent_type,
            confidence = candidate.confidence,
            tags = candidate.tags.as_ref().map_or(0, Vec::len),
            lang = ?self.state.intent_lang(&candidate.intent_type),
            "Matched intent"
        );

        MatchResult {
            intent_type: candidate.intent_type,
            confidence: candidate.confidence,
            entities: candidate.bindings,
            utterance: utterance.to_string(),
            utterance_remainder,
            intent_engine: INTENT_ENGINE.to_string(),
        }
    }
}

impl<E: MatchingEngine> IntentExtractor for IntentAdapter<E> {
    fn config(&self) -> &AdapterConfig {
        &self.config
    }

    fn register_entity(&mut self, entity_name: &str, samples: &[String], lang: Option<&str>) {
        let default_samples = [entity_name.to_string()];
        let samples = if samples.is_empty() { &default_samples[..] } else { samples };

        for sample in samples {
            self.engine.register_entity(sample, entity_name);
        }
        let added = self.entities.add_samples(entity_name, samples);
        self.state.register_entity(entity_name, lang);
        tracing::debug!(entity = entity_name, new_samples = added.len(), "Registered entity");
    }

    fn register_regex_entity(&mut self, entity_name: &str, samples: PatternSamples, lang: Option<&str>) -> Result<()> {
        if !samples.is_supported() {
            tracing::debug!(entity = entity_name, "Dropping regex entity with unsupported samples");
            return Ok(());
        }

        // compile everything first so a bad pattern installs nothing
        let compiled = samples
            .patterns()
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| AdapterError::InvalidPattern {
                    entity: entity_name.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        for pattern in compiled {
            self.engine.register_regex_entity(entity_name, pattern);
        }
        self.entities.add_patterns(entity_name, samples.patterns());
        self.state.register_regex_entity(entity_name, lang);
        tracing::debug!(entity = entity_name, patterns = samples.patterns().len(), "Registered regex entity");
        Ok(())
    }

    fn register_regex_intent(&mut self, intent_name: &str, samples: PatternSamples, lang: Option<&str>) -> Result<IntentParser> {
        self.register_regex_entity(intent_name, samples, lang)?;
        let parser = self.register_keyword_intent(IntentDefinition::new(intent_name).require(intent_name), lang);
        self.state.register_intent(intent_name, IntentKind::Regex, lang);
        Ok(parser)
    }

    fn register_keyword_intent(&mut self, mut definition: IntentDefinition, lang: Option<&str>) -> IntentParser {
        if definition.keywords.is_empty() {
            definition.keywords = vec![definition.name.clone()];
            let samples = definition.keywords.clone();
            self.register_entity(&definition.name, &samples, lang);
        }
        self.state.register_intent(&definition.name, IntentKind::Keyword, lang);

        let parser = IntentBuilder::from_definition(&definition).build();
        tracing::debug!(
            intent = %parser.name,
            requires = ?parser.requires,
            optional = ?parser.optional,
            "Registered keyword intent"
        );
        self.engine.register_intent_parser(parser.clone());
        parser
    }

    fn register_intent(&mut self, intent_name: &str, samples: &[String], lang: Option<&str>) -> IntentParser {
        self.register_entity(intent_name, samples, lang);
        let parser = self.register_keyword_intent(IntentDefinition::new(intent_name).require(intent_name), lang);
        self.state.register_intent(intent_name, IntentKind::Plain, lang);
        parser
    }

    fn calc_intent(&self, utterance: &str, min_conf: f64, lang: Option<&str>) -> Option<MatchResult> {
        let utterance = utterance.trim();
        let candidates = self
            .engine
            .determine_intent(utterance, self.config.max_candidates, true, &self.context);
        tracing::trace!(utterance, ?lang, candidates = candidates.len(), "Determined candidates");

        // engine order is final, first candidate over the bar wins
        match candidates.into_iter().find(|c| c.confidence >= min_conf) {
            Some(candidate) => Some(self.reshape(candidate, utterance)),
            None => match self.config.no_match_policy {
                NoMatchPolicy::Absent => None,
                NoMatchPolicy::UnknownSentinel => Some(MatchResult::unknown(utterance)),
            },
        }
    }

    fn detach_intent(&mut self, intent_name: &str) {
        self.state.detach_intent(intent_name);
        tracing::debug!(intent = intent_name, "detaching intent");
        self.engine.remove_intent_parser(intent_name);
    }

    fn detach_skill(&mut self, skill_id: &str) {
        self.state.detach_skill(skill_id);
        tracing::debug!(skill = skill_id, "detaching skill");
        let names: Vec<String> = self
            .engine
            .intent_parsers()
            .into_iter()
            .filter(|p| p.name.starts_with(skill_id))
            .map(|p| p.name.clone())
            .collect();
        for intent_name in names {
            self.detach_intent(&intent_name);
        }
    }

    fn manifest(&self) -> Vec<String> {
        self.engine
            .intent_parsers()
            .into_iter()
            .map(|p| p.name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IntentStrategy;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn light_adapter() -> IntentAdapter {
        let mut adapter = IntentAdapter::new(AdapterConfig::default());
        adapter.register_entity("light", &strings(&["lamp", "light"]), None);
        adapter.register_keyword_intent(IntentDefinition::new("turn_on").require("light"), None);
        adapter
    }

    #[test]
    fn test_register_entity_defaults_to_name() {
        let mut adapter = IntentAdapter::new(AdapterConfig::default());
        adapter.register_entity("stop", &[], Some("en-us"));

        assert_eq!(adapter.entities().samples("stop"), strings(&["stop"]).as_slice());
        assert_eq!(adapter.state().entity_names(), vec!["stop"]);
    }

    #[test]
    fn test_keyword_intent_self_anchors() {
        let mut adapter = IntentAdapter::new(AdapterConfig::default());
        let parser = adapter.register_keyword_intent(IntentDefinition::new("hello"), None);

        assert_eq!(parser.requires, vec!["hello"]);
        assert_eq!(adapter.entities().samples("hello"), strings(&["hello"]).as_slice());

        let result = adapter.calc_intent("hello", 0.5, None).unwrap();
        assert_eq!(result.intent_type, "hello");
        assert_eq!(result.utterance_remainder, "");
    }

    #[test]
    fn test_calc_intent_reshapes() {
        let adapter = light_adapter();
        let result = adapter.calc_intent("  turn on the light ", 0.3, Some("en-us")).unwrap();

        assert_eq!(result.intent_type, "turn_on");
        assert_eq!(result.entities.get("light").map(String::as_str), Some("light"));
        assert_eq!(result.utterance, "turn on the light");
        assert_eq!(result.utterance_remainder, "turn on the");
        assert_eq!(result.intent_engine, "adapt");
        assert!(result.confidence >= 0.3 && result.confidence <= 1.0);
    }

    #[test]
    fn test_threshold_gate() {
        let adapter = light_adapter();
        assert!(adapter.calc_intent("turn on the light", 0.99, None).is_none());
    }

    #[test]
    fn test_multi_word_sample_does_not_hide_split_parse() {
        let mut adapter = IntentAdapter::new(AdapterConfig::default());
        adapter.register_entity("light", &strings(&["light", "kitchen light"]), None);
        adapter.register_entity("room", &strings(&["kitchen"]), None);
        adapter.register_keyword_intent(IntentDefinition::new("room_light").require("light").require("room"), None);

        let result = adapter.calc_intent("kitchen light", 0.0, None).unwrap();
        assert_eq!(result.intent_type, "room_light");
        assert_eq!(result.entities.get("light").map(String::as_str), Some("light"));
        assert_eq!(result.entities.get("room").map(String::as_str), Some("kitchen"));
        assert_eq!(result.utterance_remainder, "");
    }

    #[test]
    fn test_exact_tagging_by_default() {
        let mut adapter = IntentAdapter::new(AdapterConfig::default());
        adapter.register_intent("start_timer", &strings(&["timer"]), None);

        assert!(adapter.calc_intent_default("what time is it").is_none());
        assert!(adapter.calc_intent("what time is it", 0.0, None).is_none());
        assert_eq!(adapter.calc_intent_default("start a timer").unwrap().intent_type, "start_timer");
    }

    #[test]
    fn test_unknown_sentinel_policy() {
        let config = AdapterConfig {
            no_match_policy: NoMatchPolicy::UnknownSentinel,
            ..AdapterConfig::default()
        };
        let mut adapter = IntentAdapter::new(config);
        adapter.register_intent("hello", &[], None);

        let result = adapter.calc_intent("what time is it", 0.5, None).unwrap();
        assert!(result.is_unknown());
        assert_eq!(result.utterance_remainder, "what time is it");
    }

    #[test]
    fn test_regex_entity_unsupported_is_dropped() {
        let mut adapter = IntentAdapter::new(AdapterConfig::default());
        adapter
            .register_regex_entity("number", PatternSamples::Unsupported, None)
            .unwrap();

        assert!(!adapter.entities().contains("number"));
        assert!(adapter.state().regex_entity_names().is_empty());
    }

    #[test]
    fn test_regex_entity_bad_pattern_installs_nothing() {
        let mut adapter = IntentAdapter::new(AdapterConfig::default());
        let samples = PatternSamples::Many(strings(&[r"(?P<n>\d+)", r"(unclosed"]));
        let err = adapter.register_regex_entity("number", samples, None).unwrap_err();

        assert!(matches!(err, AdapterError::InvalidPattern { ref entity, .. } if entity == "number"));
        assert!(adapter.entities().patterns("number").is_empty());
        assert!(adapter.engine().tag("5 apples").is_empty());
    }

    #[test]
    fn test_regex_intent() {
        let mut adapter = IntentAdapter::new(AdapterConfig::default());
        let parser = adapter
            .register_regex_intent("set_timer", r"(?P<TimerDuration>\d+ minutes)".into(), None)
            .unwrap();

        assert_eq!(parser.requires, vec!["set_timer"]);
        assert_eq!(adapter.state().intent_kind("set_timer"), Some(IntentKind::Regex));

        let result = adapter.calc_intent("set timer for 5 minutes", 0.5, None).unwrap();
        assert_eq!(result.intent_type, "set_timer");
        assert_eq!(result.entities.get("TimerDuration").map(String::as_str), Some("5 minutes"));
        assert_eq!(result.utterance_remainder, "set timer for");
    }

    #[test]
    fn test_plain_intent() {
        let mut adapter = IntentAdapter::new(AdapterConfig::default());
        adapter.register_intent("greet", &strings(&["hello", "good morning"]), None);

        let result = adapter.calc_intent("good morning", 0.5, None).unwrap();
        assert_eq!(result.intent_type, "greet");
        assert_eq!(result.entities.get("greet").map(String::as_str), Some("good morning"));
        assert_eq!(adapter.state().intent_kind("greet"), Some(IntentKind::Plain));
    }

    #[test]
    fn test_excluded_keyword_blocks_match() {
        let mut adapter = light_adapter();
        adapter.register_entity("off", &[], None);
        adapter.register_keyword_intent(IntentDefinition::new("turn_on").require("light").exclude("off"), None);

        assert!(adapter.calc_intent("turn the light off", 0.3, None).is_none());
        assert!(adapter.calc_intent("turn on the light", 0.3, None).is_some());
    }

    #[test]
    fn test_context_fills_missing_entity() {
        let mut adapter = IntentAdapter::new(AdapterConfig::default());
        adapter.register_entity("light", &[], None);
        adapter.register_entity("kitchen", &[], None);
        adapter.register_keyword_intent(IntentDefinition::new("room_light").require("light").require("kitchen"), None);

        assert!(adapter.calc_intent("light", 0.3, None).is_none());
        adapter.context_mut().inject("kitchen", "kitchen");
        let result = adapter.calc_intent("light", 0.3, None).unwrap();
        assert_eq!(result.entities.get("kitchen").map(String::as_str), Some("kitchen"));
    }

    #[test]
    fn test_detach_intent() {
        let mut adapter = light_adapter();
        adapter.detach_intent("turn_on");
        adapter.detach_intent("turn_on");
        adapter.detach_intent("never_registered");

        assert!(adapter.manifest().is_empty());
        assert!(adapter.state().intent_names().is_empty());
        assert!(adapter.calc_intent("turn on the light", 0.3, None).is_none());
    }

    #[test]
    fn test_detach_skill() {
        let mut adapter = IntentAdapter::new(AdapterConfig::default());
        adapter.register_keyword_intent(IntentDefinition::new("alarm:set"), None);
        adapter.register_keyword_intent(IntentDefinition::new("alarmclock:delete"), None);
        adapter.register_keyword_intent(IntentDefinition::new("weather:today"), None);

        adapter.detach_skill("alarm");
        assert_eq!(adapter.manifest(), strings(&["weather:today"]));
        assert_eq!(adapter.state().intent_names(), vec!["weather:today"]);
    }

    #[test]
    fn test_calc_intents_remainder_strategy() {
        let config = AdapterConfig {
            strategy: IntentStrategy::SegmentRemainder,
            ..AdapterConfig::default()
        };
        let mut adapter = IntentAdapter::new(config);
        adapter.register_entity("light", &[], None);
        adapter.register_entity("timer", &[], None);
        adapter.register_keyword_intent(IntentDefinition::new("turn_on").require("light"), None);
        adapter.register_keyword_intent(IntentDefinition::new("start_timer").require("timer"), None);

        let results = adapter.calc_intents("light and timer", 0.5, None);
        let names: Vec<&str> = results.iter().map(|r| r.intent_type.as_str()).collect();
        assert_eq!(names, vec!["turn_on", "start_timer"]);

        // "light timer" has no marker: the second intent comes from the remainder
        let results = adapter.calc_intents("light timer", 0.5, None);
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_calc_intents_single() {
        let config = AdapterConfig {
            strategy: IntentStrategy::SingleIntent,
            ..AdapterConfig::default()
        };
        let mut adapter = IntentAdapter::new(config);
        adapter.register_intent("light", &[], None);
        adapter.register_intent("timer", &[], None);

        assert_eq!(adapter.calc_intents("light and timer", 0.3, None).len(), 1);
    }

    #[test]
    fn test_reset() {
        let mut adapter = light_adapter();
        adapter.reset();
        assert!(adapter.manifest().is_empty());
        assert!(!adapter.entities().contains("light"));
    }
}
