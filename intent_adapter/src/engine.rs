//! Matching engine - tags utterances and ranks installed intent parsers
//!
//! [`MatchingEngine`] is the seam the adapter talks to; [`KeywordEngine`]
//! is the default implementation: exact and fuzzy keyword tagging plus
//! regex tagging, validated per parser by [`crate::matcher`].

use crate::builder::IntentParser;
use crate::context::ContextManager;
use crate::matcher::match_parser;
use crate::similarity::keyword_similarity;
use crate::types::{Candidate, Tag, TagSource};
use ahash::AHashMap;
use regex::Regex;
use std::collections::BTreeMap;

/// Windows shorter than this (in characters) are only tagged exactly.
const MIN_FUZZY_CHARS: usize = 4;

pub trait MatchingEngine {
    /// Associate one literal sample with an entity.
    fn register_entity(&mut self, sample: &str, entity_name: &str);

    /// Install a compiled pattern for an entity. Named capture groups
    /// become entity bindings when the pattern matches.
    fn register_regex_entity(&mut self, entity_name: &str, pattern: Regex);

    /// Install a parser, replacing any parser with the same name in place.
    fn register_intent_parser(&mut self, parser: IntentParser);

    /// Candidates for `utterance`, best first. Ties keep installation order.
    fn determine_intent(
        &self,
        utterance: &str,
        max_candidates: usize,
        include_tags: bool,
        context: &ContextManager,
    ) -> Vec<Candidate>;

    /// Installed parsers in installation order.
    fn intent_parsers(&self) -> Vec<&IntentParser>;

    fn remove_intent_parser(&mut self, name: &str) -> Option<IntentParser>;

    /// Drop every entity, pattern and parser.
    fn clear(&mut self);
}

#[derive(Debug, Clone)]
struct Token {
    norm: String,
    start: usize,
    end: usize,
}

pub struct KeywordEngine {
    /// normalized sample -> entity names
    keywords: AHashMap<String, Vec<String>>,
    /// normalized sample -> token count, for fuzzy comparison
    sample_tokens: AHashMap<String, usize>,
    max_tokens: usize,
    regexes: Vec<(String, Regex)>,
    parsers: AHashMap<String, (u64, IntentParser)>,
    order: BTreeMap<u64, String>,
    next_seq: u64,
    fuzzy_threshold: f64,
    token_pattern: Regex,
}

impl KeywordEngine {
    pub fn new(fuzzy_threshold: f64) -> Self {
        Self {
            keywords: AHashMap::new(),
            sample_tokens: AHashMap::new(),
            max_tokens: 0,
            regexes: Vec::new(),
            parsers: AHashMap::new(),
            order: BTreeMap::new(),
            next_seq: 0,
            fuzzy_threshold,
            // constant pattern, never fails
            token_pattern: Regex::new(r"[\w']+").expect("Invalid token pattern"),
        }
    }

    fn tokenize(&self, text: &str) -> Vec<Token> {
        self.token_pattern
            .find_iter(text)
            .map(|m| Token {
                norm: m.as_str().to_lowercase(),
                start: m.start(),
                end: m.end(),
            })
            .collect()
    }

    fn normalize(&self, text: &str) -> String {
        self.tokenize(text)
            .into_iter()
            .map(|t| t.norm)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Every entity occurrence in `utterance`, ordered by position.
    pub fn tag(&self, utterance: &str) -> Vec<Tag> {
        let mut tags = self.keyword_tags(utterance);
        tags.extend(self.regex_tags(utterance));
        tags.sort_by(|a, b| (a.start, a.end).cmp(&(b.start, b.end)));
        tags
    }

    fn keyword_tags(&self, utterance: &str) -> Vec<Tag> {
        let tokens = self.tokenize(utterance);
        let mut tags = Vec::new();

        for i in 0..tokens.len() {
            for n in 1..=self.max_tokens.min(tokens.len() - i) {
                let window = tokens[i..i + n]
                    .iter()
                    .map(|t| t.norm.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                let (start, end) = (tokens[i].start, tokens[i + n - 1].end);
                let text = &utterance[start..end];

                if let Some(entities) = self.keywords.get(&window) {
                    for entity in entities {
                        tags.push(Tag::keyword(entity, text, start, end, 1.0));
                    }
                    continue;
                }

                for (entity, score) in self.fuzzy_entities(&window, n) {
                    tags.push(Tag::keyword(&entity, text, start, end, score));
                }
            }
        }

        tags
    }

    /// Best fuzzy score per entity for a window with no exact hit.
    fn fuzzy_entities(&self, window: &str, n_tokens: usize) -> Vec<(String, f64)> {
        if self.fuzzy_threshold >= 1.0 || window.chars().count() < MIN_FUZZY_CHARS {
            return Vec::new();
        }

        let mut best: BTreeMap<String, f64> = BTreeMap::new();
        for (sample, count) in &self.sample_tokens {
            if *count != n_tokens {
                continue;
            }
            let score = keyword_similarity(window, sample);
            if score < self.fuzzy_threshold {
                continue;
            }
            for entity in self.keywords.get(sample).into_iter().flatten() {
                let slot = best.entry(entity.clone()).or_insert(0.0);
                if score > *slot {
                    *slot = score;
                }
            }
        }
        best.into_iter().collect()
    }

    fn regex_tags(&self, utterance: &str) -> Vec<Tag> {
        let mut tags = Vec::new();
        for (entity, pattern) in &self.regexes {
            for caps in pattern.captures_iter(utterance) {
                let Some(whole) = caps.get(0) else { continue };
                if whole.as_str().is_empty() {
                    continue;
                }
                let captures = pattern
                    .capture_names()
                    .flatten()
                    .filter_map(|name| caps.name(name).map(|g| (name.to_string(), g.as_str().to_string())))
                    .collect();
                tags.push(Tag {
                    entity: entity.clone(),
                    text: whole.as_str().to_string(),
                    start: whole.start(),
                    end: whole.end(),
                    confidence: 1.0,
                    source: TagSource::Regex,
                    captures,
                });
            }
        }
        tags
    }
}

impl Default for KeywordEngine {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl MatchingEngine for KeywordEngine {
    fn register_entity(&mut self, sample: &str, entity_name: &str) {
        let norm = self.normalize(sample);
        if norm.is_empty() {
            tracing::debug!(sample, entity = entity_name, "Ignoring sample without word characters");
            return;
        }

        let count = norm.split(' ').count();
        self.max_tokens = self.max_tokens.max(count);
        self.sample_tokens.insert(norm.clone(), count);

        let entities = self.keywords.entry(norm).or_default();
        if !entities.iter().any(|e| e == entity_name) {
            entities.push(entity_name.to_string());
        }
    }

    fn register_regex_entity(&mut self, entity_name: &str, pattern: Regex) {
        let exists = self
            .regexes
            .iter()
            .any(|(e, p)| e == entity_name && p.as_str() == pattern.as_str());
        if !exists {
            self.regexes.push((entity_name.to_string(), pattern));
        }
    }

    fn register_intent_parser(&mut self, parser: IntentParser) {
        if let Some((_, existing)) = self.parsers.get_mut(&parser.name) {
            *existing = parser;
            return;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, parser.name.clone());
        self.parsers.insert(parser.name.clone(), (seq, parser));
    }

    fn determine_intent(
        &self,
        utterance: &str,
        max_candidates: usize,
        include_tags: bool,
        context: &ContextManager,
    ) -> Vec<Candidate> {
        let tags = self.tag(utterance);
        tracing::trace!(utterance, tags = tags.len(), "Tagged utterance");

        let mut candidates: Vec<Candidate> = self
            .intent_parsers()
            .into_iter()
            .filter_map(|parser| {
                let matched = match_parser(parser, &tags, context.tags(), utterance)?;
                let mut bindings = BTreeMap::new();
                for tag in &matched.used {
                    for (entity, value) in tag.bindings() {
                        bindings.entry(entity).or_insert(value);
                    }
                }
                tracing::trace!(intent = %parser.name, confidence = matched.confidence, "Candidate");
                Some(Candidate {
                    intent_type: parser.name.clone(),
                    confidence: matched.confidence,
                    bindings,
                    tags: include_tags.then_some(matched.used),
                })
            })
            .collect();

        // stable: equal confidences keep installation order
        candidates.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(max_candidates);
        candidates
    }

    fn intent_parsers(&self) -> Vec<&IntentParser> {
        self.order
            .values()
            .filter_map(|name| self.parsers.get(name).map(|(_, p)| p))
            .collect()
    }

    fn remove_intent_parser(&mut self, name: &str) -> Option<IntentParser> {
        let (seq, parser) = self.parsers.remove(name)?;
        self.order.remove(&seq);
        Some(parser)
    }

    fn clear(&mut self) {
        self.keywords.clear();
        self.sample_tokens.clear();
        self.max_tokens = 0;
        self.regexes.clear();
        self.parsers.clear();
        self.order.clear();
    }
}
