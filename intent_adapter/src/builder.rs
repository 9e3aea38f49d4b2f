//! Intent parser builder
//!
//! Translates an [`IntentDefinition`] into the [`IntentParser`] the
//! matching engine installs.

use crate::types::IntentDefinition;
use serde::{Deserialize, Serialize};

/// Compiled intent, as installed in a matching engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentParser {
    pub name: String,
    pub requires: Vec<String>,
    pub optional: Vec<String>,
    pub at_least_one: Vec<Vec<String>>,
    pub excluded: Vec<String>,
}

impl IntentParser {
    /// Every entity name this parser can bind.
    pub fn entity_names(&self) -> impl Iterator<Item = &str> {
        self.requires
            .iter()
            .chain(self.optional.iter())
            .chain(self.at_least_one.iter().flatten())
            .map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct IntentBuilder {
    name: String,
    requires: Vec<String>,
    optional: Vec<String>,
    at_least_one: Vec<Vec<String>>,
    excluded: Vec<String>,
}

impl IntentBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requires: Vec::new(),
            optional: Vec::new(),
            at_least_one: Vec::new(),
            excluded: Vec::new(),
        }
    }

    /// Builder for a definition whose keyword list has already been
    /// anchored (see `IntentAdapter::register_keyword_intent`).
    pub fn from_definition(definition: &IntentDefinition) -> Self {
        let mut builder = Self::new(definition.name.clone());
        for kw in &definition.keywords {
            builder = builder.require(kw.clone());
        }
        for kw in &definition.optional {
            builder = builder.optionally(kw.clone());
        }
        for group in &definition.at_least_one {
            builder = builder.one_of(group.iter().cloned());
        }
        for kw in &definition.excluded {
            builder = builder.exclude(kw.clone());
        }
        builder
    }

    pub fn require(mut self, entity: impl Into<String>) -> Self {
        push_unique(&mut self.requires, entity.into());
        self
    }

    pub fn optionally(mut self, entity: impl Into<String>) -> Self {
        push_unique(&mut self.optional, entity.into());
        self
    }

    /// Empty groups are ignored: they could never be satisfied.
    pub fn one_of<I, S>(mut self, group: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut members = Vec::new();
        for entity in group {
            push_unique(&mut members, entity.into());
        }
        if !members.is_empty() {
            self.at_least_one.push(members);
        }
        self
    }

    pub fn exclude(mut self, entity: impl Into<String>) -> Self {
        push_unique(&mut self.excluded, entity.into());
        self
    }

    pub fn build(self) -> IntentParser {
        // a required entity is never also optional
        let optional = self
            .optional
            .into_iter()
            .filter(|kw| !self.requires.contains(kw))
            .collect();

        IntentParser {
            name: self.name,
            requires: self.requires,
            optional,
            at_least_one: self.at_least_one,
            excluded: self.excluded,
        }
    }
}

fn push_unique(items: &mut Vec<String>, item: String) {
    if !items.contains(&item) {
        items.push(item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_from_definition() {
        let definition = IntentDefinition::new("alarm:set")
            .require("alarm")
            .require("set")
            .optionally("time")
            .one_of(["morning", "evening"])
            .exclude("cancel");

        let parser = IntentBuilder::from_definition(&definition).build();

        assert_eq!(parser.name, "alarm:set");
        assert_eq!(parser.requires, vec!["alarm", "set"]);
        assert_eq!(parser.optional, vec!["time"]);
        assert_eq!(parser.at_least_one, vec![vec!["morning".to_string(), "evening".to_string()]]);
        assert_eq!(parser.excluded, vec!["cancel"]);
    }

    #[test]
    fn test_duplicates_collapse() {
        let parser = IntentBuilder::new("turn_on")
            .require("light")
            .require("light")
            .optionally("light")
            .optionally("room")
            .one_of(Vec::<String>::new())
            .build();

        assert_eq!(parser.requires, vec!["light"]);
        assert_eq!(parser.optional, vec!["room"]);
        assert!(parser.at_least_one.is_empty());
        assert_eq!(
            parser.entity_names().collect::<Vec<_>>(),
            vec!["light", "room"]
        );
    }
}
