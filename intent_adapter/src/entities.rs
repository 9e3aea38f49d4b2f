//! Entity registry: the adapter's own record of literal and regex entities

use ahash::AHashMap;

/// Literal samples and regex patterns registered per entity name.
///
/// Registration is additive: samples for an existing name are merged in,
/// never replaced. Nothing is removed except by [`EntityRegistry::clear`].
#[derive(Debug, Default, Clone)]
pub struct EntityRegistry {
    samples: AHashMap<String, Vec<String>>,
    patterns: AHashMap<String, Vec<String>>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `samples` into the entity, keeping first-seen order.
    /// Returns the samples that were not known before.
    pub fn add_samples(&mut self, entity_name: &str, samples: &[String]) -> Vec<String> {
        let known = self.samples.entry(entity_name.to_string()).or_default();
        let mut added = Vec::new();
        for sample in samples {
            if !known.contains(sample) {
                known.push(sample.clone());
                added.push(sample.clone());
            }
        }
        added
    }

    pub fn add_patterns(&mut self, entity_name: &str, patterns: &[String]) {
        let known = self.patterns.entry(entity_name.to_string()).or_default();
        for pattern in patterns {
            if !known.contains(pattern) {
                known.push(pattern.clone());
            }
        }
    }

    pub fn samples(&self, entity_name: &str) -> &[String] {
        self.samples.get(entity_name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn patterns(&self, entity_name: &str) -> &[String] {
        self.patterns.get(entity_name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, entity_name: &str) -> bool {
        self.samples.contains_key(entity_name) || self.patterns.contains_key(entity_name)
    }

    /// Sorted names of every literal and regex entity.
    pub fn entity_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .samples
            .keys()
            .chain(self.patterns.keys())
            .cloned()
            .collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.patterns.clear();
    }
}
