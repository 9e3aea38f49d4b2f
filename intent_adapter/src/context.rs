//! Conversational context: entity values that can satisfy a requirement
//! the current utterance leaves open

use crate::types::Tag;

#[derive(Debug, Default, Clone)]
pub struct ContextManager {
    frames: Vec<Tag>,
}

impl ContextManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `entity` to `value`, replacing any earlier value for it.
    /// The most recent injection is consulted first.
    pub fn inject(&mut self, entity: &str, value: &str) {
        self.remove(entity);
        self.frames.insert(0, Tag::context(entity, value));
    }

    pub fn remove(&mut self, entity: &str) {
        self.frames.retain(|t| t.entity != entity);
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn tags(&self) -> &[Tag] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
