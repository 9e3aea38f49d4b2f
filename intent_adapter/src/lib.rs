//! Intent adapter - keyword and regex intent extraction
//!
//! Registers entities and keyword/regex intents, matches utterances
//! against them, and reshapes the winning match into the result contract
//! shared with other intent-extraction strategies.

pub mod types;
pub mod error;
pub mod config;
pub mod entities;
pub mod similarity;
pub mod builder;
pub mod context;
pub mod matcher;
pub mod engine;
pub mod extractor;
pub mod adapter;
pub mod skill;

pub use types::*;
pub use error::{AdapterError, Result};
pub use config::{AdapterConfig, IntentPriority, IntentStrategy, NoMatchPolicy};
pub use entities::EntityRegistry;
pub use builder::{IntentBuilder, IntentParser};
pub use context::ContextManager;
pub use engine::{KeywordEngine, MatchingEngine};
pub use extractor::{get_utterance_remainder, ExtractorState, IntentExtractor, IntentKind};
pub use adapter::IntentAdapter;
pub use skill::SkillVocabulary;

// Python bindings
#[cfg(feature = "python")]
pub mod py;

#[cfg(feature = "python")]
use pyo3::prelude::*;

#[cfg(feature = "python")]
#[pymodule]
fn intent_adapter(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<py::PyIntentAdapter>()?;
    m.add("INTENT_ENGINE", types::INTENT_ENGINE)?;
    Ok(())
}
