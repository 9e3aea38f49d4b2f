//! Python bindings for the intent adapter using PyO3

use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};
use crate::adapter::IntentAdapter;
use crate::config::AdapterConfig;
use crate::extractor::IntentExtractor;
use crate::skill::SkillVocabulary;
use crate::types::{IntentDefinition, MatchResult, PatternSamples};

fn to_py_err(err: crate::error::AdapterError) -> PyErr {
    PyErr::new::<pyo3::exceptions::PyValueError, _>(err.to_string())
}

/// A str is one pattern, a list of str is many, anything else is ignored.
fn pattern_samples(samples: &Bound<'_, PyAny>) -> PatternSamples {
    if let Ok(pattern) = samples.extract::<String>() {
        return PatternSamples::One(pattern);
    }
    if samples.is_instance_of::<PyList>() {
        if let Ok(patterns) = samples.extract::<Vec<String>>() {
            return PatternSamples::Many(patterns);
        }
    }
    PatternSamples::Unsupported
}

fn result_to_dict<'py>(py: Python<'py>, result: MatchResult) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new_bound(py);
    dict.set_item("intent_type", result.intent_type)?;
    dict.set_item("conf", result.confidence)?;
    dict.set_item("entities", result.entities)?;
    dict.set_item("utterance", result.utterance)?;
    dict.set_item("utterance_remainder", result.utterance_remainder)?;
    dict.set_item("intent_engine", result.intent_engine)?;
    Ok(dict)
}

/// Python wrapper for the intent adapter
#[pyclass]
pub struct PyIntentAdapter {
    adapter: IntentAdapter,
}

#[pymethods]
impl PyIntentAdapter {
    /// Optional JSON config string
    #[new]
    #[pyo3(signature = (config=None))]
    fn new(config: Option<&str>) -> PyResult<Self> {
        let config = match config {
            Some(content) => AdapterConfig::from_json_str(content).map_err(to_py_err)?,
            None => AdapterConfig::default(),
        };
        Ok(Self {
            adapter: IntentAdapter::new(config),
        })
    }

    #[pyo3(signature = (entity_name, samples=None, lang=None))]
    fn register_entity(&mut self, entity_name: &str, samples: Option<Vec<String>>, lang: Option<&str>) {
        self.adapter
            .register_entity(entity_name, &samples.unwrap_or_default(), lang);
    }

    #[pyo3(signature = (entity_name, samples, lang=None))]
    fn register_regex_entity(&mut self, entity_name: &str, samples: &Bound<'_, PyAny>, lang: Option<&str>) -> PyResult<()> {
        self.adapter
            .register_regex_entity(entity_name, pattern_samples(samples), lang)
            .map_err(to_py_err)
    }

    #[pyo3(signature = (intent_name, samples, lang=None))]
    fn register_regex_intent(&mut self, intent_name: &str, samples: &Bound<'_, PyAny>, lang: Option<&str>) -> PyResult<()> {
        self.adapter
            .register_regex_intent(intent_name, pattern_samples(samples), lang)
            .map(|_| ())
            .map_err(to_py_err)
    }

    #[pyo3(signature = (intent_name, keywords=None, optional=None, at_least_one=None, excluded=None, lang=None))]
    fn register_keyword_intent(
        &mut self,
        intent_name: &str,
        keywords: Option<Vec<String>>,
        optional: Option<Vec<String>>,
        at_least_one: Option<Vec<Vec<String>>>,
        excluded: Option<Vec<String>>,
        lang: Option<&str>,
    ) -> Vec<String> {
        let definition = IntentDefinition {
            name: intent_name.to_string(),
            keywords: keywords.unwrap_or_default(),
            optional: optional.unwrap_or_default(),
            at_least_one: at_least_one.unwrap_or_default(),
            excluded: excluded.unwrap_or_default(),
        };
        self.adapter.register_keyword_intent(definition, lang).requires
    }

    #[pyo3(signature = (intent_name, samples=None, lang=None))]
    fn register_intent(&mut self, intent_name: &str, samples: Option<Vec<String>>, lang: Option<&str>) {
        self.adapter
            .register_intent(intent_name, &samples.unwrap_or_default(), lang);
    }

    /// Load a skill vocabulary JSON document, returning the intent names
    fn load_skill(&mut self, vocab: &str) -> PyResult<Vec<String>> {
        let vocab = SkillVocabulary::from_json_str(vocab).map_err(to_py_err)?;
        self.adapter.load_skill(&vocab).map_err(to_py_err)
    }

    #[pyo3(signature = (utterance, min_conf=0.5, lang=None))]
    fn calc_intent<'py>(&self, py: Python<'py>, utterance: &str, min_conf: f64, lang: Option<&str>) -> PyResult<Option<Bound<'py, PyDict>>> {
        self.adapter
            .calc_intent(utterance, min_conf, lang)
            .map(|result| result_to_dict(py, result))
            .transpose()
    }

    #[pyo3(signature = (utterance, min_conf=0.5, lang=None))]
    fn calc_intents<'py>(&self, py: Python<'py>, utterance: &str, min_conf: f64, lang: Option<&str>) -> PyResult<Vec<Bound<'py, PyDict>>> {
        self.adapter
            .calc_intents(utterance, min_conf, lang)
            .into_iter()
            .map(|result| result_to_dict(py, result))
            .collect()
    }

    fn inject_context(&mut self, entity: &str, value: &str) {
        self.adapter.context_mut().inject(entity, value);
    }

    fn detach_intent(&mut self, intent_name: &str) {
        self.adapter.detach_intent(intent_name);
    }

    fn detach_skill(&mut self, skill_id: &str) {
        self.adapter.detach_skill(skill_id);
    }

    fn manifest(&self) -> Vec<String> {
        self.adapter.manifest()
    }

    /// Names of every entity with samples or patterns, sorted
    fn entity_names(&self) -> Vec<String> {
        self.adapter.entities().entity_names()
    }

    fn intent_lang(&self, intent_name: &str) -> Option<String> {
        self.adapter.state().intent_lang(intent_name).map(str::to_string)
    }

    /// Drop all registered vocabulary
    fn clear(&mut self) {
        self.adapter.reset();
    }

    fn __len__(&self) -> usize {
        self.adapter.manifest().len()
    }
}
