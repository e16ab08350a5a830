//! The trained artifact a card describes.

use crate::analyzers::{ModelArtifact, StructureDumper};
use crate::error::CardError;
use crate::sanitize::sanitize_owned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// The only framework whose architecture dump is ingested.
pub const TENSORFLOW: &str = "tensorflow";

/// A single key/value measurement, e.g. one ranked feature importance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    key: String,
    value: String,
}

impl Metric {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Provenance and performance of a trained model.
///
/// `model_structure` holds a sanitized architecture dump: it never contains
/// `null` or empty containers as long as it is set through
/// [`AIModel::set_model_structure`] or [`AIModel::populate_model_structure`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AIModel {
    pub name: String,
    pub version: String,
    pub description: String,
    pub owner: String,
    pub location: String,
    pub license: String,
    pub framework: String,
    pub model_type: String,
    pub test_accuracy: f64,
    pub model_structure: Value,
    pub metrics: BTreeMap<String, String>,
}

impl Default for AIModel {
    fn default() -> Self {
        Self {
            name: String::new(),
            version: String::new(),
            description: String::new(),
            owner: String::new(),
            location: String::new(),
            license: String::new(),
            framework: String::new(),
            model_type: String::new(),
            test_accuracy: 0.0,
            model_structure: empty_structure(),
            metrics: BTreeMap::new(),
        }
    }
}

fn empty_structure() -> Value {
    Value::Object(Map::new())
}

impl AIModel {
    /// Insert or overwrite a performance metric.
    pub fn add_metric(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metrics.insert(key.into(), value.into());
    }

    pub fn is_tensorflow(&self) -> bool {
        self.framework == TENSORFLOW
    }

    /// Store a raw architecture dump after sanitizing it.
    pub fn set_model_structure(&mut self, raw: Value) {
        self.model_structure = sanitize_owned(raw);
    }

    /// Fill `model_structure` from the trained model.
    ///
    /// Only tensorflow models have a dump; for any other framework the
    /// structure is reset to `{}` and the dumper is never called.
    pub async fn populate_model_structure<D>(
        &mut self,
        dumper: &D,
        trained_model: &ModelArtifact,
    ) -> Result<(), CardError>
    where
        D: StructureDumper + ?Sized,
    {
        if !self.is_tensorflow() {
            debug!(framework = %self.framework, "no structure dump for framework");
            self.model_structure = empty_structure();
            return Ok(());
        }
        let raw = dumper.dump_structure(trained_model).await?;
        self.set_model_structure(raw);
        Ok(())
    }
}
