//! Model card schema validation.
//!
//! The schema ships inside the library (`schema/schema.json`) and is
//! compiled once per process. A schema that will not parse or compile is a
//! broken installation and comes back as [`CardError::SchemaConfiguration`];
//! a document that does not conform is an ordinary, reported `false`.

use crate::error::CardError;
use serde_json::Value;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Raw text of the bundled model card schema.
pub const BUNDLED_SCHEMA: &str = include_str!("../schema/schema.json");

static BUNDLED: LazyLock<Result<SchemaValidator, String>> =
    LazyLock::new(|| SchemaValidator::from_json_str(BUNDLED_SCHEMA).map_err(|e| e.to_string()));

/// A compiled JSON Schema.
pub struct SchemaValidator {
    validator: jsonschema::Validator,
}

impl std::fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidator").finish_non_exhaustive()
    }
}

impl SchemaValidator {
    /// The process-wide validator for the bundled schema.
    pub fn bundled() -> Result<&'static SchemaValidator, CardError> {
        BUNDLED.as_ref().map_err(|e| CardError::schema(e.clone()))
    }

    /// Compile a schema from its JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, CardError> {
        let schema: Value = serde_json::from_str(text)
            .map_err(|e| CardError::schema(format!("schema is not valid JSON: {e}")))?;
        Self::from_value(&schema)
    }

    /// Compile an already parsed schema document.
    pub fn from_value(schema: &Value) -> Result<Self, CardError> {
        let validator = jsonschema::validator_for(schema)
            .map_err(|e| CardError::schema(format!("schema does not compile: {e}")))?;
        Ok(Self { validator })
    }

    /// Load and compile a schema file. A missing or unreadable file is an
    /// I/O error; unparsable content is a schema configuration error.
    pub fn from_file(path: &Path) -> Result<Self, CardError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Message of the first violation, or `None` when `document` conforms.
    pub fn first_violation(&self, document: &Value) -> Option<String> {
        match self.validator.validate(document) {
            Ok(()) => None,
            Err(err) => {
                debug!(error = %err, "schema violation");
                Some(err.to_string())
            }
        }
    }

    /// Check `document`; the first violation is reported and yields `false`.
    pub fn validate(&self, document: &Value) -> bool {
        match self.first_violation(document) {
            None => true,
            Some(message) => {
                warn!("{message}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal_card() -> Value {
        json!({
            "name": "IrisNet",
            "version": "0.1",
            "short_description": "Iris classifier",
            "full_description": "Classifies iris flowers",
            "keywords": "iris, flowers",
            "author": "d2i",
            "input_type": "tabular",
            "category": "classification",
            "ai_model": {
                "name": "iris-dnn",
                "version": "0.1",
                "description": "Dense network",
                "owner": "d2i",
                "location": "https://example.org/iris.keras",
                "license": "BSD-3-Clause",
                "framework": "tensorflow",
                "model_type": "dnn",
                "test_accuracy": 0.93
            }
        })
    }

    #[test]
    fn test_bundled_schema_compiles() {
        assert!(SchemaValidator::bundled().is_ok());
    }

    #[test]
    fn test_minimal_card_conforms() {
        let v = SchemaValidator::bundled().unwrap();
        assert!(v.validate(&minimal_card()));
    }

    #[test]
    fn test_missing_required_field_reports_violation() {
        let v = SchemaValidator::bundled().unwrap();
        let mut card = minimal_card();
        card.as_object_mut().unwrap().remove("author");
        let msg = v.first_violation(&card).unwrap();
        assert!(msg.contains("author"), "unexpected message: {msg}");
        assert!(!v.validate(&card));
    }

    #[test]
    fn test_enum_violation() {
        let v = SchemaValidator::bundled().unwrap();
        let mut card = minimal_card();
        card["category"] = json!("astrology");
        assert!(!v.validate(&card));
    }

    #[test]
    fn test_wrong_nested_type() {
        let v = SchemaValidator::bundled().unwrap();
        let mut card = minimal_card();
        card["ai_model"]["test_accuracy"] = json!("high");
        assert!(!v.validate(&card));
    }

    #[test]
    fn test_malformed_schema_is_configuration_error() {
        let err = SchemaValidator::from_json_str("{ not json").unwrap_err();
        assert!(err.is_schema_configuration());

        let err = SchemaValidator::from_value(&json!({"type": 12})).unwrap_err();
        assert!(err.is_schema_configuration());
    }

    #[test]
    fn test_missing_schema_file_is_io_error() {
        let err = SchemaValidator::from_file(Path::new("/nonexistent/schema.json")).unwrap_err();
        assert!(matches!(err, CardError::Io(_)));
    }
}
