//! Model Card — the aggregate root.
//!
//! A card is built from its required descriptive fields, then enriched by
//! the `populate_*` operations (each backed by an external collaborator), and
//! finally validated, saved or submitted. All three terminal operations work
//! on the same canonical encoding.

pub mod analysis;
pub mod model;

pub use analysis::{BiasAnalysis, ExplainabilityAnalysis};
pub use model::{AIModel, Metric, TENSORFLOW};

use crate::analyzers::{
    BiasAnalyzer, BiasRequest, DependencyInspector, ExplainabilityAnalyzer, XaiRequest,
};
use crate::encode::{to_canonical_string, to_canonical_value};
use crate::error::CardError;
use crate::persistence;
use crate::registry::RegistryClient;
use crate::schema::SchemaValidator;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

/// Packages that belong to the card toolkit's own analysis stack and are
/// never listed as model requirements.
pub const EXCLUDED_PACKAGES: [&str; 2] = ["shap", "fairlearn"];

/// Structured metadata for one trained model.
///
/// Construct with a struct literal and `..Default::default()`; the eight
/// descriptive strings before `input_data` are required by the schema and
/// must be present when a card is deserialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelCard {
    pub name: String,
    pub version: String,
    pub short_description: String,
    pub full_description: String,
    pub keywords: String,
    pub author: String,
    pub input_type: String,
    pub category: String,
    #[serde(default)]
    pub input_data: String,
    #[serde(default)]
    pub output_data: String,
    #[serde(default)]
    pub foundational_model: String,
    #[serde(default)]
    pub ai_model: Option<AIModel>,
    #[serde(default)]
    pub bias_analysis: Option<BiasAnalysis>,
    #[serde(default)]
    pub xai_analysis: Option<ExplainabilityAnalysis>,
    #[serde(default)]
    pub model_requirements: Option<Vec<String>>,
}

impl ModelCard {
    /// Canonical JSON text of the whole card.
    ///
    /// Fails with [`CardError::InvalidInput`] if a float field is NaN or
    /// infinite, since JSON has no encoding for those.
    pub fn to_json(&self) -> Result<String, CardError> {
        self.check_finite()?;
        to_canonical_string(self)
    }

    /// The canonical encoding, parsed back into a JSON tree.
    pub fn to_value(&self) -> Result<Value, CardError> {
        self.check_finite()?;
        to_canonical_value(self)
    }

    fn check_finite(&self) -> Result<(), CardError> {
        let mut floats = Vec::with_capacity(3);
        if let Some(ai_model) = &self.ai_model {
            floats.push(("ai_model.test_accuracy", ai_model.test_accuracy));
        }
        if let Some(bias) = &self.bias_analysis {
            floats.push((
                "bias_analysis.demographic_parity_difference",
                bias.demographic_parity_difference(),
            ));
            floats.push((
                "bias_analysis.equal_odds_difference",
                bias.equal_odds_difference(),
            ));
        }
        match floats.into_iter().find(|(_, v)| !v.is_finite()) {
            Some((field, v)) => Err(CardError::invalid_input(format!(
                "{field} is {v}, which has no JSON encoding"
            ))),
            None => Ok(()),
        }
    }

    /// Check the card against the bundled schema.
    ///
    /// Non-conformance is reported and returns `Ok(false)`. Only a broken
    /// bundled schema is an `Err`.
    pub fn validate(&self) -> Result<bool, CardError> {
        let validator = SchemaValidator::bundled()?;
        Ok(self.validate_with(validator))
    }

    /// Check the card against a caller-supplied schema.
    pub fn validate_with(&self, validator: &SchemaValidator) -> bool {
        match self.to_value() {
            Ok(document) => validator.validate(&document),
            Err(e) => {
                warn!("An unexpected error occurred: {e}");
                false
            }
        }
    }

    /// Write the canonical JSON to `path`, replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<(), CardError> {
        let text = self.to_json()?;
        persistence::atomic_write(path, text.as_bytes())?;
        info!(path = %path.display(), card = %self.name, "Saved model card");
        Ok(())
    }

    /// Read a card previously written by [`ModelCard::save`].
    pub fn load(path: &Path) -> Result<Self, CardError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Validate and POST the card to a registry with a default client.
    ///
    /// See [`RegistryClient::submit`].
    pub async fn submit(&self, endpoint: &str) -> Result<Option<Value>, CardError> {
        RegistryClient::new()?.submit(self, endpoint).await
    }

    /// Run the fairness analysis and attach its result.
    pub async fn populate_bias<A>(
        &mut self,
        analyzer: &A,
        request: &BiasRequest,
    ) -> Result<(), CardError>
    where
        A: BiasAnalyzer + ?Sized,
    {
        request.check()?;
        self.bias_analysis = Some(analyzer.calculate_bias_metrics(request).await?);
        Ok(())
    }

    /// Run the explainability analysis for `request.top_n` features and
    /// attach its result.
    pub async fn populate_xai<A>(
        &mut self,
        analyzer: &A,
        request: &XaiRequest,
    ) -> Result<(), CardError>
    where
        A: ExplainabilityAnalyzer + ?Sized,
    {
        request.check()?;
        self.xai_analysis = Some(analyzer.calculate_xai_features(request).await?);
        Ok(())
    }

    /// Record the installed dependencies, minus the analysis toolkit itself,
    /// sorted ascending.
    pub async fn populate_requirements<I>(&mut self, inspector: &I) -> Result<(), CardError>
    where
        I: DependencyInspector + ?Sized,
    {
        let installed = inspector.installed_packages().await?;
        self.model_requirements = Some(filter_requirements(installed));
        Ok(())
    }
}

impl fmt::Display for ModelCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.to_json().map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

/// Drop [`EXCLUDED_PACKAGES`] and sort the rest lexicographically.
pub fn filter_requirements(installed: Vec<String>) -> Vec<String> {
    let mut kept: Vec<String> = installed
        .into_iter()
        .filter(|spec| !is_excluded(package_name(spec)))
        .collect();
    kept.sort();
    kept
}

/// The package name of a `name==version` spec.
pub fn package_name(spec: &str) -> &str {
    spec.split("==").next().unwrap_or(spec).trim()
}

fn is_excluded(name: &str) -> bool {
    EXCLUDED_PACKAGES
        .iter()
        .any(|excluded| excluded.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_filter_requirements_sorts_and_excludes() {
        let installed = vec![
            "shap==0.46.0".to_string(),
            "numpy==2.0.1".to_string(),
            "Fairlearn==0.11.0".to_string(),
            "keras==3.4.1".to_string(),
            "shapely==2.0.4".to_string(),
        ];
        assert_eq!(
            filter_requirements(installed),
            vec!["keras==3.4.1", "numpy==2.0.1", "shapely==2.0.4"]
        );
    }

    #[test]
    fn test_package_name() {
        assert_eq!(package_name("pandas==2.2.2"), "pandas");
        assert_eq!(package_name("editable-thing"), "editable-thing");
    }

    #[test]
    fn test_display_is_canonical_json() {
        let card = ModelCard {
            name: "n".into(),
            ..Default::default()
        };
        assert_eq!(card.to_string(), card.to_json().unwrap());
        assert!(card.to_string().starts_with("{\n    \"name\": \"n\",\n    \"version\": \"\","));
    }

    #[test]
    fn test_absent_optionals_are_emitted() {
        let v = ModelCard::default().to_value().unwrap();
        assert_eq!(v["input_data"], "");
        assert!(v["ai_model"].is_null());
        assert!(v["bias_analysis"].is_null());
        assert!(v["xai_analysis"].is_null());
        assert!(v["model_requirements"].is_null());
    }

    #[test]
    fn test_non_finite_accuracy_is_rejected() {
        let card = ModelCard {
            ai_model: Some(AIModel {
                test_accuracy: f64::NAN,
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = card.to_json().unwrap_err();
        assert!(matches!(err, CardError::InvalidInput(_)));
        assert!(err.to_string().contains("ai_model.test_accuracy"));
        assert!(!card.validate().unwrap());
    }

    #[test]
    fn test_infinite_bias_is_rejected() {
        let card = ModelCard {
            bias_analysis: Some(BiasAnalysis::new(0.1, f64::INFINITY)),
            ..Default::default()
        };
        assert!(matches!(card.to_value(), Err(CardError::InvalidInput(_))));
    }

    #[test]
    fn test_required_fields_must_be_present_to_deserialize() {
        let err = serde_json::from_str::<ModelCard>(r#"{"dependencies": {"left-pad": "1.0"}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("missing field `name`"));
    }

    #[test]
    fn test_optional_fields_default_on_deserialize() {
        let card: ModelCard = serde_json::from_value(serde_json::json!({
            "name": "n", "version": "1", "short_description": "s",
            "full_description": "f", "keywords": "k", "author": "a",
            "input_type": "Tabular", "category": "classification"
        }))
        .unwrap();
        assert_eq!(card.input_data, "");
        assert!(card.ai_model.is_none());
        assert!(card.model_requirements.is_none());
    }

    #[test]
    fn test_empty_card_is_invalid() {
        assert!(!ModelCard::default().validate().unwrap());
    }
}
