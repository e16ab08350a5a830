//! Python-backed collaborators: fairlearn, shap, pip and keras.
//!
//! Every script starts with [`LOAD_MODEL`], which loads a [`ModelArtifact`]
//! and enforces the `predict` capability before anything else runs.

use super::{
    BiasAnalyzer, BiasRequest, DependencyInspector, ExplainabilityAnalyzer, ModelArtifact,
    StructureDumper, XaiRequest,
};
use crate::card::{BiasAnalysis, ExplainabilityAnalysis};
use crate::error::CardError;
use crate::runtime::PythonRuntime;
use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, warn};

const LOAD_MODEL: &str = r#"
import json, sys

def load_model(spec):
    fmt, path = spec["format"], spec["path"]
    if fmt == "keras":
        import keras
        model = keras.models.load_model(path)
    elif fmt == "joblib":
        import joblib
        model = joblib.load(path)
    else:
        import pickle
        with open(path, "rb") as fh:
            model = pickle.load(fh)
    if not callable(getattr(model, "predict", None)):
        sys.exit("model at %s does not expose predict()" % path)
    return model

req = json.load(sys.stdin)
"#;

const BIAS_SCRIPT: &str = r#"
from fairlearn.metrics import demographic_parity_difference, equalized_odds_difference

load_model(req["model"])
y_true, y_pred = req["true_labels"], req["predicted_labels"]
sf = req["sensitive_feature_data"]
print(json.dumps({
    "demographic_parity_difference": float(demographic_parity_difference(y_true, y_pred, sensitive_features=sf)),
    "equal_odds_difference": float(equalized_odds_difference(y_true, y_pred, sensitive_features=sf)),
}))
"#;

const XAI_SCRIPT: &str = r#"
import numpy as np
import pandas as pd
import shap

model = load_model(req["model"])
ds = req["train_dataset"]
frame = pd.DataFrame(ds["rows"], columns=req["column_names"])
explanation = shap.Explainer(model.predict, frame)(frame)
values = np.abs(np.asarray(explanation.values))
if values.ndim == 3:
    values = values.mean(axis=2)
importance = values.mean(axis=0)
ranked = sorted(zip(req["column_names"], importance), key=lambda kv: kv[1], reverse=True)
print(json.dumps({
    "name": "SHAP",
    "metrics": [{"key": k, "value": str(float(v))} for k, v in ranked[: req["top_n"]]],
}))
"#;

const KERAS_DUMP_SCRIPT: &str = r#"
print(load_model(req["model"]).to_json())
"#;

fn script(body: &str) -> String {
    format!("{LOAD_MODEL}{body}")
}

/// Demographic parity and equalized odds via `fairlearn.metrics`.
#[derive(Debug, Clone)]
pub struct FairlearnBiasAnalyzer {
    runtime: PythonRuntime,
}

impl FairlearnBiasAnalyzer {
    pub fn new(runtime: PythonRuntime) -> Self {
        Self { runtime }
    }
}

#[async_trait]
impl BiasAnalyzer for FairlearnBiasAnalyzer {
    async fn calculate_bias_metrics(
        &self,
        request: &BiasRequest,
    ) -> Result<BiasAnalysis, CardError> {
        let input = serde_json::to_value(request)?;
        let out = self
            .runtime
            .run_script(&script(BIAS_SCRIPT), &input)
            .await
            .map_err(into_analyzer_error)?;
        debug!(feature = %request.sensitive_feature_name, "fairlearn analysis done");
        Ok(serde_json::from_value(out)?)
    }
}

/// Mean absolute SHAP value per feature, highest first.
#[derive(Debug, Clone)]
pub struct ShapExplainabilityAnalyzer {
    runtime: PythonRuntime,
}

impl ShapExplainabilityAnalyzer {
    pub fn new(runtime: PythonRuntime) -> Self {
        Self { runtime }
    }
}

#[async_trait]
impl ExplainabilityAnalyzer for ShapExplainabilityAnalyzer {
    async fn calculate_xai_features(
        &self,
        request: &XaiRequest,
    ) -> Result<ExplainabilityAnalysis, CardError> {
        let input = serde_json::to_value(request)?;
        let out = self
            .runtime
            .run_script(&script(XAI_SCRIPT), &input)
            .await
            .map_err(into_analyzer_error)?;
        let analysis: ExplainabilityAnalysis = serde_json::from_value(out)?;
        Ok(limit_features(analysis, request.top_n))
    }
}

/// Keep at most `top_n` of the ranked metrics.
fn limit_features(analysis: ExplainabilityAnalysis, top_n: usize) -> ExplainabilityAnalysis {
    if analysis.metrics().len() <= top_n {
        return analysis;
    }
    warn!(
        got = analysis.metrics().len(),
        top_n,
        "explainability analyzer returned more features than requested"
    );
    ExplainabilityAnalysis::new(analysis.name(), analysis.top(top_n).to_vec())
}

/// Installed packages of the configured interpreter, as `pip list --format=freeze`.
#[derive(Debug, Clone)]
pub struct PipDependencyInspector {
    runtime: PythonRuntime,
}

impl PipDependencyInspector {
    pub fn new(runtime: PythonRuntime) -> Self {
        Self { runtime }
    }
}

#[async_trait]
impl DependencyInspector for PipDependencyInspector {
    async fn installed_packages(&self) -> Result<Vec<String>, CardError> {
        let stdout = self
            .runtime
            .run_args(&["-m", "pip", "list", "--format=freeze", "--disable-pip-version-check"])
            .await?;
        Ok(parse_freeze_output(&stdout))
    }
}

/// Parse `pip freeze` style output into lowercase `name==version` specs.
///
/// Editable installs, direct URL references and comments are skipped.
pub fn parse_freeze_output(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with("-e"))
        .filter_map(|line| {
            let (name, version) = line.split_once("==")?;
            Some(format!(
                "{}=={}",
                name.trim().to_ascii_lowercase(),
                version.trim()
            ))
        })
        .collect()
}

/// Architecture dump of a Keras/TensorFlow model via `model.to_json()`.
#[derive(Debug, Clone)]
pub struct KerasStructureDumper {
    runtime: PythonRuntime,
}

impl KerasStructureDumper {
    pub fn new(runtime: PythonRuntime) -> Self {
        Self { runtime }
    }
}

#[async_trait]
impl StructureDumper for KerasStructureDumper {
    async fn dump_structure(&self, model: &ModelArtifact) -> Result<Value, CardError> {
        self.runtime
            .run_script(&script(KERAS_DUMP_SCRIPT), &json!({ "model": model }))
            .await
            .map_err(into_analyzer_error)
    }
}

fn into_analyzer_error(e: CardError) -> CardError {
    match e {
        CardError::Python(msg) => CardError::analyzer(msg),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::Metric;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_freeze_output() {
        let stdout = "Fairlearn==0.11.0\nnumpy==2.0.1\n-e git+https://example.org/x.git#egg=x\n# comment\npkg @ file:///tmp/pkg\n\nPandas == 2.2.2\n";
        assert_eq!(
            parse_freeze_output(stdout),
            vec!["fairlearn==0.11.0", "numpy==2.0.1", "pandas==2.2.2"]
        );
    }

    #[test]
    fn test_scripts_share_model_loader() {
        for body in [BIAS_SCRIPT, XAI_SCRIPT, KERAS_DUMP_SCRIPT] {
            let full = script(body);
            assert!(full.contains("def load_model(spec)"));
            assert!(full.contains("req = json.load(sys.stdin)"));
        }
    }

    #[test]
    fn test_limit_features_truncates_to_top_n() {
        let analysis = ExplainabilityAnalysis::new(
            "SHAP",
            vec![
                Metric::new("age", "0.31"),
                Metric::new("capital-gain", "0.12"),
                Metric::new("hours-per-week", "0.04"),
            ],
        );
        let limited = limit_features(analysis.clone(), 2);
        assert_eq!(limited.name(), "SHAP");
        assert_eq!(limited.metrics(), &analysis.metrics()[..2]);
        assert_eq!(limit_features(analysis.clone(), 10), analysis);
    }

    #[test]
    fn test_python_errors_become_analyzer_errors() {
        let e = into_analyzer_error(CardError::python("exit 1"));
        assert!(matches!(e, CardError::Analyzer(_)));
        let e = into_analyzer_error(CardError::Timeout("slow".into()));
        assert!(matches!(e, CardError::Timeout(_)));
    }
}
