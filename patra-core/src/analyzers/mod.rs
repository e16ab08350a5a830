//! External collaborators a card delegates to.
//!
//! Fairness metrics, feature importances, installed-package listings and
//! framework architecture dumps are all computed outside this crate. Each is
//! reached through a narrow async trait so cards can be populated from the
//! bundled Python-backed implementations ([`python`]) or from anything else
//! that speaks the same contract, including test doubles.

pub mod python;

pub use python::{
    FairlearnBiasAnalyzer, KerasStructureDumper, PipDependencyInspector,
    ShapExplainabilityAnalyzer,
};

use crate::card::{BiasAnalysis, ExplainabilityAnalysis};
use crate::error::CardError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// Number of features requested from an explainability analyzer by default.
pub const DEFAULT_TOP_FEATURES: usize = 10;

/// A tabular dataset: named columns, one JSON value per cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Build a dataset, rejecting rows whose width differs from `columns`.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, CardError> {
        if let Some((idx, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(CardError::invalid_input(format!(
                "row {idx} has {} values, expected {}",
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// On-disk serialization format of a trained model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactFormat {
    Pickle,
    Joblib,
    Keras,
}

/// A trained model handed to an analyzer.
///
/// Analyzers load the artifact themselves. Whatever they load must expose a
/// `predict` capability; an artifact that does not is rejected by the
/// analyzer with [`CardError::Analyzer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub path: PathBuf,
    pub format: ArtifactFormat,
}

impl ModelArtifact {
    pub fn new(path: impl Into<PathBuf>, format: ArtifactFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }
}

/// Inputs to a fairness analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiasRequest {
    pub dataset: Dataset,
    pub true_labels: Vec<Value>,
    pub predicted_labels: Vec<Value>,
    pub sensitive_feature_name: String,
    pub sensitive_feature_data: Vec<Value>,
    pub model: ModelArtifact,
}

impl BiasRequest {
    /// Label and sensitive-feature vectors must line up.
    pub fn check(&self) -> Result<(), CardError> {
        let n = self.true_labels.len();
        if self.predicted_labels.len() != n || self.sensitive_feature_data.len() != n {
            return Err(CardError::invalid_input(format!(
                "length mismatch: {} true labels, {} predictions, {} sensitive values",
                n,
                self.predicted_labels.len(),
                self.sensitive_feature_data.len()
            )));
        }
        if self.sensitive_feature_name.is_empty() {
            return Err(CardError::invalid_input("sensitive feature name is empty"));
        }
        Ok(())
    }
}

/// Inputs to an explainability analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XaiRequest {
    pub train_dataset: Dataset,
    pub column_names: Vec<String>,
    pub model: ModelArtifact,
    pub top_n: usize,
}

impl XaiRequest {
    /// Request the [`DEFAULT_TOP_FEATURES`] most important features.
    pub fn new(train_dataset: Dataset, column_names: Vec<String>, model: ModelArtifact) -> Self {
        Self {
            train_dataset,
            column_names,
            model,
            top_n: DEFAULT_TOP_FEATURES,
        }
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn check(&self) -> Result<(), CardError> {
        if self.top_n == 0 {
            return Err(CardError::invalid_input("top_n must be at least 1"));
        }
        if self.column_names.len() != self.train_dataset.columns.len() {
            return Err(CardError::invalid_input(format!(
                "{} column names for a dataset with {} columns",
                self.column_names.len(),
                self.train_dataset.columns.len()
            )));
        }
        Ok(())
    }
}

/// Computes group fairness metrics.
#[async_trait]
pub trait BiasAnalyzer: Send + Sync {
    async fn calculate_bias_metrics(
        &self,
        request: &BiasRequest,
    ) -> Result<BiasAnalysis, CardError>;
}

/// Ranks features by importance; returns at most `request.top_n` metrics.
#[async_trait]
pub trait ExplainabilityAnalyzer: Send + Sync {
    async fn calculate_xai_features(
        &self,
        request: &XaiRequest,
    ) -> Result<ExplainabilityAnalysis, CardError>;
}

/// Lists installed dependencies as `name==version` specs.
#[async_trait]
pub trait DependencyInspector: Send + Sync {
    async fn installed_packages(&self) -> Result<Vec<String>, CardError>;
}

/// Produces a framework-native architecture dump as JSON.
#[async_trait]
pub trait StructureDumper: Send + Sync {
    async fn dump_structure(&self, model: &ModelArtifact) -> Result<Value, CardError>;
}
