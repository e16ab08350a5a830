//! Fairness and explainability results attached to a card.

use super::model::Metric;
use serde::{Deserialize, Serialize};

/// Group fairness measurements for a sensitive feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiasAnalysis {
    demographic_parity_difference: f64,
    equal_odds_difference: f64,
}

impl BiasAnalysis {
    pub fn new(demographic_parity_difference: f64, equal_odds_difference: f64) -> Self {
        Self {
            demographic_parity_difference,
            equal_odds_difference,
        }
    }

    pub fn demographic_parity_difference(&self) -> f64 {
        self.demographic_parity_difference
    }

    pub fn equal_odds_difference(&self) -> f64 {
        self.equal_odds_difference
    }
}

/// Ranked feature importances produced by an explainability method.
///
/// `metrics` is ordered, most important first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainabilityAnalysis {
    name: String,
    #[serde(default)]
    metrics: Vec<Metric>,
}

impl ExplainabilityAnalysis {
    pub fn new(name: impl Into<String>, metrics: Vec<Metric>) -> Self {
        Self {
            name: name.into(),
            metrics,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    /// The `n` highest ranked metrics.
    pub fn top(&self, n: usize) -> &[Metric] {
        &self.metrics[..n.min(self.metrics.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_clamps_to_len() {
        let xai = ExplainabilityAnalysis::new(
            "shap",
            vec![Metric::new("a", "0.5"), Metric::new("b", "0.2")],
        );
        assert_eq!(xai.top(1).len(), 1);
        assert_eq!(xai.top(1)[0].key(), "a");
        assert_eq!(xai.top(10).len(), 2);
    }

    #[test]
    fn test_bias_field_order_in_json() {
        let text = serde_json::to_string(&BiasAnalysis::new(0.1, 0.2)).unwrap();
        assert_eq!(
            text,
            r#"{"demographic_parity_difference":0.1,"equal_odds_difference":0.2}"#
        );
    }
}
