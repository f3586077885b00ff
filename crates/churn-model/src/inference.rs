//! Classifier artifacts and prediction output.

use std::path::Path;

use churn_core::constants::{LABEL_CHURN, LABEL_STAY};
use churn_core::error::{Error, Result};
use churn_core::traits::Classifier;
use serde::{Deserialize, Serialize};

use crate::artifacts::read_artifact;

/// Output of a single prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    /// 1 for churn, 0 for stay
    pub label: u8,
    /// Probability the customer stays
    pub stay_probability: f64,
    /// Probability the customer churns
    pub churn_probability: f64,
    /// Time spent in the classifier (ns)
    #[serde(skip)]
    pub latency_ns: u64,
}

impl Prediction {
    /// Whether the label is churn
    #[must_use]
    pub fn is_churn(&self) -> bool {
        self.label == 1
    }

    /// Human readable label
    #[must_use]
    pub fn label_text(&self) -> &'static str {
        if self.is_churn() {
            LABEL_CHURN
        } else {
            LABEL_STAY
        }
    }

    /// Probability pair `[stay, churn]`
    #[must_use]
    pub fn proba(&self) -> [f64; 2] {
        [self.stay_probability, self.churn_probability]
    }
}

/// Binary logistic regression exported from training.
///
/// Coefficients are positional: `coefficients[i]` weighs manifest column `i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    /// Model name for logs
    #[serde(default = "default_name")]
    pub name: String,
    /// One weight per manifest column
    pub coefficients: Vec<f64>,
    /// Bias term
    pub intercept: f64,
}

fn default_name() -> String {
    "logistic_regression".to_string()
}

impl LogisticModel {
    /// Create a model from weights
    #[must_use]
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            name: default_name(),
            coefficients,
            intercept,
        }
    }

    /// Load a classifier artifact
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let model: Self = read_artifact(path)?;
        if model.coefficients.is_empty() {
            return Err(Error::artifact(path, "classifier has no coefficients"));
        }
        if let Some(i) = model.coefficients.iter().position(|w| !w.is_finite()) {
            return Err(Error::artifact(path, format!("coefficient {i} is not finite")));
        }
        Ok(model)
    }

    /// Linear score; positive means churn
    pub fn decision_function(&self, features: &[f64]) -> Result<f64> {
        if features.len() != self.coefficients.len() {
            return Err(Error::SchemaMismatch {
                expected: self.coefficients.len(),
                actual: features.len(),
            });
        }

        let score = self
            .coefficients
            .iter()
            .zip(features)
            .fold(self.intercept, |acc, (w, x)| acc + w * x);

        if score.is_finite() {
            Ok(score)
        } else {
            Err(Error::ModelError(format!("non-finite decision score {score}")))
        }
    }
}

impl Classifier for LogisticModel {
    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict_label(&self, features: &[f64]) -> Result<u8> {
        let score = self.decision_function(features)?;
        Ok(u8::from(score > 0.0))
    }

    fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2]> {
        let churn = sigmoid(self.decision_function(features)?);
        Ok([1.0 - churn, churn])
    }
}

/// Numerically stable logistic function
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}
