//! Core traits for the serving core.

use crate::error::Result;

/// Opaque trained binary classifier.
///
/// Implementations are immutable once loaded and shared across requests, so
/// both operations take `&self`.
pub trait Classifier: Send + Sync {
    /// Number of encoded features the classifier was trained on
    fn n_features(&self) -> usize;

    /// Discrete label prediction: 1 for churn, 0 for stay
    fn predict_label(&self, features: &[f64]) -> Result<u8>;

    /// Probability pair `[stay, churn]`
    fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2]>;
}
