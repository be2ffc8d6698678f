//! Classifier port: Trait for the pre-trained fibrosis model.
//!
//! This trait abstracts the model format (XGBoost JSON, logistic regression JSON)
//! from the application logic.

use crate::domain::{FeatureVector, Label, SchemaMismatch};

/// Errors raised while loading or evaluating a model.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelError {
    #[error("Malformed model: {0}")]
    Malformed(String),

    #[error("Unsupported model: {0}")]
    Unsupported(String),

    #[error("Model columns do not match feature schema {schema}: {source}")]
    SchemaMismatch {
        schema: &'static str,
        #[source]
        source: SchemaMismatch,
    },

    #[error("Model expects {expected} features, got {found}")]
    FeatureCount { expected: usize, found: usize },

    #[error("Model produced an invalid probability: {0}")]
    InvalidProbability(f64),
}

/// Trait for binary classification of a feature vector.
///
/// Implementations are loaded once at startup and never mutated afterwards.
pub trait Classifier: Send + Sync {
    /// Short description of the loaded model for logs and the status line.
    fn describe(&self) -> String;

    /// Predict the class of a single sample.
    ///
    /// # Errors
    /// Returns `ModelError` if the model cannot evaluate the vector.
    fn predict(&self, features: &FeatureVector) -> Result<Label, ModelError>;

    /// Class probabilities `[p_negative, p_positive]`.
    ///
    /// Returns `Ok(None)` when the model has no probability estimate (for
    /// example a hinge-loss booster).
    ///
    /// # Errors
    /// Returns `ModelError` if the model cannot evaluate the vector.
    fn predict_proba(&self, features: &FeatureVector) -> Result<Option<[f64; 2]>, ModelError>;
}

/// Logistic function.
#[must_use]
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
