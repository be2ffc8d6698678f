//! Prediction service: Orchestrates transform and classification.
//!
//! This service coordinates:
//! - Feature transform (category codes, column order)
//! - Model evaluation (label, optional probability)
//! - Output validation

use std::sync::Arc;

use crate::application::FeatureTransform;
use crate::domain::{PredictionResult, RawInput};
use crate::ports::{Classifier, ModelError};
use crate::FibroriskError;

/// Service for running one prediction per form submission.
///
/// Holds no mutable state: the classifier is loaded once and shared read-only,
/// so identical inputs always produce identical results.
pub struct PredictionService<C>
where
    C: Classifier,
{
    classifier: Arc<C>,
    transform: FeatureTransform,
}

impl<C> PredictionService<C>
where
    C: Classifier,
{
    /// Create a new prediction service.
    pub fn new(classifier: Arc<C>) -> Self {
        Self {
            classifier,
            transform: FeatureTransform::default(),
        }
    }

    /// Short description of the underlying model.
    #[must_use]
    pub fn model_description(&self) -> String {
        self.classifier.describe()
    }

    /// Transform the raw input and evaluate the model.
    ///
    /// # Errors
    /// Returns error if the transform fails, the model fails, or the model
    /// reports a probability outside `[0, 1]`.
    pub fn predict(&self, input: &RawInput) -> Result<PredictionResult, FibroriskError> {
        let features = self.transform.apply(input)?;
        tracing::debug!("Transformed {} features", features.len());

        let label = self.classifier.predict(&features)?;

        let probability = match self.classifier.predict_proba(&features)? {
            Some([p_negative, p_positive]) => {
                for p in [p_negative, p_positive] {
                    if !p.is_finite() || !(0.0..=1.0).contains(&p) {
                        return Err(ModelError::InvalidProbability(p).into());
                    }
                }
                Some(p_positive)
            }
            None => None,
        };

        // Only the outcome shape is logged; inputs and probabilities stay out of logs.
        tracing::info!(
            "Prediction complete: label={}, probability_available={}",
            label,
            probability.is_some()
        );

        Ok(PredictionResult::new(label, probability))
    }
}
