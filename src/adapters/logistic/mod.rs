//! Logistic regression adapter: Implementation of `Classifier` for linear models.
//!
//! Model file layout:
//!
//! ```json
//! {
//!   "feature_names": ["BMXBMI", "..."],
//!   "coefficients": [0.12, "..."],
//!   "intercept": -3.1,
//!   "scaler_mean": [27.5, "..."],
//!   "scaler_scale": [6.2, "..."]
//! }
//! ```
//!
//! The scaler arrays are optional and, when present, standardise each input
//! before the dot product.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::{FeatureSchema, FeatureVector, Label, FEATURE_COUNT};
use crate::ports::{sigmoid, Classifier, ModelError};

#[derive(Debug, Deserialize)]
struct LogisticModelJson {
    feature_names: Vec<String>,
    coefficients: Vec<f64>,
    intercept: f64,
    #[serde(default)]
    scaler_mean: Option<Vec<f64>>,
    #[serde(default)]
    scaler_scale: Option<Vec<f64>>,
}

#[derive(Debug, Clone)]
struct Scaler {
    mean: [f64; FEATURE_COUNT],
    scale: [f64; FEATURE_COUNT],
}

/// Standardised logistic regression over the fixed feature schema.
#[derive(Debug, Clone)]
pub struct LogisticClassifier {
    weights: [f64; FEATURE_COUNT],
    intercept: f64,
    scaler: Option<Scaler>,
}

fn fixed_len(name: &str, values: Vec<f64>) -> Result<[f64; FEATURE_COUNT], ModelError> {
    let found = values.len();
    let array: [f64; FEATURE_COUNT] = values
        .try_into()
        .map_err(|_| ModelError::FeatureCount {
            expected: FEATURE_COUNT,
            found,
        })?;
    if let Some(i) = array.iter().position(|v| !v.is_finite()) {
        return Err(ModelError::Malformed(format!("{name}[{i}] is not finite")));
    }
    Ok(array)
}

impl LogisticClassifier {
    /// Build a classifier from a parsed model document.
    ///
    /// # Errors
    /// Returns `ModelError` if fields are missing, lengths disagree with the
    /// schema, a value is not finite, or a scale is zero.
    pub fn from_value(value: Value) -> Result<Self, ModelError> {
        let doc: LogisticModelJson = serde_json::from_value(value)
            .map_err(|e| ModelError::Malformed(format!("logistic model JSON: {e}")))?;

        let schema = FeatureSchema::current();
        schema
            .check_columns(&doc.feature_names)
            .map_err(|source| ModelError::SchemaMismatch {
                schema: schema.version(),
                source,
            })?;

        let weights = fixed_len("coefficients", doc.coefficients)?;
        if !doc.intercept.is_finite() {
            return Err(ModelError::Malformed("intercept is not finite".into()));
        }

        let scaler = match (doc.scaler_mean, doc.scaler_scale) {
            (None, None) => None,
            (Some(mean), Some(scale)) => {
                let mean = fixed_len("scaler_mean", mean)?;
                let scale = fixed_len("scaler_scale", scale)?;
                if let Some(i) = scale.iter().position(|s| *s == 0.0) {
                    return Err(ModelError::Malformed(format!("scaler_scale[{i}] is zero")));
                }
                Some(Scaler { mean, scale })
            }
            _ => {
                return Err(ModelError::Malformed(
                    "scaler_mean and scaler_scale must be given together".into(),
                ))
            }
        };

        Ok(Self {
            weights,
            intercept: doc.intercept,
            scaler,
        })
    }

    /// Linear predictor (log-odds of the positive class).
    #[must_use]
    pub fn decision_function(&self, features: &FeatureVector) -> f64 {
        let x = features.as_slice();
        let dot: f64 = match &self.scaler {
            Some(s) => (0..FEATURE_COUNT)
                .map(|i| self.weights[i] * (x[i] - s.mean[i]) / s.scale[i])
                .sum(),
            None => self.weights.iter().zip(x).map(|(w, v)| w * v).sum(),
        };
        self.intercept + dot
    }
}

impl Classifier for LogisticClassifier {
    fn describe(&self) -> String {
        format!(
            "Logistic regression ({} features{})",
            FEATURE_COUNT,
            if self.scaler.is_some() {
                ", standardised"
            } else {
                ""
            }
        )
    }

    fn predict(&self, features: &FeatureVector) -> Result<Label, ModelError> {
        let p = sigmoid(self.decision_function(features));
        Ok(if p > 0.5 {
            Label::Fibrosis
        } else {
            Label::NoFibrosis
        })
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<Option<[f64; 2]>, ModelError> {
        let p = sigmoid(self.decision_function(features));
        Ok(Some([1.0 - p, p]))
    }
}
