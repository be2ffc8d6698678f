//! Patient input types for liver fibrosis risk prediction.
//!
//! Based on NHANES (CDC National Health and Nutrition Examination Survey) variables.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::schema::Feature;

/// Errors in the values a user entered.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("Height must be greater than 0 m to compute BMI (got {0})")]
    InvalidHeight(f64),

    #[error("Weight must be a finite, non-negative number (got {0})")]
    InvalidWeight(f64),

    #[error("BMI is not a finite number ({0}); re-enter weight and height")]
    InvalidBmi(f64),
}

/// One collected value: a measurement or the label of a single-choice control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Numeric(f64),
    Choice(String),
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        Self::Numeric(v)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        Self::Choice(v.to_string())
    }
}

/// Raw patient input for one prediction request, keyed by model feature.
///
/// Categorical values are still human-readable labels at this point; the
/// feature transform turns them into codes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawInput {
    values: BTreeMap<Feature, RawValue>,
}

impl RawInput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a feature value, replacing any previous one.
    pub fn insert(&mut self, feature: Feature, value: impl Into<RawValue>) {
        self.values.insert(feature, value.into());
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, feature: Feature, value: impl Into<RawValue>) -> Self {
        self.insert(feature, value);
        self
    }

    #[must_use]
    pub fn get(&self, feature: Feature) -> Option<&RawValue> {
        self.values.get(&feature)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Body mass index: weight (kg) divided by height (m) squared.
///
/// # Errors
/// Refuses a non-positive height instead of producing an infinite or NaN BMI.
pub fn compute_bmi(weight_kg: f64, height_m: f64) -> Result<f64, InputError> {
    if !weight_kg.is_finite() || weight_kg < 0.0 {
        return Err(InputError::InvalidWeight(weight_kg));
    }
    if !height_m.is_finite() || height_m <= 0.0 {
        return Err(InputError::InvalidHeight(height_m));
    }

    let bmi = weight_kg / (height_m * height_m);
    if !bmi.is_finite() {
        return Err(InputError::InvalidBmi(bmi));
    }
    Ok(bmi)
}
