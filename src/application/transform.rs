//! Feature transform: Raw form values → model-ready feature vector.
//!
//! Categorical labels become integer codes via [`CategoryCodeTable`], numeric
//! values pass through unchanged, and the result is laid out in the column
//! order of the current [`FeatureSchema`].

use crate::domain::{
    CategoryCodeTable, Feature, FeatureSchema, FeatureVector, RawInput, RawValue, FEATURE_COUNT,
};

/// Errors raised while building a feature vector.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransformError {
    #[error("Unknown category {label:?} for {feature}")]
    UnknownCategory { feature: Feature, label: String },

    #[error("Missing value for {0}")]
    MissingFeature(Feature),

    #[error("Value for {feature} is not a finite number ({value})")]
    NonFinite { feature: Feature, value: f64 },

    #[error("{feature} expects a {expected} value")]
    KindMismatch {
        feature: Feature,
        expected: &'static str,
    },
}

/// Pure mapping from [`RawInput`] to [`FeatureVector`].
#[derive(Debug, Clone, Copy)]
pub struct FeatureTransform {
    schema: FeatureSchema,
}

impl Default for FeatureTransform {
    fn default() -> Self {
        Self::new(FeatureSchema::current())
    }
}

impl FeatureTransform {
    #[must_use]
    pub fn new(schema: FeatureSchema) -> Self {
        Self { schema }
    }

    /// Encode and reorder one raw input.
    ///
    /// Every schema feature must be present. An unmapped category is an error,
    /// never a silent fallback code.
    ///
    /// # Errors
    /// Returns `TransformError` describing the first offending feature.
    pub fn apply(&self, input: &RawInput) -> Result<FeatureVector, TransformError> {
        let mut values = [0.0; FEATURE_COUNT];

        for (slot, &feature) in values.iter_mut().zip(self.schema.features().iter()) {
            let raw = input
                .get(feature)
                .ok_or(TransformError::MissingFeature(feature))?;
            *slot = Self::encode(feature, raw)?;
        }

        Ok(FeatureVector::from_ordered(values))
    }

    fn encode(feature: Feature, raw: &RawValue) -> Result<f64, TransformError> {
        match (feature.is_categorical(), raw) {
            (true, RawValue::Choice(label)) => CategoryCodeTable::code(feature, label)
                .map(f64::from)
                .ok_or_else(|| TransformError::UnknownCategory {
                    feature,
                    label: label.clone(),
                }),
            (true, RawValue::Numeric(_)) => Err(TransformError::KindMismatch {
                feature,
                expected: "categorical",
            }),
            (false, RawValue::Numeric(value)) => {
                if value.is_finite() {
                    Ok(*value)
                } else {
                    Err(TransformError::NonFinite {
                        feature,
                        value: *value,
                    })
                }
            }
            (false, RawValue::Choice(_)) => Err(TransformError::KindMismatch {
                feature,
                expected: "numeric",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{compute_bmi, Answers, QuestionId};

    fn default_form_input() -> RawInput {
        let mut answers = Answers::defaults();
        assert!(answers.select(QuestionId::Education, "高中毕业/GED或同等学历"));
        answers.to_raw_input().expect("default height is valid")
    }

    #[test]
    fn test_default_form_vector() {
        let vector = FeatureTransform::default()
            .apply(&default_form_input())
            .expect("valid input");

        let bmi = compute_bmi(60.0, 1.70).unwrap();
        let expected = [
            bmi, 30.0, 0.0, 10.0, 50.0, 40.0, 5.5, 14.0, 2.0, 50.0, 7.0, 10.0, 100.0, 250.0, 150.0,
        ];
        assert_eq!(vector.len(), 15);
        assert!((vector.as_slice()[0] - 20.76).abs() < 0.005);
        for (i, (got, want)) in vector.as_slice().iter().zip(expected.iter()).enumerate() {
            assert!((got - want).abs() < 1e-9, "column {i}: {got} != {want}");
        }
    }

    #[test]
    fn test_columns_follow_schema_not_form_order() {
        let input = default_form_input();
        let vector = FeatureTransform::default().apply(&input).unwrap();
        let schema = FeatureSchema::current();

        assert_eq!(vector.as_slice()[schema.position(Feature::BloodMercury)], 10.0);
        assert_eq!(vector.as_slice()[3], 10.0);
        assert_eq!(vector.get(Feature::TotalCholesterol), 150.0);
        assert_eq!(schema.position(Feature::TotalCholesterol), 14);
    }

    #[test]
    fn test_female_and_education_codes() {
        let input = default_form_input()
            .with(Feature::Gender, "女")
            .with(Feature::Education, "大专以上学历");
        let vector = FeatureTransform::default().apply(&input).unwrap();
        assert_eq!(vector.get(Feature::Gender), 1.0);
        assert_eq!(vector.get(Feature::Education), 4.0);
    }

    #[test]
    fn test_unknown_category_is_an_error() {
        let input = default_form_input().with(Feature::Gender, "other");
        let err = FeatureTransform::default().apply(&input).unwrap_err();
        assert_eq!(
            err,
            TransformError::UnknownCategory {
                feature: Feature::Gender,
                label: "other".into()
            }
        );
    }

    #[test]
    fn test_missing_feature() {
        let mut input = RawInput::new();
        input.insert(Feature::Bmi, 22.0);
        let err = FeatureTransform::default().apply(&input).unwrap_err();
        assert_eq!(err, TransformError::MissingFeature(Feature::ArmCircumference));
    }

    #[test]
    fn test_non_finite_and_kind_mismatch() {
        let input = default_form_input().with(Feature::Bmi, f64::INFINITY);
        assert!(matches!(
            FeatureTransform::default().apply(&input),
            Err(TransformError::NonFinite { feature: Feature::Bmi, .. })
        ));

        let input = default_form_input().with(Feature::Age, "fifty");
        assert!(matches!(
            FeatureTransform::default().apply(&input),
            Err(TransformError::KindMismatch { feature: Feature::Age, .. })
        ));

        let input = default_form_input().with(Feature::Education, 2.0);
        assert!(matches!(
            FeatureTransform::default().apply(&input),
            Err(TransformError::KindMismatch { feature: Feature::Education, .. })
        ));
    }

    #[test]
    fn test_transform_is_deterministic() {
        let input = default_form_input();
        let transform = FeatureTransform::default();
        assert_eq!(transform.apply(&input), transform.apply(&input));
    }
}
