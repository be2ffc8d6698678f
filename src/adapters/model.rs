//! Model loading: verified artifact → ready classifier.
//!
//! The model format is detected from the document shape: an XGBoost save file
//! has a top-level `learner`; a linear model has `coefficients`.

use std::path::Path;

use serde_json::Value;

use crate::adapters::artifact::{open_model, Provenance, VerificationPolicy};
use crate::adapters::logistic::LogisticClassifier;
use crate::adapters::xgboost::XgbClassifier;
use crate::domain::{FeatureVector, Label};
use crate::ports::{Classifier, ModelError};
use crate::FibroriskError;

/// Any supported model, loaded once at startup.
#[derive(Debug, Clone)]
pub enum LoadedModel {
    Xgboost(XgbClassifier),
    Logistic(LogisticClassifier),
}

impl LoadedModel {
    /// Parse a model document, detecting its format.
    ///
    /// # Errors
    /// Returns `ModelError` if the document matches no supported format or
    /// fails that format's checks.
    pub fn from_value(value: Value) -> Result<Self, ModelError> {
        let Some(object) = value.as_object() else {
            return Err(ModelError::Malformed("model JSON is not an object".into()));
        };

        if object.contains_key("learner") {
            XgbClassifier::from_value(value).map(Self::Xgboost)
        } else if object.contains_key("coefficients") {
            LogisticClassifier::from_value(value).map(Self::Logistic)
        } else {
            Err(ModelError::Unsupported(
                "unrecognised model JSON (expected an XGBoost save file or a logistic model)"
                    .into(),
            ))
        }
    }

    fn inner(&self) -> &dyn Classifier {
        match self {
            Self::Xgboost(m) => m,
            Self::Logistic(m) => m,
        }
    }
}

impl Classifier for LoadedModel {
    fn describe(&self) -> String {
        self.inner().describe()
    }

    fn predict(&self, features: &FeatureVector) -> Result<Label, ModelError> {
        self.inner().predict(features)
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<Option<[f64; 2]>, ModelError> {
        self.inner().predict_proba(features)
    }
}

/// Verify and load the model at `model_path`.
///
/// # Errors
/// Returns `FibroriskError::Artifact` if verification fails,
/// `FibroriskError::Serialization` if the file is not JSON, and
/// `FibroriskError::Model` if it is not a usable model.
pub fn load_classifier(
    model_path: &Path,
    policy: &VerificationPolicy,
) -> Result<LoadedModel, FibroriskError> {
    let verified = open_model(model_path, policy)?;
    let value: Value = serde_json::from_slice(&verified.bytes)?;
    let model = LoadedModel::from_value(value)?;

    match verified.provenance {
        Provenance::Signed { serial, .. } => tracing::info!(
            "Loaded signed model from {:?} (serial={}): {}",
            verified.path,
            serial,
            model.describe()
        ),
        Provenance::Unsigned => tracing::info!(
            "Loaded unsigned model from {:?}: {}",
            verified.path,
            model.describe()
        ),
    }

    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::artifact::{write_signed_manifest, ModelManifest, MODEL_FILE};
    use crate::application::{FeatureTransform, PredictionService};
    use crate::domain::{
        Answer, Answers, CategoryCodeTable, Control, Feature, FeatureSchema, QuestionId,
        FEATURE_COUNT, QUESTIONS,
    };
    use ed25519_dalek::SigningKey;
    use rand::RngCore;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn allow_unsigned() -> VerificationPolicy {
        VerificationPolicy {
            allow_unsigned: true,
            verifying_key: None,
        }
    }

    fn logistic_json() -> Value {
        let mut coefficients = vec![0.0; FEATURE_COUNT];
        coefficients[0] = 0.1;
        json!({
            "feature_names": FeatureSchema::current().column_names(),
            "coefficients": coefficients,
            "intercept": -2.0,
        })
    }

    #[test]
    fn test_shipped_model_with_defaults() {
        let model = load_classifier(Path::new("models"), &allow_unsigned()).expect("shipped model");
        match &model {
            LoadedModel::Xgboost(xgb) => {
                assert_eq!(xgb.num_trees(), 3);
                assert_eq!(xgb.feature_names(), FeatureSchema::current().column_names());
            }
            LoadedModel::Logistic(_) => panic!("shipped model is XGBoost"),
        }

        let service = PredictionService::new(Arc::new(model));
        let input = Answers::defaults().to_raw_input().unwrap();
        let result = service.predict(&input).expect("prediction");

        assert_eq!(result.label, Label::NoFibrosis);
        let p = result.probability.expect("binary:logistic has probabilities");
        assert!((p - 0.0923).abs() < 1e-3, "p = {p}");
        assert_eq!(result.probability_text(), "0.09");
    }

    #[test]
    fn test_shipped_model_flags_high_risk_profile() {
        let model = load_classifier(Path::new("models"), &allow_unsigned()).expect("shipped model");
        let service = PredictionService::new(Arc::new(model));

        let mut answers = Answers::defaults();
        answers.set_numeric(QuestionId::Weight, 95.0);
        answers.set_numeric(QuestionId::Age, 65.0);
        answers.set_numeric(QuestionId::CapMedian, 90.0);
        answers.set_numeric(QuestionId::Platelets, 120.0);
        let result = service.predict(&answers.to_raw_input().unwrap()).unwrap();

        assert_eq!(result.label, Label::Fibrosis);
        assert!(result.probability.unwrap() > 0.5);
    }

    /// Every choice combination, with each numeric control at its min, max
    /// and default in turn.
    fn form_sweep() -> Vec<Answers> {
        let mut cases = Vec::new();
        for gender in 0..2 {
            for education in 0..5 {
                let mut base = Answers::defaults();
                for _ in 0..gender {
                    base.nudge(QuestionId::Gender, true);
                }
                for _ in 0..education {
                    base.nudge(QuestionId::Education, true);
                }
                cases.push(base.clone());

                for question in QUESTIONS.iter() {
                    if let Control::Numeric(spec) = question.control {
                        for value in [spec.min, spec.max, spec.default] {
                            let mut answers = base.clone();
                            answers.set_numeric(question.id, value);
                            cases.push(answers);
                        }
                    }
                }
            }
        }
        cases
    }

    #[test]
    fn test_every_form_state_reaches_the_shipped_model() {
        let model = load_classifier(Path::new("models"), &allow_unsigned()).expect("shipped model");
        let transform = FeatureTransform::default();
        let mut predicted = 0;

        for answers in form_sweep() {
            let height = answers.numeric(QuestionId::Height).unwrap();
            let weight = answers.numeric(QuestionId::Weight).unwrap();
            let input = match answers.to_raw_input() {
                Ok(input) => input,
                Err(_) => {
                    // Only a zero height is refused.
                    assert_eq!(height, 0.0);
                    continue;
                }
            };

            let vector = transform.apply(&input).expect("every form state transforms");
            assert_eq!(vector.len(), FEATURE_COUNT);
            assert_eq!(vector.get(Feature::Bmi), weight / (height * height));

            for question in QUESTIONS.iter() {
                let Some(feature) = question.id.feature() else {
                    continue;
                };
                let expected = match answers.get(question.id) {
                    Answer::Numeric(v) => v,
                    Answer::Choice(_) => {
                        let label = answers.choice_label(question.id).unwrap();
                        f64::from(CategoryCodeTable::code(feature, label).expect("offered label has a code"))
                    }
                };
                assert_eq!(vector.get(feature), expected, "{}", feature.code());
            }

            let label = model.predict(&vector).unwrap();
            assert!(label.class() <= 1);
            let [p0, p1] = model.predict_proba(&vector).unwrap().expect("binary:logistic");
            assert!((0.0..=1.0).contains(&p1), "p = {p1}");
            assert!((p0 + p1 - 1.0).abs() < 1e-12);
            assert_eq!(label == Label::Fibrosis, p1 > 0.5);
            predicted += 1;
        }

        // 10 choice combinations, each: base plus 14 numeric controls x 3 values,
        // minus the zero-height case.
        assert_eq!(predicted, 10 * (1 + 14 * 3 - 1));
    }

    #[test]
    fn test_weight_zero_and_max_height_are_valid() {
        let mut answers = Answers::defaults();
        answers.set_numeric(QuestionId::Weight, 0.0);
        let vector = FeatureTransform::default().apply(&answers.to_raw_input().unwrap()).unwrap();
        assert_eq!(vector.get(Feature::Bmi), 0.0);

        let mut answers = Answers::defaults();
        answers.set_numeric(QuestionId::Height, 3.0);
        let vector = FeatureTransform::default().apply(&answers.to_raw_input().unwrap()).unwrap();
        assert!((vector.get(Feature::Bmi) - 60.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_detects_logistic_format() {
        let model = LoadedModel::from_value(logistic_json()).expect("logistic");
        assert!(matches!(model, LoadedModel::Logistic(_)));
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(matches!(
            LoadedModel::from_value(json!({"weights": [1, 2, 3]})),
            Err(ModelError::Unsupported(_))
        ));
        assert!(matches!(
            LoadedModel::from_value(json!([1, 2, 3])),
            Err(ModelError::Malformed(_))
        ));
    }

    #[test]
    fn test_load_signed_logistic_model() {
        let temp = tempdir().unwrap();
        std::fs::write(
            temp.path().join(MODEL_FILE),
            serde_json::to_vec(&logistic_json()).unwrap(),
        )
        .unwrap();

        let mut seed = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut seed);
        let key = SigningKey::from_bytes(&seed);
        let manifest = ModelManifest::for_files(temp.path(), &[MODEL_FILE], 1).unwrap();
        write_signed_manifest(temp.path(), &manifest, &key).unwrap();

        let policy = VerificationPolicy {
            allow_unsigned: false,
            verifying_key: Some(key.verifying_key()),
        };
        let model = load_classifier(temp.path(), &policy).expect("signed model");
        assert!(model.describe().starts_with("Logistic regression"));
    }

    #[test]
    fn test_corrupt_json_is_a_serialization_error() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join(MODEL_FILE), b"{ not json").unwrap();
        let err = load_classifier(temp.path(), &allow_unsigned()).unwrap_err();
        assert!(matches!(err, FibroriskError::Serialization(_)));
    }

    #[test]
    fn test_unsigned_refused_by_default() {
        let temp = tempdir().unwrap();
        std::fs::write(
            temp.path().join(MODEL_FILE),
            serde_json::to_vec(&logistic_json()).unwrap(),
        )
        .unwrap();
        let err = load_classifier(temp.path(), &VerificationPolicy::default()).unwrap_err();
        assert!(matches!(err, FibroriskError::Artifact(_)));
    }
}
