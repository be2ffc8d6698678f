//! Domain layer: Core business types and logic.
//!
//! Pure Rust types: the questionnaire, the category code table, the feature
//! schema and the prediction result.

pub mod category;
mod diagnosis;
mod patient;
pub mod questionnaire;
mod schema;

pub use category::CategoryCodeTable;
pub use diagnosis::{Label, PredictionResult};
pub use patient::{compute_bmi, InputError, RawInput, RawValue};
pub use questionnaire::{Answer, Answers, Control, NumericSpec, Question, QuestionId, QUESTIONS};
pub use schema::{Feature, FeatureSchema, FeatureVector, SchemaMismatch, FEATURE_COUNT};
