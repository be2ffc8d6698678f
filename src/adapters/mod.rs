//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with model formats and files:
//! - `xgboost`: XGBoost JSON tree ensembles
//! - `logistic`: logistic regression JSON
//! - `artifact`: signed model manifests (Ed25519 + SHA-256)
//! - `model`: format detection and verified loading
//! - `sanitize`: measurement and secret filtering for logs

pub mod artifact;
pub mod logistic;
pub mod model;
pub mod sanitize;
pub mod xgboost;

pub use artifact::{ArtifactError, VerificationPolicy};
pub use model::{load_classifier, LoadedModel};
