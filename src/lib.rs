//! # Fibrorisk
//!
//! Liver fibrosis risk screening from routine NHANES biometrics.
//!
//! This crate provides:
//! - A questionnaire of fifteen model inputs with bounded controls
//! - A versioned feature transform (category codes, canonical column order)
//! - Native evaluation of pre-trained XGBoost and logistic regression models
//! - Signed model artifacts (Ed25519 manifest over SHA-256 file hashes)
//! - Terminal UI for local-only use
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (questionnaire, feature schema, prediction result)
//! - `ports`: Trait definitions for external operations (`Classifier`)
//! - `adapters`: Concrete implementations (XGBoost JSON, logistic JSON, artifact verification)
//! - `application`: Use cases orchestrating domain and ports
//! - `config`: Environment-driven settings
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use domain::{FeatureVector, Label, PredictionResult, RawInput};

/// Result type for Fibrorisk operations
pub type Result<T> = std::result::Result<T, FibroriskError>;

/// Main error type for Fibrorisk
#[derive(Debug, thiserror::Error)]
pub enum FibroriskError {
    #[error("Invalid input: {0}")]
    Input(#[from] domain::InputError),

    #[error("Feature transform failed: {0}")]
    Transform(#[from] application::TransformError),

    #[error("Model error: {0}")]
    Model(#[from] ports::ModelError),

    #[error("Model artifact rejected: {0}")]
    Artifact(#[from] adapters::ArtifactError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
