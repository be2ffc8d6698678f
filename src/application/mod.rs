//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases of the application.

mod prediction;
mod transform;

pub use prediction::PredictionService;
pub use transform::{FeatureTransform, TransformError};
