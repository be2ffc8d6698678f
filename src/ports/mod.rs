//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundary between
//! the application and the model implementation it delegates to.

mod classifier;

pub use classifier::{sigmoid, Classifier, ModelError};
