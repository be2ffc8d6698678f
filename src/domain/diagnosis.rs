//! Prediction result types.
//!
//! Represents the output of the liver fibrosis classifier.

use serde::{Deserialize, Serialize};

/// Binary class predicted by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    /// Class 0: no liver fibrosis
    NoFibrosis,
    /// Class 1: liver fibrosis present
    Fibrosis,
}

impl Label {
    /// Class index as the model reports it.
    #[must_use]
    pub fn class(&self) -> u8 {
        match self {
            Self::NoFibrosis => 0,
            Self::Fibrosis => 1,
        }
    }

    /// Parse a class index; only 0 and 1 are valid.
    #[must_use]
    pub fn from_class(class: u8) -> Option<Self> {
        match class {
            0 => Some(Self::NoFibrosis),
            1 => Some(Self::Fibrosis),
            _ => None,
        }
    }

    /// Get a human-readable interpretation.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::NoFibrosis => "No liver fibrosis indicated at this time",
            Self::Fibrosis => "Indicates a liver fibrosis state",
        }
    }

    /// Get the associated color for TUI display (RGB).
    #[must_use]
    pub fn color(&self) -> (u8, u8, u8) {
        match self {
            Self::NoFibrosis => (16, 185, 129), // Emerald (#10B981)
            Self::Fibrosis => (244, 63, 94),    // Rose (#F43F5E)
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.class())
    }
}

/// Outcome of one prediction request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Predicted class
    pub label: Label,

    /// Probability of the positive class, when the model can estimate it
    pub probability: Option<f64>,
}

impl PredictionResult {
    #[must_use]
    pub fn new(label: Label, probability: Option<f64>) -> Self {
        Self { label, probability }
    }

    /// Probability formatted with two decimals, or `n/a`.
    #[must_use]
    pub fn probability_text(&self) -> String {
        match self.probability {
            Some(p) => format!("{p:.2}"),
            None => "n/a".to_string(),
        }
    }
}
