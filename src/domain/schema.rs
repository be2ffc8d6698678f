//! Feature schema shared between training and serving.
//!
//! The liver fibrosis model was trained on NHANES columns in a fixed order.
//! That order is the contract with the model artifact: a vector in any other
//! order still produces a prediction, just a wrong one. The schema is therefore
//! named and versioned, and model loaders check declared feature names against it.

use serde::{Deserialize, Serialize};

/// Number of features the model consumes.
pub const FEATURE_COUNT: usize = 15;

/// A model input column, identified by its NHANES variable code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Feature {
    /// Body mass index, kg/m² (BMXBMI, derived from weight and height)
    Bmi,
    /// Upper arm circumference, cm (BMXARMC)
    ArmCircumference,
    /// Gender code (RIAGENDR)
    Gender,
    /// Total blood mercury, µg/L (LBXTHG)
    BloodMercury,
    /// Age in years (RIDAGEYR)
    Age,
    /// HDL cholesterol, mg/dL (LBDHDD)
    HdlCholesterol,
    /// Glycohemoglobin, % (LBXGH)
    Glycohemoglobin,
    /// Hemoglobin, g/dL (LBXHGB)
    Hemoglobin,
    /// Education level code (DMDEDUC2)
    Education,
    /// Median controlled attenuation parameter, dB/m (LUXCAPM)
    CapMedian,
    /// White blood cell count, 1000 cells/µL (LBXWBCSI)
    WhiteBloodCells,
    /// Blood lead, µg/dL (LBXBPB)
    BloodLead,
    /// Fasting glucose, mg/dL (LBXGLU)
    Glucose,
    /// Platelet count, 1000 cells/µL (LBXPLTSI)
    Platelets,
    /// Total cholesterol, mg/dL (LBXTC)
    TotalCholesterol,
}

impl Feature {
    /// NHANES column name, as used by the training pipeline.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Bmi => "BMXBMI",
            Self::ArmCircumference => "BMXARMC",
            Self::Gender => "RIAGENDR",
            Self::BloodMercury => "LBXTHG",
            Self::Age => "RIDAGEYR",
            Self::HdlCholesterol => "LBDHDD",
            Self::Glycohemoglobin => "LBXGH",
            Self::Hemoglobin => "LBXHGB",
            Self::Education => "DMDEDUC2",
            Self::CapMedian => "LUXCAPM",
            Self::WhiteBloodCells => "LBXWBCSI",
            Self::BloodLead => "LBXBPB",
            Self::Glucose => "LBXGLU",
            Self::Platelets => "LBXPLTSI",
            Self::TotalCholesterol => "LBXTC",
        }
    }

    /// Whether the feature is fed to the model as an integer category code.
    #[must_use]
    pub fn is_categorical(&self) -> bool {
        matches!(self, Self::Gender | Self::Education)
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Versioned, named column order of the model input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSchema {
    version: &'static str,
    features: &'static [Feature; FEATURE_COUNT],
}

static NHANES_FIBROSIS_V1: [Feature; FEATURE_COUNT] = [
    Feature::Bmi,
    Feature::ArmCircumference,
    Feature::Gender,
    Feature::BloodMercury,
    Feature::Age,
    Feature::HdlCholesterol,
    Feature::Glycohemoglobin,
    Feature::Hemoglobin,
    Feature::Education,
    Feature::CapMedian,
    Feature::WhiteBloodCells,
    Feature::BloodLead,
    Feature::Glucose,
    Feature::Platelets,
    Feature::TotalCholesterol,
];

impl FeatureSchema {
    /// The schema the shipped models were trained against.
    #[must_use]
    pub fn current() -> Self {
        Self {
            version: "nhanes-liver-fibrosis/v1",
            features: &NHANES_FIBROSIS_V1,
        }
    }

    #[must_use]
    pub fn version(&self) -> &'static str {
        self.version
    }

    /// Features in model column order.
    #[must_use]
    pub fn features(&self) -> &'static [Feature; FEATURE_COUNT] {
        self.features
    }

    /// Column names in model column order.
    #[must_use]
    pub fn column_names(&self) -> Vec<&'static str> {
        self.features.iter().map(Feature::code).collect()
    }

    /// Column index of a feature.
    #[must_use]
    pub fn position(&self, feature: Feature) -> usize {
        // Every Feature variant appears exactly once in the schema.
        self.features
            .iter()
            .position(|f| *f == feature)
            .unwrap_or_default()
    }

    /// Compare a model's declared column names against this schema.
    ///
    /// Returns the first offending column as `(index, expected, found)`.
    pub fn check_columns<S: AsRef<str>>(
        &self,
        declared: &[S],
    ) -> Result<(), SchemaMismatch> {
        if declared.len() != FEATURE_COUNT {
            return Err(SchemaMismatch::Count {
                expected: FEATURE_COUNT,
                found: declared.len(),
            });
        }
        for (index, (feature, name)) in self.features.iter().zip(declared).enumerate() {
            if feature.code() != name.as_ref() {
                return Err(SchemaMismatch::Column {
                    index,
                    expected: feature.code(),
                    found: name.as_ref().to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Why a model's columns disagree with the schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaMismatch {
    #[error("expected {expected} features, model declares {found}")]
    Count { expected: usize, found: usize },

    #[error("column {index}: expected {expected}, model declares {found}")]
    Column {
        index: usize,
        expected: &'static str,
        found: String,
    },
}

/// Ordered model input: one value per schema column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    /// Wrap values that are already in schema order.
    #[must_use]
    pub fn from_ordered(values: [f64; FEATURE_COUNT]) -> Self {
        Self { values }
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Value of a named feature.
    #[must_use]
    pub fn get(&self, feature: Feature) -> f64 {
        self.values[FeatureSchema::current().position(feature)]
    }
}
