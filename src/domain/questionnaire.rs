//! Questionnaire controls and the answers collected from them.
//!
//! Every control is bounded: numeric controls clamp to `[min, max]` and move in
//! fixed steps, choice controls only offer labels the code table knows.

use super::category::{EDUCATION_LABELS, GENDER_LABELS};
use super::patient::{compute_bmi, InputError, RawInput};
use super::schema::Feature;

/// Bounds, default and step of a numeric control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericSpec {
    pub min: f64,
    pub max: f64,
    pub default: f64,
    pub step: f64,
    /// Digits shown after the decimal point.
    pub decimals: usize,
}

impl NumericSpec {
    const fn new(min: f64, max: f64, default: f64, step: f64, decimals: usize) -> Self {
        Self {
            min,
            max,
            default,
            step,
            decimals,
        }
    }

    /// Clamp into range; NaN falls back to the default.
    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.default;
        }
        self.snap(value.clamp(self.min, self.max))
    }

    #[must_use]
    pub fn step_up(&self, value: f64) -> f64 {
        self.clamp(value + self.step)
    }

    #[must_use]
    pub fn step_down(&self, value: f64) -> f64 {
        self.clamp(value - self.step)
    }

    /// Round to the displayed precision so repeated stepping does not drift.
    fn snap(&self, value: f64) -> f64 {
        let factor = 10f64.powi(self.decimals as i32);
        (value * factor).round() / factor
    }

    /// Format a value the way the control displays it.
    #[must_use]
    pub fn format(&self, value: f64) -> String {
        format!("{:.*}", self.decimals, value)
    }
}

/// Kind of input control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Control {
    Numeric(NumericSpec),
    Choice(&'static [&'static str]),
}

/// Identifies one question on the form, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestionId {
    Weight,
    Height,
    Gender,
    Age,
    Education,
    ArmCircumference,
    TotalCholesterol,
    HdlCholesterol,
    Platelets,
    WhiteBloodCells,
    BloodLead,
    CapMedian,
    BloodMercury,
    Glucose,
    Hemoglobin,
    Glycohemoglobin,
}

/// A question: prompt, unit hint and control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Question {
    pub id: QuestionId,
    pub label: &'static str,
    pub unit: &'static str,
    pub control: Control,
}

/// All questions in display order.
pub const QUESTIONS: [Question; 16] = [
    Question {
        id: QuestionId::Weight,
        label: "Weight",
        unit: "kg",
        control: Control::Numeric(NumericSpec::new(0.0, 500.0, 60.0, 0.1, 1)),
    },
    Question {
        id: QuestionId::Height,
        label: "Height",
        unit: "m",
        control: Control::Numeric(NumericSpec::new(0.0, 3.0, 1.7, 0.01, 2)),
    },
    Question {
        id: QuestionId::Gender,
        label: "Gender",
        unit: "",
        control: Control::Choice(&GENDER_LABELS),
    },
    Question {
        id: QuestionId::Age,
        label: "Age",
        unit: "years",
        control: Control::Numeric(NumericSpec::new(0.0, 100.0, 50.0, 1.0, 0)),
    },
    Question {
        id: QuestionId::Education,
        label: "Education",
        unit: "",
        control: Control::Choice(&EDUCATION_LABELS),
    },
    Question {
        id: QuestionId::ArmCircumference,
        label: "Arm circumference",
        unit: "cm",
        control: Control::Numeric(NumericSpec::new(0.0, 100.0, 30.0, 0.1, 1)),
    },
    Question {
        id: QuestionId::TotalCholesterol,
        label: "Total cholesterol",
        unit: "mg/dL",
        control: Control::Numeric(NumericSpec::new(0.0, 400.0, 150.0, 0.1, 1)),
    },
    Question {
        id: QuestionId::HdlCholesterol,
        label: "HDL cholesterol",
        unit: "mg/dL",
        control: Control::Numeric(NumericSpec::new(0.0, 100.0, 40.0, 0.1, 1)),
    },
    Question {
        id: QuestionId::Platelets,
        label: "Platelet count",
        unit: "1000 cells/uL",
        control: Control::Numeric(NumericSpec::new(0.0, 1000.0, 250.0, 0.1, 1)),
    },
    Question {
        id: QuestionId::WhiteBloodCells,
        label: "White blood cells",
        unit: "1000 cells/uL",
        control: Control::Numeric(NumericSpec::new(0.0, 20.0, 7.0, 0.1, 1)),
    },
    Question {
        id: QuestionId::BloodLead,
        label: "Blood lead",
        unit: "ug/dL",
        control: Control::Numeric(NumericSpec::new(0.0, 100.0, 10.0, 0.1, 1)),
    },
    Question {
        id: QuestionId::CapMedian,
        label: "Median CAP",
        unit: "dB/m",
        control: Control::Numeric(NumericSpec::new(0.0, 100.0, 50.0, 0.1, 1)),
    },
    Question {
        id: QuestionId::BloodMercury,
        label: "Total blood mercury",
        unit: "ug/L",
        control: Control::Numeric(NumericSpec::new(0.0, 100.0, 10.0, 0.1, 1)),
    },
    Question {
        id: QuestionId::Glucose,
        label: "Glucose",
        unit: "mg/dL",
        control: Control::Numeric(NumericSpec::new(0.0, 200.0, 100.0, 0.1, 1)),
    },
    Question {
        id: QuestionId::Hemoglobin,
        label: "Hemoglobin",
        unit: "g/dL",
        control: Control::Numeric(NumericSpec::new(0.0, 20.0, 14.0, 0.1, 1)),
    },
    Question {
        id: QuestionId::Glycohemoglobin,
        label: "Glycohemoglobin (HbA1c)",
        unit: "%",
        control: Control::Numeric(NumericSpec::new(0.0, 20.0, 5.5, 0.1, 1)),
    },
];

impl QuestionId {
    /// Model feature this question feeds; weight and height only feed BMI.
    #[must_use]
    pub fn feature(&self) -> Option<Feature> {
        match self {
            Self::Weight | Self::Height => None,
            Self::Gender => Some(Feature::Gender),
            Self::Age => Some(Feature::Age),
            Self::Education => Some(Feature::Education),
            Self::ArmCircumference => Some(Feature::ArmCircumference),
            Self::TotalCholesterol => Some(Feature::TotalCholesterol),
            Self::HdlCholesterol => Some(Feature::HdlCholesterol),
            Self::Platelets => Some(Feature::Platelets),
            Self::WhiteBloodCells => Some(Feature::WhiteBloodCells),
            Self::BloodLead => Some(Feature::BloodLead),
            Self::CapMedian => Some(Feature::CapMedian),
            Self::BloodMercury => Some(Feature::BloodMercury),
            Self::Glucose => Some(Feature::Glucose),
            Self::Hemoglobin => Some(Feature::Hemoglobin),
            Self::Glycohemoglobin => Some(Feature::Glycohemoglobin),
        }
    }

    #[must_use]
    pub fn question(&self) -> &'static Question {
        // QUESTIONS is declared in QuestionId order.
        &QUESTIONS[*self as usize]
    }
}

/// Current value of one control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Answer {
    Numeric(f64),
    /// Index into the control's choice list.
    Choice(usize),
}

/// Values of every control on the form, always within their bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Answers {
    values: [Answer; 16],
}

impl Default for Answers {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Answers {
    /// Every control at its default (first option for choices).
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            values: QUESTIONS.map(|q| match q.control {
                Control::Numeric(spec) => Answer::Numeric(spec.default),
                Control::Choice(_) => Answer::Choice(0),
            }),
        }
    }

    #[must_use]
    pub fn get(&self, id: QuestionId) -> Answer {
        self.values[id as usize]
    }

    /// Numeric value of a question, if it is a numeric control.
    #[must_use]
    pub fn numeric(&self, id: QuestionId) -> Option<f64> {
        match self.get(id) {
            Answer::Numeric(v) => Some(v),
            Answer::Choice(_) => None,
        }
    }

    /// Selected label of a question, if it is a choice control.
    #[must_use]
    pub fn choice_label(&self, id: QuestionId) -> Option<&'static str> {
        match (self.get(id), id.question().control) {
            (Answer::Choice(i), Control::Choice(labels)) => labels.get(i).copied(),
            _ => None,
        }
    }

    /// Set a numeric control, clamped to its bounds. Ignored for choice controls.
    pub fn set_numeric(&mut self, id: QuestionId, value: f64) {
        if let Control::Numeric(spec) = id.question().control {
            self.values[id as usize] = Answer::Numeric(spec.clamp(value));
        }
    }

    /// Select a choice by label. Returns false if the label is not offered.
    pub fn select(&mut self, id: QuestionId, label: &str) -> bool {
        if let Control::Choice(labels) = id.question().control {
            if let Some(i) = labels.iter().position(|l| *l == label) {
                self.values[id as usize] = Answer::Choice(i);
                return true;
            }
        }
        false
    }

    /// Move a control one step forward (`forward`) or back.
    ///
    /// Numeric controls step and clamp; choice controls wrap around.
    pub fn nudge(&mut self, id: QuestionId, forward: bool) {
        let current = self.get(id);
        self.values[id as usize] = match (id.question().control, current) {
            (Control::Numeric(spec), Answer::Numeric(v)) => Answer::Numeric(if forward {
                spec.step_up(v)
            } else {
                spec.step_down(v)
            }),
            (Control::Choice(labels), Answer::Choice(i)) => {
                let n = labels.len();
                Answer::Choice(if forward { (i + 1) % n } else { (i + n - 1) % n })
            }
            (_, other) => other,
        };
    }

    /// BMI from the weight and height answers.
    ///
    /// # Errors
    /// Returns `InputError` when height is zero.
    pub fn bmi(&self) -> Result<f64, InputError> {
        let weight = self.numeric(QuestionId::Weight).unwrap_or_default();
        let height = self.numeric(QuestionId::Height).unwrap_or_default();
        compute_bmi(weight, height)
    }

    /// Build the raw model input: BMI plus the fourteen directly collected fields.
    ///
    /// # Errors
    /// Returns `InputError` when BMI cannot be computed.
    pub fn to_raw_input(&self) -> Result<RawInput, InputError> {
        let mut input = RawInput::new();
        input.insert(Feature::Bmi, self.bmi()?);

        for question in QUESTIONS.iter() {
            let Some(feature) = question.id.feature() else {
                continue;
            };
            match self.get(question.id) {
                Answer::Numeric(v) => input.insert(feature, v),
                Answer::Choice(_) => {
                    if let Some(label) = self.choice_label(question.id) {
                        input.insert(feature, label);
                    }
                }
            }
        }

        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::category::CategoryCodeTable;
    use crate::domain::patient::RawValue;

    #[test]
    fn test_questions_are_in_id_order() {
        for (i, q) in QUESTIONS.iter().enumerate() {
            assert_eq!(q.id as usize, i, "{}", q.label);
        }
    }

    #[test]
    fn test_fourteen_questions_feed_the_model_directly() {
        let direct = QUESTIONS.iter().filter(|q| q.id.feature().is_some()).count();
        assert_eq!(direct, 14);
    }

    #[test]
    fn test_every_offered_choice_has_a_code() {
        for q in QUESTIONS.iter() {
            if let Control::Choice(labels) = q.control {
                let feature = q.id.feature().expect("choice questions feed the model");
                for label in labels {
                    assert!(
                        CategoryCodeTable::code(feature, label).is_some(),
                        "{label} missing for {feature}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_defaults_within_bounds() {
        for q in QUESTIONS.iter() {
            if let Control::Numeric(spec) = q.control {
                assert!(spec.min <= spec.default && spec.default <= spec.max);
                assert!(spec.step > 0.0);
            }
        }
    }

    #[test]
    fn test_numeric_clamp_and_step() {
        let mut answers = Answers::defaults();
        answers.set_numeric(QuestionId::Age, 150.0);
        assert_eq!(answers.numeric(QuestionId::Age), Some(100.0));

        answers.nudge(QuestionId::Age, true);
        assert_eq!(answers.numeric(QuestionId::Age), Some(100.0));

        answers.set_numeric(QuestionId::Height, 0.005);
        assert_eq!(answers.numeric(QuestionId::Height), Some(0.01));
        answers.nudge(QuestionId::Height, false);
        assert_eq!(answers.numeric(QuestionId::Height), Some(0.0));
        answers.nudge(QuestionId::Height, false);
        assert_eq!(answers.numeric(QuestionId::Height), Some(0.0));
    }

    #[test]
    fn test_stepping_does_not_drift() {
        let mut answers = Answers::defaults();
        for _ in 0..10 {
            answers.nudge(QuestionId::Glycohemoglobin, true);
        }
        assert_eq!(answers.numeric(QuestionId::Glycohemoglobin), Some(6.5));
    }

    #[test]
    fn test_choice_cycles() {
        let mut answers = Answers::defaults();
        assert_eq!(answers.choice_label(QuestionId::Gender), Some("男"));
        answers.nudge(QuestionId::Gender, true);
        assert_eq!(answers.choice_label(QuestionId::Gender), Some("女"));
        answers.nudge(QuestionId::Gender, true);
        assert_eq!(answers.choice_label(QuestionId::Gender), Some("男"));
        answers.nudge(QuestionId::Education, false);
        assert_eq!(answers.choice_label(QuestionId::Education), Some("大专以上学历"));
        assert!(!answers.select(QuestionId::Education, "博士"));
    }

    #[test]
    fn test_zero_height_blocks_raw_input() {
        let mut answers = Answers::defaults();
        answers.set_numeric(QuestionId::Height, 0.0);
        assert!(matches!(answers.bmi(), Err(InputError::InvalidHeight(_))));
        assert!(answers.to_raw_input().is_err());
    }

    #[test]
    fn test_raw_input_covers_all_features() {
        let answers = Answers::defaults();
        let input = answers.to_raw_input().expect("defaults are valid");
        assert_eq!(input.len(), 15);
        assert_eq!(input.get(Feature::Gender), Some(&RawValue::Choice("男".into())));
        match input.get(Feature::Bmi) {
            Some(RawValue::Numeric(bmi)) => assert!((bmi - 20.76).abs() < 0.01),
            other => panic!("unexpected BMI value {other:?}"),
        }
    }
}
