use super::domain::{RawResult, SubjectScaling};
use super::parameters::{normalize_grade, ScalingParameterStore};
use serde::Serialize;

/// Why a single subject could not be scaled. Reported per subject; never aborts a student.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScalingError {
    #[error("No parameters found for subject: {subject}")]
    UnknownSubject { subject: String },
    #[error("Invalid numeric result for {subject}: {raw}")]
    NonNumericResult { subject: String, raw: String },
    #[error("General subject scores must be between 0 and 100")]
    OutOfRange { subject: String, raw: f64 },
    #[error("Missing scaling coefficients for {subject}")]
    MissingCoefficients { subject: String },
    #[error("{subject} expects a grade result, got a number")]
    ExpectedGrade { subject: String },
    #[error("No scaling mapping found for {subject} result: {grade}")]
    UnmappedGrade { subject: String, grade: String },
}

/// Scales one raw result for one subject.
///
/// General subjects use `100 / (1 + e^-(a*raw + k))` rounded to one decimal place;
/// Applied and VET subjects return the mapped score for the normalized grade. Range
/// predictions call this once per bound.
pub fn calculate_scaled_score(
    store: &ScalingParameterStore,
    subject: &str,
    raw: &RawResult,
) -> Result<f64, ScalingError> {
    let entry = store
        .lookup(subject)
        .ok_or_else(|| ScalingError::UnknownSubject {
            subject: subject.to_string(),
        })?;

    match &entry.scaling {
        SubjectScaling::General { a, k } => {
            let mark = general_mark(subject, raw)?;
            match (a, k) {
                (Some(a), Some(k)) => Ok(logistic_scaled_score(*a, *k, mark)),
                _ => Err(ScalingError::MissingCoefficients {
                    subject: subject.to_string(),
                }),
            }
        }
        SubjectScaling::Applied { grades } | SubjectScaling::Vet { grades } => {
            let RawResult::Text(text) = raw else {
                return Err(ScalingError::ExpectedGrade {
                    subject: subject.to_string(),
                });
            };
            let grade = normalize_grade(text);
            grades
                .get(&grade)
                .copied()
                .ok_or_else(|| ScalingError::UnmappedGrade {
                    subject: subject.to_string(),
                    grade,
                })
        }
    }
}

fn general_mark(subject: &str, raw: &RawResult) -> Result<f64, ScalingError> {
    let mark = match raw {
        RawResult::Number(value) => *value,
        RawResult::Text(text) => {
            text.trim()
                .parse::<f64>()
                .map_err(|_| ScalingError::NonNumericResult {
                    subject: subject.to_string(),
                    raw: text.clone(),
                })?
        }
    };

    if mark.is_nan() {
        return Err(ScalingError::NonNumericResult {
            subject: subject.to_string(),
            raw: raw.to_string(),
        });
    }
    if !(0.0..=100.0).contains(&mark) {
        return Err(ScalingError::OutOfRange {
            subject: subject.to_string(),
            raw: mark,
        });
    }

    Ok(mark)
}

pub(crate) fn logistic_scaled_score(a: f64, k: f64, mark: f64) -> f64 {
    let scaled = 100.0 / (1.0 + (-(a * mark + k)).exp());
    (scaled * 10.0).round() / 10.0
}

/// Wire shape of a scaling attempt: a zero score plus message on failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScalingOutcome {
    pub scaled_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Result<f64, ScalingError>> for ScalingOutcome {
    fn from(result: Result<f64, ScalingError>) -> Self {
        match result {
            Ok(scaled_score) => Self {
                scaled_score,
                error: None,
            },
            Err(error) => Self {
                scaled_score: 0.0,
                error: Some(error.to_string()),
            },
        }
    }
}
