use crate::scoring::{RawResult, Variation};
use serde::{Deserialize, Serialize};

/// One subject row for a student, optionally with manually entered range bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectResult {
    pub subject: String,
    pub raw_result: RawResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower_result: Option<RawResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_result: Option<RawResult>,
}

impl SubjectResult {
    pub fn new(subject: impl Into<String>, raw_result: impl Into<RawResult>) -> Self {
        Self {
            subject: subject.into(),
            raw_result: raw_result.into(),
            lower_result: None,
            upper_result: None,
        }
    }

    pub fn with_range(
        mut self,
        lower: impl Into<RawResult>,
        upper: impl Into<RawResult>,
    ) -> Self {
        self.lower_result = Some(lower.into());
        self.upper_result = Some(upper.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub student: String,
    pub results: Vec<SubjectResult>,
}

/// How lower and upper raw results are derived for each subject.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "variation", rename_all = "snake_case")]
pub enum RangeMode {
    /// Single estimate; all three bounds equal the raw result.
    #[default]
    Point,
    /// Shared ± marks on General results; graded subjects keep their grade.
    Variation(Variation),
    /// Per-row bounds, kept ordered by the rubber-band rule.
    Manual,
}

impl RangeMode {
    pub fn is_range(self) -> bool {
        !matches!(self, Self::Point)
    }

    /// Zero variation collapses to a point estimate.
    pub fn from_variation(variation: Variation) -> Self {
        if variation.marks() > 0.0 {
            Self::Variation(variation)
        } else {
            Self::Point
        }
    }
}
