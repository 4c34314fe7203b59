//! Keeps a lower / result / upper triple ordered after a single field edit.

use super::domain::SubjectCategory;
use serde::{Deserialize, Serialize};

/// Which member of the triple the user just edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangedField {
    Lower,
    Result,
    Upper,
}

/// A range row as strings; `None` is an empty or unparsable field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeFields {
    #[serde(default)]
    pub lower_result: Option<String>,
    #[serde(default)]
    pub raw_result: Option<String>,
    #[serde(default)]
    pub upper_result: Option<String>,
}

const GRADE_RANKS: [(&str, f64); 5] = [("E", 1.0), ("D", 2.0), ("C", 3.0), ("B", 4.0), ("A", 5.0)];

/// Comparable representation of a category's raw results.
#[derive(Debug, Clone, Copy)]
enum ResultScale {
    Marks,
    Grades,
}

impl ResultScale {
    fn for_category(category: SubjectCategory) -> Option<Self> {
        match category {
            SubjectCategory::General => Some(Self::Marks),
            SubjectCategory::Applied => Some(Self::Grades),
            SubjectCategory::Vet => None,
        }
    }

    fn parse(self, value: Option<&str>) -> Option<f64> {
        let value = value?.trim();
        match self {
            Self::Marks => value
                .parse::<f64>()
                .ok()
                .filter(|mark| (0.0..=100.0).contains(mark)),
            Self::Grades => {
                let grade = value.to_uppercase();
                GRADE_RANKS
                    .iter()
                    .find(|(name, _)| *name == grade)
                    .map(|(_, rank)| *rank)
            }
        }
    }

    fn render(self, value: f64) -> String {
        match self {
            Self::Marks => value.to_string(),
            Self::Grades => GRADE_RANKS
                .iter()
                .find(|(_, rank)| *rank == value)
                .map_or_else(|| value.to_string(), |(name, _)| (*name).to_string()),
        }
    }
}

/// Applies the rubber-band rule for one edit.
///
/// Editing an endpoint drags the result along, and the result in turn drags the far
/// endpoint. Unparsable fields come back as `None` and never move their neighbours.
/// VET subjects and rows without a category are returned untouched.
pub fn apply_rubber_band_constraints(
    lower: Option<&str>,
    result: Option<&str>,
    upper: Option<&str>,
    category: Option<SubjectCategory>,
    changed: ChangedField,
) -> RangeFields {
    let Some(scale) = category.and_then(ResultScale::for_category) else {
        return RangeFields {
            lower_result: lower.map(str::to_string),
            raw_result: result.map(str::to_string),
            upper_result: upper.map(str::to_string),
        };
    };

    let parsed = [scale.parse(lower), scale.parse(result), scale.parse(upper)];
    let [lower, result, upper] = propagate(parsed, changed);

    RangeFields {
        lower_result: lower.map(|value| scale.render(value)),
        raw_result: result.map(|value| scale.render(value)),
        upper_result: upper.map(|value| scale.render(value)),
    }
}

fn propagate(values: [Option<f64>; 3], changed: ChangedField) -> [Option<f64>; 3] {
    let [mut lower, mut result, mut upper] = values;

    match changed {
        ChangedField::Lower => {
            if let (Some(low), Some(mid)) = (lower, result) {
                if low > mid {
                    result = Some(low);
                }
                if let (Some(mid), Some(high)) = (result, upper) {
                    if mid > high {
                        upper = Some(mid);
                    }
                }
            }
        }
        ChangedField::Result => {
            if let Some(mid) = result {
                if lower.is_some_and(|low| mid < low) {
                    lower = Some(mid);
                }
                if upper.is_some_and(|high| mid > high) {
                    upper = Some(mid);
                }
            }
        }
        ChangedField::Upper => {
            if let (Some(high), Some(mid)) = (upper, result) {
                if high < mid {
                    result = Some(high);
                }
                if let (Some(mid), Some(low)) = (result, lower) {
                    if mid < low {
                        lower = Some(mid);
                    }
                }
            }
        }
    }

    [lower, result, upper]
}
