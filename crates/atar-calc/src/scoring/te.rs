use super::domain::SubjectCategory;
use crate::format::{fixed_value, to_fixed};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

pub const INELIGIBLE_LABEL: &str = "ATAR Ineligible";

/// One scaled subject feeding the TE calculation. Point predictions carry the same
/// value in all three slots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StudentScore {
    pub scaled_score: f64,
    pub lower_scaled_score: f64,
    pub upper_scaled_score: f64,
    #[serde(rename = "subject_type")]
    pub category: SubjectCategory,
}

impl StudentScore {
    pub fn point(category: SubjectCategory, scaled_score: f64) -> Self {
        Self {
            scaled_score,
            lower_scaled_score: scaled_score,
            upper_scaled_score: scaled_score,
            category,
        }
    }

    pub fn range(category: SubjectCategory, lower: f64, scaled_score: f64, upper: f64) -> Self {
        Self {
            scaled_score,
            lower_scaled_score: lower,
            upper_scaled_score: upper,
            category,
        }
    }
}

/// A TE score or the ineligibility status. Serializes as the display string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TeScore {
    Ineligible,
    Value(f64),
}

impl TeScore {
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Ineligible => None,
            Self::Value(value) => Some(value),
        }
    }

    pub fn is_eligible(self) -> bool {
        matches!(self, Self::Value(_))
    }
}

impl fmt::Display for TeScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ineligible => f.write_str(INELIGIBLE_LABEL),
            Self::Value(value) => f.write_str(&to_fixed(*value, 1)),
        }
    }
}

impl Serialize for TeScore {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TeResult {
    pub te: TeScore,
    pub lower_te: TeScore,
    pub upper_te: TeScore,
}

impl TeResult {
    pub const INELIGIBLE: Self = Self {
        te: TeScore::Ineligible,
        lower_te: TeScore::Ineligible,
        upper_te: TeScore::Ineligible,
    };
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct CategoryCounts {
    general: usize,
    applied: usize,
    vet: usize,
}

impl CategoryCounts {
    fn tally(scores: &[StudentScore]) -> Self {
        scores
            .iter()
            .fold(Self::default(), |mut counts, score| {
                match score.category {
                    SubjectCategory::General => counts.general += 1,
                    SubjectCategory::Applied => counts.applied += 1,
                    SubjectCategory::Vet => counts.vet += 1,
                }
                counts
            })
    }

    fn eligible(self) -> bool {
        self.general >= 5 || (self.general >= 4 && (self.applied >= 1 || self.vet >= 1))
    }
}

/// Five General subjects, or four General plus at least one Applied or VET subject.
pub fn is_atar_eligible(scores: &[StudentScore]) -> bool {
    CategoryCounts::tally(scores).eligible()
}

/// Computes lower, nominal and upper TE scores for one student.
///
/// Each bound is the larger of the best five General scores and the best four
/// General scores plus the single best Applied or VET score. Values are kept at the
/// one-decimal precision they are displayed with.
pub fn calculate_student_te_scores(scores: &[StudentScore]) -> TeResult {
    if !is_atar_eligible(scores) {
        return TeResult::INELIGIBLE;
    }

    let bound = |pick: fn(&StudentScore) -> f64| {
        let value = best_combination(scores, pick);
        TeScore::Value(fixed_value(value, 1))
    };

    TeResult {
        te: bound(|score| score.scaled_score),
        lower_te: bound(|score| score.lower_scaled_score),
        upper_te: bound(|score| score.upper_scaled_score),
    }
}

fn best_combination(scores: &[StudentScore], pick: fn(&StudentScore) -> f64) -> f64 {
    let mut general: Vec<f64> = scores
        .iter()
        .filter(|score| score.category == SubjectCategory::General)
        .map(pick)
        .collect();
    general.sort_by(|left, right| right.total_cmp(left));

    let best_of = |category: SubjectCategory| {
        scores
            .iter()
            .filter(|score| score.category == category)
            .map(pick)
            .fold(0.0_f64, f64::max)
    };
    let best_applied_or_vet = best_of(SubjectCategory::Applied).max(best_of(SubjectCategory::Vet));

    let top5: f64 = general.iter().take(5).sum();
    let top4: f64 = general.iter().take(4).sum();
    top5.max(top4 + best_applied_or_vet)
}
