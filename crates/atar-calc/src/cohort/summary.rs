use super::pipeline::StudentOutcome;
use crate::scoring::{ScalingParameterStore, SubjectCategory};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AtarBand {
    NinetyNinePlus,
    Nineties,
    Eighties,
    Seventies,
    Sixties,
    BelowSixty,
}

impl AtarBand {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::NinetyNinePlus,
            Self::Nineties,
            Self::Eighties,
            Self::Seventies,
            Self::Sixties,
            Self::BelowSixty,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::NinetyNinePlus => "99.00+",
            Self::Nineties => "90.00 - 98.95",
            Self::Eighties => "80.00 - 89.95",
            Self::Seventies => "70.00 - 79.95",
            Self::Sixties => "60.00 - 69.95",
            Self::BelowSixty => "Below 60",
        }
    }

    pub fn for_atar(atar: f64) -> Self {
        if atar >= 99.0 {
            Self::NinetyNinePlus
        } else if atar >= 90.0 {
            Self::Nineties
        } else if atar >= 80.0 {
            Self::Eighties
        } else if atar >= 70.0 {
            Self::Seventies
        } else if atar >= 60.0 {
            Self::Sixties
        } else {
            Self::BelowSixty
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtarBandEntry {
    pub band: AtarBand,
    pub band_label: &'static str,
    pub students: usize,
}

/// Cohort-level ATAR statistics over students with a numeric ATAR.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortSummary {
    pub students: usize,
    pub eligible: usize,
    pub ineligible: usize,
    pub mean_atar: Option<f64>,
    pub median_atar: Option<f64>,
    pub highest_atar: Option<f64>,
    pub lowest_atar: Option<f64>,
    pub atar_bands: Vec<AtarBandEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectSummary {
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<SubjectCategory>,
    pub results: usize,
    pub errors: usize,
    pub mean_scaled_score: Option<f64>,
    pub lowest_scaled_score: Option<f64>,
    pub highest_scaled_score: Option<f64>,
}

pub(crate) fn summarize_cohort(outcomes: &[StudentOutcome]) -> CohortSummary {
    let mut atars: Vec<f64> = outcomes
        .iter()
        .filter_map(|outcome| outcome.atar.value())
        .collect();
    atars.sort_by(f64::total_cmp);

    let eligible = outcomes
        .iter()
        .filter(|outcome| outcome.te.te.is_eligible())
        .count();

    let atar_bands = AtarBand::ordered()
        .into_iter()
        .map(|band| AtarBandEntry {
            band,
            band_label: band.label(),
            students: atars
                .iter()
                .filter(|atar| AtarBand::for_atar(**atar) == band)
                .count(),
        })
        .collect();

    CohortSummary {
        students: outcomes.len(),
        eligible,
        ineligible: outcomes.len() - eligible,
        mean_atar: mean(&atars).map(round_hundredths),
        median_atar: median(&atars).map(round_hundredths),
        highest_atar: atars.last().copied(),
        lowest_atar: atars.first().copied(),
        atar_bands,
    }
}

pub(crate) fn summarize_subjects(
    outcomes: &[StudentOutcome],
    store: &ScalingParameterStore,
) -> Vec<SubjectSummary> {
    #[derive(Default)]
    struct Tally {
        category: Option<SubjectCategory>,
        scores: Vec<f64>,
        errors: usize,
    }

    let mut tallies: BTreeMap<String, Tally> = BTreeMap::new();
    for subject in outcomes.iter().flat_map(|outcome| &outcome.subjects) {
        let name = store
            .lookup(&subject.subject)
            .map(|entry| entry.subject_name.clone())
            .unwrap_or_else(|| subject.subject.trim().to_string());
        let tally = tallies.entry(name).or_default();
        tally.category = subject.category;
        match subject.scaled_score {
            Some(score) if subject.is_counted() => tally.scores.push(score),
            _ => tally.errors += 1,
        }
    }

    tallies
        .into_iter()
        .map(|(subject, tally)| SubjectSummary {
            subject,
            category: tally.category,
            results: tally.scores.len() + tally.errors,
            errors: tally.errors,
            mean_scaled_score: mean(&tally.scores).map(round_hundredths),
            lowest_scaled_score: tally.scores.iter().copied().reduce(f64::min),
            highest_scaled_score: tally.scores.iter().copied().reduce(f64::max),
        })
        .collect()
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Expects `sorted` in ascending order.
fn median(sorted: &[f64]) -> Option<f64> {
    let len = sorted.len();
    match len {
        0 => None,
        _ if len % 2 == 1 => Some(sorted[len / 2]),
        _ => Some((sorted[len / 2 - 1] + sorted[len / 2]) / 2.0),
    }
}

fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_cover_the_atar_scale() {
        assert_eq!(AtarBand::for_atar(99.95), AtarBand::NinetyNinePlus);
        assert_eq!(AtarBand::for_atar(98.95), AtarBand::Nineties);
        assert_eq!(AtarBand::for_atar(80.0), AtarBand::Eighties);
        assert_eq!(AtarBand::for_atar(30.0), AtarBand::BelowSixty);
    }

    #[test]
    fn median_handles_even_and_odd_lengths() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[70.0, 80.0, 90.0]), Some(80.0));
        assert_eq!(median(&[70.0, 80.0, 90.0, 95.0]), Some(85.0));
    }
}
