use super::domain::{RangeMode, StudentRecord, SubjectResult};
use super::summary::{summarize_cohort, summarize_subjects, CohortSummary, SubjectSummary};
use crate::scoring::{
    apply_rubber_band_constraints, calculate_scaled_score, calculate_student_te_scores,
    AtarRangeResult, Atar, ChangedField, RawResult, ScalingError, ScalingParameterStore,
    StudentScore, SubjectCategory, TeResult,
};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

/// Scaling outcome for one subject row. Rows with an error are left out of the TE.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectOutcome {
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<SubjectCategory>,
    pub raw_result: RawResult,
    pub lower_result: RawResult,
    pub upper_result: RawResult,
    pub scaled_score: Option<f64>,
    pub lower_scaled_score: Option<f64>,
    pub upper_scaled_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubjectOutcome {
    pub fn student_score(&self) -> Option<StudentScore> {
        match (
            self.category,
            self.lower_scaled_score,
            self.scaled_score,
            self.upper_scaled_score,
        ) {
            (Some(category), Some(lower), Some(mid), Some(upper)) => {
                Some(StudentScore::range(category, lower, mid, upper))
            }
            _ => None,
        }
    }

    pub fn is_counted(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentOutcome {
    pub student: String,
    pub subjects: Vec<SubjectOutcome>,
    #[serde(flatten)]
    pub te: TeResult,
    pub atar: Atar,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atar_range: Option<AtarRangeResult>,
}

impl StudentOutcome {
    pub fn counted_subjects(&self) -> usize {
        self.subjects.iter().filter(|subject| subject.is_counted()).count()
    }

    pub fn excluded_subjects(&self) -> usize {
        self.subjects.len() - self.counted_subjects()
    }

    /// `"<subject>: <message>"` for each excluded subject.
    pub fn errors(&self) -> Vec<String> {
        self.subjects
            .iter()
            .filter_map(|subject| {
                subject
                    .error
                    .as_ref()
                    .map(|error| format!("{}: {}", subject.subject, error))
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortReport {
    pub generated_at: DateTime<Utc>,
    pub range_mode: RangeMode,
    pub students: Vec<StudentOutcome>,
    pub summary: CohortSummary,
    pub subjects: Vec<SubjectSummary>,
}

/// Runs scaling, TE aggregation and ATAR conversion per student against a shared
/// parameter store. Students are independent, so cohorts are evaluated in parallel.
pub struct CohortPipeline<'a> {
    store: &'a ScalingParameterStore,
    mode: RangeMode,
}

impl<'a> CohortPipeline<'a> {
    pub fn new(store: &'a ScalingParameterStore, mode: RangeMode) -> Self {
        Self { store, mode }
    }

    pub fn mode(&self) -> RangeMode {
        self.mode
    }

    pub fn evaluate_student(&self, record: &StudentRecord) -> StudentOutcome {
        let subjects: Vec<SubjectOutcome> = record
            .results
            .iter()
            .map(|result| self.evaluate_subject(result))
            .collect();

        for subject in subjects.iter().filter(|subject| !subject.is_counted()) {
            debug!(
                student = %record.student,
                subject = %subject.subject,
                error = subject.error.as_deref().unwrap_or_default(),
                "subject excluded from TE"
            );
        }

        let scores: Vec<StudentScore> = subjects
            .iter()
            .filter_map(SubjectOutcome::student_score)
            .collect();
        let te = calculate_student_te_scores(&scores);
        let atar = te.atar();
        let atar_range = self.mode.is_range().then(|| te.atar_range());

        StudentOutcome {
            student: record.student.clone(),
            subjects,
            te,
            atar,
            atar_range,
        }
    }

    pub fn evaluate_cohort(&self, students: &[StudentRecord]) -> CohortReport {
        info!(students = students.len(), mode = ?self.mode, "evaluating cohort");

        let outcomes: Vec<StudentOutcome> = students
            .par_iter()
            .map(|record| self.evaluate_student(record))
            .collect();

        let summary = summarize_cohort(&outcomes);
        let subjects = summarize_subjects(&outcomes, self.store);

        CohortReport {
            generated_at: Utc::now(),
            range_mode: self.mode,
            students: outcomes,
            summary,
            subjects,
        }
    }

    fn evaluate_subject(&self, result: &SubjectResult) -> SubjectOutcome {
        let category = self.store.category_of(&result.subject);
        let (lower, raw, upper) = self.resolve_bounds(result, category);

        let scale = |value: &RawResult| calculate_scaled_score(self.store, &result.subject, value);
        let scaled = scale(&raw).and_then(|mid| {
            let lower = scale(&lower)?;
            let upper = scale(&upper)?;
            Ok::<_, ScalingError>((lower, mid, upper))
        });

        let (scores, error) = match scaled {
            Ok((lower, mid, upper)) => ((Some(lower), Some(mid), Some(upper)), None),
            Err(error) => ((None, None, None), Some(error.to_string())),
        };

        SubjectOutcome {
            subject: result.subject.clone(),
            category,
            raw_result: raw,
            lower_result: lower,
            upper_result: upper,
            scaled_score: scores.1,
            lower_scaled_score: scores.0,
            upper_scaled_score: scores.2,
            error,
        }
    }

    /// Lower, nominal and upper raw results for one row under the pipeline's mode.
    fn resolve_bounds(
        &self,
        result: &SubjectResult,
        category: Option<SubjectCategory>,
    ) -> (RawResult, RawResult, RawResult) {
        let raw = result.raw_result.clone();

        match self.mode {
            RangeMode::Point => (raw.clone(), raw.clone(), raw),
            RangeMode::Variation(variation) => match (category, raw.as_mark()) {
                (Some(SubjectCategory::General), Some(mark)) => {
                    let (lower, upper) = variation.bounds(mark);
                    (RawResult::Number(lower), raw, RawResult::Number(upper))
                }
                _ => (raw.clone(), raw.clone(), raw),
            },
            RangeMode::Manual => match category {
                Some(SubjectCategory::General | SubjectCategory::Applied) => {
                    Self::manual_bounds(result, raw, category)
                }
                _ => (raw.clone(), raw.clone(), raw),
            },
        }
    }

    /// Per-row bounds kept ordered around the result. A bound that is missing or does
    /// not parse on the subject's scale falls back to the result.
    fn manual_bounds(
        result: &SubjectResult,
        raw: RawResult,
        category: Option<SubjectCategory>,
    ) -> (RawResult, RawResult, RawResult) {
        let as_text = |value: &Option<RawResult>| value.as_ref().map(RawResult::to_string);
        let lower = as_text(&result.lower_result);
        let mid = raw.to_string();
        let upper = as_text(&result.upper_result);

        let constrained = apply_rubber_band_constraints(
            lower.as_deref(),
            Some(&mid),
            upper.as_deref(),
            category,
            ChangedField::Result,
        );

        for (bound, entered, kept) in [
            ("lower", &lower, &constrained.lower_result),
            ("upper", &upper, &constrained.upper_result),
        ] {
            if let (Some(entered), None) = (entered, kept) {
                debug!(
                    subject = %result.subject,
                    bound,
                    value = %entered,
                    "unparsable range bound replaced by result"
                );
            }
        }

        let raw = constrained.raw_result.map(RawResult::Text).unwrap_or(raw);
        let lower = constrained
            .lower_result
            .map(RawResult::Text)
            .unwrap_or_else(|| raw.clone());
        let upper = constrained
            .upper_result
            .map(RawResult::Text)
            .unwrap_or_else(|| raw.clone());
        (lower, raw, upper)
    }
}
