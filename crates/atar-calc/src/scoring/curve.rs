use super::calculator::{calculate_scaled_score, ScalingError};
use super::domain::{RawResult, SubjectCategory, SubjectScaling};
use super::parameters::ScalingParameterStore;
use serde::Serialize;

const DEFAULT_STEP: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurvePoint {
    pub raw_result: String,
    pub scaled_score: f64,
}

/// Raw -> scaled samples for charting one subject's scaling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScalingCurve {
    pub subject: String,
    pub category: SubjectCategory,
    pub points: Vec<CurvePoint>,
}

/// General subjects are sampled every `step` marks from 0 to 100 (100 always
/// included); graded subjects list each grade from highest scaled score down.
pub fn scaling_curve(
    store: &ScalingParameterStore,
    subject: &str,
    step: f64,
) -> Result<ScalingCurve, ScalingError> {
    let entry = store
        .lookup(subject)
        .ok_or_else(|| ScalingError::UnknownSubject {
            subject: subject.to_string(),
        })?;

    let points = match &entry.scaling {
        SubjectScaling::General { .. } => {
            let step = if step.is_finite() {
                step.clamp(1.0, 100.0)
            } else {
                DEFAULT_STEP
            };
            let samples = (100.0 / step).floor() as usize;
            let mut marks: Vec<f64> = (0..=samples).map(|index| index as f64 * step).collect();
            if marks.last().is_some_and(|last| *last < 100.0) {
                marks.push(100.0);
            }

            marks
                .into_iter()
                .map(|mark| {
                    calculate_scaled_score(store, &entry.subject_name, &RawResult::Number(mark))
                        .map(|scaled_score| CurvePoint {
                            raw_result: mark.to_string(),
                            scaled_score,
                        })
                })
                .collect::<Result<Vec<_>, _>>()?
        }
        SubjectScaling::Applied { grades } | SubjectScaling::Vet { grades } => {
            let mut points: Vec<CurvePoint> = grades
                .iter()
                .map(|(grade, scaled_score)| CurvePoint {
                    raw_result: grade.clone(),
                    scaled_score: *scaled_score,
                })
                .collect();
            points.sort_by(|left, right| right.scaled_score.total_cmp(&left.scaled_score));
            points
        }
    };

    Ok(ScalingCurve {
        subject: entry.subject_name.clone(),
        category: entry.category(),
        points,
    })
}
