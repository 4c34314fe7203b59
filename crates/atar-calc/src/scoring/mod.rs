//! Subject scaling, TE aggregation and ATAR conversion.
//!
//! Everything here is a pure function over its inputs and a shared, read-only
//! [`ScalingParameterStore`]; nothing is cached between calls.

mod atar;
mod calculator;
mod curve;
pub mod domain;
mod parameters;
mod rubber_band;
mod te;

#[cfg(test)]
mod tests;

pub use atar::{
    calculate_and_format_atar, calculate_and_format_atar_range, convert_te_to_atar,
    te_to_atar_conversion, Atar, AtarRangeResult, RangeStatus, TeInput, ATAR_CEILING,
    ATAR_FLOOR,
};
pub use calculator::{calculate_scaled_score, ScalingError, ScalingOutcome};
pub use curve::{scaling_curve, CurvePoint, ScalingCurve};
pub use domain::{RawResult, SubjectCategory, SubjectScaling, SubjectScalingEntry, Variation};
pub use parameters::{ScalingParameterStore, ScalingTableError};
pub use rubber_band::{apply_rubber_band_constraints, ChangedField, RangeFields};
pub use te::{
    calculate_student_te_scores, is_atar_eligible, StudentScore, TeResult, TeScore,
    INELIGIBLE_LABEL,
};
