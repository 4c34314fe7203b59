use atar_calc::cohort::RangeMode;
use atar_calc::scoring::{ScalingParameterStore, SubjectCategory, Variation};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) store: Arc<ScalingParameterStore>,
    pub(crate) default_variation: Variation,
}

/// Manual per-row ranges win over a variation; a missing variation falls back to the
/// configured default.
pub(crate) fn resolve_range_mode(
    variation: Option<Variation>,
    manual_ranges: bool,
    default_variation: Variation,
) -> RangeMode {
    if manual_ranges {
        RangeMode::Manual
    } else {
        RangeMode::from_variation(variation.unwrap_or(default_variation))
    }
}

pub(crate) fn parse_variation(raw: &str) -> Result<Variation, String> {
    Variation::parse(raw).ok_or_else(|| format!("'{raw}' is not a numeric variation"))
}

pub(crate) fn parse_category(raw: &str) -> Result<SubjectCategory, String> {
    SubjectCategory::parse(raw)
        .ok_or_else(|| format!("'{raw}' is not one of General, Applied or VET"))
}
