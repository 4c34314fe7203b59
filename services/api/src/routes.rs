use crate::infra::{resolve_range_mode, AppState};
use atar_calc::cohort::{
    write_cohort_csv, CohortImporter, CohortPipeline, CohortReport, StudentOutcome,
    StudentRecord,
};
use atar_calc::error::AppError;
use atar_calc::scoring::{
    apply_rubber_band_constraints, calculate_and_format_atar, calculate_and_format_atar_range,
    calculate_scaled_score, calculate_student_te_scores, scaling_curve, Atar, AtarRangeResult,
    ChangedField, RangeFields, RawResult, ScalingCurve, ScalingOutcome, StudentScore,
    SubjectCategory, TeInput, TeResult, Variation,
};
use axum::extract::{Path, Query};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::Cursor;

const DEFAULT_CURVE_STEP: f64 = 5.0;

pub(crate) fn router() -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/subjects", get(subjects_endpoint))
        .route("/api/v1/subjects/:subject/curve", get(curve_endpoint))
        .route("/api/v1/scaled-score", post(scaled_score_endpoint))
        .route("/api/v1/range/constrain", post(range_constrain_endpoint))
        .route("/api/v1/te", post(te_endpoint))
        .route("/api/v1/atar", post(atar_endpoint))
        .route("/api/v1/atar/range", post(atar_range_endpoint))
        .route("/api/v1/students/evaluate", post(evaluate_student_endpoint))
        .route("/api/v1/cohort/report", post(cohort_report_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready", "subjects": state.store.len() })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SubjectsQuery {
    #[serde(default)]
    pub(crate) category: Option<SubjectCategory>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubjectView {
    pub(crate) subject: String,
    pub(crate) category: SubjectCategory,
}

pub(crate) async fn subjects_endpoint(
    Extension(state): Extension<AppState>,
    Query(query): Query<SubjectsQuery>,
) -> Json<Vec<SubjectView>> {
    let subjects = state
        .store
        .subjects()
        .into_iter()
        .filter(|entry| query.category.map_or(true, |wanted| entry.category() == wanted))
        .map(|entry| SubjectView {
            subject: entry.subject_name.clone(),
            category: entry.category(),
        })
        .collect();

    Json(subjects)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CurveQuery {
    #[serde(default)]
    pub(crate) step: Option<f64>,
}

pub(crate) async fn curve_endpoint(
    Extension(state): Extension<AppState>,
    Path(subject): Path<String>,
    Query(query): Query<CurveQuery>,
) -> Result<Json<ScalingCurve>, AppError> {
    let step = query.step.unwrap_or(DEFAULT_CURVE_STEP);
    scaling_curve(&state.store, &subject, step)
        .map(Json)
        .map_err(|err| AppError::InvalidRequest(err.to_string()))
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScaledScoreRequest {
    pub(crate) subject: String,
    pub(crate) raw_result: RawResult,
}

#[derive(Debug, Serialize)]
pub(crate) struct ScaledScoreResponse {
    pub(crate) subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) category: Option<SubjectCategory>,
    #[serde(flatten)]
    pub(crate) outcome: ScalingOutcome,
}

/// Scaling failures are reported in the body, never as an HTTP error.
pub(crate) async fn scaled_score_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<ScaledScoreRequest>,
) -> Json<ScaledScoreResponse> {
    let outcome = calculate_scaled_score(&state.store, &payload.subject, &payload.raw_result);

    Json(ScaledScoreResponse {
        category: state.store.category_of(&payload.subject),
        subject: payload.subject,
        outcome: outcome.into(),
    })
}

#[derive(Debug, Deserialize)]
pub(crate) struct RangeConstrainRequest {
    #[serde(flatten)]
    pub(crate) fields: RangeFields,
    #[serde(default)]
    pub(crate) subject: Option<String>,
    #[serde(default)]
    pub(crate) category: Option<SubjectCategory>,
    pub(crate) changed: ChangedField,
}

/// An explicit category wins; otherwise it is looked up from the subject name.
pub(crate) async fn range_constrain_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<RangeConstrainRequest>,
) -> Json<RangeFields> {
    let category = payload.category.or_else(|| {
        payload
            .subject
            .as_deref()
            .and_then(|subject| state.store.category_of(subject))
    });
    let RangeFields {
        lower_result,
        raw_result,
        upper_result,
    } = payload.fields;

    Json(apply_rubber_band_constraints(
        lower_result.as_deref(),
        raw_result.as_deref(),
        upper_result.as_deref(),
        category,
        payload.changed,
    ))
}

#[derive(Debug, Deserialize)]
pub(crate) struct TeRequest {
    pub(crate) scores: Vec<StudentScore>,
}

pub(crate) async fn te_endpoint(Json(payload): Json<TeRequest>) -> Json<TeResult> {
    Json(calculate_student_te_scores(&payload.scores))
}

#[derive(Debug, Deserialize)]
pub(crate) struct AtarRequest {
    #[serde(default)]
    pub(crate) te: TeInput,
}

#[derive(Debug, Serialize)]
pub(crate) struct AtarResponse {
    pub(crate) atar: Atar,
}

pub(crate) async fn atar_endpoint(Json(payload): Json<AtarRequest>) -> Json<AtarResponse> {
    Json(AtarResponse {
        atar: calculate_and_format_atar(&payload.te),
    })
}

#[derive(Debug, Deserialize)]
pub(crate) struct AtarRangeRequest {
    #[serde(default)]
    pub(crate) te: TeInput,
    #[serde(default)]
    pub(crate) lower_te: TeInput,
    #[serde(default)]
    pub(crate) upper_te: TeInput,
}

pub(crate) async fn atar_range_endpoint(
    Json(payload): Json<AtarRangeRequest>,
) -> Json<AtarRangeResult> {
    Json(calculate_and_format_atar_range(
        &payload.te,
        &payload.lower_te,
        &payload.upper_te,
    ))
}

#[derive(Debug, Deserialize)]
pub(crate) struct EvaluateStudentRequest {
    #[serde(flatten)]
    pub(crate) record: StudentRecord,
    #[serde(default)]
    pub(crate) variation: Option<Variation>,
    #[serde(default)]
    pub(crate) manual_ranges: bool,
}

pub(crate) async fn evaluate_student_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<EvaluateStudentRequest>,
) -> Json<StudentOutcome> {
    let mode = resolve_range_mode(
        payload.variation,
        payload.manual_ranges,
        state.default_variation,
    );
    let pipeline = CohortPipeline::new(&state.store, mode);
    Json(pipeline.evaluate_student(&payload.record))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CohortReportRequest {
    #[serde(default)]
    pub(crate) students: Vec<StudentRecord>,
    /// Cohort CSV text, as accepted by the CLI `cohort` command.
    #[serde(default)]
    pub(crate) csv: Option<String>,
    #[serde(default)]
    pub(crate) variation: Option<Variation>,
    #[serde(default)]
    pub(crate) manual_ranges: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ReportFormat {
    #[default]
    Json,
    Csv,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CohortReportQuery {
    #[serde(default)]
    pub(crate) format: ReportFormat,
}

pub(crate) async fn cohort_report_endpoint(
    Extension(state): Extension<AppState>,
    Query(query): Query<CohortReportQuery>,
    Json(payload): Json<CohortReportRequest>,
) -> Result<Response, AppError> {
    let CohortReportRequest {
        students,
        csv,
        variation,
        manual_ranges,
    } = payload;

    let students = match (csv, students.is_empty()) {
        (Some(_), false) => {
            return Err(AppError::InvalidRequest(
                "provide either students or csv, not both".to_string(),
            ))
        }
        (Some(csv), true) => CohortImporter::from_reader(Cursor::new(csv.into_bytes()))?,
        (None, false) => students,
        (None, true) => {
            return Err(AppError::InvalidRequest(
                "cohort report needs students or csv".to_string(),
            ))
        }
    };

    let mode = resolve_range_mode(variation, manual_ranges, state.default_variation);
    let report = CohortPipeline::new(&state.store, mode).evaluate_cohort(&students);

    match query.format {
        ReportFormat::Json => Ok(Json(report).into_response()),
        ReportFormat::Csv => csv_response(&report),
    }
}

fn csv_response(report: &CohortReport) -> Result<Response, AppError> {
    let mut buffer = Vec::new();
    write_cohort_csv(&mut buffer, report)?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
        buffer,
    )
        .into_response())
}
