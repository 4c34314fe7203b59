use super::common::*;
use crate::scoring::{calculate_scaled_score, RawResult, ScalingError, ScalingOutcome};

#[test]
fn general_results_follow_the_logistic_curve() {
    let store = fixture_store();

    let scaled = calculate_scaled_score(&store, "English", &RawResult::Number(75.0))
        .expect("english scales");
    assert_eq!(scaled, 76.9);

    let scaled = calculate_scaled_score(&store, "english", &RawResult::from(" 100 "))
        .expect("numeric strings scale");
    assert_eq!(scaled, 93.9);

    let scaled =
        calculate_scaled_score(&store, "English", &RawResult::Number(0.0)).expect("zero scales");
    assert_eq!(scaled, 3.3);
}

#[test]
fn subject_lookup_is_trimmed_and_case_insensitive() {
    let store = fixture_store();
    let padded = calculate_scaled_score(&store, "  ENGLISH ", &RawResult::Number(50.0));
    let exact = calculate_scaled_score(&store, "English", &RawResult::Number(50.0));
    assert_eq!(padded, exact);
    assert_eq!(exact, Ok(41.9));
}

#[test]
fn unknown_subject_reports_its_name() {
    let store = fixture_store();
    let error = calculate_scaled_score(&store, "Astrology", &RawResult::Number(80.0))
        .expect_err("unknown subject");
    assert_eq!(error.to_string(), "No parameters found for subject: Astrology");
}

#[test]
fn general_results_outside_the_mark_scale_fail() {
    let store = fixture_store();
    for raw in [-0.5, 100.5] {
        let error = calculate_scaled_score(&store, "English", &RawResult::Number(raw))
            .expect_err("out of range");
        assert_eq!(
            error.to_string(),
            "General subject scores must be between 0 and 100"
        );
    }
}

#[test]
fn non_numeric_general_results_fail() {
    let store = fixture_store();
    let error = calculate_scaled_score(&store, "English", &RawResult::from("B+"))
        .expect_err("grade given to general subject");
    assert!(matches!(error, ScalingError::NonNumericResult { .. }));
}

#[test]
fn missing_coefficients_fail_instead_of_scaling_to_zero() {
    let store = fixture_store();
    let error = calculate_scaled_score(&store, "Unscaled Studies", &RawResult::Number(90.0))
        .expect_err("no coefficients");
    assert!(matches!(error, ScalingError::MissingCoefficients { .. }));

    let outcome = ScalingOutcome::from(Err(error));
    assert_eq!(outcome.scaled_score, 0.0);
    assert!(outcome.error.is_some());
}

#[test]
fn graded_results_map_exactly_after_normalizing() {
    let store = fixture_store();
    assert_eq!(
        calculate_scaled_score(&store, "Essential English", &RawResult::from(" b ")),
        Ok(47.5)
    );
    assert_eq!(
        calculate_scaled_score(&store, "Certificate III", &RawResult::from("pass")),
        Ok(58.3)
    );
}

#[test]
fn unmapped_grade_yields_zero_with_an_error() {
    let store = fixture_store();
    let outcome = ScalingOutcome::from(calculate_scaled_score(
        &store,
        "Essential English",
        &RawResult::from("z"),
    ));
    assert_eq!(outcome.scaled_score, 0.0);
    assert_eq!(
        outcome.error.as_deref(),
        Some("No scaling mapping found for Essential English result: Z")
    );
}

#[test]
fn graded_subjects_reject_numeric_results() {
    let store = fixture_store();
    let error = calculate_scaled_score(&store, "Essential English", &RawResult::Number(4.0))
        .expect_err("numbers are not grades");
    assert!(matches!(error, ScalingError::ExpectedGrade { .. }));
}

#[test]
fn repeated_calls_return_identical_results() {
    let store = fixture_store();
    let raw = RawResult::Number(67.3);
    let first = calculate_scaled_score(&store, "Mathematical Methods", &raw);
    for _ in 0..5 {
        assert_eq!(calculate_scaled_score(&store, "Mathematical Methods", &raw), first);
    }
}
