use super::pipeline::{CohortReport, StudentOutcome};
use std::io::Write;

const HEADERS: [&str; 9] = [
    "Student",
    "TE",
    "ATAR",
    "Lower TE",
    "Upper TE",
    "ATAR Range",
    "Subjects Counted",
    "Subjects Excluded",
    "Errors",
];

/// Writes one CSV row per student. Range columns stay empty for point estimates.
pub fn write_cohort_csv<W: Write>(writer: W, report: &CohortReport) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(HEADERS)?;

    for outcome in &report.students {
        csv_writer.write_record(student_row(outcome, report.range_mode.is_range()))?;
    }

    csv_writer.flush()?;
    Ok(())
}

fn student_row(outcome: &StudentOutcome, ranged: bool) -> [String; 9] {
    let (lower_te, upper_te, atar_range) = match (&outcome.atar_range, ranged) {
        (Some(range), true) => (
            outcome.te.lower_te.to_string(),
            outcome.te.upper_te.to_string(),
            range.display_string.clone(),
        ),
        _ => (String::new(), String::new(), String::new()),
    };

    [
        outcome.student.clone(),
        outcome.te.te.to_string(),
        outcome.atar.to_string(),
        lower_te,
        upper_te,
        atar_range,
        outcome.counted_subjects().to_string(),
        outcome.excluded_subjects().to_string(),
        outcome.errors().join("; "),
    ]
}
