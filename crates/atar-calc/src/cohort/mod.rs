//! Cohort-wide evaluation: CSV import, the per-student pipeline, summaries and export.

pub mod domain;
mod export;
mod parser;
mod pipeline;
mod summary;

pub use domain::{RangeMode, StudentRecord, SubjectResult};
pub use export::write_cohort_csv;
pub use pipeline::{CohortPipeline, CohortReport, StudentOutcome, SubjectOutcome};
pub use summary::{AtarBand, AtarBandEntry, CohortSummary, SubjectSummary};

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum CohortImportError {
    #[error("failed to read cohort file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid cohort CSV data: {0}")]
    Csv(#[from] csv::Error),
}

/// Loads `Student,Subject,Result[,Lower,Upper]` rows into per-student records.
pub struct CohortImporter;

impl CohortImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<StudentRecord>, CohortImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Students keep the order in which they first appear.
    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<StudentRecord>, CohortImportError> {
        let mut students: Vec<StudentRecord> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for row in parser::parse_rows(reader)? {
            let position = *index.entry(row.student.clone()).or_insert_with(|| {
                students.push(StudentRecord {
                    student: row.student.clone(),
                    results: Vec::new(),
                });
                students.len() - 1
            });
            students[position].results.push(row.result);
        }

        Ok(students)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::RawResult;
    use std::io::Cursor;

    #[test]
    fn rows_are_grouped_by_student_in_first_seen_order() {
        let csv = "Student,Subject,Result\n\
Zara Ng,English,82\n\
Ali Khan,English,74\n\
Zara Ng,Essential Mathematics,b\n";
        let students = CohortImporter::from_reader(Cursor::new(csv)).expect("import succeeds");

        assert_eq!(students.len(), 2);
        assert_eq!(students[0].student, "Zara Ng");
        assert_eq!(students[0].results.len(), 2);
        assert_eq!(
            students[0].results[1].raw_result,
            RawResult::Text("b".to_string())
        );
        assert_eq!(students[1].student, "Ali Khan");
    }

    #[test]
    fn optional_range_columns_are_read() {
        let csv = "Student,Subject,Result,Lower,Upper\n\
Zara Ng,English,82,78,\n";
        let students = CohortImporter::from_reader(Cursor::new(csv)).expect("import succeeds");
        let result = &students[0].results[0];
        assert_eq!(result.lower_result, Some(RawResult::Text("78".to_string())));
        assert_eq!(result.upper_result, None);
    }

    #[test]
    fn incomplete_rows_are_skipped() {
        let csv = "Student,Subject,Result\n\
Zara Ng,English,\n\
,Physics,70\n\
Zara Ng,Physics,70\n";
        let students = CohortImporter::from_reader(Cursor::new(csv)).expect("import succeeds");
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].results.len(), 1);
        assert_eq!(students[0].results[0].subject, "Physics");
    }

    #[test]
    fn from_path_propagates_io_errors() {
        let error = CohortImporter::from_path("./does-not-exist.csv").expect_err("io error");
        assert!(matches!(error, CohortImportError::Io(_)));
    }
}
