//! Subject scaling parameters, loaded once and shared read-only.

mod normalizer;
mod parser;

pub(crate) use normalizer::{normalize_grade, subject_key};

use super::domain::{SubjectCategory, SubjectScaling, SubjectScalingEntry};
use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::Path;
use tracing::warn;

const REFERENCE_PARAMETERS: &str = include_str!("../../../data/scaling_parameters.csv");
const REFERENCE_GRADE_MAPPINGS: &str = include_str!("../../../data/grade_mappings.csv");

#[derive(Debug, thiserror::Error)]
pub enum ScalingTableError {
    #[error("failed to read scaling table: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid scaling table CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("subject '{subject}' has unknown type '{value}'")]
    UnknownCategory { subject: String, value: String },
    #[error("subject '{subject}' has a non-numeric {column} value '{value}'")]
    InvalidNumber {
        subject: String,
        column: &'static str,
        value: String,
    },
    #[error("subject '{0}' appears more than once in the parameter table")]
    DuplicateSubject(String),
}

/// Immutable lookup of scaling parameters keyed by normalized subject name.
#[derive(Debug, Clone, Default)]
pub struct ScalingParameterStore {
    entries: HashMap<String, SubjectScalingEntry>,
}

impl ScalingParameterStore {
    pub fn new<I>(entries: I) -> Result<Self, ScalingTableError>
    where
        I: IntoIterator<Item = SubjectScalingEntry>,
    {
        let mut store = Self::default();
        for entry in entries {
            store.insert(entry)?;
        }
        Ok(store)
    }

    /// Reference tables bundled with the crate.
    pub fn reference() -> Result<Self, ScalingTableError> {
        Self::from_readers(
            REFERENCE_PARAMETERS.as_bytes(),
            REFERENCE_GRADE_MAPPINGS.as_bytes(),
        )
    }

    pub fn from_paths<P, G>(parameters: P, grade_mappings: G) -> Result<Self, ScalingTableError>
    where
        P: AsRef<Path>,
        G: AsRef<Path>,
    {
        let parameters = std::fs::File::open(parameters)?;
        let grade_mappings = std::fs::File::open(grade_mappings)?;
        Self::from_readers(parameters, grade_mappings)
    }

    /// Builds the store from a `Subject,Type,a,k` table and a
    /// `Subject,Result,Scaled Score` table.
    pub fn from_readers<P: Read, G: Read>(
        parameters: P,
        grade_mappings: G,
    ) -> Result<Self, ScalingTableError> {
        let mut store = Self::default();

        for record in parser::parse_parameters(parameters)? {
            let category = SubjectCategory::parse(&record.category).ok_or_else(|| {
                ScalingTableError::UnknownCategory {
                    subject: record.subject.clone(),
                    value: record.category.clone(),
                }
            })?;

            let scaling = match category {
                SubjectCategory::General => SubjectScaling::General {
                    a: parse_number(&record.subject, "a", record.a.as_deref())?,
                    k: parse_number(&record.subject, "k", record.k.as_deref())?,
                },
                SubjectCategory::Applied | SubjectCategory::Vet => {
                    if record.a.is_some() || record.k.is_some() {
                        warn!(subject = %record.subject, "ignoring coefficients on graded subject");
                    }
                    if category == SubjectCategory::Applied {
                        SubjectScaling::Applied {
                            grades: BTreeMap::new(),
                        }
                    } else {
                        SubjectScaling::Vet {
                            grades: BTreeMap::new(),
                        }
                    }
                }
            };

            store.insert(SubjectScalingEntry {
                subject_name: record.subject,
                scaling,
            })?;
        }

        for record in parser::parse_grades(grade_mappings)? {
            let Some(entry) = store.entries.get_mut(&subject_key(&record.subject)) else {
                warn!(subject = %record.subject, "grade mapping for unknown subject skipped");
                continue;
            };
            let scaled = parse_number(&record.subject, "Scaled Score", Some(&record.scaled_score))?;
            let Some(grades) = entry.scaling.grades_mut() else {
                warn!(subject = %record.subject, "grade mapping for General subject skipped");
                continue;
            };
            if let Some(scaled) = scaled {
                grades.insert(normalize_grade(&record.grade), scaled);
            }
        }

        Ok(store)
    }

    fn insert(&mut self, entry: SubjectScalingEntry) -> Result<(), ScalingTableError> {
        let key = subject_key(&entry.subject_name);
        if self.entries.contains_key(&key) {
            return Err(ScalingTableError::DuplicateSubject(entry.subject_name));
        }
        self.entries.insert(key, entry);
        Ok(())
    }

    /// Case-insensitive subject lookup. Surrounding whitespace is ignored and inner runs
    /// of whitespace collapse, so "Mathematical  Methods" finds "Mathematical Methods".
    pub fn lookup(&self, subject: &str) -> Option<&SubjectScalingEntry> {
        self.entries.get(&subject_key(subject))
    }

    pub fn category_of(&self, subject: &str) -> Option<SubjectCategory> {
        self.lookup(subject).map(SubjectScalingEntry::category)
    }

    /// All entries ordered by category, then subject name.
    pub fn subjects(&self) -> Vec<&SubjectScalingEntry> {
        let mut subjects: Vec<_> = self.entries.values().collect();
        subjects.sort_by(|left, right| {
            left.category()
                .cmp(&right.category())
                .then_with(|| left.subject_name.cmp(&right.subject_name))
        });
        subjects
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_number(
    subject: &str,
    column: &'static str,
    value: Option<&str>,
) -> Result<Option<f64>, ScalingTableError> {
    let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };

    value
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
        .map(Some)
        .ok_or_else(|| ScalingTableError::InvalidNumber {
            subject: subject.to_string(),
            column,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const PARAMETERS: &str = "Subject,Type,a,k\n\
English,General,0.0611,-3.38\n\
Unscaled Studies,General,,\n\
Essential English,Applied,,\n\
Certificate III,VET,,\n";

    const GRADES: &str = "Subject,Result,Scaled Score\n\
Essential English,a,58.2\n\
Essential English,B,47.5\n\
Certificate III,Pass,58.3\n\
English,A,99\n\
Astrology,A,12\n";

    fn store() -> ScalingParameterStore {
        ScalingParameterStore::from_readers(Cursor::new(PARAMETERS), Cursor::new(GRADES))
            .expect("tables parse")
    }

    #[test]
    fn general_rows_keep_coefficients() {
        let store = store();
        let english = store.lookup("  english ").expect("english present");
        assert_eq!(
            english.scaling,
            SubjectScaling::General {
                a: Some(0.0611),
                k: Some(-3.38),
            }
        );

        let unscaled = store.lookup("Unscaled Studies").expect("row present");
        assert_eq!(unscaled.scaling, SubjectScaling::General { a: None, k: None });
    }

    #[test]
    fn lookup_collapses_inner_whitespace() {
        let store = store();
        let essential = store
            .lookup(" Essential   English")
            .expect("inner whitespace collapses");
        assert_eq!(essential.subject_name, "Essential English");
        assert!(store.lookup("EssentialEnglish").is_none());
    }

    #[test]
    fn grade_rows_attach_to_graded_subjects_only() {
        let store = store();
        let essential = store.lookup("ESSENTIAL ENGLISH").expect("applied present");
        let grades = essential.scaling.grades().expect("graded subject");
        assert_eq!(grades.get("A"), Some(&58.2));
        assert_eq!(grades.get("B"), Some(&47.5));

        let vet = store.lookup("certificate iii").expect("vet present");
        assert_eq!(vet.category(), SubjectCategory::Vet);
        assert_eq!(vet.scaling.grades().and_then(|g| g.get("PASS")), Some(&58.3));

        assert!(store.lookup("English").expect("english").scaling.grades().is_none());
        assert!(store.lookup("Astrology").is_none());
    }

    #[test]
    fn unknown_category_is_rejected() {
        let error = ScalingParameterStore::from_readers(
            Cursor::new("Subject,Type,a,k\nEnglish,Extension,,\n"),
            Cursor::new("Subject,Result,Scaled Score\n"),
        )
        .expect_err("unknown type");
        assert!(matches!(error, ScalingTableError::UnknownCategory { .. }));
    }

    #[test]
    fn malformed_coefficient_is_rejected() {
        let error = ScalingParameterStore::from_readers(
            Cursor::new("Subject,Type,a,k\nEnglish,General,steep,-3\n"),
            Cursor::new("Subject,Result,Scaled Score\n"),
        )
        .expect_err("non-numeric a");
        match error {
            ScalingTableError::InvalidNumber { column, value, .. } => {
                assert_eq!(column, "a");
                assert_eq!(value, "steep");
            }
            other => panic!("expected invalid number, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_subjects_are_rejected() {
        let error = ScalingParameterStore::from_readers(
            Cursor::new("Subject,Type,a,k\nEnglish,General,0.06,-3\nenglish ,General,0.07,-3\n"),
            Cursor::new("Subject,Result,Scaled Score\n"),
        )
        .expect_err("duplicate");
        assert!(matches!(error, ScalingTableError::DuplicateSubject(_)));
    }

    #[test]
    fn reference_tables_cover_every_category() {
        let store = ScalingParameterStore::reference().expect("reference tables parse");
        for category in SubjectCategory::ordered() {
            assert!(store.subjects().iter().any(|entry| entry.category() == category));
        }
        assert!(store
            .subjects()
            .iter()
            .filter_map(|entry| entry.scaling.grades())
            .all(|grades| !grades.is_empty()));
    }

    #[test]
    fn from_path_propagates_io_errors() {
        let error = ScalingParameterStore::from_paths("./missing-params.csv", "./missing.csv")
            .expect_err("expected io error");
        assert!(matches!(error, ScalingTableError::Io(_)));
    }
}
