use super::domain::SubjectResult;
use crate::scoring::RawResult;
use serde::{Deserialize, Deserializer};
use std::io::Read;
use tracing::warn;

#[derive(Debug)]
pub(crate) struct CohortRow {
    pub(crate) student: String,
    pub(crate) result: SubjectResult,
}

pub(crate) fn parse_rows<R: Read>(reader: R) -> Result<Vec<CohortRow>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();

    for (index, record) in csv_reader.deserialize::<ResultRow>().enumerate() {
        let row = record?;
        let (Some(student), Some(subject), Some(raw)) = (row.student, row.subject, row.result)
        else {
            warn!(row = index + 2, "skipping cohort row without student, subject or result");
            continue;
        };

        rows.push(CohortRow {
            student,
            result: SubjectResult {
                subject,
                raw_result: RawResult::Text(raw),
                lower_result: row.lower.map(RawResult::Text),
                upper_result: row.upper.map(RawResult::Text),
            },
        });
    }

    Ok(rows)
}

#[derive(Debug, Deserialize)]
struct ResultRow {
    #[serde(rename = "Student", default, deserialize_with = "empty_string_as_none")]
    student: Option<String>,
    #[serde(rename = "Subject", default, deserialize_with = "empty_string_as_none")]
    subject: Option<String>,
    #[serde(rename = "Result", default, deserialize_with = "empty_string_as_none")]
    result: Option<String>,
    #[serde(rename = "Lower", default, deserialize_with = "empty_string_as_none")]
    lower: Option<String>,
    #[serde(rename = "Upper", default, deserialize_with = "empty_string_as_none")]
    upper: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
