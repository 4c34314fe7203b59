use serde::{Deserialize, Deserializer};
use std::io::Read;

#[derive(Debug)]
pub(crate) struct ParameterRecord {
    pub(crate) subject: String,
    pub(crate) category: String,
    pub(crate) a: Option<String>,
    pub(crate) k: Option<String>,
}

#[derive(Debug)]
pub(crate) struct GradeRecord {
    pub(crate) subject: String,
    pub(crate) grade: String,
    pub(crate) scaled_score: String,
}

pub(crate) fn parse_parameters<R: Read>(reader: R) -> Result<Vec<ParameterRecord>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();

    for record in csv_reader.deserialize::<ParameterRow>() {
        let row = record?;
        records.push(ParameterRecord {
            subject: row.subject,
            category: row.category,
            a: row.a,
            k: row.k,
        });
    }

    Ok(records)
}

pub(crate) fn parse_grades<R: Read>(reader: R) -> Result<Vec<GradeRecord>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();

    for record in csv_reader.deserialize::<GradeRow>() {
        let row = record?;
        records.push(GradeRecord {
            subject: row.subject,
            grade: row.grade,
            scaled_score: row.scaled_score,
        });
    }

    Ok(records)
}

#[derive(Debug, Deserialize)]
struct ParameterRow {
    #[serde(rename = "Subject")]
    subject: String,
    #[serde(rename = "Type")]
    category: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    a: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    k: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GradeRow {
    #[serde(rename = "Subject")]
    subject: String,
    #[serde(rename = "Result")]
    grade: String,
    #[serde(rename = "Scaled Score")]
    scaled_score: String,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
