use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// QCAA subject categories; each scales raw results differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SubjectCategory {
    #[serde(alias = "general", alias = "GENERAL")]
    General,
    #[serde(alias = "applied", alias = "APPLIED")]
    Applied,
    #[serde(rename = "VET", alias = "vet", alias = "Vet")]
    Vet,
}

impl SubjectCategory {
    pub const fn ordered() -> [Self; 3] {
        [Self::General, Self::Applied, Self::Vet]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::General => "General",
            Self::Applied => "Applied",
            Self::Vet => "VET",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "general" => Some(Self::General),
            "applied" => Some(Self::Applied),
            "vet" => Some(Self::Vet),
            _ => None,
        }
    }
}

impl fmt::Display for SubjectCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How a subject turns a raw result into a scaled score.
///
/// General subjects follow a logistic curve; Applied and VET subjects map a
/// normalized grade string straight onto a scaled score.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "category")]
pub enum SubjectScaling {
    General {
        a: Option<f64>,
        k: Option<f64>,
    },
    Applied {
        grades: BTreeMap<String, f64>,
    },
    #[serde(rename = "VET")]
    Vet {
        grades: BTreeMap<String, f64>,
    },
}

impl SubjectScaling {
    pub const fn category(&self) -> SubjectCategory {
        match self {
            Self::General { .. } => SubjectCategory::General,
            Self::Applied { .. } => SubjectCategory::Applied,
            Self::Vet { .. } => SubjectCategory::Vet,
        }
    }

    pub fn grades(&self) -> Option<&BTreeMap<String, f64>> {
        match self {
            Self::General { .. } => None,
            Self::Applied { grades } | Self::Vet { grades } => Some(grades),
        }
    }

    pub(crate) fn grades_mut(&mut self) -> Option<&mut BTreeMap<String, f64>> {
        match self {
            Self::General { .. } => None,
            Self::Applied { grades } | Self::Vet { grades } => Some(grades),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectScalingEntry {
    pub subject_name: String,
    #[serde(flatten)]
    pub scaling: SubjectScaling,
}

impl SubjectScalingEntry {
    pub fn category(&self) -> SubjectCategory {
        self.scaling.category()
    }
}

/// A raw subject result as entered: a mark for General subjects, a grade otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawResult {
    Number(f64),
    Text(String),
}

impl RawResult {
    /// Numeric view used by variation ranges; grades and blanks yield `None`.
    pub fn as_mark(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value).filter(|value| value.is_finite()),
            Self::Text(text) => text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite()),
        }
    }
}

impl fmt::Display for RawResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<f64> for RawResult {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for RawResult {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RawResult {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Cohort-wide ± marks applied to General results when deriving range bounds.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
pub struct Variation(f64);

impl Variation {
    pub const MAX: f64 = 100.0;

    pub fn new(marks: f64) -> Self {
        if marks.is_nan() {
            return Self(0.0);
        }
        Self(marks.clamp(0.0, Self::MAX))
    }

    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim()
            .parse::<f64>()
            .ok()
            .filter(|value| !value.is_nan())
            .map(Self::new)
    }

    pub const fn marks(self) -> f64 {
        self.0
    }

    /// Lower and upper marks around `raw`, each clamped to the 0–100 mark scale.
    pub fn bounds(self, raw: f64) -> (f64, f64) {
        ((raw - self.0).max(0.0), (raw + self.0).min(100.0))
    }
}

impl<'de> Deserialize<'de> for Variation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Number(f64),
            Text(String),
        }

        match Wire::deserialize(deserializer)? {
            Wire::Number(value) => Ok(Self::new(value)),
            Wire::Text(raw) => Self::parse(&raw)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid variation '{raw}'"))),
        }
    }
}
