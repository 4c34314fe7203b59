use super::te::{TeResult, TeScore, INELIGIBLE_LABEL};
use crate::format::to_fixed;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

pub const ATAR_FLOOR: f64 = 30.0;
pub const ATAR_CEILING: f64 = 99.95;

const NOT_AVAILABLE_LABEL: &str = "N/A";
const INVALID_TE_LABEL: &str = "Invalid TE";
const INVALID_RANGE_LABEL: &str = "Invalid TE Range";
const CALCULATION_ERROR_LABEL: &str = "Calculation Error";

// Sixth-degree TE -> ATAR fit, highest power first.
const C6: f64 = -7.3159e-14;
const C5: f64 = 1.01772e-10;
const C4: f64 = -4.37167e-08;
const C3: f64 = 1.93676e-06;
const C2: f64 = 0.002716082;
const C1: f64 = -0.271855355;
const C0: f64 = 11.34274504;

/// Evaluates the TE -> ATAR polynomial, rounds to the nearest 0.05 and clamps to
/// [30, 99.95].
pub fn convert_te_to_atar(te: f64) -> f64 {
    let raw = C6 * te.powf(6.0)
        + C5 * te.powf(5.0)
        + C4 * te.powf(4.0)
        + C3 * te.powf(3.0)
        + C2 * te.powf(2.0)
        + C1 * te
        + C0;
    let rounded = (raw * 20.0).round() / 20.0;
    rounded.clamp(ATAR_FLOOR, ATAR_CEILING)
}

/// An ATAR estimate or the reason there is none.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Atar {
    Value(f64),
    Ineligible,
    NotAvailable,
    InvalidTe,
    CalculationError,
}

impl Atar {
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Status text for non-numeric outcomes.
    pub const fn status_label(self) -> Option<&'static str> {
        match self {
            Self::Value(_) => None,
            Self::Ineligible => Some(INELIGIBLE_LABEL),
            Self::NotAvailable => Some(NOT_AVAILABLE_LABEL),
            Self::InvalidTe => Some(INVALID_TE_LABEL),
            Self::CalculationError => Some(CALCULATION_ERROR_LABEL),
        }
    }

    fn from_converted(value: f64) -> Self {
        if value.is_finite() {
            Self::Value(value)
        } else {
            Self::CalculationError
        }
    }
}

impl fmt::Display for Atar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => write!(f, "{value}"),
            status => f.write_str(status.status_label().unwrap_or(CALCULATION_ERROR_LABEL)),
        }
    }
}

impl Serialize for Atar {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Value(value) => serializer.serialize_f64(*value),
            _ => serializer.collect_str(self),
        }
    }
}

/// Point conversion; the ineligibility status passes through unchanged.
pub fn te_to_atar_conversion(te: TeScore) -> Atar {
    match te {
        TeScore::Ineligible => Atar::Ineligible,
        TeScore::Value(value) => Atar::from_converted(convert_te_to_atar(value)),
    }
}

/// A TE value as received from callers: a number, a numeric or status string, or
/// nothing at all.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TeInput {
    Number(f64),
    Text(String),
    #[default]
    Missing,
}

enum TeReading {
    Ineligible,
    NotAvailable,
    Number(f64),
    Unparsable,
}

impl TeInput {
    fn read(&self) -> TeReading {
        match self {
            Self::Missing => TeReading::NotAvailable,
            Self::Number(value) if value.is_finite() => TeReading::Number(*value),
            Self::Number(_) => TeReading::Unparsable,
            Self::Text(text) if text == INELIGIBLE_LABEL => TeReading::Ineligible,
            Self::Text(text) if text == NOT_AVAILABLE_LABEL => TeReading::NotAvailable,
            Self::Text(text) => text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .map_or(TeReading::Unparsable, TeReading::Number),
        }
    }
}

impl From<TeScore> for TeInput {
    fn from(te: TeScore) -> Self {
        match te {
            TeScore::Ineligible => Self::Text(INELIGIBLE_LABEL.to_string()),
            TeScore::Value(value) => Self::Number(value),
        }
    }
}

impl From<f64> for TeInput {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for TeInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Status-aware point conversion for loosely typed TE input.
pub fn calculate_and_format_atar(te: &TeInput) -> Atar {
    match te.read() {
        TeReading::Ineligible => Atar::Ineligible,
        TeReading::NotAvailable => Atar::NotAvailable,
        TeReading::Unparsable => Atar::InvalidTe,
        TeReading::Number(value) => Atar::from_converted(convert_te_to_atar(value)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeStatus {
    Ok,
    Ineligible,
    NotAvailable,
    InvalidRange,
    InvalidTe,
    CalculationError,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtarRangeResult {
    pub status: RangeStatus,
    pub lower_atar: Option<f64>,
    pub nominal_atar: Option<f64>,
    pub upper_atar: Option<f64>,
    pub display_string: String,
}

impl AtarRangeResult {
    fn status_only(status: RangeStatus, display: &str) -> Self {
        Self {
            status,
            lower_atar: None,
            nominal_atar: None,
            upper_atar: None,
            display_string: display.to_string(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == RangeStatus::Ok
    }
}

/// Converts a TE range. Any status on the nominal TE or a bound short-circuits; otherwise
/// each bound is converted independently and the first failing one (lower, nominal,
/// upper) decides the status.
pub fn calculate_and_format_atar_range(
    te: &TeInput,
    lower_te: &TeInput,
    upper_te: &TeInput,
) -> AtarRangeResult {
    match te.read() {
        TeReading::Ineligible => {
            return AtarRangeResult::status_only(RangeStatus::Ineligible, INELIGIBLE_LABEL)
        }
        TeReading::NotAvailable => {
            return AtarRangeResult::status_only(RangeStatus::NotAvailable, NOT_AVAILABLE_LABEL)
        }
        TeReading::Number(_) | TeReading::Unparsable => {}
    }

    let bounds = [lower_te.read(), upper_te.read()];
    if bounds
        .iter()
        .any(|bound| matches!(bound, TeReading::Ineligible))
    {
        return AtarRangeResult::status_only(RangeStatus::Ineligible, INELIGIBLE_LABEL);
    }
    if bounds
        .iter()
        .any(|bound| matches!(bound, TeReading::NotAvailable))
    {
        return AtarRangeResult::status_only(RangeStatus::NotAvailable, NOT_AVAILABLE_LABEL);
    }

    let (TeReading::Number(lower), TeReading::Number(nominal), TeReading::Number(upper)) =
        (lower_te.read(), te.read(), upper_te.read())
    else {
        return AtarRangeResult::status_only(RangeStatus::InvalidRange, INVALID_RANGE_LABEL);
    };

    let converted =
        [lower, nominal, upper].map(|value| calculate_and_format_atar(&TeInput::Number(value)));
    match converted {
        [Atar::Value(lower), Atar::Value(nominal), Atar::Value(upper)] => AtarRangeResult {
            status: RangeStatus::Ok,
            lower_atar: Some(lower),
            nominal_atar: Some(nominal),
            upper_atar: Some(upper),
            display_string: format!(
                "{} - {} - {}",
                to_fixed(lower, 2),
                to_fixed(nominal, 2),
                to_fixed(upper, 2)
            ),
        },
        _ => {
            let failed = converted
                .into_iter()
                .find(|atar| atar.value().is_none())
                .unwrap_or(Atar::CalculationError);
            let status = match failed {
                Atar::Ineligible => RangeStatus::Ineligible,
                Atar::NotAvailable => RangeStatus::NotAvailable,
                Atar::InvalidTe => RangeStatus::InvalidTe,
                Atar::Value(_) | Atar::CalculationError => RangeStatus::CalculationError,
            };
            let label = failed.status_label().unwrap_or(CALCULATION_ERROR_LABEL);
            AtarRangeResult::status_only(status, label)
        }
    }
}

impl TeResult {
    pub fn atar(&self) -> Atar {
        te_to_atar_conversion(self.te)
    }

    pub fn atar_range(&self) -> AtarRangeResult {
        calculate_and_format_atar_range(
            &self.te.into(),
            &self.lower_te.into(),
            &self.upper_te.into(),
        )
    }
}
