use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// All monetary values (R$). Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Percentages in percentage points, the way the quoting form collects them (18 = 18%).
pub type Percent = Decimal;

/// Energy in kilowatt-hours.
pub type Kwh = Decimal;

/// Installed (nameplate) capacity in kilowatt-peak.
pub type Kwp = Decimal;

/// Year counts or fractions
pub type Years = Decimal;

/// Calendar month of a consumption reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Month {
    Jan,
    Feb,
    Mar,
    Apr,
    May,
    Jun,
    Jul,
    Aug,
    Sep,
    Oct,
    Nov,
    Dec,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::Jan,
        Month::Feb,
        Month::Mar,
        Month::Apr,
        Month::May,
        Month::Jun,
        Month::Jul,
        Month::Aug,
        Month::Sep,
        Month::Oct,
        Month::Nov,
        Month::Dec,
    ];

    /// Zero-based position in the calendar year.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Month::Jan => "jan",
            Month::Feb => "feb",
            Month::Mar => "mar",
            Month::Apr => "apr",
            Month::May => "may",
            Month::Jun => "jun",
            Month::Jul => "jul",
            Month::Aug => "aug",
            Month::Sep => "sep",
            Month::Oct => "oct",
            Month::Nov => "nov",
            Month::Dec => "dec",
        }
    }
}

/// Number of properties (consumer units) a single quote can combine.
pub const PROPERTY_COUNT: usize = 4;

/// A consumer unit sharing the generator's credits. `P1` hosts the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Property {
    P1,
    P2,
    P3,
    P4,
}

impl Property {
    pub const ALL: [Property; PROPERTY_COUNT] =
        [Property::P1, Property::P2, Property::P3, Property::P4];

    /// The property where the generator is installed.
    pub const PRIMARY: Property = Property::P1;

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_primary(self) -> bool {
        self == Property::PRIMARY
    }
}

/// Time for accumulated savings to cover the project cost.
///
/// `NotApplicable` is reported when the system produces no savings; it is
/// never collapsed into a zero-year payback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payback {
    Years(Years),
    NotApplicable,
}

const NOT_APPLICABLE: &str = "not_applicable";

impl Payback {
    pub fn years(&self) -> Option<Years> {
        match self {
            Payback::Years(y) => Some(*y),
            Payback::NotApplicable => None,
        }
    }

    pub fn is_applicable(&self) -> bool {
        matches!(self, Payback::Years(_))
    }
}

impl fmt::Display for Payback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payback::Years(y) => write!(f, "{} years", y.round_dp(1)),
            Payback::NotApplicable => write!(f, "not applicable"),
        }
    }
}

impl Serialize for Payback {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Payback::Years(y) => Serialize::serialize(y, serializer),
            Payback::NotApplicable => serializer.serialize_str(NOT_APPLICABLE),
        }
    }
}

impl<'de> Deserialize<'de> for Payback {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Years(Decimal),
            Label(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Years(y) => Ok(Payback::Years(y)),
            Repr::Label(s) if s == NOT_APPLICABLE => Ok(Payback::NotApplicable),
            Repr::Label(s) => Err(serde::de::Error::custom(format!(
                "expected a number of years or \"{NOT_APPLICABLE}\", got \"{s}\""
            ))),
        }
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
