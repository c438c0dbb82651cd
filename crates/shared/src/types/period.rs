//! Reporting period spans.

use serde::{Deserialize, Serialize};

/// Length of one reporting period.
///
/// Configuration accepts any casing and the short forms `mth`, `qtr` and `yr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum PeriodSpan {
    /// One calendar month.
    Month,
    /// Three calendar months.
    Quarter,
    /// Twelve calendar months.
    Year,
}

impl PeriodSpan {
    /// Number of calendar months covered by one period.
    #[must_use]
    pub const fn months(self) -> u32 {
        match self {
            Self::Month => 1,
            Self::Quarter => 3,
            Self::Year => 12,
        }
    }
}

impl std::str::FromStr for PeriodSpan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "month" | "mth" => Ok(Self::Month),
            "quarter" | "qtr" => Ok(Self::Quarter),
            "year" | "yr" => Ok(Self::Year),
            _ => Err(format!("Unknown period span: {s}")),
        }
    }
}

impl TryFrom<String> for PeriodSpan {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
