use crate::domain::errors::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trailing window selector for sentiment trend queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendPeriod {
    Month,
    Quarter,
    Year,
    All,
}

impl TrendPeriod {
    /// Calendar months covered by the window, `None` for the full history
    pub fn months(&self) -> Option<u32> {
        match self {
            TrendPeriod::Month => Some(1),
            TrendPeriod::Quarter => Some(3),
            TrendPeriod::Year => Some(12),
            TrendPeriod::All => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrendPeriod::Month => "month",
            TrendPeriod::Quarter => "quarter",
            TrendPeriod::Year => "year",
            TrendPeriod::All => "all",
        }
    }
}

impl fmt::Display for TrendPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrendPeriod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "month" => Ok(TrendPeriod::Month),
            "quarter" => Ok(TrendPeriod::Quarter),
            "year" => Ok(TrendPeriod::Year),
            "all" => Ok(TrendPeriod::All),
            _ => Err(ValidationError::InvalidPeriod {
                input: s.to_string(),
            }),
        }
    }
}
