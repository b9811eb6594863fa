use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One daily reading of the Crypto Fear & Greed index (0 = extreme fear, 100 = extreme greed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentPoint {
    pub date: NaiveDate,
    pub index: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentClassification {
    ExtremeFear,
    Fear,
    Neutral,
    Greed,
    ExtremeGreed,
}

impl fmt::Display for SentimentClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExtremeFear => write!(f, "Extreme Fear"),
            Self::Fear => write!(f, "Fear"),
            Self::Neutral => write!(f, "Neutral"),
            Self::Greed => write!(f, "Greed"),
            Self::ExtremeGreed => write!(f, "Extreme Greed"),
        }
    }
}

impl SentimentClassification {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=24 => Self::ExtremeFear,
            25..=44 => Self::Fear,
            45..=55 => Self::Neutral,
            56..=75 => Self::Greed,
            _ => Self::ExtremeGreed,
        }
    }
}
