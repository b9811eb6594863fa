use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::errors::DataError;
use crate::domain::market::{MarketSnapshot, TrendPeriod};
use crate::domain::performance::stats::Stats;
use crate::domain::sentiment::SentimentClassification;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrendScore {
    pub date: NaiveDate,
    pub score: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendReport {
    pub period: TrendPeriod,
    pub scores: Vec<TrendScore>,
    pub current_score: u8,
    #[serde(with = "rust_decimal::serde::float")]
    pub delta_percent: Decimal,
    /// Set when the window opens on a zero reading and the change has no base
    pub delta_undefined: bool,
    pub classification: SentimentClassification,
}

/// First date inside the trailing window ending at `latest`
pub fn window_start(latest: NaiveDate, period: TrendPeriod) -> Option<NaiveDate> {
    period
        .months()
        .and_then(|months| latest.checked_sub_months(Months::new(months)))
}

/// Restricts the Fear & Greed series to a trailing calendar window and
/// summarizes it against its first reading
pub fn aggregate(snapshot: &MarketSnapshot, period: TrendPeriod) -> Result<TrendReport, DataError> {
    let window = match snapshot.last_date().and_then(|latest| window_start(latest, period)) {
        Some(cutoff) => snapshot.since(cutoff),
        None => snapshot.days(),
    };

    let (Some(first), Some(last)) = (window.first(), window.last()) else {
        return Err(DataError::EmptyWindow {
            period: period.to_string(),
        });
    };

    let change = Stats::percent_change(Decimal::from(last.fgi), Decimal::from(first.fgi));
    Ok(TrendReport {
        period,
        scores: window
            .iter()
            .map(|day| TrendScore {
                date: day.date,
                score: day.fgi,
            })
            .collect(),
        current_score: last.fgi,
        delta_percent: change.pct,
        delta_undefined: change.undefined,
        classification: SentimentClassification::from_score(last.fgi),
    })
}
