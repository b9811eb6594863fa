use chrono::NaiveDate;
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::application::optimization::simulator::{BacktestRequest, Simulator};
use crate::domain::errors::ValidationError;
use crate::domain::market::{Frequency, MarketSnapshot};

/// Outcome of one (frequency, day) plan in a schedule search
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleOutcome {
    pub frequency: Frequency,
    pub day: u32,
    pub num_purchases: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_invested: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub final_value: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub performance_pct: Decimal,
}

/// Exhaustive backtest of every purchase day for every frequency.
///
/// Each combination runs its own `Simulator` pass over the shared snapshot on
/// the rayon pool; nothing is shared between runs besides the read-only data.
/// Results come back in enumeration order, unranked.
pub struct BestScheduleSearch {
    simulator: Simulator,
}

impl BestScheduleSearch {
    pub fn new(snapshot: Arc<MarketSnapshot>) -> Self {
        Self {
            simulator: Simulator::new(snapshot),
        }
    }

    /// Every `(frequency, day)` pair: daily x {1}, weekly x 1..=7, monthly x 1..=31
    pub fn combinations() -> Vec<(Frequency, u32)> {
        Frequency::all()
            .into_iter()
            .flat_map(|frequency| (1..=frequency.max_day()).map(move |day| (frequency, day)))
            .collect()
    }

    pub fn run(
        &self,
        amount_usd: Decimal,
        start: NaiveDate,
    ) -> Result<Vec<ScheduleOutcome>, ValidationError> {
        let combinations = Self::combinations();
        info!(
            "BestScheduleSearch: Evaluating {} schedules from {}",
            combinations.len(),
            start
        );

        combinations
            .into_par_iter()
            .map(|(frequency, day)| {
                let request = match frequency {
                    // A daily plan has no day-of-period
                    Frequency::Daily => BacktestRequest::new(amount_usd, start, frequency),
                    _ => BacktestRequest::new(amount_usd, start, frequency).on_day(day),
                };
                let report = self.simulator.run(&request)?;
                Ok(ScheduleOutcome {
                    frequency,
                    day,
                    num_purchases: report.num_purchases,
                    total_invested: report.total_invested,
                    final_value: report.final_value,
                    performance_pct: report.performance_pct,
                })
            })
            .collect()
    }
}
