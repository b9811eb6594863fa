use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::application::optimization::schedule;
use crate::domain::errors::ValidationError;
use crate::domain::market::{Frequency, MarketSnapshot};
use crate::domain::trading::portfolio::{Portfolio, validate_amount};
use crate::domain::trading::types::{ProgressPoint, Purchase};

/// Typed input of a fixed-frequency backtest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BacktestRequest {
    pub amount_usd: Decimal,
    pub start: NaiveDate,
    pub frequency: Frequency,
    /// ISO weekday for weekly plans, day-of-month for monthly plans
    pub day: Option<u32>,
}

impl BacktestRequest {
    pub fn new(amount_usd: Decimal, start: NaiveDate, frequency: Frequency) -> Self {
        Self {
            amount_usd,
            start,
            frequency,
            day: None,
        }
    }

    pub fn on_day(mut self, day: u32) -> Self {
        self.day = Some(day);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_amount(self.amount_usd)?;
        if let Some(day) = self.day {
            schedule::validate_day(self.frequency, day)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BacktestReport {
    pub num_purchases: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_invested: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_btc: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub final_value: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub lump_value: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub performance_pct: Decimal,
    pub performance_undefined: bool,
    pub data_unavailable: bool,
    pub progress: Vec<ProgressPoint>,
    pub purchases: Vec<Purchase>,
}

impl BacktestReport {
    fn unavailable() -> Self {
        Self {
            num_purchases: 0,
            total_invested: Decimal::ZERO,
            total_btc: Decimal::ZERO,
            final_value: Decimal::ZERO,
            lump_value: Decimal::ZERO,
            performance_pct: Decimal::ZERO,
            performance_undefined: true,
            data_unavailable: true,
            progress: Vec::new(),
            purchases: Vec::new(),
        }
    }
}

/// Replays a fixed-frequency DCA plan over a market snapshot
#[derive(Debug, Clone)]
pub struct Simulator {
    snapshot: Arc<MarketSnapshot>,
}

impl Simulator {
    pub fn new(snapshot: Arc<MarketSnapshot>) -> Self {
        Self { snapshot }
    }

    pub fn snapshot(&self) -> &Arc<MarketSnapshot> {
        &self.snapshot
    }

    pub fn run(&self, request: &BacktestRequest) -> Result<BacktestReport, ValidationError> {
        request.validate()?;

        let days = self.snapshot.since(request.start);
        let (Some(first_day), Some(last_day)) = (days.first(), days.last()) else {
            debug!(
                "Simulator: no market data on or after {} ({} rows in store)",
                request.start,
                self.snapshot.len()
            );
            return Ok(BacktestReport::unavailable());
        };

        let calendar = schedule::purchase_dates(
            request.start,
            last_day.date,
            request.frequency,
            request.day,
        )?;
        let mut scheduled = calendar.into_iter().peekable();

        let mut portfolio = Portfolio::new();
        let mut purchases = Vec::new();
        let mut progress = Vec::with_capacity(days.len());

        for day in days {
            // Scheduled dates with no row are skipped, not carried over
            while scheduled.next_if(|date| *date < day.date).is_some() {}

            let buy = scheduled.next_if_eq(&day.date).is_some();
            if buy {
                let btc_acquired = portfolio.buy(request.amount_usd, day.price_usd)?;
                purchases.push(Purchase {
                    date: day.date,
                    amount_usd: request.amount_usd,
                    btc_acquired,
                    price_usd: day.price_usd,
                });
            }

            progress.push(ProgressPoint {
                date: day.date,
                portfolio_value_usd: portfolio.market_value(day.price_usd)?,
                btc_cumulative: portfolio.btc,
                buy,
                performance_relative: portfolio.performance(day.price_usd)?.pct,
            });
        }

        let final_price = last_day.price_usd;
        let final_value = portfolio.market_value(final_price)?;
        let performance = portfolio.performance(final_price)?;
        let lump_value = lump_sum_value(portfolio.invested, first_day.price_usd, final_price)?;

        debug!(
            "Simulator: {} {} purchases from {}, invested={} final={}",
            purchases.len(),
            request.frequency,
            request.start,
            portfolio.invested,
            final_value
        );

        Ok(BacktestReport {
            num_purchases: portfolio.purchases,
            total_invested: portfolio.invested,
            total_btc: portfolio.btc,
            final_value,
            lump_value,
            performance_pct: performance.pct,
            performance_undefined: performance.undefined,
            data_unavailable: false,
            progress,
            purchases,
        })
    }
}

/// Value of `invested` bought in one go at `first_price`, marked at `final_price`
fn lump_sum_value(
    invested: Decimal,
    first_price: Decimal,
    final_price: Decimal,
) -> Result<Decimal, ValidationError> {
    invested
        .checked_div(first_price)
        .and_then(|btc| btc.checked_mul(final_price))
        .ok_or_else(|| ValidationError::Overflow {
            operation: "lump sum value".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::MarketDay;
    use chrono::Days;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn daily_snapshot(start: NaiveDate, prices: &[Decimal]) -> Arc<MarketSnapshot> {
        let days = prices
            .iter()
            .enumerate()
            .map(|(i, price)| MarketDay::new(start + Days::new(i as u64), *price, 50))
            .collect();
        Arc::new(MarketSnapshot::new(days))
    }

    #[test]
    fn test_daily_backtest_totals() {
        let snapshot = daily_snapshot(d(2020, 1, 1), &[dec!(100), dec!(200), dec!(400)]);
        let simulator = Simulator::new(snapshot);

        let report = simulator
            .run(&BacktestRequest::new(dec!(100), d(2020, 1, 1), Frequency::Daily))
            .unwrap();

        assert_eq!(report.num_purchases, 3);
        assert_eq!(report.total_invested, dec!(300));
        assert_eq!(report.total_btc, dec!(1.75));
        assert_eq!(report.final_value, dec!(700));
        assert_eq!(report.lump_value, dec!(1200));
        assert_eq!(report.performance_pct.round_dp(6), dec!(133.333333));
        assert_eq!(report.progress.len(), 3);
        assert!(report.progress.iter().all(|p| p.buy));
        assert_eq!(report.progress[1].performance_relative, dec!(50));
    }

    #[test]
    fn test_gap_on_scheduled_date_is_skipped() {
        let snapshot = Arc::new(MarketSnapshot::new(vec![
            MarketDay::new(d(2020, 1, 1), dec!(100), 50),
            MarketDay::new(d(2020, 1, 9), dec!(100), 50),
            MarketDay::new(d(2020, 1, 15), dec!(200), 50),
        ]));
        let simulator = Simulator::new(snapshot);

        let report = simulator
            .run(&BacktestRequest::new(dec!(10), d(2020, 1, 1), Frequency::Weekly))
            .unwrap();

        // 2020-01-08 has no row and is not moved to 2020-01-09
        assert_eq!(report.num_purchases, 2);
        assert_eq!(report.purchases[1].date, d(2020, 1, 15));
        assert_eq!(report.progress.len(), 3);
        assert!(!report.progress[1].buy);
    }

    #[test]
    fn test_start_after_data_is_unavailable() {
        let snapshot = daily_snapshot(d(2020, 1, 1), &[dec!(100)]);
        let report = Simulator::new(snapshot)
            .run(&BacktestRequest::new(dec!(100), d(2021, 1, 1), Frequency::Daily))
            .unwrap();

        assert!(report.data_unavailable);
        assert!(report.performance_undefined);
        assert_eq!(report.performance_pct, Decimal::ZERO);
    }

    #[test]
    fn test_no_purchase_performance_is_flagged() {
        let snapshot = daily_snapshot(d(2020, 1, 1), &[dec!(100), dec!(110)]);
        // Monthly on day 31 never lands inside a two-day window
        let report = Simulator::new(snapshot)
            .run(&BacktestRequest::new(dec!(100), d(2020, 1, 1), Frequency::Monthly).on_day(31))
            .unwrap();

        assert_eq!(report.num_purchases, 0);
        assert!(report.performance_undefined);
        assert!(!report.data_unavailable);
        assert_eq!(report.progress[1].performance_relative, Decimal::ZERO);
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let snapshot = daily_snapshot(d(2020, 1, 1), &[dec!(100)]);
        let simulator = Simulator::new(snapshot);
        let err = simulator
            .run(&BacktestRequest::new(dec!(0), d(2020, 1, 1), Frequency::Daily))
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidAmount { .. }));
    }

    #[test]
    fn test_oversized_amount_rejected() {
        let snapshot = daily_snapshot(d(2020, 1, 1), &[dec!(100)]);
        let err = Simulator::new(snapshot)
            .run(&BacktestRequest::new(
                Decimal::from_scientific("1e27").unwrap(),
                d(2020, 1, 1),
                Frequency::Daily,
            ))
            .unwrap_err();
        assert!(matches!(err, ValidationError::AmountTooLarge { .. }));
    }

    #[test]
    fn test_lump_sum_overflow_is_an_error() {
        let err = lump_sum_value(dec!(1000), dec!(0.0000001), Decimal::MAX).unwrap_err();
        assert!(matches!(err, ValidationError::Overflow { .. }));
        assert_eq!(
            lump_sum_value(dec!(2400), dec!(10000), dec!(50000)).unwrap(),
            dec!(12000)
        );
    }
}
