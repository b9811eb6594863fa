//! Immutable, date-ordered view of the market data store.
//!
//! Every simulation and optimization run borrows one `MarketSnapshot` behind an
//! `Arc` for its whole duration. The snapshot is never mutated after
//! construction; reloading the store produces a new snapshot instead.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::warn;

use crate::domain::market::market_day::{MarketDay, PricePoint};
use crate::domain::sentiment::SentimentPoint;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketSnapshot {
    days: Vec<MarketDay>,
}

impl MarketSnapshot {
    /// Builds a snapshot, ordering rows by date. Duplicate dates keep the first
    /// row; rows with a non-positive price or an index above 100 are dropped.
    pub fn new(mut days: Vec<MarketDay>) -> Self {
        days.retain(|d| {
            let valid = d.is_valid();
            if !valid {
                warn!(
                    "MarketSnapshot: Dropping {} (price={}, fg={})",
                    d.date, d.price_usd, d.fgi
                );
            }
            valid
        });
        days.sort_by_key(|d| d.date);
        days.dedup_by_key(|d| d.date);
        Self { days }
    }

    pub fn days(&self) -> &[MarketDay] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.days.first().map(|d| d.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.days.last().map(|d| d.date)
    }

    pub fn last_day(&self) -> Option<&MarketDay> {
        self.days.last()
    }

    /// Price of the last available day, used to mark every run to market
    pub fn last_price(&self) -> Option<Decimal> {
        self.days.last().map(|d| d.price_usd)
    }

    pub fn day(&self, date: NaiveDate) -> Option<&MarketDay> {
        self.days
            .binary_search_by_key(&date, |d| d.date)
            .ok()
            .map(|idx| &self.days[idx])
    }

    /// All rows dated on or after `start`
    pub fn since(&self, start: NaiveDate) -> &[MarketDay] {
        let idx = self.days.partition_point(|d| d.date < start);
        &self.days[idx..]
    }

    pub fn price_series(&self) -> Vec<PricePoint> {
        self.days.iter().map(MarketDay::price_point).collect()
    }

    pub fn sentiment_series(&self) -> Vec<SentimentPoint> {
        self.days.iter().map(MarketDay::sentiment_point).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_snapshot_sorts_and_dedups() {
        let snapshot = MarketSnapshot::new(vec![
            MarketDay::new(d(2020, 1, 3), dec!(300), 30),
            MarketDay::new(d(2020, 1, 1), dec!(100), 10),
            MarketDay::new(d(2020, 1, 1), dec!(999), 99),
            MarketDay::new(d(2020, 1, 2), dec!(200), 20),
        ]);

        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.first_date(), Some(d(2020, 1, 1)));
        assert_eq!(snapshot.last_date(), Some(d(2020, 1, 3)));
        assert_eq!(snapshot.day(d(2020, 1, 1)).unwrap().price_usd, dec!(100));
        assert_eq!(snapshot.last_price(), Some(dec!(300)));
    }

    #[test]
    fn test_since_and_lookup() {
        let snapshot = MarketSnapshot::new(vec![
            MarketDay::new(d(2020, 1, 1), dec!(100), 10),
            MarketDay::new(d(2020, 1, 5), dec!(500), 50),
        ]);

        assert_eq!(snapshot.since(d(2020, 1, 2)).len(), 1);
        assert_eq!(snapshot.since(d(2019, 12, 31)).len(), 2);
        assert!(snapshot.since(d(2020, 2, 1)).is_empty());
        assert!(snapshot.day(d(2020, 1, 3)).is_none());
        assert_eq!(snapshot.sentiment_series()[1].index, 50);
        assert_eq!(snapshot.price_series()[0].price_usd, dec!(100));
    }

    #[test]
    fn test_unusable_rows_are_dropped() {
        let snapshot = MarketSnapshot::new(vec![
            MarketDay::new(d(2020, 1, 1), dec!(100), 10),
            MarketDay::new(d(2020, 1, 2), Decimal::ZERO, 20),
            MarketDay::new(d(2020, 1, 3), dec!(-5), 20),
            MarketDay::new(d(2020, 1, 4), dec!(400), 101),
            MarketDay::new(d(2020, 1, 5), dec!(500), 100),
        ]);

        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.day(d(2020, 1, 2)).is_none());
        assert!(snapshot.day(d(2020, 1, 4)).is_none());
        assert_eq!(snapshot.last_price(), Some(dec!(500)));
    }
}
