use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single scheduled DCA purchase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount_usd: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub btc_acquired: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_usd: Decimal,
}

/// Mark-to-market state of a plan at the close of one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressPoint {
    pub date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub portfolio_value_usd: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub btc_cumulative: Decimal,
    pub buy: bool,
    /// Unrealized return on the capital invested so far, in percent
    #[serde(with = "rust_decimal::serde::float")]
    pub performance_relative: Decimal,
}
