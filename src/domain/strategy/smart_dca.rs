//! Smart DCA vocabulary: parameters, per-period action records and run results.
//!
//! A smart plan skips purchases while the Fear & Greed index is at or above
//! `fg_threshold_high`, parking the period's amount in a reserve (the "bag").
//! At or below `fg_threshold_low` it boosts the purchase with part of the bag.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::errors::ValidationError;
use crate::domain::market::Frequency;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SmartDcaParams {
    pub fg_threshold_high: u8,
    pub fg_threshold_low: u8,
    #[serde(with = "rust_decimal::serde::float")]
    pub bag_bonus_pct: Decimal,
    #[serde(rename = "bag_bonus_max", with = "rust_decimal::serde::float")]
    pub bag_bonus_max_usd: Decimal,
}

impl SmartDcaParams {
    pub fn new(
        fg_threshold_high: u8,
        fg_threshold_low: u8,
        bag_bonus_pct: Decimal,
        bag_bonus_max_usd: Decimal,
    ) -> Result<Self, ValidationError> {
        let params = Self {
            fg_threshold_high,
            fg_threshold_low,
            bag_bonus_pct,
            bag_bonus_max_usd,
        };
        params.validate()?;
        Ok(params)
    }

    /// Checks `0 <= low < high <= 100`, `0 <= pct <= 100` and `max >= 0`
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.fg_threshold_high > 100 {
            return Err(ValidationError::InvalidParameters {
                reason: format!(
                    "fg_threshold_high ({}) must be at most 100",
                    self.fg_threshold_high
                ),
            });
        }
        if self.fg_threshold_low >= self.fg_threshold_high {
            return Err(ValidationError::InvalidParameters {
                reason: format!(
                    "fg_threshold_low ({}) must be lower than fg_threshold_high ({})",
                    self.fg_threshold_low, self.fg_threshold_high
                ),
            });
        }
        if self.bag_bonus_pct < Decimal::ZERO || self.bag_bonus_pct > Decimal::ONE_HUNDRED {
            return Err(ValidationError::InvalidParameters {
                reason: format!("bag_bonus_pct ({}) must be within 0..=100", self.bag_bonus_pct),
            });
        }
        if self.bag_bonus_max_usd < Decimal::ZERO {
            return Err(ValidationError::InvalidParameters {
                reason: format!("bag_bonus_max ({}) must not be negative", self.bag_bonus_max_usd),
            });
        }
        Ok(())
    }
}

impl fmt::Display for SmartDcaParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "high={} low={} bonus={}% max=${}",
            self.fg_threshold_high,
            self.fg_threshold_low,
            self.bag_bonus_pct.normalize(),
            self.bag_bonus_max_usd.normalize()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmartAction {
    Buy,
    BuyBoosted,
    Skip,
}

/// What the plan did on one scheduled period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub date: NaiveDate,
    pub fgi: u8,
    pub action: SmartAction,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount_invested: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub bonus_used: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub cumulative_invested: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub bag_after: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub btc_acquired: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmartDcaResult {
    pub frequency: Frequency,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_invested: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub btc_total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub final_value: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub bag_used: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub bag_remaining: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub performance_pct: Decimal,
    pub performance_undefined: bool,
    pub history: Vec<ActionRecord>,
}

impl SmartDcaResult {
    /// Sum of every period amount parked in the bag on greed days
    pub fn total_diverted(&self) -> Decimal {
        let mut previous_bag = Decimal::ZERO;
        let mut diverted = Decimal::ZERO;
        for record in &self.history {
            if record.action == SmartAction::Skip {
                diverted += record.bag_after - previous_bag;
            }
            previous_bag = record.bag_after;
        }
        diverted
    }
}
