use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::domain::errors::ValidationError;
use crate::domain::performance::stats::{Performance, Stats};

/// Largest per-period amount a plan may invest, in USD
pub const MAX_AMOUNT_USD: Decimal = dec!(1000000000);

/// Checks `0 < amount_usd <= MAX_AMOUNT_USD`
pub fn validate_amount(amount_usd: Decimal) -> Result<(), ValidationError> {
    if amount_usd <= Decimal::ZERO {
        return Err(ValidationError::InvalidAmount {
            input: amount_usd.to_string(),
        });
    }
    if amount_usd > MAX_AMOUNT_USD {
        return Err(ValidationError::AmountTooLarge {
            input: amount_usd.to_string(),
            max: MAX_AMOUNT_USD.to_string(),
        });
    }
    Ok(())
}

fn overflow(operation: &str) -> ValidationError {
    ValidationError::Overflow {
        operation: operation.to_string(),
    }
}

/// Running BTC position built up by a DCA plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Portfolio {
    pub invested: Decimal,
    pub btc: Decimal,
    pub purchases: usize,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buys `amount_usd` worth of BTC at `price_usd` and returns the BTC acquired.
    ///
    /// A non-positive price or a total that no longer fits a `Decimal` is an
    /// error; the position is left untouched in that case.
    pub fn buy(&mut self, amount_usd: Decimal, price_usd: Decimal) -> Result<Decimal, ValidationError> {
        if price_usd <= Decimal::ZERO {
            return Err(ValidationError::InvalidParameters {
                reason: format!("cannot buy at a non-positive price ({})", price_usd),
            });
        }
        let btc = amount_usd
            .checked_div(price_usd)
            .ok_or_else(|| overflow("purchase size"))?;
        let invested = self
            .invested
            .checked_add(amount_usd)
            .ok_or_else(|| overflow("total invested"))?;
        let total_btc = self
            .btc
            .checked_add(btc)
            .ok_or_else(|| overflow("BTC position"))?;

        self.invested = invested;
        self.btc = total_btc;
        self.purchases += 1;
        Ok(btc)
    }

    pub fn market_value(&self, price_usd: Decimal) -> Result<Decimal, ValidationError> {
        self.btc
            .checked_mul(price_usd)
            .ok_or_else(|| overflow("portfolio value"))
    }

    pub fn performance(&self, price_usd: Decimal) -> Result<Performance, ValidationError> {
        Ok(Stats::performance_pct(self.market_value(price_usd)?, self.invested))
    }
}
