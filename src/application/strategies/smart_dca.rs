//! Sentiment-conditioned DCA.
//!
//! The evaluator resolves the purchase calendar against the snapshot once at
//! construction; every parameter set is then replayed over the same list of
//! periods. That keeps thousands of optimizer evaluations cheap and makes the
//! score of a parameter set a pure function of the parameters.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use std::sync::Arc;
use tracing::debug;

use crate::application::optimization::schedule;
use crate::domain::errors::{FitnessError, ValidationError};
use crate::domain::market::{Frequency, MarketDay, MarketSnapshot};
use crate::domain::performance::stats::Stats;
use crate::domain::ports::FitnessEvaluator;
use crate::domain::strategy::{ActionRecord, SmartAction, SmartDcaParams, SmartDcaResult};
use crate::domain::trading::portfolio::{Portfolio, validate_amount};

/// Decimal places kept on a bonus drawn from the bag
const BONUS_SCALE: u32 = 8;

pub struct SmartDcaEvaluator {
    amount_usd: Decimal,
    frequency: Frequency,
    periods: Vec<MarketDay>,
    last_price: Option<Decimal>,
}

/// End state of one replay
struct Ledger {
    portfolio: Portfolio,
    bag: Decimal,
    bag_used: Decimal,
}

impl SmartDcaEvaluator {
    pub fn new(
        snapshot: Arc<MarketSnapshot>,
        amount_usd: Decimal,
        start: NaiveDate,
        frequency: Frequency,
    ) -> Result<Self, ValidationError> {
        validate_amount(amount_usd)?;

        let periods = match snapshot.last_date() {
            Some(end) => schedule::purchase_dates(start, end, frequency, None)?
                .into_iter()
                .filter_map(|date| snapshot.day(date).copied())
                .collect(),
            None => Vec::new(),
        };

        debug!(
            "SmartDcaEvaluator: {} {} periods from {}",
            periods.len(),
            frequency,
            start
        );

        Ok(Self {
            amount_usd,
            frequency,
            periods,
            last_price: snapshot.last_price(),
        })
    }

    pub fn amount_usd(&self) -> Decimal {
        self.amount_usd
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn period_count(&self) -> usize {
        self.periods.len()
    }

    /// Full replay with one `ActionRecord` per scheduled period
    pub fn run(&self, params: &SmartDcaParams) -> Result<SmartDcaResult, ValidationError> {
        params.validate()?;
        let mut history = Vec::with_capacity(self.periods.len());
        let ledger = self.replay(params, |record| history.push(record))?;

        let final_value = self.final_value(&ledger.portfolio)?;
        let performance = Stats::performance_pct(final_value, ledger.portfolio.invested);

        Ok(SmartDcaResult {
            frequency: self.frequency,
            total_invested: ledger.portfolio.invested,
            btc_total: ledger.portfolio.btc,
            final_value,
            bag_used: ledger.bag_used,
            bag_remaining: ledger.bag,
            performance_pct: performance.pct,
            performance_undefined: performance.undefined,
            history,
        })
    }

    fn final_value(&self, portfolio: &Portfolio) -> Result<Decimal, ValidationError> {
        match self.last_price {
            Some(price) => portfolio.market_value(price),
            None => Ok(Decimal::ZERO),
        }
    }

    fn replay(
        &self,
        params: &SmartDcaParams,
        mut on_action: impl FnMut(ActionRecord),
    ) -> Result<Ledger, ValidationError> {
        let mut ledger = Ledger {
            portfolio: Portfolio::new(),
            bag: Decimal::ZERO,
            bag_used: Decimal::ZERO,
        };

        for day in &self.periods {
            let (action, invest, bonus) = if day.fgi >= params.fg_threshold_high {
                ledger.bag = checked(ledger.bag.checked_add(self.amount_usd), "bag")?;
                (SmartAction::Skip, Decimal::ZERO, Decimal::ZERO)
            } else if day.fgi <= params.fg_threshold_low {
                let bonus = bonus_from_bag(ledger.bag, params)?;
                ledger.bag -= bonus;
                ledger.bag_used += bonus;
                let invest = checked(self.amount_usd.checked_add(bonus), "boosted purchase")?;
                (SmartAction::BuyBoosted, invest, bonus)
            } else {
                (SmartAction::Buy, self.amount_usd, Decimal::ZERO)
            };

            let btc_acquired = if invest.is_zero() {
                Decimal::ZERO
            } else {
                ledger.portfolio.buy(invest, day.price_usd)?
            };

            on_action(ActionRecord {
                date: day.date,
                fgi: day.fgi,
                action,
                amount_invested: invest,
                bonus_used: bonus,
                cumulative_invested: ledger.portfolio.invested,
                bag_after: ledger.bag,
                btc_acquired,
            });
        }

        Ok(ledger)
    }
}

fn checked(value: Option<Decimal>, operation: &str) -> Result<Decimal, ValidationError> {
    value.ok_or_else(|| ValidationError::Overflow {
        operation: operation.to_string(),
    })
}

/// `min(bag * pct / 100, max, bag)`, truncated so it never exceeds the bag
fn bonus_from_bag(bag: Decimal, params: &SmartDcaParams) -> Result<Decimal, ValidationError> {
    let share = checked(bag.checked_mul(params.bag_bonus_pct), "bag bonus")?
        / Decimal::ONE_HUNDRED;
    Ok(share
        .round_dp_with_strategy(BONUS_SCALE, RoundingStrategy::ToZero)
        .min(params.bag_bonus_max_usd)
        .min(bag)
        .max(Decimal::ZERO))
}

impl FitnessEvaluator for SmartDcaEvaluator {
    fn fitness(&self, params: &SmartDcaParams) -> Result<Decimal, FitnessError> {
        params.validate()?;
        let ledger = self.replay(params, |_| {})?;
        let final_value = self.final_value(&ledger.portfolio)?;
        let performance = Stats::performance_pct(final_value, ledger.portfolio.invested);
        if performance.undefined {
            return Err(FitnessError::Undefined);
        }
        Ok(performance.pct)
    }
}
