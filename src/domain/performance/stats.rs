use rust_decimal::Decimal;
use serde::Serialize;

/// A percentage that may be undefined because its denominator was zero.
///
/// Undefined ratios resolve to 0 with `undefined = true`; NaN or infinity is
/// never produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Performance {
    pub pct: Decimal,
    pub undefined: bool,
}

impl Performance {
    pub fn defined(pct: Decimal) -> Self {
        Self {
            pct,
            undefined: false,
        }
    }

    pub fn undefined() -> Self {
        Self {
            pct: Decimal::ZERO,
            undefined: true,
        }
    }
}

/// Shared statistics utilities for DCA calculations.
pub struct Stats;

impl Stats {
    /// `(final_value / invested - 1) * 100`
    pub fn performance_pct(final_value: Decimal, invested: Decimal) -> Performance {
        if invested.is_zero() {
            return Performance::undefined();
        }
        Performance::defined((final_value / invested - Decimal::ONE) * Decimal::ONE_HUNDRED)
    }

    /// Percentage change of `current` relative to `base`
    pub fn percent_change(current: Decimal, base: Decimal) -> Performance {
        if base.is_zero() {
            return Performance::undefined();
        }
        Performance::defined((current - base) / base * Decimal::ONE_HUNDRED)
    }
}
