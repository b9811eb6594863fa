//! Purchase calendars for fixed-frequency plans.
//!
//! A calendar lists the dates a plan intends to buy on, from the start date up
//! to the last available market date. Dates without market data are dropped
//! later by the simulators; they are never moved to the next trading day.

use chrono::{Datelike, Days, Months, NaiveDate};

use crate::domain::errors::ValidationError;
use crate::domain::market::Frequency;

/// Checks `day` against the valid range of `frequency`
pub fn validate_day(frequency: Frequency, day: u32) -> Result<(), ValidationError> {
    if day == 0 || day > frequency.max_day() {
        return Err(ValidationError::InvalidScheduleDay {
            frequency: frequency.to_string(),
            day,
            max: frequency.max_day(),
        });
    }
    Ok(())
}

/// Every scheduled purchase date in `start..=end`.
///
/// * daily: every calendar day
/// * weekly: every 7 days from `start`, or from the first date whose ISO
///   weekday (1 = Monday) equals `day`
/// * monthly: the day-of-month of `start` (or `day`), clamped to the month length
pub fn purchase_dates(
    start: NaiveDate,
    end: NaiveDate,
    frequency: Frequency,
    day: Option<u32>,
) -> Result<Vec<NaiveDate>, ValidationError> {
    if let Some(day) = day {
        validate_day(frequency, day)?;
    }
    if end < start {
        return Ok(Vec::new());
    }

    let dates = match frequency {
        Frequency::Daily => step_days(start, end, 1),
        Frequency::Weekly => {
            let first = match day {
                Some(weekday) => {
                    let current = start.weekday().number_from_monday();
                    let offset = (weekday + 7 - current) % 7;
                    start + Days::new(u64::from(offset))
                }
                None => start,
            };
            step_days(first, end, 7)
        }
        Frequency::Monthly => monthly(start, end, day.unwrap_or_else(|| start.day())),
    };
    Ok(dates)
}

fn step_days(first: NaiveDate, end: NaiveDate, step: u64) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current = first;
    while current <= end {
        dates.push(current);
        match current.checked_add_days(Days::new(step)) {
            Some(next) => current = next,
            None => break,
        }
    }
    dates
}

fn monthly(start: NaiveDate, end: NaiveDate, day: u32) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let Some(mut month_start) = start.with_day(1) else {
        return dates;
    };
    while month_start <= end {
        let date = clamp_to_month(month_start, day);
        if date >= start && date <= end {
            dates.push(date);
        }
        match month_start.checked_add_months(Months::new(1)) {
            Some(next) => month_start = next,
            None => break,
        }
    }
    dates
}

/// `day` within the month of `month_start`, or the month's last day if shorter
fn clamp_to_month(month_start: NaiveDate, day: u32) -> NaiveDate {
    let last_day = month_start
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28);
    month_start
        .with_day(day.min(last_day))
        .unwrap_or(month_start)
}
