//! Request bodies and query strings of the HTTP API.
//!
//! Fields arrive untyped (numbers or numeric strings) and are parsed into
//! the typed engine requests here, before any simulation runs.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::application::optimization::StrategyRequest;
use crate::application::optimization::simulator::BacktestRequest;
use crate::domain::errors::ValidationError;
use crate::domain::market::{Frequency, TrendPeriod};
use crate::domain::strategy::SmartDcaParams;
use crate::domain::trading::portfolio::validate_amount;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A JSON field sent either as a number or as a string
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FlexibleValue {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for FlexibleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlexibleValue::Number(n) => write!(f, "{}", n),
            FlexibleValue::Text(s) => f.write_str(s.trim()),
        }
    }
}

fn required<'a, T>(value: Option<&'a T>, field: &str) -> Result<&'a T, ValidationError> {
    value.ok_or_else(|| ValidationError::MissingField {
        field: field.to_string(),
    })
}

fn decimal(value: &FlexibleValue) -> Option<Decimal> {
    let text = value.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

pub fn parse_amount(value: Option<&FlexibleValue>) -> Result<Decimal, ValidationError> {
    let value = required(value, "amount")?;
    let amount = decimal(value).ok_or_else(|| ValidationError::InvalidAmount {
        input: value.to_string(),
    })?;
    validate_amount(amount).map_err(|err| match err {
        ValidationError::InvalidAmount { .. } => ValidationError::InvalidAmount {
            input: value.to_string(),
        },
        other => other,
    })?;
    Ok(amount.normalize())
}

pub fn parse_date(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| ValidationError::InvalidDate {
        input: value.to_string(),
    })
}

fn parse_flexible_date(value: &FlexibleValue) -> Result<NaiveDate, ValidationError> {
    parse_date(&value.to_string())
}

fn parse_day(value: &FlexibleValue) -> Result<u32, ValidationError> {
    value
        .to_string()
        .parse::<u32>()
        .map_err(|_| ValidationError::InvalidParameters {
            reason: format!("day must be a positive integer, got '{}'", value),
        })
}

fn parse_threshold(value: &FlexibleValue, field: &str) -> Result<u8, ValidationError> {
    decimal(value)
        .filter(|d| d.fract().is_zero() && *d >= Decimal::ZERO && *d <= Decimal::ONE_HUNDRED)
        .and_then(|d| d.to_u8())
        .ok_or_else(|| ValidationError::InvalidParameters {
            reason: format!("{} must be an integer within 0..=100, got '{}'", field, value),
        })
}

fn parse_parameter(value: &FlexibleValue, field: &str) -> Result<Decimal, ValidationError> {
    decimal(value).ok_or_else(|| ValidationError::InvalidParameters {
        reason: format!("{} must be a number, got '{}'", field, value),
    })
}

fn strategy_request(
    amount: Option<&FlexibleValue>,
    start: Option<&FlexibleValue>,
    frequency: Option<&FlexibleValue>,
) -> Result<StrategyRequest, ValidationError> {
    let amount_usd = parse_amount(amount)?;
    let start = parse_flexible_date(required(start, "start")?)?;
    let frequency = Frequency::from_str(&required(frequency, "frequency")?.to_string())?;
    Ok(StrategyRequest::new(amount_usd, start, frequency))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DcaBody {
    pub amount: Option<FlexibleValue>,
    pub start: Option<FlexibleValue>,
    pub frequency: Option<FlexibleValue>,
    pub day: Option<FlexibleValue>,
}

impl TryFrom<DcaBody> for BacktestRequest {
    type Error = ValidationError;

    fn try_from(body: DcaBody) -> Result<Self, Self::Error> {
        let run = strategy_request(
            body.amount.as_ref(),
            body.start.as_ref(),
            body.frequency.as_ref(),
        )?;
        let request = BacktestRequest::new(run.amount_usd, run.start, run.frequency);
        let request = match &body.day {
            Some(day) => request.on_day(parse_day(day)?),
            None => request,
        };
        request.validate()?;
        Ok(request)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BestDaysBody {
    pub amount: Option<FlexibleValue>,
    pub start: Option<FlexibleValue>,
}

/// Typed `/api/best-days` request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BestDaysRequest {
    pub amount_usd: Decimal,
    pub start: NaiveDate,
}

impl TryFrom<BestDaysBody> for BestDaysRequest {
    type Error = ValidationError;

    fn try_from(body: BestDaysBody) -> Result<Self, Self::Error> {
        Ok(Self {
            amount_usd: parse_amount(body.amount.as_ref())?,
            start: parse_flexible_date(required(body.start.as_ref(), "start")?)?,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StrategyBody {
    pub amount: Option<FlexibleValue>,
    pub start: Option<FlexibleValue>,
    pub frequency: Option<FlexibleValue>,
}

impl TryFrom<StrategyBody> for StrategyRequest {
    type Error = ValidationError;

    fn try_from(body: StrategyBody) -> Result<Self, Self::Error> {
        strategy_request(
            body.amount.as_ref(),
            body.start.as_ref(),
            body.frequency.as_ref(),
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SmartDcaBody {
    pub amount: Option<FlexibleValue>,
    pub start: Option<FlexibleValue>,
    pub frequency: Option<FlexibleValue>,
    pub fg_threshold_high: Option<FlexibleValue>,
    pub fg_threshold_low: Option<FlexibleValue>,
    pub bag_bonus_pct: Option<FlexibleValue>,
    pub bag_bonus_max: Option<FlexibleValue>,
}

/// Typed `/api/smart-dca` request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmartDcaRequest {
    pub run: StrategyRequest,
    pub params: SmartDcaParams,
}

impl TryFrom<SmartDcaBody> for SmartDcaRequest {
    type Error = ValidationError;

    fn try_from(body: SmartDcaBody) -> Result<Self, Self::Error> {
        let run = strategy_request(
            body.amount.as_ref(),
            body.start.as_ref(),
            body.frequency.as_ref(),
        )?;
        let params = SmartDcaParams::new(
            parse_threshold(
                required(body.fg_threshold_high.as_ref(), "fg_threshold_high")?,
                "fg_threshold_high",
            )?,
            parse_threshold(
                required(body.fg_threshold_low.as_ref(), "fg_threshold_low")?,
                "fg_threshold_low",
            )?,
            parse_parameter(required(body.bag_bonus_pct.as_ref(), "bag_bonus_pct")?, "bag_bonus_pct")?,
            parse_parameter(required(body.bag_bonus_max.as_ref(), "bag_bonus_max")?, "bag_bonus_max")?,
        )?;
        Ok(Self { run, params })
    }
}

/// Query string of `/api/optimize-stream`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamQuery {
    pub amount: Option<String>,
    pub start: Option<String>,
    pub frequency: Option<String>,
}

impl TryFrom<StreamQuery> for StrategyRequest {
    type Error = ValidationError;

    fn try_from(query: StreamQuery) -> Result<Self, Self::Error> {
        let text = |v: Option<String>| v.map(FlexibleValue::Text);
        strategy_request(
            text(query.amount).as_ref(),
            text(query.start).as_ref(),
            text(query.frequency).as_ref(),
        )
    }
}

/// Response shape of `/api/optimize`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultShape {
    #[default]
    Phased,
    Legacy,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShapeQuery {
    pub shape: Option<String>,
}

impl TryFrom<ShapeQuery> for ResultShape {
    type Error = ValidationError;

    fn try_from(query: ShapeQuery) -> Result<Self, Self::Error> {
        match query.shape.as_deref().map(str::trim) {
            None | Some("") | Some("phased") => Ok(ResultShape::Phased),
            Some("legacy") => Ok(ResultShape::Legacy),
            Some(other) => Err(ValidationError::InvalidParameters {
                reason: format!("unknown shape '{}', expected 'phased' or 'legacy'", other),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrendQuery {
    pub period: Option<String>,
}

impl TryFrom<TrendQuery> for TrendPeriod {
    type Error = ValidationError;

    fn try_from(query: TrendQuery) -> Result<Self, Self::Error> {
        match query.period {
            Some(period) => TrendPeriod::from_str(&period),
            None => Ok(TrendPeriod::Month),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

impl TryFrom<DateQuery> for NaiveDate {
    type Error = ValidationError;

    fn try_from(query: DateQuery) -> Result<Self, Self::Error> {
        parse_date(required(query.date.as_ref(), "date")?)
    }
}
