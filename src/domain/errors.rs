use chrono::NaiveDate;
use thiserror::Error;

/// Malformed or out-of-range request input, rejected before any simulation runs
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid amount: {input} (must be a positive number)")]
    InvalidAmount { input: String },

    #[error("Amount too large: {input} (maximum is {max})")]
    AmountTooLarge { input: String, max: String },

    #[error("Arithmetic overflow in {operation}: inputs are too large to simulate")]
    Overflow { operation: String },

    #[error("Invalid date: {input} (expected YYYY-MM-DD)")]
    InvalidDate { input: String },

    #[error("Invalid frequency: {input}. Must be 'daily', 'weekly' or 'monthly'")]
    InvalidFrequency { input: String },

    #[error("Invalid period: {input}. Must be 'month', 'quarter', 'year' or 'all'")]
    InvalidPeriod { input: String },

    #[error("Invalid day {day} for {frequency} schedule (valid: 1..={max})")]
    InvalidScheduleDay {
        frequency: String,
        day: u32,
        max: u32,
    },

    #[error("Invalid parameters: {reason}")]
    InvalidParameters { reason: String },

    #[error("Missing field: {field}")]
    MissingField { field: String },
}

/// Problems with the backing market data for a request
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("No sentiment data in the '{period}' window")]
    EmptyWindow { period: String },

    #[error("date not found")]
    DateNotFound { date: NaiveDate },

    #[error("Market data store is empty")]
    EmptyStore,
}

/// Why a parameter set could not be scored
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitnessError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("nothing was invested, performance is undefined")]
    Undefined,
}

/// Errors produced by the parameter optimizers
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptimizationError {
    #[error("no candidate found")]
    NoCandidateFound,

    #[error("Invalid optimizer configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}
