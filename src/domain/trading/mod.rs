// Accumulation domain: purchases, daily progress and the running BTC position
pub mod portfolio;
pub mod types;
