// Wiring of storage, services and engine
pub mod bootstrap;

// Market data snapshot and projections (chart, trend, lookups)
pub mod market_data;

// Backtesting and parameter optimization
pub mod optimization;

// Trading strategies
pub mod strategies;

// Progress streaming for long-running optimizer runs
pub mod streaming;
