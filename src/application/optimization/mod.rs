// Backtesting, schedule search and parameter optimization
pub mod best_schedule;
pub mod engine;
pub mod genetic;
pub mod optimizer;
pub mod reporting;
pub mod schedule;
pub mod simulator;

pub use engine::{EngineError, EngineSettings, OptimizeEngine, StrategyRequest};
