// Market data access and sentiment aggregation
pub mod snapshot_service;
pub mod trend;

pub use snapshot_service::{ChartSeries, DataRange, DayQuote, MarketDataService};
pub use trend::{TrendReport, TrendScore};
