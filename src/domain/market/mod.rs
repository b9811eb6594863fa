// Market data domain: daily rows, the immutable snapshot and schedule vocabulary
pub mod frequency;
pub mod market_day;
pub mod snapshot;
pub mod trend_period;

pub use frequency::Frequency;
pub use market_day::{MarketDay, PricePoint};
pub use snapshot::MarketSnapshot;
pub use trend_period::TrendPeriod;
