pub mod observability;
pub mod persistence;

pub use observability::{Metrics, MetricsReporter};
pub use persistence::{
    Database, InMemoryMarketDataRepository, MarketDataImporter, SqliteMarketDataRepository,
};
