pub mod csv_import;
pub mod database;
pub mod in_memory;
pub mod repositories;

pub use csv_import::MarketDataImporter;
pub use database::Database;
pub use in_memory::InMemoryMarketDataRepository;
pub use repositories::SqliteMarketDataRepository;
