//! Storage configuration parsing from environment variables.

use std::env;
use std::path::PathBuf;

/// Market data storage configuration
#[derive(Debug, Clone)]
pub struct StorageEnvConfig {
    pub database_url: String,
    /// Historical CSV imported into an empty database
    pub market_data_csv: PathBuf,
}

impl Default for StorageEnvConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://data/smartdca.db".to_string(),
            market_data_csv: PathBuf::from("data/data.csv"),
        }
    }
}

impl StorageEnvConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            market_data_csv: env::var("MARKET_DATA_CSV")
                .map(PathBuf::from)
                .unwrap_or(defaults.market_data_csv),
        }
    }
}
