use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::config::StorageEnvConfig;
use crate::domain::repositories::MarketDataRepository;
use crate::infrastructure::persistence::csv_import::MarketDataImporter;
use crate::infrastructure::persistence::database::Database;
use crate::infrastructure::persistence::repositories::SqliteMarketDataRepository;

pub struct PersistenceHandle {
    pub db: Database,
    pub market_data_repository: Arc<dyn MarketDataRepository>,
}

impl PersistenceHandle {
    pub fn importer(&self) -> MarketDataImporter {
        MarketDataImporter::new(self.market_data_repository.clone())
    }
}

pub struct PersistenceBootstrap;

impl PersistenceBootstrap {
    /// Opens the database and seeds it from the CSV file when it holds no rows
    pub async fn init(storage: &StorageEnvConfig) -> Result<PersistenceHandle> {
        let handle = Self::open(storage).await?;

        let imported = handle
            .importer()
            .import_if_empty(&storage.market_data_csv)
            .await
            .context("Failed to import market data")?;
        if imported > 0 {
            info!(
                "PersistenceBootstrap: Seeded {} days from {}",
                imported,
                storage.market_data_csv.display()
            );
        }

        Ok(handle)
    }

    /// Opens the database without seeding it
    pub async fn open(storage: &StorageEnvConfig) -> Result<PersistenceHandle> {
        info!("PersistenceBootstrap: Initializing database at {}", storage.database_url);

        let db = Database::new(&storage.database_url)
            .await
            .context("Failed to initialize database")?;
        let market_data_repository: Arc<dyn MarketDataRepository> =
            Arc::new(SqliteMarketDataRepository::new(db.pool.clone()));

        Ok(PersistenceHandle {
            db,
            market_data_repository,
        })
    }
}
