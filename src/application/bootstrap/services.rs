use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::application::bootstrap::persistence::PersistenceHandle;
use crate::application::market_data::MarketDataService;
use crate::application::optimization::OptimizeEngine;
use crate::config::Config;
use crate::infrastructure::observability::Metrics;

pub struct ServicesHandle {
    pub market_data: Arc<MarketDataService>,
    pub engine: Arc<OptimizeEngine>,
    pub metrics: Metrics,
}

pub struct ServicesBootstrap;

impl ServicesBootstrap {
    pub async fn init(config: &Config, persistence: &PersistenceHandle) -> Result<ServicesHandle> {
        let metrics = Metrics::new()?;
        let market_data = Arc::new(MarketDataService::new(
            persistence.market_data_repository.clone(),
        ));

        // Warm the snapshot so the first request does not pay for the load
        let snapshot = market_data.snapshot().await?;
        metrics.market_data_days.set(snapshot.len() as f64);
        if let Some(day) = snapshot.last_day() {
            metrics.sentiment_score.set(f64::from(day.fgi));
        }

        let engine = Arc::new(OptimizeEngine::new(
            market_data.clone(),
            metrics.clone(),
            config.engine_settings()?,
        )?);
        info!("ServicesBootstrap: Engine ready over {} days", snapshot.len());

        Ok(ServicesHandle {
            market_data,
            engine,
            metrics,
        })
    }
}
