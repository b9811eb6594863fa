//! Smart DCA Server - HTTP API over the backtest and optimization engine
//!
//! Serves the JSON endpoints and the SSE optimizer stream. Metrics are
//! pushed via structured JSON logs to stdout.
//!
//! # Usage
//! ```sh
//! SERVER_PORT=5000 OBSERVABILITY_INTERVAL=60 cargo run --bin server
//! ```
//!
//! # Environment Variables
//! - `DATABASE_URL` - SQLite database (default: sqlite://data/smartdca.db)
//! - `MARKET_DATA_CSV` - CSV imported when the database is empty (default: data/data.csv)
//! - `SERVER_BIND_ADDRESS` / `SERVER_PORT` - Listen address (default: 127.0.0.1:5000)
//! - `OBSERVABILITY_ENABLED` - Enable metrics reporting (default: true)
//! - `OBSERVABILITY_INTERVAL` - Interval in seconds between metric outputs (default: 60)

use anyhow::Result;
use smartdca::application::bootstrap::{PersistenceBootstrap, ServicesBootstrap};
use smartdca::config::Config;
use smartdca::infrastructure::observability::MetricsReporter;
use smartdca::interfaces::api::ApiServer;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false).pretty();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    info!("Smart DCA Server {} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    info!(
        "Configuration loaded: Database={}, Threads={:?}, Stream queue={}",
        config.storage.database_url,
        config.optimizer.threads,
        config.server.stream_queue_capacity
    );

    let persistence = PersistenceBootstrap::init(&config.storage).await?;
    let services = ServicesBootstrap::init(&config, &persistence).await?;

    if config.observability.enabled {
        let reporter = MetricsReporter::new(
            services.market_data.clone(),
            services.metrics.clone(),
            config.observability.interval_seconds,
        );

        tokio::spawn(async move {
            reporter.run().await;
        });

        info!(
            "Metrics reporter started (interval: {}s)",
            config.observability.interval_seconds
        );
    } else {
        info!("Metrics reporting disabled.");
    }

    let server = ApiServer::new(services.engine.clone());
    let address = config.server.socket_address();

    tokio::select! {
        result = server.serve(&address) => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutdown signal received. Exiting..."),
    }

    Ok(())
}
