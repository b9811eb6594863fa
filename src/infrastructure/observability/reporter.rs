//! Push-based metrics reporter
//!
//! Periodically outputs metrics as structured JSON to stdout.
//!
//! **Security**: This system only SENDS data, never accepts requests.

use crate::application::market_data::MarketDataService;
use crate::domain::sentiment::SentimentClassification;
use crate::infrastructure::observability::metrics::{Metrics, RUN_OUTCOMES};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Metrics snapshot for JSON output
#[derive(Serialize)]
pub struct MetricsSnapshot {
    pub timestamp: String,
    pub uptime_seconds: u64,
    pub version: String,
    pub market_data: MarketDataSnapshot,
    pub engine: EngineSnapshot,
}

#[derive(Serialize)]
pub struct MarketDataSnapshot {
    pub days: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub sentiment_score: Option<u8>,
    pub classification: Option<SentimentClassification>,
}

#[derive(Serialize)]
pub struct EngineSnapshot {
    pub simulations_total: u64,
    pub optimizer_evaluations_total: u64,
    pub optimizer_runs: BTreeMap<String, u64>,
    pub active_streams: u64,
}

/// Push-based metrics reporter
///
/// Outputs metrics as structured JSON logs on a configurable interval.
/// No HTTP server, no incoming connections - only outbound data.
pub struct MetricsReporter {
    market_data: Arc<MarketDataService>,
    metrics: Metrics,
    start_time: Instant,
    interval: Duration,
}

impl MetricsReporter {
    pub fn new(market_data: Arc<MarketDataService>, metrics: Metrics, interval_seconds: u64) -> Self {
        Self {
            market_data,
            metrics,
            start_time: Instant::now(),
            interval: Duration::from_secs(interval_seconds.max(1)),
        }
    }

    /// Run the reporter in a loop, outputting metrics periodically
    pub async fn run(self) {
        info!(
            "MetricsReporter: Starting push-based metrics (interval: {:?})",
            self.interval
        );

        loop {
            tokio::time::sleep(self.interval).await;

            match self.collect_snapshot().await {
                Ok(snapshot) => match serde_json::to_string(&snapshot) {
                    Ok(json) => {
                        // Prefixed so log shippers can filter it
                        println!("METRICS_JSON:{}", json);
                        info!(
                            "Engine: {} simulations | {} evaluations | {} streams | Uptime: {}s",
                            snapshot.engine.simulations_total,
                            snapshot.engine.optimizer_evaluations_total,
                            snapshot.engine.active_streams,
                            snapshot.uptime_seconds
                        );
                    }
                    Err(e) => warn!("Failed to serialize metrics: {}", e),
                },
                Err(e) => warn!("Failed to collect metrics: {}", e),
            }
        }
    }

    async fn collect_snapshot(&self) -> anyhow::Result<MetricsSnapshot> {
        let snapshot = self.market_data.snapshot().await?;
        let uptime = self.start_time.elapsed().as_secs();
        let latest = snapshot.last_day().map(|d| d.fgi);

        self.metrics.uptime_seconds.set(uptime as f64);
        self.metrics.market_data_days.set(snapshot.len() as f64);
        if let Some(score) = latest {
            self.metrics.sentiment_score.set(f64::from(score));
        }

        let optimizer_runs = RUN_OUTCOMES
            .iter()
            .map(|outcome| (outcome.to_string(), self.metrics.runs_count(outcome)))
            .collect();

        Ok(MetricsSnapshot {
            timestamp: chrono::Utc::now().to_rfc3339(),
            uptime_seconds: uptime,
            version: env!("CARGO_PKG_VERSION").to_string(),
            market_data: MarketDataSnapshot {
                days: snapshot.len(),
                first_date: snapshot.first_date(),
                last_date: snapshot.last_date(),
                sentiment_score: latest,
                classification: latest.map(SentimentClassification::from_score),
            },
            engine: EngineSnapshot {
                simulations_total: self.metrics.simulations_count(),
                optimizer_evaluations_total: self.metrics.evaluations_count(),
                optimizer_runs,
                active_streams: self.metrics.active_streams.get().max(0.0) as u64,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::MarketDay;
    use crate::infrastructure::persistence::in_memory::InMemoryMarketDataRepository;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_metrics_snapshot_collection() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let repository = Arc::new(InMemoryMarketDataRepository::new(vec![MarketDay::new(
            date,
            dec!(61000),
            82,
        )]));
        let market_data = Arc::new(MarketDataService::new(repository));
        let metrics = Metrics::new().expect("Failed to create metrics");
        metrics.inc_runs("grid", "completed");
        let reporter = MetricsReporter::new(market_data, metrics.clone(), 60);

        let snapshot = reporter
            .collect_snapshot()
            .await
            .expect("Failed to collect snapshot");

        assert_eq!(snapshot.market_data.days, 1);
        assert_eq!(snapshot.market_data.sentiment_score, Some(82));
        assert_eq!(snapshot.engine.optimizer_runs["completed"], 1);
        assert!(!snapshot.timestamp.is_empty());
        assert!(metrics.render().contains("smartdca_sentiment_score 82"));

        let json = serde_json::to_string(&snapshot).expect("Failed to serialize");
        assert!(json.contains("extreme_greed"));
    }
}
