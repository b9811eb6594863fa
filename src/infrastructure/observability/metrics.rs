//! Prometheus metrics definitions for the DCA engine
//!
//! All metrics use the `smartdca_` prefix and are read-only.

use prometheus::{
    CounterVec, Gauge, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
    core::{AtomicF64, GenericGauge},
};
use std::sync::Arc;

pub const SIMULATION_KINDS: [&str; 3] = ["backtest", "smart", "best_schedule"];
pub const OPTIMIZERS: [&str; 2] = ["grid", "genetic"];
pub const RUN_OUTCOMES: [&str; 4] = ["completed", "cancelled", "no_candidate", "failed"];

/// Prometheus metrics for the engine
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    /// Simulations served, by kind
    pub simulations_total: CounterVec,
    /// Fitness evaluations performed by the optimizers
    pub optimizer_evaluations_total: CounterVec,
    /// Optimizer runs by optimizer and outcome
    pub optimizer_runs_total: CounterVec,
    /// Streaming optimizer runs currently attached to a subscriber
    pub active_streams: GenericGauge<AtomicF64>,
    /// HTTP handler latency in seconds
    pub request_latency_seconds: HistogramVec,
    /// Latest Fear & Greed reading in the store
    pub sentiment_score: GenericGauge<AtomicF64>,
    /// Days held by the current market data snapshot
    pub market_data_days: GenericGauge<AtomicF64>,
    /// Uptime in seconds
    pub uptime_seconds: GenericGauge<AtomicF64>,
}

impl Metrics {
    /// Create a new Metrics instance with all gauges and counters registered
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let simulations_total = CounterVec::new(
            Opts::new("smartdca_simulations_total", "Simulations served by kind"),
            &["kind"],
        )?;
        registry.register(Box::new(simulations_total.clone()))?;

        let optimizer_evaluations_total = CounterVec::new(
            Opts::new(
                "smartdca_optimizer_evaluations_total",
                "Fitness evaluations performed by the optimizers",
            ),
            &["optimizer"],
        )?;
        registry.register(Box::new(optimizer_evaluations_total.clone()))?;

        let optimizer_runs_total = CounterVec::new(
            Opts::new(
                "smartdca_optimizer_runs_total",
                "Optimizer runs by optimizer and outcome",
            ),
            &["optimizer", "outcome"],
        )?;
        registry.register(Box::new(optimizer_runs_total.clone()))?;

        let active_streams = Gauge::with_opts(Opts::new(
            "smartdca_active_streams",
            "Streaming optimizer runs with a connected subscriber",
        ))?;
        registry.register(Box::new(active_streams.clone()))?;

        let request_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "smartdca_request_latency_seconds",
                "HTTP handler latency in seconds",
            )
            .buckets(vec![
                0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
            ]),
            &["endpoint"],
        )?;
        registry.register(Box::new(request_latency_seconds.clone()))?;

        let sentiment_score = Gauge::with_opts(Opts::new(
            "smartdca_sentiment_score",
            "Latest Fear & Greed index in the store (0-100)",
        ))?;
        registry.register(Box::new(sentiment_score.clone()))?;

        let market_data_days = Gauge::with_opts(Opts::new(
            "smartdca_market_data_days",
            "Days held by the current market data snapshot",
        ))?;
        registry.register(Box::new(market_data_days.clone()))?;

        let uptime_seconds = Gauge::with_opts(Opts::new(
            "smartdca_uptime_seconds",
            "Server uptime in seconds",
        ))?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            simulations_total,
            optimizer_evaluations_total,
            optimizer_runs_total,
            active_streams,
            request_latency_seconds,
            sentiment_score,
            market_data_days,
            uptime_seconds,
        })
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    pub fn inc_simulations(&self, kind: &str, count: u64) {
        self.simulations_total
            .with_label_values(&[kind])
            .inc_by(count as f64);
    }

    pub fn add_evaluations(&self, optimizer: &str, count: usize) {
        self.optimizer_evaluations_total
            .with_label_values(&[optimizer])
            .inc_by(count as f64);
    }

    pub fn inc_runs(&self, optimizer: &str, outcome: &str) {
        self.optimizer_runs_total
            .with_label_values(&[optimizer, outcome])
            .inc();
    }

    pub fn observe_latency(&self, endpoint: &str, seconds: f64) {
        self.request_latency_seconds
            .with_label_values(&[endpoint])
            .observe(seconds);
    }

    pub fn simulations_count(&self) -> u64 {
        SIMULATION_KINDS
            .iter()
            .map(|kind| self.simulations_total.with_label_values(&[*kind]).get() as u64)
            .sum()
    }

    pub fn evaluations_count(&self) -> u64 {
        OPTIMIZERS
            .iter()
            .map(|o| self.optimizer_evaluations_total.with_label_values(&[*o]).get() as u64)
            .sum()
    }

    pub fn runs_count(&self, outcome: &str) -> u64 {
        OPTIMIZERS
            .iter()
            .map(|o| self.optimizer_runs_total.with_label_values(&[*o, outcome]).get() as u64)
            .sum()
    }
}
