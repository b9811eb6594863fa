//! High-level facade over the simulators and optimizers.
//!
//! Every request resolves the current market snapshot once, then runs the
//! CPU-bound work on tokio's blocking pool (and rayon underneath). The HTTP
//! handlers and the `optimize` binary both go through this type.

use anyhow::Context;
use chrono::NaiveDate;
use rayon::{ThreadPool, ThreadPoolBuilder};
use rust_decimal::Decimal;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::application::market_data::MarketDataService;
use crate::application::optimization::best_schedule::{BestScheduleSearch, ScheduleOutcome};
use crate::application::optimization::genetic::{GeneticConfig, GeneticOptimizer};
use crate::application::optimization::optimizer::{GridOptimizer, ParameterGrid};
use crate::application::optimization::simulator::{BacktestReport, BacktestRequest, Simulator};
use crate::application::strategies::SmartDcaEvaluator;
use crate::application::streaming::{ProgressStream, StreamCoordinator};
use crate::domain::errors::{DataError, OptimizationError, ValidationError};
use crate::domain::market::{Frequency, MarketSnapshot};
use crate::domain::optimization::OptimizationResult;
use crate::domain::strategy::{SmartDcaParams, SmartDcaResult};
use crate::domain::trading::portfolio::validate_amount;
use crate::infrastructure::observability::Metrics;

/// Any failure surfaced by an engine operation
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Optimization(OptimizationError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<OptimizationError> for EngineError {
    fn from(err: OptimizationError) -> Self {
        match err {
            OptimizationError::Validation(e) => EngineError::Validation(e),
            other => EngineError::Optimization(other),
        }
    }
}

/// Amount, start date and frequency shared by the strategy runs and both optimizers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyRequest {
    pub amount_usd: Decimal,
    pub start: NaiveDate,
    pub frequency: Frequency,
}

impl StrategyRequest {
    pub fn new(amount_usd: Decimal, start: NaiveDate, frequency: Frequency) -> Self {
        Self {
            amount_usd,
            start,
            frequency,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub grid: ParameterGrid,
    pub genetic: GeneticConfig,
    /// Dedicated rayon pool size, global pool when `None`
    pub threads: Option<usize>,
    pub stream_capacity: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            grid: ParameterGrid::default(),
            genetic: GeneticConfig::default(),
            threads: None,
            stream_capacity: crate::application::streaming::progress::DEFAULT_STREAM_CAPACITY,
        }
    }
}

pub struct OptimizeEngine {
    market_data: Arc<MarketDataService>,
    metrics: Metrics,
    grid: ParameterGrid,
    genetic: GeneticConfig,
    pool: Option<Arc<ThreadPool>>,
    streams: StreamCoordinator,
}

impl OptimizeEngine {
    pub fn new(
        market_data: Arc<MarketDataService>,
        metrics: Metrics,
        settings: EngineSettings,
    ) -> anyhow::Result<Self> {
        settings.grid.validate()?;
        settings.genetic.validate()?;

        let pool = match settings.threads {
            Some(threads) => Some(Arc::new(
                ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("smartdca-opt-{}", i))
                    .build()
                    .context("Failed to build optimizer thread pool")?,
            )),
            None => None,
        };

        info!(
            "OptimizeEngine: {} primary combinations, genetic {}x{}, threads={}",
            settings.grid.primary_size(),
            settings.genetic.population_size,
            settings.genetic.generations,
            settings
                .threads
                .map(|t| t.to_string())
                .unwrap_or_else(|| "auto".to_string())
        );

        Ok(Self {
            market_data,
            streams: StreamCoordinator::new(settings.stream_capacity).with_metrics(metrics.clone()),
            metrics,
            grid: settings.grid,
            genetic: settings.genetic,
            pool,
        })
    }

    pub fn market_data(&self) -> &Arc<MarketDataService> {
        &self.market_data
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn grid(&self) -> &ParameterGrid {
        &self.grid
    }

    pub fn genetic_config(&self) -> &GeneticConfig {
        &self.genetic
    }

    async fn snapshot(&self) -> Result<Arc<MarketSnapshot>, EngineError> {
        Ok(self.market_data.snapshot().await?)
    }

    pub async fn backtest(&self, request: BacktestRequest) -> Result<BacktestReport, EngineError> {
        request.validate()?;
        let simulator = Simulator::new(self.snapshot().await?);
        let report = run_blocking(move || simulator.run(&request)).await??;
        self.metrics.inc_simulations("backtest", 1);
        Ok(report)
    }

    pub async fn best_schedules(
        &self,
        amount_usd: Decimal,
        start: NaiveDate,
    ) -> Result<Vec<ScheduleOutcome>, EngineError> {
        validate_amount(amount_usd)?;
        let search = BestScheduleSearch::new(self.snapshot().await?);
        let pool = self.pool.clone();
        let outcomes = run_blocking(move || match pool {
            Some(pool) => pool.install(|| search.run(amount_usd, start)),
            None => search.run(amount_usd, start),
        })
        .await??;
        self.metrics
            .inc_simulations("best_schedule", outcomes.len() as u64);
        Ok(outcomes)
    }

    pub async fn smart_dca(
        &self,
        request: StrategyRequest,
        params: SmartDcaParams,
    ) -> Result<SmartDcaResult, EngineError> {
        params.validate()?;
        let evaluator = self.evaluator(&request).await?;
        let result = run_blocking(move || evaluator.run(&params)).await??;
        self.metrics.inc_simulations("smart", 1);
        Ok(result)
    }

    /// Runs both grid phases to completion
    pub async fn optimize_grid(
        &self,
        request: StrategyRequest,
    ) -> Result<OptimizationResult, EngineError> {
        let optimizer = self.grid_optimizer(&request).await?;
        let outcome = run_blocking(move || optimizer.run_to_completion()).await?;
        self.record_run("grid", &outcome);
        Ok(outcome?)
    }

    /// Starts a grid search whose events are forwarded to a single subscriber
    pub async fn stream_grid(&self, request: StrategyRequest) -> Result<ProgressStream, EngineError> {
        let optimizer = self.grid_optimizer(&request).await?;
        Ok(self.streams.spawn("grid", optimizer))
    }

    /// Genetic search, with `config` replacing the configured settings when given
    pub async fn optimize_genetic(
        &self,
        request: StrategyRequest,
        config: Option<GeneticConfig>,
    ) -> Result<OptimizationResult, EngineError> {
        let config = config.unwrap_or_else(|| self.genetic.clone());
        config.validate()?;
        let evaluator = self.evaluator(&request).await?;
        let bounds = self
            .grid
            .gene_bounds(request.amount_usd)
            .ok_or_else(|| OptimizationError::InvalidConfig {
                reason: "parameter grid has an empty axis or its bag bounds overflow".to_string(),
            })?;

        let mut optimizer = GeneticOptimizer::new(evaluator, bounds, config);
        if let Some(pool) = &self.pool {
            optimizer = optimizer.with_pool(pool.clone());
        }

        let outcome = run_blocking(move || optimizer.run()).await?;
        self.record_run("genetic", &outcome);
        Ok(outcome?)
    }

    async fn evaluator(&self, request: &StrategyRequest) -> Result<Arc<SmartDcaEvaluator>, EngineError> {
        let snapshot = self.snapshot().await?;
        Ok(Arc::new(SmartDcaEvaluator::new(
            snapshot,
            request.amount_usd,
            request.start,
            request.frequency,
        )?))
    }

    async fn grid_optimizer(&self, request: &StrategyRequest) -> Result<GridOptimizer, EngineError> {
        let evaluator = self.evaluator(request).await?;
        let optimizer = GridOptimizer::new(evaluator, self.grid.clone(), request.amount_usd);
        Ok(match &self.pool {
            Some(pool) => optimizer.with_pool(pool.clone()),
            None => optimizer,
        })
    }

    fn record_run(&self, optimizer: &str, outcome: &Result<OptimizationResult, OptimizationError>) {
        match outcome {
            Ok(result) => {
                self.metrics.add_evaluations(optimizer, result.tested_count);
                self.metrics.inc_runs(optimizer, "completed");
            }
            Err(OptimizationError::NoCandidateFound) => {
                self.metrics.inc_runs(optimizer, "no_candidate");
            }
            Err(_) => {}
        }
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, EngineError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .context("Engine worker task failed")
        .map_err(EngineError::Internal)
}
