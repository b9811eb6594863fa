//! Configuration module for the Smart DCA engine.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by concern: Storage, Server, Optimizer, and Observability.

mod observability_config;
mod optimizer_config;
mod server_config;
mod storage_config;

pub use observability_config::ObservabilityEnvConfig;
pub use optimizer_config::OptimizerEnvConfig;
pub use server_config::ServerEnvConfig;
pub use storage_config::StorageEnvConfig;

use anyhow::{Context, Result};

use crate::application::optimization::EngineSettings;

/// Main application configuration.
///
/// Aggregates the sub-configs; each of them can also be loaded on its own.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub storage: StorageEnvConfig,
    pub server: ServerEnvConfig,
    pub optimizer: OptimizerEnvConfig,
    pub observability: ObservabilityEnvConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            storage: StorageEnvConfig::from_env(),
            server: ServerEnvConfig::from_env().context("Failed to load server config")?,
            optimizer: OptimizerEnvConfig::from_env().context("Failed to load optimizer config")?,
            observability: ObservabilityEnvConfig::from_env(),
        })
    }

    /// Engine settings, reading the grid TOML file when one is configured
    pub fn engine_settings(&self) -> Result<EngineSettings> {
        Ok(EngineSettings {
            grid: self.optimizer.load_grid()?,
            genetic: self.optimizer.genetic.clone(),
            threads: self.optimizer.threads,
            stream_capacity: self.server.stream_queue_capacity,
        })
    }
}
