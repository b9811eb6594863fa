//! Optimizer configuration parsing from environment variables.
//!
//! Grid bounds come from an optional TOML file (`GRID_CONFIG`); genetic
//! settings and the rayon pool size come from individual variables.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::application::optimization::genetic::GeneticConfig;
use crate::application::optimization::optimizer::ParameterGrid;

/// Optimizer environment configuration
#[derive(Debug, Clone, Default)]
pub struct OptimizerEnvConfig {
    /// Size of the dedicated rayon pool, global pool when unset
    pub threads: Option<usize>,
    pub grid_config: Option<PathBuf>,
    pub genetic: GeneticConfig,
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(v) => Ok(Some(
            v.trim()
                .parse::<T>()
                .with_context(|| format!("Invalid {}: {}", name, v))?,
        )),
        Err(_) => Ok(None),
    }
}

impl OptimizerEnvConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = GeneticConfig::default();
        let genetic = GeneticConfig {
            population_size: parse_var("GENETIC_POPULATION")?.unwrap_or(defaults.population_size),
            generations: parse_var("GENETIC_GENERATIONS")?.unwrap_or(defaults.generations),
            mutation_rate: parse_var("GENETIC_MUTATION_RATE")?.unwrap_or(defaults.mutation_rate),
            elitism: parse_var("GENETIC_ELITISM")?.unwrap_or(defaults.elitism),
            tournament_size: defaults.tournament_size,
            seed: parse_var("GENETIC_SEED")?,
        };
        genetic
            .validate()
            .context("Invalid genetic optimizer settings")?;

        Ok(Self {
            threads: parse_var::<usize>("OPTIMIZER_THREADS")?.filter(|t| *t > 0),
            grid_config: env::var("GRID_CONFIG").ok().map(PathBuf::from),
            genetic,
        })
    }

    /// Grid from `GRID_CONFIG` when set, the built-in grid otherwise
    pub fn load_grid(&self) -> Result<ParameterGrid> {
        match &self.grid_config {
            Some(path) => ParameterGrid::from_toml_file(path),
            None => Ok(ParameterGrid::default()),
        }
    }
}
