//! Smart DCA Optimizer Binary
//!
//! A CLI tool for running backtests, schedule searches and parameter
//! optimization against the local market data store.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use smartdca::application::bootstrap::{PersistenceBootstrap, ServicesBootstrap};
use smartdca::application::optimization::genetic::GeneticConfig;
use smartdca::application::optimization::reporting::OptimizeReporter;
use smartdca::application::optimization::simulator::BacktestRequest;
use smartdca::application::optimization::{OptimizeEngine, StrategyRequest};
use smartdca::config::Config;
use smartdca::domain::market::Frequency;
use smartdca::domain::repositories::MarketDataRepository;
use smartdca::domain::strategy::SmartDcaParams;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about = "Smart DCA Backtest & Parameter Optimizer", long_about = None)]
struct Cli {
    /// Directory for JSON exports
    #[arg(long, global = true, default_value = "results")]
    output_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest a fixed-amount DCA plan
    Backtest {
        #[arg(short, long, default_value = "100")]
        amount: Decimal,

        /// Start date (YYYY-MM-DD)
        #[arg(long, default_value = "2018-02-01")]
        start: NaiveDate,

        /// daily, weekly or monthly
        #[arg(short, long, default_value = "weekly")]
        frequency: Frequency,

        /// ISO weekday (weekly) or day of month (monthly)
        #[arg(short, long)]
        day: Option<u32>,

        /// Output JSON file for results
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Run the sentiment-conditioned strategy with explicit parameters
    Smart {
        #[arg(short, long, default_value = "100")]
        amount: Decimal,

        #[arg(long, default_value = "2018-02-01")]
        start: NaiveDate,

        #[arg(short, long, default_value = "weekly")]
        frequency: Frequency,

        /// Skip (and fill the bag) at or above this index
        #[arg(long, default_value = "75")]
        high: u8,

        /// Buy with a bag bonus at or below this index
        #[arg(long, default_value = "25")]
        low: u8,

        /// Share of the bag released per fear period (%)
        #[arg(long, default_value = "50")]
        bonus_pct: Decimal,

        /// Cap of a single bag bonus (USD)
        #[arg(long, default_value = "200")]
        bonus_max: Decimal,

        #[arg(short, long)]
        output: Option<String>,
    },
    /// Backtest every purchase day of every frequency
    BestDays {
        #[arg(short, long, default_value = "100")]
        amount: Decimal,

        #[arg(long, default_value = "2018-02-01")]
        start: NaiveDate,

        /// Number of top schedules to display
        #[arg(short, long, default_value = "10")]
        top_n: usize,

        #[arg(short, long, default_value = "best_days.json")]
        output: String,
    },
    /// Two-phase grid search over the smart strategy parameters
    Grid {
        #[arg(short, long, default_value = "100")]
        amount: Decimal,

        #[arg(long, default_value = "2018-02-01")]
        start: NaiveDate,

        #[arg(short, long, default_value = "weekly")]
        frequency: Frequency,

        /// TOML file with parameter grid configuration
        #[arg(long)]
        grid_config: Option<PathBuf>,

        /// Export the {tested, best, second_best} shape
        #[arg(long)]
        legacy: bool,

        #[arg(short, long, default_value = "grid_optimization.json")]
        output: String,
    },
    /// Genetic search over the smart strategy parameters
    Genetic {
        #[arg(short, long, default_value = "100")]
        amount: Decimal,

        #[arg(long, default_value = "2018-02-01")]
        start: NaiveDate,

        #[arg(short, long, default_value = "weekly")]
        frequency: Frequency,

        #[arg(long)]
        population: Option<usize>,

        #[arg(long)]
        generations: Option<usize>,

        #[arg(long)]
        mutation_rate: Option<f64>,

        /// Seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,

        #[arg(short, long, default_value = "genetic_optimization.json")]
        output: String,
    },
    /// Import the historical CSV file into the database
    Import {
        /// CSV file (defaults to MARKET_DATA_CSV)
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Setup logging
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    let reporter = OptimizeReporter::new(&cli.output_dir);

    if let Commands::Import { file } = &cli.command {
        let path = file
            .clone()
            .unwrap_or_else(|| config.storage.market_data_csv.clone());
        let persistence = PersistenceBootstrap::open(&config.storage).await?;
        let written = persistence.importer().import_file(&path).await?;
        let stored = persistence.market_data_repository.count().await?;
        println!(
            "✅ Imported {} days from {} ({} days stored)",
            written,
            path.display(),
            stored
        );
        return Ok(());
    }

    if let Commands::Grid {
        grid_config: Some(path),
        ..
    } = &cli.command
    {
        info!("Loading parameter grid from: {}", path.display());
        config.optimizer.grid_config = Some(path.clone());
    }

    let persistence = PersistenceBootstrap::init(&config.storage).await?;
    let services = ServicesBootstrap::init(&config, &persistence).await?;
    run(cli.command, &services.engine, &reporter).await
}

async fn run(command: Commands, engine: &Arc<OptimizeEngine>, reporter: &OptimizeReporter) -> Result<()> {
    match command {
        Commands::Backtest {
            amount,
            start,
            frequency,
            day,
            output,
        } => {
            reporter.print_header("DCA BACKTEST", amount, &start.to_string(), frequency.as_str());
            let mut request = BacktestRequest::new(amount, start, frequency);
            if let Some(day) = day {
                request = request.on_day(day);
            }
            let report = engine.backtest(request).await?;
            reporter.print_backtest(&report);
            if let Some(output) = output {
                reporter.export_json(&report, &output)?;
            }
        }
        Commands::Smart {
            amount,
            start,
            frequency,
            high,
            low,
            bonus_pct,
            bonus_max,
            output,
        } => {
            reporter.print_header("SMART DCA", amount, &start.to_string(), frequency.as_str());
            let params = SmartDcaParams::new(high, low, bonus_pct, bonus_max)?;
            let result = engine
                .smart_dca(StrategyRequest::new(amount, start, frequency), params)
                .await?;
            reporter.print_smart(&result);
            if let Some(output) = output {
                reporter.export_json(&result, &output)?;
            }
        }
        Commands::BestDays {
            amount,
            start,
            top_n,
            output,
        } => {
            reporter.print_header("BEST SCHEDULE SEARCH", amount, &start.to_string(), "all");
            let outcomes = engine.best_schedules(amount, start).await?;
            reporter.print_schedule_table(&outcomes, top_n);
            reporter.export_json(&outcomes, &output)?;
        }
        Commands::Grid {
            amount,
            start,
            frequency,
            legacy,
            output,
            ..
        } => {
            reporter.print_header("GRID SEARCH OPTIMIZER", amount, &start.to_string(), frequency.as_str());
            reporter.print_grid_info(engine.grid(), amount);
            println!("{}\n", "=".repeat(80));

            println!("🚀 Starting optimization...\n");
            let result = engine
                .optimize_grid(StrategyRequest::new(amount, start, frequency))
                .await?;
            reporter.print_optimization(&result);
            if legacy {
                reporter.export_json(&result.legacy_view(), &output)?;
            } else {
                reporter.export_json(&result.phased_view(), &output)?;
            }
            println!("✅ Optimization complete!\n");
        }
        Commands::Genetic {
            amount,
            start,
            frequency,
            population,
            generations,
            mutation_rate,
            seed,
            output,
        } => {
            reporter.print_header("GENETIC OPTIMIZER", amount, &start.to_string(), frequency.as_str());
            let defaults = engine.genetic_config().clone();
            let config = GeneticConfig {
                population_size: population.unwrap_or(defaults.population_size),
                generations: generations.unwrap_or(defaults.generations),
                mutation_rate: mutation_rate.unwrap_or(defaults.mutation_rate),
                seed: seed.or(defaults.seed),
                ..defaults
            };

            println!("🚀 Starting optimization...\n");
            let result = engine
                .optimize_genetic(StrategyRequest::new(amount, start, frequency), Some(config))
                .await
                .context("Genetic optimization failed")?;
            reporter.print_optimization(&result);
            reporter.export_json(&result, &output)?;
            println!("✅ Optimization complete!\n");
        }
        Commands::Import { .. } => {}
    }

    Ok(())
}
