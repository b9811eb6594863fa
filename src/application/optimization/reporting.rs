//! Reporting utilities for the `optimize` binary.
//!
//! Provides formatted console output and JSON export capabilities.

use crate::application::optimization::best_schedule::ScheduleOutcome;
use crate::application::optimization::optimizer::ParameterGrid;
use crate::application::optimization::simulator::BacktestReport;
use crate::domain::optimization::OptimizationResult;
use crate::domain::strategy::{SmartAction, SmartDcaResult};
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::Path;

/// Reporter for console and JSON output.
pub struct OptimizeReporter {
    output_dir: String,
}

impl OptimizeReporter {
    /// Creates a new reporter with the given output directory.
    pub fn new(output_dir: &str) -> Self {
        Self {
            output_dir: output_dir.to_string(),
        }
    }

    /// Prints the header banner for a run.
    pub fn print_header(&self, title: &str, amount: Decimal, start: &str, frequency: &str) {
        println!("{}", "=".repeat(80));
        println!("🔍 {}", title);
        println!("{}", "=".repeat(80));
        println!("Amount:       ${}", amount);
        println!("Start:        {}", start);
        println!("Frequency:    {}", frequency);
        println!("{}", "=".repeat(80));
    }

    /// Prints the parameter grid configuration.
    pub fn print_grid_info(&self, grid: &ParameterGrid, amount: Decimal) {
        println!("\n📊 Parameter Grid:");
        println!("  FG high:        {:?}", grid.fg_threshold_high);
        println!("  FG low:         {:?}", grid.fg_threshold_low);
        println!("  Bonus %:        {:?}", grid.bag_bonus_pct);
        println!(
            "  Bonus max ($):  {:?}",
            grid.bag_bonus_max_multiplier
                .iter()
                .map(|m| (amount * m).normalize())
                .collect::<Vec<_>>()
        );
        println!(
            "  Refine:         ±{} steps (thresholds {}, pct {}, max x{})",
            grid.refine.radius,
            grid.refine.threshold_step,
            grid.refine.pct_step,
            grid.refine.max_step_multiplier
        );

        println!("\n🔢 Primary combinations to test: {}", grid.primary_size());
    }

    pub fn print_backtest(&self, report: &BacktestReport) {
        if report.data_unavailable {
            println!("⚠️  No market data on or after the start date");
            return;
        }
        println!("\n📈 BACKTEST:");
        println!("  Purchases:        {}", report.num_purchases);
        println!("  Invested:         ${:.2}", report.total_invested);
        println!("  BTC:              {:.8}", report.total_btc);
        println!("  Final value:      ${:.2}", report.final_value);
        println!("  Lump sum value:   ${:.2}", report.lump_value);
        println!("  Performance:      {:.2}%", report.performance_pct);
        println!("{}\n", "=".repeat(80));
    }

    pub fn print_smart(&self, result: &SmartDcaResult) {
        let count = |action: SmartAction| result.history.iter().filter(|r| r.action == action).count();
        println!("\n🧠 SMART DCA ({}):", result.frequency);
        println!(
            "  Actions:          {} buy | {} boosted | {} skipped",
            count(SmartAction::Buy),
            count(SmartAction::BuyBoosted),
            count(SmartAction::Skip)
        );
        println!("  Invested:         ${:.2}", result.total_invested);
        println!("  BTC:              {:.8}", result.btc_total);
        println!("  Final value:      ${:.2}", result.final_value);
        println!("  Bag used:         ${:.2}", result.bag_used);
        println!("  Bag remaining:    ${:.2}", result.bag_remaining);
        println!("  Performance:      {:.2}%", result.performance_pct);
        println!("{}\n", "=".repeat(80));
    }

    /// Prints the best `top_n` schedules, best first.
    pub fn print_schedule_table(&self, outcomes: &[ScheduleOutcome], top_n: usize) {
        let mut ranked: Vec<&ScheduleOutcome> = outcomes.iter().collect();
        ranked.sort_by(|a, b| b.performance_pct.cmp(&a.performance_pct));

        println!("\n{}", "=".repeat(80));
        println!("✅ SCHEDULE SEARCH COMPLETE - Top {} of {}", top_n, outcomes.len());
        println!("{}", "=".repeat(80));
        println!(
            "{:<4} | {:<8} | {:>4} | {:>9} | {:>12} | {:>12} | {:>8}",
            "#", "Freq", "Day", "Purchases", "Invested", "Final", "Perf%"
        );
        println!("{}", "-".repeat(80));

        for (i, outcome) in ranked.iter().take(top_n).enumerate() {
            println!(
                "{:<4} | {:<8} | {:>4} | {:>9} | {:>12.2} | {:>12.2} | {:>8.2}",
                i + 1,
                outcome.frequency,
                outcome.day,
                outcome.num_purchases,
                outcome.total_invested,
                outcome.final_value,
                outcome.performance_pct
            );
        }

        println!("{}\n", "=".repeat(80));
    }

    /// Prints the best (and runner-up) configuration of an optimizer run.
    pub fn print_optimization(&self, result: &OptimizationResult) {
        println!("🏆 BEST CONFIGURATION:");
        println!("  Parameters:       {}", result.best.params);
        println!("  Performance:      {:.2}%", result.best.performance_pct);
        if let Some(second) = &result.second_best {
            println!(
                "  Runner-up:        {} ({:.2}%)",
                second.params, second.performance_pct
            );
        }
        println!("  Tested:           {}", result.tested_count);
        if let Some(phases) = &result.phase_breakdown {
            println!(
                "  Phases:           {} primary ({}) + {} refine",
                phases.phase1_tests,
                phases
                    .phase1_performance
                    .map(|p| format!("{:.2}%", p))
                    .unwrap_or_else(|| "-".to_string()),
                phases.phase2_tests
            );
        }
        println!("{}\n", "=".repeat(80));
    }

    /// Exports any report to a JSON file.
    pub fn export_json<T: Serialize + ?Sized>(&self, value: &T, filename: &str) -> Result<String> {
        let output_path = if filename.contains('/') || filename.contains('\\') {
            filename.to_string()
        } else {
            format!("{}/{}", self.output_dir, filename)
        };

        // Ensure directory exists
        if let Some(parent) = Path::new(&output_path).parent() {
            std::fs::create_dir_all(parent)
                .context(format!("Failed to create directory: {:?}", parent))?;
        }

        let json_output =
            serde_json::to_string_pretty(value).context("Failed to serialize results to JSON")?;

        std::fs::write(&output_path, json_output)
            .context(format!("Failed to write results to {}", output_path))?;

        println!("💾 Results saved to: {}", output_path);
        Ok(output_path)
    }
}

impl Default for OptimizeReporter {
    fn default() -> Self {
        Self::new(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::optimization::OptimizationCandidate;
    use crate::domain::strategy::SmartDcaParams;
    use rust_decimal_macros::dec;

    #[test]
    fn test_export_json_writes_legacy_view() {
        let dir = std::env::temp_dir().join(format!("smartdca-report-{}", uuid::Uuid::new_v4()));
        let reporter = OptimizeReporter::new(dir.to_str().unwrap());
        let result = OptimizationResult {
            best: OptimizationCandidate::new(
                SmartDcaParams::new(70, 30, dec!(40), dec!(150)).unwrap(),
                dec!(18.25),
            ),
            second_best: None,
            tested_count: 42,
            phase_breakdown: None,
        };

        let path = reporter
            .export_json(&result.legacy_view(), "grid.json")
            .unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

        assert_eq!(written["tested"], 42);
        assert_eq!(written["best"]["fg_threshold_high"], 70);
        assert!(written.get("second_best").is_none());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
