//! Genetic search over the smart DCA parameter space.
//!
//! Individuals are repaired (clamped, quantized, `low < high`) before they
//! are scored, and every distinct genome is scored once per run. Only the
//! final best candidate is reported.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::ThreadPool;
use rayon::prelude::*;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

use crate::application::optimization::optimizer::GeneBounds;
use crate::domain::errors::OptimizationError;
use crate::domain::optimization::{BestTracker, OptimizationCandidate, OptimizationResult};
use crate::domain::ports::FitnessEvaluator;
use crate::domain::strategy::SmartDcaParams;

/// Decimal places kept on the bag bonus cap
const MAX_USD_SCALE: u32 = 2;
/// Attempts at drawing a valid individual before giving up on the bounds
const SAMPLE_ATTEMPTS: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneticConfig {
    pub population_size: usize,
    pub generations: usize,
    pub mutation_rate: f64,
    pub elitism: usize,
    pub tournament_size: usize,
    pub seed: Option<u64>,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            population_size: 40,
            generations: 30,
            mutation_rate: 0.2,
            elitism: 2,
            tournament_size: 3,
            seed: None,
        }
    }
}

impl GeneticConfig {
    pub fn validate(&self) -> Result<(), OptimizationError> {
        if self.population_size < 2 {
            return Err(OptimizationError::InvalidConfig {
                reason: format!("population_size ({}) must be at least 2", self.population_size),
            });
        }
        if self.elitism >= self.population_size {
            return Err(OptimizationError::InvalidConfig {
                reason: format!(
                    "elitism ({}) must be lower than population_size ({})",
                    self.elitism, self.population_size
                ),
            });
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(OptimizationError::InvalidConfig {
                reason: format!("mutation_rate ({}) must be within 0..=1", self.mutation_rate),
            });
        }
        if self.tournament_size == 0 {
            return Err(OptimizationError::InvalidConfig {
                reason: "tournament_size must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

pub struct GeneticOptimizer {
    evaluator: Arc<dyn FitnessEvaluator>,
    bounds: GeneBounds,
    config: GeneticConfig,
    pool: Option<Arc<ThreadPool>>,
}

impl GeneticOptimizer {
    pub fn new(evaluator: Arc<dyn FitnessEvaluator>, bounds: GeneBounds, config: GeneticConfig) -> Self {
        Self {
            evaluator,
            bounds,
            config,
            pool: None,
        }
    }

    pub fn with_pool(mut self, pool: Arc<ThreadPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn run(&self) -> Result<OptimizationResult, OptimizationError> {
        self.config.validate()?;
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        info!(
            "GeneticOptimizer: population={} generations={} mutation={} elitism={}",
            self.config.population_size,
            self.config.generations,
            self.config.mutation_rate,
            self.config.elitism
        );

        let mut cache: HashMap<SmartDcaParams, Option<Decimal>> = HashMap::new();
        let mut tracker = BestTracker::new();
        let mut population = self.initial_population(&mut rng);

        for generation in 0..self.config.generations {
            self.score(&population, &mut cache, &mut tracker);
            let ranked = rank(&population, &cache);
            debug!(
                "GeneticOptimizer: Generation {} best={:?} unique={}",
                generation + 1,
                ranked.first().map(|(_, perf)| *perf),
                cache.len()
            );

            if ranked.is_empty() {
                population = self.initial_population(&mut rng);
                continue;
            }

            let mut next: Vec<SmartDcaParams> = ranked
                .iter()
                .take(self.config.elitism)
                .map(|(params, _)| *params)
                .collect();
            let mut attempts = 0;
            while next.len() < self.config.population_size
                && attempts < self.config.population_size * SAMPLE_ATTEMPTS
            {
                attempts += 1;
                let a = self.tournament(&ranked, &mut rng);
                let b = self.tournament(&ranked, &mut rng);
                let child = self.mutate(crossover(&a, &b, &mut rng), &mut rng);
                if let Some(child) = self.repair(child) {
                    next.push(child);
                }
            }
            population = next;
        }
        self.score(&population, &mut cache, &mut tracker);

        let best = tracker.best().copied().ok_or(OptimizationError::NoCandidateFound)?;
        info!(
            "GeneticOptimizer: Best {} -> {:.2}% after {} unique evaluations",
            best.params,
            best.performance_pct,
            cache.len()
        );
        Ok(OptimizationResult {
            best,
            second_best: None,
            tested_count: cache.len(),
            phase_breakdown: None,
        })
    }

    fn initial_population(&self, rng: &mut StdRng) -> Vec<SmartDcaParams> {
        (0..self.config.population_size * SAMPLE_ATTEMPTS)
            .filter_map(|_| self.repair(self.sample(rng)))
            .take(self.config.population_size)
            .collect()
    }

    /// Scores genomes not seen before, in population order
    fn score(
        &self,
        population: &[SmartDcaParams],
        cache: &mut HashMap<SmartDcaParams, Option<Decimal>>,
        tracker: &mut BestTracker,
    ) {
        let mut seen = HashSet::new();
        let fresh: Vec<SmartDcaParams> = population
            .iter()
            .filter(|p| !cache.contains_key(*p) && seen.insert(**p))
            .copied()
            .collect();
        if fresh.is_empty() {
            return;
        }

        let evaluator = &self.evaluator;
        let evaluate = || -> Vec<Option<Decimal>> {
            fresh
                .par_iter()
                .map(|params| evaluator.fitness(params).ok())
                .collect()
        };
        let scores = match &self.pool {
            Some(pool) => pool.install(evaluate),
            None => evaluate(),
        };

        for (params, score) in fresh.into_iter().zip(scores) {
            cache.insert(params, score);
            if let Some(perf) = score {
                tracker.offer(OptimizationCandidate::new(params, perf));
            }
        }
    }

    fn tournament(&self, ranked: &[(SmartDcaParams, Decimal)], rng: &mut StdRng) -> SmartDcaParams {
        // `ranked` is sorted best first, so the lowest drawn index wins
        let winner = (0..self.config.tournament_size)
            .map(|_| rng.random_range(0..ranked.len()))
            .min()
            .unwrap_or(0);
        ranked[winner].0
    }

    fn sample(&self, rng: &mut StdRng) -> SmartDcaParams {
        let b = &self.bounds;
        SmartDcaParams {
            fg_threshold_high: rng.random_range(b.fg_threshold_high.0..=b.fg_threshold_high.1),
            fg_threshold_low: rng.random_range(b.fg_threshold_low.0..=b.fg_threshold_low.1),
            bag_bonus_pct: lerp(b.bag_bonus_pct, rng.random::<f64>()),
            bag_bonus_max_usd: lerp(b.bag_bonus_max_usd, rng.random::<f64>()),
        }
    }

    fn mutate(&self, mut params: SmartDcaParams, rng: &mut StdRng) -> SmartDcaParams {
        let rate = self.config.mutation_rate;
        let b = &self.bounds;
        if rng.random_bool(rate) {
            params.fg_threshold_high = jitter(params.fg_threshold_high, b.fg_threshold_high, rng);
        }
        if rng.random_bool(rate) {
            params.fg_threshold_low = jitter(params.fg_threshold_low, b.fg_threshold_low, rng);
        }
        if rng.random_bool(rate) {
            params.bag_bonus_pct = nudge(params.bag_bonus_pct, b.bag_bonus_pct, rng);
        }
        if rng.random_bool(rate) {
            params.bag_bonus_max_usd = nudge(params.bag_bonus_max_usd, b.bag_bonus_max_usd, rng);
        }
        params
    }

    /// Clamps and quantizes every gene, then restores `low < high`.
    /// Returns `None` when the bounds leave no valid pair.
    fn repair(&self, mut params: SmartDcaParams) -> Option<SmartDcaParams> {
        let b = &self.bounds;
        params.fg_threshold_high = params
            .fg_threshold_high
            .clamp(b.fg_threshold_high.0, b.fg_threshold_high.1.max(b.fg_threshold_high.0))
            .min(100);
        params.fg_threshold_low = params
            .fg_threshold_low
            .clamp(b.fg_threshold_low.0, b.fg_threshold_low.1.max(b.fg_threshold_low.0));
        params.bag_bonus_pct = quantize(params.bag_bonus_pct, b.bag_bonus_pct, 0);
        params.bag_bonus_max_usd = quantize(params.bag_bonus_max_usd, b.bag_bonus_max_usd, MAX_USD_SCALE);

        if params.fg_threshold_low >= params.fg_threshold_high {
            if params.fg_threshold_high > b.fg_threshold_low.0 {
                params.fg_threshold_low = params.fg_threshold_high - 1;
            } else if params.fg_threshold_low < b.fg_threshold_high.1 {
                params.fg_threshold_high = params.fg_threshold_low + 1;
            }
        }
        params.validate().ok().map(|_| params)
    }
}

/// Rounds to `dp` places without leaving `bounds`; a fractional bound wins over the rounding
fn quantize(value: Decimal, bounds: (Decimal, Decimal), dp: u32) -> Decimal {
    let (lo, hi) = (bounds.0, bounds.1.max(bounds.0));
    value.clamp(lo, hi).round_dp(dp).clamp(lo, hi)
}

/// Valid individuals sorted best first; equal scores keep population order
fn rank(
    population: &[SmartDcaParams],
    cache: &HashMap<SmartDcaParams, Option<Decimal>>,
) -> Vec<(SmartDcaParams, Decimal)> {
    let mut seen = HashSet::new();
    let mut ranked: Vec<(SmartDcaParams, Decimal)> = population
        .iter()
        .filter(|p| seen.insert(**p))
        .filter_map(|p| cache.get(p).copied().flatten().map(|perf| (*p, perf)))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

/// Uniform crossover: each gene comes from either parent with equal odds
fn crossover(a: &SmartDcaParams, b: &SmartDcaParams, rng: &mut StdRng) -> SmartDcaParams {
    SmartDcaParams {
        fg_threshold_high: if rng.random_bool(0.5) { a.fg_threshold_high } else { b.fg_threshold_high },
        fg_threshold_low: if rng.random_bool(0.5) { a.fg_threshold_low } else { b.fg_threshold_low },
        bag_bonus_pct: if rng.random_bool(0.5) { a.bag_bonus_pct } else { b.bag_bonus_pct },
        bag_bonus_max_usd: if rng.random_bool(0.5) { a.bag_bonus_max_usd } else { b.bag_bonus_max_usd },
    }
}

fn lerp((lo, hi): (Decimal, Decimal), t: f64) -> Decimal {
    let t = Decimal::from_f64(t.clamp(0.0, 1.0)).unwrap_or(Decimal::ZERO);
    lo + (hi - lo) * t
}

/// Shifts a threshold by up to a fifth of its range (at least one step)
fn jitter(value: u8, (lo, hi): (u8, u8), rng: &mut StdRng) -> u8 {
    let reach = (i16::from(hi.saturating_sub(lo)) / 5).max(1);
    let shifted = i16::from(value) + rng.random_range(-reach..=reach);
    shifted.clamp(i16::from(lo), i16::from(hi.max(lo))) as u8
}

/// Shifts a decimal gene by up to 20% of its range
fn nudge(value: Decimal, (lo, hi): (Decimal, Decimal), rng: &mut StdRng) -> Decimal {
    let factor = Decimal::from_f64(rng.random_range(-0.2..=0.2)).unwrap_or(Decimal::ZERO);
    value + (hi - lo) * factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::FitnessError;
    use rust_decimal_macros::dec;

    struct Peak;

    impl FitnessEvaluator for Peak {
        fn fitness(&self, p: &SmartDcaParams) -> Result<Decimal, FitnessError> {
            p.validate()?;
            Ok(Decimal::from(100)
                - (Decimal::from(p.fg_threshold_high) - dec!(72)).abs()
                - (Decimal::from(p.fg_threshold_low) - dec!(18)).abs()
                - (p.bag_bonus_pct - dec!(60)).abs() / dec!(10))
        }
    }

    fn bounds() -> GeneBounds {
        GeneBounds {
            fg_threshold_high: (50, 90),
            fg_threshold_low: (10, 50),
            bag_bonus_pct: (dec!(10), dec!(100)),
            bag_bonus_max_usd: (dec!(50), dec!(500)),
        }
    }

    fn seeded(seed: u64) -> GeneticConfig {
        GeneticConfig {
            seed: Some(seed),
            ..GeneticConfig::default()
        }
    }

    #[test]
    fn test_finds_candidate_reproducible_by_evaluator() {
        let optimizer = GeneticOptimizer::new(Arc::new(Peak), bounds(), seeded(7));
        let result = optimizer.run().unwrap();

        assert_eq!(result.best.performance_pct, Peak.fitness(&result.best.params).unwrap());
        assert!(result.best.params.validate().is_ok());
        assert!(result.second_best.is_none());
        assert!(result.tested_count > 0);
        assert!(result.best.performance_pct > dec!(80));
    }

    #[test]
    fn test_same_seed_same_result() {
        let first = GeneticOptimizer::new(Arc::new(Peak), bounds(), seeded(42)).run().unwrap();
        let second = GeneticOptimizer::new(Arc::new(Peak), bounds(), seeded(42)).run().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_repair_restores_ordering_and_bounds() {
        let optimizer = GeneticOptimizer::new(Arc::new(Peak), bounds(), seeded(1));
        let repaired = optimizer
            .repair(SmartDcaParams {
                fg_threshold_high: 40,
                fg_threshold_low: 70,
                bag_bonus_pct: dec!(130.4),
                bag_bonus_max_usd: dec!(12.3456),
            })
            .unwrap();

        assert_eq!(repaired.fg_threshold_high, 50);
        assert_eq!(repaired.fg_threshold_low, 49);
        assert_eq!(repaired.bag_bonus_pct, dec!(100));
        assert_eq!(repaired.bag_bonus_max_usd, dec!(50));
    }

    #[test]
    fn test_repair_keeps_rounded_genes_inside_fractional_bounds() {
        let narrow = GeneBounds {
            bag_bonus_pct: (dec!(10.4), dec!(10.45)),
            bag_bonus_max_usd: (dec!(50.005), dec!(50.009)),
            ..bounds()
        };
        let optimizer = GeneticOptimizer::new(Arc::new(Peak), narrow, seeded(1));
        let repaired = optimizer
            .repair(SmartDcaParams {
                fg_threshold_high: 70,
                fg_threshold_low: 20,
                bag_bonus_pct: dec!(10.41),
                bag_bonus_max_usd: dec!(50.006),
            })
            .unwrap();

        assert!(repaired.bag_bonus_pct >= dec!(10.4) && repaired.bag_bonus_pct <= dec!(10.45));
        assert_eq!(repaired.bag_bonus_pct, dec!(10.4));
        assert_eq!(repaired.bag_bonus_max_usd, dec!(50.005));
        assert_eq!(quantize(dec!(55.5), (dec!(10), dec!(100)), 0), dec!(56));
    }

    #[test]
    fn test_collapsed_space_reports_no_candidate() {
        let collapsed = GeneBounds {
            fg_threshold_high: (30, 30),
            fg_threshold_low: (60, 60),
            ..bounds()
        };
        let err = GeneticOptimizer::new(Arc::new(Peak), collapsed, seeded(3))
            .run()
            .unwrap_err();
        assert_eq!(err, OptimizationError::NoCandidateFound);
    }

    #[test]
    fn test_config_validation() {
        let config = GeneticConfig {
            elitism: 40,
            ..GeneticConfig::default()
        };
        assert!(config.validate().is_err());

        let config = GeneticConfig {
            mutation_rate: 1.5,
            ..GeneticConfig::default()
        };
        assert!(GeneticOptimizer::new(Arc::new(Peak), bounds(), config).run().is_err());
    }
}
