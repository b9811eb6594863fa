//! Two-phase grid search over the smart DCA parameter space.
//!
//! `GridOptimizer` is a state machine (`Idle -> Primary -> Refine -> Done`)
//! exposed as an `Iterator` of `OptimizerEvent`s. Each call to `next` evaluates
//! at most one batch of candidates, so a consumer that stops pulling events
//! stops the search. Batches are scored in parallel on rayon and then reduced
//! in enumeration order, so ties always resolve to the first candidate found.

use anyhow::{Context, Result};
use rayon::ThreadPool;
use rayon::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::errors::OptimizationError;
use crate::domain::optimization::{
    BestTracker, OptimizationCandidate, OptimizationResult, OptimizerEvent, PhaseBreakdown,
};
use crate::domain::ports::FitnessEvaluator;
use crate::domain::strategy::SmartDcaParams;

/// Size of the primary sweep produced by `ParameterGrid::default()`
pub const PRIMARY_COMBINATIONS: usize = 8000;
/// Primary evaluations between two progress events
pub const PRIMARY_PROGRESS_EVERY: usize = 250;
/// Refine evaluations between two progress events
pub const REFINE_PROGRESS_EVERY: usize = 100;

/// Parameter grid for the primary sweep.
///
/// `bag_bonus_max_multiplier` values are multiples of the per-period amount,
/// so one grid fits every plan size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterGrid {
    pub fg_threshold_high: Vec<u8>,
    pub fg_threshold_low: Vec<u8>,
    pub bag_bonus_pct: Vec<Decimal>,
    pub bag_bonus_max_multiplier: Vec<Decimal>,
    #[serde(default)]
    pub refine: RefineSettings,
}

/// Neighbourhood explored around the primary best
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefineSettings {
    /// Steps on each side of the primary best, per parameter
    pub radius: u32,
    pub threshold_step: u8,
    pub pct_step: Decimal,
    pub max_step_multiplier: Decimal,
}

impl Default for RefineSettings {
    fn default() -> Self {
        Self {
            radius: 3,
            threshold_step: 1,
            pct_step: dec!(2),
            max_step_multiplier: dec!(0.1),
        }
    }
}

impl Default for ParameterGrid {
    fn default() -> Self {
        Self {
            fg_threshold_high: (50..=90).step_by(5).collect(),
            fg_threshold_low: (10..=50).step_by(5).collect(),
            bag_bonus_pct: (1..=10).map(|i| Decimal::from(i * 10)).collect(),
            bag_bonus_max_multiplier: (1..=10).map(|i| Decimal::new(i * 5, 1)).collect(),
            refine: RefineSettings::default(),
        }
    }
}

impl ParameterGrid {
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read grid config {}", path.display()))?;
        let grid: ParameterGrid = toml::from_str(&content)
            .with_context(|| format!("Failed to parse grid config {}", path.display()))?;
        grid.validate()?;
        Ok(grid)
    }

    pub fn validate(&self) -> Result<(), OptimizationError> {
        let out_of_range = |values: &[u8]| values.iter().any(|v| *v > 100);
        if out_of_range(&self.fg_threshold_high) || out_of_range(&self.fg_threshold_low) {
            return Err(OptimizationError::InvalidConfig {
                reason: "thresholds must be within 0..=100".to_string(),
            });
        }
        if self
            .bag_bonus_pct
            .iter()
            .any(|p| *p < Decimal::ZERO || *p > Decimal::ONE_HUNDRED)
        {
            return Err(OptimizationError::InvalidConfig {
                reason: "bag_bonus_pct values must be within 0..=100".to_string(),
            });
        }
        if self
            .bag_bonus_max_multiplier
            .iter()
            .any(|m| *m < Decimal::ZERO)
        {
            return Err(OptimizationError::InvalidConfig {
                reason: "bag_bonus_max_multiplier values must not be negative".to_string(),
            });
        }
        if self.refine.threshold_step == 0
            || self.refine.pct_step <= Decimal::ZERO
            || self.refine.max_step_multiplier <= Decimal::ZERO
        {
            return Err(OptimizationError::InvalidConfig {
                reason: "refine steps must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Number of primary candidates, without building them
    pub fn primary_size(&self) -> usize {
        let pairs = self
            .fg_threshold_high
            .iter()
            .flat_map(|high| self.fg_threshold_low.iter().filter(move |low| *low < high))
            .count();
        pairs * self.bag_bonus_pct.len() * self.bag_bonus_max_multiplier.len()
    }

    /// Primary candidates in enumeration order; pairs with `low >= high` are skipped
    pub fn primary_candidates(&self, amount_usd: Decimal) -> Vec<SmartDcaParams> {
        let mut combinations = Vec::new();
        for &high in &self.fg_threshold_high {
            for &low in &self.fg_threshold_low {
                if low >= high {
                    continue;
                }
                for &pct in &self.bag_bonus_pct {
                    for &multiplier in &self.bag_bonus_max_multiplier {
                        let Some(max_usd) = amount_usd.checked_mul(multiplier) else {
                            continue;
                        };
                        let params = SmartDcaParams {
                            fg_threshold_high: high,
                            fg_threshold_low: low,
                            bag_bonus_pct: pct,
                            bag_bonus_max_usd: max_usd,
                        };
                        if params.validate().is_ok() {
                            combinations.push(params);
                        }
                    }
                }
            }
        }
        combinations
    }

    /// Finer grid around `center`, excluding `center` itself
    pub fn refine_candidates(&self, center: &SmartDcaParams, amount_usd: Decimal) -> Vec<SmartDcaParams> {
        let radius = self.refine.radius as i64;
        let threshold_axis = |value: u8| -> Vec<u8> {
            let mut axis: Vec<u8> = (-radius..=radius)
                .map(|k| {
                    let shifted = i64::from(value) + k * i64::from(self.refine.threshold_step);
                    shifted.clamp(0, 100) as u8
                })
                .collect();
            axis.dedup();
            axis
        };
        // Points whose offset overflows are dropped from the axis
        let decimal_axis = |value: Decimal, step: Option<Decimal>, upper: Option<Decimal>| -> Vec<Decimal> {
            let Some(step) = step else {
                return vec![value];
            };
            let mut axis: Vec<Decimal> = (-radius..=radius)
                .filter_map(|k| {
                    let shifted = Decimal::from(k)
                        .checked_mul(step)
                        .and_then(|offset| value.checked_add(offset))?
                        .max(Decimal::ZERO);
                    Some(match upper {
                        Some(upper) => shifted.min(upper),
                        None => shifted,
                    })
                })
                .collect();
            axis.dedup();
            axis
        };

        let highs = threshold_axis(center.fg_threshold_high);
        let lows = threshold_axis(center.fg_threshold_low);
        let pcts = decimal_axis(
            center.bag_bonus_pct,
            Some(self.refine.pct_step),
            Some(Decimal::ONE_HUNDRED),
        );
        let maxes = decimal_axis(
            center.bag_bonus_max_usd,
            amount_usd.checked_mul(self.refine.max_step_multiplier),
            None,
        );

        let mut combinations = Vec::new();
        for &high in &highs {
            for &low in &lows {
                if low >= high {
                    continue;
                }
                for &pct in &pcts {
                    for &max in &maxes {
                        let params = SmartDcaParams {
                            fg_threshold_high: high,
                            fg_threshold_low: low,
                            bag_bonus_pct: pct,
                            bag_bonus_max_usd: max,
                        };
                        if params != *center && params.validate().is_ok() {
                            combinations.push(params);
                        }
                    }
                }
            }
        }
        combinations
    }

    /// Lowest and highest value of each axis, used as genetic search bounds.
    ///
    /// `None` when an axis is empty or the bag bounds overflow.
    pub fn gene_bounds(&self, amount_usd: Decimal) -> Option<GeneBounds> {
        let (high_min, high_max) = min_max(&self.fg_threshold_high)?;
        let (low_min, low_max) = min_max(&self.fg_threshold_low)?;
        let (pct_min, pct_max) = min_max(&self.bag_bonus_pct)?;
        let (mult_min, mult_max) = min_max(&self.bag_bonus_max_multiplier)?;
        Some(GeneBounds {
            fg_threshold_high: (high_min, high_max),
            fg_threshold_low: (low_min, low_max),
            bag_bonus_pct: (pct_min, pct_max),
            bag_bonus_max_usd: (
                amount_usd.checked_mul(mult_min)?,
                amount_usd.checked_mul(mult_max)?,
            ),
        })
    }
}

fn min_max<T: Copy + PartialOrd>(values: &[T]) -> Option<(T, T)> {
    let first = *values.first()?;
    Some(values.iter().fold((first, first), |(lo, hi), v| {
        (
            if *v < lo { *v } else { lo },
            if *v > hi { *v } else { hi },
        )
    }))
}

/// Inclusive bounds of every gene
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneBounds {
    pub fg_threshold_high: (u8, u8),
    pub fg_threshold_low: (u8, u8),
    pub bag_bonus_pct: (Decimal, Decimal),
    pub bag_bonus_max_usd: (Decimal, Decimal),
}

#[derive(Debug, Clone, Copy)]
struct PrimarySummary {
    tested: usize,
    best_perf: Option<Decimal>,
}

enum GridState {
    Idle,
    Primary {
        candidates: Vec<SmartDcaParams>,
        cursor: usize,
        tracker: BestTracker,
    },
    Refine {
        candidates: Vec<SmartDcaParams>,
        cursor: usize,
        tracker: BestTracker,
        primary: PrimarySummary,
    },
    Done {
        outcome: Option<OptimizationResult>,
    },
}

pub struct GridOptimizer {
    evaluator: Arc<dyn FitnessEvaluator>,
    grid: ParameterGrid,
    amount_usd: Decimal,
    pool: Option<Arc<ThreadPool>>,
    primary_every: usize,
    refine_every: usize,
    state: GridState,
}

impl GridOptimizer {
    pub fn new(evaluator: Arc<dyn FitnessEvaluator>, grid: ParameterGrid, amount_usd: Decimal) -> Self {
        Self {
            evaluator,
            grid,
            amount_usd,
            pool: None,
            primary_every: PRIMARY_PROGRESS_EVERY,
            refine_every: REFINE_PROGRESS_EVERY,
            state: GridState::Idle,
        }
    }

    /// Evaluates batches on `pool` instead of the global rayon pool
    pub fn with_pool(mut self, pool: Arc<ThreadPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn with_progress_every(mut self, primary: usize, refine: usize) -> Self {
        self.primary_every = primary.max(1);
        self.refine_every = refine.max(1);
        self
    }

    /// Final result, available once the terminal `Finish` event was produced
    pub fn outcome(&self) -> Option<&OptimizationResult> {
        match &self.state {
            GridState::Done { outcome } => outcome.as_ref(),
            _ => None,
        }
    }

    /// Drives the search to completion without observing progress
    pub fn run_to_completion(mut self) -> Result<OptimizationResult, OptimizationError> {
        for _ in self.by_ref() {}
        self.outcome()
            .cloned()
            .ok_or(OptimizationError::NoCandidateFound)
    }

    fn evaluate_batch(&self, batch: &[SmartDcaParams]) -> Vec<Option<Decimal>> {
        let evaluator = &self.evaluator;
        let score = || -> Vec<Option<Decimal>> {
            batch
                .par_iter()
                .map(|params| match evaluator.fitness(params) {
                    Ok(perf) => Some(perf),
                    Err(e) => {
                        debug!("GridOptimizer: Skipping {}: {}", params, e);
                        None
                    }
                })
                .collect()
        };
        match &self.pool {
            Some(pool) => pool.install(score),
            None => score(),
        }
    }

    /// Scores the next batch and feeds the tracker in enumeration order
    fn advance(
        &self,
        candidates: &[SmartDcaParams],
        cursor: usize,
        batch_size: usize,
        tracker: &mut BestTracker,
    ) -> usize {
        let end = (cursor + batch_size).min(candidates.len());
        let batch = &candidates[cursor..end];
        for (params, score) in batch.iter().zip(self.evaluate_batch(batch)) {
            if let Some(perf) = score {
                tracker.offer(OptimizationCandidate::new(*params, perf));
            }
        }
        end
    }

    fn finish(&self, tracker: &BestTracker, primary: PrimarySummary, refined: usize) -> (OptimizerEvent, GridState) {
        let best = tracker.best().copied();
        info!(
            "GridOptimizer: Finished after {} + {} evaluations, best={}",
            primary.tested,
            refined,
            best.map(|c| format!("{} ({:.2}%)", c.params, c.performance_pct))
                .unwrap_or_else(|| "none".to_string())
        );
        let outcome = best.map(|best| OptimizationResult {
            best,
            second_best: tracker.second_best().copied(),
            tested_count: primary.tested + refined,
            phase_breakdown: Some(PhaseBreakdown {
                phase1_tests: primary.tested,
                phase1_performance: primary.best_perf,
                phase2_tests: refined,
            }),
        });
        (
            OptimizerEvent::Finish {
                best,
                tested_phase1: primary.tested,
                tested_phase2: refined,
            },
            GridState::Done { outcome },
        )
    }
}

impl Iterator for GridOptimizer {
    type Item = OptimizerEvent;

    fn next(&mut self) -> Option<OptimizerEvent> {
        let state = std::mem::replace(&mut self.state, GridState::Done { outcome: None });
        let (event, next_state) = match state {
            GridState::Idle => {
                let candidates = self.grid.primary_candidates(self.amount_usd);
                info!(
                    "GridOptimizer: Starting primary sweep over {} combinations",
                    candidates.len()
                );
                let total = candidates.len();
                (
                    Some(OptimizerEvent::PrimaryStart { total }),
                    GridState::Primary {
                        candidates,
                        cursor: 0,
                        tracker: BestTracker::new(),
                    },
                )
            }
            GridState::Primary {
                candidates,
                cursor,
                mut tracker,
            } => {
                if cursor < candidates.len() {
                    let cursor = self.advance(&candidates, cursor, self.primary_every, &mut tracker);
                    let total = candidates.len();
                    (
                        Some(OptimizerEvent::PrimaryProgress {
                            count: cursor,
                            total,
                        }),
                        GridState::Primary {
                            candidates,
                            cursor,
                            tracker,
                        },
                    )
                } else {
                    let best = tracker.best().copied();
                    let refine = best
                        .map(|b| self.grid.refine_candidates(&b.params, self.amount_usd))
                        .unwrap_or_default();
                    let primary = PrimarySummary {
                        tested: cursor,
                        best_perf: best.map(|b| b.performance_pct),
                    };
                    info!(
                        "GridOptimizer: Primary sweep done ({} evaluated), refining {} neighbours",
                        cursor,
                        refine.len()
                    );
                    (
                        Some(OptimizerEvent::PrimaryEnd {
                            best,
                            count_primary: cursor,
                            total_refine: refine.len(),
                        }),
                        GridState::Refine {
                            candidates: refine,
                            cursor: 0,
                            tracker: BestTracker::carried_from(&tracker),
                            primary,
                        },
                    )
                }
            }
            GridState::Refine {
                candidates,
                cursor,
                mut tracker,
                primary,
            } => {
                if cursor < candidates.len() {
                    let cursor = self.advance(&candidates, cursor, self.refine_every, &mut tracker);
                    let total = candidates.len();
                    let best_perf = tracker.best().map(|b| b.performance_pct);
                    (
                        Some(OptimizerEvent::RefineProgress {
                            count: cursor,
                            total,
                            best_perf,
                        }),
                        GridState::Refine {
                            candidates,
                            cursor,
                            tracker,
                            primary,
                        },
                    )
                } else {
                    let (event, done) = self.finish(&tracker, primary, cursor);
                    (Some(event), done)
                }
            }
            done @ GridState::Done { .. } => (None, done),
        };
        self.state = next_state;
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::FitnessError;

    /// Peaks at high=70, low=30, pct=40, max=150 with a plateau on `low`
    struct Landscape;

    impl FitnessEvaluator for Landscape {
        fn fitness(&self, p: &SmartDcaParams) -> Result<Decimal, FitnessError> {
            p.validate()?;
            let dist = |a: Decimal, b: Decimal| (a - b).abs();
            let score = Decimal::from(100)
                - dist(Decimal::from(p.fg_threshold_high), dec!(71))
                - dist(p.bag_bonus_pct, dec!(42))
                - dist(p.bag_bonus_max_usd, dec!(160)) / dec!(10)
                - if p.fg_threshold_low > 30 { dec!(5) } else { dec!(0) };
            Ok(score)
        }
    }

    fn small_grid() -> ParameterGrid {
        ParameterGrid {
            fg_threshold_high: vec![60, 70, 80],
            fg_threshold_low: vec![20, 30, 40],
            bag_bonus_pct: vec![dec!(20), dec!(40), dec!(60)],
            bag_bonus_max_multiplier: vec![dec!(1), dec!(1.5), dec!(2)],
            refine: RefineSettings::default(),
        }
    }

    #[test]
    fn test_default_grid_size() {
        let grid = ParameterGrid::default();
        assert_eq!(grid.primary_candidates(dec!(100)).len(), PRIMARY_COMBINATIONS);
        assert_eq!(grid.primary_size(), PRIMARY_COMBINATIONS);
    }

    #[test]
    fn test_primary_skips_inverted_thresholds() {
        let candidates = small_grid().primary_candidates(dec!(100));
        // (60,20) (60,30) (60,40) (70,*) x3 (80,*) x3 = 9 pairs
        assert_eq!(candidates.len(), 9 * 9);
        assert!(candidates.iter().all(|p| p.fg_threshold_low < p.fg_threshold_high));
    }

    #[test]
    fn test_refine_neighbourhood_is_bounded() {
        let grid = ParameterGrid::default();
        let center = SmartDcaParams::new(70, 30, dec!(40), dec!(150)).unwrap();
        let refine = grid.refine_candidates(&center, dec!(100));

        assert_eq!(refine.len(), 7 * 7 * 7 * 7 - 1);
        assert!(!refine.contains(&center));
        assert!(refine.iter().all(|p| (67..=73).contains(&p.fg_threshold_high)));
        assert!(refine.iter().all(|p| p.bag_bonus_max_usd >= dec!(120) && p.bag_bonus_max_usd <= dec!(180)));
    }

    #[test]
    fn test_refine_clamps_at_edges() {
        let grid = ParameterGrid::default();
        let center = SmartDcaParams::new(100, 1, dec!(100), dec!(0)).unwrap();
        let refine = grid.refine_candidates(&center, dec!(100));

        assert!(refine.iter().all(|p| p.fg_threshold_high <= 100));
        assert!(refine.iter().all(|p| p.bag_bonus_pct <= dec!(100)));
        assert!(refine.iter().all(|p| p.bag_bonus_max_usd >= Decimal::ZERO));
    }

    #[test]
    fn test_event_sequence_and_monotonic_best() {
        let optimizer = GridOptimizer::new(Arc::new(Landscape), small_grid(), dec!(100))
            .with_progress_every(10, 100);
        let events: Vec<OptimizerEvent> = optimizer.collect();

        assert_eq!(events.first(), Some(&OptimizerEvent::PrimaryStart { total: 81 }));
        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
        assert!(events.last().unwrap().is_terminal());

        let primary_best = events.iter().find_map(|e| match e {
            OptimizerEvent::PrimaryEnd { best, count_primary, .. } => {
                assert_eq!(*count_primary, 81);
                *best
            }
            _ => None,
        });
        let final_best = match events.last() {
            Some(OptimizerEvent::Finish { best, tested_phase1, .. }) => {
                assert_eq!(*tested_phase1, 81);
                *best
            }
            _ => None,
        };
        let (primary_best, final_best) = (primary_best.unwrap(), final_best.unwrap());
        assert_eq!(primary_best.params.fg_threshold_high, 70);
        assert!(final_best.performance_pct >= primary_best.performance_pct);
        assert_eq!(final_best.params.fg_threshold_high, 71);
        assert_eq!(final_best.params.bag_bonus_pct, dec!(42));
    }

    #[test]
    fn test_ties_keep_first_enumerated() {
        let mut optimizer = GridOptimizer::new(Arc::new(Landscape), small_grid(), dec!(100));
        let primary_best = optimizer
            .by_ref()
            .find_map(|e| match e {
                OptimizerEvent::PrimaryEnd { best, .. } => best,
                _ => None,
            })
            .unwrap();
        // low 20 and low 30 score the same; 20 is enumerated first
        assert_eq!(primary_best.params.fg_threshold_low, 20);

        for _ in optimizer.by_ref() {}
        let result = optimizer.outcome().unwrap();
        // the refine axis around low 20 starts at 17
        assert_eq!(result.best.params.fg_threshold_low, 17);
        let breakdown = result.phase_breakdown.unwrap();
        assert_eq!(result.tested_count, breakdown.phase1_tests + breakdown.phase2_tests);
        assert_eq!(breakdown.phase1_performance, Some(primary_best.performance_pct));
    }

    #[test]
    fn test_empty_grid_reports_no_candidate() {
        let mut grid = small_grid();
        grid.fg_threshold_low = vec![90];
        let mut optimizer = GridOptimizer::new(Arc::new(Landscape), grid, dec!(100));

        let events: Vec<_> = optimizer.by_ref().collect();
        assert_eq!(
            events,
            vec![
                OptimizerEvent::PrimaryStart { total: 0 },
                OptimizerEvent::PrimaryEnd {
                    best: None,
                    count_primary: 0,
                    total_refine: 0
                },
                OptimizerEvent::Finish {
                    best: None,
                    tested_phase1: 0,
                    tested_phase2: 0
                },
            ]
        );
        assert!(optimizer.outcome().is_none());

        let mut grid = small_grid();
        grid.fg_threshold_high = vec![];
        let err = GridOptimizer::new(Arc::new(Landscape), grid, dec!(100))
            .run_to_completion()
            .unwrap_err();
        assert_eq!(err, OptimizationError::NoCandidateFound);
    }

    #[test]
    fn test_abandoned_iterator_stops_evaluating() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct Counting(AtomicUsize);
        impl FitnessEvaluator for Counting {
            fn fitness(&self, _: &SmartDcaParams) -> Result<Decimal, FitnessError> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(Decimal::ZERO)
            }
        }

        let evaluator = Arc::new(Counting(AtomicUsize::new(0)));
        let mut optimizer = GridOptimizer::new(evaluator.clone(), ParameterGrid::default(), dec!(100));
        optimizer.next();
        optimizer.next();
        drop(optimizer);

        assert_eq!(evaluator.0.load(Ordering::SeqCst), PRIMARY_PROGRESS_EVERY);
    }

    #[test]
    fn test_grid_from_toml() {
        let toml = r#"
            fg_threshold_high = [60, 80]
            fg_threshold_low = [20]
            bag_bonus_pct = [50]
            bag_bonus_max_multiplier = [1.5]

            [refine]
            radius = 2
            threshold_step = 2
            pct_step = 5
            max_step_multiplier = 0.25
        "#;
        let grid: ParameterGrid = toml::from_str(toml).unwrap();
        assert!(grid.validate().is_ok());
        assert_eq!(grid.refine.radius, 2);
        assert_eq!(grid.primary_candidates(dec!(100))[0].bag_bonus_max_usd, dec!(150));
    }

    #[test]
    fn test_overflowing_bag_bounds_are_skipped() {
        let grid = ParameterGrid {
            bag_bonus_max_multiplier: vec![dec!(1), Decimal::MAX],
            ..small_grid()
        };
        let amount = dec!(1000);

        let primary = grid.primary_candidates(amount);
        assert_eq!(primary.len(), 9 * 3);
        assert!(primary.iter().all(|p| p.bag_bonus_max_usd == amount));
        assert!(grid.gene_bounds(amount).is_none());

        let center = SmartDcaParams::new(70, 30, dec!(40), dec!(1000)).unwrap();
        let huge_step = ParameterGrid {
            refine: RefineSettings {
                max_step_multiplier: Decimal::MAX,
                ..RefineSettings::default()
            },
            ..small_grid()
        };
        let refine = huge_step.refine_candidates(&center, amount);
        assert!(!refine.is_empty());
        assert!(refine.iter().all(|p| p.bag_bonus_max_usd == center.bag_bonus_max_usd));
    }

    #[test]
    fn test_negative_zero_axis_values_are_accepted() {
        let mut negative_zero = Decimal::ZERO;
        negative_zero.set_sign_negative(true);
        let grid = ParameterGrid {
            bag_bonus_pct: vec![negative_zero, dec!(40)],
            bag_bonus_max_multiplier: vec![negative_zero],
            ..small_grid()
        };
        assert!(grid.validate().is_ok());
    }
}
