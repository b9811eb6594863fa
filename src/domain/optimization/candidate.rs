use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::strategy::SmartDcaParams;

/// A parameter set together with the performance it produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationCandidate {
    #[serde(flatten)]
    pub params: SmartDcaParams,
    #[serde(with = "rust_decimal::serde::float")]
    pub performance_pct: Decimal,
}

impl OptimizationCandidate {
    pub fn new(params: SmartDcaParams, performance_pct: Decimal) -> Self {
        Self {
            params,
            performance_pct,
        }
    }

    /// Strictly better only. An equal score never displaces an earlier candidate.
    pub fn beats(&self, other: &OptimizationCandidate) -> bool {
        self.performance_pct > other.performance_pct
    }
}

/// Running best and runner-up of a single search.
///
/// Owned by the run that feeds it; ties keep whichever candidate was offered first.
#[derive(Debug, Clone, Default)]
pub struct BestTracker {
    best: Option<OptimizationCandidate>,
    second_best: Option<OptimizationCandidate>,
}

impl BestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a tracker that already holds the leaders of an earlier phase
    pub fn carried_from(previous: &BestTracker) -> Self {
        Self {
            best: previous.best,
            second_best: previous.second_best,
        }
    }

    pub fn offer(&mut self, candidate: OptimizationCandidate) {
        match self.best {
            None => self.best = Some(candidate),
            Some(best) if candidate.beats(&best) => {
                self.second_best = Some(best);
                self.best = Some(candidate);
            }
            Some(best) => {
                if best.params == candidate.params {
                    return;
                }
                let replaces_second = match self.second_best {
                    None => true,
                    Some(second) => candidate.beats(&second),
                };
                if replaces_second {
                    self.second_best = Some(candidate);
                }
            }
        }
    }

    pub fn best(&self) -> Option<&OptimizationCandidate> {
        self.best.as_ref()
    }

    pub fn second_best(&self) -> Option<&OptimizationCandidate> {
        self.second_best.as_ref()
    }
}

/// Per-phase counters of a two-phase search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseBreakdown {
    pub phase1_tests: usize,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub phase1_performance: Option<Decimal>,
    pub phase2_tests: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub best: OptimizationCandidate,
    pub second_best: Option<OptimizationCandidate>,
    pub tested_count: usize,
    pub phase_breakdown: Option<PhaseBreakdown>,
}

/// Single-shot response shape: `{tested, best, second_best?}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegacyOptimizationView {
    pub tested: usize,
    pub best: OptimizationCandidate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub second_best: Option<OptimizationCandidate>,
}

/// Phased response shape: `{phase1_tests, phase1_performance, phase2_tests, best}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhasedOptimizationView {
    pub phase1_tests: usize,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub phase1_performance: Option<Decimal>,
    pub phase2_tests: usize,
    pub best: OptimizationCandidate,
}

impl OptimizationResult {
    pub fn legacy_view(&self) -> LegacyOptimizationView {
        LegacyOptimizationView {
            tested: self.tested_count,
            best: self.best,
            second_best: self.second_best,
        }
    }

    pub fn phased_view(&self) -> PhasedOptimizationView {
        let breakdown = self.phase_breakdown.unwrap_or(PhaseBreakdown {
            phase1_tests: self.tested_count,
            phase1_performance: Some(self.best.performance_pct),
            phase2_tests: 0,
        });
        PhasedOptimizationView {
            phase1_tests: breakdown.phase1_tests,
            phase1_performance: breakdown.phase1_performance,
            phase2_tests: breakdown.phase2_tests,
            best: self.best,
        }
    }
}
