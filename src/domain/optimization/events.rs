use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::optimization::candidate::OptimizationCandidate;

/// Progress notification of a two-phase grid search.
///
/// A run emits `PrimaryStart`, then `PrimaryProgress` events, one `PrimaryEnd`,
/// `RefineProgress` events and exactly one terminal `Finish`, in that order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum OptimizerEvent {
    PrimaryStart {
        total: usize,
    },
    PrimaryProgress {
        count: usize,
        total: usize,
    },
    PrimaryEnd {
        best: Option<OptimizationCandidate>,
        count_primary: usize,
        total_refine: usize,
    },
    RefineProgress {
        count: usize,
        total: usize,
        #[serde(with = "rust_decimal::serde::float_option")]
        best_perf: Option<Decimal>,
    },
    Finish {
        best: Option<OptimizationCandidate>,
        tested_phase1: usize,
        tested_phase2: usize,
    },
}

impl OptimizerEvent {
    pub fn phase(&self) -> &'static str {
        match self {
            OptimizerEvent::PrimaryStart { .. } => "primary_start",
            OptimizerEvent::PrimaryProgress { .. } => "primary_progress",
            OptimizerEvent::PrimaryEnd { .. } => "primary_end",
            OptimizerEvent::RefineProgress { .. } => "refine_progress",
            OptimizerEvent::Finish { .. } => "finish",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OptimizerEvent::Finish { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_events_are_tagged_by_phase() {
        let json = serde_json::to_value(OptimizerEvent::PrimaryProgress {
            count: 250,
            total: 8000,
        })
        .unwrap();
        assert_eq!(json["phase"], "primary_progress");
        assert_eq!(json["count"], 250);

        let json = serde_json::to_value(OptimizerEvent::RefineProgress {
            count: 100,
            total: 2400,
            best_perf: Some(dec!(31.25)),
        })
        .unwrap();
        assert_eq!(json["phase"], "refine_progress");
        assert_eq!(json["best_perf"], 31.25);
    }

    #[test]
    fn test_finish_is_terminal() {
        let finish = OptimizerEvent::Finish {
            best: None,
            tested_phase1: 0,
            tested_phase2: 0,
        };
        assert!(finish.is_terminal());
        assert_eq!(finish.phase(), "finish");
        assert!(!OptimizerEvent::PrimaryStart { total: 1 }.is_terminal());
    }
}
