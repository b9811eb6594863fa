// Search vocabulary shared by the grid and genetic optimizers
pub mod candidate;
pub mod events;

pub use candidate::{
    BestTracker, LegacyOptimizationView, OptimizationCandidate, OptimizationResult,
    PhaseBreakdown, PhasedOptimizationView,
};
pub use events::OptimizerEvent;
