// Fitness-bearing strategies consumed by the optimizers
pub mod smart_dca;

pub use smart_dca::SmartDcaEvaluator;
