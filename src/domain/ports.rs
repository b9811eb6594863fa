use rust_decimal::Decimal;

use crate::domain::errors::FitnessError;
use crate::domain::strategy::SmartDcaParams;

/// Scores one smart DCA parameter set.
///
/// Both optimizers search through this trait, so a score reported by either
/// of them is reproduced exactly by calling `fitness` again with the same
/// parameters. A parameter set that cannot be scored is skipped by the
/// optimizers, it never counts as a candidate. Implementations are evaluated
/// from rayon worker threads.
pub trait FitnessEvaluator: Send + Sync {
    fn fitness(&self, params: &SmartDcaParams) -> Result<Decimal, FitnessError>;
}
