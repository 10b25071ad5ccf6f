//! Scoring stage abstraction.

use crate::state::{AnalysisState, Dimension, StageOutcome};

/// A single scoring pass over an analysis state.
///
/// Stages are total: they always produce an outcome, treating missing or
/// empty snapshot data as zero signal rather than an error. Each stage
/// owns exactly one [`Dimension`].
pub trait Stage {
    /// The dimension this stage scores.
    fn dimension(&self) -> Dimension;

    /// Compute the sub-score and supporting facts for this dimension.
    fn evaluate(&self, state: &AnalysisState) -> StageOutcome;
}
