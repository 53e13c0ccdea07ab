//! Training run outcome

use std::path::PathBuf;

/// Summary of a completed training run
#[derive(Clone, Debug, PartialEq)]
pub struct TrainOutcome {
    /// Total epochs completed, counting any epochs before a resume
    pub epochs_completed: u64,
    /// Optimizer updates applied over the whole run
    pub global_step: u64,
    /// Best validation metric observed, if any epoch was evaluated
    pub best_metric: Option<f32>,
    /// True when early stopping ended the run before the epoch budget
    pub stopped_early: bool,
    /// Path of the last published epoch checkpoint
    pub last_checkpoint: Option<PathBuf>,
}
