//! Early stopping against a validation metric

use serde::{Deserialize, Serialize};

/// Monitor state: watching for improvement, or terminally stopped
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonitorState {
    /// Still tracking the metric
    Watching,
    /// Patience exhausted; terminal for the run
    Stopped,
}

/// Append-only record of per-epoch validation metrics
///
/// Owned by the monitor, serialized into every checkpoint, and replayed on
/// resume so the patience window survives a restart.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationHistory {
    records: Vec<(u64, f32)>,
}

impl ValidationHistory {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an (epoch, metric) observation
    pub fn push(&mut self, epoch: u64, metric: f32) {
        self.records.push((epoch, metric));
    }

    /// All observations in order
    pub fn records(&self) -> &[(u64, f32)] {
        &self.records
    }

    /// Number of observations
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no epoch has been observed yet
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The observation with the highest metric, if any
    pub fn best(&self) -> Option<(u64, f32)> {
        self.records
            .iter()
            .copied()
            .fold(None, |best, (epoch, metric)| match best {
                Some((_, b)) if b >= metric => best,
                _ => Some((epoch, metric)),
            })
    }
}

/// Tracks a higher-is-better validation metric and signals termination after
/// a patience window without improvement
///
/// State machine: starts `Watching` with `best_metric = -inf`; each
/// [`observe`](Self::observe) either resets the patience counter (on
/// improvement) or increments it, and the monitor transitions to the
/// terminal `Stopped` state once the counter reaches `patience` (when
/// `patience > 0`). With `patience = 0` the monitor never stops the run but
/// still tracks the best metric for checkpoint purposes.
#[derive(Clone, Debug)]
pub struct EarlyStoppingMonitor {
    patience: usize,
    best_metric: f32,
    epochs_without_improvement: usize,
    state: MonitorState,
    history: ValidationHistory,
}

impl EarlyStoppingMonitor {
    /// Create a monitor with the given patience (0 disables stopping)
    pub fn new(patience: usize) -> Self {
        Self {
            patience,
            best_metric: f32::NEG_INFINITY,
            epochs_without_improvement: 0,
            state: MonitorState::Watching,
            history: ValidationHistory::new(),
        }
    }

    /// Rebuild a monitor from a checkpointed history (resume path)
    ///
    /// Replays every observation so the best metric and the patience counter
    /// match what an uninterrupted run would hold.
    pub fn from_history(patience: usize, history: &ValidationHistory) -> Self {
        let mut monitor = Self::new(patience);
        for &(epoch, metric) in history.records() {
            monitor.observe(epoch, metric);
        }
        monitor
    }

    /// Record a validation metric for an epoch
    ///
    /// Returns true if the metric improved on the best so far (the caller's
    /// cue to publish a "best" checkpoint). A no-op once stopped.
    pub fn observe(&mut self, epoch: u64, metric: f32) -> bool {
        if self.state == MonitorState::Stopped {
            return false;
        }

        self.history.push(epoch, metric);

        let improved = metric > self.best_metric;
        if improved {
            self.best_metric = metric;
            self.epochs_without_improvement = 0;
        } else {
            self.epochs_without_improvement += 1;
            if self.patience > 0 && self.epochs_without_improvement >= self.patience {
                self.state = MonitorState::Stopped;
            }
        }
        improved
    }

    /// True once the patience window is exhausted; permanent for the run
    pub fn should_stop(&self) -> bool {
        self.state == MonitorState::Stopped
    }

    /// Current state
    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Best metric observed so far, if any epoch has been observed
    pub fn best_metric(&self) -> Option<f32> {
        if self.history.is_empty() {
            None
        } else {
            Some(self.best_metric)
        }
    }

    /// Epochs since the last improvement
    pub fn epochs_without_improvement(&self) -> usize {
        self.epochs_without_improvement
    }

    /// The append-only validation history
    pub fn history(&self) -> &ValidationHistory {
        &self.history
    }
}
