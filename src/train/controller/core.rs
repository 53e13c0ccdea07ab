//! Core controller state and lifecycle

use std::path::{Path, PathBuf};

use crate::config::{RunConfig, Warmup};
use crate::error::{Error, Result};
use crate::optim::{AccumulationBuffer, LrSchedule, WarmupHoldLr};
use crate::train::backend::{DataSource, Model, OptimizerBackend};
use crate::train::checkpoint::Checkpoint;
use crate::train::loss::FocalLoss;
use crate::train::metrics::MetricsLog;
use crate::train::monitor::EarlyStoppingMonitor;

/// Controller lifecycle phase
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Config resolved, optimizer state fresh or restored, loop not started
    Initializing,
    /// Iterating micro-batches within an epoch
    Running,
    /// Computing the validation metric after an epoch
    Evaluating,
    /// Writing checkpoints (blocking: no batches until the write completes)
    Checkpointing,
    /// Terminal: epoch budget exhausted or early stopping fired
    Stopped,
}

/// Orchestrates a training run over external collaborators
///
/// Single-threaded by construction: the accumulation window, the global
/// step counter, and the monitor have strict sequencing invariants, so none
/// of their operations ever interleave. Parallelism lives inside the
/// collaborators and is opaque here.
pub struct Controller<M, O, D> {
    pub(crate) config: RunConfig,
    pub(crate) model: M,
    pub(crate) optimizer: O,
    pub(crate) data: D,
    pub(crate) loss: FocalLoss,
    pub(crate) schedule: Option<WarmupHoldLr>,
    pub(crate) buffer: AccumulationBuffer,
    pub(crate) monitor: EarlyStoppingMonitor,
    pub(crate) metrics: MetricsLog,
    pub(crate) global_step: u64,
    pub(crate) start_epoch: u64,
    pub(crate) phase: Phase,
    pub(crate) last_checkpoint: Option<PathBuf>,
}

impl<M, O, D> Controller<M, O, D>
where
    M: Model,
    O: OptimizerBackend,
    D: DataSource,
{
    /// Create a controller for a fresh run
    ///
    /// Consumes the resolved configuration once; every component below
    /// receives its parameters explicitly from here.
    pub fn new(config: RunConfig, model: M, optimizer: O, data: D) -> Result<Self> {
        std::fs::create_dir_all(&config.output_directory).map_err(|e| Error::CheckpointWrite {
            path: config.output_directory.clone(),
            reason: e.to_string(),
        })?;

        // An absolute warmup length needs no batch count; the ratio form is
        // resolved on the first epoch once steps_per_epoch is known.
        let schedule = match config.warmup {
            Warmup::Steps(steps) => Some(WarmupHoldLr::new(config.learning_rate, steps)),
            Warmup::Ratio(_) => None,
        };

        Ok(Self {
            loss: FocalLoss::new(config.focal_loss_gamma),
            buffer: AccumulationBuffer::new(config.accumulation_steps),
            monitor: EarlyStoppingMonitor::new(config.early_stopping_patience),
            metrics: MetricsLog::new(&config.output_log_path),
            schedule,
            config,
            model,
            optimizer,
            data,
            global_step: 0,
            start_epoch: 0,
            phase: Phase::Initializing,
            last_checkpoint: None,
        })
    }

    /// Create a controller resuming from a checkpoint
    ///
    /// Restores model parameters, optimizer state, the global step counter,
    /// and the validation history; training continues at the epoch after
    /// the checkpointed one. Resumption is always from an epoch boundary,
    /// never mid-epoch.
    pub fn resume(checkpoint_path: &Path, mut model: M, mut optimizer: O, data: D) -> Result<Self> {
        let checkpoint = Checkpoint::load(checkpoint_path)?;
        model.load_parameters(&checkpoint.parameters)?;
        optimizer.load_state(&checkpoint.optimizer_state)?;

        let config = checkpoint.config;
        let monitor =
            EarlyStoppingMonitor::from_history(config.early_stopping_patience, &checkpoint.history);

        let schedule = match config.warmup {
            Warmup::Steps(steps) => Some(WarmupHoldLr::new(config.learning_rate, steps)),
            Warmup::Ratio(_) => None,
        };

        Ok(Self {
            loss: FocalLoss::new(config.focal_loss_gamma),
            buffer: AccumulationBuffer::new(config.accumulation_steps),
            metrics: MetricsLog::new(&config.output_log_path),
            schedule,
            monitor,
            global_step: checkpoint.global_step,
            start_epoch: checkpoint.epoch + 1,
            config,
            model,
            optimizer,
            data,
            phase: Phase::Initializing,
            last_checkpoint: Some(checkpoint_path.to_path_buf()),
        })
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Optimizer updates applied so far
    pub fn global_step(&self) -> u64 {
        self.global_step
    }

    /// The immutable run configuration
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// The early-stopping monitor (validation history, best metric)
    pub fn monitor(&self) -> &EarlyStoppingMonitor {
        &self.monitor
    }

    /// Path of the most recently published checkpoint, if any
    pub fn last_checkpoint(&self) -> Option<&PathBuf> {
        self.last_checkpoint.as_ref()
    }

    /// Resolve a ratio-form warmup now that the per-epoch batch count is known
    pub(crate) fn ensure_schedule(&mut self, steps_per_epoch: usize) {
        if self.schedule.is_some() {
            return;
        }
        let Warmup::Ratio(ratio) = self.config.warmup else {
            return;
        };
        let updates_per_epoch = steps_per_epoch.div_ceil(self.config.accumulation_steps) as u64;
        let total_steps = updates_per_epoch * self.config.n_epochs;
        let warmup_steps = (ratio * total_steps as f32).round() as u64;
        self.schedule = Some(WarmupHoldLr::new(self.config.learning_rate, warmup_steps));
    }

    /// Effective learning rate for the current global step
    pub(crate) fn current_lr(&self) -> f32 {
        self.schedule
            .as_ref()
            .map_or(self.config.learning_rate, |s| s.effective_lr(self.global_step))
    }
}
