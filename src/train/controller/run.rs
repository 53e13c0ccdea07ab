//! The outer training loop

use chrono::Utc;

use crate::error::Result;
use crate::train::backend::{DataSource, Model, OptimizerBackend};
use crate::train::checkpoint::{best_checkpoint_path, epoch_checkpoint_path, Checkpoint};
use crate::train::metrics::EpochRecord;

use super::core::{Controller, Phase};
use super::result::TrainOutcome;

impl<M, O, D> Controller<M, O, D>
where
    M: Model,
    O: OptimizerBackend,
    D: DataSource,
{
    /// Drive the run to completion
    ///
    /// Each epoch is train, evaluate, checkpoint, log, in that order; the
    /// loop ends when the epoch budget is exhausted or the monitor fires.
    /// Every failure is fatal: the error propagates after the current global
    /// step and last published checkpoint are reported for a clean restart.
    pub fn run(&mut self) -> Result<TrainOutcome> {
        match self.train_loop() {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.phase = Phase::Stopped;
                match &self.last_checkpoint {
                    Some(path) => eprintln!(
                        "training aborted at global step {}; resume from {}",
                        self.global_step,
                        path.display()
                    ),
                    None => eprintln!(
                        "training aborted at global step {}; no checkpoint published",
                        self.global_step
                    ),
                }
                Err(e)
            }
        }
    }

    fn train_loop(&mut self) -> Result<TrainOutcome> {
        // A resumed run can already be terminally stopped: replaying the
        // checkpointed history restores the exhausted patience window, and
        // training any further epoch would diverge from the uninterrupted
        // run's trajectory.
        if self.monitor.should_stop() {
            self.phase = Phase::Stopped;
            return Ok(TrainOutcome {
                epochs_completed: self.start_epoch,
                global_step: self.global_step,
                best_metric: self.monitor.best_metric(),
                stopped_early: true,
                last_checkpoint: self.last_checkpoint.clone(),
            });
        }

        let mut epochs_completed = self.start_epoch;
        let mut stopped_early = false;

        for epoch in self.start_epoch..self.config.n_epochs {
            self.phase = Phase::Running;
            let train_loss = self.run_epoch(epoch)?;

            self.phase = Phase::Evaluating;
            let (val_loss, val_accuracy) = self.evaluate()?;
            let improved = self.monitor.observe(epoch, val_accuracy);

            self.phase = Phase::Checkpointing;
            self.write_checkpoints(epoch, improved)?;

            let lr = self.current_lr();
            self.metrics.append(&EpochRecord {
                epoch,
                global_step: self.global_step,
                train_loss,
                val_loss,
                val_accuracy,
                lr,
            });
            eprintln!(
                "epoch {epoch}: train_loss={train_loss:.4} val_loss={val_loss:.4} \
                 val_accuracy={val_accuracy:.4} lr={lr:.2e} step={}",
                self.global_step
            );

            epochs_completed = epoch + 1;

            if self.monitor.should_stop() {
                eprintln!(
                    "early stopping at epoch {epoch}: no improvement in {} epochs",
                    self.config.early_stopping_patience
                );
                stopped_early = true;
                break;
            }
        }

        self.phase = Phase::Stopped;
        Ok(TrainOutcome {
            epochs_completed,
            global_step: self.global_step,
            best_metric: self.monitor.best_metric(),
            stopped_early,
            last_checkpoint: self.last_checkpoint.clone(),
        })
    }

    /// Publish the epoch checkpoint, and the best checkpoint on improvement
    ///
    /// Checkpointing blocks the loop: no batch is processed until the write
    /// completes, so every snapshot has a fully-applied optimizer state.
    fn write_checkpoints(&mut self, epoch: u64, improved: bool) -> Result<()> {
        let checkpoint = Checkpoint {
            parameters: self.model.parameters(),
            optimizer_state: self.optimizer.state(),
            global_step: self.global_step,
            epoch,
            config: self.config.clone(),
            history: self.monitor.history().clone(),
            created_at: Utc::now(),
        };

        let path = epoch_checkpoint_path(&self.config.output_directory, epoch);
        checkpoint.save(&path)?;
        self.last_checkpoint = Some(path);

        if improved {
            checkpoint.save(&best_checkpoint_path(&self.config.output_directory))?;
        }
        Ok(())
    }
}
