//! Per-epoch metrics logging
//!
//! An append-only tabular record of each epoch's loss and validation
//! figures for downstream inspection. Logging is best-effort: a write
//! failure is reported to stderr and never stops the training loop.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One epoch's worth of metrics
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpochRecord {
    /// Epoch index (0-based)
    pub epoch: u64,
    /// Global step after the epoch completed
    pub global_step: u64,
    /// Mean training loss over the epoch
    pub train_loss: f32,
    /// Mean validation loss
    pub val_loss: f32,
    /// Validation accuracy (the early-stopping metric)
    pub val_accuracy: f32,
    /// Effective learning rate at the end of the epoch
    pub lr: f32,
}

/// Append-only TSV metrics log
#[derive(Clone, Debug)]
pub struct MetricsLog {
    path: PathBuf,
}

impl MetricsLog {
    const HEADER: &'static str = "epoch\tglobal_step\ttrain_loss\tval_loss\tval_accuracy\tlr";

    /// Create a log writing to `path` (the file is created on first append)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the log file
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Append one record, writing the header first on a fresh file
    ///
    /// Best-effort: failures are reported to stderr and swallowed so the
    /// training loop is never blocked on the log.
    pub fn append(&self, record: &EpochRecord) {
        if let Err(e) = self.try_append(record) {
            eprintln!("metrics log write to {} failed: {e}", self.path.display());
        }
    }

    fn try_append(&self, record: &EpochRecord) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        if file.metadata()?.len() == 0 {
            writeln!(file, "{}", Self::HEADER)?;
        }
        writeln!(
            file,
            "{}\t{}\t{:.6}\t{:.6}\t{:.6}\t{:.8}",
            record.epoch,
            record.global_step,
            record.train_loss,
            record.val_loss,
            record.val_accuracy,
            record.lr
        )
    }
}
