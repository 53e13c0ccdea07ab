//! Crate-level error taxonomy
//!
//! Every failure in a training run is fatal for the current process: the run
//! must stop rather than apply a corrupted update or trust a half-written
//! checkpoint. The controller surfaces enough state (global step, last
//! published checkpoint) for a clean resume on restart.

use std::path::PathBuf;

use crate::config::ConfigError;

/// Fatal training-run error
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid hyperparameter configuration; nothing runs.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Non-finite loss or gradient value. Skipping the offending batch would
    /// break the accumulation-window invariant, so the run stops instead.
    #[error("numerical instability: non-finite {quantity} ({value})")]
    NumericalInstability {
        /// What went non-finite ("loss" or "gradient")
        quantity: &'static str,
        /// The offending value
        value: f32,
    },

    /// Checkpoint write failure. The previous checkpoint is left untouched.
    #[error("checkpoint write failed at {path}: {reason}")]
    CheckpointWrite { path: PathBuf, reason: String },

    /// Checkpoint read/verification failure; resumption is unsafe.
    #[error("checkpoint read failed at {path}: {reason}")]
    CheckpointRead { path: PathBuf, reason: String },

    /// Opaque failure from the model, optimizer, or data collaborator.
    /// Never retried: retrying a failed forward/backward pass without
    /// knowing the failure's nature risks silent corruption.
    #[error("external compute failure: {0}")]
    External(String),
}

/// Crate-level result alias
pub type Result<T> = std::result::Result<T, Error>;
