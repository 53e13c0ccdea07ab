//! External collaborator seams
//!
//! The neural network, the optimizer update rule, and the dataset are
//! opaque to this crate and reached through the narrow traits below. The
//! controller only requires that a forward/backward invocation either
//! completes with a well-formed result or fails atomically; failures are
//! surfaced as [`Error::External`](crate::Error::External) and never
//! retried.

use ndarray::{Array1, Array2};

use crate::error::Result;
use crate::train::batch::Batch;

/// The model under training: an opaque differentiable function
///
/// Polymorphic over architecture (transformer-based, sentence-embedding
/// based, ...). Any internal parallelism or reduced-precision arithmetic is
/// the implementation's concern; the controller only inspects outputs for
/// finiteness.
pub trait Model {
    /// Forward pass: one row of class probabilities per example in the batch
    fn forward(&mut self, batch: &Batch) -> Result<Array2<f32>>;

    /// Backward pass for the most recent forward, yielding a flat
    /// mean-over-the-micro-batch gradient
    fn backward(&mut self, loss: f32) -> Result<Array1<f32>>;

    /// Flat copy of the trainable parameters (checkpointing)
    fn parameters(&self) -> Vec<f32>;

    /// Overwrite the trainable parameters (checkpoint restore)
    fn load_parameters(&mut self, params: &[f32]) -> Result<()>;
}

/// The optimizer update rule, owning its own moment/state buffers
pub trait OptimizerBackend {
    /// Apply one update to the model's parameters
    ///
    /// `gradient` is the clipped, accumulation-averaged gradient;
    /// `lr` the scheduler's effective rate for this global step.
    fn apply(
        &mut self,
        model: &mut dyn Model,
        gradient: &Array1<f32>,
        lr: f32,
        weight_decay: f32,
    ) -> Result<()>;

    /// Serialize internal state for checkpointing (opaque to the controller)
    fn state(&self) -> serde_json::Value;

    /// Restore internal state from a checkpoint
    fn load_state(&mut self, state: &serde_json::Value) -> Result<()>;
}

/// A restartable, per-epoch-finite source of batches
pub trait DataSource {
    /// Training batches for the given epoch, in iteration order
    ///
    /// Must be a pure function of the epoch index (and the run seed) so a
    /// resumed run sees the same batches an uninterrupted one would.
    fn train_batches(&mut self, epoch: u64) -> Result<Vec<Batch>>;

    /// Validation batches; identical across epochs
    fn validation_batches(&mut self) -> Result<Vec<Batch>>;
}
