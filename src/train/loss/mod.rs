//! Loss computation
//!
//! The controller sees model outputs as per-example class probability rows;
//! a [`LossPolicy`] turns a row plus its ground-truth label into a scalar
//! loss. The shipped policy is [`FocalLoss`], which reduces to plain
//! cross-entropy at `gamma = 0`.

mod focal;

use ndarray::{Array2, ArrayView1};

use crate::error::{Error, Result};

pub use focal::FocalLoss;

/// Per-example loss over predicted class probabilities
pub trait LossPolicy {
    /// Compute the loss for one example
    ///
    /// `probs` is the predicted probability distribution over classes;
    /// `label` is the true class index. Fails with
    /// [`Error::NumericalInstability`](crate::Error::NumericalInstability)
    /// rather than returning a non-finite value.
    fn compute(&self, probs: ArrayView1<'_, f32>, label: usize) -> Result<f32>;

    /// Name of the loss policy
    fn name(&self) -> &str;

    /// Mean loss over a batch of probability rows
    ///
    /// A row count that differs from the label count means the model
    /// returned a malformed result; that surfaces as
    /// [`Error::External`](crate::Error::External), not a panic.
    fn compute_batch(&self, probs: &Array2<f32>, labels: &[usize]) -> Result<f32> {
        if probs.nrows() != labels.len() {
            return Err(Error::External(format!(
                "model returned {} probability rows for {} labels",
                probs.nrows(),
                labels.len()
            )));
        }

        let mut total = 0.0;
        for (row, &label) in probs.rows().into_iter().zip(labels) {
            total += self.compute(row, label)?;
        }
        let n = labels.len().max(1) as f32;
        Ok(total / n)
    }
}
