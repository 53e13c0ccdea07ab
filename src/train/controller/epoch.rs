//! Per-epoch training and evaluation passes

use ndarray::{Array1, ArrayView1};

use crate::error::{Error, Result};
use crate::optim::clip_grad_norm;
use crate::train::backend::{DataSource, Model, OptimizerBackend};
use crate::train::loss::LossPolicy;

use super::core::Controller;

fn check_finite(grad: &Array1<f32>) -> Result<()> {
    match grad.iter().find(|g| !g.is_finite()) {
        Some(&value) => Err(Error::NumericalInstability { quantity: "gradient", value }),
        None => Ok(()),
    }
}

fn argmax(row: ArrayView1<'_, f32>) -> usize {
    row.iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
        .0
}

impl<M, O, D> Controller<M, O, D>
where
    M: Model,
    O: OptimizerBackend,
    D: DataSource,
{
    /// Run one training epoch, returning the mean micro-batch loss
    ///
    /// Each micro-batch is forward, loss, backward, accumulate; an optimizer
    /// step fires whenever a window closes. A trailing partial window still
    /// produces an update so no micro-batch is dropped at the epoch boundary.
    pub(crate) fn run_epoch(&mut self, epoch: u64) -> Result<f32> {
        let batches = self.data.train_batches(epoch)?;
        self.ensure_schedule(batches.len());

        let n = batches.len();
        let mut loss_sum = 0.0f64;

        for (i, batch) in batches.iter().enumerate() {
            let probs = self.model.forward(batch)?;
            let loss = self.loss.compute_batch(&probs, &batch.labels)?;
            loss_sum += f64::from(loss);

            let grad = self.model.backward(loss)?;
            check_finite(&grad)?;
            self.buffer.add(&grad);

            if self.buffer.should_step(i) || i + 1 == n {
                self.optimizer_step()?;
            }
        }

        Ok(if n == 0 { 0.0 } else { (loss_sum / n as f64) as f32 })
    }

    /// Drain the accumulation window and apply one optimizer update
    ///
    /// Clipping operates on the accumulated (averaged) gradient, not on the
    /// per-micro-batch gradients, and the global step advances only here.
    fn optimizer_step(&mut self) -> Result<()> {
        let Some(mut grad) = self.buffer.drain() else {
            return Ok(());
        };
        // Summation can overflow even when every micro-gradient was finite
        check_finite(&grad)?;

        if let Some(max_norm) = self.config.gradient_clip_threshold {
            clip_grad_norm(&mut grad, max_norm);
        }

        let lr = self.current_lr();
        self.optimizer.apply(&mut self.model, &grad, lr, self.config.weight_decay)?;
        self.global_step += 1;
        Ok(())
    }

    /// Evaluate on the validation set: (mean loss, accuracy)
    ///
    /// Both figures are per-example means, so an uneven trailing batch
    /// carries exactly its share of the weight. Accuracy is argmax-vs-label;
    /// an empty validation set evaluates to (0, 0) rather than failing.
    pub(crate) fn evaluate(&mut self) -> Result<(f32, f32)> {
        let batches = self.data.validation_batches()?;

        let mut loss_sum = 0.0f64;
        let mut correct = 0usize;
        let mut total = 0usize;

        for batch in &batches {
            let probs = self.model.forward(batch)?;
            let batch_loss = self.loss.compute_batch(&probs, &batch.labels)?;
            loss_sum += f64::from(batch_loss) * batch.size() as f64;

            for (row, &label) in probs.rows().into_iter().zip(&batch.labels) {
                if argmax(row) == label {
                    correct += 1;
                }
                total += 1;
            }
        }

        let val_loss = if total == 0 { 0.0 } else { (loss_sum / total as f64) as f32 };
        let accuracy = if total == 0 { 0.0 } else { correct as f32 / total as f32 };
        Ok((val_loss, accuracy))
    }
}
