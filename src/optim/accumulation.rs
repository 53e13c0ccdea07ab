//! Gradient accumulation across micro-batches
//!
//! Accumulating gradients over `accumulation_steps` micro-batches before an
//! optimizer step emulates an effective batch of
//! `batch_size * accumulation_steps` without holding that many activations
//! at once. Gradients are summed on [`AccumulationBuffer::add`] and averaged
//! on [`AccumulationBuffer::drain`], so the applied update matches what a
//! single large batch would have produced.

use ndarray::Array1;

/// Aggregates micro-batch gradients for one optimizer-step window
///
/// The window boundary is `(micro_batch_index + 1) % accumulation_steps == 0`.
/// A partial window (an epoch ending mid-window) is a legal drain: the sum is
/// divided by the actual number of `add` calls received, not the configured
/// count, so the last batches of an epoch are neither dropped nor
/// over-weighted.
#[derive(Clone, Debug)]
pub struct AccumulationBuffer {
    accumulation_steps: usize,
    sum: Option<Array1<f32>>,
    count: usize,
}

impl AccumulationBuffer {
    /// Create a buffer for windows of `accumulation_steps` micro-batches
    pub fn new(accumulation_steps: usize) -> Self {
        Self { accumulation_steps: accumulation_steps.max(1), sum: None, count: 0 }
    }

    /// Configured window length
    pub fn accumulation_steps(&self) -> usize {
        self.accumulation_steps
    }

    /// Number of micro-batch gradients in the current window
    pub fn len(&self) -> usize {
        self.count
    }

    /// True when no gradients have been added since the last drain
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Add a micro-batch gradient to the current window (summation)
    ///
    /// # Panics
    /// If the gradient's dimension differs from earlier gradients in the
    /// window.
    pub fn add(&mut self, grad: &Array1<f32>) {
        match &mut self.sum {
            Some(sum) => {
                assert_eq!(sum.len(), grad.len(), "gradient dimension changed mid-window");
                *sum += grad;
            }
            None => self.sum = Some(grad.clone()),
        }
        self.count += 1;
    }

    /// True exactly when the micro-batch at `micro_batch_index` closes a window
    pub fn should_step(&self, micro_batch_index: usize) -> bool {
        (micro_batch_index + 1) % self.accumulation_steps == 0
    }

    /// Average the window and reset to empty
    ///
    /// Divides by the actual number of `add` calls received, which equals
    /// `accumulation_steps` for a full window and less for a trailing
    /// partial window. Returns `None` if nothing was added.
    pub fn drain(&mut self) -> Option<Array1<f32>> {
        let sum = self.sum.take()?;
        let count = self.count as f32;
        self.count = 0;
        Some(sum / count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::arr1;

    #[test]
    fn test_full_window_drains_to_mean() {
        let mut buffer = AccumulationBuffer::new(3);
        buffer.add(&arr1(&[1.0, 2.0]));
        buffer.add(&arr1(&[3.0, 4.0]));
        buffer.add(&arr1(&[5.0, 6.0]));

        let mean = buffer.drain().unwrap();
        assert_abs_diff_eq!(mean[0], 3.0, epsilon = 1e-6);
        assert_abs_diff_eq!(mean[1], 4.0, epsilon = 1e-6);
    }

    #[test]
    fn test_drain_resets_state() {
        let mut buffer = AccumulationBuffer::new(2);
        buffer.add(&arr1(&[4.0]));
        buffer.add(&arr1(&[8.0]));
        buffer.drain().unwrap();

        assert!(buffer.is_empty());

        // Next add starts a fresh window
        buffer.add(&arr1(&[10.0]));
        buffer.add(&arr1(&[20.0]));
        let mean = buffer.drain().unwrap();
        assert_abs_diff_eq!(mean[0], 15.0, epsilon = 1e-6);
    }

    #[test]
    fn test_partial_window_divides_by_actual_count() {
        // 3 adds with accumulation_steps = 5: mean of the 3, not sum / 5
        let mut buffer = AccumulationBuffer::new(5);
        buffer.add(&arr1(&[3.0]));
        buffer.add(&arr1(&[6.0]));
        buffer.add(&arr1(&[9.0]));

        let mean = buffer.drain().unwrap();
        assert_abs_diff_eq!(mean[0], 6.0, epsilon = 1e-6);
    }

    #[test]
    fn test_drain_empty_returns_none() {
        let mut buffer = AccumulationBuffer::new(4);
        assert!(buffer.drain().is_none());
    }

    #[test]
    fn test_should_step_boundaries() {
        let buffer = AccumulationBuffer::new(4);
        assert!(!buffer.should_step(0));
        assert!(!buffer.should_step(1));
        assert!(!buffer.should_step(2));
        assert!(buffer.should_step(3));
        assert!(!buffer.should_step(4));
        assert!(buffer.should_step(7));
    }

    #[test]
    fn test_should_step_every_batch_when_disabled() {
        let buffer = AccumulationBuffer::new(1);
        assert!(buffer.should_step(0));
        assert!(buffer.should_step(1));
        assert!(buffer.should_step(2));
    }

    #[test]
    fn test_len_tracks_window() {
        let mut buffer = AccumulationBuffer::new(3);
        assert_eq!(buffer.len(), 0);
        buffer.add(&arr1(&[1.0]));
        buffer.add(&arr1(&[1.0]));
        assert_eq!(buffer.len(), 2);
        buffer.drain();
        assert_eq!(buffer.len(), 0);
    }

    #[test]
    #[should_panic(expected = "gradient dimension changed")]
    fn test_dimension_mismatch_panics() {
        let mut buffer = AccumulationBuffer::new(2);
        buffer.add(&arr1(&[1.0, 2.0]));
        buffer.add(&arr1(&[1.0]));
    }
}
