//! Batch data structure

use ndarray::Array2;

/// A batch of classification examples
///
/// `inputs` holds one feature row per example (whatever encoding the
/// external model expects); `labels` holds the class index per example.
#[derive(Clone, Debug)]
pub struct Batch {
    /// Input feature rows, one per example
    pub inputs: Array2<f32>,
    /// Target class indices, one per example
    pub labels: Vec<usize>,
}

impl Batch {
    /// Create a new batch
    ///
    /// # Panics
    /// If the number of input rows and labels differ.
    pub fn new(inputs: Array2<f32>, labels: Vec<usize>) -> Self {
        assert_eq!(inputs.nrows(), labels.len(), "inputs and labels must have the same length");
        Self { inputs, labels }
    }

    /// Number of examples in the batch
    pub fn size(&self) -> usize {
        self.labels.len()
    }
}
