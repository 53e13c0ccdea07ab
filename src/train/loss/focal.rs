//! Focal loss for class-imbalanced classification

use ndarray::ArrayView1;

use super::LossPolicy;
use crate::error::{Error, Result};

/// Focal loss: cross-entropy with a `(1 - p_true)^gamma` modulation
///
/// The base loss is `-log(p_true)`. With `gamma > 0` each example's
/// cross-entropy is scaled by `(1 - p_true)^gamma`, which suppresses the
/// contribution of already-confidently-correct examples and concentrates
/// gradient signal on hard or misclassified ones — the NLI label sets this
/// trains against are imbalanced enough for that to matter. With
/// `gamma = 0` this is plain cross-entropy.
///
/// # Example
///
/// ```
/// use ndarray::arr1;
/// use nli_trainer::train::{FocalLoss, LossPolicy};
///
/// let ce = FocalLoss::new(0.0);
/// let focal = FocalLoss::new(2.0);
/// let probs = arr1(&[0.9, 0.05, 0.05]);
///
/// // An easy example contributes far less under focal modulation
/// let plain = ce.compute(probs.view(), 0).unwrap();
/// let modulated = focal.compute(probs.view(), 0).unwrap();
/// assert!(modulated < plain);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct FocalLoss {
    gamma: f32,
}

impl FocalLoss {
    /// Clamp floor for `p_true` before the logarithm
    const EPS: f32 = 1e-12;

    /// Create a focal loss with the given modulation exponent
    pub fn new(gamma: f32) -> Self {
        Self { gamma }
    }

    /// Modulation exponent
    pub fn gamma(&self) -> f32 {
        self.gamma
    }
}

impl LossPolicy for FocalLoss {
    fn compute(&self, probs: ArrayView1<'_, f32>, label: usize) -> Result<f32> {
        let p_true = *probs.get(label).ok_or_else(|| {
            Error::External(format!("label {label} out of range for {} classes", probs.len()))
        })?;

        // Clamp away from 0 so log stays finite
        let p = p_true.clamp(Self::EPS, 1.0);
        let ce = -p.ln();
        let loss = if self.gamma > 0.0 { (1.0 - p).powf(self.gamma) * ce } else { ce };

        if loss.is_finite() {
            Ok(loss)
        } else {
            Err(Error::NumericalInstability { quantity: "loss", value: loss })
        }
    }

    fn name(&self) -> &'static str {
        if self.gamma > 0.0 {
            "FocalLoss"
        } else {
            "CrossEntropy"
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use ndarray::arr1;
    use proptest::prelude::*;

    proptest! {
        /// Loss is finite and non-negative for any valid probability.
        #[test]
        fn loss_finite_and_non_negative(
            p_true in 0.0f32..=1.0,
            gamma in 0.0f32..5.0,
        ) {
            let loss = FocalLoss::new(gamma);
            let probs = arr1(&[p_true, 1.0 - p_true]);
            let value = loss.compute(probs.view(), 0).unwrap();
            prop_assert!(value.is_finite());
            prop_assert!(value >= 0.0);
        }

        /// Focal loss never exceeds plain cross-entropy for the same example.
        #[test]
        fn focal_bounded_by_cross_entropy(
            p_true in 0.001f32..=1.0,
            gamma in 0.0f32..5.0,
        ) {
            let ce = FocalLoss::new(0.0);
            let focal = FocalLoss::new(gamma);
            let probs = arr1(&[p_true, 1.0 - p_true]);

            let plain = ce.compute(probs.view(), 0).unwrap();
            let modulated = focal.compute(probs.view(), 0).unwrap();
            prop_assert!(modulated <= plain * (1.0 + 1e-5));
        }
    }
}
