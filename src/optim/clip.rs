//! Gradient clipping utilities

use ndarray::Array1;

/// Clip a gradient by its global L2 norm
///
/// Computes the L2 norm over all components and scales them down if the norm
/// exceeds `max_norm`, preserving the gradient's direction.
///
/// Algorithm:
/// 1. `norm = sqrt(sum of squared components)`
/// 2. If `norm > max_norm`: scale every component by `max_norm / norm`
///
/// The caller must pass the fully accumulated gradient, never a
/// per-micro-batch one, so the clip reflects the true effective-batch
/// gradient magnitude.
///
/// # Returns
/// The global norm before clipping
pub fn clip_grad_norm(grad: &mut Array1<f32>, max_norm: f32) -> f32 {
    let norm = grad.iter().map(|&g| g * g).sum::<f32>().sqrt();

    // Only clip if the norm exceeds max_norm
    if norm > max_norm {
        let clip_coef = max_norm / norm;
        grad.mapv_inplace(|g| g * clip_coef);
    }

    norm
}


#[cfg(test)]
mod proptests {
    use super::*;
    use ndarray::Array1;
    use proptest::prelude::*;

    proptest! {
        /// Clipping never increases the norm, and the result never exceeds
        /// the threshold (up to float tolerance).
        #[test]
        fn clipped_norm_bounded(
            components in proptest::collection::vec(-100.0f32..100.0, 1..64),
            max_norm in 0.01f32..10.0,
        ) {
            let mut grad = Array1::from(components);
            let before = grad.iter().map(|&g| g * g).sum::<f32>().sqrt();
            let reported = clip_grad_norm(&mut grad, max_norm);
            let after = grad.iter().map(|&g| g * g).sum::<f32>().sqrt();

            prop_assert!((reported - before).abs() <= before * 1e-5 + 1e-6);
            prop_assert!(after <= before + 1e-4);
            prop_assert!(after <= max_norm.max(before) + 1e-4);
        }
    }
}
