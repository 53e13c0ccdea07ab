//! Optimization-step machinery: learning-rate scheduling, gradient clipping,
//! and gradient accumulation
//!
//! The optimizer itself (moment buffers, update rule) is an external
//! collaborator; this module owns everything the controller decides *about*
//! an optimizer step: the effective learning rate for a given global step,
//! the clip applied to the accumulated gradient, and the accumulation window
//! that emulates a larger effective batch.

mod accumulation;
mod clip;
mod scheduler;

pub use accumulation::AccumulationBuffer;
pub use clip::clip_grad_norm;
pub use scheduler::{LrSchedule, WarmupHoldLr};
