//! Learning rate scheduling

/// Maps the global step count to an effective learning rate
///
/// The global step counts optimizer updates, not micro-batches, so a
/// schedule sees one tick per accumulation window.
pub trait LrSchedule {
    /// Effective learning rate at the given global step
    fn effective_lr(&self, global_step: u64) -> f32;
}

/// Linear warmup followed by a hold at the base rate
///
/// Formula: for `global_step < warmup_steps`,
/// `lr = base_lr * (global_step + 1) / warmup_steps`; afterwards `base_lr`.
/// The `+ 1` starts the ramp above zero so the first optimizer step is not
/// dead. No post-warmup decay: the evidenced configuration surface shows
/// warmup only, and a decay policy would be a second [`LrSchedule`] impl.
#[derive(Clone, Copy, Debug)]
pub struct WarmupHoldLr {
    base_lr: f32,
    warmup_steps: u64,
}

impl WarmupHoldLr {
    /// Create a warmup-then-hold schedule
    ///
    /// `warmup_steps = 0` disables the ramp entirely.
    pub fn new(base_lr: f32, warmup_steps: u64) -> Self {
        Self { base_lr, warmup_steps }
    }

    /// Number of warmup steps
    pub fn warmup_steps(&self) -> u64 {
        self.warmup_steps
    }

    /// Base (post-warmup) learning rate
    pub fn base_lr(&self) -> f32 {
        self.base_lr
    }
}

impl LrSchedule for WarmupHoldLr {
    fn effective_lr(&self, global_step: u64) -> f32 {
        if global_step < self.warmup_steps {
            self.base_lr * (global_step + 1) as f32 / self.warmup_steps as f32
        } else {
            self.base_lr
        }
    }
}
