//! Training-loop controller
//!
//! The orchestrator: drives epochs, invokes the external model, applies the
//! loss policy, feeds the accumulation buffer, queries the scheduler,
//! checkpoints state, and consults the early-stopping monitor.

mod core;
mod epoch;
mod result;
mod run;


pub use core::{Controller, Phase};
pub use result::TrainOutcome;
