//! Training-run control
//!
//! This module owns the optimization-loop state machine and its supporting
//! subsystems:
//! - Loss computation with class-imbalance-aware weighting (focal loss)
//! - Early stopping against a validation metric
//! - Atomic, resumable checkpoints
//! - Best-effort per-epoch metrics logging
//! - The controller that sequences all of the above around the external
//!   model/optimizer/data collaborators
//!
//! # Example
//!
//! ```no_run
//! use nli_trainer::config::RawConfig;
//! use nli_trainer::train::{Controller, DataSource, Model, OptimizerBackend};
//!
//! fn launch<M, O, D>(model: M, optimizer: O, data: D) -> nli_trainer::Result<()>
//! where
//!     M: Model,
//!     O: OptimizerBackend,
//!     D: DataSource,
//! {
//!     let config = RawConfig::from_file("run.yaml")?.resolve()?;
//!     let mut controller = Controller::new(config, model, optimizer, data)?;
//!     let outcome = controller.run()?;
//!     eprintln!("best validation accuracy: {:?}", outcome.best_metric);
//!     Ok(())
//! }
//! ```

mod backend;
mod batch;
mod checkpoint;
mod controller;
mod loss;
mod metrics;
mod monitor;

pub use backend::{DataSource, Model, OptimizerBackend};
pub use batch::Batch;
pub use checkpoint::{best_checkpoint_path, epoch_checkpoint_path, Checkpoint};
pub use controller::{Controller, Phase, TrainOutcome};
pub use loss::{FocalLoss, LossPolicy};
pub use metrics::{EpochRecord, MetricsLog};
pub use monitor::{EarlyStoppingMonitor, MonitorState, ValidationHistory};
