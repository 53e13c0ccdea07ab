//! nli-trainer: a training-run controller for NLI classifiers
//!
//! Orchestrates supervised training of natural-language-inference models
//! over opaque compute collaborators: the neural network, the optimizer
//! update rule, and the dataset live behind the traits in
//! [`train::backend`], while this crate owns everything around them —
//! hyperparameter resolution, focal loss, learning-rate warmup, gradient
//! accumulation and clipping, early stopping, checkpointing, and the epoch
//! loop itself.
//!
//! # Architecture
//!
//! - [`config`]: raw launch configuration, validation, the immutable
//!   [`RunConfig`](config::RunConfig)
//! - [`optim`]: learning-rate schedule, gradient accumulation, clipping
//! - [`train`]: loss policies, early stopping, checkpoints, metrics, and
//!   the [`Controller`](train::Controller)
//!
//! # Example
//!
//! ```no_run
//! use nli_trainer::config::RawConfig;
//! use nli_trainer::train::Controller;
//! # use nli_trainer::train::{Batch, DataSource, Model, OptimizerBackend};
//! # use ndarray::{Array1, Array2};
//! # struct MyModel; struct MyOptimizer; struct MyData;
//! # impl Model for MyModel {
//! #     fn forward(&mut self, _: &Batch) -> nli_trainer::Result<Array2<f32>> { unimplemented!() }
//! #     fn backward(&mut self, _: f32) -> nli_trainer::Result<Array1<f32>> { unimplemented!() }
//! #     fn parameters(&self) -> Vec<f32> { unimplemented!() }
//! #     fn load_parameters(&mut self, _: &[f32]) -> nli_trainer::Result<()> { unimplemented!() }
//! # }
//! # impl OptimizerBackend for MyOptimizer {
//! #     fn apply(&mut self, _: &mut dyn Model, _: &Array1<f32>, _: f32, _: f32) -> nli_trainer::Result<()> { unimplemented!() }
//! #     fn state(&self) -> serde_json::Value { unimplemented!() }
//! #     fn load_state(&mut self, _: &serde_json::Value) -> nli_trainer::Result<()> { unimplemented!() }
//! # }
//! # impl DataSource for MyData {
//! #     fn train_batches(&mut self, _: u64) -> nli_trainer::Result<Vec<Batch>> { unimplemented!() }
//! #     fn validation_batches(&mut self) -> nli_trainer::Result<Vec<Batch>> { unimplemented!() }
//! # }
//! # fn collaborators() -> (MyModel, MyOptimizer, MyData) { unimplemented!() }
//!
//! fn main() -> nli_trainer::Result<()> {
//!     let config = RawConfig::from_file("run.yaml")?.resolve()?;
//!     let (model, optimizer, data) = collaborators();
//!
//!     let mut controller = Controller::new(config, model, optimizer, data)?;
//!     let outcome = controller.run()?;
//!     println!("best validation accuracy: {:?}", outcome.best_metric);
//!     Ok(())
//! }
//! ```

pub mod config;
mod error;
pub mod optim;
pub mod train;

pub use error::{Error, Result};
