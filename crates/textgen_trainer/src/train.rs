//! Train Module - training pipeline
//!
//! - TrainArgs: CLI arguments for training
//! - checkpoint: checkpoint persistence
//! - distributed: data-parallel seams (worker roles, model wrapper)
//! - training_loop: step engine and epoch controller

pub mod args;
pub mod checkpoint;
pub mod distributed;
pub mod training_loop;

pub use args::TrainArgs;
pub use training_loop::{run, RunState, Trainer};
