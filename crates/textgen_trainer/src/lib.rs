//! Minimal supervised pretraining pipeline for autoregressive text generation.
//!
//! Raw text is split into fixed 250-word windows, window batches become
//! shifted input/target token-id pairs, and a multi-epoch loop drives
//! forward/backward/update with an optional bf16 forward pass, global
//! gradient-norm clipping and checkpoint-on-improvement.

pub mod cli;
pub mod config;
pub mod data;
pub mod model;
pub mod train;
pub mod vocab;
