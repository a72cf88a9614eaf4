//! Training Arguments - CLI configuration for training

use clap::Args;
use std::path::PathBuf;

use crate::config::TrainConfig;

#[derive(Args, Debug, Clone)]
pub struct TrainArgs {
    /// Plain-text training corpus
    #[arg(long, required = true)]
    pub corpus: PathBuf,

    /// tokenizer.json exposing padding and end-of-sequence tokens
    #[arg(long, required = true)]
    pub tokenizer: PathBuf,

    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    #[arg(long, default_value_t = 8)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 256)]
    pub max_seq_len: usize,

    #[arg(long, default_value_t = 3e-4)]
    pub lr: f64,

    /// Embedding width of the reference model
    #[arg(long, default_value_t = 128)]
    pub dim: usize,

    /// Compute target: auto, cpu or cuda:N
    #[arg(long, default_value = "auto")]
    pub device: String,

    /// Disable the bf16 forward pass (on by default)
    #[arg(long, action)]
    pub no_mix_precision: bool,

    #[arg(long, default_value_t = 1.0)]
    pub gradient_clip: f64,

    #[arg(long, default_value = "checkpoints")]
    pub model_save_dir: String,

    #[arg(long, default_value = "model.safetensors")]
    pub ckpt: String,

    /// Number of data-parallel workers in this run
    #[arg(long, default_value_t = 1)]
    pub world_size: usize,

    /// This worker's rank (rank 0 reports and checkpoints)
    #[arg(long, default_value_t = 0)]
    pub rank: usize,
}

impl TrainArgs {
    pub fn to_config(&self) -> TrainConfig {
        TrainConfig {
            epoch: self.epochs,
            device: self.device.clone(),
            use_mix_precision: !self.no_mix_precision,
            gradient_clip: self.gradient_clip,
            model_save_dir: self.model_save_dir.clone(),
            ckpt: self.ckpt.clone(),
            batch_size: self.batch_size,
            max_seq_len: self.max_seq_len,
            lr: self.lr,
        }
    }
}
