//! Training Configuration
//!
//! Typed, validated configuration for a training run and device resolution.

use anyhow::{bail, Context, Result};
use candle_core::Device;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TrainConfig {
    /// Total number of training epochs.
    pub epoch: usize,
    /// Compute target: "auto", "cpu" or "cuda:N".
    pub device: String,
    /// Run forward passes in bf16 while parameters stay f32.
    pub use_mix_precision: bool,
    /// Maximum global L2 norm of gradients before the optimizer step.
    pub gradient_clip: f64,
    /// Directory checkpoints are written to.
    pub model_save_dir: String,
    /// Checkpoint file name inside `model_save_dir`.
    pub ckpt: String,
    /// Windows per training batch.
    pub batch_size: usize,
    /// Upper bound on tokens per sequence; longer rows are truncated here.
    pub max_seq_len: usize,
    /// AdamW learning rate.
    pub lr: f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epoch: 10,
            device: "auto".to_string(),
            use_mix_precision: true,
            gradient_clip: 1.0,
            model_save_dir: "checkpoints".to_string(),
            ckpt: "model.safetensors".to_string(),
            batch_size: 8,
            max_seq_len: 256,
            lr: 3e-4,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<()> {
        if self.epoch == 0 {
            bail!("epoch must be at least 1");
        }
        if self.batch_size == 0 {
            bail!("batch_size must be at least 1");
        }
        if self.max_seq_len == 0 {
            bail!("max_seq_len must be at least 1");
        }
        if self.gradient_clip <= 0.0 {
            bail!("gradient_clip must be positive");
        }
        if self.lr <= 0.0 {
            bail!("lr must be positive");
        }
        if self.ckpt.is_empty() {
            bail!("ckpt file name must not be empty");
        }
        Ok(())
    }

    /// Resolve the configured device string to a candle device.
    pub fn resolve_device(&self) -> Result<Device> {
        match self.device.as_str() {
            "auto" => Ok(Device::cuda_if_available(0)?),
            "cpu" => Ok(Device::Cpu),
            "cuda" => Ok(Device::new_cuda(0)?),
            other => {
                if let Some(ordinal) = other.strip_prefix("cuda:") {
                    let ordinal: usize = ordinal
                        .parse()
                        .with_context(|| format!("invalid cuda ordinal in device '{other}'"))?;
                    Ok(Device::new_cuda(ordinal)?)
                } else {
                    bail!("unrecognized device '{other}': expected auto, cpu or cuda:N");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(TrainConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_epoch_is_rejected() {
        let cfg = TrainConfig {
            epoch: 0,
            ..TrainConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn nonpositive_clip_is_rejected() {
        let cfg = TrainConfig {
            gradient_clip: 0.0,
            ..TrainConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn unknown_device_string_is_rejected() {
        let cfg = TrainConfig {
            device: "tpu".to_string(),
            ..TrainConfig::default()
        };
        assert!(cfg.resolve_device().is_err());
    }
}
