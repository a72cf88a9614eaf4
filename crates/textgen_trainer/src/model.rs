//! Model collaborator seam.
//!
//! The training loop only needs a forward pass producing `[batch, seq, vocab]`
//! logits and a way to persist a checkpoint; everything else about the
//! architecture stays behind this trait.

use anyhow::Result;
use candle_core::{DType, Device, Tensor, Var};
use candle_nn::{embedding, linear, Embedding, Linear, Module, Optimizer, VarBuilder, VarMap};
use std::path::Path;

use crate::train::checkpoint;

pub trait LanguageModel {
    /// Forward pass over a `u32` id batch of shape `[batch, seq]`. Internal
    /// arithmetic runs at `fwd_dtype`; logits come back at f32 so the loss is
    /// always computed at full precision.
    fn forward_t(&self, input_ids: &Tensor, fwd_dtype: DType) -> Result<Tensor>;

    /// Persist model state for `epoch` at `path`, alongside whatever of the
    /// optimizer's state the implementation chooses to record.
    fn save_ckpt<O: Optimizer>(&self, epoch: usize, path: &Path, optimizer: &O) -> Result<()>;
}

/// Reference model: token embedding plus a projection back to the vocabulary.
/// Small enough to train on CPU while exercising every seam of the pipeline;
/// real architectures plug in through [`LanguageModel`].
pub struct BigramLm {
    embed: Embedding,
    lm_head: Linear,
    varmap: VarMap,
}

impl BigramLm {
    pub fn new(vocab_size: usize, dim: usize, device: &Device) -> Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let embed = embedding(vocab_size, dim, vb.pp("embed"))?;
        let lm_head = linear(dim, vocab_size, vb.pp("lm_head"))?;
        Ok(Self {
            embed,
            lm_head,
            varmap,
        })
    }

    /// Trainable variables, for the optimizer and gradient clipping.
    pub fn all_vars(&self) -> Vec<Var> {
        self.varmap.all_vars()
    }
}

impl LanguageModel for BigramLm {
    fn forward_t(&self, input_ids: &Tensor, fwd_dtype: DType) -> Result<Tensor> {
        let (batch_size, _seq_len) = input_ids.dims2()?;

        // Reduced-precision views of the f32 parameters; gradients flow back
        // through the casts, so the parameters themselves stay full precision.
        let hidden = self.embed.forward(input_ids)?.to_dtype(fwd_dtype)?;
        let weight = self
            .lm_head
            .weight()
            .to_dtype(fwd_dtype)?
            .broadcast_left(batch_size)?
            .t()?;
        let mut logits = hidden.matmul(&weight)?;
        if let Some(bias) = self.lm_head.bias() {
            logits = logits.broadcast_add(&bias.to_dtype(fwd_dtype)?)?;
        }
        Ok(logits.to_dtype(DType::F32)?)
    }

    fn save_ckpt<O: Optimizer>(&self, epoch: usize, path: &Path, optimizer: &O) -> Result<()> {
        checkpoint::save_checkpoint(&self.varmap, epoch, path, optimizer.learning_rate())
    }
}
