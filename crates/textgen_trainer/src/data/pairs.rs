//! Input/target pair construction for next-token prediction.

use anyhow::{anyhow, bail, Result};
use candle_core::{Device, Tensor};

use crate::vocab::TextTokenizer;

/// Build aligned input/target id tensors of shape `[batch, seq]`.
///
/// Each target row is its input row rotated left by one column. The slot that
/// wrapped around is reset to the pad id, and the first pad position of the
/// row is then replaced by the end-of-sequence id, so every row carries
/// exactly one generation stop.
pub fn generate_pairs(
    tokenizer: &TextTokenizer,
    batch: &[String],
    max_seq_len: usize,
    device: &Device,
) -> Result<(Tensor, Tensor)> {
    if batch.is_empty() {
        bail!("cannot build training pairs from an empty batch");
    }
    if max_seq_len == 0 {
        bail!("max_seq_len must be at least 1");
    }

    let rows = tokenizer.encode_batch(batch, max_seq_len)?;
    let batch_size = rows.len();
    let seq_len = rows[0].len();
    if seq_len == 0 {
        bail!("batch tokenized to zero-length rows");
    }

    let pad_id = tokenizer.pad_id();
    let eos_id = tokenizer.eos_id();

    let mut inputs = Vec::with_capacity(batch_size * seq_len);
    let mut targets = Vec::with_capacity(batch_size * seq_len);

    for row in &rows {
        // Rotate left by one column, then undo the wrap-around artifact.
        let mut target = Vec::with_capacity(seq_len);
        target.extend_from_slice(&row[1..]);
        target.push(pad_id);

        // The first padded position becomes the end-of-sequence marker.
        let stop = target
            .iter()
            .position(|&id| id == pad_id)
            .ok_or_else(|| anyhow!("no padding slot left for the end-of-sequence marker"))?;
        target[stop] = eos_id;

        inputs.extend_from_slice(row);
        targets.extend_from_slice(&target);
    }

    let input_ids = Tensor::from_vec(inputs, (batch_size, seq_len), device)?;
    let target_ids = Tensor::from_vec(targets, (batch_size, seq_len), device)?;
    Ok((input_ids, target_ids))
}
