//! Tokenizer collaborator.
//!
//! The pipeline only needs three things from a tokenizer: encode a batch of
//! strings into id rows (truncated, then padded to the longest row in the
//! batch), and expose stable padding and end-of-sequence ids.

use anyhow::{anyhow, Result};
use std::path::Path;
use tokenizers::Tokenizer;

pub struct TextTokenizer {
    tokenizer: Tokenizer,
    pad_id: u32,
    eos_id: u32,
}

impl TextTokenizer {
    /// Load a tokenizer.json and resolve its padding / end-of-sequence ids
    /// from the conventional token names.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let tokenizer = Tokenizer::from_file(path)
            .map_err(|e| anyhow!("failed to load tokenizer from {:?}: {}", path, e))?;

        let pad_id = tokenizer
            .token_to_id("<pad>")
            .or_else(|| tokenizer.token_to_id("[PAD]"))
            .or_else(|| tokenizer.token_to_id("<|padding|>"))
            .ok_or_else(|| anyhow!("tokenizer {:?} has no padding token", path))?;

        let eos_id = tokenizer
            .token_to_id("<|endoftext|>")
            .or_else(|| tokenizer.token_to_id("</s>"))
            .or_else(|| tokenizer.token_to_id("<eos>"))
            .ok_or_else(|| anyhow!("tokenizer {:?} has no end-of-sequence token", path))?;

        Ok(Self {
            tokenizer,
            pad_id,
            eos_id,
        })
    }

    /// Wrap an already-configured tokenizer with explicit special ids.
    pub fn new(tokenizer: Tokenizer, pad_id: u32, eos_id: u32) -> Self {
        Self {
            tokenizer,
            pad_id,
            eos_id,
        }
    }

    pub fn pad_id(&self) -> u32 {
        self.pad_id
    }

    pub fn eos_id(&self) -> u32 {
        self.eos_id
    }

    pub fn vocab_size(&self) -> usize {
        self.tokenizer.get_vocab_size(true)
    }

    /// Encode a batch of strings into id rows of equal length: each row is
    /// truncated at `max_seq_len`, then right-padded with the pad id to the
    /// longest row of this batch.
    pub fn encode_batch(&self, batch: &[String], max_seq_len: usize) -> Result<Vec<Vec<u32>>> {
        let encodings = self
            .tokenizer
            .encode_batch(batch.to_vec(), false)
            .map_err(|e| anyhow!("tokenization failed: {}", e))?;

        let mut rows: Vec<Vec<u32>> = encodings
            .iter()
            .map(|encoding| {
                let ids = encoding.get_ids();
                ids[..ids.len().min(max_seq_len)].to_vec()
            })
            .collect();

        let longest = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(longest, self.pad_id);
        }

        Ok(rows)
    }
}
