//! Data-loading collaborator: batches window strings and hands each batch to
//! the pair generator.

use anyhow::Result;
use candle_core::{Device, Tensor};

use crate::data::dataset::WindowDataset;
use crate::data::pairs::generate_pairs;
use crate::data::sampler::Sampler;
use crate::vocab::TextTokenizer;

pub struct BatchLoader<'a> {
    dataset: &'a WindowDataset,
    tokenizer: &'a TextTokenizer,
    sampler: Box<dyn Sampler>,
    batch_size: usize,
    max_seq_len: usize,
    device: Device,
}

impl<'a> BatchLoader<'a> {
    pub fn new(
        dataset: &'a WindowDataset,
        tokenizer: &'a TextTokenizer,
        sampler: Box<dyn Sampler>,
        batch_size: usize,
        max_seq_len: usize,
        device: Device,
    ) -> Self {
        Self {
            dataset,
            tokenizer,
            sampler,
            batch_size,
            max_seq_len,
            device,
        }
    }

    /// Batches this worker sees in the current epoch (partial last batch
    /// included).
    pub fn num_batches(&self) -> usize {
        let samples = self.sampler.indices().len();
        (samples + self.batch_size - 1) / self.batch_size
    }

    /// Advance the sampler to a new epoch (re-shards deterministically).
    pub fn set_epoch(&mut self, epoch: usize) {
        self.sampler.set_epoch(epoch);
    }

    /// Iterate the epoch's batches as device-resident tensor pairs.
    pub fn batches(&self) -> impl Iterator<Item = Result<(Tensor, Tensor)>> + '_ {
        let indices = self.sampler.indices();
        let mut start = 0;
        std::iter::from_fn(move || {
            if start >= indices.len() {
                return None;
            }
            let end = (start + self.batch_size).min(indices.len());
            let batch: Vec<String> = indices[start..end]
                .iter()
                .map(|&i| self.dataset.windows()[i].clone())
                .collect();
            start = end;
            Some(generate_pairs(
                self.tokenizer,
                &batch,
                self.max_seq_len,
                &self.device,
            ))
        })
    }
}
