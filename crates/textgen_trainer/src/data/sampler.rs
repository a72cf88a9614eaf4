//! Epoch samplers: which windows a worker visits, and in what order.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

pub trait Sampler {
    /// Re-seed the sampler for a new epoch. Deterministic per epoch.
    fn set_epoch(&mut self, epoch: usize);

    /// Indices this worker visits, in visit order.
    fn indices(&self) -> Vec<usize>;
}

/// In-order traversal of the whole dataset (single-process training).
pub struct SequentialSampler {
    num_samples: usize,
}

impl SequentialSampler {
    pub fn new(num_samples: usize) -> Self {
        Self { num_samples }
    }
}

impl Sampler for SequentialSampler {
    fn set_epoch(&mut self, _epoch: usize) {}

    fn indices(&self) -> Vec<usize> {
        (0..self.num_samples).collect()
    }
}

/// Deterministic per-epoch shuffle, sharded across data-parallel workers.
///
/// Every replica shuffles with the same epoch-derived seed and takes a
/// strided slice, so shards are disjoint and together cover the dataset.
/// Shard sizes may differ by one when the dataset does not divide evenly.
pub struct EpochShardSampler {
    num_samples: usize,
    world_size: usize,
    rank: usize,
    epoch: usize,
}

impl EpochShardSampler {
    pub fn new(num_samples: usize, world_size: usize, rank: usize) -> Self {
        assert!(
            world_size > 0 && rank < world_size,
            "rank {rank} out of range for world size {world_size}"
        );
        Self {
            num_samples,
            world_size,
            rank,
            epoch: 0,
        }
    }
}

impl Sampler for EpochShardSampler {
    fn set_epoch(&mut self, epoch: usize) {
        self.epoch = epoch;
    }

    fn indices(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.num_samples).collect();
        let mut rng = StdRng::seed_from_u64(self.epoch as u64);
        order.shuffle(&mut rng);
        order
            .into_iter()
            .skip(self.rank)
            .step_by(self.world_size)
            .collect()
    }
}
