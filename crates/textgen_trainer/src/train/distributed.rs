//! Data-parallel seams: worker identity and the model wrapper the
//! distributed training variant reaches through.

use anyhow::Result;
use candle_core::{DType, Tensor};
use candle_nn::Optimizer;
use std::path::Path;

use crate::model::LanguageModel;

/// Identity of one worker in a data-parallel run. Side effects that must
/// happen exactly once per epoch (loss reporting, checkpoint writes) are
/// gated on the coordinator.
#[derive(Debug, Clone, Copy)]
pub struct WorkerRole {
    rank: usize,
    world_size: usize,
}

impl WorkerRole {
    pub fn new(rank: usize, world_size: usize) -> Self {
        assert!(
            world_size > 0 && rank < world_size,
            "rank {rank} out of range for world size {world_size}"
        );
        Self { rank, world_size }
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn world_size(&self) -> usize {
        self.world_size
    }

    pub fn is_coordinator(&self) -> bool {
        self.rank == 0
    }
}

/// Wrapper a model sits behind for data-parallel execution. Cross-replica
/// gradient aggregation happens inside the wrapped module's backward pass
/// (a collaborator concern); this layer only adds the indirection the
/// controller reaches through when checkpointing.
pub struct DataParallel<M> {
    module: M,
}

impl<M: LanguageModel> DataParallel<M> {
    pub fn new(module: M) -> Self {
        Self { module }
    }

    /// The wrapped model; checkpointing goes through here.
    pub fn inner(&self) -> &M {
        &self.module
    }
}

impl<M: LanguageModel> LanguageModel for DataParallel<M> {
    fn forward_t(&self, input_ids: &Tensor, fwd_dtype: DType) -> Result<Tensor> {
        self.module.forward_t(input_ids, fwd_dtype)
    }

    fn save_ckpt<O: Optimizer>(&self, epoch: usize, path: &Path, optimizer: &O) -> Result<()> {
        self.module.save_ckpt(epoch, path, optimizer)
    }
}
