mod common;

use anyhow::Result;
use candle_core::{DType, Device, Tensor};
use candle_nn::{AdamW, Optimizer, ParamsAdamW};
use std::collections::HashSet;
use std::io::Write;

use common::toy_tokenizer;
use textgen_trainer::config::TrainConfig;
use textgen_trainer::data::dataset::WindowDataset;
use textgen_trainer::data::loader::BatchLoader;
use textgen_trainer::data::sampler::{EpochShardSampler, Sampler};
use textgen_trainer::model::{BigramLm, LanguageModel};
use textgen_trainer::train::distributed::{DataParallel, WorkerRole};
use textgen_trainer::train::training_loop::{RunState, Trainer};

#[test]
fn shards_are_disjoint_and_cover_the_dataset() {
    let mut s0 = EpochShardSampler::new(10, 2, 0);
    let mut s1 = EpochShardSampler::new(10, 2, 1);
    s0.set_epoch(3);
    s1.set_epoch(3);

    let a: HashSet<usize> = s0.indices().into_iter().collect();
    let b: HashSet<usize> = s1.indices().into_iter().collect();
    assert_eq!(a.len(), 5);
    assert_eq!(b.len(), 5);
    assert!(a.is_disjoint(&b));

    let union: HashSet<usize> = a.union(&b).copied().collect();
    assert_eq!(union, (0..10).collect());
}

#[test]
fn shard_order_is_deterministic_per_epoch() {
    let mut sampler = EpochShardSampler::new(32, 4, 1);
    sampler.set_epoch(5);
    let first = sampler.indices();
    sampler.set_epoch(5);
    assert_eq!(first, sampler.indices());
    sampler.set_epoch(6);
    assert_ne!(first, sampler.indices());
}

#[test]
fn rank_zero_is_the_coordinator() {
    assert!(WorkerRole::new(0, 4).is_coordinator());
    assert!(!WorkerRole::new(3, 4).is_coordinator());
}

#[test]
fn data_parallel_wrapper_delegates_to_the_inner_model() -> Result<()> {
    let model = BigramLm::new(8, 4, &Device::Cpu)?;
    let wrapped = DataParallel::new(model);
    let input = Tensor::new(&[[3u32, 4]], &Device::Cpu)?;
    let logits = wrapped.forward_t(&input, DType::F32)?;
    assert_eq!(logits.dims(), &[1, 2, 8]);

    let inner_logits = wrapped.inner().forward_t(&input, DType::F32)?;
    assert_eq!(inner_logits.dims(), &[1, 2, 8]);
    Ok(())
}

fn run_ddp_worker(rank: usize) -> Result<(RunState, bool)> {
    let dir = tempfile::tempdir()?;
    let words = ["alpha", "beta", "gamma", "delta", "epsilon"];
    let tok = toy_tokenizer(dir.path(), &words);

    // 500 words -> two windows, one per worker with world size 2.
    let corpus_path = dir.path().join("corpus.txt");
    let mut file = std::fs::File::create(&corpus_path)?;
    for _ in 0..100 {
        writeln!(file, "alpha beta gamma delta epsilon")?;
    }
    drop(file);
    let dataset = WindowDataset::from_text_file(&corpus_path)?;
    assert_eq!(dataset.len(), 2);

    let config = TrainConfig {
        epoch: 1,
        device: "cpu".to_string(),
        use_mix_precision: false,
        model_save_dir: dir.path().join("ckpts").to_string_lossy().to_string(),
        batch_size: 1,
        max_seq_len: 8,
        lr: 0.1,
        ..TrainConfig::default()
    };

    let model = BigramLm::new(8, 8, &Device::Cpu)?;
    let vars = model.all_vars();
    let optimizer = AdamW::new(
        vars.clone(),
        ParamsAdamW {
            lr: config.lr,
            ..Default::default()
        },
    )?;

    let sampler = EpochShardSampler::new(dataset.len(), 2, rank);
    let mut loader = BatchLoader::new(
        &dataset,
        &tok,
        Box::new(sampler),
        config.batch_size,
        config.max_seq_len,
        Device::Cpu,
    );

    let role = WorkerRole::new(rank, 2);
    let mut state = RunState::new();
    let mut trainer = Trainer::new(
        DataParallel::new(model),
        optimizer,
        vars,
        config,
        tok.pad_id(),
    )?;
    trainer.train_ddp(&mut loader, role, &mut state)?;

    let saved = trainer.save_path().exists();
    Ok((state, saved))
}

#[test]
fn only_the_coordinator_reports_and_checkpoints() -> Result<()> {
    let (state, saved) = run_ddp_worker(0)?;
    assert!(saved);
    assert!(state.best_loss.is_finite());

    let (state, saved) = run_ddp_worker(1)?;
    assert!(!saved);
    assert!(state.best_loss.is_infinite());
    assert_eq!(state.epoch, 1);
    Ok(())
}
