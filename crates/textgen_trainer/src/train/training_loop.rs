//! Training Loop - step engine and epoch controller

use anyhow::{bail, Result};
use candle_core::backprop::GradStore;
use candle_core::{DType, Device, Tensor, Var, D};
use candle_nn::{ops, AdamW, Optimizer, ParamsAdamW};
use std::path::{Path, PathBuf};
use tracing::info;

use super::args::TrainArgs;
use super::distributed::{DataParallel, WorkerRole};
use crate::config::TrainConfig;
use crate::data::dataset::{WindowDataset, WINDOW_WORDS};
use crate::data::loader::BatchLoader;
use crate::data::sampler::{EpochShardSampler, SequentialSampler};
use crate::model::{BigramLm, LanguageModel};
use crate::vocab::TextTokenizer;

/// Mutable state of one training run, owned by the caller and threaded
/// through every epoch.
pub struct RunState {
    pub epoch: usize,
    pub best_loss: f32,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            epoch: 0,
            best_loss: f32::INFINITY,
        }
    }

    /// Record an epoch's average loss. Returns true on strict improvement,
    /// i.e. exactly when a checkpoint must be written.
    pub fn observe(&mut self, loss: f32) -> bool {
        if loss < self.best_loss {
            self.best_loss = loss;
            true
        } else {
            false
        }
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

/// Token-level cross-entropy over flattened logits/targets. Positions whose
/// target equals `pad_id` contribute neither gradient nor weight to the
/// average.
pub fn padded_cross_entropy(logits: &Tensor, target_ids: &Tensor, pad_id: u32) -> Result<Tensor> {
    let (batch_size, seq_len, vocab_size) = logits.dims3()?;
    let logits = logits.reshape((batch_size * seq_len, vocab_size))?;
    let targets = target_ids.reshape(batch_size * seq_len)?;

    let log_sm = ops::log_softmax(&logits, D::Minus1)?;
    let nll = log_sm
        .gather(&targets.unsqueeze(1)?, D::Minus1)?
        .squeeze(D::Minus1)?
        .neg()?;

    let mask = targets.ne(pad_id)?.to_dtype(DType::F32)?;
    let token_count = mask.sum_all()?.to_scalar::<f32>()?;
    if token_count == 0.0 {
        bail!("batch contains only padding positions");
    }

    let loss = (nll * mask)?
        .sum_all()?
        .affine(1.0 / f64::from(token_count), 0.0)?;
    Ok(loss)
}

/// Rescale gradients so their global L2 norm does not exceed `max_norm`.
/// Returns the norm measured before clipping.
pub fn clip_grad_norm(grads: &mut GradStore, vars: &[Var], max_norm: f64) -> Result<f64> {
    let mut total_sq = 0f64;
    for var in vars {
        if let Some(grad) = grads.get(var.as_tensor()) {
            total_sq += f64::from(grad.sqr()?.sum_all()?.to_scalar::<f32>()?);
        }
    }
    let total_norm = total_sq.sqrt();

    if total_norm > max_norm {
        let scale = max_norm / (total_norm + 1e-6);
        for var in vars {
            if let Some(grad) = grads.remove(var.as_tensor()) {
                grads.insert(var.as_tensor(), grad.affine(scale, 0.0)?);
            }
        }
    }

    Ok(total_norm)
}

/// One epoch over `loader`: forward (optionally at bf16), pad-masked
/// cross-entropy, backward, global-norm clipping, optimizer step. Returns the
/// mean loss over the epoch's batches.
pub fn run_epoch<M: LanguageModel, O: Optimizer>(
    loader: &BatchLoader,
    model: &M,
    optimizer: &mut O,
    vars: &[Var],
    device: &Device,
    config: &TrainConfig,
    pad_id: u32,
) -> Result<f32> {
    let fwd_dtype = if config.use_mix_precision {
        DType::BF16
    } else {
        DType::F32
    };

    let mut running_loss = 0f32;
    let mut num_batches = 0usize;

    for batch in loader.batches() {
        let (input_ids, target_ids) = batch?;
        let input_ids = input_ids.to_device(device)?;
        let target_ids = target_ids.to_device(device)?;

        // Each backward pass builds a fresh gradient store, so there are no
        // stale gradients to clear between steps.
        let logits = model.forward_t(&input_ids, fwd_dtype)?;
        let loss = padded_cross_entropy(&logits, &target_ids, pad_id)?;

        let mut grads = loss.backward()?;
        clip_grad_norm(&mut grads, vars, config.gradient_clip)?;
        optimizer.step(&grads)?;

        running_loss += loss.to_scalar::<f32>()?;
        num_batches += 1;
    }

    if num_batches == 0 {
        bail!("epoch ran over zero batches");
    }
    Ok(running_loss / num_batches as f32)
}

/// Drives epochs over the step engine, tracking the best loss seen and
/// writing a checkpoint whenever an epoch strictly improves on it.
pub struct Trainer<M, O> {
    model: M,
    optimizer: O,
    vars: Vec<Var>,
    config: TrainConfig,
    device: Device,
    pad_id: u32,
    save_path: PathBuf,
}

impl<M: LanguageModel, O: Optimizer> Trainer<M, O> {
    pub fn new(
        model: M,
        optimizer: O,
        vars: Vec<Var>,
        config: TrainConfig,
        pad_id: u32,
    ) -> Result<Self> {
        config.validate()?;
        let device = config.resolve_device()?;
        let save_path = Path::new(&config.model_save_dir).join(&config.ckpt);
        Ok(Self {
            model,
            optimizer,
            vars,
            config,
            device,
            pad_id,
            save_path,
        })
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn save_path(&self) -> &Path {
        &self.save_path
    }

    /// Single-process training over `config.epoch` epochs.
    pub fn train(&mut self, loader: &mut BatchLoader, state: &mut RunState) -> Result<()> {
        self.ensure_nonempty(loader)?;
        for epoch in 1..=self.config.epoch {
            let train_loss = run_epoch(
                loader,
                &self.model,
                &mut self.optimizer,
                &self.vars,
                &self.device,
                &self.config,
                self.pad_id,
            )?;
            state.epoch = epoch;
            info!("Train Loss after {} epoch: {}", epoch, train_loss);
            if state.observe(train_loss) {
                self.model
                    .save_ckpt(epoch, &self.save_path, &self.optimizer)?;
            }
        }
        Ok(())
    }

    fn ensure_nonempty(&self, loader: &BatchLoader) -> Result<()> {
        if loader.num_batches() == 0 {
            bail!("empty dataset: the corpus produced no training windows");
        }
        Ok(())
    }
}

impl<M: LanguageModel, O: Optimizer> Trainer<DataParallel<M>, O> {
    /// Data-parallel variant: one sequential loop per worker, epoch-seeded
    /// shard sampling, and coordinator-only reporting and checkpointing.
    pub fn train_ddp(
        &mut self,
        loader: &mut BatchLoader,
        role: WorkerRole,
        state: &mut RunState,
    ) -> Result<()> {
        self.ensure_nonempty(loader)?;
        for epoch in 1..=self.config.epoch {
            loader.set_epoch(epoch);
            let train_loss = run_epoch(
                loader,
                &self.model,
                &mut self.optimizer,
                &self.vars,
                &self.device,
                &self.config,
                self.pad_id,
            )?;
            state.epoch = epoch;
            if role.is_coordinator() {
                info!("Train Loss after {} epoch: {}", epoch, train_loss);
                if state.observe(train_loss) {
                    self.model
                        .inner()
                        .save_ckpt(epoch, &self.save_path, &self.optimizer)?;
                }
            }
        }
        Ok(())
    }
}

/// Main training entry point for the CLI.
pub fn run(args: TrainArgs) -> Result<()> {
    let config = args.to_config();
    config.validate()?;
    if args.world_size == 0 || args.rank >= args.world_size {
        bail!(
            "rank {} out of range for world size {}",
            args.rank,
            args.world_size
        );
    }
    let device = config.resolve_device()?;
    info!("Device: {:?}", device);

    let tokenizer = TextTokenizer::from_file(&args.tokenizer)?;
    info!(
        "Tokenizer loaded: vocab={}, pad_id={}, eos_id={}",
        tokenizer.vocab_size(),
        tokenizer.pad_id(),
        tokenizer.eos_id()
    );

    let dataset = WindowDataset::from_text_file(&args.corpus)?;
    info!(
        "Corpus {:?}: {} windows ({} trailing words dropped)",
        args.corpus,
        dataset.len(),
        dataset.discarded_words()
    );
    if dataset.is_empty() {
        bail!(
            "empty dataset: {:?} holds fewer than {} words",
            args.corpus,
            WINDOW_WORDS
        );
    }

    let model = BigramLm::new(tokenizer.vocab_size(), args.dim, &device)?;
    let vars = model.all_vars();
    let optimizer = AdamW::new(
        vars.clone(),
        ParamsAdamW {
            lr: config.lr,
            ..Default::default()
        },
    )?;

    let mut state = RunState::new();
    if args.world_size > 1 {
        let sampler = EpochShardSampler::new(dataset.len(), args.world_size, args.rank);
        let mut loader = BatchLoader::new(
            &dataset,
            &tokenizer,
            Box::new(sampler),
            config.batch_size,
            config.max_seq_len,
            device.clone(),
        );
        let role = WorkerRole::new(args.rank, args.world_size);
        let mut trainer = Trainer::new(
            DataParallel::new(model),
            optimizer,
            vars,
            config,
            tokenizer.pad_id(),
        )?;
        trainer.train_ddp(&mut loader, role, &mut state)?;
    } else {
        let sampler = SequentialSampler::new(dataset.len());
        let mut loader = BatchLoader::new(
            &dataset,
            &tokenizer,
            Box::new(sampler),
            config.batch_size,
            config.max_seq_len,
            device.clone(),
        );
        let mut trainer = Trainer::new(model, optimizer, vars, config, tokenizer.pad_id())?;
        trainer.train(&mut loader, &mut state)?;
    }

    info!(
        "Training complete: best loss {:.4} after {} epochs",
        state.best_loss, state.epoch
    );
    Ok(())
}
