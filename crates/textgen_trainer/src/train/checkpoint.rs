//! Checkpoint Management - training state persistence

use anyhow::{Context, Result};
use candle_nn::VarMap;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Sidecar written next to each checkpoint file.
#[derive(Serialize, Deserialize)]
pub struct TrainingState {
    pub epoch: usize,
    pub learning_rate: f64,
    pub date: String,
    pub checkpoint: String,
}

/// Write the weights under an exclusive file lock so a concurrent reader
/// never observes a half-written checkpoint.
pub fn save_securely(varmap: &VarMap, path: &Path) -> Result<()> {
    let lock_path = path.with_extension("lock");
    let lock_file = File::create(&lock_path)
        .with_context(|| format!("failed to create checkpoint lock {:?}", lock_path))?;
    lock_file.lock_exclusive()?;
    let saved = varmap.save(path);
    lock_file.unlock()?;
    saved.with_context(|| format!("failed to write checkpoint {:?}", path))
}

/// Persist the varmap at `path` and record the training state alongside it.
pub fn save_checkpoint(
    varmap: &VarMap,
    epoch: usize,
    path: &Path,
    learning_rate: f64,
) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create checkpoint directory {:?}", dir))?;
    }

    save_securely(varmap, path)?;

    let state = TrainingState {
        epoch,
        learning_rate,
        date: chrono::Local::now().to_rfc3339(),
        checkpoint: path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default(),
    };
    let state_path = path.with_extension("json");
    let file = File::create(&state_path)
        .with_context(|| format!("failed to write training state {:?}", state_path))?;
    serde_json::to_writer_pretty(file, &state)?;

    tracing::debug!("checkpoint saved: epoch {} -> {:?}", epoch, path);
    Ok(())
}

/// Read back the training-state sidecar of a checkpoint.
pub fn load_state(path: &Path) -> Result<TrainingState> {
    let state_path = path.with_extension("json");
    let file = File::open(&state_path)
        .with_context(|| format!("failed to read training state {:?}", state_path))?;
    let state = serde_json::from_reader(BufReader::new(file))?;
    Ok(state)
}
