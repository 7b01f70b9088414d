//! Deterministic train/validation partitioning of a frame index.

use log::info;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::SplitConfig;
use crate::error::{PrepError, Result};
use crate::types::{FrameId, SplitAssignment, MIN_FRAME_ID_WIDTH};

pub const TRAIN_SPLIT_FILE: &str = "train.txt";
pub const VAL_SPLIT_FILE: &str = "val.txt";
pub const SPLIT_META_FILE: &str = "split_meta.json";

/// Parameters and sizes recorded next to the split files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitMeta {
    pub total_frames: usize,
    pub train_ratio: f64,
    pub seed: u64,
    pub train_count: usize,
    pub val_count: usize,
}

/// Number of digits used for frame ids of a dataset with `total_frames` frames
pub fn frame_id_width(total_frames: usize) -> usize {
    let last = total_frames.saturating_sub(1);
    last.to_string().len().max(MIN_FRAME_ID_WIDTH)
}

/// Canonical frame ids `0..total_frames`, in index order
pub fn frame_ids(total_frames: usize) -> Vec<FrameId> {
    let width = frame_id_width(total_frames);
    (0..total_frames)
        .map(|index| FrameId::from_index(index, width))
        .collect()
}

/// Shuffle the frame index with a seeded ChaCha8 stream and cut it at
/// `floor(total_frames * train_ratio)`.
///
/// The same `(total_frames, train_ratio, seed)` always yields the same
/// partition. A ratio of 0 puts every frame in validation and an empty index
/// yields two empty sets; rejecting those belongs to [`SplitConfig::new`].
pub fn create_split(total_frames: usize, train_ratio: f64, seed: u64) -> SplitAssignment {
    let mut ids = frame_ids(total_frames);

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    ids.shuffle(&mut rng);

    let cut = train_cut(total_frames, train_ratio);
    let val = ids.split_off(cut);

    SplitAssignment { train: ids, val }
}

pub fn create_split_from_config(config: &SplitConfig) -> SplitAssignment {
    create_split(config.total_frames, config.train_ratio, config.seed)
}

// Truncation toward zero keeps any rounding remainder in validation
fn train_cut(total_frames: usize, train_ratio: f64) -> usize {
    let cut = (total_frames as f64 * train_ratio).floor();
    if cut.is_nan() || cut <= 0.0 {
        0
    } else {
        (cut as usize).min(total_frames)
    }
}

/// Write `train.txt` and `val.txt` (one id per line) plus the split metadata
pub fn write_split_files(
    output_dir: &Path,
    assignment: &SplitAssignment,
    config: &SplitConfig,
) -> Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(output_dir).map_err(|e| PrepError::io(output_dir, e))?;

    let train_path = output_dir.join(TRAIN_SPLIT_FILE);
    write_id_list(&train_path, &assignment.train)?;
    info!(
        "Successfully created {} with {} entries at {}",
        TRAIN_SPLIT_FILE,
        assignment.train.len(),
        train_path.display()
    );

    let val_path = output_dir.join(VAL_SPLIT_FILE);
    write_id_list(&val_path, &assignment.val)?;
    info!(
        "Successfully created {} with {} entries at {}",
        VAL_SPLIT_FILE,
        assignment.val.len(),
        val_path.display()
    );

    let meta = SplitMeta {
        total_frames: config.total_frames,
        train_ratio: config.train_ratio,
        seed: config.seed,
        train_count: assignment.train.len(),
        val_count: assignment.val.len(),
    };
    let meta_path = output_dir.join(SPLIT_META_FILE);
    let meta_json = serde_json::to_string_pretty(&meta)?;
    fs::write(&meta_path, meta_json).map_err(|e| PrepError::io(&meta_path, e))?;

    Ok((train_path, val_path))
}

fn write_id_list(path: &Path, ids: &[FrameId]) -> Result<()> {
    let content = ids
        .iter()
        .map(FrameId::as_str)
        .collect::<Vec<_>>()
        .join("\n");
    fs::write(path, content).map_err(|e| PrepError::io(path, e))
}

/// Read a split file back into frame ids, skipping blank lines
pub fn read_split_file(path: &Path) -> Result<Vec<FrameId>> {
    let content = fs::read_to_string(path).map_err(|e| PrepError::io(path, e))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| FrameId::from(line.to_string()))
        .collect())
}

/// Read the metadata written by [`write_split_files`]
pub fn read_split_meta(path: &Path) -> Result<SplitMeta> {
    let content = fs::read_to_string(path).map_err(|e| PrepError::io(path, e))?;
    Ok(serde_json::from_str(&content)?)
}
