use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PrepError, Result};

/// Create a progress bar with the given length and label
pub fn create_progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template(&format!(
            "{{spinner:.green}} [{}] [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}})",
            label
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}

/// Create an output directory, optionally wiping what a previous run left there
pub fn create_output_directory(path: &Path, clean: bool) -> Result<PathBuf> {
    if clean && path.exists() {
        log::warn!(
            "Directory {:?} already exists. Deleting and recreating it.",
            path
        );
        fs::remove_dir_all(path).map_err(|e| PrepError::io(path, e))?;
    }
    fs::create_dir_all(path).map_err(|e| PrepError::io(path, e))?;
    Ok(path.to_path_buf())
}

/// File stem for a frame id read from a split file.
///
/// Ids that sanitizing would alter or empty (path separators, `..`) are
/// rejected rather than mapped onto some other frame.
pub fn frame_file_stem(frame_id: &str) -> Result<String> {
    let stem = sanitize_filename::sanitize(frame_id);
    if stem.is_empty() || stem != frame_id {
        return Err(PrepError::InvalidFrameId(frame_id.to_string()));
    }
    Ok(stem)
}
