use log::{error, info, warn};
use rayon::prelude::*;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering::Relaxed};

use crate::config::{ConvertConfig, SplitConfig};
use crate::conversion::{convert_to_yolo_records, format_yolo_records};
use crate::error::Result;
use crate::io::{
    create_dataset_yaml, link_image, read_label_file, remove_stale_file, setup_output_directories,
    write_text_file, ImageLink, SplitDirs,
};
use crate::split::{
    create_split_from_config, read_split_file, read_split_meta, write_split_files, SPLIT_META_FILE,
};
use crate::types::{ConversionStats, FrameId, FrameOutcome, Split, SplitAssignment};
use crate::utils::{create_progress_bar, frame_file_stem};

/// Generate the split and persist `train.txt` / `val.txt` in `output_dir`
pub fn generate_splits(config: &SplitConfig, output_dir: &Path) -> Result<SplitAssignment> {
    let assignment = create_split_from_config(config);
    write_split_files(output_dir, &assignment, config)?;

    info!("------------------------------");
    info!("Total frames: {}", config.total_frames);
    info!(
        "Train/Val split: {}/{}",
        assignment.train.len(),
        assignment.val.len()
    );
    Ok(assignment)
}

/// Convert one frame's label file and write it only if something survived.
///
/// An unreadable source label file or an id that is not a plain file name is
/// returned as an error; a frame whose records were all filtered yields
/// `FrameOutcome::Empty` and leaves no label file behind.
pub fn convert_frame(
    frame_id: &FrameId,
    config: &ConvertConfig,
    labels_dir: &Path,
) -> Result<FrameOutcome> {
    let stem = frame_file_stem(frame_id.as_str())?;
    let file_name = format!("{}.txt", stem);
    let source = config.label_dir().join(&file_name);
    let content = read_label_file(&source)?;

    let label_output_path = labels_dir.join(&file_name);
    let records =
        convert_to_yolo_records(&content, &source, &config.class_map, config.image_size);
    if records.is_empty() {
        // A label file left by an earlier run would contradict "no detections"
        remove_stale_file(&label_output_path)?;
        return Ok(FrameOutcome::Empty);
    }

    write_text_file(&label_output_path, &format_yolo_records(&records))?;
    Ok(FrameOutcome::Converted(records.len()))
}

#[derive(Default)]
struct SplitCounters {
    converted: AtomicUsize,
    empty: AtomicUsize,
    failed: AtomicUsize,
    records: AtomicUsize,
    linked: AtomicUsize,
    missing_images: AtomicUsize,
}

impl SplitCounters {
    fn snapshot(&self, frames_total: usize) -> ConversionStats {
        ConversionStats {
            frames_total,
            frames_converted: self.converted.load(Relaxed),
            frames_empty: self.empty.load(Relaxed),
            frames_failed: self.failed.load(Relaxed),
            records_written: self.records.load(Relaxed),
            images_linked: self.linked.load(Relaxed),
            images_missing: self.missing_images.load(Relaxed),
        }
    }
}

/// Convert every frame of one split in parallel.
///
/// Frame failures are logged and counted; the remaining frames still run.
pub fn process_split(
    split: Split,
    frame_ids: &[FrameId],
    config: &ConvertConfig,
    dirs: &SplitDirs,
) -> ConversionStats {
    let counters = SplitCounters::default();
    let pb = create_progress_bar(frame_ids.len() as u64, split.label());
    let image_dir = config.image_dir();

    frame_ids.par_iter().for_each(|frame_id| {
        match convert_frame(frame_id, config, &dirs.labels_dir) {
            Ok(FrameOutcome::Converted(n)) => {
                counters.converted.fetch_add(1, Relaxed);
                counters.records.fetch_add(n, Relaxed);
            }
            Ok(FrameOutcome::Empty) => {
                counters.empty.fetch_add(1, Relaxed);
            }
            Err(e) => {
                error!("Failed to convert frame {}: {}", frame_id, e);
                counters.failed.fetch_add(1, Relaxed);
            }
        }

        // An unusable id was already counted as failed; never link it
        let stem = match frame_file_stem(frame_id.as_str()) {
            Ok(stem) if config.link_images => stem,
            _ => {
                pb.inc(1);
                return;
            }
        };
        let file_name = format!("{}.png", stem);
        match link_image(&image_dir.join(&file_name), &dirs.images_dir.join(&file_name)) {
            Ok(ImageLink::Created) | Ok(ImageLink::AlreadyPresent) => {
                counters.linked.fetch_add(1, Relaxed);
            }
            Ok(ImageLink::SourceMissing) => {
                warn!("Image not found for frame {}: {}", frame_id, file_name);
                counters.missing_images.fetch_add(1, Relaxed);
            }
            Err(e) => {
                error!("Failed to link image for frame {}: {}", frame_id, e);
                counters.missing_images.fetch_add(1, Relaxed);
            }
        }

        pb.inc(1);
    });
    pb.finish_with_message(format!("{} processing complete", split.label()));

    let stats = counters.snapshot(frame_ids.len());
    info!("Finished processing '{}' split.", split.name());
    info!("Converted labels are in: {}", dirs.labels_dir.display());
    if config.link_images {
        info!("Image symlinks are in: {}", dirs.images_dir.display());
    }
    stats.print_summary(split.label());
    stats
}

/// Main conversion pipeline: read split files, convert both splits, write data.yaml
pub fn process_dataset(config: &ConvertConfig) -> Result<ConversionStats> {
    let meta_path = config.splits_dir.join(SPLIT_META_FILE);
    if meta_path.exists() {
        match read_split_meta(&meta_path) {
            Ok(meta) => info!(
                "Splits were generated from {} frames (train ratio {}, seed {})",
                meta.total_frames, meta.train_ratio, meta.seed
            ),
            Err(e) => warn!("Ignoring unreadable split metadata: {}", e),
        }
    }

    // Read both split files before touching the output tree
    let mut splits = Vec::with_capacity(Split::ALL.len());
    for split in Split::ALL {
        let split_file = config.splits_dir.join(format!("{}.txt", split.name()));
        let frame_ids = read_split_file(&split_file)?;
        info!(
            "Read {} frame ids from {}",
            frame_ids.len(),
            split_file.display()
        );
        splits.push((split, frame_ids));
    }

    let output_dirs = setup_output_directories(config)?;

    let mut total = ConversionStats::default();
    for (split, frame_ids) in &splits {
        let stats = process_split(*split, frame_ids, config, output_dirs.for_split(*split));
        total.merge(&stats);
    }

    info!("Creating data.yaml file...");
    let yaml_path = create_dataset_yaml(&config.yolo_output, &config.class_map)?;
    info!("Dataset descriptor written to {}", yaml_path.display());

    total.print_summary("Conversion");
    Ok(total)
}
