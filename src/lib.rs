//! KITTI to YOLO dataset preparation
//!
//! This library partitions the KITTI frame index into reproducible train/val
//! splits and converts KITTI `label_2` annotations to YOLO format for object
//! detection training.

pub mod config;
pub mod conversion;
pub mod dataset;
pub mod error;
pub mod io;
pub mod split;
pub mod types;
pub mod utils;

// Re-export commonly used types and functions
pub use config::{ClassMap, ConvertArgs, ConvertConfig, ImageSize, SplitArgs, SplitConfig};
pub use conversion::{convert_to_yolo_records, format_yolo_records};
pub use dataset::{convert_frame, generate_splits, process_dataset, process_split};
pub use error::{PrepError, Result};
pub use split::{create_split, read_split_file, write_split_files};
pub use types::{
    ConversionStats, FrameId, FrameOutcome, KittiRecord, PixelBox, Split, SplitAssignment,
    YoloRecord,
};
