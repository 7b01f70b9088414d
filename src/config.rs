use clap::Parser;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{PrepError, Result};
use crate::io::count_label_files;

/// KITTI `image_2` resolution used for normalization
pub const KITTI_IMAGE_WIDTH: u32 = 1242;
pub const KITTI_IMAGE_HEIGHT: u32 = 375;

/// Number of frames in the KITTI object detection training set
pub const KITTI_NUM_FRAMES: usize = 7481;

pub const DEFAULT_CLASSES: &[&str] = &["Car", "Pedestrian", "Cyclist"];

/// Command-line arguments for generating train/val split files.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct SplitArgs {
    /// Total number of frames in the dataset (0 infers it from --label_dir)
    #[arg(long = "num_frames", default_value_t = KITTI_NUM_FRAMES)]
    pub num_frames: usize,

    /// KITTI label_2 directory used to count frames when --num_frames is 0
    #[arg(long = "label_dir")]
    pub label_dir: Option<String>,

    /// Proportion of the frames to use for training
    #[arg(long = "train_ratio", default_value_t = 0.8, value_parser = validate_ratio)]
    pub train_ratio: f64,

    /// Seed for random shuffling
    #[arg(long = "seed", default_value_t = 42)]
    pub seed: u64,

    /// Directory to save train.txt and val.txt
    #[arg(long = "output_dir", visible_alias = "output-dir", default_value = "data/processed/splits")]
    pub output_dir: String,
}

impl SplitArgs {
    /// Resolve the frame count and validate the split parameters
    pub fn to_config(&self) -> Result<SplitConfig> {
        let total_frames = match (self.num_frames, &self.label_dir) {
            (0, Some(label_dir)) => count_label_files(Path::new(label_dir))?,
            (n, _) => n,
        };
        SplitConfig::new(total_frames, self.train_ratio, self.seed)
    }
}

/// Command-line arguments for converting KITTI labels to YOLO format.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct ConvertArgs {
    /// Root of the raw KITTI dataset (contains image_2 and label_2)
    #[arg(long = "kitti_root", default_value = "data/raw_kitti")]
    pub kitti_root: String,

    /// Output directory for the YOLO-formatted dataset
    #[arg(long = "yolo_output", default_value = "data/processed/yolo_format")]
    pub yolo_output: String,

    /// Directory containing train.txt and val.txt
    #[arg(long = "splits_dir", default_value = "data/processed/splits")]
    pub splits_dir: String,

    /// Image width used to normalize x coordinates
    #[arg(long = "image_width", default_value_t = KITTI_IMAGE_WIDTH, value_parser = validate_dimension)]
    pub image_width: u32,

    /// Image height used to normalize y coordinates
    #[arg(long = "image_height", default_value_t = KITTI_IMAGE_HEIGHT, value_parser = validate_dimension)]
    pub image_height: u32,

    /// Delete existing split output directories before writing
    #[arg(long = "clean")]
    pub clean: bool,

    /// Do not symlink source images into the output tree
    #[arg(long = "no_symlinks")]
    pub no_symlinks: bool,

    /// Ordered list of class names; the position is the class id
    #[arg(value_delimiter = ',', default_values = ["Car", "Pedestrian", "Cyclist"])]
    pub class_list: Vec<String>,
}

impl ConvertArgs {
    pub fn to_config(&self) -> Result<ConvertConfig> {
        Ok(ConvertConfig {
            kitti_root: PathBuf::from(&self.kitti_root),
            yolo_output: PathBuf::from(&self.yolo_output),
            splits_dir: PathBuf::from(&self.splits_dir),
            class_map: ClassMap::new(&self.class_list)?,
            image_size: ImageSize::new(self.image_width, self.image_height)?,
            clean: self.clean,
            link_images: !self.no_symlinks,
        })
    }
}

// Validate that the ratio lies strictly between 0.0 and 1.0
fn validate_ratio(s: &str) -> std::result::Result<f64, String> {
    match f64::from_str(s) {
        Ok(val) if val > 0.0 && val < 1.0 => Ok(val),
        _ => Err("RATIO must be strictly between 0.0 and 1.0".to_string()),
    }
}

fn validate_dimension(s: &str) -> std::result::Result<u32, String> {
    match u32::from_str(s) {
        Ok(val) if val > 0 => Ok(val),
        _ => Err("image dimensions must be positive integers".to_string()),
    }
}

/// Validated parameters for one split generation run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitConfig {
    pub total_frames: usize,
    pub train_ratio: f64,
    pub seed: u64,
}

impl SplitConfig {
    pub fn new(total_frames: usize, train_ratio: f64, seed: u64) -> Result<Self> {
        if total_frames == 0 {
            return Err(PrepError::Config(
                "total frame count must be positive".to_string(),
            ));
        }
        if !(train_ratio > 0.0 && train_ratio < 1.0) {
            return Err(PrepError::Config(format!(
                "train ratio must be strictly between 0 and 1, got {}",
                train_ratio
            )));
        }
        Ok(SplitConfig {
            total_frames,
            train_ratio,
            seed,
        })
    }
}

/// Resolution every box is normalized against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(PrepError::Config(format!(
                "image size must be positive, got {}x{}",
                width, height
            )));
        }
        Ok(ImageSize { width, height })
    }
}

impl Default for ImageSize {
    fn default() -> Self {
        ImageSize {
            width: KITTI_IMAGE_WIDTH,
            height: KITTI_IMAGE_HEIGHT,
        }
    }
}

/// Fixed mapping from class label to class id.
///
/// Ids follow the order the labels were given in. Labels outside the map are
/// not errors; the converter drops them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMap {
    names: Vec<String>,
    ids: HashMap<String, usize>,
}

impl ClassMap {
    pub fn new<S: AsRef<str>>(labels: &[S]) -> Result<Self> {
        if labels.is_empty() {
            return Err(PrepError::Config("class list must not be empty".to_string()));
        }

        let mut names = Vec::with_capacity(labels.len());
        let mut ids = HashMap::with_capacity(labels.len());
        for (id, label) in labels.iter().enumerate() {
            let label = label.as_ref().trim();
            if label.is_empty() {
                return Err(PrepError::Config(format!("class name at index {} is empty", id)));
            }
            if ids.insert(label.to_string(), id).is_some() {
                return Err(PrepError::Config(format!("duplicate class name: {}", label)));
            }
            names.push(label.to_string());
        }

        Ok(ClassMap { names, ids })
    }

    pub fn get(&self, label: &str) -> Option<usize> {
        self.ids.get(label).copied()
    }

    /// Class names indexed by id
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for ClassMap {
    fn default() -> Self {
        let names: Vec<String> = DEFAULT_CLASSES.iter().map(|s| s.to_string()).collect();
        let ids = names
            .iter()
            .enumerate()
            .map(|(id, name)| (name.clone(), id))
            .collect();
        ClassMap { names, ids }
    }
}

/// Validated parameters for one conversion run
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    pub kitti_root: PathBuf,
    pub yolo_output: PathBuf,
    pub splits_dir: PathBuf,
    pub class_map: ClassMap,
    pub image_size: ImageSize,
    pub clean: bool,
    pub link_images: bool,
}

impl ConvertConfig {
    pub fn label_dir(&self) -> PathBuf {
        self.kitti_root.join("label_2")
    }

    pub fn image_dir(&self) -> PathBuf {
        self.kitti_root.join("image_2")
    }
}
