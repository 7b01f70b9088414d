use std::fmt;

use crate::config::ImageSize;

// Positional layout of a KITTI `label_2` line:
// type truncated occluded alpha left top right bottom h w l x y z rotation_y [score]
pub const KITTI_LABEL: usize = 0;
pub const KITTI_BBOX_LEFT: usize = 4;
pub const KITTI_BBOX_TOP: usize = 5;
pub const KITTI_BBOX_RIGHT: usize = 6;
pub const KITTI_BBOX_BOTTOM: usize = 7;

// Frame ids are never narrower than KITTI's six digits
pub const MIN_FRAME_ID_WIDTH: usize = 6;

/// Zero-padded, fixed-width key naming one dataset frame (e.g. `"000042"`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameId(String);

impl FrameId {
    /// Build the id for `index`, padded to `width` digits
    pub fn from_index(index: usize, width: usize) -> Self {
        FrameId(format!("{:0width$}", index, width = width))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for FrameId {
    fn from(id: String) -> Self {
        FrameId(id)
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a recognized record could not yield a bounding box
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BoxError {
    #[error("missing bounding box field at position {0}")]
    MissingField(usize),

    #[error("bounding box field at position {index} is not a number: {value:?}")]
    InvalidNumber { index: usize, value: String },

    #[error("bounding box corners out of order (left={left}, top={top}, right={right}, bottom={bottom})")]
    Inverted {
        left: f64,
        top: f64,
        right: f64,
        bottom: f64,
    },
}

/// One whitespace-tokenized line of a KITTI label file
#[derive(Debug, Clone, PartialEq)]
pub struct KittiRecord<'a> {
    fields: Vec<&'a str>,
}

impl<'a> KittiRecord<'a> {
    /// Tokenize a line. Blank lines yield `None`.
    pub fn parse(line: &'a str) -> Option<Self> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            None
        } else {
            Some(KittiRecord { fields })
        }
    }

    pub fn label(&self) -> &'a str {
        self.fields[KITTI_LABEL]
    }

    /// Read left/top/right/bottom from their fixed positions
    pub fn bbox(&self) -> Result<PixelBox, BoxError> {
        let left = self.number_at(KITTI_BBOX_LEFT)?;
        let top = self.number_at(KITTI_BBOX_TOP)?;
        let right = self.number_at(KITTI_BBOX_RIGHT)?;
        let bottom = self.number_at(KITTI_BBOX_BOTTOM)?;
        PixelBox::new(left, top, right, bottom)
    }

    fn number_at(&self, index: usize) -> Result<f64, BoxError> {
        let raw = self
            .fields
            .get(index)
            .ok_or(BoxError::MissingField(index))?;
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(BoxError::InvalidNumber {
                index,
                value: raw.to_string(),
            }),
        }
    }
}

/// Axis-aligned box in absolute pixel corners
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelBox {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl PixelBox {
    /// Corners must already be ordered; swapped corners are rejected, not fixed
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Result<Self, BoxError> {
        if right < left || bottom < top {
            return Err(BoxError::Inverted {
                left,
                top,
                right,
                bottom,
            });
        }
        Ok(PixelBox {
            left,
            top,
            right,
            bottom,
        })
    }

    /// Center/size form normalized by the image resolution
    pub fn normalize(&self, size: ImageSize) -> (f64, f64, f64, f64) {
        let w = size.width as f64;
        let h = size.height as f64;

        let x_center = (self.left + self.right) / 2.0 / w;
        let y_center = (self.top + self.bottom) / 2.0 / h;
        let width = (self.right - self.left) / w;
        let height = (self.bottom - self.top) / h;

        (x_center, y_center, width, height)
    }
}

/// One YOLO label line: class id plus normalized center and size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YoloRecord {
    pub class_id: usize,
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
}

impl YoloRecord {
    pub fn from_pixel_box(class_id: usize, bbox: &PixelBox, size: ImageSize) -> Self {
        let (x_center, y_center, width, height) = bbox.normalize(size);
        YoloRecord {
            class_id,
            x_center,
            y_center,
            width,
            height,
        }
    }

    /// Back to absolute corners for the given resolution
    pub fn to_pixel_box(&self, size: ImageSize) -> PixelBox {
        let w = size.width as f64;
        let h = size.height as f64;
        let half_w = self.width * w / 2.0;
        let half_h = self.height * h / 2.0;
        PixelBox {
            left: self.x_center * w - half_w,
            top: self.y_center * h - half_h,
            right: self.x_center * w + half_w,
            bottom: self.y_center * h + half_h,
        }
    }
}

impl fmt::Display for YoloRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.6} {:.6} {:.6} {:.6}",
            self.class_id, self.x_center, self.y_center, self.width, self.height
        )
    }
}

/// Result of converting one frame whose label file was readable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// At least one record survived; a label file was written
    Converted(usize),
    /// Every record was filtered; no label file was written
    Empty,
}

/// Disjoint training and validation frame ids, in shuffled order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitAssignment {
    pub train: Vec<FrameId>,
    pub val: Vec<FrameId>,
}

impl SplitAssignment {
    pub fn total(&self) -> usize {
        self.train.len() + self.val.len()
    }
}

/// Which half of a split a frame list belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
    Train,
    Val,
}

impl Split {
    pub const ALL: [Split; 2] = [Split::Train, Split::Val];

    /// Directory and split-file stem (`train` / `val`)
    pub fn name(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
        }
    }

    /// Progress bar label
    pub fn label(self) -> &'static str {
        match self {
            Split::Train => "Train",
            Split::Val => "Val",
        }
    }
}

/// Per-split conversion statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConversionStats {
    pub frames_total: usize,
    pub frames_converted: usize,
    pub frames_empty: usize,
    pub frames_failed: usize,
    pub records_written: usize,
    pub images_linked: usize,
    pub images_missing: usize,
}

impl ConversionStats {
    pub fn merge(&mut self, other: &ConversionStats) {
        self.frames_total += other.frames_total;
        self.frames_converted += other.frames_converted;
        self.frames_empty += other.frames_empty;
        self.frames_failed += other.frames_failed;
        self.records_written += other.records_written;
        self.images_linked += other.images_linked;
        self.images_missing += other.images_missing;
    }

    pub fn print_summary(&self, title: &str) {
        log::info!("=== {} Summary ===", title);
        log::info!("Frames processed: {}", self.frames_total);
        log::info!("Frames with labels written: {}", self.frames_converted);
        log::info!("Frames with no recognized objects: {}", self.frames_empty);
        log::info!("Label records written: {}", self.records_written);
        log::info!("Images linked: {}", self.images_linked);

        if self.frames_failed > 0 {
            log::warn!("Frames that failed to convert: {}", self.frames_failed);
        }
        if self.images_missing > 0 {
            log::warn!("Frames with missing source images: {}", self.images_missing);
        }
    }
}
