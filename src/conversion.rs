use log::{debug, warn};
use std::path::Path;

use crate::config::{ClassMap, ImageSize};
use crate::types::{KittiRecord, YoloRecord};

/// Convert the lines of one KITTI label file to YOLO records.
///
/// Records whose class is not in `class_map` are dropped quietly. Records with
/// a missing, non-numeric or inverted box are dropped with a warning naming
/// `source` and the offending line. Surviving records keep their input order.
pub fn convert_to_yolo_records(
    content: &str,
    source: &Path,
    class_map: &ClassMap,
    image_size: ImageSize,
) -> Vec<YoloRecord> {
    let mut records = Vec::new();

    for (line_idx, line) in content.lines().enumerate() {
        let Some(record) = KittiRecord::parse(line) else {
            continue;
        };

        let class_id = match class_map.get(record.label()) {
            Some(class_id) => class_id,
            None => {
                debug!(
                    "Skipping unmapped class {:?} in {}:{}",
                    record.label(),
                    source.display(),
                    line_idx + 1
                );
                continue;
            }
        };

        match record.bbox() {
            Ok(bbox) => records.push(YoloRecord::from_pixel_box(class_id, &bbox, image_size)),
            Err(e) => {
                warn!(
                    "Could not parse bounding box in {} (line {}): '{}'. Error: {}",
                    source.display(),
                    line_idx + 1,
                    line.trim_end(),
                    e
                );
            }
        }
    }

    records
}

/// Render records as newline-joined YOLO label text
pub fn format_yolo_records(records: &[YoloRecord]) -> String {
    let mut yolo_data = String::with_capacity(records.len() * 48);
    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            yolo_data.push('\n');
        }
        yolo_data.push_str(&record.to_string());
    }
    yolo_data
}
