use glob::glob;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::{ClassMap, ConvertConfig};
use crate::error::{PrepError, Result};
use crate::types::Split;
use crate::utils::create_output_directory;

pub const DATASET_YAML: &str = "data.yaml";

/// Label and image output directories of one split
#[derive(Debug, Clone)]
pub struct SplitDirs {
    pub labels_dir: PathBuf,
    pub images_dir: PathBuf,
}

/// Output directories for every split
#[derive(Debug, Clone)]
pub struct OutputDirs {
    pub train: SplitDirs,
    pub val: SplitDirs,
}

impl OutputDirs {
    pub fn for_split(&self, split: Split) -> &SplitDirs {
        match split {
            Split::Train => &self.train,
            Split::Val => &self.val,
        }
    }
}

/// Set up `labels/{train,val}` and `images/{train,val}` under the output root
pub fn setup_output_directories(config: &ConvertConfig) -> Result<OutputDirs> {
    let root = &config.yolo_output;
    let make = |split: Split| -> Result<SplitDirs> {
        Ok(SplitDirs {
            labels_dir: create_output_directory(
                &root.join("labels").join(split.name()),
                config.clean,
            )?,
            images_dir: create_output_directory(
                &root.join("images").join(split.name()),
                config.clean,
            )?,
        })
    };

    Ok(OutputDirs {
        train: make(Split::Train)?,
        val: make(Split::Val)?,
    })
}

/// Count `*.txt` label files directly inside `label_dir`
pub fn count_label_files(label_dir: &Path) -> Result<usize> {
    if !label_dir.is_dir() {
        return Err(PrepError::io(
            label_dir,
            std::io::Error::new(std::io::ErrorKind::NotFound, "label directory not found"),
        ));
    }

    let pattern = label_dir.join("*.txt");
    let entries = glob(&pattern.to_string_lossy()).map_err(|e| {
        PrepError::Config(format!("invalid label directory pattern: {}", e))
    })?;
    Ok(entries.filter_map(|entry| entry.ok()).count())
}

/// Read one KITTI label file. This is the only fatal failure of a frame.
pub fn read_label_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| PrepError::io(path, e))
}

/// Write `content` to `path`, replacing any existing file
pub fn write_text_file(path: &Path, content: &str) -> Result<()> {
    let file = File::create(path).map_err(|e| PrepError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(content.as_bytes())
        .and_then(|_| writer.flush())
        .map_err(|e| PrepError::io(path, e))
}

/// Remove `path` if it exists
pub fn remove_stale_file(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(PrepError::io(path, e)),
    }
}

/// Outcome of placing a frame's image in the output tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageLink {
    Created,
    AlreadyPresent,
    SourceMissing,
}

/// Link `source` into the output tree at `dest` using an absolute target.
///
/// An existing entry at `dest`, even a dangling symlink, is left untouched so
/// that re-runs do not fail.
pub fn link_image(source: &Path, dest: &Path) -> Result<ImageLink> {
    if fs::symlink_metadata(dest).is_ok() {
        return Ok(ImageLink::AlreadyPresent);
    }
    if !source.exists() {
        return Ok(ImageLink::SourceMissing);
    }

    let target = fs::canonicalize(source).map_err(|e| PrepError::io(source, e))?;
    place_image(&target, dest).map_err(|e| PrepError::io(dest, e))?;
    Ok(ImageLink::Created)
}

#[cfg(unix)]
fn place_image(target: &Path, dest: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, dest)
}

#[cfg(not(unix))]
fn place_image(target: &Path, dest: &Path) -> std::io::Result<()> {
    fs::copy(target, dest).map(|_| ())
}

/// Create the data.yaml file for YOLO training
pub fn create_dataset_yaml(output_root: &Path, class_map: &ClassMap) -> Result<PathBuf> {
    let dataset_yaml_path = output_root.join(DATASET_YAML);
    let absolute_path =
        fs::canonicalize(output_root).map_err(|e| PrepError::io(output_root, e))?;

    let mut yaml_content = format!(
        "path: {}\ntrain: images/train\nval: images/val\n\nnc: {}\nnames:\n",
        absolute_path.to_string_lossy(),
        class_map.len()
    );
    for (id, label) in class_map.names().iter().enumerate() {
        yaml_content.push_str(&format!("    {}: {}\n", id, label));
    }

    write_text_file(&dataset_yaml_path, &yaml_content)?;
    Ok(dataset_yaml_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_label_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        for name in ["000000.txt", "000001.txt", "000002.txt", "notes.md"] {
            fs::write(temp_dir.path().join(name), "").unwrap();
        }
        assert_eq!(count_label_files(temp_dir.path()).unwrap(), 3);
        assert!(count_label_files(&temp_dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_create_dataset_yaml() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = create_dataset_yaml(temp_dir.path(), &ClassMap::default()).unwrap();

        let yaml_content = fs::read_to_string(path).unwrap();
        assert!(yaml_content.contains("path:"));
        assert!(yaml_content.contains("train: images/train"));
        assert!(yaml_content.contains("val: images/val"));
        assert!(yaml_content.contains("nc: 3"));
        assert!(yaml_content.contains("    0: Car\n"));
        assert!(yaml_content.contains("    2: Cyclist\n"));
    }

    #[cfg(unix)]
    #[test]
    fn test_link_image_is_idempotent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let source = temp_dir.path().join("000000.png");
        let dest = temp_dir.path().join("linked.png");
        fs::write(&source, b"\x89PNG").unwrap();

        assert_eq!(link_image(&source, &dest).unwrap(), ImageLink::Created);
        assert!(fs::symlink_metadata(&dest).unwrap().file_type().is_symlink());
        assert_eq!(link_image(&source, &dest).unwrap(), ImageLink::AlreadyPresent);
    }

    #[test]
    fn test_link_image_missing_source() {
        let temp_dir = tempfile::tempdir().unwrap();
        let result = link_image(
            &temp_dir.path().join("missing.png"),
            &temp_dir.path().join("dest.png"),
        );
        assert_eq!(result.unwrap(), ImageLink::SourceMissing);
    }
}
