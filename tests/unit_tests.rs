use std::fs;
use std::path::{Path, PathBuf};

use kitti2yolo::types::BoxError;
use kitti2yolo::{
    convert_frame, convert_to_yolo_records, create_split, generate_splits, process_dataset,
    read_split_file, ClassMap, ConvertConfig, FrameId, FrameOutcome, ImageSize, KittiRecord,
    PixelBox, PrepError, SplitConfig, YoloRecord,
};

const CAR: &str =
    "Car 0.00 0 -1.58 587.01 173.33 614.12 200.12 1.65 1.67 3.64 -0.65 1.71 46.70 -1.59";
const CYCLIST: &str =
    "Cyclist 0.00 0 1.87 387.63 181.54 423.81 203.12 1.67 1.87 3.69 -16.53 2.39 58.49 1.57";
const DONT_CARE: &str =
    "DontCare -1 -1 -10 503.89 169.71 590.61 190.13 -1 -1 -1 -1000 -1000 -1000 -10";

fn write_kitti_frame(root: &Path, frame: &str, lines: &[&str], with_image: bool) {
    let label_dir = root.join("label_2");
    let image_dir = root.join("image_2");
    fs::create_dir_all(&label_dir).unwrap();
    fs::create_dir_all(&image_dir).unwrap();
    fs::write(label_dir.join(format!("{}.txt", frame)), lines.join("\n")).unwrap();
    if with_image {
        fs::write(image_dir.join(format!("{}.png", frame)), b"\x89PNG").unwrap();
    }
}

fn convert_config(root: &Path) -> ConvertConfig {
    ConvertConfig {
        kitti_root: root.join("raw_kitti"),
        yolo_output: root.join("yolo_format"),
        splits_dir: root.join("splits"),
        class_map: ClassMap::default(),
        image_size: ImageSize::default(),
        clean: false,
        link_images: true,
    }
}

#[test]
fn test_kitti_record_fields() {
    let record = KittiRecord::parse(CAR).unwrap();
    assert_eq!(record.label(), "Car");
    let bbox = record.bbox().unwrap();
    assert_eq!(bbox.left, 587.01);
    assert_eq!(bbox.top, 173.33);
    assert_eq!(bbox.right, 614.12);
    assert_eq!(bbox.bottom, 200.12);

    assert!(KittiRecord::parse("   ").is_none());
}

#[test]
fn test_kitti_record_box_errors() {
    let short = KittiRecord::parse("Car 0 0 0 1 2 3").unwrap();
    assert_eq!(short.bbox(), Err(BoxError::MissingField(7)));

    let bad = KittiRecord::parse("Car 0 0 0 1 x 3 4").unwrap();
    assert!(matches!(
        bad.bbox(),
        Err(BoxError::InvalidNumber { index: 5, .. })
    ));

    let nan = KittiRecord::parse("Car 0 0 0 1 2 NaN 4").unwrap();
    assert!(matches!(
        nan.bbox(),
        Err(BoxError::InvalidNumber { index: 6, .. })
    ));

    let inverted = KittiRecord::parse("Car 0 0 0 30 2 10 4").unwrap();
    assert!(matches!(inverted.bbox(), Err(BoxError::Inverted { .. })));
}

#[test]
fn test_normalized_values_stay_in_unit_range_and_round_trip() {
    let size = ImageSize::default();
    let boxes = [
        (0.0, 0.0, 1242.0, 375.0),
        (0.0, 0.0, 0.0, 0.0),
        (587.01, 173.33, 614.12, 200.12),
        (1200.5, 300.25, 1241.99, 374.99),
        (10.0, 20.0, 10.0, 40.0),
    ];

    for (left, top, right, bottom) in boxes {
        let bbox = PixelBox::new(left, top, right, bottom).unwrap();
        let record = YoloRecord::from_pixel_box(0, &bbox, size);

        for value in [record.x_center, record.y_center, record.width, record.height] {
            assert!((0.0..=1.0).contains(&value), "{} out of range", value);
        }

        let decoded = record.to_pixel_box(size);
        let again = YoloRecord::from_pixel_box(0, &decoded, size);
        assert!((again.x_center - record.x_center).abs() < 1e-9);
        assert!((again.y_center - record.y_center).abs() < 1e-9);
        assert!((again.width - record.width).abs() < 1e-9);
        assert!((again.height - record.height).abs() < 1e-9);
        assert_eq!(again.to_string(), record.to_string());
    }
}

#[test]
fn test_well_formed_boxes_have_positive_size() {
    let content = [CAR, CYCLIST].join("\n");
    let records = convert_to_yolo_records(
        &content,
        Path::new("000001.txt"),
        &ClassMap::default(),
        ImageSize::default(),
    );
    assert_eq!(records.len(), 2);
    for record in records {
        assert!(record.width > 0.0);
        assert!(record.height > 0.0);
    }
}

#[test]
fn test_generate_splits_writes_files() {
    let temp_dir = tempfile::tempdir().unwrap();
    let output_dir = temp_dir.path().join("splits");
    let config = SplitConfig::new(7481, 0.8, 42).unwrap();

    let assignment = generate_splits(&config, &output_dir).unwrap();

    let train = read_split_file(&output_dir.join("train.txt")).unwrap();
    let val = read_split_file(&output_dir.join("val.txt")).unwrap();
    assert_eq!(train.len(), 5984);
    assert_eq!(val.len(), 1497);
    assert_eq!(train, assignment.train);
    assert_eq!(assignment, create_split(7481, 0.8, 42));
}

#[test]
fn test_frame_with_only_unknown_classes_writes_no_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = convert_config(temp_dir.path());
    write_kitti_frame(&config.kitti_root, "000003", &[DONT_CARE, "Tram 0 0 0 1 2 3 4"], false);

    let labels_dir = temp_dir.path().join("out");
    fs::create_dir_all(&labels_dir).unwrap();

    let frame = FrameId::from("000003".to_string());
    let outcome = convert_frame(&frame, &config, &labels_dir).unwrap();
    assert_eq!(outcome, FrameOutcome::Empty);
    assert!(!labels_dir.join("000003.txt").exists());
}

#[test]
fn test_frame_that_became_empty_loses_its_old_label_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = convert_config(temp_dir.path());
    write_kitti_frame(&config.kitti_root, "000006", &[DONT_CARE], false);

    let labels_dir = temp_dir.path().join("out");
    fs::create_dir_all(&labels_dir).unwrap();
    fs::write(labels_dir.join("000006.txt"), "0 0.5 0.5 0.1 0.1").unwrap();

    let frame = FrameId::from("000006".to_string());
    let outcome = convert_frame(&frame, &config, &labels_dir).unwrap();
    assert_eq!(outcome, FrameOutcome::Empty);
    assert!(!labels_dir.join("000006.txt").exists());
}

#[test]
fn test_unsafe_frame_ids_are_rejected() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = convert_config(temp_dir.path());
    write_kitti_frame(&config.kitti_root, "000001", &[CAR], false);
    // A label file one level up that ".." would otherwise resolve to
    fs::write(config.kitti_root.join("..txt"), CAR).unwrap();

    let labels_dir = temp_dir.path().join("out/labels/train");
    fs::create_dir_all(&labels_dir).unwrap();

    for id in ["..", "../000001", "000001/"] {
        let frame = FrameId::from(id.to_string());
        let result = convert_frame(&frame, &config, &labels_dir);
        assert!(
            matches!(result, Err(PrepError::InvalidFrameId(ref raw)) if raw == id),
            "{:?} gave {:?}",
            id,
            result
        );
    }
    assert_eq!(fs::read_dir(&labels_dir).unwrap().count(), 0);
    assert!(!labels_dir.parent().unwrap().join("..txt").exists());
}

#[test]
fn test_dotted_frame_id_keeps_its_full_name() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = convert_config(temp_dir.path());
    write_kitti_frame(&config.kitti_root, "000001", &[CAR], false);

    let labels_dir = temp_dir.path().join("out");
    fs::create_dir_all(&labels_dir).unwrap();

    // Must read label_2/000001.v2.txt, not fall back to 000001.txt
    let frame = FrameId::from("000001.v2".to_string());
    let result = convert_frame(&frame, &config, &labels_dir);
    assert!(matches!(result, Err(PrepError::Io { ref path, .. }) if path.ends_with("000001.v2.txt")));
    assert!(!labels_dir.join("000001.txt").exists());

    write_kitti_frame(&config.kitti_root, "000001.v2", &[CYCLIST], false);
    let outcome = convert_frame(&frame, &config, &labels_dir).unwrap();
    assert_eq!(outcome, FrameOutcome::Converted(1));
    assert!(labels_dir.join("000001.v2.txt").exists());
    assert!(!labels_dir.join("000001.txt").exists());
}

#[test]
fn test_malformed_line_does_not_drop_frame() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = convert_config(temp_dir.path());
    write_kitti_frame(
        &config.kitti_root,
        "000004",
        &[CAR, "Pedestrian 0 0 0 12.0 oops 30.0 40.0", CYCLIST],
        false,
    );

    let labels_dir = temp_dir.path().join("out");
    fs::create_dir_all(&labels_dir).unwrap();

    let frame = FrameId::from("000004".to_string());
    let outcome = convert_frame(&frame, &config, &labels_dir).unwrap();
    assert_eq!(outcome, FrameOutcome::Converted(2));

    let written = fs::read_to_string(labels_dir.join("000004.txt")).unwrap();
    let classes: Vec<&str> = written
        .lines()
        .map(|line| line.split(' ').next().unwrap())
        .collect();
    assert_eq!(classes, vec!["0", "2"]);
    assert!(!written.ends_with('\n'));
}

#[test]
fn test_missing_label_file_is_an_error() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = convert_config(temp_dir.path());
    let frame = FrameId::from("000099".to_string());

    let result = convert_frame(&frame, &config, temp_dir.path());
    assert!(matches!(result, Err(PrepError::Io { .. })));
}

#[test]
fn test_process_dataset_end_to_end() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = convert_config(temp_dir.path());

    write_kitti_frame(&config.kitti_root, "000000", &[CAR, DONT_CARE], true);
    write_kitti_frame(&config.kitti_root, "000001", &[CYCLIST], true);
    write_kitti_frame(&config.kitti_root, "000002", &[DONT_CARE], false);

    fs::create_dir_all(&config.splits_dir).unwrap();
    fs::write(config.splits_dir.join("train.txt"), "000000\n000002").unwrap();
    fs::write(config.splits_dir.join("val.txt"), "000001\n000005").unwrap();

    let stats = process_dataset(&config).unwrap();

    assert_eq!(stats.frames_total, 4);
    assert_eq!(stats.frames_converted, 2);
    assert_eq!(stats.frames_empty, 1);
    assert_eq!(stats.frames_failed, 1);
    assert_eq!(stats.records_written, 2);

    let out = &config.yolo_output;
    let train_label = fs::read_to_string(out.join("labels/train/000000.txt")).unwrap();
    assert!(train_label.starts_with("0 "));
    assert_eq!(train_label.lines().count(), 1);
    assert!(!out.join("labels/train/000002.txt").exists());
    assert!(out.join("labels/val/000001.txt").exists());
    assert!(!out.join("labels/val/000005.txt").exists());

    assert!(fs::symlink_metadata(out.join("images/train/000000.png")).is_ok());
    assert!(fs::symlink_metadata(out.join("images/val/000001.png")).is_ok());
    assert!(fs::symlink_metadata(out.join("images/train/000002.png")).is_err());

    let yaml = fs::read_to_string(out.join("data.yaml")).unwrap();
    assert!(yaml.contains("train: images/train"));
    assert!(yaml.contains("    1: Pedestrian"));

    // A second run over the same tree must not fail on existing links
    let rerun = process_dataset(&config).unwrap();
    assert_eq!(rerun.frames_converted, 2);
    assert_eq!(rerun.images_linked, 2);
}

#[test]
fn test_process_dataset_requires_split_files() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = convert_config(temp_dir.path());

    let result = process_dataset(&config);
    let expected: PathBuf = config.splits_dir.join("train.txt");
    assert!(matches!(result, Err(PrepError::Io { path, .. }) if path == expected));
    assert!(!config.yolo_output.exists());
}
