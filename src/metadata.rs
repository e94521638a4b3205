// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! ONNX pose model metadata.
//!
//! Ultralytics exports embed a small YAML document in the ONNX custom metadata.
//! Only the fields the overlay needs are read: the task (must be `pose`), the
//! input size, the stride, the keypoint shape and the class names.

use std::collections::HashMap;

use crate::error::{PoseError, Result};

/// Task name Ultralytics writes for pose estimation models.
pub const POSE_TASK: &str = "pose";

/// Metadata extracted from an Ultralytics YOLO pose model.
#[derive(Debug, Clone)]
pub struct ModelMetadata {
    /// Model description (e.g. "Ultralytics YOLO11n-pose model trained on coco-pose.yaml").
    pub description: String,
    /// Ultralytics version used for export.
    pub version: String,
    /// Task name as written by the exporter.
    pub task: String,
    /// Model stride (typically 32).
    pub stride: u32,
    /// Input image size as (height, width).
    pub imgsz: (usize, usize),
    /// Keypoints per detection and values per keypoint, e.g. (17, 3).
    pub kpt_shape: (usize, usize),
    /// Class ID to class name mapping.
    pub names: HashMap<usize, String>,
}

impl ModelMetadata {
    /// Build metadata from the ONNX custom metadata map.
    ///
    /// Values may be stored one key per entry or as a single YAML blob.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric field cannot be parsed.
    pub fn from_onnx_metadata(metadata_map: &HashMap<String, String>) -> Result<Self> {
        if metadata_map.is_empty() {
            return Ok(Self::default());
        }

        let yaml = metadata_map
            .values()
            .find(|v| v.contains("task:"))
            .cloned()
            .unwrap_or_else(|| {
                metadata_map
                    .iter()
                    .map(|(key, value)| format!("{key}: {value}"))
                    .collect::<Vec<_>>()
                    .join("\n")
            });

        Self::from_yaml_str(&yaml)
    }

    /// Parse metadata from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if `stride` is not an integer.
    pub fn from_yaml_str(yaml_str: &str) -> Result<Self> {
        let mut metadata = Self::default();

        for line in yaml_str.lines() {
            // Nested entries (class names, list items) are handled below
            if line.starts_with(' ') || line.starts_with('-') {
                continue;
            }
            let Some((key, value)) = line.trim().split_once(':') else {
                continue;
            };
            let value = value.trim().trim_matches('\'').trim_matches('"');

            match key.trim() {
                "description" => metadata.description = value.to_string(),
                "version" => metadata.version = value.to_string(),
                "task" => metadata.task = value.to_string(),
                "stride" => {
                    metadata.stride = value.parse().map_err(|_| {
                        PoseError::ModelLoadError(format!("Invalid stride value: {value}"))
                    })?;
                }
                _ => {}
            }
        }

        if let Some(imgsz) = parse_pair(yaml_str, "imgsz") {
            metadata.imgsz = imgsz;
        }
        if let Some(kpt_shape) = parse_pair(yaml_str, "kpt_shape") {
            metadata.kpt_shape = kpt_shape;
        }

        let names = parse_names(yaml_str);
        if !names.is_empty() {
            metadata.names = names;
        }

        Ok(metadata)
    }

    /// Whether the model was exported for pose estimation.
    #[must_use]
    pub fn is_pose(&self) -> bool {
        self.task == POSE_TASK
    }

    /// Get the number of classes in this model.
    #[must_use]
    pub fn num_classes(&self) -> usize {
        self.names.len().max(1)
    }

    /// Number of keypoints per detection.
    #[must_use]
    pub const fn num_keypoints(&self) -> usize {
        self.kpt_shape.0
    }
}

impl Default for ModelMetadata {
    fn default() -> Self {
        Self {
            description: String::new(),
            version: String::new(),
            task: POSE_TASK.to_string(),
            stride: 32,
            imgsz: (640, 640),
            kpt_shape: (17, 3),
            names: HashMap::from([(0, "person".to_string())]),
        }
    }
}

/// Parse a two-element list written either inline (`key: [640, 640]`) or as a
/// YAML block list.
fn parse_pair(yaml_str: &str, key: &str) -> Option<(usize, usize)> {
    let prefix = format!("{key}:");
    let mut lines = yaml_str.lines().skip_while(|l| !l.trim_start().starts_with(&prefix));
    let head = lines.next()?;

    let values: Vec<usize> = if let (Some(start), Some(end)) = (head.find('['), head.find(']')) {
        head[start + 1..end]
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect()
    } else {
        lines
            .map(str::trim)
            .take_while(|l| l.starts_with('-'))
            .filter_map(|l| l.trim_start_matches('-').trim().parse().ok())
            .collect()
    };

    match values.as_slice() {
        [a, b, ..] => Some((*a, *b)),
        _ => None,
    }
}

/// Parse class names from either a Python dict (`names: {0: 'person'}`) or an
/// indented YAML block.
fn parse_names(yaml_str: &str) -> HashMap<usize, String> {
    let mut names = HashMap::new();

    let Some(start) = yaml_str.find("names:") else {
        return names;
    };
    let after = yaml_str[start + "names:".len()..].trim_start();

    let entries: Vec<&str> = if let Some(dict) = after.strip_prefix('{') {
        dict.split('}').next().unwrap_or_default().split(',').collect()
    } else {
        after
            .lines()
            .take_while(|l| {
                let t = l.trim();
                t.is_empty() || t.starts_with(|c: char| c.is_ascii_digit())
            })
            .collect()
    };

    for entry in entries {
        if let Some((key, value)) = entry.trim().split_once(':')
            && let Ok(class_id) = key.trim().parse::<usize>()
        {
            let name = value.trim().trim_matches('\'').trim_matches('"');
            names.insert(class_id, name.to_string());
        }
    }

    names
}

#[cfg(test)]
mod tests {
    use super::*;

    const POSE_METADATA: &str = r"
description: Ultralytics YOLO11n-pose model trained on coco-pose.yaml
author: Ultralytics
version: 8.3.40
stride: 32
task: pose
batch: 1
imgsz:
- 640
- 640
names:
  0: person
kpt_shape:
- 17
- 3
";

    #[test]
    fn test_parse_pose_metadata() {
        let metadata = ModelMetadata::from_yaml_str(POSE_METADATA).unwrap();

        assert!(metadata.is_pose());
        assert_eq!(metadata.stride, 32);
        assert_eq!(metadata.imgsz, (640, 640));
        assert_eq!(metadata.kpt_shape, (17, 3));
        assert_eq!(metadata.num_keypoints(), 17);
        assert_eq!(metadata.num_classes(), 1);
        assert_eq!(metadata.names.get(&0).map(String::as_str), Some("person"));
        assert_eq!(metadata.version, "8.3.40");
    }

    #[test]
    fn test_parse_inline_lists_and_dict_names() {
        let yaml = "task: pose\nimgsz: [480, 640]\nkpt_shape: [17, 3]\nnames: {0: 'person'}";
        let metadata = ModelMetadata::from_yaml_str(yaml).unwrap();
        assert_eq!(metadata.imgsz, (480, 640));
        assert_eq!(metadata.kpt_shape, (17, 3));
        assert_eq!(metadata.names.len(), 1);
    }

    #[test]
    fn test_detect_model_is_not_pose() {
        let metadata = ModelMetadata::from_yaml_str("task: detect\nstride: 32").unwrap();
        assert!(!metadata.is_pose());
    }

    #[test]
    fn test_invalid_stride() {
        let result = ModelMetadata::from_yaml_str("task: pose\nstride: abc");
        assert!(matches!(result, Err(PoseError::ModelLoadError(_))));
    }

    #[test]
    fn test_default_metadata() {
        let metadata = ModelMetadata::default();
        assert!(metadata.is_pose());
        assert_eq!(metadata.imgsz, (640, 640));
        assert_eq!(metadata.kpt_shape, (17, 3));
    }

    #[test]
    fn test_onnx_metadata_per_key() {
        let map = HashMap::from([
            ("task".to_string(), "pose".to_string()),
            ("imgsz".to_string(), "[320, 320]".to_string()),
            ("stride".to_string(), "32".to_string()),
        ]);
        let metadata = ModelMetadata::from_onnx_metadata(&map).unwrap();
        assert!(metadata.is_pose());
        assert_eq!(metadata.imgsz, (320, 320));
    }
}
