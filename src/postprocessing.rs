// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Post-processing for YOLO pose model outputs.
//!
//! Raw predictions are filtered by confidence, mapped back to frame
//! coordinates, reduced with per-class NMS and packed into [`Results`].

#![allow(clippy::cast_precision_loss)]

use ndarray::{Array2, Array3, ArrayView2, s};

use crate::inference::InferenceConfig;
use crate::preprocessing::{PreprocessResult, clip_coords, scale_coords};
use crate::results::{Boxes, Keypoints, Results, Speed};
use crate::utils::nms_per_class;

/// A decoded prediction before NMS: box, score, class, keypoints `[x, y, conf]`.
type Candidate = ([f32; 4], f32, usize, Vec<[f32; 3]>);

/// Post-process a pose model output.
///
/// YOLO pose models output shape `[1, 4 + nc + K*3, N]` (e.g. `[1, 56, 8400]`
/// for one class and 17 keypoints). The transposed layout `[1, N, features]`
/// is accepted as well. Malformed shapes produce an empty result rather than
/// an error.
#[must_use]
pub fn postprocess_pose(
    output: &[f32],
    output_shape: &[usize],
    num_keypoints: usize,
    preprocess: &PreprocessResult,
    config: &InferenceConfig,
    speed: Speed,
) -> Results {
    let mut results = Results::new(preprocess.orig_shape, speed);
    let kpt_features = num_keypoints * 3;
    let min_features = 4 + 1 + kpt_features;

    let Some(view) = as_predictions(output, output_shape, min_features) else {
        return results;
    };

    let num_classes = view.ncols() - 4 - kpt_features;
    let kpt_start = 4 + num_classes;
    let (oh, ow) = preprocess.orig_shape;

    let mut candidates: Vec<Candidate> = Vec::new();
    for row in view.rows() {
        let (best_class, best_score) = row
            .slice(s![4..kpt_start])
            .iter()
            .enumerate()
            .map(|(idx, &score)| (idx, if score.is_nan() { 0.0 } else { score }))
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .unwrap_or((0, 0.0));

        if best_score < config.confidence_threshold {
            continue;
        }

        let (cx, cy, w, h) = (row[0], row[1], row[2], row[3]);
        let xyxy = [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0];
        let scaled = scale_coords(&xyxy, preprocess.scale, preprocess.padding);
        let bbox = clip_coords(&scaled, preprocess.orig_shape);

        let keypoints = (0..num_keypoints)
            .map(|k| {
                let offset = kpt_start + k * 3;
                let (x, y, conf) = (row[offset], row[offset + 1], row[offset + 2]);
                let p = scale_coords(&[x, y, x, y], preprocess.scale, preprocess.padding);
                [p[0].clamp(0.0, ow as f32), p[1].clamp(0.0, oh as f32), conf]
            })
            .collect();

        candidates.push((bbox, best_score, best_class, keypoints));
    }

    let nms_input: Vec<_> = candidates
        .iter()
        .map(|(bbox, score, class, _)| (*bbox, *score, *class))
        .collect();
    let keep = nms_per_class(&nms_input, config.iou_threshold);
    let num_kept = keep.len().min(config.max_detections);

    let mut boxes_data = Array2::zeros((num_kept, 6));
    let mut keypoints_data = Array3::zeros((num_kept, num_keypoints, 3));

    for (out_idx, &keep_idx) in keep.iter().take(num_kept).enumerate() {
        let (bbox, score, class, kpts) = &candidates[keep_idx];

        for (c, value) in bbox.iter().enumerate() {
            boxes_data[[out_idx, c]] = *value;
        }
        boxes_data[[out_idx, 4]] = *score;
        boxes_data[[out_idx, 5]] = *class as f32;

        for (k, kpt) in kpts.iter().enumerate() {
            for (c, value) in kpt.iter().enumerate() {
                keypoints_data[[out_idx, k, c]] = *value;
            }
        }
    }

    results.boxes = Some(Boxes::new(boxes_data, preprocess.orig_shape));
    results.keypoints = Some(Keypoints::new(keypoints_data, preprocess.orig_shape));
    results
}

/// View the raw output as `[predictions, features]`.
///
/// Returns `None` when the shape does not describe a pose output.
fn as_predictions(
    output: &[f32],
    output_shape: &[usize],
    min_features: usize,
) -> Option<Array2<f32>> {
    let (a, b) = match output_shape {
        [1, a, b] | [a, b] => (*a, *b),
        _ => return None,
    };
    if a * b != output.len() || a.min(b) < min_features {
        return None;
    }

    let raw = ArrayView2::from_shape((a, b), output).ok()?;
    // Features are the smaller axis: 56 features vs 8400 anchors
    if a <= b {
        Some(raw.t().to_owned())
    } else {
        Some(raw.to_owned())
    }
}
