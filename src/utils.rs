// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Box overlap and suppression helpers.

/// Calculate `IoU` (Intersection over Union) between two `[x1, y1, x2, y2]` boxes.
///
/// Returns a value between 0.0 and 1.0; degenerate boxes give 0.0.
#[must_use]
pub fn calculate_iou(box1: &[f32; 4], box2: &[f32; 4]) -> f32 {
    let x1 = box1[0].max(box2[0]);
    let y1 = box1[1].max(box2[1]);
    let x2 = box1[2].min(box2[2]);
    let y2 = box1[3].min(box2[3]);

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);

    let area1 = (box1[2] - box1[0]) * (box1[3] - box1[1]);
    let area2 = (box2[2] - box2[0]) * (box2[3] - box2[1]);
    let union = area1 + area2 - intersection;

    if union > 0.0 { intersection / union } else { 0.0 }
}

/// Per-class Non-Maximum Suppression.
///
/// `boxes` holds `([x1, y1, x2, y2], score, class_id)` candidates. Returns the
/// indices of kept boxes, highest score first. Boxes only suppress boxes of the
/// same class.
#[must_use]
pub fn nms_per_class(boxes: &[([f32; 4], f32, usize)], iou_threshold: f32) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..boxes.len()).collect();
    indices.sort_by(|&a, &b| boxes[b].1.total_cmp(&boxes[a].1));

    let mut keep = Vec::new();
    let mut suppressed = vec![false; boxes.len()];

    for &i in &indices {
        if suppressed[i] {
            continue;
        }
        keep.push(i);

        for &j in &indices {
            if j != i
                && !suppressed[j]
                && boxes[j].2 == boxes[i].2
                && calculate_iou(&boxes[i].0, &boxes[j].0) > iou_threshold
            {
                suppressed[j] = true;
            }
        }
    }

    keep
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iou_identical_and_disjoint() {
        let a = [0.0, 0.0, 10.0, 10.0];
        assert!((calculate_iou(&a, &a) - 1.0).abs() < 1e-6);
        assert!(calculate_iou(&a, &[20.0, 20.0, 30.0, 30.0]).abs() < 1e-6);
    }

    #[test]
    fn test_iou_half_overlap() {
        let iou = calculate_iou(&[0.0, 0.0, 10.0, 10.0], &[5.0, 0.0, 15.0, 10.0]);
        assert!((iou - 50.0 / 150.0).abs() < 1e-6);
    }

    #[test]
    fn test_nms_suppresses_overlapping_same_class() {
        let boxes = vec![
            ([0.0, 0.0, 100.0, 200.0], 0.6, 0),
            ([2.0, 2.0, 102.0, 202.0], 0.9, 0),
            ([300.0, 0.0, 400.0, 200.0], 0.7, 0),
        ];
        assert_eq!(nms_per_class(&boxes, 0.45), vec![1, 2]);
    }

    #[test]
    fn test_nms_keeps_other_classes() {
        let boxes = vec![
            ([0.0, 0.0, 100.0, 100.0], 0.9, 0),
            ([0.0, 0.0, 100.0, 100.0], 0.8, 1),
        ];
        assert_eq!(nms_per_class(&boxes, 0.45), vec![0, 1]);
        assert!(nms_per_class(&[], 0.45).is_empty());
    }
}
