// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Pose inference results.
//!
//! The model produces array-backed [`Results`] (boxes and keypoints, both
//! optional). The annotator consumes the per-person [`Detection`] view built by
//! [`Results::detections`].

#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use ndarray::{Array2, Array3, ArrayView1, ArrayView2, s};

/// COCO class ID reserved for "person".
pub const PERSON_CLASS_ID: usize = 0;

/// Timing information for one frame, in milliseconds.
#[derive(Debug, Clone, Default)]
pub struct Speed {
    /// Preprocessing time.
    pub preprocess: Option<f64>,
    /// Inference time.
    pub inference: Option<f64>,
    /// Postprocessing time.
    pub postprocess: Option<f64>,
}

impl Speed {
    /// Create a new Speed instance.
    #[must_use]
    pub const fn new(preprocess: f64, inference: f64, postprocess: f64) -> Self {
        Self {
            preprocess: Some(preprocess),
            inference: Some(inference),
            postprocess: Some(postprocess),
        }
    }

    /// Total time across all recorded stages.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.preprocess.unwrap_or(0.0)
            + self.inference.unwrap_or(0.0)
            + self.postprocess.unwrap_or(0.0)
    }
}

/// Output of the pose model for one frame.
#[derive(Debug, Clone)]
pub struct Results {
    /// Detected boxes, if the model produced any box output.
    pub boxes: Option<Boxes>,
    /// Keypoints, index-aligned with `boxes`.
    pub keypoints: Option<Keypoints>,
    /// Original frame shape (height, width).
    pub orig_shape: (u32, u32),
    /// Per-stage timings.
    pub speed: Speed,
}

impl Results {
    /// Create an empty result for a frame of the given shape.
    #[must_use]
    pub const fn new(orig_shape: (u32, u32), speed: Speed) -> Self {
        Self {
            boxes: None,
            keypoints: None,
            orig_shape,
            speed,
        }
    }

    /// Number of detected boxes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.boxes.as_ref().map_or(0, Boxes::len)
    }

    /// Whether nothing was detected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pair every box with its keypoints.
    ///
    /// The i-th box takes the i-th keypoint row. Boxes past the end of the
    /// keypoint array, or all boxes when keypoints are missing, get `None`.
    #[must_use]
    pub fn detections(&self) -> Vec<Detection> {
        let Some(boxes) = &self.boxes else {
            return Vec::new();
        };
        let xy = self.keypoints.as_ref().map(Keypoints::xy);
        let xyxy = boxes.xyxy();
        let conf = boxes.conf();
        let cls = boxes.cls();

        (0..boxes.len())
            .map(|i| {
                let keypoints = xy.as_ref().filter(|xy| i < xy.shape()[0]).map(|xy| {
                    xy.slice(s![i, .., ..])
                        .outer_iter()
                        .map(|point| Keypoint::new(point[0], point[1]))
                        .collect()
                });

                Detection {
                    class_id: cls[i].max(0.0) as usize,
                    confidence: conf[i],
                    bbox: BoundingBox::from_xyxy(xyxy[[i, 0]], xyxy[[i, 1]], xyxy[[i, 2]], xyxy[[i, 3]]),
                    keypoints,
                }
            })
            .collect()
    }

    /// Human-readable summary, e.g. "2 persons" or "(no detections)".
    #[must_use]
    pub fn verbose(&self) -> String {
        let people = self
            .detections()
            .iter()
            .filter(|d| d.is_person())
            .count();
        match people {
            0 => "(no detections)".to_string(),
            1 => "1 person".to_string(),
            n => format!("{n} persons"),
        }
    }
}

/// Bounding boxes with shape (N, 6): `[x1, y1, x2, y2, conf, cls]`.
#[derive(Debug, Clone)]
pub struct Boxes {
    /// Raw box data.
    pub data: Array2<f32>,
    /// Original frame shape (height, width).
    pub orig_shape: (u32, u32),
}

impl Boxes {
    /// Create a new Boxes instance.
    #[must_use]
    pub const fn new(data: Array2<f32>, orig_shape: (u32, u32)) -> Self {
        Self { data, orig_shape }
    }

    /// Number of boxes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    /// Whether there are no boxes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.nrows() == 0
    }

    /// Boxes in `[x1, y1, x2, y2]` format.
    #[must_use]
    pub fn xyxy(&self) -> ArrayView2<'_, f32> {
        self.data.slice(s![.., 0..4])
    }

    /// Confidence scores.
    #[must_use]
    pub fn conf(&self) -> ArrayView1<'_, f32> {
        self.data.column(4)
    }

    /// Class IDs.
    #[must_use]
    pub fn cls(&self) -> ArrayView1<'_, f32> {
        self.data.column(5)
    }
}

/// Pose keypoints with shape (N, K, 3): `[x, y, conf]` per keypoint.
#[derive(Debug, Clone)]
pub struct Keypoints {
    /// Raw keypoint data.
    pub data: Array3<f32>,
    /// Original frame shape (height, width).
    pub orig_shape: (u32, u32),
}

impl Keypoints {
    /// Create a new Keypoints instance.
    #[must_use]
    pub const fn new(data: Array3<f32>, orig_shape: (u32, u32)) -> Self {
        Self { data, orig_shape }
    }

    /// Number of poses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.shape()[0]
    }

    /// Whether there are no poses.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keypoint pixel coordinates with shape (N, K, 2).
    #[must_use]
    pub fn xy(&self) -> Array3<f32> {
        self.data.slice(s![.., .., 0..2]).to_owned()
    }
}

/// Integer pixel corners of a detection box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    /// Left edge.
    pub x1: i32,
    /// Top edge.
    pub y1: i32,
    /// Right edge.
    pub x2: i32,
    /// Bottom edge.
    pub y2: i32,
}

impl BoundingBox {
    /// Create a box from corners, reordering them so that `x1 <= x2` and `y1 <= y2`.
    #[must_use]
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }

    /// Create a box from float model coordinates, truncating toward zero.
    #[must_use]
    pub fn from_xyxy(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self::new(x1 as i32, y1 as i32, x2 as i32, y2 as i32)
    }
}

/// A keypoint position in frame pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    /// Horizontal position.
    pub x: f32,
    /// Vertical position.
    pub y: f32,
}

impl Keypoint {
    /// Create a new keypoint.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Position rounded to the nearest pixel.
    #[must_use]
    pub fn pixel(&self) -> (i32, i32) {
        (self.x.round() as i32, self.y.round() as i32)
    }
}

/// One detected instance, as consumed by the annotator.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Class label; [`PERSON_CLASS_ID`] for people.
    pub class_id: usize,
    /// Detection confidence in `[0, 1]`.
    pub confidence: f32,
    /// Box corners.
    pub bbox: BoundingBox,
    /// Keypoints in the fixed joint order, if the model provided them.
    pub keypoints: Option<Vec<Keypoint>>,
}

impl Detection {
    /// Create a detection.
    #[must_use]
    pub const fn new(
        class_id: usize,
        confidence: f32,
        bbox: BoundingBox,
        keypoints: Option<Vec<Keypoint>>,
    ) -> Self {
        Self {
            class_id,
            confidence,
            bbox,
            keypoints,
        }
    }

    /// Whether this detection is a person.
    #[must_use]
    pub const fn is_person(&self) -> bool {
        self.class_id == PERSON_CLASS_ID
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample_results(num_kpt_rows: usize) -> Results {
        let mut results = Results::new((720, 1280), Speed::default());
        results.boxes = Some(Boxes::new(
            array![
                [10.9, 20.2, 110.7, 220.5, 0.91, 0.0],
                [300.0, 40.0, 400.0, 240.0, 0.42, 1.0],
            ],
            (720, 1280),
        ));
        let mut kpts = Array3::zeros((num_kpt_rows, 17, 3));
        for n in 0..num_kpt_rows {
            for k in 0..17 {
                kpts[[n, k, 0]] = 50.0 + k as f32;
                kpts[[n, k, 1]] = 60.0;
                kpts[[n, k, 2]] = 0.9;
            }
        }
        results.keypoints = Some(Keypoints::new(kpts, (720, 1280)));
        results
    }

    #[test]
    fn test_detections_pair_boxes_and_keypoints() {
        let detections = sample_results(2).detections();
        assert_eq!(detections.len(), 2);

        let first = &detections[0];
        assert!(first.is_person());
        assert_eq!(first.bbox, BoundingBox::new(10, 20, 110, 220));
        assert!((first.confidence - 0.91).abs() < 1e-6);
        let kpts = first.keypoints.as_ref().unwrap();
        assert_eq!(kpts.len(), 17);
        assert_eq!(kpts[3], Keypoint::new(53.0, 60.0));

        assert_eq!(detections[1].class_id, 1);
    }

    #[test]
    fn test_detections_with_short_keypoint_array() {
        let detections = sample_results(1).detections();
        assert!(detections[0].keypoints.is_some());
        assert!(detections[1].keypoints.is_none());
    }

    #[test]
    fn test_detections_without_keypoints_or_boxes() {
        let mut results = sample_results(2);
        results.keypoints = None;
        assert!(results.detections().iter().all(|d| d.keypoints.is_none()));

        results.boxes = None;
        assert!(results.detections().is_empty());
        assert!(results.is_empty());
        assert_eq!(results.verbose(), "(no detections)");
    }

    #[test]
    fn test_verbose_counts_people_only() {
        assert_eq!(sample_results(2).verbose(), "1 person");
    }

    #[test]
    fn test_bounding_box_orders_corners() {
        let bbox = BoundingBox::new(110, 220, 10, 20);
        assert_eq!((bbox.x1, bbox.y1, bbox.x2, bbox.y2), (10, 20, 110, 220));
    }

    #[test]
    fn test_keypoint_pixel_rounds() {
        assert_eq!(Keypoint::new(10.4, 20.6).pixel(), (10, 21));
        assert_eq!(Keypoint::new(-0.6, 0.5).pixel(), (-1, 1));
    }

    #[test]
    fn test_speed_total() {
        let speed = Speed::new(1.0, 2.0, 3.0);
        assert!((speed.total() - 6.0).abs() < 1e-9);
    }
}
