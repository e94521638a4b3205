// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Inference configuration.
//!
//! [`InferenceConfig`] controls how the pose model filters its raw output:
//! confidence threshold, Non-Maximum Suppression (NMS) overlap, the cap on
//! detections per frame, input size and ONNX Runtime threading.

/// Configuration for pose inference.
///
/// # Example
///
/// ```rust
/// use pose_overlay::InferenceConfig;
///
/// let config = InferenceConfig::new()
///     .with_confidence(0.5)
///     .with_iou(0.45)
///     .with_max_detections(20)
///     .with_imgsz(640, 640);
/// ```
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// Confidence threshold for detections (0.0 to 1.0).
    pub confidence_threshold: f32,
    /// `IoU` threshold for NMS (0.0 to 1.0). Lower values filter more duplicates.
    pub iou_threshold: f32,
    /// Maximum number of people kept per frame after NMS.
    pub max_detections: usize,
    /// Explicit input size (height, width). `None` uses the model metadata.
    pub imgsz: Option<(usize, usize)>,
    /// Number of intra-op threads for ONNX Runtime. `0` lets the runtime decide.
    pub num_threads: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.25,
            iou_threshold: 0.45,
            max_detections: 300,
            imgsz: None,
            num_threads: 0,
        }
    }
}

impl InferenceConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the confidence threshold.
    #[must_use]
    pub const fn with_confidence(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Set the `IoU` threshold for NMS.
    #[must_use]
    pub const fn with_iou(mut self, threshold: f32) -> Self {
        self.iou_threshold = threshold;
        self
    }

    /// Set the maximum number of detections kept per frame.
    #[must_use]
    pub const fn with_max_detections(mut self, max: usize) -> Self {
        self.max_detections = max;
        self
    }

    /// Set the input image size as (height, width).
    #[must_use]
    pub const fn with_imgsz(mut self, height: usize, width: usize) -> Self {
        self.imgsz = Some((height, width));
        self
    }

    /// Set the number of intra-op threads. `0` means auto.
    #[must_use]
    pub const fn with_threads(mut self, threads: usize) -> Self {
        self.num_threads = threads;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = InferenceConfig::default();
        assert!((config.confidence_threshold - 0.25).abs() < f32::EPSILON);
        assert!((config.iou_threshold - 0.45).abs() < f32::EPSILON);
        assert_eq!(config.max_detections, 300);
        assert!(config.imgsz.is_none());
    }

    #[test]
    fn test_config_builder() {
        let config = InferenceConfig::new()
            .with_confidence(0.5)
            .with_iou(0.6)
            .with_max_detections(10)
            .with_imgsz(480, 640)
            .with_threads(4);

        assert!((config.confidence_threshold - 0.5).abs() < f32::EPSILON);
        assert!((config.iou_threshold - 0.6).abs() < f32::EPSILON);
        assert_eq!(config.max_detections, 10);
        assert_eq!(config.imgsz, Some((480, 640)));
        assert_eq!(config.num_threads, 4);
    }
}
