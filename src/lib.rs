// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

#![allow(clippy::multiple_crate_versions)]

//! # Pose Overlay
//!
//! Live YOLO pose estimation on a webcam feed. Frames are captured from a
//! Video4Linux camera, run through an Ultralytics pose model on
//! [ONNX Runtime](https://onnxruntime.ai), annotated with boxes, keypoints,
//! joint names and skeleton limbs, and shown in a resizable window.
//!
//! ## CLI Usage
//!
//! ```bash
//! # Default camera, default model (downloaded on first run)
//! pose-overlay
//!
//! # Second camera, smaller capture, stricter threshold
//! pose-overlay --camera 1 --width 640 --height 480 --conf 0.5
//! ```
//!
//! Press `q` or `Escape` in the window to quit.
//!
//! ## Library Usage
//!
//! The annotator is independent of capture and inference:
//!
//! ```
//! use pose_overlay::results::{BoundingBox, Detection};
//! use pose_overlay::annotate::annotation_commands;
//!
//! let person = Detection::new(0, 0.87, BoundingBox::new(10, 20, 110, 220), None);
//! let annotation = annotation_commands(&[person]);
//! assert_eq!(annotation.people_count, 1);
//! ```
//!
//! The main loop is generic over [`FrameSource`], [`PoseEstimator`] and
//! [`FrameSink`], so any of them can be swapped out:
//!
//! ```no_run
//! use pose_overlay::{CaptureConfig, V4l2Camera, Viewer, YOLOPoseModel, run_loop};
//!
//! let mut camera = V4l2Camera::open(&CaptureConfig::default())?;
//! let mut viewer = Viewer::new("Pose", 1280, 720)?;
//! let mut model = YOLOPoseModel::load("yolo11n-pose.onnx")?;
//! let outcome = run_loop(&mut camera, &mut model, &mut viewer, None)?;
//! println!("stopped after {} frames", outcome.frames);
//! # Ok::<(), pose_overlay::PoseError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`annotate`] | Detections to draw commands, and rendering |
//! | [`runner`] | The live loop and its cleanup guarantees |
//! | [`source`] | Camera capture ([`FrameSource`], [`V4l2Camera`]) |
//! | [`model`] | [`YOLOPoseModel`] and the [`PoseEstimator`] trait |
//! | [`results`] | [`Results`], [`Detection`] and friends |
//! | [`visualizer`] | Window display, colors and the COCO skeleton |
//! | [`error`] | [`PoseError`] and [`Result`] |

// Modules
pub mod annotate;
pub mod cli;
pub mod download;
pub mod error;
pub mod inference;
pub mod metadata;
pub mod model;
pub mod postprocessing;
pub mod preprocessing;
pub mod results;
pub mod runner;
pub mod source;
pub mod utils;
pub mod visualizer;

// Re-export main types for convenience
pub use annotate::{Annotation, DrawCommand, annotate, annotation_commands, render};
pub use error::{PoseError, Result};
pub use inference::InferenceConfig;
pub use metadata::ModelMetadata;
pub use model::{PoseEstimator, YOLOPoseModel};
pub use results::{BoundingBox, Boxes, Detection, Keypoint, Keypoints, Results, Speed};
pub use runner::{LoopOutcome, StopReason, run_loop};
pub use source::{CaptureConfig, FrameSource, V4l2Camera};
pub use visualizer::{FrameSink, Viewer};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(VERSION.contains('.'));
    }
}
