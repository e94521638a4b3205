// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Visualization: overlay colors, the pose skeleton and the display window.

/// Color definitions.
pub mod color;

/// COCO-Pose joint names and limb pairs.
pub mod skeleton;

pub mod viewer;

pub use color::Color;
pub use viewer::{FrameSink, Viewer};
