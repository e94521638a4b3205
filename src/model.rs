// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! YOLO pose model loading and inference.
//!
//! [`YOLOPoseModel`] wraps an ONNX Runtime session for an Ultralytics pose
//! export. The main loop only sees the [`PoseEstimator`] trait.

use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use image::RgbImage;
use ndarray::Array4;
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::TensorRef;

use crate::error::{PoseError, Result};
use crate::inference::InferenceConfig;
use crate::metadata::ModelMetadata;
use crate::postprocessing::postprocess_pose;
use crate::preprocessing::preprocess_frame;
use crate::results::{Results, Speed};

/// Anything that turns a frame into pose results.
pub trait PoseEstimator {
    /// Run pose estimation on one frame.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails.
    fn predict(&mut self, frame: &RgbImage) -> Result<Results>;
}

/// Metadata keys Ultralytics writes into the ONNX custom metadata.
const METADATA_KEYS: [&str; 9] = [
    "description",
    "version",
    "stride",
    "task",
    "batch",
    "imgsz",
    "names",
    "kpt_shape",
    "channels",
];

/// YOLO pose model backed by ONNX Runtime.
///
/// # Example
///
/// ```no_run
/// use pose_overlay::{PoseEstimator, YOLOPoseModel};
///
/// let mut model = YOLOPoseModel::load("yolo11n-pose.onnx")?;
/// let frame = image::RgbImage::new(1280, 720);
/// let results = model.predict(&frame)?;
/// println!("{}", results.verbose());
/// # Ok::<(), pose_overlay::PoseError>(())
/// ```
pub struct YOLOPoseModel {
    session: Session,
    metadata: ModelMetadata,
    input_name: String,
    output_name: String,
    config: InferenceConfig,
    warmed_up: bool,
}

impl YOLOPoseModel {
    /// Load a pose model with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, cannot be loaded, or is not a pose model.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with_config(path, InferenceConfig::default())
    }

    /// Load a pose model with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, cannot be loaded, or is not a pose model.
    pub fn load_with_config<P: AsRef<Path>>(path: P, config: InferenceConfig) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PoseError::ModelLoadError(format!(
                "Model file not found: {}",
                path.display()
            )));
        }

        let session = Session::builder()
            .map_err(|e| PoseError::ModelLoadError(format!("Failed to create session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| PoseError::ModelLoadError(format!("Failed to set optimization level: {e}")))?
            .with_intra_threads(config.num_threads)
            .map_err(|e| PoseError::ModelLoadError(format!("Failed to set intra-thread count: {e}")))?
            .commit_from_file(path)
            .map_err(|e| PoseError::ModelLoadError(format!("Failed to load model: {e}")))?;

        let metadata = Self::extract_metadata(&session)?;
        if !metadata.is_pose() {
            return Err(PoseError::ModelLoadError(format!(
                "{} is a '{}' model, a pose model is required",
                path.display(),
                metadata.task
            )));
        }

        let input_name = session
            .inputs
            .first()
            .map_or_else(|| "images".to_string(), |i| i.name.clone());
        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| PoseError::ModelLoadError("Model has no outputs".to_string()))?;

        let config = InferenceConfig {
            imgsz: config.imgsz.or(Some(metadata.imgsz)),
            ..config
        };

        Ok(Self {
            session,
            metadata,
            input_name,
            output_name,
            config,
            warmed_up: false,
        })
    }

    /// Read the Ultralytics metadata stored in the ONNX model.
    fn extract_metadata(session: &Session) -> Result<ModelMetadata> {
        let model_metadata = session
            .metadata()
            .map_err(|e| PoseError::ModelLoadError(format!("Failed to get model metadata: {e}")))?;

        let metadata_map: HashMap<String, String> = METADATA_KEYS
            .iter()
            .filter_map(|key| {
                model_metadata
                    .custom(key)
                    .ok()
                    .flatten()
                    .map(|value| ((*key).to_string(), value))
            })
            .collect();

        ModelMetadata::from_onnx_metadata(&metadata_map)
    }

    /// Run one dummy inference so the first camera frame is not slowed by
    /// graph initialization.
    ///
    /// # Errors
    ///
    /// Returns an error if the dummy inference fails.
    pub fn warmup(&mut self) -> Result<()> {
        if self.warmed_up {
            return Ok(());
        }
        let (h, w) = self.imgsz();
        let dummy = Array4::<f32>::zeros((1, 3, h, w));
        self.run_inference(&dummy)?;
        self.warmed_up = true;
        Ok(())
    }

    /// Run the ONNX session and return the first output as `(data, shape)`.
    fn run_inference(&mut self, input: &Array4<f32>) -> Result<(Vec<f32>, Vec<usize>)> {
        let input_contiguous = input.as_standard_layout();
        let input_tensor = TensorRef::from_array_view(&input_contiguous)
            .map_err(|e| PoseError::InferenceError(format!("Failed to create input tensor: {e}")))?;

        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => input_tensor])
            .map_err(|e| PoseError::InferenceError(format!("Inference failed: {e}")))?;

        let output = outputs.get(self.output_name.as_str()).ok_or_else(|| {
            PoseError::InferenceError(format!("Output '{}' not found", self.output_name))
        })?;

        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| PoseError::InferenceError(format!("Failed to extract output: {e}")))?;

        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        let shape: Vec<usize> = shape.iter().map(|&d| d.max(0) as usize).collect();
        Ok((data.to_vec(), shape))
    }

    /// Model input size (height, width) used for letterboxing.
    #[must_use]
    pub fn imgsz(&self) -> (usize, usize) {
        self.config.imgsz.unwrap_or(self.metadata.imgsz)
    }

    /// Model metadata.
    #[must_use]
    pub const fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}

impl PoseEstimator for YOLOPoseModel {
    fn predict(&mut self, frame: &RgbImage) -> Result<Results> {
        self.warmup()?;

        let start = Instant::now();
        let preprocess = preprocess_frame(frame, self.imgsz());
        let preprocess_time = start.elapsed().as_secs_f64() * 1000.0;

        let start = Instant::now();
        let (output, shape) = self.run_inference(&preprocess.tensor)?;
        let inference_time = start.elapsed().as_secs_f64() * 1000.0;

        let start = Instant::now();
        let mut results = postprocess_pose(
            &output,
            &shape,
            self.metadata.num_keypoints(),
            &preprocess,
            &self.config,
            Speed::new(preprocess_time, inference_time, 0.0),
        );
        results.speed.postprocess = Some(start.elapsed().as_secs_f64() * 1000.0);

        Ok(results)
    }
}

impl std::fmt::Debug for YOLOPoseModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YOLOPoseModel")
            .field("task", &self.metadata.task)
            .field("imgsz", &self.imgsz())
            .field("kpt_shape", &self.metadata.kpt_shape)
            .field("stride", &self.metadata.stride)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_not_found() {
        let result = YOLOPoseModel::load("nonexistent-pose.onnx");
        assert!(matches!(result, Err(PoseError::ModelLoadError(_))));
    }
}
