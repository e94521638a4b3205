// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Error types for the pose overlay.

use std::fmt;

/// Result type alias for pose overlay operations.
pub type Result<T> = std::result::Result<T, PoseError>;

/// Main error type for the pose overlay.
#[derive(Debug)]
pub enum PoseError {
    /// Error loading the ONNX pose model.
    ModelLoadError(String),
    /// Error during model inference.
    InferenceError(String),
    /// Error processing or decoding images.
    ImageError(String),
    /// Camera could not be opened or a frame could not be read.
    CaptureError(String),
    /// Window creation or update failed.
    VisualizerError(String),
    /// Model or font download failed.
    DownloadError(String),
    /// Invalid configuration provided.
    ConfigError(String),
    /// Wrapped `std::io::Error`.
    Io(std::io::Error),
}

impl fmt::Display for PoseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModelLoadError(msg) => write!(f, "Model load error: {msg}"),
            Self::InferenceError(msg) => write!(f, "Inference error: {msg}"),
            Self::ImageError(msg) => write!(f, "Image error: {msg}"),
            Self::CaptureError(msg) => write!(f, "Capture error: {msg}"),
            Self::VisualizerError(msg) => write!(f, "Visualizer error: {msg}"),
            Self::DownloadError(msg) => write!(f, "Download error: {msg}"),
            Self::ConfigError(msg) => write!(f, "Config error: {msg}"),
            Self::Io(err) => write!(f, "IO error: {err}"),
        }
    }
}

impl std::error::Error for PoseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PoseError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<image::ImageError> for PoseError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PoseError::ModelLoadError("test".to_string());
        assert_eq!(err.to_string(), "Model load error: test");

        let err = PoseError::CaptureError("Could not open camera 0".to_string());
        assert_eq!(err.to_string(), "Capture error: Could not open camera 0");
    }

    #[test]
    fn test_io_error_source() {
        use std::error::Error;

        let err = PoseError::from(std::io::Error::other("device busy"));
        assert!(matches!(err, PoseError::Io(_)));
        assert!(err.source().is_some());
        assert!(PoseError::ConfigError("x".to_string()).source().is_none());
    }
}
