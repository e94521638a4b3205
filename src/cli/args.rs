// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use crate::download::DEFAULT_MODEL;
use crate::error::{PoseError, Result};
use clap::Parser;

/// CLI arguments parser.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"Examples:
    pose-overlay
    pose-overlay --camera 1 --width 640 --height 480
    pose-overlay -m yolo11s-pose.onnx --conf 0.5
    pose-overlay --imgsz 320 --verbose
    pose-overlay --max-det 5 --threads 2

Press 'q' or Escape in the window to quit."#)]
pub struct Cli {
    /// Camera index, opened as /dev/video<N>
    #[arg(short, long, default_value_t = 0)]
    pub camera: usize,

    /// Requested capture width and initial window width
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Requested capture height and initial window height
    #[arg(long, default_value_t = 720)]
    pub height: u32,

    /// Path to ONNX pose model file
    #[arg(short, long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Confidence threshold
    #[arg(long, default_value_t = 0.25)]
    pub conf: f32,

    /// `IoU` threshold for NMS
    #[arg(long, default_value_t = 0.45)]
    pub iou: f32,

    /// Inference image size (defaults to the model's)
    #[arg(long)]
    pub imgsz: Option<usize>,

    /// Maximum number of people per frame
    #[arg(long, default_value_t = 300)]
    pub max_det: usize,

    /// ONNX Runtime intra-op threads (0 = auto)
    #[arg(long, default_value_t = 0)]
    pub threads: usize,

    /// Print per-frame detections and timings
    #[arg(long, default_value_t = false)]
    pub verbose: bool,
}

impl Cli {
    /// Reject out-of-range thresholds and zero sizes.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` naming the first invalid option.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("conf", self.conf), ("iou", self.iou)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(PoseError::ConfigError(format!(
                    "--{name} must be between 0 and 1, got {value}"
                )));
            }
        }
        if self.width == 0 || self.height == 0 {
            return Err(PoseError::ConfigError(format!(
                "Capture size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.imgsz == Some(0) {
            return Err(PoseError::ConfigError("--imgsz must be non-zero".to_string()));
        }
        if self.max_det == 0 {
            return Err(PoseError::ConfigError("--max-det must be non-zero".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_args_defaults() {
        let args = Cli::parse_from(["app"]);
        assert_eq!(args.camera, 0);
        assert_eq!((args.width, args.height), (1280, 720));
        assert_eq!(args.model, "yolo11n-pose.onnx");
        assert!((args.conf - 0.25).abs() < f32::EPSILON);
        assert!((args.iou - 0.45).abs() < f32::EPSILON);
        assert!(args.imgsz.is_none());
        assert_eq!(args.max_det, 300);
        assert_eq!(args.threads, 0);
        assert!(!args.verbose);
    }

    #[test]
    fn test_args_custom() {
        let args = Cli::parse_from([
            "app",
            "-c",
            "2",
            "--width",
            "640",
            "--height",
            "480",
            "-m",
            "custom-pose.onnx",
            "--conf",
            "0.8",
            "--imgsz",
            "320",
            "--max-det",
            "5",
            "--threads",
            "2",
            "--verbose",
        ]);
        assert_eq!(args.camera, 2);
        assert_eq!((args.width, args.height), (640, 480));
        assert_eq!(args.model, "custom-pose.onnx");
        assert!((args.conf - 0.8).abs() < f32::EPSILON);
        assert_eq!(args.imgsz, Some(320));
        assert_eq!(args.max_det, 5);
        assert_eq!(args.threads, 2);
        assert!(args.verbose);
    }

    #[test]
    fn test_validate() {
        assert!(Cli::parse_from(["app"]).validate().is_ok());
        assert!(matches!(
            Cli::parse_from(["app", "--conf", "1.5"]).validate(),
            Err(PoseError::ConfigError(_))
        ));
        assert!(Cli::parse_from(["app", "--width", "0"]).validate().is_err());
        assert!(Cli::parse_from(["app", "--imgsz", "0"]).validate().is_err());
        assert!(Cli::parse_from(["app", "--max-det", "0"]).validate().is_err());
        assert!(Cli::parse_from(["app", "--threads", "0"]).validate().is_ok());
    }
}
