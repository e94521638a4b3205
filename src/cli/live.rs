// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use crate::annotate::{DEFAULT_FONT, load_font};
use crate::cli::args::Cli;
use crate::download::resolve_model;
use crate::error::Result;
use crate::runner::{LoopOutcome, run_loop};
use crate::source::{CaptureConfig, V4l2Camera};
use crate::visualizer::viewer::{Viewer, WINDOW_TITLE};
use crate::{InferenceConfig, VERSION, YOLOPoseModel, error, info, verbose};

/// Run live pose detection on a camera until quit or capture failure.
///
/// A camera that cannot be opened is reported and yields `Ok(None)`; no window
/// or model is created in that case.
///
/// # Errors
///
/// Returns an error if the options are invalid, if the window or model cannot
/// be set up, or if inference or display fails while running.
pub fn run_live(args: &Cli) -> Result<Option<LoopOutcome>> {
    args.validate()?;

    let capture = CaptureConfig {
        index: args.camera,
        width: args.width,
        height: args.height,
    };
    let mut camera = match V4l2Camera::open(&capture) {
        Ok(camera) => camera,
        Err(e) => {
            error!("Could not open camera: {e}");
            return Ok(None);
        }
    };
    let (width, height) = camera.resolution();
    verbose!("Capturing {width}x{height} from {}", capture.device_path());

    let mut viewer = Viewer::new(WINDOW_TITLE, args.width as usize, args.height as usize)?;

    info!("Loading YOLO pose model...");
    let mut config = InferenceConfig::new()
        .with_confidence(args.conf)
        .with_iou(args.iou)
        .with_max_detections(args.max_det)
        .with_threads(args.threads);
    if let Some(sz) = args.imgsz {
        config = config.with_imgsz(sz, sz);
    }
    let model_path = resolve_model(&args.model)?;
    let mut model = YOLOPoseModel::load_with_config(model_path, config)?;
    model.warmup()?;

    let imgsz = model.imgsz();
    let metadata = model.metadata();
    verbose!(
        "Ultralytics {VERSION} 🚀 pose model: {} keypoints, {} classes, imgsz=({}, {}), stride {}",
        metadata.num_keypoints(),
        metadata.num_classes(),
        imgsz.0,
        imgsz.1,
        metadata.stride
    );
    if !metadata.description.is_empty() {
        verbose!("{} (exported with {})", metadata.description, metadata.version);
    }

    let font = load_font(DEFAULT_FONT);

    info!("Starting pose detection. Press 'q' to quit.");
    let outcome = run_loop(&mut camera, &mut model, &mut viewer, font.as_ref());
    info!("Pose detection stopped.");

    let outcome = outcome?;
    verbose!("{} frames processed", outcome.frames);
    Ok(Some(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_missing_camera_is_not_an_error() {
        // /dev/video250 does not exist, so nothing past the camera is touched.
        let args = Cli::parse_from(["app", "-c", "250"]);
        assert!(matches!(run_live(&args), Ok(None)));
    }

    #[test]
    fn test_invalid_options_fail_before_camera() {
        let args = Cli::parse_from(["app", "-c", "250", "--conf", "2"]);
        assert!(run_live(&args).is_err());
    }
}
