// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! The capture → inference → annotate → display loop.

use ab_glyph::FontVec;

use crate::annotate::annotate;
use crate::error::Result;
use crate::model::PoseEstimator;
use crate::source::FrameSource;
use crate::visualizer::FrameSink;
use crate::{error, verbose};

/// Why the loop stopped without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The sink reported a quit request.
    Quit,
    /// The source failed to deliver a frame.
    CaptureFailed,
}

/// Summary of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopOutcome {
    /// Why the loop stopped.
    pub reason: StopReason,
    /// Frames annotated and shown.
    pub frames: usize,
}

/// Releases the source and closes the sink when dropped, on every exit path.
struct Cleanup<'a, S: FrameSource, K: FrameSink> {
    source: &'a mut S,
    sink: &'a mut K,
}

impl<S: FrameSource, K: FrameSink> Drop for Cleanup<'_, S, K> {
    fn drop(&mut self) {
        self.source.release();
        self.sink.close();
    }
}

/// Run the live loop until quit, capture failure or error.
///
/// Each iteration reads one frame, runs the model, annotates the frame, shows
/// it, then polls for quit. A capture failure is reported and ends the loop
/// normally. Model and display errors are returned. In all cases the source is
/// released and the sink closed exactly once before returning.
///
/// # Errors
///
/// Returns the first inference or display error.
pub fn run_loop<S, M, K>(
    source: &mut S,
    model: &mut M,
    sink: &mut K,
    font: Option<&FontVec>,
) -> Result<LoopOutcome>
where
    S: FrameSource,
    M: PoseEstimator,
    K: FrameSink,
{
    let mut guard = Cleanup { source, sink };
    let mut frames = 0;

    loop {
        let mut frame = match guard.source.read() {
            Ok(frame) => frame,
            Err(e) => {
                error!("Failed to capture frame: {e}");
                return Ok(LoopOutcome {
                    reason: StopReason::CaptureFailed,
                    frames,
                });
            }
        };

        let results = model.predict(&frame)?;
        let people = annotate(&mut frame, &results.detections(), font);
        frames += 1;

        verbose!(
            "frame {frames}: {}x{} {} ({people} drawn), {:.1}ms",
            frame.width(),
            frame.height(),
            results.verbose(),
            results.speed.total()
        );

        guard.sink.show(&frame)?;
        if guard.sink.quit_requested() {
            return Ok(LoopOutcome {
                reason: StopReason::Quit,
                frames,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PoseError;
    use crate::results::{Results, Speed};
    use image::RgbImage;

    struct FailingSource {
        released: usize,
    }

    impl FrameSource for FailingSource {
        fn read(&mut self) -> Result<RgbImage> {
            Err(PoseError::CaptureError("no device".to_string()))
        }

        fn release(&mut self) {
            self.released += 1;
        }
    }

    struct NoModel;

    impl PoseEstimator for NoModel {
        fn predict(&mut self, _frame: &RgbImage) -> Result<Results> {
            Ok(Results::new((4, 4), Speed::default()))
        }
    }

    #[derive(Default)]
    struct NullSink {
        closed: usize,
    }

    impl FrameSink for NullSink {
        fn show(&mut self, _frame: &RgbImage) -> Result<()> {
            Ok(())
        }

        fn quit_requested(&mut self) -> bool {
            true
        }

        fn close(&mut self) {
            self.closed += 1;
        }
    }

    #[test]
    fn test_first_read_failure() {
        let mut source = FailingSource { released: 0 };
        let mut sink = NullSink::default();

        let outcome = run_loop(&mut source, &mut NoModel, &mut sink, None).unwrap();

        assert_eq!(outcome.reason, StopReason::CaptureFailed);
        assert_eq!(outcome.frames, 0);
        assert_eq!(source.released, 1);
        assert_eq!(sink.closed, 1);
    }
}
