// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Display window for annotated frames.

use std::time::Duration;

use image::RgbImage;
use minifb::{Key, ScaleMode, Window, WindowOptions};

use crate::error::{PoseError, Result};
use crate::visualizer::Color;

/// Default window title.
pub const WINDOW_TITLE: &str = "YOLO11 Pose Detection";

/// Where annotated frames go, and where the quit signal comes from.
pub trait FrameSink {
    /// Present one frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be displayed.
    fn show(&mut self, frame: &RgbImage) -> Result<()>;

    /// Poll for the quit signal. Called once per frame after [`FrameSink::show`].
    fn quit_requested(&mut self) -> bool;

    /// Close the display. Called exactly once when the main loop stops.
    fn close(&mut self);
}

/// A resizable minifb window.
pub struct Viewer {
    window: Option<Window>,
    buffer: Vec<u32>,
}

impl Viewer {
    /// Create a resizable window with the given initial size.
    ///
    /// # Errors
    ///
    /// Returns an error if the window cannot be created.
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self> {
        let mut window = Window::new(
            title,
            width,
            height,
            WindowOptions {
                resize: true,
                scale_mode: ScaleMode::AspectRatioStretch,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| PoseError::VisualizerError(format!("Failed to create window: {e}")))?;

        // Key polling waits at most one millisecond per frame
        window.limit_update_rate(Some(Duration::from_millis(1)));

        Ok(Self {
            window: Some(window),
            buffer: Vec::new(),
        })
    }
}

impl FrameSink for Viewer {
    fn show(&mut self, frame: &RgbImage) -> Result<()> {
        let window = self
            .window
            .as_mut()
            .ok_or_else(|| PoseError::VisualizerError("Window already closed".to_string()))?;

        let (width, height) = (frame.width() as usize, frame.height() as usize);
        self.buffer.clear();
        self.buffer
            .extend(frame.pixels().map(|p| Color::from(*p).to_u32()));

        window
            .update_with_buffer(&self.buffer, width, height)
            .map_err(|e| PoseError::VisualizerError(format!("Failed to update window: {e}")))
    }

    fn quit_requested(&mut self) -> bool {
        self.window.as_ref().is_none_or(|window| {
            !window.is_open() || window.is_key_down(Key::Q) || window.is_key_down(Key::Escape)
        })
    }

    fn close(&mut self) {
        // Dropping the window destroys it
        self.window = None;
        self.buffer = Vec::new();
    }
}
