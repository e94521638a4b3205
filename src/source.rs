// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Frame sources for the live loop.
//!
//! [`FrameSource`] is the capture seam the main loop is written against.
//! [`V4l2Camera`] implements it for Video4Linux devices.

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]

use image::{ImageFormat, RgbImage};
use v4l::buffer::Type;
use v4l::format::FourCC;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::Device;

use crate::error::{PoseError, Result};
use crate::verbose;

/// Number of memory-mapped capture buffers.
const NUM_BUFFERS: u32 = 4;

/// Something that yields RGB frames until it fails or is released.
pub trait FrameSource {
    /// Read the next frame.
    ///
    /// # Errors
    ///
    /// Returns an error if no frame could be captured.
    fn read(&mut self) -> Result<RgbImage>;

    /// Release the underlying device. Calling it again is a no-op.
    fn release(&mut self);
}

/// Camera selection and requested resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConfig {
    /// Camera index, opened as `/dev/video{index}`.
    pub index: usize,
    /// Requested frame width. The driver may pick the nearest supported size.
    pub width: u32,
    /// Requested frame height.
    pub height: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            index: 0,
            width: 1280,
            height: 720,
        }
    }
}

impl CaptureConfig {
    /// Device node path for this camera.
    #[must_use]
    pub fn device_path(&self) -> String {
        format!("/dev/video{}", self.index)
    }
}

/// Pixel layouts the camera can be decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PixelLayout {
    Mjpg,
    Yuyv,
}

impl PixelLayout {
    fn from_fourcc(fourcc: FourCC) -> Result<Self> {
        match &fourcc.repr {
            b"MJPG" => Ok(Self::Mjpg),
            b"YUYV" => Ok(Self::Yuyv),
            _ => Err(PoseError::CaptureError(format!(
                "Unsupported camera pixel format: {fourcc}"
            ))),
        }
    }
}

/// Open device state. The stream is declared first so it is dropped first.
struct Active {
    stream: Stream<'static>,
    _device: Device,
}

/// A Video4Linux camera streaming through memory-mapped buffers.
pub struct V4l2Camera {
    active: Option<Active>,
    layout: PixelLayout,
    width: u32,
    height: u32,
}

impl V4l2Camera {
    /// Open a camera and start streaming.
    ///
    /// MJPG is requested at the configured size. If the driver keeps another
    /// format, YUYV is accepted too.
    ///
    /// # Errors
    ///
    /// Returns a `CaptureError` if the device cannot be opened or configured,
    /// or delivers a pixel format that cannot be decoded.
    pub fn open(config: &CaptureConfig) -> Result<Self> {
        let path = config.device_path();
        let device = Device::with_path(&path)
            .map_err(|e| PoseError::CaptureError(format!("Cannot open camera {path}: {e}")))?;

        let mut format = device
            .format()
            .map_err(|e| PoseError::CaptureError(format!("Cannot query camera format: {e}")))?;
        format.fourcc = FourCC::new(b"MJPG");
        format.width = config.width;
        format.height = config.height;

        let actual = device
            .set_format(&format)
            .map_err(|e| PoseError::CaptureError(format!("Cannot set camera format: {e}")))?;
        let layout = PixelLayout::from_fourcc(actual.fourcc)?;

        let stream = Stream::with_buffers(&device, Type::VideoCapture, NUM_BUFFERS)
            .map_err(|e| PoseError::CaptureError(format!("Cannot start camera stream: {e}")))?;

        verbose!(
            "Camera {path} opened at {}x{} [{}]",
            actual.width,
            actual.height,
            actual.fourcc
        );

        Ok(Self {
            active: Some(Active {
                stream,
                _device: device,
            }),
            layout,
            width: actual.width,
            height: actual.height,
        })
    }

    /// Negotiated frame size as `(width, height)`.
    #[must_use]
    pub const fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl FrameSource for V4l2Camera {
    fn read(&mut self) -> Result<RgbImage> {
        let active = self
            .active
            .as_mut()
            .ok_or_else(|| PoseError::CaptureError("Camera already released".to_string()))?;

        let (data, _) = active
            .stream
            .next()
            .map_err(|e| PoseError::CaptureError(format!("Camera read failed: {e}")))?;

        match self.layout {
            PixelLayout::Mjpg => Ok(image::load_from_memory_with_format(data, ImageFormat::Jpeg)?
                .to_rgb8()),
            PixelLayout::Yuyv => yuyv_to_rgb(data, self.width, self.height),
        }
    }

    fn release(&mut self) {
        if self.active.take().is_some() {
            verbose!("Camera released");
        }
    }
}

impl Drop for V4l2Camera {
    fn drop(&mut self) {
        self.release();
    }
}

/// Convert packed YUYV (4:2:2) to RGB with BT.601 coefficients.
///
/// Every 4 bytes `[Y0, U, Y1, V]` describe two horizontally adjacent pixels.
///
/// # Errors
///
/// Returns a `CaptureError` if the buffer is shorter than one full frame.
pub fn yuyv_to_rgb(yuyv: &[u8], width: u32, height: u32) -> Result<RgbImage> {
    let expected = width as usize * height as usize * 2;
    if yuyv.len() < expected {
        return Err(PoseError::CaptureError(format!(
            "Truncated YUYV frame: {} bytes, expected {expected}",
            yuyv.len()
        )));
    }

    let mut out = RgbImage::new(width, height);
    for (chunk, dst) in yuyv[..expected].chunks_exact(4).zip(out.chunks_exact_mut(6)) {
        let u = f32::from(chunk[1]) - 128.0;
        let v = f32::from(chunk[3]) - 128.0;
        dst[..3].copy_from_slice(&bt601(f32::from(chunk[0]), u, v));
        dst[3..].copy_from_slice(&bt601(f32::from(chunk[2]), u, v));
    }
    Ok(out)
}

fn bt601(y: f32, u: f32, v: f32) -> [u8; 3] {
    let r = 1.402f32.mul_add(v, y);
    let g = 0.714_136f32.mul_add(-v, 0.344_136f32.mul_add(-u, y));
    let b = 1.772f32.mul_add(u, y);
    [
        r.clamp(0.0, 255.0) as u8,
        g.clamp(0.0, 255.0) as u8,
        b.clamp(0.0, 255.0) as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_default_capture_config() {
        let config = CaptureConfig::default();
        assert_eq!((config.width, config.height), (1280, 720));
        assert_eq!(config.device_path(), "/dev/video0");
    }

    #[test]
    fn test_yuyv_grey() {
        // Neutral chroma gives grey pixels equal to luma
        let data = [50, 128, 200, 128, 0, 128, 255, 128];
        let rgb = yuyv_to_rgb(&data, 2, 2).unwrap();
        assert_eq!(*rgb.get_pixel(0, 0), Rgb([50, 50, 50]));
        assert_eq!(*rgb.get_pixel(1, 0), Rgb([200, 200, 200]));
        assert_eq!(*rgb.get_pixel(0, 1), Rgb([0, 0, 0]));
        assert_eq!(*rgb.get_pixel(1, 1), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_yuyv_red_chroma() {
        let rgb = yuyv_to_rgb(&[76, 85, 76, 255], 2, 1).unwrap();
        let Rgb([r, g, b]) = *rgb.get_pixel(0, 0);
        assert!(r > 240, "r = {r}");
        assert!(g < 10, "g = {g}");
        assert!(b < 10, "b = {b}");
    }

    #[test]
    fn test_yuyv_truncated() {
        assert!(matches!(
            yuyv_to_rgb(&[0; 6], 2, 2),
            Err(PoseError::CaptureError(_))
        ));
    }

    #[test]
    fn test_fourcc_layout() {
        assert_eq!(
            PixelLayout::from_fourcc(FourCC::new(b"YUYV")).unwrap(),
            PixelLayout::Yuyv
        );
        assert!(PixelLayout::from_fourcc(FourCC::new(b"NV12")).is_err());
    }

    #[test]
    fn test_missing_camera() {
        let config = CaptureConfig {
            index: 250,
            ..CaptureConfig::default()
        };
        assert!(matches!(
            V4l2Camera::open(&config),
            Err(PoseError::CaptureError(_))
        ));
    }
}
