// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Frame preprocessing for pose inference.
//!
//! Camera frames are letterboxed to the model input size (aspect-preserving
//! resize, centered, grey padding), normalized to `[0, 1]` and laid out as an
//! NCHW tensor. The scale and padding are kept so that model coordinates can be
//! mapped back onto the original frame.

#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use ndarray::Array4;

/// Padding value used by Ultralytics letterboxing.
const PAD_VALUE: u8 = 114;

/// Result of preprocessing a frame, containing the tensor and transform info.
#[derive(Debug, Clone)]
pub struct PreprocessResult {
    /// Preprocessed image tensor in NCHW format, normalized to [0, 1].
    pub tensor: Array4<f32>,
    /// Original frame dimensions (height, width).
    pub orig_shape: (u32, u32),
    /// Scale factors applied (`scale_y`, `scale_x`).
    pub scale: (f32, f32),
    /// Padding applied (`pad_top`, `pad_left`).
    pub padding: (f32, f32),
}

/// Letterbox a frame to `target_size` (height, width) and convert it to a tensor.
#[must_use]
pub fn preprocess_frame(frame: &RgbImage, target_size: (usize, usize)) -> PreprocessResult {
    let (orig_width, orig_height) = frame.dimensions();
    let (new_width, new_height, pad_left, pad_top, scale) =
        calculate_letterbox_params(orig_width, orig_height, target_size);

    let resized = imageops::resize(frame, new_width, new_height, FilterType::Triangle);

    let mut canvas = RgbImage::from_pixel(
        target_size.1 as u32,
        target_size.0 as u32,
        Rgb([PAD_VALUE; 3]),
    );
    imageops::replace(&mut canvas, &resized, i64::from(pad_left), i64::from(pad_top));

    PreprocessResult {
        tensor: image_to_tensor(&canvas),
        orig_shape: (orig_height, orig_width),
        scale,
        padding: (pad_top as f32, pad_left as f32),
    }
}

/// Calculate letterbox parameters for resizing.
///
/// Returns `(new_width, new_height, pad_left, pad_top, (scale_y, scale_x))`.
fn calculate_letterbox_params(
    orig_width: u32,
    orig_height: u32,
    target_size: (usize, usize),
) -> (u32, u32, u32, u32, (f32, f32)) {
    let (target_h, target_w) = (target_size.0 as f32, target_size.1 as f32);
    let (orig_h, orig_w) = (orig_height as f32, orig_width as f32);

    let scale = (target_h / orig_h).min(target_w / orig_w);

    let new_w = ((orig_w * scale).round() as u32).max(1);
    let new_h = ((orig_h * scale).round() as u32).max(1);

    // Center alignment: padding split equally on both sides
    let pad_left = (target_size.1 as u32).saturating_sub(new_w) / 2;
    let pad_top = (target_size.0 as u32).saturating_sub(new_h) / 2;

    let scale_x = new_w as f32 / orig_w;
    let scale_y = new_h as f32 / orig_h;

    (new_w, new_h, pad_left, pad_top, (scale_y, scale_x))
}

/// Convert an RGB image to a normalized NCHW tensor.
fn image_to_tensor(image: &RgbImage) -> Array4<f32> {
    let (width, height) = image.dimensions();
    let (w, h) = (width as usize, height as usize);

    let mut tensor = Array4::zeros((1, 3, h, w));
    for (x, y, pixel) in image.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        tensor[[0, 0, y, x]] = f32::from(pixel[0]) / 255.0;
        tensor[[0, 1, y, x]] = f32::from(pixel[1]) / 255.0;
        tensor[[0, 2, y, x]] = f32::from(pixel[2]) / 255.0;
    }

    tensor
}

/// Scale coordinates from model input space back to original frame space.
///
/// # Arguments
///
/// * `coords` - Coordinates in model space `[x1, y1, x2, y2]`.
/// * `scale` - Scale factors (`scale_y`, `scale_x`) from preprocessing.
/// * `padding` - Padding (`pad_top`, `pad_left`) from preprocessing.
#[must_use]
pub fn scale_coords(coords: &[f32; 4], scale: (f32, f32), padding: (f32, f32)) -> [f32; 4] {
    let (scale_y, scale_x) = scale;
    let (pad_top, pad_left) = padding;

    [
        (coords[0] - pad_left) / scale_x,
        (coords[1] - pad_top) / scale_y,
        (coords[2] - pad_left) / scale_x,
        (coords[3] - pad_top) / scale_y,
    ]
}

/// Clip box coordinates `[x1, y1, x2, y2]` to a frame of shape (height, width).
#[must_use]
pub const fn clip_coords(coords: &[f32; 4], shape: (u32, u32)) -> [f32; 4] {
    let (h, w) = (shape.0 as f32, shape.1 as f32);
    [
        coords[0].clamp(0.0, w),
        coords[1].clamp(0.0, h),
        coords[2].clamp(0.0, w),
        coords[3].clamp(0.0, h),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letterbox_params_square() {
        let (new_w, new_h, pad_left, pad_top, _) = calculate_letterbox_params(640, 640, (640, 640));
        assert_eq!((new_w, new_h), (640, 640));
        assert_eq!((pad_left, pad_top), (0, 0));
    }

    #[test]
    fn test_letterbox_params_wide() {
        // 1280x720 camera frame into 640x640: width fits, height is padded
        let (new_w, new_h, pad_left, pad_top, (scale_y, scale_x)) =
            calculate_letterbox_params(1280, 720, (640, 640));
        assert_eq!((new_w, new_h), (640, 360));
        assert_eq!((pad_left, pad_top), (0, 140));
        assert!((scale_x - 0.5).abs() < 1e-6);
        assert!((scale_y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_preprocess_frame_shape_and_padding() {
        let frame = RgbImage::from_pixel(128, 64, Rgb([255, 0, 0]));
        let result = preprocess_frame(&frame, (64, 64));

        assert_eq!(result.tensor.shape(), &[1, 3, 64, 64]);
        assert_eq!(result.orig_shape, (64, 128));
        assert!((result.padding.0 - 16.0).abs() < 1e-6);

        // Top rows are padding, center rows carry the red frame
        let pad = f32::from(PAD_VALUE) / 255.0;
        assert!((result.tensor[[0, 0, 0, 10]] - pad).abs() < 1e-6);
        assert!((result.tensor[[0, 0, 32, 10]] - 1.0).abs() < 1e-6);
        assert!(result.tensor[[0, 1, 32, 10]].abs() < 1e-6);
    }

    #[test]
    fn test_scale_coords() {
        let scaled = scale_coords(&[100.0, 100.0, 200.0, 200.0], (1.0, 1.0), (10.0, 10.0));
        assert!((scaled[0] - 90.0).abs() < 1e-6);
        assert!((scaled[1] - 90.0).abs() < 1e-6);
        assert!((scaled[2] - 190.0).abs() < 1e-6);
        assert!((scaled[3] - 190.0).abs() < 1e-6);
    }

    #[test]
    fn test_clip_coords() {
        let clipped = clip_coords(&[-10.0, -20.0, 700.0, 500.0], (480, 640));
        assert_eq!(clipped, [0.0, 0.0, 640.0, 480.0]);
    }
}
