// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use image::Rgb;

/// Color type for visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub u8, pub u8, pub u8);

impl Color {
    /// Red color.
    pub const RED: Color = Color(255, 0, 0);
    /// Green color.
    pub const GREEN: Color = Color(0, 255, 0);
    /// Blue color.
    pub const BLUE: Color = Color(0, 0, 255);
    /// Yellow color.
    pub const YELLOW: Color = Color(255, 255, 0);

    /// Create a new color from RGB values.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self(r, g, b)
    }

    /// Pack as `0x00RRGGBB`, the pixel layout minifb expects.
    #[must_use]
    pub const fn to_u32(self) -> u32 {
        ((self.0 as u32) << 16) | ((self.1 as u32) << 8) | self.2 as u32
    }
}

impl From<Color> for Rgb<u8> {
    fn from(color: Color) -> Self {
        Rgb([color.0, color.1, color.2])
    }
}

impl From<Rgb<u8>> for Color {
    fn from(pixel: Rgb<u8>) -> Self {
        Self(pixel[0], pixel[1], pixel[2])
    }
}

/// Person bounding boxes, confidence labels and the people counter.
pub const BOX_COLOR: Color = Color::GREEN;

/// Keypoint markers.
pub const KEYPOINT_COLOR: Color = Color::RED;

/// Joint name labels.
pub const JOINT_LABEL_COLOR: Color = Color::YELLOW;

/// Skeleton limbs.
pub const LIMB_COLOR: Color = Color::BLUE;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_u32() {
        assert_eq!(Color::RED.to_u32(), 0x00FF_0000);
        assert_eq!(Color::new(0x12, 0x34, 0x56).to_u32(), 0x0012_3456);
    }

    #[test]
    fn test_rgb_conversion() {
        let rgb: Rgb<u8> = Color::YELLOW.into();
        assert_eq!(rgb, Rgb([255, 255, 0]));
        assert_eq!(Color::from(rgb), Color::YELLOW);
    }

    #[test]
    fn test_overlay_colors_are_distinct() {
        let colors = [BOX_COLOR, KEYPOINT_COLOR, JOINT_LABEL_COLOR, LIMB_COLOR];
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
