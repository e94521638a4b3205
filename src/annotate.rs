// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Frame annotation.
//!
//! Annotation is split in two steps. [`annotation_commands`] maps detections to
//! an ordered list of [`DrawCommand`]s without touching any pixels, and
//! [`render`] rasterizes those commands onto a frame. [`annotate`] runs both.
//!
//! For every person, in input order: the bounding box, the confidence label,
//! the keypoint markers with their joint names, then the skeleton limbs. The
//! people counter is drawn last.

use std::fs;
use std::path::{Path, PathBuf};

use ab_glyph::{FontVec, PxScale};
use image::RgbImage;
use imageproc::drawing::{
    draw_filled_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut, draw_text_mut,
};
use imageproc::rect::Rect;

use crate::download::{ASSETS_URL, download_file};
use crate::results::Detection;
use crate::visualizer::color::{BOX_COLOR, JOINT_LABEL_COLOR, KEYPOINT_COLOR, LIMB_COLOR};
use crate::visualizer::skeleton::{SKELETON, keypoint_name};
use crate::visualizer::Color;
use crate::warn;

/// Font used for all labels.
pub const DEFAULT_FONT: &str = "Arial.ttf";

/// DejaVu Sans, drawn when [`DEFAULT_FONT`] cannot be loaded.
const BUNDLED_FONT: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

/// Box and limb line thickness in pixels.
pub const LINE_THICKNESS: u32 = 2;

/// Keypoint marker radius in pixels.
pub const KEYPOINT_RADIUS: i32 = 4;

/// Vertical gap between a box's top edge and its label baseline.
pub const LABEL_OFFSET: i32 = 8;

/// Joint name offset from its keypoint marker.
pub const JOINT_LABEL_OFFSET: (i32, i32) = (5, -5);

/// Baseline position of the people counter.
pub const COUNT_ORIGIN: (i32, i32) = (10, 30);

/// Text heights in pixels.
const LABEL_SCALE: f32 = 16.0;
const JOINT_SCALE: f32 = 13.0;
const COUNT_SCALE: f32 = 32.0;

/// A single rendering instruction.
///
/// Coordinates are frame pixels. Text origins are baseline-left, so a label at
/// `(x, y)` sits just above row `y`.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Hollow rectangle between two inclusive corners.
    Rectangle {
        top_left: (i32, i32),
        bottom_right: (i32, i32),
        color: Color,
        thickness: u32,
    },
    /// Text anchored at its baseline-left corner.
    Text {
        text: String,
        origin: (i32, i32),
        scale: f32,
        color: Color,
    },
    /// Filled disc.
    FilledCircle {
        center: (i32, i32),
        radius: i32,
        color: Color,
    },
    /// Straight line segment.
    Line {
        start: (i32, i32),
        end: (i32, i32),
        color: Color,
        thickness: u32,
    },
}

/// The commands for one frame and the number of people they depict.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Annotation {
    /// Commands in drawing order.
    pub commands: Vec<DrawCommand>,
    /// Number of person detections.
    pub people_count: usize,
}

/// Map detections to drawing commands.
///
/// Non-person detections are skipped. A person without keypoints still gets a
/// box and a label. Skeleton limbs whose endpoints are outside the keypoint
/// list are skipped. The counter text is always the last command.
#[must_use]
pub fn annotation_commands(detections: &[Detection]) -> Annotation {
    let mut annotation = Annotation::default();

    for detection in detections.iter().filter(|d| d.is_person()) {
        annotation.people_count += 1;
        push_person(&mut annotation.commands, detection);
    }

    annotation.commands.push(DrawCommand::Text {
        text: format!("People detected: {}", annotation.people_count),
        origin: COUNT_ORIGIN,
        scale: COUNT_SCALE,
        color: BOX_COLOR,
    });

    annotation
}

fn push_person(commands: &mut Vec<DrawCommand>, detection: &Detection) {
    let bbox = detection.bbox;

    commands.push(DrawCommand::Rectangle {
        top_left: (bbox.x1, bbox.y1),
        bottom_right: (bbox.x2, bbox.y2),
        color: BOX_COLOR,
        thickness: LINE_THICKNESS,
    });
    commands.push(DrawCommand::Text {
        text: format!("Person {:.2}", detection.confidence),
        origin: (bbox.x1, bbox.y1.saturating_sub(LABEL_OFFSET)),
        scale: LABEL_SCALE,
        color: BOX_COLOR,
    });

    let Some(keypoints) = &detection.keypoints else {
        return;
    };

    for (j, keypoint) in keypoints.iter().enumerate() {
        let (x, y) = keypoint.pixel();
        commands.push(DrawCommand::FilledCircle {
            center: (x, y),
            radius: KEYPOINT_RADIUS,
            color: KEYPOINT_COLOR,
        });
        if let Some(name) = keypoint_name(j) {
            commands.push(DrawCommand::Text {
                text: name.to_string(),
                origin: (
                    x.saturating_add(JOINT_LABEL_OFFSET.0),
                    y.saturating_add(JOINT_LABEL_OFFSET.1),
                ),
                scale: JOINT_SCALE,
                color: JOINT_LABEL_COLOR,
            });
        }
    }

    for &(a, b) in &SKELETON {
        if let (Some(start), Some(end)) = (keypoints.get(a), keypoints.get(b)) {
            commands.push(DrawCommand::Line {
                start: start.pixel(),
                end: end.pixel(),
                color: LIMB_COLOR,
                thickness: LINE_THICKNESS,
            });
        }
    }
}

/// Rasterize commands onto `frame`.
///
/// Text is only drawn when a font is available. Geometry is clipped to the
/// frame before drawing, so coordinates anywhere in the `i32` range are safe.
pub fn render(frame: &mut RgbImage, commands: &[DrawCommand], font: Option<&FontVec>) {
    let bounds = (i64::from(frame.width()), i64::from(frame.height()));

    for command in commands {
        match command {
            DrawCommand::Rectangle {
                top_left,
                bottom_right,
                color,
                thickness,
            } => draw_thick_rect(frame, *top_left, *bottom_right, *color, *thickness),
            DrawCommand::Text {
                text,
                origin,
                scale,
                color,
            } => {
                if let Some(font) = font
                    && text_visible(bounds, text, *origin, *scale)
                {
                    #[allow(clippy::cast_possible_truncation)]
                    let top = origin.1.saturating_sub(scale.round() as i32);
                    draw_text_mut(frame, (*color).into(), origin.0, top, PxScale::from(*scale), font, text);
                }
            }
            DrawCommand::FilledCircle {
                center,
                radius,
                color,
            } => {
                if circle_visible(bounds, *center, *radius) {
                    draw_filled_circle_mut(frame, *center, *radius, (*color).into());
                }
            }
            DrawCommand::Line {
                start,
                end,
                color,
                thickness,
            } => draw_thick_line(frame, *start, *end, *color, *thickness),
        }
    }
}

/// Annotate a frame in place and return the number of people drawn.
pub fn annotate(frame: &mut RgbImage, detections: &[Detection], font: Option<&FontVec>) -> usize {
    let annotation = annotation_commands(detections);
    render(frame, &annotation.commands, font);
    annotation.people_count
}

/// Whether any glyph of `text` can land inside the frame.
///
/// Glyph advances are bounded by the pixel scale.
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn text_visible(bounds: (i64, i64), text: &str, origin: (i32, i32), scale: f32) -> bool {
    let size = f64::from(scale).ceil() as i64;
    let width = text.chars().count() as i64 * size;
    let (x, baseline) = (i64::from(origin.0), i64::from(origin.1));
    x < bounds.0 && x + width > 0 && baseline - size < bounds.1 && baseline + size > 0
}

fn circle_visible(bounds: (i64, i64), center: (i32, i32), radius: i32) -> bool {
    let (x, y, r) = (i64::from(center.0), i64::from(center.1), i64::from(radius));
    x - r < bounds.0 && x + r >= 0 && y - r < bounds.1 && y + r >= 0
}

/// Draw nested one-pixel rectangles growing inward.
///
/// Edges are clamped to one pixel outside the frame, so off-frame sides stay
/// invisible and visible sides keep their position.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn draw_thick_rect(
    frame: &mut RgbImage,
    top_left: (i32, i32),
    bottom_right: (i32, i32),
    color: Color,
    thickness: u32,
) {
    let max_x = i64::from(frame.width()).min(i64::from(i32::MAX));
    let max_y = i64::from(frame.height()).min(i64::from(i32::MAX));

    for t in 0..i64::from(thickness.max(1)) {
        let (x1, y1) = (i64::from(top_left.0) + t, i64::from(top_left.1) + t);
        let (x2, y2) = (i64::from(bottom_right.0) - t, i64::from(bottom_right.1) - t);
        if x2 < x1 || y2 < y1 {
            break;
        }
        if x1 > max_x || y1 > max_y || x2 < -1 || y2 < -1 {
            continue;
        }
        let (x1, x2) = (x1.clamp(-1, max_x), x2.clamp(-1, max_x));
        let (y1, y2) = (y1.clamp(-1, max_y), y2.clamp(-1, max_y));
        let rect = Rect::at(x1 as i32, y1 as i32).of_size((x2 - x1 + 1) as u32, (y2 - y1 + 1) as u32);
        draw_hollow_rect_mut(frame, rect, color.into());
    }
}

/// Draw parallel one-pixel segments, offset across the dominant direction.
#[allow(clippy::cast_possible_truncation)]
fn draw_thick_line(
    frame: &mut RgbImage,
    start: (i32, i32),
    end: (i32, i32),
    color: Color,
    thickness: u32,
) {
    let (sx, sy) = (f64::from(start.0), f64::from(start.1));
    let (ex, ey) = (f64::from(end.0), f64::from(end.1));
    let mostly_horizontal = (ex - sx).abs() >= (ey - sy).abs();
    let limits = (f64::from(frame.width()), f64::from(frame.height()));

    for t in 0..thickness.max(1) {
        let t = f64::from(t);
        let (dx, dy) = if mostly_horizontal { (0.0, t) } else { (t, 0.0) };
        if let Some((a, b)) = clip_segment((sx + dx, sy + dy), (ex + dx, ey + dy), limits) {
            draw_line_segment_mut(
                frame,
                (a.0 as f32, a.1 as f32),
                (b.0 as f32, b.1 as f32),
                color.into(),
            );
        }
    }
}

/// Clip a segment to `[-1, limit]` on both axes (Liang-Barsky).
///
/// Segments already inside are returned unchanged.
fn clip_segment(
    start: (f64, f64),
    end: (f64, f64),
    limits: (f64, f64),
) -> Option<((f64, f64), (f64, f64))> {
    let (dx, dy) = (end.0 - start.0, end.1 - start.1);
    let (mut t0, mut t1) = (0.0f64, 1.0f64);

    for (p, q) in [
        (-dx, start.0 + 1.0),
        (dx, limits.0 - start.0),
        (-dy, start.1 + 1.0),
        (dy, limits.1 - start.1),
    ] {
        if p.abs() < f64::EPSILON {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }

    Some((
        (dx.mul_add(t0, start.0), dy.mul_add(t0, start.1)),
        (dx.mul_add(t1, start.0), dy.mul_add(t1, start.1)),
    ))
}

/// Check if the font exists in the Ultralytics config directory, downloading it
/// if needed.
pub fn check_font(font: &str) -> Option<PathBuf> {
    let font_name = font_file_name(font)?;
    let config_dir = dirs::config_dir()?.join("Ultralytics");
    let font_path = config_dir.join(&font_name);

    if font_path.exists() {
        return Some(font_path);
    }

    if let Err(e) = fs::create_dir_all(&config_dir) {
        warn!("Failed to create config directory: {e}");
        return None;
    }

    match download_file(&format!("{ASSETS_URL}/{font_name}"), &font_path) {
        Ok(()) => Some(font_path),
        Err(e) => {
            warn!("{e}");
            None
        }
    }
}

/// Bare file name of a font path; the assets release is flat.
fn font_file_name(font: &str) -> Option<String> {
    Path::new(font)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

/// The font compiled into the binary.
#[must_use]
pub fn bundled_font() -> Option<FontVec> {
    FontVec::try_from_vec(BUNDLED_FONT.to_vec()).ok()
}

/// Load the label font, falling back to the bundled font when it cannot be
/// found, fetched or parsed.
#[must_use]
pub fn load_font(font: &str) -> Option<FontVec> {
    check_font(font)
        .and_then(|path| fs::read(path).ok())
        .and_then(|data| FontVec::try_from_vec(data).ok())
        .or_else(|| {
            warn!("Font '{font}' unavailable, using bundled font");
            bundled_font()
        })
}
