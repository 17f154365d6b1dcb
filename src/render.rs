//! Software rasterizer for the export path: burns every annotation's outline
//! and label into a copy of the working image.

use ab_glyph::{Font, FontArc, ScaleFont};
use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};

use crate::model::{Annotation, ShapeRecord};

/// Neither dimension of the working image may exceed this.
pub const MAX_DISPLAY_DIM: u32 = 800;

/// Vertical gap between a shape's top edge and its label.
const LABEL_OFFSET: f32 = 15.0;
const LABEL_SIZE: f32 = 14.0;

/// Downscale for interactive display: fit within the display bound while
/// keeping aspect ratio. Images already small enough pass through untouched
/// (never upscaled). Every shape coordinate in the session lives in the
/// space of the image this returns.
pub fn fit_to_display(img: DynamicImage) -> DynamicImage {
    if img.width() <= MAX_DISPLAY_DIM && img.height() <= MAX_DISPLAY_DIM {
        return img;
    }
    img.resize(MAX_DISPLAY_DIM, MAX_DISPLAY_DIM, FilterType::Lanczos3)
}

/// Render every annotation onto a copy of `base`.
///
/// Each shape is outlined in its own stroke color and width, and tagged with
/// a `"{category}: {note}"` label just above its bounding box in the same
/// color. Without a font the outlines still render and labels are skipped.
pub fn render_annotated(
    base: &RgbaImage,
    annotations: &[Annotation],
    font: Option<&FontArc>,
) -> RgbaImage {
    let mut img = base.clone();
    for ann in annotations {
        let color = ann.shape.stroke().to_rgba8();
        let stroke_width = ann.shape.stroke_width();
        match &ann.shape {
            ShapeRecord::Rect {
                left,
                top,
                width,
                height,
                ..
            } => {
                let (l, t) = (*left, *top);
                let (r, b) = (left + width, top + height);
                draw_segment(&mut img, (l, t), (r, t), stroke_width, color);
                draw_segment(&mut img, (r, t), (r, b), stroke_width, color);
                draw_segment(&mut img, (r, b), (l, b), stroke_width, color);
                draw_segment(&mut img, (l, b), (l, t), stroke_width, color);
            }
            ShapeRecord::Line { start, end, .. } => {
                draw_segment(&mut img, *start, *end, stroke_width, color);
            }
            ShapeRecord::Circle { center, radius, .. } => {
                draw_circle(&mut img, *center, *radius, stroke_width, color);
            }
            ShapeRecord::Freehand { points, .. } => {
                for pair in points.windows(2) {
                    draw_segment(&mut img, pair[0], pair[1], stroke_width, color);
                }
            }
        }
        if let Some(font) = font {
            let (min_x, min_y, _, _) = ann.shape.bounding_box();
            let label = format!("{}: {}", ann.category, ann.note);
            draw_label(&mut img, font, &label, (min_x, min_y), color);
        }
    }
    img
}

/// Walk the segment stamping a square of the stroke's half-width at each
/// step. Out-of-bounds pixels are clipped, not an error.
fn draw_segment(img: &mut RgbaImage, from: (f32, f32), to: (f32, f32), width: f32, color: [u8; 4]) {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let len = (dx * dx + dy * dy).sqrt();
    let steps = (len * 2.0).max(1.0) as i32;
    let reach = (width / 2.0).max(0.5) as i32;
    let (w, h) = (img.width() as i32, img.height() as i32);

    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        let cx = (from.0 + dx * t).round() as i32;
        let cy = (from.1 + dy * t).round() as i32;
        for oy in -reach..=reach {
            for ox in -reach..=reach {
                let (px, py) = (cx + ox, cy + oy);
                if px >= 0 && px < w && py >= 0 && py < h {
                    img.put_pixel(px as u32, py as u32, Rgba(color));
                }
            }
        }
    }
}

fn draw_circle(img: &mut RgbaImage, center: (f32, f32), radius: f32, width: f32, color: [u8; 4]) {
    let circumference = std::f32::consts::TAU * radius.abs();
    let steps = (circumference.ceil() as i32).max(16);
    let mut prev = (center.0 + radius, center.1);
    for i in 1..=steps {
        let angle = std::f32::consts::TAU * i as f32 / steps as f32;
        let next = (
            center.0 + radius * angle.cos(),
            center.1 + radius * angle.sin(),
        );
        draw_segment(img, prev, next, width, color);
        prev = next;
    }
}

fn draw_label(img: &mut RgbaImage, font: &FontArc, text: &str, anchor: (f32, f32), color: [u8; 4]) {
    let scaled = font.as_scaled(LABEL_SIZE);
    let baseline = anchor.1 - LABEL_OFFSET + scaled.ascent();
    let mut caret = anchor.0;
    let mut prev: Option<ab_glyph::GlyphId> = None;

    for ch in text.chars() {
        let gid = font.glyph_id(ch);
        if let Some(prev_id) = prev {
            caret += scaled.kern(prev_id, gid);
        }
        let glyph = gid.with_scale_and_position(LABEL_SIZE, ab_glyph::point(caret, baseline));
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|px, py, cov| {
                if cov < 0.05 {
                    return;
                }
                let x = bounds.min.x as i32 + px as i32;
                let y = bounds.min.y as i32 + py as i32;
                blend_pixel(img, x, y, color, cov);
            });
        }
        caret += scaled.h_advance(gid);
        prev = Some(gid);
    }
}

fn blend_pixel(img: &mut RgbaImage, x: i32, y: i32, color: [u8; 4], cov: f32) {
    if x < 0 || y < 0 || x >= img.width() as i32 || y >= img.height() as i32 {
        return;
    }
    let dst = img.get_pixel_mut(x as u32, y as u32);
    for c in 0..3 {
        dst.0[c] = (color[c] as f32 * cov + dst.0[c] as f32 * (1.0 - cov)).round() as u8;
    }
    dst.0[3] = 255;
}

/// Probe well-known system font locations for something to rasterize labels
/// with. `None` degrades rendering to outlines only.
pub fn label_font() -> Option<FontArc> {
    const CANDIDATES: &[&str] = &[
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ];
    for path in CANDIDATES {
        let Ok(bytes) = std::fs::read(path) else {
            continue;
        };
        match FontArc::try_from_vec(bytes) {
            Ok(font) => {
                log::debug!("label font: {path}");
                return Some(font);
            }
            Err(err) => log::warn!("unusable font {path}: {err}"),
        }
    }
    None
}
