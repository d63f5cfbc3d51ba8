//! Low-fidelity first-page preview.
//!
//! Text is drawn as placeholder glyph boxes rather than real outlines:
//! template spans in their original color, minus the redacted ones, plus
//! the substituted values at their area anchors.

use tiny_skia::{Color, Paint, Pixmap, Rect, Transform};

use super::writer::{PageEdit, DEFAULT_FONT_SIZE};
use crate::error::{Error, Result};
use crate::model::{BBox, Rgb};
use crate::parser::content::{ASCENT, AVG_CHAR_WIDTH, DESCENT};
use crate::parser::PageExtraction;

/// Preview rendering options.
#[derive(Debug, Clone)]
pub struct PreviewOptions {
    /// Dots per inch (default: 72)
    pub dpi: u32,
    /// Background color (None for transparent)
    pub background: Option<[f32; 4]>,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            dpi: 72,
            background: Some([1.0, 1.0, 1.0, 1.0]),
        }
    }
}

impl PreviewOptions {
    /// Create options with custom DPI.
    pub fn with_dpi(dpi: u32) -> Self {
        Self {
            dpi,
            ..Default::default()
        }
    }
}

/// Render the page with edits applied and encode it as PNG.
pub fn render_preview(
    page: &PageExtraction,
    edit: &PageEdit,
    options: &PreviewOptions,
) -> Result<Vec<u8>> {
    let scale = options.dpi.max(1) as f32 / 72.0;
    let width = (page.size.width * scale).ceil().max(1.0) as u32;
    let height = (page.size.height * scale).ceil().max(1.0) as u32;

    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| Error::Render(format!("Failed to create pixmap {}x{}", width, height)))?;

    if let Some([r, g, b, a]) = options.background {
        pixmap.fill(Color::from_rgba(r, g, b, a).unwrap_or(Color::WHITE));
    }

    // Page space already has a top-left origin; only scale.
    let transform = Transform::from_scale(scale, scale);

    for span in &page.spans {
        let (cx, cy) = span.bbox.center();
        if edit
            .redactions
            .iter()
            .any(|r| r.contains_point(cx, cy, 1.0))
        {
            continue;
        }
        let baseline = span.bbox.y1 - DESCENT * span.font_size;
        draw_glyphs(
            &mut pixmap,
            &span.text,
            span.bbox.x0,
            baseline,
            span.font_size,
            span.color,
            transform,
        );
    }

    for insertion in &edit.insertions {
        let size = if insertion.style.font_size > 0.0 {
            insertion.style.font_size
        } else {
            DEFAULT_FONT_SIZE
        };
        let baseline = insertion.bbox.y0 + ASCENT * size;
        draw_glyphs(
            &mut pixmap,
            &insertion.text,
            insertion.bbox.x0,
            baseline,
            size,
            insertion.style.color,
            transform,
        );
    }

    pixmap
        .encode_png()
        .map_err(|e| Error::Render(format!("PNG encoding failed: {}", e)))
}

/// Draw one box per visible character, sized by character class.
fn draw_glyphs(
    pixmap: &mut Pixmap,
    text: &str,
    x: f32,
    baseline: f32,
    font_size: f32,
    color: Rgb,
    transform: Transform,
) {
    let mut paint = Paint::default();
    let (r, g, b) = color.to_rgb8();
    paint.set_color_rgba8(r, g, b, 255);
    paint.anti_alias = true;

    let advance = font_size * AVG_CHAR_WIDTH;
    let mut current_x = x;

    for c in text.chars() {
        let glyph_height = if c.is_whitespace() || c.is_control() {
            None
        } else if c.is_uppercase() || c.is_ascii_digit() {
            Some(font_size * ASCENT)
        } else if c.is_lowercase() {
            Some(font_size * 0.5)
        } else {
            Some(font_size * 0.6)
        };

        if let Some(h) = glyph_height {
            let glyph = BBox::new(current_x, baseline - h, current_x + advance * 0.8, baseline);
            if let Some(rect) = Rect::from_ltrb(glyph.x0, glyph.y0, glyph.x1, glyph.y1) {
                pixmap.fill_rect(rect, &paint, transform, None);
            }
        }
        current_x += advance;
    }
}
