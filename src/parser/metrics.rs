//! Glyph advance widths for simple fonts.
//!
//! Widths come from the font dictionary (`/Widths` indexed from
//! `/FirstChar`) when present, otherwise from built-in tables for the
//! standard-14 Latin faces. All values are thousandths of text space.

use lopdf::{Dictionary, Document, Object};

/// First code covered by the built-in tables.
const TABLE_FIRST_CHAR: u32 = 32;

/// Width of codes outside a built-in table.
const TABLE_MISSING_WIDTH: f32 = 500.0;

const COURIER_WIDTH: f32 = 600.0;

const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    222, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    278, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

const TIMES_ROMAN: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

const TIMES_BOLD: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    930, 722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778,
    611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, 333, 278, 333, 581, 500,
    333, 500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, 556, 500,
    556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,
];

const TIMES_ITALIC: [u16; 95] = [
    250, 333, 420, 500, 500, 833, 778, 214, 333, 333, 500, 675, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 675, 675, 675, 500,
    920, 611, 611, 667, 722, 611, 611, 722, 722, 333, 444, 667, 556, 833, 667, 722,
    611, 722, 611, 500, 556, 722, 611, 833, 611, 556, 556, 389, 278, 389, 422, 500,
    333, 500, 500, 444, 500, 444, 278, 500, 500, 278, 278, 444, 278, 722, 500, 500,
    500, 500, 389, 389, 278, 500, 444, 667, 444, 444, 389, 400, 275, 400, 541,
];

const TIMES_BOLD_ITALIC: [u16; 95] = [
    250, 389, 555, 500, 500, 833, 778, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    832, 667, 667, 667, 722, 667, 667, 722, 778, 389, 500, 667, 611, 889, 722, 722,
    611, 722, 667, 556, 611, 722, 667, 889, 667, 611, 611, 333, 278, 333, 570, 500,
    333, 500, 500, 444, 500, 444, 333, 500, 556, 278, 278, 500, 278, 778, 556, 500,
    500, 500, 389, 389, 278, 556, 444, 667, 500, 444, 389, 348, 220, 348, 570,
];

/// Advance widths of a single-byte font.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphWidths {
    first_char: u32,
    widths: Vec<f32>,
    missing_width: f32,
}

impl GlyphWidths {
    pub fn new(first_char: u32, widths: Vec<f32>, missing_width: f32) -> Self {
        Self {
            first_char,
            widths,
            missing_width,
        }
    }

    /// Every code advances by the same amount.
    pub fn monospaced(width: f32) -> Self {
        Self::new(0, Vec::new(), width)
    }

    /// Built-in widths for a standard-14 Latin face, by base font name.
    pub fn standard(base_font: &str) -> Option<Self> {
        let table: &[u16; 95] = match base_font {
            "Helvetica" | "Helvetica-Oblique" => &HELVETICA,
            "Helvetica-Bold" | "Helvetica-BoldOblique" => &HELVETICA_BOLD,
            "Times-Roman" => &TIMES_ROMAN,
            "Times-Bold" => &TIMES_BOLD,
            "Times-Italic" => &TIMES_ITALIC,
            "Times-BoldItalic" => &TIMES_BOLD_ITALIC,
            name if name.starts_with("Courier") => return Some(Self::monospaced(COURIER_WIDTH)),
            _ => return None,
        };
        Some(Self::new(
            TABLE_FIRST_CHAR,
            table.iter().map(|&w| f32::from(w)).collect(),
            TABLE_MISSING_WIDTH,
        ))
    }

    /// Widths declared by a simple font dictionary, falling back to the
    /// built-in table for its base font.
    pub fn from_font_dict(doc: &Document, font: &Dictionary) -> Option<Self> {
        let resolve = |obj: &Object| -> Option<Object> {
            match obj {
                Object::Reference(id) => doc.get_object(*id).ok().cloned(),
                other => Some(other.clone()),
            }
        };
        let number = |obj: &Object| -> Option<f32> {
            match resolve(obj)? {
                Object::Integer(i) => Some(i as f32),
                Object::Real(r) => Some(r),
                _ => None,
            }
        };

        let declared = font
            .get(b"Widths")
            .ok()
            .and_then(|w| resolve(w))
            .and_then(|w| w.as_array().ok().cloned())
            .map(|items| items.iter().filter_map(number).collect::<Vec<f32>>());
        let first_char = font.get(b"FirstChar").ok().and_then(number);

        if let (Some(widths), Some(first_char)) = (declared, first_char) {
            let missing_width = font
                .get(b"FontDescriptor")
                .ok()
                .and_then(|d| resolve(d))
                .and_then(|d| d.as_dict().ok().cloned())
                .and_then(|d| d.get(b"MissingWidth").ok().and_then(number))
                .unwrap_or(0.0);
            return Some(Self::new(first_char.max(0.0) as u32, widths, missing_width));
        }

        let base_font = font.get(b"BaseFont").ok()?.as_name().ok()?;
        Self::standard(&String::from_utf8_lossy(base_font))
    }

    /// Advance of one character code.
    pub fn width(&self, code: u8) -> f32 {
        u32::from(code)
            .checked_sub(self.first_char)
            .and_then(|i| self.widths.get(i as usize))
            .copied()
            .unwrap_or(self.missing_width)
    }

    /// Total advance of a byte string.
    pub fn string_width(&self, bytes: &[u8]) -> f32 {
        bytes.iter().map(|&b| self.width(b)).sum()
    }
}
