//! Content stream interpreter state.
//!
//! Tracks the graphics and text state needed to place shown text on the
//! page: current transformation matrix, text matrices, font, leading and
//! fill color. Shared by span extraction and the redaction pass so both
//! agree on where a glyph run sits.

use super::backend::{get_number_from_value, ContentOp, PageBox, PageId, PdfBackend, PdfValue};
use crate::model::{BBox, Rgb};

/// Ascent as a fraction of font size.
pub const ASCENT: f32 = 0.8;
/// Descent as a fraction of font size.
pub const DESCENT: f32 = 0.2;
/// Average glyph advance as a fraction of font size.
pub const AVG_CHAR_WIDTH: f32 = 0.5;

/// Default leading factor when `TL` was never set.
const DEFAULT_LEADING: f32 = 1.2;

/// TJ adjustment (thousandths of text space) treated as a word gap.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// Affine matrix `[a b c d e f]` using the PDF row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn translation(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// `self × other`: apply `self` first, then `other`.
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    pub fn transform_point(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x * self.a + y * self.c + self.e,
            x * self.b + y * self.d + self.f,
        )
    }

    fn horizontal_scale(&self) -> f32 {
        (self.a * self.a + self.b * self.b).sqrt()
    }

    fn vertical_scale(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }

    fn from_operands(operands: &[PdfValue]) -> Option<Matrix> {
        if operands.len() < 6 {
            return None;
        }
        let n: Vec<f32> = operands[..6]
            .iter()
            .map(|v| get_number_from_value(v).unwrap_or(0.0))
            .collect();
        Some(Matrix::new(n[0], n[1], n[2], n[3], n[4], n[5]))
    }
}

/// A positioned run of shown glyphs in user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphRun {
    /// Origin x in user space
    pub x: f32,
    /// Baseline y in user space
    pub y: f32,
    /// Font size after matrix scaling
    pub size: f32,
    /// Estimated advance width in user space
    pub width: f32,
}

impl GlyphRun {
    /// Bounding box in top-left page coordinates.
    pub fn to_page_bbox(&self, page_box: &PageBox) -> BBox {
        let x0 = self.x - page_box.x0;
        let baseline = page_box.y1 - self.y;
        BBox::new(
            x0,
            baseline - ASCENT * self.size,
            x0 + self.width,
            baseline + DESCENT * self.size,
        )
    }
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    fill: Rgb,
    font: Vec<u8>,
    font_size: f32,
    leading: f32,
    char_spacing: f32,
    word_spacing: f32,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            fill: Rgb::BLACK,
            font: Vec::new(),
            font_size: 12.0,
            leading: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
        }
    }
}

/// Interpreter state for one page's content stream.
#[derive(Debug, Clone, Default)]
pub struct ContentState {
    gs: GraphicsState,
    stack: Vec<GraphicsState>,
    tm: Matrix,
    tlm: Matrix,
    in_text: bool,
}

impl ContentState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resource name of the current font.
    pub fn font(&self) -> &[u8] {
        &self.gs.font
    }

    pub fn fill(&self) -> Rgb {
        self.gs.fill
    }

    pub fn in_text(&self) -> bool {
        self.in_text
    }

    /// Update state for one operation.
    ///
    /// For `'` and `"` this performs the implied line move, so the caller
    /// sees the post-move position when it places the shown text.
    pub fn apply(&mut self, op: &ContentOp) {
        let num = |i: usize| op.operands.get(i).and_then(get_number_from_value);

        match op.operator.as_str() {
            "q" => self.stack.push(self.gs.clone()),
            "Q" => {
                if let Some(saved) = self.stack.pop() {
                    self.gs = saved;
                }
            }
            "cm" => {
                if let Some(m) = Matrix::from_operands(&op.operands) {
                    self.gs.ctm = m.multiply(&self.gs.ctm);
                }
            }
            "BT" => {
                self.in_text = true;
                self.tm = Matrix::IDENTITY;
                self.tlm = Matrix::IDENTITY;
            }
            "ET" => self.in_text = false,
            "Tf" => {
                if let Some(PdfValue::Name(name)) = op.operands.first() {
                    self.gs.font = name.clone();
                }
                if let Some(size) = num(1) {
                    self.gs.font_size = size;
                }
            }
            "TL" => {
                if let Some(leading) = num(0) {
                    self.gs.leading = leading;
                }
            }
            "Td" => self.move_line(num(0).unwrap_or(0.0), num(1).unwrap_or(0.0)),
            "TD" => {
                let ty = num(1).unwrap_or(0.0);
                self.gs.leading = -ty;
                self.move_line(num(0).unwrap_or(0.0), ty);
            }
            "Tm" => {
                if let Some(m) = Matrix::from_operands(&op.operands) {
                    self.tm = m;
                    self.tlm = m;
                }
            }
            "Tc" => {
                if let Some(spacing) = num(0) {
                    self.gs.char_spacing = spacing;
                }
            }
            "Tw" => {
                if let Some(spacing) = num(0) {
                    self.gs.word_spacing = spacing;
                }
            }
            "\"" => {
                if let (Some(aw), Some(ac)) = (num(0), num(1)) {
                    self.gs.word_spacing = aw;
                    self.gs.char_spacing = ac;
                }
                self.next_line();
            }
            "T*" | "'" => self.next_line(),
            "rg" | "sc" | "scn" | "g" | "k" => {
                if let Some(color) = fill_color(op) {
                    self.gs.fill = color;
                }
            }
            _ => {}
        }
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.tlm = Matrix::translation(tx, ty).multiply(&self.tlm);
        self.tm = self.tlm;
    }

    fn next_line(&mut self) {
        let leading = if self.gs.leading != 0.0 {
            self.gs.leading
        } else {
            self.gs.font_size * DEFAULT_LEADING
        };
        self.move_line(0.0, -leading);
    }

    /// Placement of `chars` glyphs shown at the current text position.
    pub fn glyph_run(&self, chars: usize) -> GlyphRun {
        let trm = self.tm.multiply(&self.gs.ctm);
        let (x, y) = trm.transform_point(0.0, 0.0);
        let advance = chars as f32 * AVG_CHAR_WIDTH * self.gs.font_size;
        GlyphRun {
            x,
            y,
            size: self.gs.font_size * trm.vertical_scale(),
            width: advance * trm.horizontal_scale(),
        }
    }

    /// Advance, in thousandths of text space, of a run whose glyphs sum to
    /// `glyph_width` and which contains `glyphs` codes, `spaces` of them
    /// single-byte spaces. Includes character and word spacing.
    pub fn run_advance(&self, glyph_width: f32, glyphs: usize, spaces: usize) -> f32 {
        if self.gs.font_size == 0.0 {
            return glyph_width;
        }
        let spacing =
            self.gs.char_spacing * glyphs as f32 + self.gs.word_spacing * spaces as f32;
        glyph_width + spacing * 1000.0 / self.gs.font_size
    }

    /// Move the text position past a text-show operation that displayed
    /// `chars` glyphs, including any `TJ` positioning adjustments.
    pub fn advance_shown(&mut self, op: &ContentOp, chars: usize) {
        let adjustment: f32 = match (op.operator.as_str(), op.operands.first()) {
            ("TJ", Some(PdfValue::Array(items))) => {
                items.iter().filter_map(get_number_from_value).sum()
            }
            _ => 0.0,
        };
        let tx = (chars as f32 * AVG_CHAR_WIDTH - adjustment / 1000.0) * self.gs.font_size;
        self.tm = Matrix::translation(tx, 0.0).multiply(&self.tm);
    }
}

/// Whether an operator shows text.
pub fn is_text_show(operator: &str) -> bool {
    matches!(operator, "Tj" | "TJ" | "'" | "\"")
}

fn fill_color(op: &ContentOp) -> Option<Rgb> {
    let values: Vec<f32> = op
        .operands
        .iter()
        .filter_map(get_number_from_value)
        .collect();
    match (op.operator.as_str(), values.len()) {
        ("g", 1) | ("sc" | "scn", 1) => Some(Rgb::gray(values[0])),
        ("rg", 3) | ("sc" | "scn", 3) => Some(Rgb::new(values[0], values[1], values[2])),
        ("k", 4) | ("sc" | "scn", 4) => {
            Some(Rgb::from_cmyk(values[0], values[1], values[2], values[3]))
        }
        _ => None,
    }
}

/// Decode the text shown by a text-show operation.
///
/// Large negative `TJ` adjustments become word spaces except after
/// characters of scripts written without spaces.
pub fn decode_shown_text<B: PdfBackend + ?Sized>(
    backend: &B,
    page: PageId,
    font: &[u8],
    op: &ContentOp,
) -> String {
    let decode = |bytes: &[u8]| backend.decode_text(page, font, bytes);

    match op.operator.as_str() {
        "Tj" | "'" => match op.operands.first() {
            Some(PdfValue::Str(bytes)) => decode(bytes),
            _ => String::new(),
        },
        "\"" => match op.operands.get(2) {
            Some(PdfValue::Str(bytes)) => decode(bytes),
            _ => String::new(),
        },
        "TJ" => {
            let Some(PdfValue::Array(items)) = op.operands.first() else {
                return String::new();
            };
            let mut combined = String::new();
            for item in items {
                match item {
                    PdfValue::Str(bytes) => combined.push_str(&decode(bytes)),
                    other => {
                        let Some(n) = get_number_from_value(other) else {
                            continue;
                        };
                        if -n > TJ_SPACE_THRESHOLD
                            && !combined.ends_with(' ')
                            && !combined.ends_with('\u{00A0}')
                            && combined.chars().last().is_some_and(|c| !is_spaceless_script_char(c))
                        {
                            combined.push(' ');
                        }
                    }
                }
            }
            combined
        }
        _ => String::new(),
    }
}

/// Check if a character belongs to a script that doesn't use word spaces.
///
/// Chinese and Japanese don't use spaces between words; Korean does.
fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    (0x4E00..=0x9FFF).contains(&code)
        || (0x3400..=0x4DBF).contains(&code)
        || (0x20000..=0x2EBEF).contains(&code)
        // Hiragana and Katakana
        || (0x3040..=0x30FF).contains(&code)
        // CJK Symbols and Punctuation
        || (0x3000..=0x303F).contains(&code)
}
