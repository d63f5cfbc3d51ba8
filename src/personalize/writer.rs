//! In-place page rewriting: redact glyph runs, then draw replacement text.
//!
//! All edits for one page are applied in a single content rewrite. The
//! original operations are kept inside a `q`/`Q` pair with redacted text
//! runs swapped for pure positioning moves, and the new text is appended
//! after it, so a redaction can never remove text inserted for another area.

use std::collections::BTreeMap;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Object, ObjectId, Stream};

use crate::error::{Error, Result};
use crate::model::{BBox, TextStyle};
use crate::parser::backend::{
    convert_operation, BackendFontInfo, ContentOp, LopdfBackend, PageBox, PageId, PdfBackend,
    PdfValue,
};
use crate::parser::content::{
    decode_shown_text, is_text_show, ContentState, ASCENT, AVG_CHAR_WIDTH,
};
use crate::parser::metrics::GlyphWidths;

/// Slack around a redaction rectangle when testing glyph-run centers.
const REDACT_TOLERANCE: f32 = 1.0;

/// Used when an area carries no usable font size.
pub(crate) const DEFAULT_FONT_SIZE: f32 = 11.0;

/// Prefix for font resources added by the writer.
const FONT_RESOURCE_PREFIX: &str = "PTF";

/// Text to draw into an area.
#[derive(Debug, Clone)]
pub struct TextInsertion {
    pub area_id: String,
    pub text: String,
    /// Anchor rectangle; text starts at its top-left corner
    pub bbox: BBox,
    pub style: TextStyle,
}

/// All edits for one page.
#[derive(Debug, Clone, Default)]
pub struct PageEdit {
    /// Regions whose existing glyphs are removed
    pub redactions: Vec<BBox>,
    pub insertions: Vec<TextInsertion>,
}

impl PageEdit {
    pub fn is_empty(&self) -> bool {
        self.redactions.is_empty() && self.insertions.is_empty()
    }
}

/// What happened while applying a [`PageEdit`].
#[derive(Debug, Clone, Default)]
pub struct PageEditOutcome {
    /// Number of text-show operations removed
    pub removed_runs: usize,
    /// Areas drawn with a substitute font
    pub font_fallbacks: Vec<String>,
}

/// Apply one page's edits to the document held by `backend`.
pub fn apply_page_edit(
    backend: &mut LopdfBackend,
    page_num: u32,
    edit: &PageEdit,
) -> Result<PageEditOutcome> {
    let pages = backend.pages();
    let page_id = *pages
        .get(&page_num)
        .ok_or(Error::PageOutOfRange(page_num, pages.len() as u32))?;

    let page_box = backend.page_box(page_id);
    let fonts = backend.page_fonts(page_id).unwrap_or_else(|e| {
        log::warn!("Page {}: cannot read fonts: {}", page_num, e);
        Vec::new()
    });

    let data = backend.page_content(page_id)?;
    let operations = if data.is_empty() {
        Vec::new()
    } else {
        Content::decode(&data)
            .map_err(|e| Error::PdfParse(e.to_string()))?
            .operations
    };

    let (kept, removed_runs) = redact(
        &*backend,
        page_id,
        &page_box,
        &fonts,
        operations,
        &edit.redactions,
    );

    let mut resolver = FontResolver::new(&fonts);
    let mut font_fallbacks = Vec::new();
    let mut drawn = Vec::new();
    for insertion in &edit.insertions {
        let (resource, fallback) = resolver.resolve(&insertion.style);
        if fallback {
            log::warn!(
                "Area {}: font {:?} unavailable, using {}",
                insertion.area_id,
                insertion.style.font_name,
                standard_font(&insertion.style)
            );
            font_fallbacks.push(insertion.area_id.clone());
        }
        drawn.extend(text_operations(&resource, insertion, &page_box));
    }

    let mut operations = Vec::with_capacity(kept.len() + drawn.len() + 2);
    operations.push(Operation::new("q", vec![]));
    operations.extend(kept);
    operations.push(Operation::new("Q", vec![]));
    operations.extend(drawn);

    let encoded = Content { operations }
        .encode()
        .map_err(|e| Error::Write(e.to_string()))?;

    register_fonts(backend, page_id, &resolver.added)?;

    let doc = backend.raw_doc_mut();
    let stream_id = doc.add_object(Stream::new(dictionary! {}, encoded));
    doc.get_dictionary_mut(page_id)?
        .set("Contents", Object::Reference(stream_id));

    log::debug!(
        "Page {}: removed {} runs, drew {} insertions",
        page_num,
        removed_runs,
        edit.insertions.len()
    );

    Ok(PageEditOutcome {
        removed_runs,
        font_fallbacks,
    })
}

/// Drop text-show operations whose glyph-run center falls in a region.
fn redact<B: PdfBackend + ?Sized>(
    backend: &B,
    page_id: PageId,
    page_box: &PageBox,
    fonts: &[BackendFontInfo],
    operations: Vec<Operation>,
    regions: &[BBox],
) -> (Vec<Operation>, usize) {
    let mut state = ContentState::new();
    let mut out = Vec::with_capacity(operations.len());
    let mut removed = 0;

    for operation in operations {
        let op = convert_operation(&operation);
        state.apply(&op);
        if regions.is_empty() || !is_text_show(&op.operator) || !state.in_text() {
            out.push(operation);
            continue;
        }

        let text = decode_shown_text(backend, page_id, state.font(), &op);
        let chars = text.chars().count();
        let (cx, cy) = state.glyph_run(chars).to_page_bbox(page_box).center();
        let hit = !text.trim().is_empty()
            && regions
                .iter()
                .any(|r| r.contains_point(cx, cy, REDACT_TOLERANCE));
        state.advance_shown(&op, chars);

        if hit {
            removed += 1;
            let widths = fonts
                .iter()
                .find(|f| f.name == state.font())
                .and_then(|f| f.widths.as_ref());
            let advance = shown_advance(&op, &text, widths, &state);
            out.extend(replacement_operations(&operation, &op, advance));
        } else {
            out.push(operation);
        }
    }

    (out, removed)
}

/// Bytes of every string a text-show operation displays.
fn shown_bytes(op: &ContentOp) -> Vec<u8> {
    let strings: Vec<&PdfValue> = match op.operator.as_str() {
        "Tj" | "'" => op.operands.first().into_iter().collect(),
        "\"" => op.operands.get(2).into_iter().collect(),
        "TJ" => match op.operands.first() {
            Some(PdfValue::Array(items)) => items.iter().collect(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };
    strings
        .into_iter()
        .filter_map(|v| match v {
            PdfValue::Str(bytes) => Some(bytes.as_slice()),
            _ => None,
        })
        .flatten()
        .copied()
        .collect()
}

/// Advance of the glyphs a text-show operation draws, in thousandths of
/// text space, excluding `TJ` adjustments.
///
/// Uses the font's widths when known; otherwise estimates from the decoded
/// character count.
fn shown_advance(
    op: &ContentOp,
    text: &str,
    widths: Option<&GlyphWidths>,
    state: &ContentState,
) -> f32 {
    match widths {
        Some(widths) => {
            let bytes = shown_bytes(op);
            let spaces = bytes.iter().filter(|&&b| b == b' ').count();
            state.run_advance(widths.string_width(&bytes), bytes.len(), spaces)
        }
        None => {
            let chars = text.chars().count();
            let spaces = text.chars().filter(|&c| c == ' ').count();
            state.run_advance(chars as f32 * AVG_CHAR_WIDTH * 1000.0, chars, spaces)
        }
    }
}

/// Operations that reproduce a removed text show's side effects without
/// drawing anything: the implied line move, spacing updates, and advance.
///
/// `advance` is the glyph advance from [`shown_advance`].
fn replacement_operations(original: &Operation, op: &ContentOp, advance: f32) -> Vec<Operation> {
    let mut out = Vec::new();
    match op.operator.as_str() {
        "'" => out.push(Operation::new("T*", vec![])),
        "\"" => {
            if let (Some(aw), Some(ac)) = (original.operands.first(), original.operands.get(1)) {
                out.push(Operation::new("Tw", vec![aw.clone()]));
                out.push(Operation::new("Tc", vec![ac.clone()]));
            }
            out.push(Operation::new("T*", vec![]));
        }
        _ => {}
    }

    let adjustment: f32 = match (op.operator.as_str(), op.operands.first()) {
        ("TJ", Some(PdfValue::Array(items))) => items
            .iter()
            .filter_map(crate::parser::backend::get_number_from_value)
            .sum(),
        _ => 0.0,
    };
    let shift = adjustment - advance;
    out.push(Operation::new(
        "TJ",
        vec![Object::Array(vec![Object::Real(shift)])],
    ));
    out
}

/// Operations drawing one insertion at its anchor.
fn text_operations(font: &[u8], insertion: &TextInsertion, page_box: &PageBox) -> Vec<Operation> {
    let size = if insertion.style.font_size > 0.0 {
        insertion.style.font_size
    } else {
        DEFAULT_FONT_SIZE
    };
    let x = insertion.bbox.x0 + page_box.x0;
    let baseline = page_box.y1 - (insertion.bbox.y0 + ASCENT * size);
    let color = insertion.style.color;

    vec![
        Operation::new("q", vec![]),
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![Object::Name(font.to_vec()), Object::Real(size)]),
        Operation::new(
            "rg",
            vec![
                Object::Real(color.r),
                Object::Real(color.g),
                Object::Real(color.b),
            ],
        ),
        Operation::new(
            "Tm",
            vec![
                Object::Integer(1),
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(1),
                Object::Real(x),
                Object::Real(baseline),
            ],
        ),
        Operation::new(
            "Tj",
            vec![Object::string_literal(encode_win_ansi(&insertion.text))],
        ),
        Operation::new("ET", vec![]),
        Operation::new("Q", vec![]),
    ]
}

/// Standard-14 Helvetica face matching the style flags.
pub(crate) fn standard_font(style: &TextStyle) -> &'static str {
    match (style.is_bold, style.is_italic) {
        (true, true) => "Helvetica-BoldOblique",
        (true, false) => "Helvetica-Bold",
        (false, true) => "Helvetica-Oblique",
        (false, false) => "Helvetica",
    }
}

/// Picks the font resource used for each insertion on a page.
struct FontResolver<'a> {
    fonts: &'a [BackendFontInfo],
    /// Standard fonts to add: resource name → base font
    added: BTreeMap<Vec<u8>, &'static str>,
}

impl<'a> FontResolver<'a> {
    fn new(fonts: &'a [BackendFontInfo]) -> Self {
        Self {
            fonts,
            added: BTreeMap::new(),
        }
    }

    /// Resource name for a style, and whether a substitute face is used.
    fn resolve(&mut self, style: &TextStyle) -> (Vec<u8>, bool) {
        if let Some(font) = self.page_font(&style.font_name) {
            return (font.name.clone(), false);
        }

        let standard = standard_font(style);
        let fallback = style.font_name != standard;

        if let Some(font) = self.page_font(standard) {
            return (font.name.clone(), fallback);
        }
        if let Some((name, _)) = self.added.iter().find(|(_, base)| **base == standard) {
            return (name.clone(), fallback);
        }

        let name = self.fresh_name();
        self.added.insert(name.clone(), standard);
        (name, fallback)
    }

    fn page_font(&self, base_font: &str) -> Option<&'a BackendFontInfo> {
        self.fonts
            .iter()
            .find(|f| f.base_font == base_font && f.accepts_latin_text())
    }

    fn fresh_name(&self) -> Vec<u8> {
        (1..)
            .map(|n| format!("{}{}", FONT_RESOURCE_PREFIX, n).into_bytes())
            .find(|name| {
                !self.fonts.iter().any(|f| &f.name == name) && !self.added.contains_key(name)
            })
            .unwrap_or_else(|| FONT_RESOURCE_PREFIX.as_bytes().to_vec())
    }
}

/// Add standard font dictionaries to the page's font resources.
///
/// Inherited resources are copied onto the page before being extended.
fn register_fonts(
    backend: &mut LopdfBackend,
    page_id: PageId,
    fonts: &BTreeMap<Vec<u8>, &'static str>,
) -> Result<()> {
    if fonts.is_empty() {
        return Ok(());
    }

    let resources_obj = backend.inherited_attribute(page_id, b"Resources").cloned();
    let doc = backend.raw_doc_mut();

    let font_ids: Vec<(Vec<u8>, ObjectId)> = fonts
        .iter()
        .map(|(name, base)| {
            let id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => *base,
                "Encoding" => "WinAnsiEncoding",
            });
            (name.clone(), id)
        })
        .collect();

    let (resources_ref, mut resources) = match resources_obj {
        Some(Object::Reference(id)) => (
            Some(id),
            doc.get_dictionary(id)
                .cloned()
                .unwrap_or_else(|_| Dictionary::new()),
        ),
        Some(Object::Dictionary(dict)) => (None, dict),
        _ => (None, Dictionary::new()),
    };

    let font_ref = match resources.get(b"Font") {
        Ok(Object::Reference(id)) => Some(*id),
        _ => None,
    };
    let mut font_dict = match font_ref {
        Some(id) => doc.get_dictionary(id).cloned().unwrap_or_else(|_| Dictionary::new()),
        None => resources
            .get(b"Font")
            .and_then(Object::as_dict)
            .cloned()
            .unwrap_or_else(|_| Dictionary::new()),
    };

    for (name, id) in font_ids {
        font_dict.set(name, Object::Reference(id));
    }

    match font_ref {
        Some(id) => {
            doc.objects.insert(id, Object::Dictionary(font_dict));
        }
        None => resources.set("Font", Object::Dictionary(font_dict)),
    }

    match resources_ref {
        Some(id) => {
            doc.objects.insert(id, Object::Dictionary(resources));
        }
        None => doc
            .get_dictionary_mut(page_id)?
            .set("Resources", Object::Dictionary(resources)),
    }

    Ok(())
}

/// Encode text as WinAnsi bytes; unrepresentable characters become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => b' ',
            ' '..='~' => c as u8,
            '\u{A0}'..='\u{FF}' => c as u32 as u8,
            _ => win_ansi_high(c).unwrap_or(b'?'),
        })
        .collect()
}

/// WinAnsi code points 0x80–0x9F that differ from Latin-1.
fn win_ansi_high(c: char) -> Option<u8> {
    let byte = match c {
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        _ => return None,
    };
    Some(byte)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn font(name: &str, base: &str) -> BackendFontInfo {
        BackendFontInfo {
            name: name.as_bytes().to_vec(),
            base_font: base.to_string(),
            subtype: "Type1".to_string(),
            encoding: Some("WinAnsiEncoding".to_string()),
            widths: GlyphWidths::standard(base),
        }
    }

    fn style(name: &str, bold: bool, italic: bool) -> TextStyle {
        TextStyle {
            font_name: name.to_string(),
            is_bold: bold,
            is_italic: italic,
            ..TextStyle::default()
        }
    }

    #[test]
    fn test_encode_win_ansi() {
        assert_eq!(encode_win_ansi("john@x.com"), b"john@x.com".to_vec());
        assert_eq!(encode_win_ansi("café"), vec![b'c', b'a', b'f', 0xE9]);
        assert_eq!(encode_win_ansi("a–b €"), vec![b'a', 0x96, b'b', b' ', 0x80]);
        assert_eq!(encode_win_ansi("日本"), b"??".to_vec());
        assert_eq!(encode_win_ansi("a\nb"), b"a b".to_vec());
    }

    #[test]
    fn test_standard_font_by_style() {
        assert_eq!(standard_font(&style("X", false, false)), "Helvetica");
        assert_eq!(standard_font(&style("X", true, false)), "Helvetica-Bold");
        assert_eq!(standard_font(&style("X", false, true)), "Helvetica-Oblique");
        assert_eq!(standard_font(&style("X", true, true)), "Helvetica-BoldOblique");
    }

    #[test]
    fn test_resolver_reuses_page_font() {
        let fonts = vec![font("F1", "Times-Roman")];
        let mut resolver = FontResolver::new(&fonts);
        assert_eq!(resolver.resolve(&style("Times-Roman", false, false)), (b"F1".to_vec(), false));
        assert!(resolver.added.is_empty());
    }

    #[test]
    fn test_resolver_falls_back_once_per_face() {
        let fonts = vec![font("PTF1", "Times-Roman")];
        let mut resolver = FontResolver::new(&fonts);

        let (first, fallback) = resolver.resolve(&style("ABCDEF+Lato-Bold", true, false));
        assert!(fallback);
        assert_eq!(first, b"PTF2".to_vec());

        let (second, _) = resolver.resolve(&style("Other-Bold", true, false));
        assert_eq!(second, first);

        let (regular, _) = resolver.resolve(&style("Lato", false, false));
        assert_eq!(regular, b"PTF3".to_vec());
        assert_eq!(resolver.added.len(), 2);
    }

    #[test]
    fn test_standard_name_is_not_a_fallback() {
        let fonts = Vec::new();
        let mut resolver = FontResolver::new(&fonts);
        let (_, fallback) = resolver.resolve(&style("Helvetica", false, false));
        assert!(!fallback);
        assert_eq!(resolver.added.len(), 1);
    }

    #[test]
    fn test_replacement_preserves_advance() {
        let original = Operation::new(
            "TJ",
            vec![Object::Array(vec![
                Object::string_literal("Ab"),
                Object::Integer(-100),
            ])],
        );
        let op = convert_operation(&original);
        let ops = replacement_operations(&original, &op, 1000.0);
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].operator, "TJ");
        assert_eq!(tj_shift(&ops[0]), Some(-1100.0));

        let quote = Operation::new("'", vec![Object::string_literal("x")]);
        let ops = replacement_operations(&quote, &convert_operation(&quote), 500.0);
        assert_eq!(ops[0].operator, "T*");
    }

    fn tj_shift(op: &Operation) -> Option<f32> {
        op.operands[0]
            .as_array()
            .ok()
            .and_then(|items| items.first())
            .and_then(|n| n.as_float().ok())
    }

    fn text_state(size: i64) -> ContentState {
        let mut state = ContentState::new();
        state.apply(&convert_operation(&Operation::new("BT", vec![])));
        state.apply(&convert_operation(&Operation::new(
            "Tf",
            vec!["F1".into(), Object::Integer(size)],
        )));
        state
    }

    #[test]
    fn test_shown_advance_uses_font_widths() {
        let state = text_state(11);
        let show = convert_operation(&Operation::new(
            "Tj",
            vec![Object::string_literal("jane@x.com")],
        ));
        let helvetica = GlyphWidths::standard("Helvetica");
        let advance = shown_advance(&show, "jane@x.com", helvetica.as_ref(), &state);
        assert_eq!(advance, 5572.0);

        let estimated = shown_advance(&show, "jane@x.com", None, &state);
        assert_eq!(estimated, 5000.0);
    }

    #[test]
    fn test_shown_advance_counts_tj_strings_only() {
        let state = text_state(10);
        let show = convert_operation(&Operation::new(
            "TJ",
            vec![Object::Array(vec![
                Object::string_literal("A"),
                Object::Integer(-120),
                Object::string_literal("b"),
            ])],
        ));
        let widths = GlyphWidths::standard("Helvetica");
        assert_eq!(shown_advance(&show, "Ab", widths.as_ref(), &state), 1223.0);
    }

    /// One text line drawn as two `Tj` runs in Helvetica 11.
    fn two_run_line() -> (LopdfBackend, PageId) {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), Object::Integer(11)]),
                Operation::new("Td", vec![Object::Integer(100), Object::Integer(700)]),
                Operation::new("Tj", vec![Object::string_literal("jane@x.com")]),
                Operation::new("Tj", vec![Object::string_literal(" | Phone")]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        (LopdfBackend::from_document(doc).unwrap(), page_id)
    }

    #[test]
    fn test_redaction_keeps_following_run_in_place() {
        let (mut backend, page_id) = two_run_line();
        let edit = PageEdit {
            // Email run sits at x 100, top 83.2 in page space.
            redactions: vec![BBox::new(100.0, 83.0, 160.0, 95.0)],
            insertions: Vec::new(),
        };
        let outcome = apply_page_edit(&mut backend, 1, &edit).unwrap();
        assert_eq!(outcome.removed_runs, 1);

        let data = backend.page_content(page_id).unwrap();
        let operations = Content::decode(&data).unwrap().operations;
        let shows: Vec<&Operation> = operations
            .iter()
            .filter(|o| o.operator == "Tj" || o.operator == "TJ")
            .collect();
        assert_eq!(shows.len(), 2);

        // The removed run advances by its Helvetica width: 5572/1000 x 11pt.
        assert_eq!(shows[0].operator, "TJ");
        let shift = tj_shift(shows[0]).unwrap();
        assert!((shift + 5572.0).abs() < 0.01);

        assert_eq!(shows[1].operator, "Tj");
        assert_eq!(
            shows[1].operands[0].as_str().ok(),
            Some(b" | Phone".as_slice())
        );
    }

    #[test]
    fn test_text_operations_anchor() {
        let insertion = TextInsertion {
            area_id: "p1_f0".to_string(),
            text: "john@x.com".to_string(),
            bbox: BBox::new(100.0, 130.0, 300.0, 145.0),
            style: TextStyle {
                font_size: 10.0,
                ..TextStyle::default()
            },
        };
        let page_box = PageBox {
            x0: 0.0,
            y0: 0.0,
            x1: 595.0,
            y1: 842.0,
        };
        let ops = text_operations(b"F1", &insertion, &page_box);
        let tm = ops.iter().find(|o| o.operator == "Tm").unwrap();
        assert_eq!(tm.operands[4].as_float().ok(), Some(100.0));
        assert!((tm.operands[5].as_float().unwrap() - 704.0).abs() < 1e-3);
    }
}
