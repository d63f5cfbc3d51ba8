//! PDF backend abstraction layer.
//!
//! Provides a trait-based interface for read access to a PDF, isolating
//! the concrete PDF library (lopdf) from span extraction. The personalization
//! writer needs mutable access and works on [`LopdfBackend::raw_doc_mut`].

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::{Document as LopdfDocument, Object};

use super::metrics::GlyphWidths;
use crate::detect::{check_template_bytes, check_template_path};
use crate::error::{Error, Result};

/// Page identifier: (object number, generation number).
pub type PageId = (u32, u16);

/// Default page box (US Letter) when none is declared.
const DEFAULT_PAGE_BOX: PageBox = PageBox {
    x0: 0.0,
    y0: 0.0,
    x1: 612.0,
    y1: 792.0,
};

/// Page rectangle in PDF user space (origin bottom-left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl PageBox {
    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }
}

/// Font information returned by the backend.
#[derive(Debug, Clone)]
pub struct BackendFontInfo {
    /// Font resource name (key in the page's font dictionary).
    pub name: Vec<u8>,
    /// Base font name (e.g., "Helvetica-Bold").
    pub base_font: String,
    /// Font subtype (e.g., "Type1", "TrueType", "Type0").
    pub subtype: String,
    /// Encoding name when declared as a name object.
    pub encoding: Option<String>,
    /// Advance widths; `None` for composite fonts and unknown simple fonts.
    pub widths: Option<GlyphWidths>,
}

impl BackendFontInfo {
    /// Embedded subsets carry a six-letter tag, e.g. `ABCDEF+Lato`.
    pub fn is_subset(&self) -> bool {
        self.base_font
            .split_once('+')
            .is_some_and(|(tag, _)| tag.len() == 6 && tag.bytes().all(|b| b.is_ascii_uppercase()))
    }

    /// Whether Latin text can be written with this font using WinAnsi bytes.
    pub fn accepts_latin_text(&self) -> bool {
        let simple = matches!(self.subtype.as_str(), "Type1" | "TrueType" | "MMType1");
        let encoding_ok = match self.encoding.as_deref() {
            None => true,
            Some(enc) => enc == "WinAnsiEncoding" || enc == "StandardEncoding",
        };
        simple && encoding_ok && !self.is_subset()
    }
}

/// A value from a PDF content stream operand.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfValue {
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
    Other,
}

/// A single operation from a PDF content stream.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

impl ContentOp {
    pub fn new(operator: &str, operands: Vec<PdfValue>) -> Self {
        Self {
            operator: operator.to_string(),
            operands,
        }
    }
}

/// Abstract read interface for a PDF document.
///
/// Implementations provide page enumeration, geometry, font info, content
/// stream decoding, and text decoding without exposing library types.
pub trait PdfBackend {
    /// Return all pages as (page_number → PageId).
    fn pages(&self) -> BTreeMap<u32, PageId>;

    /// Return the page's MediaBox, following inheritance.
    fn page_box(&self, page: PageId) -> PageBox;

    /// Return font info for a given page.
    fn page_fonts(&self, page: PageId) -> Result<Vec<BackendFontInfo>>;

    /// Return the raw (decompressed) content stream bytes for a page.
    fn page_content(&self, page: PageId) -> Result<Vec<u8>>;

    /// Parse raw content stream bytes into a sequence of operations.
    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>>;

    /// Decode a text byte sequence using the font's encoding on the given page.
    /// Falls back to simple decoding if the font or encoding is unavailable.
    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String;
}

/// Simple text decoding fallback when no encoding is available.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    // UTF-16BE with BOM
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Latin-1
    bytes.iter().map(|&b| b as char).collect()
}

// ---------------------------------------------------------------------------
// LopdfBackend — concrete implementation backed by lopdf
// ---------------------------------------------------------------------------

/// Concrete [`PdfBackend`] backed by `lopdf::Document`.
///
/// Each instance owns its document handle; concurrent jobs each open their
/// own backend.
pub struct LopdfBackend {
    doc: LopdfDocument,
}

impl LopdfBackend {
    /// Load a template from a file path.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        check_template_path(path)?;
        let doc = LopdfDocument::load(path)?;
        Self::from_document(doc)
    }

    /// Load a template from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        check_template_bytes(data)?;
        let doc = LopdfDocument::load_mem(data)?;
        Self::from_document(doc)
    }

    /// Wrap an already-loaded document.
    pub fn from_document(doc: LopdfDocument) -> Result<Self> {
        if doc.is_encrypted() {
            return Err(Error::Encrypted);
        }
        Ok(Self { doc })
    }

    /// Direct access to the underlying `lopdf::Document`.
    pub fn raw_doc(&self) -> &LopdfDocument {
        &self.doc
    }

    /// Mutable access for the personalization writer.
    pub fn raw_doc_mut(&mut self) -> &mut LopdfDocument {
        &mut self.doc
    }

    /// Get PDF version string.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    /// Serialize the (possibly modified) document.
    pub fn save_to_vec(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.doc
            .save_to(&mut out)
            .map_err(|e| Error::Write(e.to_string()))?;
        Ok(out)
    }

    /// Walk the page tree upwards until `key` is found.
    pub(crate) fn inherited_attribute(&self, page: PageId, key: &[u8]) -> Option<&Object> {
        let mut current = self.doc.get_dictionary(page).ok();
        // Guard against malformed cyclic /Parent chains.
        for _ in 0..32 {
            let dict = current?;
            if let Ok(value) = dict.get(key) {
                return Some(value);
            }
            current = dict
                .get(b"Parent")
                .and_then(Object::as_reference)
                .and_then(|id| self.doc.get_dictionary(id))
                .ok();
        }
        None
    }

    fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
        match obj {
            Object::Reference(id) => self.doc.get_object(*id).unwrap_or(obj),
            _ => obj,
        }
    }
}

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn page_box(&self, page: PageId) -> PageBox {
        let Some(media_box) = self.inherited_attribute(page, b"MediaBox") else {
            return DEFAULT_PAGE_BOX;
        };
        let values: Vec<f32> = match self.resolve(media_box).as_array() {
            Ok(array) => array
                .iter()
                .filter_map(|o| self.resolve(o).as_float().ok())
                .collect(),
            Err(_) => return DEFAULT_PAGE_BOX,
        };
        if values.len() < 4 {
            return DEFAULT_PAGE_BOX;
        }
        PageBox {
            x0: values[0].min(values[2]),
            y0: values[1].min(values[3]),
            x1: values[0].max(values[2]),
            y1: values[1].max(values[3]),
        }
    }

    fn page_fonts(&self, page: PageId) -> Result<Vec<BackendFontInfo>> {
        let lopdf_fonts = self
            .doc
            .get_page_fonts(page)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        let name_of = |dict: &lopdf::Dictionary, key: &[u8]| {
            dict.get(key)
                .ok()
                .and_then(|o| o.as_name().ok())
                .map(|n| String::from_utf8_lossy(n).to_string())
        };

        let mut result = Vec::with_capacity(lopdf_fonts.len());
        for (name, font_dict) in &lopdf_fonts {
            let subtype = name_of(font_dict, b"Subtype").unwrap_or_default();
            let widths = if subtype == "Type0" {
                None
            } else {
                GlyphWidths::from_font_dict(&self.doc, font_dict)
            };
            result.push(BackendFontInfo {
                name: name.clone(),
                base_font: name_of(font_dict, b"BaseFont").unwrap_or_else(|| "Unknown".to_string()),
                subtype,
                encoding: name_of(font_dict, b"Encoding"),
                widths,
            });
        }
        Ok(result)
    }

    fn page_content(&self, page_id: PageId) -> Result<Vec<u8>> {
        let page_dict = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        let Ok(contents) = page_dict.get(b"Contents") else {
            // A page without content streams is blank, not broken.
            return Ok(Vec::new());
        };

        let stream_bytes = |obj: &Object| -> Result<Vec<u8>> {
            match self.resolve(obj) {
                Object::Stream(s) => Ok(s
                    .decompressed_content()
                    .unwrap_or_else(|_| s.content.clone())),
                _ => Err(Error::PdfParse("Invalid content stream".to_string())),
            }
        };

        match self.resolve(contents) {
            Object::Array(arr) => {
                let mut content = Vec::new();
                for obj in arr {
                    content.extend_from_slice(&stream_bytes(obj)?);
                    content.push(b'\n');
                }
                Ok(content)
            }
            _ => stream_bytes(contents),
        }
    }

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>> {
        let content =
            lopdf::content::Content::decode(data).map_err(|e| Error::PdfParse(e.to_string()))?;

        Ok(content.operations.iter().map(convert_operation).collect())
    }

    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String {
        if let Ok(lopdf_fonts) = self.doc.get_page_fonts(page) {
            if let Some(font_dict) = lopdf_fonts.get(font_name) {
                if let Ok(enc) = font_dict.get_font_encoding(&self.doc) {
                    if let Ok(text) = LopdfDocument::decode_text(&enc, bytes) {
                        return text;
                    }
                }
            }
        }
        decode_text_simple(bytes)
    }
}

/// Convert a `lopdf` operation to a [`ContentOp`].
pub(crate) fn convert_operation(op: &lopdf::content::Operation) -> ContentOp {
    ContentOp {
        operator: op.operator.clone(),
        operands: op.operands.iter().map(convert_object).collect(),
    }
}

/// Convert a `lopdf::Object` to [`PdfValue`].
fn convert_object(obj: &Object) -> PdfValue {
    match obj {
        Object::Integer(i) => PdfValue::Integer(*i),
        Object::Real(r) => PdfValue::Real(*r),
        Object::Name(n) => PdfValue::Name(n.clone()),
        Object::String(b, _) => PdfValue::Str(b.clone()),
        Object::Array(arr) => PdfValue::Array(arr.iter().map(convert_object).collect()),
        _ => PdfValue::Other,
    }
}

/// Helper: extract a number from a [`PdfValue`].
pub fn get_number_from_value(val: &PdfValue) -> Option<f32> {
    match val {
        PdfValue::Integer(i) => Some(*i as f32),
        PdfValue::Real(r) => Some(*r),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn font(base: &str, subtype: &str, encoding: Option<&str>) -> BackendFontInfo {
        BackendFontInfo {
            name: b"F1".to_vec(),
            base_font: base.to_string(),
            subtype: subtype.to_string(),
            encoding: encoding.map(str::to_string),
            widths: None,
        }
    }

    #[test]
    fn test_decode_text_simple_utf8() {
        assert_eq!(decode_text_simple(b"Hello"), "Hello");
    }

    #[test]
    fn test_decode_text_simple_latin1() {
        // 0xE9 = 'é' in Latin-1
        let bytes = vec![0x48, 0x65, 0x6C, 0x6C, 0xE9];
        assert_eq!(decode_text_simple(&bytes), "Hellé");
    }

    #[test]
    fn test_decode_text_simple_utf16be() {
        let bytes = vec![0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69];
        assert_eq!(decode_text_simple(&bytes), "Hi");
    }

    #[test]
    fn test_get_number_from_value() {
        assert_eq!(get_number_from_value(&PdfValue::Integer(42)), Some(42.0));
        assert_eq!(get_number_from_value(&PdfValue::Real(2.5)), Some(2.5));
        assert_eq!(get_number_from_value(&PdfValue::Other), None);
    }

    #[test]
    fn test_subset_detection() {
        assert!(font("ABCDEF+Lato-Regular", "TrueType", None).is_subset());
        assert!(!font("Helvetica", "Type1", None).is_subset());
        assert!(!font("abc+Weird", "Type1", None).is_subset());
    }

    #[test]
    fn test_accepts_latin_text() {
        assert!(font("Helvetica", "Type1", Some("WinAnsiEncoding")).accepts_latin_text());
        assert!(font("Times-Roman", "Type1", None).accepts_latin_text());
        assert!(!font("Arial", "Type0", Some("Identity-H")).accepts_latin_text());
        assert!(!font("ABCDEF+Arial", "TrueType", None).accepts_latin_text());
        assert!(!font("Symbol", "Type1", Some("MacExpertEncoding")).accepts_latin_text());
    }

    #[test]
    fn test_load_bytes_rejects_non_pdf() {
        let result = LopdfBackend::load_bytes(b"not a pdf at all");
        assert!(matches!(result, Err(Error::UnknownFormat)));
    }
}
