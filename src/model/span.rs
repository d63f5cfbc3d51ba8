//! Extracted text spans.

use serde::{Deserialize, Serialize};

use super::{BBox, Rgb};

/// A single run of styled text on one page.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    /// The text content (normalized)
    pub text: String,
    /// Bounding box in page space
    pub bbox: BBox,
    /// Page number (1-indexed)
    pub page: u32,
    /// Font name (e.g., "Helvetica-Bold")
    pub font_name: String,
    /// Font size in points
    pub font_size: f32,
    /// Fill color
    pub color: Rgb,
    /// Whether the font appears to be bold
    pub is_bold: bool,
    /// Whether the font appears to be italic
    pub is_italic: bool,
}

impl Span {
    /// Create a new span; style flags are inferred from the font name.
    pub fn new(
        text: String,
        bbox: BBox,
        page: u32,
        font_size: f32,
        font_name: String,
        color: Rgb,
    ) -> Self {
        let lower = font_name.to_lowercase();
        let is_bold = lower.contains("bold") || lower.contains("black") || lower.contains("heavy");
        let is_italic = lower.contains("italic") || lower.contains("oblique");

        Self {
            text,
            bbox,
            page,
            font_name,
            font_size,
            color,
            is_bold,
            is_italic,
        }
    }

    /// Typography of this span, kept on the content area it produces.
    pub fn style(&self) -> TextStyle {
        TextStyle {
            font_name: self.font_name.clone(),
            font_size: self.font_size,
            color: self.color,
            is_bold: self.is_bold,
            is_italic: self.is_italic,
        }
    }
}

/// Original typography of a content area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub font_name: String,
    pub font_size: f32,
    #[serde(default)]
    pub color: Rgb,
    #[serde(default)]
    pub is_bold: bool,
    #[serde(default)]
    pub is_italic: bool,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_name: "Helvetica".to_string(),
            font_size: 11.0,
            color: Rgb::BLACK,
            is_bold: false,
            is_italic: false,
        }
    }
}
