//! Content areas: addressable, typed regions of a template page.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{BBox, TextStyle};

/// Sentinel `form_field` value for areas that must never be auto-filled.
pub const CUSTOM_FIELD: &str = "custom";

/// Whether an area came from span classification or section detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaKind {
    Field,
    Section,
}

/// Semantic meaning of an area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Name,
    Email,
    Phone,
    Location,
    Website,
    Summary,
    Experience,
    Company,
    Position,
    Institution,
    Degree,
    Dates,
    Skills,
    SectionHeader,
    Custom,
}

impl FieldType {
    /// All field types, in declaration order.
    pub const ALL: [FieldType; 15] = [
        FieldType::Name,
        FieldType::Email,
        FieldType::Phone,
        FieldType::Location,
        FieldType::Website,
        FieldType::Summary,
        FieldType::Experience,
        FieldType::Company,
        FieldType::Position,
        FieldType::Institution,
        FieldType::Degree,
        FieldType::Dates,
        FieldType::Skills,
        FieldType::SectionHeader,
        FieldType::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Name => "name",
            FieldType::Email => "email",
            FieldType::Phone => "phone",
            FieldType::Location => "location",
            FieldType::Website => "website",
            FieldType::Summary => "summary",
            FieldType::Experience => "experience",
            FieldType::Company => "company",
            FieldType::Position => "position",
            FieldType::Institution => "institution",
            FieldType::Degree => "degree",
            FieldType::Dates => "dates",
            FieldType::Skills => "skills",
            FieldType::SectionHeader => "section_header",
            FieldType::Custom => "custom",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resume section categories recognized by the section detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Summary,
    Experience,
    Education,
    Skills,
    Projects,
    Certifications,
    Languages,
    Volunteer,
    Awards,
    Interests,
    References,
}

impl SectionKind {
    /// Key of the section's array in form data, e.g. `experience`.
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::Summary => "summary",
            SectionKind::Experience => "experience",
            SectionKind::Education => "education",
            SectionKind::Skills => "skills",
            SectionKind::Projects => "projects",
            SectionKind::Certifications => "certifications",
            SectionKind::Languages => "languages",
            SectionKind::Volunteer => "volunteer",
            SectionKind::Awards => "awards",
            SectionKind::Interests => "interests",
            SectionKind::References => "references",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted, addressable region of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentArea {
    /// Stable id derived from page and sequence, e.g. `p1_f3`
    pub id: String,
    pub kind: AreaKind,
    pub field_type: FieldType,
    /// Section category for section areas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<SectionKind>,
    /// Placeholder text found in the template
    #[serde(default)]
    pub text: String,
    /// Destination path(s) in form data, or `"custom"`
    #[serde(default)]
    pub form_field: String,
    /// Placement rectangle
    pub bbox: BBox,
    /// Rectangle of the original glyphs when placement was shifted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_bbox: Option<BBox>,
    /// Page number (1-indexed)
    pub page: u32,
    pub confidence: f32,
    /// Lower is placed first
    pub priority: u32,
    #[serde(default)]
    pub original_style: TextStyle,
    #[serde(default)]
    pub is_required: bool,
}

impl ContentArea {
    /// Whether the injector may write into this area.
    pub fn is_fillable(&self) -> bool {
        let field = self.form_field.trim();
        !field.is_empty() && field != CUSTOM_FIELD
    }

    /// Individual destination paths of a space-separated `form_field`.
    pub fn form_paths(&self) -> impl Iterator<Item = &str> {
        self.form_field.split_whitespace()
    }

    /// Rectangle whose existing glyphs are removed before reinsertion.
    pub fn redact_bbox(&self) -> BBox {
        self.source_bbox.unwrap_or(self.bbox)
    }
}
