//! Section header detection over whole-page text.

use regex::Regex;

use super::classifier::compile_pattern;
use super::mapper::FormFieldMapper;
use crate::config::SectionTable;
use crate::error::Result;
use crate::model::{AreaKind, BBox, ContentArea, FieldType, PageSize, SectionKind, TextStyle};

/// Confidence assigned to a detected section header.
const SECTION_CONFIDENCE: f32 = 0.9;

#[derive(Debug, Clone)]
struct CompiledSection {
    section: SectionKind,
    patterns: Vec<Regex>,
}

/// Finds resume section headers in a page's text.
#[derive(Debug, Clone)]
pub struct SectionDetector {
    sections: Vec<CompiledSection>,
}

impl SectionDetector {
    /// Compile a section table; patterns match case-insensitively per line.
    pub fn new(table: &SectionTable) -> Result<Self> {
        let sections = table
            .rules
            .iter()
            .map(|rule| {
                Ok(CompiledSection {
                    section: rule.section,
                    patterns: rule
                        .patterns
                        .iter()
                        .map(|p| compile_pattern(p, true))
                        .collect::<Result<_>>()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { sections })
    }

    /// Section categories present in `text`, each with the matched header.
    ///
    /// A category is reported at most once, from its first matching pattern.
    pub fn find(&self, text: &str) -> Vec<(SectionKind, String)> {
        self.sections
            .iter()
            .filter_map(|s| {
                s.patterns
                    .iter()
                    .find_map(|p| p.find(text))
                    .map(|m| (s.section, m.as_str().trim().to_string()))
            })
            .collect()
    }

    /// Emit one section area per detected category on a page.
    ///
    /// Section areas cover the full page rectangle.
    pub fn detect(
        &self,
        text: &str,
        page: &PageSize,
        mapper: &FormFieldMapper,
    ) -> Vec<ContentArea> {
        self.find(text)
            .into_iter()
            .map(|(section, header)| {
                log::debug!("Page {}: section '{}' from {:?}", page.number, section, header);
                ContentArea {
                    id: format!("p{}_s_{}", page.number, section),
                    kind: AreaKind::Section,
                    field_type: FieldType::SectionHeader,
                    section: Some(section),
                    text: header,
                    form_field: mapper.path(FieldType::SectionHeader).to_string(),
                    bbox: BBox::page(page.width, page.height),
                    source_bbox: None,
                    page: page.number,
                    confidence: SECTION_CONFIDENCE,
                    priority: mapper.priority(FieldType::SectionHeader),
                    original_style: TextStyle::default(),
                    is_required: false,
                }
            })
            .collect()
    }
}
