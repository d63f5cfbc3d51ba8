//! Analyzed templates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::ContentArea;
use crate::error::Result;
use crate::JsonFormat;

/// Dimensions of one template page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    /// Page number (1-indexed)
    pub number: u32,
    /// Page width in points
    pub width: f32,
    /// Page height in points
    pub height: f32,
}

/// An immutable snapshot of a template's content areas.
///
/// Cloning is cheap and clones share the area list, so a template can be
/// handed to concurrent generation jobs. Edits produce a new snapshot via
/// [`Template::with_areas`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    areas: Arc<[ContentArea]>,
    #[serde(default)]
    pages: Vec<PageSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    analyzed_at: DateTime<Utc>,
}

impl Template {
    /// Build a snapshot; areas are stably ordered by page.
    pub fn new(mut areas: Vec<ContentArea>, pages: Vec<PageSize>) -> Self {
        areas.sort_by_key(|a| a.page);
        Self {
            areas: areas.into(),
            pages,
            source: None,
            analyzed_at: Utc::now(),
        }
    }

    /// Record where the template came from.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// New snapshot with a replaced area list; this one is left untouched.
    pub fn with_areas(&self, areas: Vec<ContentArea>) -> Self {
        let mut next = Self::new(areas, self.pages.clone());
        next.source = self.source.clone();
        next
    }

    pub fn areas(&self) -> &[ContentArea] {
        &self.areas
    }

    pub fn pages(&self) -> &[PageSize] {
        &self.pages
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn analyzed_at(&self) -> DateTime<Utc> {
        self.analyzed_at
    }

    pub fn page_size(&self, number: u32) -> Option<&PageSize> {
        self.pages.iter().find(|p| p.number == number)
    }

    /// Areas on one page, in stored order.
    pub fn areas_on_page(&self, page: u32) -> impl Iterator<Item = &ContentArea> {
        self.areas.iter().filter(move |a| a.page == page)
    }

    /// Look up an area by id.
    pub fn area(&self, id: &str) -> Option<&ContentArea> {
        self.areas.iter().find(|a| a.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    /// Serialize only the area list (the persistence boundary format).
    pub fn areas_to_json(&self, format: JsonFormat) -> Result<String> {
        let json = match format {
            JsonFormat::Pretty => serde_json::to_string_pretty(&*self.areas)?,
            JsonFormat::Compact => serde_json::to_string(&*self.areas)?,
        };
        Ok(json)
    }

    /// Rebuild a template from a persisted area list.
    ///
    /// Page sizes are unknown at this point; the injector reads them from
    /// the document it opens.
    pub fn from_areas_json(json: &str) -> Result<Self> {
        let areas: Vec<ContentArea> = serde_json::from_str(json)?;
        Ok(Self::new(areas, Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AreaKind, BBox, FieldType, TextStyle};

    fn area(id: &str, page: u32) -> ContentArea {
        ContentArea {
            id: id.to_string(),
            kind: AreaKind::Field,
            field_type: FieldType::Email,
            section: None,
            text: id.to_string(),
            form_field: "personalInfo.email".to_string(),
            bbox: BBox::new(100.0, 130.0, 300.0, 145.0),
            source_bbox: None,
            page,
            confidence: 0.95,
            priority: 2,
            original_style: TextStyle::default(),
            is_required: true,
        }
    }

    #[test]
    fn test_areas_ordered_by_page() {
        let t = Template::new(vec![area("b", 2), area("a", 1), area("c", 2)], vec![]);
        let ids: Vec<_> = t.areas().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(t.areas_on_page(2).count(), 2);
    }

    #[test]
    fn test_with_areas_leaves_original_untouched() {
        let t = Template::new(vec![area("a", 1)], vec![]).with_source("resume.pdf");
        let edited = t.with_areas(vec![area("a", 1), area("b", 1)]);
        assert_eq!(t.len(), 1);
        assert_eq!(edited.len(), 2);
        assert_eq!(edited.source(), Some("resume.pdf"));
    }

    #[test]
    fn test_areas_json_round_trip() {
        let t = Template::new(vec![area("p1_f0", 1)], vec![]);
        let json = t.areas_to_json(JsonFormat::Compact).unwrap();
        assert!(json.starts_with('['));
        let back = Template::from_areas_json(&json).unwrap();
        assert_eq!(back.areas(), t.areas());
    }

    #[test]
    fn test_full_template_serde() {
        let t = Template::new(
            vec![area("p1_f0", 1)],
            vec![PageSize {
                number: 1,
                width: 612.0,
                height: 792.0,
            }],
        );
        let json = serde_json::to_string(&t).unwrap();
        let back: Template = serde_json::from_str(&json).unwrap();
        assert_eq!(back.page_size(1).map(|p| p.width), Some(612.0));
        assert_eq!(back.analyzed_at(), t.analyzed_at());
    }
}
