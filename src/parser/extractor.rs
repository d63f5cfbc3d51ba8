//! Span extraction from page content streams.
//!
//! Walks each page's operations with a [`ContentState`], decodes shown text
//! through the page fonts, and emits one [`Span`] per text-show operation
//! with a top-left page-space bounding box. Page text is rebuilt by grouping
//! spans into lines by baseline.

use std::collections::HashMap;

use unicode_normalization::UnicodeNormalization;

use super::backend::{PageId, PdfBackend};
use super::content::{decode_shown_text, is_text_show, ContentState, DESCENT};
use crate::error::{Error, Result};
use crate::model::{PageSize, Span};

/// Everything extracted from one page.
#[derive(Debug, Clone)]
pub struct PageExtraction {
    /// Page number (1-indexed)
    pub page: u32,
    pub size: PageSize,
    /// Spans in content stream order
    pub spans: Vec<Span>,
    /// Page text, one line per baseline, top to bottom
    pub text: String,
}

/// Extracts positioned spans from the pages of a document.
pub struct TextBlockExtractor<'a, B: PdfBackend + ?Sized> {
    backend: &'a B,
}

impl<'a, B: PdfBackend + ?Sized> TextBlockExtractor<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.backend.pages().len() as u32
    }

    /// Extract one page.
    ///
    /// Failures are reported as [`Error::PageExtraction`] so callers can
    /// decide whether to skip the page.
    pub fn extract_page(&self, page_num: u32) -> Result<PageExtraction> {
        let pages = self.backend.pages();
        let page_id = *pages
            .get(&page_num)
            .ok_or(Error::PageOutOfRange(page_num, pages.len() as u32))?;

        self.extract_page_inner(page_num, page_id)
            .map_err(|e| match e {
                Error::PageExtraction { .. } => e,
                other => Error::PageExtraction {
                    page: page_num,
                    reason: other.to_string(),
                },
            })
    }

    fn extract_page_inner(&self, page_num: u32, page_id: PageId) -> Result<PageExtraction> {
        let page_box = self.backend.page_box(page_id);
        let size = PageSize {
            number: page_num,
            width: page_box.width(),
            height: page_box.height(),
        };

        let fonts: HashMap<Vec<u8>, String> = self
            .backend
            .page_fonts(page_id)?
            .into_iter()
            .map(|f| (f.name, f.base_font))
            .collect();

        let content = self.backend.page_content(page_id)?;
        let ops = if content.is_empty() {
            Vec::new()
        } else {
            self.backend.decode_content(&content)?
        };

        let mut state = ContentState::new();
        let mut spans = Vec::new();

        for op in &ops {
            state.apply(op);
            if !is_text_show(&op.operator) || !state.in_text() {
                continue;
            }

            let raw = decode_shown_text(self.backend, page_id, state.font(), op);
            let chars = raw.chars().count();
            let text = normalize_text(&raw);

            if !text.is_empty() {
                let run = state.glyph_run(chars);
                let font_name = fonts
                    .get(state.font())
                    .cloned()
                    .unwrap_or_else(|| String::from_utf8_lossy(state.font()).to_string());
                spans.push(Span::new(
                    text,
                    run.to_page_bbox(&page_box),
                    page_num,
                    run.size,
                    font_name,
                    state.fill(),
                ));
            }
            state.advance_shown(op, chars);
        }

        log::debug!("Page {}: extracted {} spans", page_num, spans.len());

        let text = page_text(&spans);
        Ok(PageExtraction {
            page: page_num,
            size,
            spans,
            text,
        })
    }
}

/// NFKC-normalize and collapse whitespace runs to single spaces.
pub fn normalize_text(text: &str) -> String {
    let normalized: String = text.nfkc().collect();
    normalized.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Rebuild page text by grouping spans into lines.
///
/// Spans whose baselines differ by at most 30% of the font size share a
/// line; lines run top to bottom and spans within a line left to right.
pub fn page_text(spans: &[Span]) -> String {
    let baseline = |s: &Span| s.bbox.y1 - DESCENT * s.font_size;

    let mut ordered: Vec<&Span> = spans.iter().collect();
    ordered.sort_by(|a, b| {
        baseline(a)
            .partial_cmp(&baseline(b))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(
                a.bbox
                    .x0
                    .partial_cmp(&b.bbox.x0)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
    });

    let mut lines: Vec<Vec<&Span>> = Vec::new();
    let mut current_y: Option<f32> = None;

    for span in ordered {
        let y = baseline(span);
        let tolerance = span.font_size * 0.3;
        match current_y {
            Some(line_y) if (y - line_y).abs() <= tolerance => {
                if let Some(line) = lines.last_mut() {
                    line.push(span);
                }
            }
            _ => {
                current_y = Some(y);
                lines.push(vec![span]);
            }
        }
    }

    lines
        .into_iter()
        .map(|mut line| {
            line.sort_by(|a, b| {
                a.bbox
                    .x0
                    .partial_cmp(&b.bbox.x0)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            line.iter()
                .map(|s| s.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
