//! The analysis pipeline: extract, classify, detect sections, optimize.

use super::classifier::FieldClassifier;
use super::mapper::FormFieldMapper;
use super::optimizer::ContentAreaOptimizer;
use super::sections::SectionDetector;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::model::{AreaKind, ContentArea, PageSize, Template};
use crate::parser::{AnalyzeOptions, ErrorMode, PageExtraction, PdfBackend, TextBlockExtractor};

/// Turns a schema-less template PDF into an ordered list of content areas.
///
/// Holds only compiled, immutable tables; one analyzer can serve any number
/// of documents, each opened by its own backend.
#[derive(Debug, Clone)]
pub struct TemplateAnalyzer {
    classifier: FieldClassifier,
    sections: SectionDetector,
    mapper: FormFieldMapper,
    optimizer: ContentAreaOptimizer,
    min_span_chars: usize,
}

impl TemplateAnalyzer {
    /// Compile the configuration tables.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        Ok(Self {
            classifier: FieldClassifier::new(&config.classifier)?,
            sections: SectionDetector::new(&config.sections)?,
            mapper: FormFieldMapper::new(config.mapping.clone()),
            optimizer: ContentAreaOptimizer::new(config.optimizer.clone()),
            min_span_chars: config.extraction.min_span_chars,
        })
    }

    pub fn classifier(&self) -> &FieldClassifier {
        &self.classifier
    }

    pub fn mapper(&self) -> &FormFieldMapper {
        &self.mapper
    }

    /// Analyze every selected page of a document.
    ///
    /// In lenient mode a page that cannot be decoded contributes no areas;
    /// in strict mode its error is returned.
    pub fn analyze<B: PdfBackend + ?Sized>(
        &self,
        backend: &B,
        options: &AnalyzeOptions,
    ) -> Result<Template> {
        let extractor = TextBlockExtractor::new(backend);
        let mut candidates = Vec::new();
        let mut pages = Vec::new();

        for (page_num, page_id) in backend.pages() {
            if !options.pages.includes(page_num) {
                continue;
            }

            match extractor.extract_page(page_num) {
                Ok(extraction) => {
                    pages.push(extraction.size);
                    candidates.extend(self.page_candidates(&extraction));
                }
                Err(e) => {
                    if options.error_mode == ErrorMode::Strict {
                        return Err(e);
                    }
                    log::warn!("Skipping page {}: {}", page_num, e);
                    let page_box = backend.page_box(page_id);
                    pages.push(PageSize {
                        number: page_num,
                        width: page_box.width(),
                        height: page_box.height(),
                    });
                }
            }
        }

        let raw = candidates.len();
        let areas = self.optimizer.optimize(candidates);
        log::debug!("Optimized {} candidates into {} areas", raw, areas.len());

        Ok(Template::new(areas, pages))
    }

    /// Field candidates from spans followed by section candidates.
    pub fn page_candidates(&self, extraction: &PageExtraction) -> Vec<ContentArea> {
        let mut areas: Vec<ContentArea> = extraction
            .spans
            .iter()
            .enumerate()
            .filter(|(_, span)| span.text.trim().chars().count() >= self.min_span_chars)
            .filter_map(|(seq, span)| {
                let (field_type, confidence) = self.classifier.classify(&span.text.to_lowercase())?;
                log::debug!(
                    "Page {}: {:?} -> {} ({:.2})",
                    extraction.page,
                    span.text,
                    field_type,
                    confidence
                );
                Some(ContentArea {
                    id: format!("p{}_f{}", extraction.page, seq),
                    kind: AreaKind::Field,
                    field_type,
                    section: None,
                    text: span.text.clone(),
                    form_field: self.mapper.path(field_type).to_string(),
                    bbox: span.bbox,
                    source_bbox: None,
                    page: extraction.page,
                    confidence,
                    priority: self.mapper.priority(field_type),
                    original_style: span.style(),
                    is_required: self.mapper.is_required(field_type),
                })
            })
            .collect();

        areas.extend(
            self.sections
                .detect(&extraction.text, &extraction.size, &self.mapper),
        );
        areas
    }
}
