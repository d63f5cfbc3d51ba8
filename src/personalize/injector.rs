//! The personalization engine: resolve values, redact, reinsert.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::expander::DynamicSectionExpander;
use super::resolve::resolve_field;
use super::writer::{apply_page_edit, PageEdit, TextInsertion};
use crate::error::Result;
use crate::model::{AreaKind, ContentArea, FormData, Template};
use crate::parser::{LopdfBackend, PdfBackend};

#[cfg(feature = "preview")]
use super::preview::{render_preview, PreviewOptions};

/// Options for one personalization run.
#[derive(Debug, Clone, Default)]
pub struct PersonalizeOptions {
    /// Stack extra entries of repeatable sections below the template slot
    pub expand_sections: bool,
    /// Also render a first-page preview image
    #[cfg(feature = "preview")]
    pub preview: Option<PreviewOptions>,
}

impl PersonalizeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable dynamic section expansion.
    pub fn with_expansion(mut self) -> Self {
        self.expand_sections = true;
        self
    }

    /// Request a preview image.
    #[cfg(feature = "preview")]
    pub fn with_preview(mut self, options: PreviewOptions) -> Self {
        self.preview = Some(options);
        self
    }
}

/// What the injector did with each area.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InjectionReport {
    /// Areas whose text was replaced
    pub filled: Vec<String>,
    /// Field areas left untouched, with the reason
    pub skipped: Vec<(String, String)>,
    /// Areas drawn with a substitute font
    pub font_fallbacks: Vec<String>,
    pub warnings: Vec<String>,
}

/// Output of a personalization run.
#[derive(Debug, Clone)]
pub struct Personalized {
    /// The personalized PDF
    pub pdf: Vec<u8>,
    pub report: InjectionReport,
    /// PNG of the first page, when requested
    pub preview: Option<Vec<u8>>,
}

/// Rewrites a template's content areas with form data.
///
/// Reads the template without modifying it; all mutation happens on the
/// document owned by the backend passed in.
#[derive(Debug, Clone, Default)]
pub struct ContentInjector {
    expander: DynamicSectionExpander,
}

impl ContentInjector {
    pub fn new(expander: DynamicSectionExpander) -> Self {
        Self { expander }
    }

    /// Personalize the document in `backend` and serialize it.
    pub fn personalize(
        &self,
        mut backend: LopdfBackend,
        template: &Template,
        form: &FormData,
        options: &PersonalizeOptions,
    ) -> Result<Personalized> {
        #[cfg(feature = "preview")]
        let first_page = options.preview.as_ref().map(|_| {
            crate::parser::TextBlockExtractor::new(&backend)
                .extract_page(1)
                .map_err(|e| log::warn!("Preview source unavailable: {}", e))
                .ok()
        });

        let (edits, mut report) = self.plan(&backend, template, form, options);
        self.apply(&mut backend, &edits, &mut report);
        let pdf = backend.save_to_vec()?;

        #[cfg(feature = "preview")]
        let preview = match (options.preview.as_ref(), first_page.flatten()) {
            (Some(preview_options), Some(page)) => {
                let edit = edits.get(&1).cloned().unwrap_or_default();
                Some(render_preview(&page, &edit, preview_options)?)
            }
            _ => None,
        };
        #[cfg(not(feature = "preview"))]
        let preview = None;

        Ok(Personalized {
            pdf,
            report,
            preview,
        })
    }

    /// Apply all edits to the document in place.
    pub fn inject(
        &self,
        backend: &mut LopdfBackend,
        template: &Template,
        form: &FormData,
        options: &PersonalizeOptions,
    ) -> InjectionReport {
        let (edits, mut report) = self.plan(&*backend, template, form, options);
        self.apply(backend, &edits, &mut report);
        report
    }

    /// Group resolved values into per-page edits.
    fn plan<B: PdfBackend + ?Sized>(
        &self,
        backend: &B,
        template: &Template,
        form: &FormData,
        options: &PersonalizeOptions,
    ) -> (BTreeMap<u32, PageEdit>, InjectionReport) {
        let pages = backend.pages();
        let mut edits: BTreeMap<u32, PageEdit> = BTreeMap::new();
        let mut report = InjectionReport::default();

        for area in template.areas() {
            let Some(value) = self.value_for(area, form, &mut report) else {
                continue;
            };
            if !pages.contains_key(&area.page) {
                report
                    .skipped
                    .push((area.id.clone(), format!("page {} not in document", area.page)));
                continue;
            }

            let edit = edits.entry(area.page).or_default();
            edit.redactions.push(area.redact_bbox());
            edit.insertions.push(insertion(area, value));
        }

        if options.expand_sections {
            let heights: BTreeMap<u32, f32> = pages
                .iter()
                .map(|(num, id)| (*num, backend.page_box(*id).height()))
                .collect();
            let plan = self.expander.expand(template.areas(), form, &heights);
            report.warnings.extend(plan.warnings);

            for area in &plan.areas {
                if let Some(value) = self.value_for(area, form, &mut report) {
                    // Stacked copies land on empty space; nothing to redact.
                    edits
                        .entry(area.page)
                        .or_default()
                        .insertions
                        .push(insertion(area, value));
                }
            }
        }

        (edits, report)
    }

    /// Resolved text for an area, or `None` (recorded as skipped).
    fn value_for(
        &self,
        area: &ContentArea,
        form: &FormData,
        report: &mut InjectionReport,
    ) -> Option<String> {
        if !area.is_fillable() {
            if area.kind == AreaKind::Field {
                report
                    .skipped
                    .push((area.id.clone(), "not auto-filled".to_string()));
            }
            return None;
        }

        let value = resolve_field(form, &area.form_field);
        if value.is_empty() {
            log::debug!("Area {}: no value for {:?}", area.id, area.form_field);
            report
                .skipped
                .push((area.id.clone(), format!("no value for '{}'", area.form_field)));
            return None;
        }
        Some(value)
    }

    fn apply(
        &self,
        backend: &mut LopdfBackend,
        edits: &BTreeMap<u32, PageEdit>,
        report: &mut InjectionReport,
    ) {
        for (page, edit) in edits {
            match apply_page_edit(backend, *page, edit) {
                Ok(outcome) => {
                    report
                        .filled
                        .extend(edit.insertions.iter().map(|i| i.area_id.clone()));
                    report.font_fallbacks.extend(outcome.font_fallbacks);
                }
                Err(e) => {
                    log::warn!("Page {}: rewrite failed: {}", page, e);
                    report.warnings.push(format!("page {} left unchanged: {}", page, e));
                    report.skipped.extend(
                        edit.insertions
                            .iter()
                            .map(|i| (i.area_id.clone(), format!("page {} rewrite failed", page))),
                    );
                }
            }
        }
    }
}

fn insertion(area: &ContentArea, text: String) -> TextInsertion {
    TextInsertion {
        area_id: area.id.clone(),
        text,
        bbox: area.bbox,
        style: area.original_style.clone(),
    }
}
