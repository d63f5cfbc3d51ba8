//! # pdftemplate
//!
//! Content-area discovery and in-place personalization for PDF resume
//! templates.
//!
//! A template is an ordinary PDF with placeholder text ("Jane Doe",
//! "jane@example.com", "Experience" ...). Analysis finds those placeholders,
//! classifies them and maps each one to a form-data path. Personalization
//! removes the placeholder glyphs and draws the user's values in their
//! place, keeping the original font, size and color where it can.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdftemplate::{FormData, PersonalizeOptions, TemplateEngine};
//!
//! fn main() -> pdftemplate::Result<()> {
//!     let engine = TemplateEngine::with_defaults()?;
//!
//!     // Discover content areas once and persist them
//!     let template = engine.analyze_file("resume.pdf")?;
//!     std::fs::write("areas.json", template.areas_to_json(Default::default())?)?;
//!
//!     // Fill them for a user
//!     let form = FormData::from_json_file("user.json")?;
//!     let output = engine.personalize_file(
//!         "resume.pdf",
//!         &template,
//!         &form,
//!         &PersonalizeOptions::default(),
//!     )?;
//!     std::fs::write("out.pdf", output.pdf)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Configurable tables**: classifier patterns, section patterns, field
//!   mapping and priorities are plain data (`EngineConfig`)
//! - **Graceful degradation**: page failures, unresolved paths and missing
//!   fonts become warnings, not errors
//! - **Parallel batches**: `analyze_many` uses Rayon across templates
//! - **Preview** (feature `preview`): first-page PNG via tiny-skia
//! - **Async** (feature `async`): Tokio wrappers for blocking calls

pub mod analysis;
pub mod config;
pub mod detect;
pub mod error;
pub mod model;
pub mod parser;
pub mod personalize;

pub use analysis::{
    ContentAreaOptimizer, FieldClassifier, FormFieldMapper, SectionDetector, TemplateAnalyzer,
};
pub use config::EngineConfig;
pub use detect::{check_template_bytes, check_template_path, is_pdf_bytes, PdfHeader};
pub use error::{Error, Result};
pub use model::{
    AreaKind, BBox, ContentArea, FieldType, FormData, FormValue, PageSize, Rgb, SectionKind,
    Span, Template, TextStyle,
};
pub use parser::{AnalyzeOptions, ErrorMode, LopdfBackend, PageSelection, TextBlockExtractor};
pub use personalize::{
    CompatibilityReport, ContentInjector, DynamicSectionExpander, InjectionReport,
    PersonalizeOptions, Personalized,
};

#[cfg(feature = "preview")]
pub use personalize::PreviewOptions;

use std::path::Path;
#[cfg(feature = "async")]
use std::path::PathBuf;
use std::sync::Arc;

use rayon::prelude::*;

/// JSON output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JsonFormat {
    /// Pretty-printed with indentation
    #[default]
    Pretty,
    /// Compact single-line
    Compact,
}

/// The analysis and personalization service.
///
/// Constructed from an [`EngineConfig`] whose tables are compiled once.
/// The value is cheap to clone and can be shared across threads; each call
/// opens its own document handle.
///
/// # Example
///
/// ```no_run
/// use pdftemplate::{AnalyzeOptions, PageSelection, TemplateEngine};
///
/// let engine = TemplateEngine::with_defaults()?;
/// let options = AnalyzeOptions::new().with_pages(PageSelection::Pages(vec![1]));
/// let template = engine.analyze_file_with_options("resume.pdf", &options)?;
/// println!("{} areas", template.len());
/// # Ok::<(), pdftemplate::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct TemplateEngine {
    inner: Arc<EngineInner>,
}

#[derive(Debug)]
struct EngineInner {
    config: EngineConfig,
    analyzer: TemplateAnalyzer,
    injector: ContentInjector,
    expander: DynamicSectionExpander,
}

impl TemplateEngine {
    /// Build an engine; fails with [`Error::Config`] on an invalid pattern.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let analyzer = TemplateAnalyzer::new(&config)?;
        let expander = DynamicSectionExpander::new(config.expander.clone());
        let injector = ContentInjector::new(expander.clone());
        Ok(Self {
            inner: Arc::new(EngineInner {
                config,
                analyzer,
                injector,
                expander,
            }),
        })
    }

    /// Build an engine with the built-in resume tables.
    pub fn with_defaults() -> Result<Self> {
        Self::new(EngineConfig::default())
    }

    /// Build an engine from a JSON configuration file.
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(EngineConfig::from_json_file(path)?)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn analyzer(&self) -> &TemplateAnalyzer {
        &self.inner.analyzer
    }

    /// Analyze a template file with default options.
    pub fn analyze_file<P: AsRef<Path>>(&self, path: P) -> Result<Template> {
        self.analyze_file_with_options(path, &AnalyzeOptions::default())
    }

    /// Analyze a template file.
    pub fn analyze_file_with_options<P: AsRef<Path>>(
        &self,
        path: P,
        options: &AnalyzeOptions,
    ) -> Result<Template> {
        let path = path.as_ref();
        let backend = LopdfBackend::load_file(path)?;
        let template = self.inner.analyzer.analyze(&backend, options)?;
        log::debug!("{}: {} content areas", path.display(), template.len());
        Ok(template.with_source(path.display().to_string()))
    }

    /// Analyze a template held in memory with default options.
    pub fn analyze_bytes(&self, data: &[u8]) -> Result<Template> {
        self.analyze_bytes_with_options(data, &AnalyzeOptions::default())
    }

    /// Analyze a template held in memory.
    pub fn analyze_bytes_with_options(
        &self,
        data: &[u8],
        options: &AnalyzeOptions,
    ) -> Result<Template> {
        let backend = LopdfBackend::load_bytes(data)?;
        self.inner.analyzer.analyze(&backend, options)
    }

    /// Analyze several templates in parallel.
    ///
    /// Results are returned in input order; one failing file does not affect
    /// the others.
    pub fn analyze_many<P>(&self, paths: &[P], options: &AnalyzeOptions) -> Vec<Result<Template>>
    where
        P: AsRef<Path> + Sync,
    {
        paths
            .par_iter()
            .map(|path| self.analyze_file_with_options(path, options))
            .collect()
    }

    /// Fill `template`'s areas in a fresh copy of the template file.
    pub fn personalize_file<P: AsRef<Path>>(
        &self,
        path: P,
        template: &Template,
        form: &FormData,
        options: &PersonalizeOptions,
    ) -> Result<Personalized> {
        let backend = LopdfBackend::load_file(path)?;
        self.inner
            .injector
            .personalize(backend, template, form, options)
    }

    /// Fill `template`'s areas in a template held in memory.
    pub fn personalize_bytes(
        &self,
        data: &[u8],
        template: &Template,
        form: &FormData,
        options: &PersonalizeOptions,
    ) -> Result<Personalized> {
        let backend = LopdfBackend::load_bytes(data)?;
        self.inner
            .injector
            .personalize(backend, template, form, options)
    }

    /// Pre-flight check; never fails.
    pub fn check_compatibility(&self, template: &Template, form: &FormData) -> CompatibilityReport {
        personalize::check_compatibility(template, form, &self.inner.expander)
    }

    /// Analyze a template file on Tokio's blocking pool.
    #[cfg(feature = "async")]
    pub async fn analyze_file_async(&self, path: impl Into<PathBuf>) -> Result<Template> {
        let engine = self.clone();
        let path = path.into();
        tokio::task::spawn_blocking(move || engine.analyze_file(path))
            .await
            .map_err(join_error)?
    }

    /// Personalize a template file on Tokio's blocking pool.
    #[cfg(feature = "async")]
    pub async fn personalize_file_async(
        &self,
        path: impl Into<PathBuf>,
        template: Template,
        form: FormData,
        options: PersonalizeOptions,
    ) -> Result<Personalized> {
        let engine = self.clone();
        let path = path.into();
        tokio::task::spawn_blocking(move || {
            engine.personalize_file(path, &template, &form, &options)
        })
        .await
        .map_err(join_error)?
    }
}

#[cfg(feature = "async")]
fn join_error(err: tokio::task::JoinError) -> Error {
    Error::Io(std::io::Error::other(format!("blocking task failed: {}", err)))
}

/// Analyze a template file with the built-in configuration.
///
/// # Example
///
/// ```no_run
/// let template = pdftemplate::analyze_file("resume.pdf").unwrap();
/// for area in template.areas() {
///     println!("{} -> {}", area.text, area.form_field);
/// }
/// ```
pub fn analyze_file<P: AsRef<Path>>(path: P) -> Result<Template> {
    TemplateEngine::with_defaults()?.analyze_file(path)
}

/// Personalize a template file with the built-in configuration.
pub fn personalize_file<P: AsRef<Path>>(
    path: P,
    template: &Template,
    form: &FormData,
) -> Result<Personalized> {
    TemplateEngine::with_defaults()?.personalize_file(
        path,
        template,
        form,
        &PersonalizeOptions::default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_engine_is_send_sync() {
        assert_send_sync::<TemplateEngine>();
        assert_send_sync::<Template>();
    }

    #[test]
    fn test_default_engine_builds() {
        let engine = TemplateEngine::with_defaults().unwrap();
        assert_eq!(engine.config().optimizer.shift_y, 20.0);
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let config = EngineConfig::from_json_str(
            r#"{"classifier":[{"field_type":"email","patterns":["(unclosed"]}]}"#,
        )
        .unwrap();
        assert!(matches!(TemplateEngine::new(config), Err(Error::Config(_))));
    }

    #[test]
    fn test_analyze_missing_file() {
        let engine = TemplateEngine::with_defaults().unwrap();
        let result = engine.analyze_file("/nonexistent/resume.pdf");
        assert!(matches!(result, Err(Error::TemplateNotFound(_))));
    }

    #[test]
    fn test_analyze_bytes_not_pdf() {
        let engine = TemplateEngine::with_defaults().unwrap();
        let result = engine.analyze_bytes(b"<!DOCTYPE html><html></html>");
        assert!(matches!(result, Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_analyze_bytes_empty() {
        assert!(TemplateEngine::with_defaults().unwrap().analyze_bytes(&[]).is_err());
    }

    #[test]
    fn test_analyze_many_keeps_order() {
        let engine = TemplateEngine::with_defaults().unwrap();
        let results = engine.analyze_many(
            &["/nonexistent/a.pdf", "/nonexistent/b.pdf"],
            &AnalyzeOptions::default(),
        );
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| matches!(r, Err(Error::TemplateNotFound(_)))));
    }

    #[test]
    fn test_json_format_default() {
        assert_eq!(JsonFormat::default(), JsonFormat::Pretty);
    }
}
