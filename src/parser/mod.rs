//! PDF parsing module.

pub mod backend;
pub(crate) mod content;
mod extractor;
pub mod metrics;
mod options;

pub use backend::{BackendFontInfo, LopdfBackend, PageBox, PdfBackend};
pub use metrics::GlyphWidths;
pub use extractor::{normalize_text, page_text, PageExtraction, TextBlockExtractor};
pub use options::{AnalyzeOptions, ErrorMode, PageSelection};
