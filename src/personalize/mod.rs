//! Personalization: fill a template's content areas with form data.
//!
//! Values are resolved from [`FormData`](crate::model::FormData) by path,
//! the original glyphs inside each area are removed from the page content
//! stream and the new text is drawn at the area anchor. Everything except
//! opening and saving the document degrades to report entries.

mod compat;
mod expander;
mod injector;
mod resolve;
mod writer;

#[cfg(feature = "preview")]
mod preview;

pub use compat::{check_compatibility, CompatibilityReport};
pub use expander::{DynamicSectionExpander, ExpansionPlan, SectionOverflow};
pub use injector::{ContentInjector, InjectionReport, PersonalizeOptions, Personalized};
pub use resolve::{lookup, normalize_path, resolve, resolve_field};
pub use writer::{
    apply_page_edit, encode_win_ansi, PageEdit, PageEditOutcome, TextInsertion,
};

#[cfg(feature = "preview")]
pub use preview::{render_preview, PreviewOptions};
