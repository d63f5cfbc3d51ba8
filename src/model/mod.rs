//! Data model shared by the analysis and personalization stages.
//!
//! Spans are ephemeral and live only for one analysis pass. Content areas
//! and templates are the persisted outcome; form data is supplied per
//! generation request.

mod area;
mod form;
mod geometry;
mod span;
mod template;

pub use area::{AreaKind, ContentArea, FieldType, SectionKind, CUSTOM_FIELD};
pub use form::{FormData, FormValue};
pub use geometry::{BBox, Rgb};
pub use span::{Span, TextStyle};
pub use template::{PageSize, Template};
