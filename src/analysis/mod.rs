//! Template analysis: span classification, section detection, area
//! optimization, and form path mapping.

mod classifier;
mod mapper;
mod optimizer;
mod pipeline;
mod sections;

pub use classifier::FieldClassifier;
pub use mapper::FormFieldMapper;
pub use optimizer::{normalized_key, ContentAreaOptimizer};
pub use pipeline::TemplateAnalyzer;
pub use sections::SectionDetector;
