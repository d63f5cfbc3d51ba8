//! Span text classification.

use regex::{Regex, RegexBuilder};

use crate::config::PatternTable;
use crate::error::{Error, Result};
use crate::model::FieldType;

/// Confidence every match starts from.
const BASE_CONFIDENCE: f32 = 0.7;

pub(crate) fn compile_pattern(pattern: &str, multi_line: bool) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .multi_line(multi_line)
        .build()
        .map_err(|e| Error::Config(format!("invalid pattern {:?}: {}", pattern, e)))
}

#[derive(Debug, Clone)]
struct CompiledRule {
    field_type: FieldType,
    patterns: Vec<Regex>,
    exclude: Vec<Regex>,
    confidence_bonus: f32,
}

impl CompiledRule {
    fn matches(&self, text: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(text))
            && !self.exclude.iter().any(|p| p.is_match(text))
    }
}

/// Maps span text to a semantic field type using an ordered rule table.
///
/// Classification is a pure function of the table and the input text.
#[derive(Debug, Clone)]
pub struct FieldClassifier {
    rules: Vec<CompiledRule>,
}

impl FieldClassifier {
    /// Compile a pattern table; fails with [`Error::Config`] on a bad regex.
    pub fn new(table: &PatternTable) -> Result<Self> {
        let rules = table
            .rules
            .iter()
            .map(|rule| {
                Ok(CompiledRule {
                    field_type: rule.field_type,
                    patterns: rule
                        .patterns
                        .iter()
                        .map(|p| compile_pattern(p, false))
                        .collect::<Result<_>>()?,
                    exclude: rule
                        .exclude
                        .iter()
                        .map(|p| compile_pattern(p, false))
                        .collect::<Result<_>>()?,
                    confidence_bonus: rule.confidence_bonus,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rules })
    }

    /// Classify lower-cased span text.
    ///
    /// Returns the first rule whose patterns match (and whose exclusions do
    /// not), with its confidence, or `None` when no rule applies.
    pub fn classify(&self, text: &str) -> Option<(FieldType, f32)> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        self.rules
            .iter()
            .find(|rule| rule.matches(text))
            .map(|rule| (rule.field_type, confidence(text, rule.confidence_bonus)))
    }
}

/// Longer matched text is more likely a real placeholder than noise.
fn confidence(text: &str, bonus: f32) -> f32 {
    let len = text.chars().count();
    let length_bonus = if len > 50 {
        0.2
    } else if len > 20 {
        0.1
    } else {
        0.0
    };
    (BASE_CONFIDENCE + length_bonus + bonus).min(1.0)
}
