//! Pre-flight compatibility check between a template and form data.

use serde::{Deserialize, Serialize};

use super::expander::DynamicSectionExpander;
use super::resolve::{resolve, resolve_field};
use super::writer::DEFAULT_FONT_SIZE;
use crate::model::{FormData, Template};
use crate::parser::content::AVG_CHAR_WIDTH;

/// Result of [`check_compatibility`]; never an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityReport {
    /// True when every required area resolves to a value
    pub is_compatible: bool,
    /// Each path of a required area that resolved to `""`, once
    pub missing_fields: Vec<String>,
    pub warnings: Vec<String>,
}

/// Check whether `form` can fill `template` without gaps.
///
/// Values that are likely too wide for their area and repeatable sections
/// with entries that have no slot are reported as warnings; they never make a
/// template incompatible.
pub fn check_compatibility(
    template: &Template,
    form: &FormData,
    expander: &DynamicSectionExpander,
) -> CompatibilityReport {
    let mut missing_fields: Vec<String> = Vec::new();
    let mut warnings = Vec::new();

    for area in template.areas().iter().filter(|a| a.is_fillable()) {
        if area.is_required {
            for path in area.form_paths() {
                let unresolved = resolve(form, path).trim().is_empty();
                if unresolved && !missing_fields.iter().any(|m| m == path) {
                    missing_fields.push(path.to_string());
                }
            }
        }

        let value = resolve_field(form, &area.form_field);
        if value.is_empty() {
            continue;
        }

        let size = if area.original_style.font_size > 0.0 {
            area.original_style.font_size
        } else {
            DEFAULT_FONT_SIZE
        };
        let estimated = value.chars().count() as f32 * AVG_CHAR_WIDTH * size;
        if estimated > area.bbox.width() {
            warnings.push(format!(
                "value for '{}' (area {}) is about {:.0}pt wide but the area is {:.0}pt",
                area.form_field,
                area.id,
                estimated,
                area.bbox.width()
            ));
        }
    }

    warnings.extend(
        expander
            .overflows(template.areas(), form)
            .iter()
            .map(|o| o.message()),
    );

    CompatibilityReport {
        is_compatible: missing_fields.is_empty(),
        missing_fields,
        warnings,
    }
}
