//! Field type to form path lookup.

use crate::config::FieldMapping;
use crate::model::{FieldType, CUSTOM_FIELD};

/// Translates a field type into its destination path(s) in form data,
/// its placement priority, and whether it must be filled.
#[derive(Debug, Clone, Default)]
pub struct FormFieldMapper {
    mapping: FieldMapping,
}

impl FormFieldMapper {
    pub fn new(mapping: FieldMapping) -> Self {
        Self { mapping }
    }

    /// Destination path(s); unmapped types are never auto-filled.
    pub fn path(&self, field_type: FieldType) -> &str {
        self.mapping
            .paths
            .get(&field_type)
            .map(String::as_str)
            .unwrap_or(CUSTOM_FIELD)
    }

    /// Placement priority; lower is placed first.
    pub fn priority(&self, field_type: FieldType) -> u32 {
        self.mapping
            .priorities
            .get(&field_type)
            .copied()
            .unwrap_or(self.mapping.default_priority)
    }

    pub fn is_required(&self, field_type: FieldType) -> bool {
        self.mapping.required.contains(&field_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lookups() {
        let mapper = FormFieldMapper::default();
        assert_eq!(
            mapper.path(FieldType::Name),
            "personalInfo.firstName personalInfo.lastName"
        );
        assert_eq!(mapper.path(FieldType::Company), "experience[0].company");
        assert_eq!(mapper.path(FieldType::SectionHeader), "custom");
        assert_eq!(mapper.priority(FieldType::Email), 2);
        assert_eq!(mapper.priority(FieldType::Website), 99);
        assert!(mapper.is_required(FieldType::Email));
        assert!(!mapper.is_required(FieldType::Skills));
    }

    #[test]
    fn test_override_schema() {
        let mut mapping = FieldMapping::default();
        mapping.paths.insert(FieldType::Email, "contact.mail".to_string());
        mapping.paths.remove(&FieldType::Phone);
        let mapper = FormFieldMapper::new(mapping);
        assert_eq!(mapper.path(FieldType::Email), "contact.mail");
        assert_eq!(mapper.path(FieldType::Phone), "custom");
    }
}
