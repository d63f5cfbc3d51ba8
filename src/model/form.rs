//! Caller-supplied form data.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Error, Result};

/// A node of the nested form-data document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<FormValue>),
    Record(BTreeMap<String, FormValue>),
}

impl FormValue {
    /// Text rendering of a leaf value.
    ///
    /// Lists join their leaf elements with `", "`; records and nulls render
    /// as the empty string.
    pub fn to_display_string(&self) -> String {
        match self {
            FormValue::Null | FormValue::Record(_) => String::new(),
            FormValue::Bool(b) => b.to_string(),
            FormValue::Number(n) => format_number(*n),
            FormValue::Text(s) => s.clone(),
            FormValue::List(items) => items
                .iter()
                .filter(|item| !matches!(item, FormValue::List(_)))
                .map(FormValue::to_display_string)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    pub fn as_record(&self) -> Option<&BTreeMap<String, FormValue>> {
        match self {
            FormValue::Record(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FormValue]> {
        match self {
            FormValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<&str> for FormValue {
    fn from(s: &str) -> Self {
        FormValue::Text(s.to_string())
    }
}

impl From<String> for FormValue {
    fn from(s: String) -> Self {
        FormValue::Text(s)
    }
}

/// Integral values print without a fractional part.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Form data for one generation request.
///
/// The top level is always a record, e.g.
/// `{"personalInfo": {...}, "experience": [...], "summary": "..."}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormData {
    root: BTreeMap<String, FormValue>,
}

impl FormData {
    pub fn new(root: BTreeMap<String, FormValue>) -> Self {
        let mut data = Self { root };
        data.apply_aliases();
        data
    }

    /// Parse form data from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let root: BTreeMap<String, FormValue> = serde_json::from_str(json)?;
        Ok(Self::new(root))
    }

    /// Parse form data from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Convert an already-parsed JSON value; the top level must be an object.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        if !value.is_object() {
            return Err(Error::Config(
                "form data must be a JSON object at the top level".to_string(),
            ));
        }
        let root: BTreeMap<String, FormValue> = serde_json::from_value(value)?;
        Ok(Self::new(root))
    }

    /// Top-level record.
    pub fn root(&self) -> &BTreeMap<String, FormValue> {
        &self.root
    }

    pub fn get(&self, key: &str) -> Option<&FormValue> {
        self.root.get(key)
    }

    /// Resolve a dot/bracket path to display text; never fails.
    pub fn resolve(&self, path: &str) -> String {
        crate::personalize::resolve(self, path)
    }

    /// Number of entries in a repeatable section (0 when absent or scalar).
    pub fn entry_count(&self, section: &str) -> usize {
        self.root
            .get(section)
            .and_then(FormValue::as_list)
            .map_or(0, <[FormValue]>::len)
    }

    /// The public payload uses `workExperience`; the default mapping targets
    /// `experience`.
    fn apply_aliases(&mut self) {
        if !self.root.contains_key("experience") {
            if let Some(work) = self.root.get("workExperience").cloned() {
                self.root.insert("experience".to_string(), work);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_form() {
        let form = FormData::from_json_str(
            r#"{"personalInfo":{"email":"john@x.com","age":42},"skills":["Rust","SQL"]}"#,
        )
        .unwrap();
        assert_eq!(form.entry_count("skills"), 2);
        assert!(matches!(
            form.get("personalInfo"),
            Some(FormValue::Record(_))
        ));
    }

    #[test]
    fn test_display_string_rules() {
        assert_eq!(FormValue::Number(3.0).to_display_string(), "3");
        assert_eq!(FormValue::Number(2.5).to_display_string(), "2.5");
        assert_eq!(FormValue::Bool(true).to_display_string(), "true");
        assert_eq!(FormValue::Null.to_display_string(), "");

        let list = FormValue::List(vec!["Rust".into(), FormValue::Number(7.0), "Go".into()]);
        assert_eq!(list.to_display_string(), "Rust, 7, Go");

        let record = FormValue::Record(BTreeMap::new());
        assert_eq!(record.to_display_string(), "");
    }

    #[test]
    fn test_work_experience_alias() {
        let form =
            FormData::from_json_str(r#"{"workExperience":[{"company":"Acme"}]}"#).unwrap();
        assert_eq!(form.entry_count("experience"), 1);
    }

    #[test]
    fn test_alias_does_not_override() {
        let form = FormData::from_json_str(
            r#"{"workExperience":[{"company":"A"},{"company":"B"}],"experience":[{"company":"C"}]}"#,
        )
        .unwrap();
        assert_eq!(form.entry_count("experience"), 1);
    }

    #[test]
    fn test_from_value_rejects_non_object() {
        let result = FormData::from_value(serde_json::json!(["a", "b"]));
        assert!(result.is_err());
    }
}
