//! Form-data path resolution.
//!
//! Paths use dot notation with optional brackets for list indices:
//! `personalInfo.email`, `experience[0].company`, `experience.0.company`.

use crate::model::{FormData, FormValue};

/// Rewrite `a[0].b` as `a.0.b`.
pub fn normalize_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.trim().chars() {
        match c {
            '[' => out.push('.'),
            ']' => {}
            _ => out.push(c),
        }
    }
    out
}

/// Walk a path to the node it addresses, if every step exists.
pub fn lookup<'a>(data: &'a FormData, path: &str) -> Option<&'a FormValue> {
    let normalized = normalize_path(path);
    let mut segments = normalized.split('.').filter(|s| !s.is_empty());

    let first = segments.next()?;
    let mut node = data.get(first)?;

    for segment in segments {
        node = match node {
            FormValue::Record(map) => map.get(segment)?,
            FormValue::List(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(node)
}

/// Resolve a path to display text.
///
/// Total: any failure (missing key, out-of-range index, type mismatch)
/// yields the empty string.
pub fn resolve(data: &FormData, path: &str) -> String {
    match lookup(data, path) {
        Some(value) => value.to_display_string(),
        None => {
            log::debug!("Form path {:?} did not resolve", path);
            String::new()
        }
    }
}

/// Resolve every space-separated path of a `form_field` and join the
/// non-empty results with a single space.
pub fn resolve_field(data: &FormData, form_field: &str) -> String {
    form_field
        .split_whitespace()
        .map(|path| resolve(data, path))
        .filter(|value| !value.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(json: &str) -> FormData {
        FormData::from_json_str(json).unwrap()
    }

    #[test]
    fn test_resolve_properties() {
        assert_eq!(resolve(&form("{}"), "a.b.c"), "");
        assert_eq!(resolve(&form(r#"{"a":{"b":"x"}}"#), "a.b"), "x");
        assert_eq!(resolve(&form(r#"{"a":[{"b":"y"}]}"#), "a.0.b"), "y");
    }

    #[test]
    fn test_bracket_notation() {
        let data = form(r#"{"experience":[{"company":"Acme"},{"company":"Globex"}]}"#);
        assert_eq!(resolve(&data, "experience[1].company"), "Globex");
        assert_eq!(resolve(&data, "experience[2].company"), "");
        assert_eq!(normalize_path("a[0][1].b"), "a.0.1.b");
    }

    #[test]
    fn test_type_mismatches_are_empty() {
        let data = form(r#"{"summary":"text","skills":["Rust","Go"],"n":{"k":1}}"#);
        assert_eq!(resolve(&data, "summary.deeper"), "");
        assert_eq!(resolve(&data, "skills.name"), "");
        assert_eq!(resolve(&data, "skills.-1"), "");
        assert_eq!(resolve(&data, "n"), "");
        assert_eq!(resolve(&data, ""), "");
        assert_eq!(resolve(&data, "..."), "");
    }

    #[test]
    fn test_lists_and_numbers() {
        let data = form(r#"{"skills":["Rust","Go"],"years":5,"gpa":3.75}"#);
        assert_eq!(resolve(&data, "skills"), "Rust, Go");
        assert_eq!(resolve(&data, "skills.1"), "Go");
        assert_eq!(resolve(&data, "years"), "5");
        assert_eq!(resolve(&data, "gpa"), "3.75");
    }

    #[test]
    fn test_resolve_field_joins_paths() {
        let data = form(r#"{"personalInfo":{"firstName":"Jane","lastName":"Doe"}}"#);
        assert_eq!(
            resolve_field(&data, "personalInfo.firstName personalInfo.lastName"),
            "Jane Doe"
        );
        assert_eq!(
            resolve_field(&data, "personalInfo.firstName personalInfo.middle"),
            "Jane"
        );
        assert_eq!(resolve_field(&data, "custom"), "");
    }

    #[test]
    fn test_resolve_never_panics_on_odd_paths() {
        let data = form(r#"{"a":[[1,2],[3]],"b":{"c":null}}"#);
        let paths = [
            "a]",
            "[",
            "a[0]",
            "a[0][1]",
            "b.c",
            "a.0.0.0",
            "ü.ß",
            "a[999999999999999999999]",
        ];
        for path in paths {
            let _ = resolve(&data, path);
        }
        assert_eq!(resolve(&data, "a[0][1]"), "2");
        assert_eq!(resolve(&data, "a[0]"), "1, 2");
    }
}
