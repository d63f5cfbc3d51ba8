//! Template input validation.
//!
//! Runs before a document handle is opened so that a missing file and a
//! non-PDF file are reported as distinct fatal errors instead of a generic
//! parse failure.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";

/// Readers accept the header anywhere in the first kilobyte.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// Header information of a template file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfHeader {
    /// PDF version (e.g., "1.7", "2.0")
    pub version: String,
    /// Byte offset of the `%PDF-` marker
    pub offset: usize,
}

impl std::fmt::Display for PdfHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PDF {}", self.version)
    }
}

/// Validate a template path.
///
/// # Returns
/// * `Err(Error::TemplateNotFound)` if nothing exists at `path`
/// * `Err(Error::UnknownFormat)` if the file has no PDF header
pub fn check_template_path<P: AsRef<Path>>(path: P) -> Result<PdfHeader> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::TemplateNotFound(path.to_path_buf()));
    }

    let mut header = Vec::with_capacity(HEADER_SEARCH_WINDOW);
    File::open(path)?
        .take(HEADER_SEARCH_WINDOW as u64)
        .read_to_end(&mut header)?;
    check_template_bytes(&header)
}

/// Validate in-memory template bytes.
pub fn check_template_bytes(data: &[u8]) -> Result<PdfHeader> {
    let window = &data[..data.len().min(HEADER_SEARCH_WINDOW)];
    let offset = window
        .windows(PDF_MAGIC.len())
        .position(|w| w == PDF_MAGIC)
        .ok_or(Error::UnknownFormat)?;

    let version_start = offset + PDF_MAGIC.len();
    let version = data
        .get(version_start..version_start + 3)
        .map(|v| String::from_utf8_lossy(v).to_string())
        .filter(|v| is_valid_version(v))
        .ok_or(Error::UnknownFormat)?;

    Ok(PdfHeader { version, offset })
}

/// Check if bytes carry a PDF header.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    check_template_bytes(data).is_ok()
}

fn is_valid_version(version: &str) -> bool {
    let bytes = version.as_bytes();
    bytes.len() == 3 && bytes[0].is_ascii_digit() && bytes[1] == b'.' && bytes[2].is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_detect_valid_pdf() {
        let header = check_template_bytes(b"%PDF-1.7\n%\xe2\xe3\xcf\xd3").unwrap();
        assert_eq!(header.version, "1.7");
        assert_eq!(header.offset, 0);
    }

    #[test]
    fn test_detect_header_after_junk() {
        let header = check_template_bytes(b"\x00\x00garbage%PDF-1.4\n").unwrap();
        assert_eq!(header.version, "1.4");
        assert_eq!(header.offset, 9);
    }

    #[test]
    fn test_detect_invalid_format() {
        let result = check_template_bytes(b"<!DOCTYPE html>");
        assert!(matches!(result, Err(Error::UnknownFormat)));
        assert!(!is_pdf_bytes(b"%PDF"));
    }

    #[test]
    fn test_missing_template() {
        let result = check_template_path("/definitely/not/here/resume.pdf");
        assert!(matches!(result, Err(Error::TemplateNotFound(_))));
    }

    #[test]
    fn test_template_path_not_pdf() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"just some text").unwrap();
        let result = check_template_path(file.path());
        assert!(matches!(result, Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_version_validation() {
        assert!(is_valid_version("1.0"));
        assert!(is_valid_version("2.0"));
        assert!(!is_valid_version("10.0"));
        assert!(!is_valid_version("abc"));
    }
}
