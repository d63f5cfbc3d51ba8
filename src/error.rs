//! Error types for the template engine.
//!
//! Only a handful of conditions are fatal to a caller: a missing template,
//! a file that is not a PDF, or a document that cannot be opened at all.
//! Everything else (a page that fails to decode, a form path that does not
//! resolve, a font that is not available) is recovered where it happens and
//! reported through logs, warnings, or empty fields.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pdftemplate operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while analyzing or personalizing a template.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The template path does not exist.
    #[error("Template not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    /// The file format is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// The document could not be opened or its structure is broken.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// A single page could not be decoded.
    #[error("Failed to extract page {page}: {reason}")]
    PageExtraction {
        /// Page number (1-indexed)
        page: u32,
        /// Underlying cause
        reason: String,
    },

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// Invalid engine configuration (bad regex, unreadable file).
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON (de)serialization failure for areas, form data, or config.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The personalized document could not be written.
    #[error("Write error: {0}")]
    Write(String),

    /// The preview image could not be produced.
    #[error("Rendering error: {0}")]
    Render(String),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl Error {
    /// Whether the error aborts the whole operation for the caller.
    ///
    /// Page-level failures are recoverable; the analyzer degrades them to an
    /// empty page unless strict mode was requested.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::PageExtraction { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Encrypted;
        assert_eq!(err.to_string(), "Document is encrypted");

        let err = Error::PageOutOfRange(10, 5);
        assert_eq!(
            err.to_string(),
            "Page 10 is out of range (document has 5 pages)"
        );

        let err = Error::TemplateNotFound(PathBuf::from("missing.pdf"));
        assert_eq!(err.to_string(), "Template not found: missing.pdf");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_page_extraction_is_recoverable() {
        let err = Error::PageExtraction {
            page: 2,
            reason: "bad stream".to_string(),
        };
        assert!(!err.is_fatal());
        assert!(Error::UnknownFormat.is_fatal());
    }
}
