//! Error types for pdfhtml library.

use std::io;
use thiserror::Error;

/// Result type alias for pdfhtml operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during conversion and refinement.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file format is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// An external collaborator (parser, rasterizer, renderer, comparator)
    /// cannot be reached.
    #[error("Dependency unavailable: {0}")]
    DependencyUnavailable(String),

    /// A single page, path or resource is corrupt.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Error extracting or persisting an embedded image.
    #[error("Image extraction error: {0}")]
    ImageExtract(String),

    /// Error producing markup or writing the output set.
    #[error("Rendering error: {0}")]
    Render(String),

    /// Error comparing two bitmaps.
    #[error("Comparison error: {0}")]
    Compare(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error reports a missing external collaborator rather
    /// than a problem with the input.
    pub fn is_dependency_unavailable(&self) -> bool {
        matches!(self, Error::DependencyUnavailable(_))
    }

    /// Whether this error is confined to a single page, path or asset and
    /// should be logged and skipped instead of aborting sibling work.
    pub fn is_contained(&self) -> bool {
        matches!(
            self,
            Error::MalformedInput(_) | Error::ImageExtract(_) | Error::Io(_)
        )
    }
}

#[cfg(feature = "lopdf-backend")]
impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(e) => Error::Io(e),
            _ => Error::Compare(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Encrypted;
        assert_eq!(err.to_string(), "Document is encrypted");

        let err = Error::DependencyUnavailable("pdftoppm".to_string());
        assert_eq!(err.to_string(), "Dependency unavailable: pdftoppm");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.is_contained());
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::DependencyUnavailable("chromium".into()).is_dependency_unavailable());
        assert!(!Error::MalformedInput("page 2".into()).is_dependency_unavailable());
        assert!(Error::MalformedInput("page 2".into()).is_contained());
        assert!(!Error::UnknownFormat.is_contained());
    }
}
