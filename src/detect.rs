//! PDF header sniffing.
//!
//! Conversion must tell "this is not a PDF at all" apart from "this PDF is
//! damaged", so the input is checked for a `%PDF-x.y` header before it is
//! handed to the parser.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const PDF_MAGIC: &[u8] = b"%PDF-";
const VERSION_LEN: usize = 3;

/// Readers tolerate junk before the header (some generators prepend a
/// byte-order mark or mail headers); only this prefix is scanned.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// Read the header of a file and return its PDF version (e.g. `"1.7"`).
pub fn pdf_version_from_path<P: AsRef<Path>>(path: P) -> Result<String> {
    let mut header = Vec::with_capacity(HEADER_SEARCH_WINDOW);
    File::open(path)?
        .take(HEADER_SEARCH_WINDOW as u64)
        .read_to_end(&mut header)?;
    pdf_version_from_bytes(&header)
}

/// Return the PDF version declared in the header of `data`.
pub fn pdf_version_from_bytes(data: &[u8]) -> Result<String> {
    let window = &data[..data.len().min(HEADER_SEARCH_WINDOW)];
    let start = window
        .windows(PDF_MAGIC.len())
        .position(|w| w == PDF_MAGIC)
        .ok_or(Error::UnknownFormat)?;

    let version_bytes = data
        .get(start + PDF_MAGIC.len()..start + PDF_MAGIC.len() + VERSION_LEN)
        .ok_or(Error::UnknownFormat)?;
    let version = String::from_utf8_lossy(version_bytes).to_string();

    if !is_valid_version(&version) {
        return Err(Error::UnsupportedVersion(version));
    }
    Ok(version)
}

/// Check if bytes start (within the search window) with a PDF header.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    pdf_version_from_bytes(data).is_ok()
}

fn is_valid_version(version: &str) -> bool {
    let bytes = version.as_bytes();
    bytes.len() == 3 && bytes[0].is_ascii_digit() && bytes[1] == b'.' && bytes[2].is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_valid_pdf() {
        let data = b"%PDF-1.7\n%\xe2\xe3\xcf\xd3";
        assert_eq!(pdf_version_from_bytes(data).unwrap(), "1.7");
    }

    #[test]
    fn test_detect_with_leading_junk() {
        let data = b"\xef\xbb\xbf%PDF-2.0\n";
        assert_eq!(pdf_version_from_bytes(data).unwrap(), "2.0");
    }

    #[test]
    fn test_detect_invalid_format() {
        let result = pdf_version_from_bytes(b"<!DOCTYPE html>");
        assert!(matches!(result, Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_detect_truncated_header() {
        let result = pdf_version_from_bytes(b"%PDF-1");
        assert!(matches!(result, Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_detect_bad_version() {
        let result = pdf_version_from_bytes(b"%PDF-x.y\n");
        assert!(matches!(result, Err(Error::UnsupportedVersion(_))));
    }

    #[test]
    fn test_is_pdf_bytes() {
        assert!(is_pdf_bytes(b"%PDF-1.4\n"));
        assert!(!is_pdf_bytes(b"Not a PDF"));
        assert!(!is_pdf_bytes(b""));
    }
}
