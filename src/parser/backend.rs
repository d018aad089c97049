//! Concrete PDF backend backed by lopdf.
//!
//! Isolates the lopdf document model from the extraction logic. The
//! [`PdfBackend`] trait in [`super::raw`] is the only surface the rest of
//! the crate sees.

use std::path::Path;

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use crate::detect::pdf_version_from_bytes;
use crate::error::{Error, Result};
use crate::model::Metadata;

use super::interpreter::{deref, deref_dict, number, stream_bytes, Interpreter, Scope};
use super::raw::{PdfBackend, RawPage};

/// Page size used when a page has no usable MediaBox (US Letter).
const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// Concrete [`PdfBackend`] backed by `lopdf::Document`.
pub struct LopdfBackend {
    doc: LopdfDocument,
    pages: Vec<ObjectId>,
}

impl LopdfBackend {
    /// Load from a file path.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::load_bytes(&data)
    }

    /// Load from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        pdf_version_from_bytes(data)?;
        let doc = LopdfDocument::load_mem(data).map_err(|e| match e {
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::from(e),
        })?;
        Ok(Self::from_document(doc))
    }

    /// Wrap an already loaded document.
    pub fn from_document(doc: LopdfDocument) -> Self {
        let pages = doc.get_pages().into_values().collect();
        Self { doc, pages }
    }

    /// Direct access to the underlying `lopdf::Document`.
    pub fn raw_doc(&self) -> &LopdfDocument {
        &self.doc
    }

    /// PDF version string.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    fn page_id(&self, index: usize) -> Result<ObjectId> {
        self.pages.get(index).copied().ok_or_else(|| {
            Error::MalformedInput(format!(
                "page index {} out of range ({} pages)",
                index,
                self.pages.len()
            ))
        })
    }

    /// Look up a page attribute, following the `Parent` chain for
    /// inheritable keys.
    fn inherited(&self, page_id: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut dict = self.doc.get_dictionary(page_id).ok()?;
        for _ in 0..32 {
            if let Ok(value) = dict.get(key) {
                return deref(&self.doc, value);
            }
            let parent = dict.get(b"Parent").ok()?.as_reference().ok()?;
            dict = self.doc.get_dictionary(parent).ok()?;
        }
        None
    }

    fn media_box(&self, page_id: ObjectId) -> [f64; 4] {
        let values: Option<Vec<f64>> = self
            .inherited(page_id, b"MediaBox")
            .and_then(|o| o.as_array().ok())
            .map(|arr| arr.iter().filter_map(|o| deref(&self.doc, o).and_then(number)).collect());

        match values.as_deref() {
            Some([x0, y0, x1, y1]) => [x0.min(*x1), y0.min(*y1), x0.max(*x1), y0.max(*y1)],
            _ => DEFAULT_MEDIA_BOX,
        }
    }

    fn resources(&self, page_id: ObjectId) -> Option<&Dictionary> {
        let value = self.inherited(page_id, b"Resources")?;
        deref_dict(&self.doc, value)
    }

    /// Concatenated, decompressed content streams of a page.
    fn page_content(&self, page_id: ObjectId) -> Result<Vec<u8>> {
        let page_dict = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| Error::MalformedInput(e.to_string()))?;

        let contents = match page_dict.get(b"Contents") {
            Ok(contents) => contents,
            // A page without content is blank, not broken.
            Err(_) => return Ok(Vec::new()),
        };

        let streams: Vec<&Object> = match deref(&self.doc, contents) {
            Some(Object::Array(items)) => items.iter().collect(),
            Some(other) => vec![other],
            None => return Err(Error::MalformedInput("Invalid content stream".to_string())),
        };

        let mut content = Vec::new();
        for obj in streams {
            match deref(&self.doc, obj) {
                Some(Object::Stream(stream)) => match stream_bytes(stream) {
                    Some(data) => {
                        content.extend_from_slice(&data);
                        content.push(b'\n');
                    }
                    None => log::warn!("Skipping undecodable content stream"),
                },
                _ => log::warn!("Skipping non-stream content entry"),
            }
        }
        Ok(content)
    }
}

impl PdfBackend for LopdfBackend {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_size(&self, index: usize) -> Result<(f64, f64)> {
        let [x0, y0, x1, y1] = self.media_box(self.page_id(index)?);
        Ok((x1 - x0, y1 - y0))
    }

    fn page(&self, index: usize) -> Result<RawPage> {
        let page_id = self.page_id(index)?;
        let [x0, y0, x1, y1] = self.media_box(page_id);
        let content = self.page_content(page_id)?;

        let scope = Scope::new(&self.doc, self.resources(page_id));
        let mut interpreter = Interpreter::new(&self.doc, (x0, y0));
        interpreter.run(&content, &scope)?;
        Ok(interpreter.finish(x1 - x0, y1 - y0))
    }

    fn metadata(&self) -> Metadata {
        let mut metadata = Metadata::with_version(self.version());
        metadata.page_count = self.pages.len() as u32;

        let info = self
            .doc
            .trailer
            .get(b"Info")
            .ok()
            .and_then(|o| deref_dict(&self.doc, o));
        if let Some(info) = info {
            metadata.title = get_string_from_dict(info, b"Title");
            metadata.author = get_string_from_dict(info, b"Author");
            metadata.subject = get_string_from_dict(info, b"Subject");
            metadata.creator = get_string_from_dict(info, b"Creator");
            metadata.producer = get_string_from_dict(info, b"Producer");
            metadata.created = get_string_from_dict(info, b"CreationDate")
                .as_deref()
                .and_then(parse_pdf_date);
            metadata.modified = get_string_from_dict(info, b"ModDate")
                .as_deref()
                .and_then(parse_pdf_date);
        }

        metadata
    }
}

/// Helper to get a text string from a PDF dictionary.
fn get_string_from_dict(dict: &Dictionary, key: &[u8]) -> Option<String> {
    let value = match dict.get(key).ok()? {
        Object::String(bytes, _) => super::interpreter::decode_text_simple(bytes),
        Object::Name(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        _ => return None,
    };
    let value = value.trim().to_string();
    (!value.is_empty()).then_some(value)
}

/// Parse a PDF date string (`D:YYYYMMDDHHmmSS`, trailing fields optional).
pub fn parse_pdf_date(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    let s = s.trim();
    let s = s.strip_prefix("D:").unwrap_or(s);

    // At minimum we need YYYY
    if s.len() < 4 {
        return None;
    }

    let year: i32 = s.get(0..4)?.parse().ok()?;
    let month: u32 = s.get(4..6).and_then(|m| m.parse().ok()).unwrap_or(1);
    let day: u32 = s.get(6..8).and_then(|d| d.parse().ok()).unwrap_or(1);
    let hour: u32 = s.get(8..10).and_then(|h| h.parse().ok()).unwrap_or(0);
    let minute: u32 = s.get(10..12).and_then(|m| m.parse().ok()).unwrap_or(0);
    let second: u32 = s.get(12..14).and_then(|s| s.parse().ok()).unwrap_or(0);

    chrono::NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .map(|dt| chrono::DateTime::from_naive_utc_and_offset(dt, chrono::Utc))
}
