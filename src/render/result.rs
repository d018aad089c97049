//! Synthesis output and the on-disk layout it is written to.

use std::fs;
use std::path::{Path, PathBuf};

use super::{Manifest, PageCounts};
use crate::error::Result;

/// HTML document file name inside the output directory.
pub const INDEX_FILE: &str = "index.html";
/// Manifest file name inside the output directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Result of synthesizing a document: markup, styles and manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    /// Complete HTML document
    pub html: String,

    /// Complete stylesheet (also embedded in `html` when inline)
    pub css: String,

    /// What was emitted
    pub manifest: Manifest,

    /// Stylesheet file name, `None` when styles are inline
    pub stylesheet_file: Option<String>,
}

impl Synthesis {
    /// Totals across all pages.
    pub fn counts(&self) -> PageCounts {
        self.manifest.totals()
    }

    /// Write `index.html`, the stylesheet and `manifest.json` into `dir`,
    /// overwriting earlier output. Returns the path of `index.html`.
    pub fn write_output<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let index = dir.join(INDEX_FILE);
        fs::write(&index, &self.html)?;

        if let Some(name) = &self.stylesheet_file {
            fs::write(dir.join(name), &self.css)?;
        }

        fs::write(dir.join(MANIFEST_FILE), self.manifest.to_json()?)?;

        log::debug!("Wrote {}", index.display());
        Ok(index)
    }
}
