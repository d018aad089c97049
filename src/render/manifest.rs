//! Structured record of what a synthesis emitted.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{Element, ElementKind, Metadata};

/// Manifest written next to the generated markup as `manifest.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Source PDF path
    #[serde(default)]
    pub source: Option<String>,

    /// Text scale the markup was synthesized with
    pub text_scale: f64,

    /// Document metadata
    #[serde(default)]
    pub metadata: Metadata,

    /// One entry per page, in page order
    #[serde(default)]
    pub pages: Vec<PageManifest>,
}

impl Manifest {
    /// Read a manifest from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        serde_json::from_str(&data)
            .map_err(|e| Error::Other(format!("invalid manifest: {}", e)))
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
    }

    /// Reference image per page number, relative to the output directory.
    ///
    /// An explicit `reference` wins over the page `background`. Pages with
    /// neither are skipped.
    pub fn references(&self) -> Vec<(u32, &str)> {
        self.pages
            .iter()
            .filter_map(|p| {
                p.reference
                    .as_deref()
                    .or(p.background.as_deref())
                    .map(|r| (p.number, r))
            })
            .collect()
    }

    /// Totals across all pages.
    pub fn totals(&self) -> PageCounts {
        self.pages.iter().fold(PageCounts::default(), |mut acc, p| {
            acc.text_count += p.counts.text_count;
            acc.shape_count += p.counts.shape_count;
            acc.border_count += p.counts.border_count;
            acc.image_count += p.counts.image_count;
            acc
        })
    }
}

/// Manifest entry for one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageManifest {
    /// Page number (1-indexed)
    pub number: u32,

    /// Page width in pixels
    pub width: f64,

    /// Page height in pixels
    pub height: f64,

    /// Emitted primitive counts
    #[serde(flatten)]
    pub counts: PageCounts,

    /// Whole-page render, relative to the output directory
    #[serde(default)]
    pub background: Option<String>,

    /// Reference image supplied by external tooling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    /// Emitted primitives in paint order
    #[serde(default)]
    pub primitives: Vec<Element>,
}

/// Number of emitted primitives of each kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCounts {
    /// Text runs
    #[serde(default)]
    pub text_count: u32,

    /// Filled shapes
    #[serde(default)]
    pub shape_count: u32,

    /// Stroked borders
    #[serde(default)]
    pub border_count: u32,

    /// `<img>` placements
    #[serde(default)]
    pub image_count: u32,
}

impl PageCounts {
    /// Record one emitted primitive.
    pub fn add(&mut self, kind: ElementKind) {
        match kind {
            ElementKind::Text => self.text_count += 1,
            ElementKind::Shape => self.shape_count += 1,
            ElementKind::Border => self.border_count += 1,
            ElementKind::Image => self.image_count += 1,
        }
    }

    /// Count for one kind.
    pub fn get(&self, kind: ElementKind) -> u32 {
        match kind {
            ElementKind::Text => self.text_count,
            ElementKind::Shape => self.shape_count,
            ElementKind::Border => self.border_count,
            ElementKind::Image => self.image_count,
        }
    }

    /// Sum of all counts.
    pub fn total(&self) -> u32 {
        self.text_count + self.shape_count + self.border_count + self.image_count
    }
}
