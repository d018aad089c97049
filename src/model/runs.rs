//! Primitive kinds placed on a page.

use serde::{Deserialize, Serialize};

use super::{BoundingBox, CssColor};

/// A line of text at a fixed position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    /// Text content, never empty after trimming
    pub text: String,

    /// Line box
    pub bbox: BoundingBox,

    /// Mean font size of the characters in the line, in points
    pub font_size: f64,

    /// Typeface hints derived from the font resource name
    #[serde(default)]
    pub font: FontFace,

    /// Raw font resource name as found in the PDF
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_name: Option<String>,
}

impl TextRun {
    /// Create a text run without typeface hints.
    pub fn new(text: impl Into<String>, bbox: BoundingBox, font_size: f64) -> Self {
        Self {
            text: text.into(),
            bbox,
            font_size,
            font: FontFace::default(),
            font_name: None,
        }
    }

    /// Attach typeface hints.
    pub fn with_font(mut self, font: FontFace) -> Self {
        self.font = font;
        self
    }

    /// Record the raw font resource name.
    pub fn with_font_name(mut self, name: impl Into<String>) -> Self {
        self.font_name = Some(name.into());
        self
    }
}

/// Human-readable typeface hints. Every field is optional; absent fields
/// fall back to the stylesheet defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontFace {
    /// Family name, e.g. "Arial"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,

    /// Numeric CSS weight (200..=900)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u16>,

    /// Slant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<FontStyle>,
}

impl FontFace {
    /// True when no hint is set.
    pub fn is_empty(&self) -> bool {
        self.family.is_none() && self.weight.is_none() && self.style.is_none()
    }
}

/// Font slant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    /// Italic or oblique
    Italic,
}

impl FontStyle {
    /// CSS keyword.
    pub fn as_css(&self) -> &'static str {
        match self {
            FontStyle::Italic => "italic",
        }
    }
}

/// A filled region reconstructed from a vector path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeRun {
    /// Filled area
    pub bbox: BoundingBox,
    /// Fill color
    pub fill: CssColor,
}

/// A stroked region reconstructed from a vector path.
///
/// `bbox` is the outer box: the path bounds inflated by half the stroke
/// width on each side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorderRun {
    /// Outer box
    pub bbox: BoundingBox,
    /// Stroke color
    pub color: CssColor,
    /// Stroke width in pixels, always positive
    pub width: f64,
}

/// A raster image persisted as an asset, placed one or more times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRun {
    /// Asset path relative to the output directory
    pub source: String,

    /// Every placement of the image on the page
    pub placements: Vec<BoundingBox>,

    /// Intrinsic pixel width, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pixel_width: Option<u32>,

    /// Intrinsic pixel height, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pixel_height: Option<u32>,
}

impl ImageRun {
    /// Create an image run with the given placements.
    pub fn new(source: impl Into<String>, placements: Vec<BoundingBox>) -> Self {
        Self {
            source: source.into(),
            placements,
            pixel_width: None,
            pixel_height: None,
        }
    }
}
