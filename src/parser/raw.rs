//! Raw parser output and the backend abstraction that produces it.
//!
//! A [`PdfBackend`] hands the extractor one [`RawPage`] per input page. All
//! raw geometry uses PDF conventions: bottom-left origin, y growing upward,
//! MediaBox origin already subtracted. Nothing in this module depends on a
//! concrete PDF library.

use crate::error::Result;
use crate::model::Metadata;

/// Abstract interface for the PDF parsing collaborator.
pub trait PdfBackend {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Page size `(width, height)` in points for a 0-based page index.
    fn page_size(&self, index: usize) -> Result<(f64, f64)>;

    /// Parse one page (0-based index).
    fn page(&self, index: usize) -> Result<RawPage>;

    /// Document-level metadata.
    fn metadata(&self) -> Metadata {
        Metadata {
            page_count: self.page_count() as u32,
            ..Default::default()
        }
    }
}

/// Everything the parser reports for one page.
#[derive(Debug, Clone, Default)]
pub struct RawPage {
    /// Page width in points
    pub width: f64,
    /// Page height in points
    pub height: f64,
    /// Text lines as segmented by the parser
    pub text_lines: Vec<RawTextLine>,
    /// Painted vector paths
    pub drawings: Vec<RawDrawing>,
    /// Embedded raster resources with their placements
    pub images: Vec<RawImage>,
}

/// A rectangle in bottom-left-origin page space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawRect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl RawRect {
    /// Create a rectangle, normalizing so that `x0 <= x1` and `y0 <= y1`.
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    /// Bounding rectangle of a point set; `None` when empty.
    pub fn bounding(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut rect = RawRect {
            x0: first.x,
            y0: first.y,
            x1: first.x,
            y1: first.y,
        };
        for p in &points[1..] {
            rect.x0 = rect.x0.min(p.x);
            rect.y0 = rect.y0.min(p.y);
            rect.x1 = rect.x1.max(p.x);
            rect.y1 = rect.y1.max(p.y);
        }
        Some(rect)
    }

    /// Union with another rectangle.
    pub fn union(&self, other: &RawRect) -> RawRect {
        RawRect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }
}

/// A point in page space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A text line.
#[derive(Debug, Clone, Default)]
pub struct RawTextLine {
    /// Line text, including any word spaces the parser inferred
    pub text: String,
    /// Glyphs that make up the line
    pub chars: Vec<RawChar>,
    /// Line box
    pub bbox: Option<RawRect>,
}

/// One rendered glyph.
#[derive(Debug, Clone, PartialEq)]
pub struct RawChar {
    /// Decoded text of the glyph
    pub text: String,
    /// Font resource name (BaseFont), possibly subset-prefixed
    pub font_name: String,
    /// Rendered size in points
    pub size: f64,
}

/// A color with normalized `0..1` RGB components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl RawColor {
    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub fn gray(level: f64) -> Self {
        Self::rgb(level, level, level)
    }

    /// Naive CMYK conversion, the same one PDF viewers use without a profile.
    pub fn cmyk(c: f64, m: f64, y: f64, k: f64) -> Self {
        Self::rgb(
            (1.0 - c) * (1.0 - k),
            (1.0 - m) * (1.0 - k),
            (1.0 - y) * (1.0 - k),
        )
    }

    /// Interpret a raw operand list by component count (1 gray, 3 RGB,
    /// 4 CMYK).
    pub fn from_components(components: &[f64]) -> Option<Self> {
        match components {
            [g] => Some(Self::gray(*g)),
            [r, g, b] => Some(Self::rgb(*r, *g, *b)),
            [c, m, y, k] => Some(Self::cmyk(*c, *m, *y, *k)),
            _ => None,
        }
    }
}

/// A path construction operator in page space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathOp {
    /// Start a new subpath
    MoveTo(Point),
    /// Straight segment to a point
    LineTo(Point),
    /// Cubic curve: two control points and an end point
    CurveTo(Point, Point, Point),
    /// Axis-aligned rectangle, a complete subpath on its own
    Rect(RawRect),
    /// Close the current subpath
    Close,
    /// Path operator without geometry
    NoOp,
}

/// A painted path.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDrawing {
    /// Construction operators
    pub ops: Vec<PathOp>,
    /// Fill color, when the path is filled
    pub fill: Option<RawColor>,
    /// Stroke color, when the path is stroked
    pub stroke: Option<RawColor>,
    /// Stroke width in page units
    pub stroke_width: f64,
    /// Fill opacity (`ca`)
    pub fill_opacity: f64,
    /// Stroke opacity (`CA`)
    pub stroke_opacity: f64,
}

impl Default for RawDrawing {
    fn default() -> Self {
        Self {
            ops: Vec::new(),
            fill: None,
            stroke: None,
            stroke_width: 1.0,
            fill_opacity: 1.0,
            stroke_opacity: 1.0,
        }
    }
}

/// An embedded raster resource.
#[derive(Debug, Clone, Default)]
pub struct RawImage {
    /// Resource name on the page (e.g. "Im1")
    pub name: String,
    /// Encoded image bytes ready to be written as a file
    pub data: Vec<u8>,
    /// File extension matching `data`, when the parser knows it
    pub extension: Option<String>,
    /// Intrinsic width in pixels
    pub pixel_width: Option<u32>,
    /// Intrinsic height in pixels
    pub pixel_height: Option<u32>,
    /// Every place the resource is painted on the page
    pub placements: Vec<RawRect>,
}
