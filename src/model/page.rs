//! Page-level types.

use serde::{Deserialize, Serialize};

use super::{BorderRun, ImageRun, ShapeRun, TextRun};

/// A single page of the Layout Model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Page number (1-indexed)
    pub number: u32,

    /// Page width in pixels (PDF points)
    pub width: f64,

    /// Page height in pixels (PDF points)
    pub height: f64,

    /// Primitives in extraction order
    pub elements: Vec<Element>,

    /// Whole-page raster render, relative to the output directory
    #[serde(default)]
    pub background: Option<String>,
}

impl Page {
    /// Create an empty page. Negative or non-finite sizes collapse to zero.
    pub fn new(number: u32, width: f64, height: f64) -> Self {
        let sanitize = |v: f64| if v.is_finite() { v.max(0.0) } else { 0.0 };
        Self {
            number,
            width: sanitize(width),
            height: sanitize(height),
            elements: Vec::new(),
            background: None,
        }
    }

    /// Page area in square pixels.
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Add a primitive.
    pub fn push(&mut self, element: Element) {
        self.elements.push(element);
    }

    /// Text runs in extraction order.
    pub fn texts(&self) -> impl Iterator<Item = &TextRun> {
        self.elements.iter().filter_map(|e| match e {
            Element::Text(t) => Some(t),
            _ => None,
        })
    }

    /// Filled shapes in extraction order.
    pub fn shapes(&self) -> impl Iterator<Item = &ShapeRun> {
        self.elements.iter().filter_map(|e| match e {
            Element::Shape(s) => Some(s),
            _ => None,
        })
    }

    /// Stroked borders in extraction order.
    pub fn borders(&self) -> impl Iterator<Item = &BorderRun> {
        self.elements.iter().filter_map(|e| match e {
            Element::Border(b) => Some(b),
            _ => None,
        })
    }

    /// Images in extraction order.
    pub fn images(&self) -> impl Iterator<Item = &ImageRun> {
        self.elements.iter().filter_map(|e| match e {
            Element::Image(i) => Some(i),
            _ => None,
        })
    }

    /// Number of elements of one kind.
    pub fn count(&self, kind: ElementKind) -> usize {
        self.elements.iter().filter(|e| e.kind() == kind).count()
    }

    /// Check if the page has no primitives.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// One primitive on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Element {
    /// Positioned text line
    Text(TextRun),
    /// Filled region
    Shape(ShapeRun),
    /// Stroked region
    Border(BorderRun),
    /// Raster image
    Image(ImageRun),
}

impl Element {
    /// The primitive kind.
    pub fn kind(&self) -> ElementKind {
        match self {
            Element::Text(_) => ElementKind::Text,
            Element::Shape(_) => ElementKind::Shape,
            Element::Border(_) => ElementKind::Border,
            Element::Image(_) => ElementKind::Image,
        }
    }
}

/// Primitive kinds, listed in paint order (back to front).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElementKind {
    /// Filled regions sit at the back
    Shape,
    /// Strokes over fills
    Border,
    /// Discrete images
    Image,
    /// Text always on top
    Text,
}

impl ElementKind {
    /// All kinds in paint order.
    pub const PAINT_ORDER: [ElementKind; 4] = [
        ElementKind::Shape,
        ElementKind::Border,
        ElementKind::Image,
        ElementKind::Text,
    ];

    /// Class-name stem used in markup (`shape--3`, `page__shape`).
    pub fn class_stem(&self) -> &'static str {
        match self {
            ElementKind::Shape => "shape",
            ElementKind::Border => "border",
            ElementKind::Image => "image",
            ElementKind::Text => "text",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundingBox, CssColor};

    #[test]
    fn test_page_new_sanitizes_size() {
        let page = Page::new(1, -5.0, f64::INFINITY);
        assert_eq!(page.width, 0.0);
        assert_eq!(page.height, 0.0);
        assert!(page.is_empty());
    }

    #[test]
    fn test_page_filters_by_kind() {
        let mut page = Page::new(1, 200.0, 300.0);
        page.push(Element::Text(TextRun::new(
            "Hello",
            BoundingBox::new(10.0, 270.0, 90.0, 20.0),
            12.0,
        )));
        page.push(Element::Shape(ShapeRun {
            bbox: BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            fill: CssColor::BLACK,
        }));

        assert_eq!(page.texts().count(), 1);
        assert_eq!(page.shapes().count(), 1);
        assert_eq!(page.borders().count(), 0);
        assert_eq!(page.count(ElementKind::Text), 1);
        assert_eq!(page.count(ElementKind::Image), 0);
    }

    #[test]
    fn test_paint_order() {
        let mut kinds = vec![ElementKind::Text, ElementKind::Image, ElementKind::Shape];
        kinds.sort();
        assert_eq!(
            kinds,
            vec![ElementKind::Shape, ElementKind::Image, ElementKind::Text]
        );
    }

    #[test]
    fn test_element_serializes_with_tag() {
        let element = Element::Shape(ShapeRun {
            bbox: BoundingBox::new(1.0, 2.0, 3.0, 4.0),
            fill: CssColor::rgb(255, 0, 0),
        });
        let json = serde_json::to_string(&element).unwrap();
        assert!(json.contains("\"type\":\"shape\""));
        assert!(json.contains("\"fill\":\"rgb(255, 0, 0)\""));
    }
}
