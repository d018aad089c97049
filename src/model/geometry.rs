//! Boxes and colors shared by every primitive kind.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Axis-aligned box in page-local, top-left-origin pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Distance from the left page edge
    pub left: f64,
    /// Distance from the top page edge
    pub top: f64,
    /// Horizontal extent
    pub width: f64,
    /// Vertical extent
    pub height: f64,
}

impl BoundingBox {
    /// Create a box from its top-left corner and size.
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Convert a bottom-left-origin rectangle `(x0, y0)-(x1, y1)` into
    /// top-left-origin page space for a page of height `page_height`.
    ///
    /// `top = page_height - y1`, `left = x0`, `width = x1 - x0`,
    /// `height = y1 - y0`. Callers pass normalized rectangles
    /// (`x0 <= x1`, `y0 <= y1`).
    pub fn from_pdf_rect(x0: f64, y0: f64, x1: f64, y1: f64, page_height: f64) -> Self {
        Self {
            left: x0,
            top: page_height - y1,
            width: x1 - x0,
            height: y1 - y0,
        }
    }

    /// Right edge.
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Area, treating negative extents as empty.
    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// All four components are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.left.is_finite()
            && self.top.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
    }

    /// True when the box cannot be painted: non-finite, or without a
    /// strictly positive width and height.
    pub fn is_degenerate(&self) -> bool {
        !(self.is_finite() && self.width > 0.0 && self.height > 0.0)
    }

    /// Grow the box by `amount` on every side.
    pub fn inflate(&self, amount: f64) -> Self {
        Self {
            left: self.left - amount,
            top: self.top - amount,
            width: self.width + 2.0 * amount,
            height: self.height + 2.0 * amount,
        }
    }
}

/// An sRGB color with optional opacity, serialized as a CSS color string.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct CssColor {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
    /// Opacity in 0..=1
    pub alpha: f64,
}

impl CssColor {
    /// Opaque black.
    pub const BLACK: CssColor = CssColor {
        r: 0,
        g: 0,
        b: 0,
        alpha: 1.0,
    };

    /// Create an opaque color.
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, alpha: 1.0 }
    }

    /// Build a color from normalized `0..1` components.
    ///
    /// Components are scaled to `0..255`, rounded and clamped; opacity is
    /// clamped to `0..1`.
    pub fn from_unit(r: f64, g: f64, b: f64, opacity: f64) -> Self {
        let channel = |v: f64| {
            if v.is_finite() {
                (v * 255.0).round().clamp(0.0, 255.0) as u8
            } else {
                0
            }
        };
        let alpha = if opacity.is_finite() {
            opacity.clamp(0.0, 1.0)
        } else {
            1.0
        };
        Self {
            r: channel(r),
            g: channel(g),
            b: channel(b),
            alpha,
        }
    }

    /// Whether the color is fully opaque.
    pub fn is_opaque(&self) -> bool {
        self.alpha >= 1.0
    }

    /// CSS serialization: `rgb(r, g, b)` or `rgba(r, g, b, a)`.
    ///
    /// Alpha is written in its shortest exact decimal form so that
    /// [`TryFrom<String>`] reads back the same value.
    pub fn to_css(&self) -> String {
        if self.is_opaque() {
            format!("rgb({}, {}, {})", self.r, self.g, self.b)
        } else {
            format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.alpha)
        }
    }
}

impl fmt::Display for CssColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

impl From<CssColor> for String {
    fn from(color: CssColor) -> Self {
        color.to_css()
    }
}

impl TryFrom<String> for CssColor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        static CSS_COLOR: OnceLock<Regex> = OnceLock::new();
        let re = CSS_COLOR.get_or_init(|| {
            Regex::new(r"^rgba?\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*(?:,\s*([0-9.]+)\s*)?\)$")
                .expect("valid css color regex")
        });

        let caps = re
            .captures(value.trim())
            .ok_or_else(|| format!("not a CSS rgb()/rgba() color: {}", value))?;
        let channel = |i: usize| -> Result<u8, String> {
            caps[i]
                .parse::<u8>()
                .map_err(|e| format!("bad channel in {}: {}", value, e))
        };
        let alpha = match caps.get(4) {
            Some(m) => m
                .as_str()
                .parse::<f64>()
                .map_err(|e| format!("bad alpha in {}: {}", value, e))?,
            None => 1.0,
        };

        Ok(CssColor {
            r: channel(1)?,
            g: channel(2)?,
            b: channel(3)?,
            alpha: alpha.clamp(0.0, 1.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pdf_rect_flips_origin() {
        let bbox = BoundingBox::from_pdf_rect(10.0, 10.0, 100.0, 30.0, 300.0);
        assert_eq!(bbox.left, 10.0);
        assert_eq!(bbox.top, 270.0);
        assert_eq!(bbox.width, 90.0);
        assert_eq!(bbox.height, 20.0);
    }

    #[test]
    fn test_degenerate_boxes() {
        assert!(BoundingBox::new(0.0, 0.0, 0.0, 5.0).is_degenerate());
        assert!(BoundingBox::new(0.0, 0.0, 5.0, -1.0).is_degenerate());
        assert!(BoundingBox::new(f64::NAN, 0.0, 5.0, 5.0).is_degenerate());
        assert!(!BoundingBox::new(0.0, 0.0, 5.0, 5.0).is_degenerate());
    }

    #[test]
    fn test_inflate() {
        let bbox = BoundingBox::new(10.0, 10.0, 20.0, 5.0).inflate(1.5);
        assert_eq!(bbox, BoundingBox::new(8.5, 8.5, 23.0, 8.0));
    }

    #[test]
    fn test_color_from_unit() {
        let color = CssColor::from_unit(1.0, 0.5, 0.0, 1.0);
        assert_eq!(color.to_css(), "rgb(255, 128, 0)");

        let clamped = CssColor::from_unit(1.4, -0.2, 0.2, 0.5);
        assert_eq!(clamped.to_css(), "rgba(255, 0, 51, 0.5)");
    }

    #[test]
    fn test_color_string_roundtrip() {
        let color = CssColor::from_unit(0.2, 0.4, 0.6, 0.25);
        let parsed = CssColor::try_from(color.to_css()).unwrap();
        assert_eq!(parsed, color);

        assert!(CssColor::try_from("#ffffff".to_string()).is_err());
    }

    #[test]
    fn test_fractional_alpha_survives_serialization() {
        for opacity in [0.333, 0.005, 0.999, 1.0 / 3.0, 0.0] {
            let color = CssColor::from_unit(0.1, 0.2, 0.3, opacity);
            let parsed = CssColor::try_from(String::from(color)).unwrap();
            assert_eq!(parsed, color, "{}", color);
            assert_eq!(parsed.alpha, opacity);
        }
        assert_eq!(
            CssColor::from_unit(0.0, 0.0, 0.0, 0.333).to_css(),
            "rgba(0, 0, 0, 0.333)"
        );

        let json = serde_json::to_string(&CssColor::from_unit(1.0, 1.0, 1.0, 0.333)).unwrap();
        let back: CssColor = serde_json::from_str(&json).unwrap();
        assert_eq!(back.alpha, 0.333);
    }
}
