//! Stylesheet emission.
//!
//! All lengths are printed with two decimals so identical layouts always
//! produce identical stylesheets.

use std::fmt::Write;

use crate::model::{BorderRun, BoundingBox, ShapeRun, TextRun};

/// Rules shared by every document.
pub const BASE_STYLESHEET: &str = "\
/* Generated by pdfhtml */
body {
  margin: 0;
  background: #f2f2f2;
  font-family: 'Helvetica Neue', Arial, sans-serif;
}
.page {
  position: relative;
  margin: 0 auto 2rem;
  overflow: hidden;
  box-shadow: 0 10px 30px rgba(0, 0, 0, 0.2);
  background: white;
}
.page__background {
  position: absolute;
  inset: 0;
  background-size: cover;
  background-position: top left;
  opacity: 0.98;
}
.page__text {
  position: absolute;
  white-space: pre;
  line-height: 1;
  color: #000;
}
.page__shape {
  position: absolute;
}
.page__border {
  position: absolute;
  box-sizing: border-box;
}
.page__image {
  position: absolute;
  display: block;
}
";

/// Format a length in pixels.
pub fn px(value: f64) -> String {
    // -0.00 and 0.00 must print the same
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        "0.00px".to_string()
    } else {
        format!("{:.2}px", rounded)
    }
}

/// Position and size declarations for an absolutely placed box.
pub fn box_declarations(bbox: &BoundingBox) -> String {
    format!(
        "left: {}; top: {}; width: {}; height: {};",
        px(bbox.left),
        px(bbox.top),
        px(bbox.width),
        px(bbox.height)
    )
}

/// Rule sizing a page container.
pub fn page_rule(number: u32, width: f64, height: f64) -> String {
    format!(
        ".page--{} {{ width: {}; height: {}; }}\n",
        number,
        px(width),
        px(height)
    )
}

/// Declarations for a text run, with the font size scaled by `text_scale`.
pub fn text_declarations(run: &TextRun, text_scale: f64) -> String {
    let mut css = box_declarations(&run.bbox);
    let _ = write!(css, " font-size: {};", px(run.font_size * text_scale));

    if let Some(weight) = run.font.weight {
        let _ = write!(css, " font-weight: {};", weight);
    }
    if let Some(style) = run.font.style {
        let _ = write!(css, " font-style: {};", style.as_css());
    }
    if let Some(family) = run.font.family.as_deref() {
        let family = sanitize_family(family);
        if !family.is_empty() {
            let _ = write!(css, " font-family: \"{}\", sans-serif;", family);
        }
    }

    css
}

/// Declarations for a filled shape.
pub fn shape_declarations(shape: &ShapeRun) -> String {
    format!(
        "{} background: {};",
        box_declarations(&shape.bbox),
        shape.fill.to_css()
    )
}

/// Declarations for a stroked border.
pub fn border_declarations(border: &BorderRun) -> String {
    format!(
        "{} border: {} solid {};",
        box_declarations(&border.bbox),
        px(border.width),
        border.color.to_css()
    )
}

/// Wrap declarations in a rule scoped to one page.
pub fn element_rule(page: u32, class: &str, declarations: &str) -> String {
    format!(".page--{} .{} {{ {} }}\n", page, class, declarations)
}

// Family names end up inside a quoted CSS string.
fn sanitize_family(family: &str) -> String {
    family
        .chars()
        .filter(|c| !matches!(c, '"' | '\\' | ';' | '{' | '}' | '<' | '>'))
        .collect::<String>()
        .trim()
        .to_string()
}
