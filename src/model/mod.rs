//! Layout Model: normalized, page-local geometry for one converted document.
//!
//! Every coordinate in this module is in CSS pixels (one PDF point maps to
//! one pixel) with the origin at the top-left corner of its page. The
//! extraction adapter is the only producer; the markup synthesizer and the
//! refinement controller only read it.

mod document;
mod geometry;
mod page;
mod runs;

pub use document::{Document, Metadata};
pub use geometry::{BoundingBox, CssColor};
pub use page::{Element, ElementKind, Page};
pub use runs::{BorderRun, FontFace, FontStyle, ImageRun, ShapeRun, TextRun};
