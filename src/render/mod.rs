//! Markup synthesis: Layout Model to pixel-positioned HTML/CSS.

mod css;
mod html;
mod manifest;
mod options;
mod result;

pub use css::{px, BASE_STYLESHEET};
pub use html::{escape_text, synthesize, synthesize_with_options, HtmlSynthesizer};
pub use manifest::{Manifest, PageCounts, PageManifest};
pub use options::{Stylesheet, SynthesisOptions};
pub use result::{Synthesis, INDEX_FILE, MANIFEST_FILE};
