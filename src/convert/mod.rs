//! End-to-end conversion: PDF in, HTML/CSS/manifest out.
//!
//! # Example
//!
//! ```no_run
//! use pdfhtml::convert::{ConvertOptions, Converter};
//!
//! fn main() -> pdfhtml::Result<()> {
//!     let mut converter = Converter::open("document.pdf", "out", ConvertOptions::default())?;
//!     let result = converter.convert(1.0)?;
//!     println!("{}", result.index_path.display());
//!     Ok(())
//! }
//! ```

mod pdf;

pub use pdf::Converter;

use std::path::PathBuf;

use crate::parser::{ErrorMode, ExtractOptions};
use crate::render::{PageCounts, Synthesis, SynthesisOptions};

/// Options for document conversion.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Extraction options
    pub extract: ExtractOptions,

    /// Markup synthesis options
    pub synthesis: SynthesisOptions,
}

impl ConvertOptions {
    /// Create new conversion options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set extraction options.
    pub fn with_extract_options(mut self, options: ExtractOptions) -> Self {
        self.extract = options;
        self
    }

    /// Set synthesis options.
    pub fn with_synthesis_options(mut self, options: SynthesisOptions) -> Self {
        self.synthesis = options;
        self
    }

    /// Set the background render resolution.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.extract = self.extract.with_dpi(dpi);
        self
    }

    /// Enable or disable whole-page background renders.
    pub fn with_backgrounds(mut self, enabled: bool) -> Self {
        self.extract = self.extract.with_backgrounds(enabled);
        self
    }

    /// Fail on the first page that cannot be parsed.
    pub fn strict(mut self) -> Self {
        self.extract = self.extract.with_error_mode(ErrorMode::Strict);
        self
    }

    /// Embed styles in the HTML document.
    pub fn with_inline_css(mut self) -> Self {
        self.synthesis = self.synthesis.with_inline_stylesheet();
        self
    }

    /// Paint page backgrounds behind the markup.
    pub fn with_backdrop(mut self, backdrop: bool) -> Self {
        self.synthesis = self.synthesis.with_backdrop(backdrop);
        self
    }
}

/// Result of one conversion pass.
#[derive(Debug, Clone)]
pub struct ConvertResult {
    /// Path of the written `index.html`
    pub index_path: PathBuf,

    /// What was synthesized
    pub synthesis: Synthesis,
}

impl ConvertResult {
    /// Primitive totals across all pages.
    pub fn counts(&self) -> PageCounts {
        self.synthesis.counts()
    }

    /// Number of pages written.
    pub fn page_count(&self) -> usize {
        self.synthesis.manifest.pages.len()
    }

    /// Text scale the markup was synthesized with.
    pub fn text_scale(&self) -> f64 {
        self.synthesis.manifest.text_scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Stylesheet;

    #[test]
    fn test_convert_options_builder() {
        let options = ConvertOptions::new()
            .with_dpi(72)
            .with_backgrounds(false)
            .strict()
            .with_inline_css()
            .with_backdrop(true);

        assert_eq!(options.extract.dpi, 72);
        assert!(!options.extract.render_backgrounds);
        assert_eq!(options.extract.error_mode, ErrorMode::Strict);
        assert_eq!(options.synthesis.stylesheet, Stylesheet::Inline);
        assert!(options.synthesis.backdrop);
    }
}
