//! Extraction options and configuration.

/// Options for the extraction stage.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Error handling mode for malformed pages
    pub error_mode: ErrorMode,

    /// Resolution of whole-page background renders
    pub dpi: u32,

    /// Asset directory name, relative to the output directory
    pub assets_subdir: String,

    /// Images covering at least this fraction of the page are treated as
    /// full-page backgrounds and skipped
    pub coverage_threshold: f64,

    /// Strokes narrower than this are widened to it, in pixels
    pub min_stroke_width: f64,

    /// Whether to rasterize each page as a background reference
    pub render_backgrounds: bool,
}

impl ExtractOptions {
    /// Create new extract options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Abort on the first malformed page.
    pub fn strict(mut self) -> Self {
        self.error_mode = ErrorMode::Strict;
        self
    }

    /// Set background render resolution.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Set the asset directory name.
    pub fn with_assets_subdir(mut self, subdir: impl Into<String>) -> Self {
        self.assets_subdir = subdir.into();
        self
    }

    /// Set the full-page coverage threshold.
    pub fn with_coverage_threshold(mut self, threshold: f64) -> Self {
        self.coverage_threshold = threshold;
        self
    }

    /// Set the minimum visible stroke width.
    pub fn with_min_stroke_width(mut self, width: f64) -> Self {
        self.min_stroke_width = width;
        self
    }

    /// Enable or disable background rendering.
    pub fn with_backgrounds(mut self, enabled: bool) -> Self {
        self.render_backgrounds = enabled;
        self
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Lenient,
            dpi: 144,
            assets_subdir: "assets".to_string(),
            coverage_threshold: 0.95,
            min_stroke_width: 1.0,
            render_backgrounds: true,
        }
    }
}

/// Error handling mode during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on any malformed page
    Strict,
    /// Replace malformed pages with empty ones and continue
    #[default]
    Lenient,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_options_builder() {
        let options = ExtractOptions::new()
            .strict()
            .with_dpi(72)
            .with_coverage_threshold(0.9)
            .with_backgrounds(false);

        assert_eq!(options.error_mode, ErrorMode::Strict);
        assert_eq!(options.dpi, 72);
        assert_eq!(options.coverage_threshold, 0.9);
        assert!(!options.render_backgrounds);
    }

    #[test]
    fn test_default_options() {
        let options = ExtractOptions::default();
        assert_eq!(options.error_mode, ErrorMode::Lenient);
        assert_eq!(options.dpi, 144);
        assert_eq!(options.assets_subdir, "assets");
        assert_eq!(options.coverage_threshold, 0.95);
        assert_eq!(options.min_stroke_width, 1.0);
    }
}
