//! Markup synthesis options.

/// Where the generated stylesheet goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stylesheet {
    /// Separate file linked from the document head
    External(String),
    /// `<style>` block inside the document head
    Inline,
}

impl Default for Stylesheet {
    fn default() -> Self {
        Stylesheet::External("styles.css".to_string())
    }
}

/// Options for synthesizing HTML/CSS from a document.
#[derive(Debug, Clone)]
pub struct SynthesisOptions {
    /// Stylesheet placement
    pub stylesheet: Stylesheet,

    /// Paint each page's background render behind its primitives
    pub backdrop: bool,

    /// Document title
    pub title: String,
}

impl SynthesisOptions {
    /// Create new synthesis options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Link the stylesheet from a file with this name.
    pub fn with_external_stylesheet(mut self, name: impl Into<String>) -> Self {
        self.stylesheet = Stylesheet::External(name.into());
        self
    }

    /// Embed the stylesheet in the document head.
    pub fn with_inline_stylesheet(mut self) -> Self {
        self.stylesheet = Stylesheet::Inline;
        self
    }

    /// Enable or disable the page background backdrop.
    pub fn with_backdrop(mut self, backdrop: bool) -> Self {
        self.backdrop = backdrop;
        self
    }

    /// Set the document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// File name of the external stylesheet, if any.
    pub fn stylesheet_file(&self) -> Option<&str> {
        match &self.stylesheet {
            Stylesheet::External(name) => Some(name),
            Stylesheet::Inline => None,
        }
    }
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            stylesheet: Stylesheet::default(),
            backdrop: false,
            title: "PDF Conversion".to_string(),
        }
    }
}
