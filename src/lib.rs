//! # pdfhtml
//!
//! Converts PDF pages into pixel-positioned HTML/CSS and tunes the result
//! against reference renders.
//!
//! Every page becomes a fixed-size section holding absolutely placed text
//! lines, filled shapes, stroked borders and images. An optional refinement
//! loop renders the markup with a headless browser, compares it with a
//! whole-page render of the PDF and searches for the text scale with the
//! smallest visual difference.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdfhtml::convert_file;
//!
//! fn main() -> pdfhtml::Result<()> {
//!     let result = convert_file("document.pdf", "out")?;
//!     println!("{} page(s) -> {}", result.page_count(), result.index_path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Output layout
//!
//! - `index.html`, `styles.css` (unless styles are inline), `manifest.json`
//! - `assets/page_<p>_image_<n>.<ext>` and `assets/page_<p>.png`
//! - during refinement: `iteration_<n>/page_<p>.png`, `iteration_<n>/page_<p>_diff.png`
//!   and `regression.json`

pub mod convert;
pub mod detect;
pub mod error;
pub mod model;
pub mod parser;
mod process;
pub mod regress;
pub mod render;

// Re-export commonly used types
pub use convert::{ConvertOptions, ConvertResult, Converter};
pub use detect::{is_pdf_bytes, pdf_version_from_bytes, pdf_version_from_path};
pub use error::{Error, Result};
pub use model::{
    BorderRun, BoundingBox, CssColor, Document, Element, ElementKind, FontFace, FontStyle,
    ImageRun, Metadata, Page, ShapeRun, TextRun,
};
pub use parser::{ErrorMode, ExtractOptions, PdfBackend};
pub use regress::{
    ChromiumRenderer, HtmlRenderer, ImageComparator, MarkupTarget, PixelComparator,
    ReferenceImage, RefineOptions, RefinementReport, TemplateRefiner, Termination,
};
pub use render::{synthesize, synthesize_with_options, Manifest, Synthesis, SynthesisOptions};

use std::path::{Path, PathBuf};

/// Convert a PDF into `output_dir` at text scale 1.0.
///
/// # Example
///
/// ```no_run
/// use pdfhtml::convert_file;
///
/// let result = convert_file("document.pdf", "out").unwrap();
/// println!("{} text runs", result.counts().text_count);
/// ```
pub fn convert_file<P: AsRef<Path>, Q: Into<PathBuf>>(pdf: P, output_dir: Q) -> Result<ConvertResult> {
    convert_file_with_options(pdf, output_dir, ConvertOptions::default())
}

/// Convert a PDF into `output_dir` with custom options.
///
/// # Example
///
/// ```no_run
/// use pdfhtml::{convert_file_with_options, ConvertOptions};
///
/// let options = ConvertOptions::new().with_dpi(96).with_inline_css();
/// let result = convert_file_with_options("document.pdf", "out", options).unwrap();
/// ```
pub fn convert_file_with_options<P: AsRef<Path>, Q: Into<PathBuf>>(
    pdf: P,
    output_dir: Q,
    options: ConvertOptions,
) -> Result<ConvertResult> {
    let mut converter = Converter::open(pdf, output_dir, options)?;
    converter.convert(1.0)
}

/// Extract the Layout Model of a PDF without writing markup. Image assets
/// are still written below `output_dir`.
pub fn extract_document<P: AsRef<Path>, Q: Into<PathBuf>>(
    pdf: P,
    output_dir: Q,
    options: ConvertOptions,
) -> Result<Document> {
    let mut converter = Converter::open(pdf, output_dir, options)?;
    Ok(converter.document()?.clone())
}

/// Reference images named by a manifest, opened to read their size.
///
/// Paths are resolved against `output_dir`. Unreadable references are
/// logged and skipped.
pub fn load_references(output_dir: &Path, manifest: &Manifest) -> Vec<ReferenceImage> {
    manifest
        .references()
        .into_iter()
        .filter_map(|(page, relative)| {
            match ReferenceImage::open(page, output_dir.join(relative)) {
                Ok(reference) => Some(reference),
                Err(e) => {
                    log::warn!("Page {}: unusable reference {}: {}", page, relative, e);
                    None
                }
            }
        })
        .collect()
}

/// Builder for a full conversion with optional refinement.
///
/// # Example
///
/// ```no_run
/// use pdfhtml::PdfHtml;
///
/// let outcome = PdfHtml::new()
///     .with_dpi(144)
///     .with_iterations(3)
///     .run("document.pdf", "out")?;
/// if let Some(report) = outcome.report {
///     println!("best scale {:.3}", report.best_scale);
/// }
/// # Ok::<(), pdfhtml::Error>(())
/// ```
pub struct PdfHtml {
    convert_options: ConvertOptions,
    refine_options: RefineOptions,
    regression: bool,
    chrome: Option<PathBuf>,
}

impl PdfHtml {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            convert_options: ConvertOptions::default(),
            refine_options: RefineOptions::default(),
            regression: true,
            chrome: None,
        }
    }

    /// Set the reference render resolution.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.convert_options = self.convert_options.with_dpi(dpi);
        self
    }

    /// Set the refinement iteration budget.
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.refine_options = self.refine_options.with_max_iterations(iterations);
        self
    }

    /// Set refinement options.
    pub fn with_refine_options(mut self, options: RefineOptions) -> Self {
        self.refine_options = options;
        self
    }

    /// Set conversion options.
    pub fn with_convert_options(mut self, options: ConvertOptions) -> Self {
        self.convert_options = options;
        self
    }

    /// Skip the refinement loop.
    pub fn without_regression(mut self) -> Self {
        self.regression = false;
        self
    }

    /// Use a specific Chromium binary.
    pub fn with_chrome(mut self, binary: impl Into<PathBuf>) -> Self {
        self.chrome = Some(binary.into());
        self
    }

    /// Embed styles in the HTML document.
    pub fn with_inline_css(mut self) -> Self {
        self.convert_options = self.convert_options.with_inline_css();
        self
    }

    /// Paint page backgrounds behind the markup.
    pub fn with_backdrop(mut self) -> Self {
        self.convert_options = self.convert_options.with_backdrop(true);
        self
    }

    /// Fail on the first page that cannot be parsed.
    pub fn strict(mut self) -> Self {
        self.convert_options = self.convert_options.strict();
        self
    }

    /// The renderer refinement will use.
    pub fn renderer(&self) -> ChromiumRenderer {
        let renderer = match &self.chrome {
            Some(binary) => ChromiumRenderer::new().with_binary(binary),
            None => ChromiumRenderer::new(),
        };
        renderer.with_device_scale_factor(self.convert_options.extract.dpi as f64 / 72.0)
    }

    /// Convert `pdf` into `output_dir`, then refine unless disabled.
    ///
    /// Only conversion failures are errors. Refinement problems are logged
    /// and leave `report` empty.
    pub fn run<P: AsRef<Path>, Q: Into<PathBuf>>(&self, pdf: P, output_dir: Q) -> Result<PdfHtmlOutcome> {
        let output_dir = output_dir.into();
        let mut converter = Converter::open(pdf, output_dir.clone(), self.convert_options.clone())?;
        let conversion = converter.convert(self.refine_options.initial_scale)?;

        if !self.regression {
            log::info!("Skipping regression loop as requested");
            return Ok(PdfHtmlOutcome {
                conversion,
                report: None,
            });
        }

        let references = load_references(&output_dir, &conversion.synthesis.manifest);
        if references.is_empty() {
            log::warn!("No reference images found for regression testing");
            return Ok(PdfHtmlOutcome {
                conversion,
                report: None,
            });
        }

        let renderer = self.renderer();
        let comparator = PixelComparator::new();
        let refiner = TemplateRefiner::new(&renderer, &comparator, references, &output_dir)
            .with_options(self.refine_options.clone());

        let report = match refiner.run(&mut converter) {
            Ok(report) => {
                if let Err(e) = report.write_json(output_dir.join(regress::REPORT_FILE)) {
                    log::warn!("Failed to write regression report: {}", e);
                }
                Some(report)
            }
            Err(e) => {
                log::warn!("Visual regression skipped: {}", e);
                None
            }
        };

        Ok(PdfHtmlOutcome { conversion, report })
    }
}

impl Default for PdfHtml {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of [`PdfHtml::run`].
#[derive(Debug, Clone)]
pub struct PdfHtmlOutcome {
    /// First conversion pass
    pub conversion: ConvertResult,
    /// Refinement report, when refinement ran
    pub report: Option<RefinementReport>,
}

impl PdfHtmlOutcome {
    /// Text scale of the markup left on disk.
    pub fn final_scale(&self) -> f64 {
        self.report
            .as_ref()
            .and_then(|r| r.final_scale)
            .unwrap_or_else(|| self.conversion.text_scale())
    }
}
