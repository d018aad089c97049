//! PDF to HTML converter.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::model::Document;
use crate::parser::{
    open_backend, Extractor, PageRasterizer, PdfBackend, PdftoppmRasterizer, UnavailableRasterizer,
};
use crate::regress::MarkupTarget;
use crate::render::HtmlSynthesizer;

use super::{ConvertOptions, ConvertResult};

/// Converts one PDF into an output directory.
///
/// Extraction runs once, on first use; every later [`convert`] call only
/// re-synthesizes the cached Layout Model at a new text scale and rewrites
/// the markup files.
///
/// [`convert`]: Converter::convert
pub struct Converter {
    backend: Box<dyn PdfBackend>,
    rasterizer: Box<dyn PageRasterizer>,
    source: Option<PathBuf>,
    output_dir: PathBuf,
    options: ConvertOptions,
    document: Option<Document>,
}

impl Converter {
    /// Open a PDF file with the default backend and rasterizer.
    ///
    /// Fails with [`crate::Error::DependencyUnavailable`] when no PDF
    /// backend is compiled in.
    pub fn open(
        pdf: impl AsRef<Path>,
        output_dir: impl Into<PathBuf>,
        options: ConvertOptions,
    ) -> Result<Self> {
        let pdf = pdf.as_ref();
        let backend = open_backend(pdf)?;
        Ok(Self {
            backend,
            rasterizer: Box::new(PdftoppmRasterizer::new()),
            source: Some(pdf.to_path_buf()),
            output_dir: output_dir.into(),
            options,
            document: None,
        })
    }

    /// Convert from an already opened backend. Without a source file there
    /// are no background renders.
    pub fn from_backend(
        backend: Box<dyn PdfBackend>,
        output_dir: impl Into<PathBuf>,
        options: ConvertOptions,
    ) -> Self {
        Self {
            backend,
            rasterizer: Box::new(UnavailableRasterizer),
            source: None,
            output_dir: output_dir.into(),
            options,
            document: None,
        }
    }

    /// Replace the page rasterizer.
    pub fn with_rasterizer(mut self, rasterizer: Box<dyn PageRasterizer>) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    /// Set the source file used for background renders and the manifest.
    pub fn with_source(mut self, pdf: impl Into<PathBuf>) -> Self {
        self.source = Some(pdf.into());
        self
    }

    /// Output directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Conversion options.
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// The Layout Model, extracting it on first call.
    pub fn document(&mut self) -> Result<&Document> {
        let document = match self.document.take() {
            Some(document) => document,
            None => self.extract()?,
        };
        Ok(self.document.insert(document))
    }

    fn extract(&self) -> Result<Document> {
        log::info!("Extracting layout from {} page(s)", self.backend.page_count());
        let extractor = Extractor::new(self.backend.as_ref(), &self.output_dir, &self.options.extract);
        let mut pages = extractor.extract()?;

        if self.options.extract.render_backgrounds {
            match &self.source {
                Some(pdf) => extractor.attach_backgrounds(&mut pages, self.rasterizer.as_ref(), pdf),
                None => log::debug!("No source file; skipping background renders"),
            }
        }

        let mut metadata = self.backend.metadata();
        metadata.page_count = pages.len() as u32;

        Ok(Document {
            metadata,
            pages,
            source: self
                .source
                .as_ref()
                .map(|p| p.display().to_string()),
        })
    }

    /// Synthesize at `text_scale` and write `index.html`, the stylesheet and
    /// `manifest.json` into the output directory.
    pub fn convert(&mut self, text_scale: f64) -> Result<ConvertResult> {
        let synthesizer = HtmlSynthesizer::new(self.options.synthesis.clone());
        let output_dir = self.output_dir.clone();
        let synthesis = synthesizer.synthesize(self.document()?, text_scale);
        let index_path = synthesis.write_output(&output_dir)?;

        log::info!(
            "Wrote {} page(s) at scale {:.3} to {}",
            synthesis.manifest.pages.len(),
            synthesis.manifest.text_scale,
            output_dir.display()
        );
        Ok(ConvertResult {
            index_path,
            synthesis,
        })
    }
}

impl MarkupTarget for Converter {
    fn render_markup(&mut self, text_scale: f64) -> Result<PathBuf> {
        Ok(self.convert(text_scale)?.index_path)
    }
}
