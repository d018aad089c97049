//! Layout Model extraction.
//!
//! The [`Extractor`] walks every page a [`PdfBackend`] reports and turns raw
//! text lines, painted paths and embedded images into positioned primitives
//! in top-left-origin page space.

use std::path::Path;

use unicode_normalization::UnicodeNormalization;

use crate::error::Result;
use crate::model::{BoundingBox, Element, ImageRun, Page, TextRun};

use super::assets::{resolve_extension, AssetStore};
use super::font::parse_font_name;
use super::options::{ErrorMode, ExtractOptions};
use super::path::drawing_elements;
use super::raster::PageRasterizer;
use super::raw::{PdfBackend, RawImage, RawPage, RawTextLine};

/// Builds Layout Model pages from a backend.
pub struct Extractor<'a> {
    backend: &'a dyn PdfBackend,
    options: &'a ExtractOptions,
    assets: AssetStore,
}

impl<'a> Extractor<'a> {
    /// Create an extractor writing image assets below `output_dir`.
    pub fn new(backend: &'a dyn PdfBackend, output_dir: &Path, options: &'a ExtractOptions) -> Self {
        Self {
            backend,
            options,
            assets: AssetStore::new(output_dir, options.assets_subdir.clone()),
        }
    }

    /// Asset store used for images and backgrounds.
    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    /// Extract every page in order.
    pub fn extract(&self) -> Result<Vec<Page>> {
        let count = self.backend.page_count();
        log::debug!("Extracting {} page(s)", count);
        (0..count).map(|index| self.extract_page(index)).collect()
    }

    /// Extract one page (0-based index).
    ///
    /// In lenient mode a page the backend cannot parse becomes an empty page
    /// with the best known size. Missing dependencies always propagate.
    pub fn extract_page(&self, index: usize) -> Result<Page> {
        let number = index as u32 + 1;
        match self.backend.page(index) {
            Ok(raw) => Ok(self.build_page(number, raw)),
            Err(e) if e.is_dependency_unavailable() || self.options.error_mode == ErrorMode::Strict => Err(e),
            Err(e) => {
                log::warn!("Failed to parse page {}: {}", number, e);
                let (width, height) = self.backend.page_size(index).unwrap_or((0.0, 0.0));
                self.assets.clear_page_images(number);
                Ok(Page::new(number, width, height))
            }
        }
    }

    fn build_page(&self, number: u32, raw: RawPage) -> Page {
        let mut page = Page::new(number, raw.width, raw.height);

        for drawing in &raw.drawings {
            for element in drawing_elements(drawing, page.height, self.options.min_stroke_width) {
                page.push(element);
            }
        }

        self.assets.clear_page_images(number);
        for (i, image) in raw.images.iter().enumerate() {
            if let Some(run) = self.image_run(&page, i + 1, image) {
                page.push(Element::Image(run));
            }
        }

        for line in &raw.text_lines {
            if let Some(run) = text_run(line, page.height) {
                page.push(Element::Text(run));
            }
        }

        log::debug!(
            "Page {}: {} text, {} shape, {} border, {} image",
            number,
            page.texts().count(),
            page.shapes().count(),
            page.borders().count(),
            page.images().count()
        );
        page
    }

    fn image_run(&self, page: &Page, sequence: usize, image: &RawImage) -> Option<ImageRun> {
        if image.data.is_empty() {
            log::debug!("Page {}: image {} has no data", page.number, image.name);
            return None;
        }

        let placements: Vec<BoundingBox> = image
            .placements
            .iter()
            .map(|r| BoundingBox::from_pdf_rect(r.x0, r.y0, r.x1, r.y1, page.height))
            .collect();

        let page_area = page.area();
        if page_area > 0.0
            && placements
                .iter()
                .any(|p| p.area() / page_area >= self.options.coverage_threshold)
        {
            log::debug!(
                "Page {}: image {} covers the page, leaving it to the background",
                page.number,
                image.name
            );
            return None;
        }

        let placements: Vec<BoundingBox> = placements
            .into_iter()
            .filter(|p| !p.is_degenerate())
            .collect();
        if placements.is_empty() {
            return None;
        }

        let extension = resolve_extension(image.extension.as_deref(), &image.data);
        let source = match self
            .assets
            .write_image(page.number, sequence, &extension, &image.data)
        {
            Ok(source) => source,
            Err(e) => {
                log::warn!("Page {}: failed to write image {}: {}", page.number, image.name, e);
                return None;
            }
        };

        Some(ImageRun {
            source,
            placements,
            pixel_width: image.pixel_width,
            pixel_height: image.pixel_height,
        })
    }

    /// Render a background for every page and record its relative path.
    ///
    /// Failures are logged per page and leave that page without a
    /// background.
    pub fn attach_backgrounds(&self, pages: &mut [Page], rasterizer: &dyn PageRasterizer, pdf: &Path) {
        if !rasterizer.is_available() {
            log::warn!(
                "Page rasterizer '{}' unavailable; pages get no background",
                rasterizer.name()
            );
            return;
        }
        if let Err(e) = self.assets.ensure_dir() {
            log::warn!("Cannot create asset directory: {}", e);
            return;
        }

        for page in pages.iter_mut() {
            let (absolute, relative) = self.assets.background_path(page.number);
            match rasterizer.render_page(pdf, page.number, self.options.dpi, &absolute) {
                Ok(()) => page.background = Some(relative),
                Err(e) => log::warn!("Page {}: background render failed: {}", page.number, e),
            }
        }
    }
}

/// Build a text run from a raw line, or `None` when nothing is left to
/// show.
///
/// The text is NFC-normalized with line breaks flattened to spaces and
/// surrounding whitespace trimmed. The font size is the mean size of the
/// line's glyphs; the font hints come from its first glyph.
pub fn text_run(line: &RawTextLine, page_height: f64) -> Option<TextRun> {
    let text: String = line.text.replace(['\r', '\n'], " ").nfc().collect();
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let rect = line.bbox?;
    let bbox = BoundingBox::from_pdf_rect(rect.x0, rect.y0, rect.x1, rect.y1, page_height);
    if !bbox.is_finite() || bbox.width < 0.0 || bbox.height < 0.0 {
        return None;
    }

    let sizes: Vec<f64> = line
        .chars
        .iter()
        .map(|c| c.size)
        .filter(|s| s.is_finite() && *s > 0.0)
        .collect();
    if sizes.is_empty() {
        return None;
    }
    let font_size = sizes.iter().sum::<f64>() / sizes.len() as f64;

    let mut run = TextRun::new(text, bbox, font_size);
    if let Some(first) = line.chars.iter().find(|c| !c.font_name.is_empty()) {
        run = run
            .with_font(parse_font_name(&first.font_name))
            .with_font_name(first.font_name.clone());
    }
    Some(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::parser::raw::{PathOp, RawChar, RawColor, RawDrawing, RawRect};
    use tempfile::TempDir;

    struct FakeBackend {
        pages: Vec<Result<RawPage>>,
    }

    impl PdfBackend for FakeBackend {
        fn page_count(&self) -> usize {
            self.pages.len()
        }

        fn page_size(&self, _index: usize) -> Result<(f64, f64)> {
            Ok((200.0, 300.0))
        }

        fn page(&self, index: usize) -> Result<RawPage> {
            match &self.pages[index] {
                Ok(page) => Ok(page.clone()),
                Err(Error::DependencyUnavailable(m)) => Err(Error::DependencyUnavailable(m.clone())),
                Err(e) => Err(Error::MalformedInput(e.to_string())),
            }
        }
    }

    fn line(text: &str, rect: RawRect, sizes: &[f64]) -> RawTextLine {
        RawTextLine {
            text: text.to_string(),
            chars: sizes
                .iter()
                .map(|&size| RawChar {
                    text: "x".to_string(),
                    font_name: "ABCDEF+Arial-BoldMT".to_string(),
                    size,
                })
                .collect(),
            bbox: Some(rect),
        }
    }

    fn hello_page() -> RawPage {
        RawPage {
            width: 200.0,
            height: 300.0,
            text_lines: vec![line("Hello", RawRect::new(10.0, 10.0, 100.0, 30.0), &[12.0; 5])],
            ..Default::default()
        }
    }

    #[test]
    fn test_text_run_geometry() {
        let run = text_run(
            &line("Hello", RawRect::new(10.0, 10.0, 100.0, 30.0), &[10.0, 14.0]),
            300.0,
        )
        .unwrap();
        assert_eq!(run.text, "Hello");
        assert_eq!(run.bbox, BoundingBox::new(10.0, 270.0, 90.0, 20.0));
        assert_eq!(run.font_size, 12.0);
        assert_eq!(run.font.family.as_deref(), Some("Arial"));
        assert_eq!(run.font.weight, Some(700));
    }

    #[test]
    fn test_text_run_normalizes_text() {
        let run = text_run(
            &line("  Cafe\u{301}\nau lait ", RawRect::new(0.0, 0.0, 10.0, 10.0), &[9.0]),
            10.0,
        )
        .unwrap();
        assert_eq!(run.text, "Caf\u{e9} au lait");
    }

    #[test]
    fn test_blank_line_dropped() {
        assert!(text_run(&line(" \n ", RawRect::new(0.0, 0.0, 1.0, 1.0), &[9.0]), 10.0).is_none());
        assert!(text_run(&line("x", RawRect::new(0.0, 0.0, 1.0, 1.0), &[]), 10.0).is_none());
    }

    #[test]
    fn test_extract_pages() {
        let dir = TempDir::new().unwrap();
        let backend = FakeBackend {
            pages: vec![Ok(hello_page())],
        };
        let options = ExtractOptions::default();
        let pages = Extractor::new(&backend, dir.path(), &options).extract().unwrap();

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].number, 1);
        assert_eq!(pages[0].texts().count(), 1);
    }

    #[test]
    fn test_malformed_page_is_contained() {
        let dir = TempDir::new().unwrap();
        let backend = FakeBackend {
            pages: vec![
                Ok(hello_page()),
                Err(Error::MalformedInput("broken".to_string())),
                Ok(hello_page()),
            ],
        };
        let options = ExtractOptions::default();
        let pages = Extractor::new(&backend, dir.path(), &options).extract().unwrap();

        assert_eq!(pages.len(), 3);
        assert!(pages[1].is_empty());
        assert_eq!((pages[1].width, pages[1].height), (200.0, 300.0));
        assert_eq!(pages[2].number, 3);
    }

    #[test]
    fn test_strict_mode_propagates() {
        let dir = TempDir::new().unwrap();
        let backend = FakeBackend {
            pages: vec![Err(Error::MalformedInput("broken".to_string()))],
        };
        let options = ExtractOptions::default().strict();
        assert!(Extractor::new(&backend, dir.path(), &options).extract().is_err());
    }

    #[test]
    fn test_dependency_failure_propagates() {
        let dir = TempDir::new().unwrap();
        let backend = FakeBackend {
            pages: vec![Err(Error::DependencyUnavailable("parser".to_string()))],
        };
        let options = ExtractOptions::default();
        let err = Extractor::new(&backend, dir.path(), &options)
            .extract()
            .unwrap_err();
        assert!(err.is_dependency_unavailable());
    }

    #[test]
    fn test_full_page_image_skipped() {
        let dir = TempDir::new().unwrap();
        let mut page = hello_page();
        page.width = 100.0;
        page.height = 100.0;
        page.text_lines.clear();
        page.images = vec![
            RawImage {
                name: "Im1".to_string(),
                data: vec![0xFF, 0xD8, 0xFF, 0xE0],
                extension: Some("jpg".to_string()),
                // 98 x 98 = 96.04% of the page
                placements: vec![RawRect::new(1.0, 1.0, 99.0, 99.0)],
                ..Default::default()
            },
            RawImage {
                name: "Im2".to_string(),
                data: vec![0xFF, 0xD8, 0xFF, 0xE0],
                extension: Some("jpg".to_string()),
                // 90 x 100 = 90% of the page
                placements: vec![RawRect::new(0.0, 0.0, 90.0, 100.0)],
                ..Default::default()
            },
        ];
        let backend = FakeBackend { pages: vec![Ok(page)] };
        let options = ExtractOptions::default();
        let pages = Extractor::new(&backend, dir.path(), &options).extract().unwrap();

        let images: Vec<_> = pages[0].images().collect();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].source, "assets/page_1_image_2.jpg");
        assert!(!dir.path().join("assets/page_1_image_1.jpg").exists());
        assert!(dir.path().join("assets/page_1_image_2.jpg").exists());
    }

    #[test]
    fn test_stale_assets_removed() {
        let dir = TempDir::new().unwrap();
        let assets = dir.path().join("assets");
        std::fs::create_dir_all(&assets).unwrap();
        std::fs::write(assets.join("page_1_image_9.png"), b"old").unwrap();
        std::fs::write(assets.join("page_2_image_1.png"), b"keep").unwrap();

        let backend = FakeBackend {
            pages: vec![Ok(hello_page())],
        };
        let options = ExtractOptions::default();
        Extractor::new(&backend, dir.path(), &options).extract().unwrap();

        assert!(!assets.join("page_1_image_9.png").exists());
        assert!(assets.join("page_2_image_1.png").exists());
    }

    #[test]
    fn test_drawings_become_primitives() {
        let dir = TempDir::new().unwrap();
        let mut page = hello_page();
        page.drawings = vec![RawDrawing {
            ops: vec![PathOp::Rect(RawRect::new(0.0, 0.0, 50.0, 20.0))],
            fill: Some(RawColor::gray(0.5)),
            ..Default::default()
        }];
        let backend = FakeBackend { pages: vec![Ok(page)] };
        let options = ExtractOptions::default();
        let pages = Extractor::new(&backend, dir.path(), &options).extract().unwrap();
        assert_eq!(pages[0].shapes().count(), 1);
    }
}
