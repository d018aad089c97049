//! Integration tests for the refinement loop driving a real converter.

use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use pdfhtml::convert::{ConvertOptions, Converter};
use pdfhtml::error::Result;
use pdfhtml::parser::{PdfBackend, RawChar, RawPage, RawRect, RawTextLine};
use pdfhtml::regress::{
    HtmlRenderer, PixelComparator, ReferenceImage, RefineOptions, RefinementReport,
    TemplateRefiner, Termination, UnavailableRenderer,
};
use tempfile::TempDir;

struct HelloBackend;

impl PdfBackend for HelloBackend {
    fn page_count(&self) -> usize {
        1
    }

    fn page_size(&self, _index: usize) -> Result<(f64, f64)> {
        Ok((200.0, 300.0))
    }

    fn page(&self, _index: usize) -> Result<RawPage> {
        Ok(RawPage {
            width: 200.0,
            height: 300.0,
            text_lines: vec![RawTextLine {
                text: "Hello".to_string(),
                chars: vec![RawChar {
                    text: "Hello".to_string(),
                    font_name: "Helvetica".to_string(),
                    size: 12.0,
                }],
                bbox: Some(RawRect::new(10.0, 10.0, 100.0, 30.0)),
            }],
            ..Default::default()
        })
    }
}

/// Paints a bar whose length follows the font size in the stylesheet, a
/// crude stand-in for a browser laying out text.
struct BarRenderer {
    stylesheet: PathBuf,
}

fn bar_image(width: u32, height: u32, bar: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        if x < bar && (40..60).contains(&y) {
            Rgb([0, 0, 0])
        } else {
            Rgb([255, 255, 255])
        }
    })
}

fn bar_length(font_size: f64) -> u32 {
    (font_size * 4.0).round() as u32
}

impl HtmlRenderer for BarRenderer {
    fn name(&self) -> &str {
        "bar"
    }

    fn render(&self, uri: &str, output: &Path, width: u32, height: u32) -> Result<Option<PathBuf>> {
        assert!(uri.ends_with("#page-1"));
        let css = fs::read_to_string(&self.stylesheet)?;
        let start = css.find("font-size: ").map(|i| i + "font-size: ".len());
        let font_size = start
            .and_then(|s| css[s..].find("px").map(|e| &css[s..s + e]))
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(0.0);

        bar_image(width, height, bar_length(font_size))
            .save(output)
            .map_err(pdfhtml::Error::from)?;
        Ok(Some(output.to_path_buf()))
    }
}

fn setup(dir: &Path) -> (Converter, Vec<ReferenceImage>) {
    let reference_path = dir.join("reference_1.png");
    // The page as it should look: text 20% larger than extracted
    bar_image(100, 100, bar_length(12.0 * 1.2)).save(&reference_path).unwrap();
    let reference = ReferenceImage::open(1, &reference_path).unwrap();

    let converter = Converter::from_backend(Box::new(HelloBackend), dir, ConvertOptions::default());
    (converter, vec![reference])
}

fn refine(dir: &Path, iterations: u32) -> (RefinementReport, Converter) {
    let (mut converter, references) = setup(dir);
    let renderer = BarRenderer {
        stylesheet: dir.join("styles.css"),
    };
    let comparator = PixelComparator::new();
    let refiner = TemplateRefiner::new(&renderer, &comparator, references, dir)
        .with_options(RefineOptions::default().with_max_iterations(iterations));
    let report = refiner.run(&mut converter).unwrap();
    (report, converter)
}

#[test]
fn test_refinement_finds_better_scale() {
    let dir = TempDir::new().unwrap();
    let (report, _) = refine(dir.path(), 8);

    assert_eq!(report.termination, Termination::MaxIterations);
    assert_eq!(report.iterations, 8);
    assert_eq!(report.history.len(), 8);
    assert!((report.best_scale - 1.2).abs() < 0.03);

    let first = report.iteration_score(1).unwrap();
    let best = report.best_score.unwrap();
    assert!(first > 0.0);
    assert!(best < first);

    // Markup on disk was rewritten with the best scale
    assert_eq!(report.final_scale, Some(report.best_scale));
    let css = fs::read_to_string(dir.path().join("styles.css")).unwrap();
    assert!(css.contains("font-size: 14.40px;"));
}

#[test]
fn test_iteration_artifacts_and_report() {
    let dir = TempDir::new().unwrap();
    let (report, _) = refine(dir.path(), 2);

    for iteration in 1..=2 {
        let folder = dir.path().join(format!("iteration_{}", iteration));
        assert!(folder.join("page_1.png").is_file());
        assert!(folder.join("page_1_diff.png").is_file());
    }

    let path = dir.path().join(pdfhtml::regress::REPORT_FILE);
    report.write_json(&path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["termination"], "max_iterations");
    assert_eq!(json["history"].as_array().unwrap().len(), 2);
    assert_eq!(json["history"][0]["text_scale"], 1.0);
}

#[test]
fn test_missing_renderer_keeps_first_markup() {
    let dir = TempDir::new().unwrap();
    let (mut converter, references) = setup(dir.path());
    let renderer = UnavailableRenderer;
    let comparator = PixelComparator::new();
    let refiner = TemplateRefiner::new(&renderer, &comparator, references, dir.path());

    let report = refiner.run(&mut converter).unwrap();
    assert_eq!(report.termination, Termination::RendererUnavailable);
    assert_eq!(report.iterations, 1);
    assert_eq!(report.best_score, None);
    assert!(report.history[0].diff_score.is_nan());
    assert!(report.history[0].screenshot_path.is_none());

    let css = fs::read_to_string(dir.path().join("styles.css")).unwrap();
    assert!(css.contains("font-size: 12.00px;"));
}
