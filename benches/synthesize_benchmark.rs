//! Benchmarks for markup synthesis and visual comparison.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{Rgb, RgbImage};

use pdfhtml::{
    BorderRun, BoundingBox, CssColor, Document, Element, ImageRun, Page, PixelComparator,
    ShapeRun, TextRun,
};

/// Builds a document with a form-like layout on every page.
fn create_test_document(page_count: u32) -> Document {
    let pages = (1..=page_count)
        .map(|number| {
            let mut page = Page::new(number, 612.0, 792.0);
            page.push(Element::Shape(ShapeRun {
                bbox: BoundingBox::new(0.0, 0.0, 612.0, 60.0),
                fill: CssColor::rgb(32, 64, 128),
            }));
            for row in 0..40 {
                let top = 80.0 + row as f64 * 17.0;
                page.push(Element::Border(BorderRun {
                    bbox: BoundingBox::new(36.0, top, 540.0, 16.0),
                    color: CssColor::rgb(0, 0, 0),
                    width: 1.0,
                }));
                page.push(Element::Text(TextRun::new(
                    format!("Row {} of page {}: label & value <field>", row + 1, number),
                    BoundingBox::new(40.0, top + 2.0, 300.0, 12.0),
                    11.0,
                )));
            }
            page.push(Element::Image(ImageRun::new(
                format!("assets/page_{}_image_1.png", number),
                vec![BoundingBox::new(480.0, 8.0, 96.0, 44.0)],
            )));
            page
        })
        .collect();
    Document::from_pages(pages)
}

/// Benchmark HTML/CSS synthesis at various sizes.
fn bench_synthesis(c: &mut Criterion) {
    let mut group = c.benchmark_group("synthesis");

    for page_count in [1, 5, 20].iter() {
        let document = create_test_document(*page_count);

        group.bench_function(format!("{}_pages", page_count), |b| {
            b.iter(|| pdfhtml::synthesize(black_box(&document), black_box(1.1)));
        });
    }

    group.finish();
}

/// Benchmark the per-pixel diff used by refinement.
fn bench_pixel_compare(c: &mut Criterion) {
    let reference = RgbImage::from_fn(612, 792, |x, y| {
        if (x / 17 + y / 17) % 2 == 0 {
            Rgb([255, 255, 255])
        } else {
            Rgb([20, 20, 20])
        }
    });
    let candidate = RgbImage::from_pixel(600, 780, Rgb([250, 250, 250]));
    let comparator = PixelComparator::new();

    c.bench_function("pixel_compare_letter", |b| {
        b.iter(|| {
            comparator
                .compare_images(black_box(&reference), black_box(&candidate))
                .unwrap()
        });
    });
}

/// Benchmark PDF signature detection.
fn bench_detection(c: &mut Criterion) {
    let pdf_data = b"%PDF-1.7\n1 0 obj\n<< /Type /Catalog >>\nendobj\n";
    let html_data = b"<!DOCTYPE html><html><body></body></html>";

    c.bench_function("detect_pdf", |b| {
        b.iter(|| pdfhtml::pdf_version_from_bytes(black_box(pdf_data)).unwrap());
    });

    c.bench_function("detect_non_pdf", |b| {
        b.iter(|| pdfhtml::is_pdf_bytes(black_box(html_data)));
    });
}

criterion_group!(benches, bench_synthesis, bench_pixel_compare, bench_detection);
criterion_main!(benches);
