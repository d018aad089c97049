//! HTML synthesis from the Layout Model.

use std::fmt::Write;

use crate::model::{Document, Element, ElementKind, ImageRun, Page, TextRun};

use super::css::{self, BASE_STYLESHEET};
use super::{Manifest, PageCounts, PageManifest, Stylesheet, Synthesis, SynthesisOptions};

/// Synthesize markup with default options.
pub fn synthesize(doc: &Document, text_scale: f64) -> Synthesis {
    HtmlSynthesizer::new(SynthesisOptions::default()).synthesize(doc, text_scale)
}

/// Synthesize markup with explicit options.
pub fn synthesize_with_options(
    doc: &Document,
    text_scale: f64,
    options: &SynthesisOptions,
) -> Synthesis {
    HtmlSynthesizer::new(options.clone()).synthesize(doc, text_scale)
}

/// Escape text content: `&`, `<` and `>`.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape an attribute value (text escapes plus quotes).
pub fn escape_attr(value: &str) -> String {
    escape_text(value)
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Markup synthesizer.
///
/// Output depends only on the document, the scale and the options, so two
/// runs over the same input produce byte-identical HTML and CSS.
pub struct HtmlSynthesizer {
    options: SynthesisOptions,
}

impl HtmlSynthesizer {
    /// Create a new synthesizer.
    pub fn new(options: SynthesisOptions) -> Self {
        Self { options }
    }

    /// Synthesize HTML, CSS and the manifest for a document.
    pub fn synthesize(&self, doc: &Document, text_scale: f64) -> Synthesis {
        let text_scale = if text_scale.is_finite() && text_scale > 0.0 {
            text_scale
        } else {
            log::warn!("Invalid text scale {}, using 1.0", text_scale);
            1.0
        };

        let mut css = String::from(BASE_STYLESHEET);
        let mut body = String::new();
        let mut pages = Vec::with_capacity(doc.pages.len());

        for (index, page) in doc.pages.iter().enumerate() {
            let number = index as u32 + 1;
            let entry = self.render_page(&mut body, &mut css, page, number, text_scale);
            log::debug!(
                "Page {}: {} text, {} shapes, {} borders, {} images",
                number,
                entry.counts.text_count,
                entry.counts.shape_count,
                entry.counts.border_count,
                entry.counts.image_count
            );
            pages.push(entry);
        }

        let html = self.document_html(&css, &body);
        let manifest = Manifest {
            source: doc.source.clone(),
            text_scale,
            metadata: doc.metadata.clone(),
            pages,
        };

        Synthesis {
            html,
            css,
            manifest,
            stylesheet_file: self.options.stylesheet_file().map(str::to_string),
        }
    }

    fn document_html(&self, css: &str, body: &str) -> String {
        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
        html.push_str("  <meta charset=\"utf-8\">\n");
        html.push_str(
            "  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
        );
        let _ = writeln!(html, "  <title>{}</title>", escape_text(&self.options.title));
        match &self.options.stylesheet {
            Stylesheet::External(name) => {
                let _ = writeln!(
                    html,
                    "  <link rel=\"stylesheet\" href=\"{}\">",
                    escape_attr(name)
                );
            }
            Stylesheet::Inline => {
                html.push_str("  <style>\n");
                html.push_str(css);
                html.push_str("  </style>\n");
            }
        }
        html.push_str("</head>\n<body>\n");
        html.push_str(body);
        html.push_str("</body>\n</html>\n");
        html
    }

    fn render_page(
        &self,
        body: &mut String,
        css: &mut String,
        page: &Page,
        number: u32,
        text_scale: f64,
    ) -> PageManifest {
        let mut counts = PageCounts::default();
        let mut primitives = Vec::new();

        css.push_str(&css::page_rule(number, page.width, page.height));
        let _ = writeln!(
            body,
            "  <section class=\"page page--{0}\" id=\"page-{0}\" data-page=\"{0}\">",
            number
        );

        if self.options.backdrop {
            if let Some(background) = page.background.as_deref() {
                let _ = writeln!(
                    body,
                    "    <div class=\"page__background\" style=\"background-image: url({});\"></div>",
                    escape_attr(&format!("'{}'", background.replace('\'', "%27")))
                );
            }
        }

        for kind in ElementKind::PAINT_ORDER {
            for element in page.elements.iter().filter(|e| e.kind() == kind) {
                match element {
                    Element::Shape(shape) => {
                        if shape.bbox.is_degenerate() {
                            continue;
                        }
                        counts.add(kind);
                        let class = format!("shape--{}", counts.shape_count);
                        css.push_str(&css::element_rule(
                            number,
                            &class,
                            &css::shape_declarations(shape),
                        ));
                        let _ = writeln!(body, "    <div class=\"page__shape {}\"></div>", class);
                        primitives.push(element.clone());
                    }
                    Element::Border(border) => {
                        if border.bbox.is_degenerate()
                            || !(border.width.is_finite() && border.width > 0.0)
                        {
                            continue;
                        }
                        counts.add(kind);
                        let class = format!("border--{}", counts.border_count);
                        css.push_str(&css::element_rule(
                            number,
                            &class,
                            &css::border_declarations(border),
                        ));
                        let _ = writeln!(body, "    <div class=\"page__border {}\"></div>", class);
                        primitives.push(element.clone());
                    }
                    Element::Image(image) => {
                        if let Some(emitted) =
                            self.render_image(body, css, image, number, &mut counts)
                        {
                            primitives.push(Element::Image(emitted));
                        }
                    }
                    Element::Text(text) => {
                        if !is_paintable_text(text) {
                            continue;
                        }
                        counts.add(kind);
                        let class = format!("text--{}", counts.text_count);
                        css.push_str(&css::element_rule(
                            number,
                            &class,
                            &css::text_declarations(text, text_scale),
                        ));
                        let _ = writeln!(
                            body,
                            "    <span class=\"page__text {}\">{}</span>",
                            class,
                            escape_text(&text.text)
                        );
                        primitives.push(element.clone());
                    }
                }
            }
        }

        body.push_str("  </section>\n");

        PageManifest {
            number,
            width: page.width,
            height: page.height,
            counts,
            background: page.background.clone(),
            reference: None,
            primitives,
        }
    }

    // One <img> per paintable placement; the run is kept in the manifest
    // only with the placements that were emitted.
    fn render_image(
        &self,
        body: &mut String,
        css: &mut String,
        image: &ImageRun,
        number: u32,
        counts: &mut PageCounts,
    ) -> Option<ImageRun> {
        if image.source.trim().is_empty() {
            return None;
        }

        let mut placements = Vec::new();
        for bbox in image.placements.iter().filter(|b| !b.is_degenerate()) {
            counts.add(ElementKind::Image);
            let seq = counts.image_count;
            let class = format!("image--{}", seq);
            css.push_str(&css::element_rule(
                number,
                &class,
                &css::box_declarations(bbox),
            ));
            let _ = writeln!(
                body,
                "    <img class=\"page__image {}\" src=\"{}\" alt=\"Image {} on page {}\">",
                class,
                escape_attr(&image.source),
                seq,
                number
            );
            placements.push(*bbox);
        }

        if placements.is_empty() {
            None
        } else {
            Some(ImageRun {
                placements,
                ..image.clone()
            })
        }
    }
}

fn is_paintable_text(run: &TextRun) -> bool {
    !run.text.trim().is_empty()
        && !run.bbox.is_degenerate()
        && run.font_size.is_finite()
        && run.font_size > 0.0
}
