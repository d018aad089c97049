//! Grouping positioned glyphs into text lines.
//!
//! Glyphs arrive in content-stream order. A glyph joins the current line
//! when it sits on the same baseline and follows closely enough; a gap wider
//! than the word margin inserts a space.

use super::raw::{RawChar, RawRect, RawTextLine};

/// Baselines within this fraction of the font size belong to one line.
const BASELINE_TOLERANCE: f64 = 0.1;
/// Horizontal gaps up to this many font sizes keep a line together.
const CHAR_MARGIN: f64 = 2.0;
/// Gaps wider than this fraction of the font size separate words.
const WORD_MARGIN: f64 = 0.2;
/// Glyph box extents above and below the baseline, in font sizes.
const ASCENT: f64 = 0.8;
const DESCENT: f64 = 0.2;

/// A glyph placed on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    /// Decoded text, may be empty for unmapped codes
    pub text: String,
    /// Font resource name
    pub font_name: String,
    /// Rendered font size
    pub size: f64,
    /// Left edge of the advance
    pub x0: f64,
    /// Right edge of the advance
    pub x1: f64,
    /// Baseline
    pub baseline: f64,
}

impl Glyph {
    fn rect(&self) -> RawRect {
        RawRect::new(
            self.x0,
            self.baseline - DESCENT * self.size,
            self.x1,
            self.baseline + ASCENT * self.size,
        )
    }

    fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

struct LineBuilder {
    text: String,
    chars: Vec<RawChar>,
    bbox: RawRect,
    baseline: f64,
    size: f64,
    x0: f64,
    x1: f64,
}

impl LineBuilder {
    fn start(glyph: &Glyph) -> Self {
        let mut line = Self {
            text: String::new(),
            chars: Vec::new(),
            bbox: glyph.rect(),
            baseline: glyph.baseline,
            size: glyph.size,
            x0: glyph.x0.min(glyph.x1),
            x1: glyph.x0.max(glyph.x1),
        };
        line.push(glyph);
        line
    }

    fn gap(&self, glyph: &Glyph) -> f64 {
        glyph.x0.min(glyph.x1) - self.x1
    }

    fn accepts(&self, glyph: &Glyph) -> bool {
        let size = self.size.max(glyph.size);
        let same_baseline = (glyph.baseline - self.baseline).abs() <= BASELINE_TOLERANCE * size;
        let gap = self.gap(glyph);
        same_baseline && gap <= CHAR_MARGIN * glyph.size && gap >= -glyph.size
    }

    fn needs_space(&self, glyph: &Glyph) -> bool {
        self.gap(glyph) > WORD_MARGIN * glyph.size
            && !self.text.ends_with(char::is_whitespace)
            && !glyph.text.starts_with(char::is_whitespace)
    }

    fn push(&mut self, glyph: &Glyph) {
        self.text.push_str(&glyph.text);
        self.chars.push(RawChar {
            text: glyph.text.clone(),
            font_name: glyph.font_name.clone(),
            size: glyph.size,
        });
        self.bbox = self.bbox.union(&glyph.rect());
        self.x0 = self.x0.min(glyph.x0.min(glyph.x1));
        self.x1 = self.x1.max(glyph.x0.max(glyph.x1));
        self.size = glyph.size;
    }

    fn finish(self) -> RawTextLine {
        RawTextLine {
            text: self.text,
            chars: self.chars,
            bbox: Some(self.bbox),
        }
    }
}

/// Segment glyphs into lines.
pub fn segment_lines(glyphs: &[Glyph]) -> Vec<RawTextLine> {
    let mut lines = Vec::new();
    let mut current: Option<LineBuilder> = None;

    for glyph in glyphs {
        if !(glyph.size.is_finite() && glyph.size > 0.0)
            || !glyph.x0.is_finite()
            || !glyph.x1.is_finite()
            || !glyph.baseline.is_finite()
        {
            continue;
        }

        let joins = current.as_ref().is_some_and(|line| line.accepts(glyph));
        if joins {
            if let Some(line) = current.as_mut() {
                if line.needs_space(glyph) {
                    line.text.push(' ');
                }
                line.push(glyph);
            }
            continue;
        }

        if let Some(line) = current.take() {
            lines.push(line.finish());
        }
        if !glyph.is_blank() {
            current = Some(LineBuilder::start(glyph));
        }
    }
    if let Some(line) = current {
        lines.push(line.finish());
    }

    lines
}
