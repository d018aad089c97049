//! Content-stream interpretation on top of lopdf.
//!
//! Tracks just enough graphics and text state to place glyphs, painted
//! paths and image XObjects in page space.

use std::collections::HashMap;
use std::io::Cursor;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId, Stream};

use crate::error::{Error, Result};

use super::lines::{segment_lines, Glyph};
use super::raw::{PathOp, Point, RawColor, RawDrawing, RawImage, RawPage, RawRect};

/// Nested form XObjects deeper than this are ignored.
const MAX_FORM_DEPTH: usize = 8;

/// A zero line width paints the thinnest line a device can show.
const HAIRLINE_WIDTH: f64 = 0.1;

/// Affine transform `[a b c d e f]` in PDF row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Matrix {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Matrix {
    pub(crate) const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub(crate) fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    fn from_operands(n: &[f64]) -> Option<Self> {
        match n {
            [a, b, c, d, e, f] => Some(Self::new(*a, *b, *c, *d, *e, *f)),
            _ => None,
        }
    }

    pub(crate) fn translate(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// `self × other`: apply `self`, then `other`.
    pub(crate) fn multiply(&self, o: &Matrix) -> Matrix {
        Matrix {
            a: self.a * o.a + self.b * o.c,
            b: self.a * o.b + self.b * o.d,
            c: self.c * o.a + self.d * o.c,
            d: self.c * o.b + self.d * o.d,
            e: self.e * o.a + self.f * o.c + o.e,
            f: self.e * o.b + self.f * o.d + o.f,
        }
    }

    pub(crate) fn apply(&self, x: f64, y: f64) -> Point {
        Point::new(
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Length of the transformed y unit vector.
    fn vertical_scale(&self) -> f64 {
        (self.c * self.c + self.d * self.d).sqrt()
    }

    /// Geometric mean scale, used for line widths.
    fn mean_scale(&self) -> f64 {
        (self.a * self.d - self.b * self.c).abs().sqrt()
    }
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    fill: RawColor,
    stroke: RawColor,
    line_width: f64,
    fill_alpha: f64,
    stroke_alpha: f64,
    font: Option<Vec<u8>>,
    font_size: f64,
    char_spacing: f64,
    word_spacing: f64,
    horizontal_scaling: f64,
    leading: f64,
    rise: f64,
}

impl GraphicsState {
    fn new(ctm: Matrix) -> Self {
        Self {
            ctm,
            fill: RawColor::gray(0.0),
            stroke: RawColor::gray(0.0),
            line_width: 1.0,
            fill_alpha: 1.0,
            stroke_alpha: 1.0,
            font: None,
            font_size: 12.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scaling: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

/// Width metrics and encoding source of one font resource.
struct Font<'a> {
    dict: &'a Dictionary,
    base_font: String,
    two_byte: bool,
    first_char: u32,
    widths: Vec<f64>,
    cid_widths: HashMap<u32, f64>,
    default_width: f64,
}

impl<'a> Font<'a> {
    fn load(doc: &'a LopdfDocument, dict: &'a Dictionary) -> Self {
        let base_font = dict
            .get(b"BaseFont")
            .ok()
            .and_then(|o| o.as_name().ok())
            .map(|n| String::from_utf8_lossy(n).into_owned())
            .unwrap_or_default();
        let two_byte = matches!(dict.get(b"Subtype").and_then(Object::as_name), Ok(b"Type0"));

        let mut font = Font {
            dict,
            base_font,
            two_byte,
            first_char: 0,
            widths: Vec::new(),
            cid_widths: HashMap::new(),
            default_width: if two_byte { 1000.0 } else { 500.0 },
        };

        if two_byte {
            let descendant = dict
                .get(b"DescendantFonts")
                .ok()
                .and_then(|o| deref(doc, o))
                .and_then(|o| o.as_array().ok())
                .and_then(|arr| arr.first())
                .and_then(|o| deref_dict(doc, o));
            if let Some(cid) = descendant {
                if let Some(dw) = cid.get(b"DW").ok().and_then(number) {
                    font.default_width = dw;
                }
                if let Some(w) = cid.get(b"W").ok().and_then(|o| deref(doc, o)) {
                    font.cid_widths = parse_cid_widths(doc, w);
                }
            }
        } else {
            font.first_char = dict
                .get(b"FirstChar")
                .ok()
                .and_then(number)
                .map(|n| n.max(0.0) as u32)
                .unwrap_or(0);
            if let Some(widths) = dict
                .get(b"Widths")
                .ok()
                .and_then(|o| deref(doc, o))
                .and_then(|o| o.as_array().ok())
            {
                font.widths = widths
                    .iter()
                    .map(|w| deref(doc, w).and_then(number).unwrap_or(0.0))
                    .collect();
            }
            let missing = dict
                .get(b"FontDescriptor")
                .ok()
                .and_then(|o| deref_dict(doc, o))
                .and_then(|fd| fd.get(b"MissingWidth").ok())
                .and_then(number);
            if let Some(missing) = missing {
                font.default_width = missing;
            }
        }

        font
    }

    /// Advance of a character code in thousandths of an em.
    fn width(&self, code: u32) -> f64 {
        if self.two_byte {
            return self
                .cid_widths
                .get(&code)
                .copied()
                .unwrap_or(self.default_width);
        }
        code.checked_sub(self.first_char)
            .and_then(|i| self.widths.get(i as usize))
            .copied()
            .unwrap_or(self.default_width)
    }
}

/// Parse a CIDFont `W` array: `c [w1 w2 ...]` or `c_first c_last w`.
fn parse_cid_widths(doc: &LopdfDocument, w: &Object) -> HashMap<u32, f64> {
    let mut widths = HashMap::new();
    let Ok(items) = w.as_array() else {
        return widths;
    };

    let mut i = 0;
    while i < items.len() {
        let Some(start) = number(&items[i]) else {
            break;
        };
        let start = start.max(0.0) as u32;
        match items.get(i + 1).and_then(|o| deref(doc, o)) {
            Some(Object::Array(list)) => {
                for (offset, w) in list.iter().enumerate() {
                    let code = u32::try_from(offset).ok().and_then(|o| start.checked_add(o));
                    if let (Some(code), Some(w)) = (code, number(w)) {
                        widths.insert(code, w);
                    }
                }
                i += 2;
            }
            Some(end) => {
                let (Some(end), Some(w)) = (number(end), items.get(i + 2).and_then(number)) else {
                    break;
                };
                let end = end.max(0.0) as u32;
                let last = end.min(start.checked_add(0xFFFF).unwrap_or(u32::MAX));
                for code in start..=last {
                    widths.insert(code, w);
                }
                i += 3;
            }
            None => break,
        }
    }
    widths
}

/// Named resources visible to a content stream.
pub(crate) struct Scope<'a> {
    fonts: HashMap<Vec<u8>, Font<'a>>,
    xobjects: HashMap<Vec<u8>, ObjectId>,
    ext_gstates: HashMap<Vec<u8>, &'a Dictionary>,
}

impl<'a> Scope<'a> {
    pub(crate) fn new(doc: &'a LopdfDocument, resources: Option<&'a Dictionary>) -> Self {
        let mut scope = Scope {
            fonts: HashMap::new(),
            xobjects: HashMap::new(),
            ext_gstates: HashMap::new(),
        };
        let Some(resources) = resources else {
            return scope;
        };

        let sub = |key: &[u8]| {
            resources
                .get(key)
                .ok()
                .and_then(|o| deref_dict(doc, o))
        };

        if let Some(fonts) = sub(b"Font") {
            for (name, obj) in fonts.iter() {
                if let Some(dict) = deref_dict(doc, obj) {
                    scope.fonts.insert(name.clone(), Font::load(doc, dict));
                }
            }
        }
        if let Some(xobjects) = sub(b"XObject") {
            for (name, obj) in xobjects.iter() {
                if let Ok(id) = obj.as_reference() {
                    scope.xobjects.insert(name.clone(), id);
                }
            }
        }
        if let Some(states) = sub(b"ExtGState") {
            for (name, obj) in states.iter() {
                if let Some(dict) = deref_dict(doc, obj) {
                    scope.ext_gstates.insert(name.clone(), dict);
                }
            }
        }
        scope
    }
}

/// Walks one page's content and collects raw primitives.
pub(crate) struct Interpreter<'a> {
    doc: &'a LopdfDocument,
    gs: GraphicsState,
    saved: Vec<GraphicsState>,
    tm: Matrix,
    tlm: Matrix,
    path: Vec<PathOp>,
    current_point: Option<Point>,
    subpath_start: Option<Point>,
    glyphs: Vec<Glyph>,
    drawings: Vec<RawDrawing>,
    images: Vec<RawImage>,
    image_slots: HashMap<ObjectId, Option<usize>>,
    depth: usize,
}

impl<'a> Interpreter<'a> {
    /// Start with `origin` mapped to `(0, 0)`.
    pub(crate) fn new(doc: &'a LopdfDocument, origin: (f64, f64)) -> Self {
        Self {
            doc,
            gs: GraphicsState::new(Matrix::translate(-origin.0, -origin.1)),
            saved: Vec::new(),
            tm: Matrix::IDENTITY,
            tlm: Matrix::IDENTITY,
            path: Vec::new(),
            current_point: None,
            subpath_start: None,
            glyphs: Vec::new(),
            drawings: Vec::new(),
            images: Vec::new(),
            image_slots: HashMap::new(),
            depth: 0,
        }
    }

    /// Interpret a decoded content stream.
    pub(crate) fn run(&mut self, content: &[u8], scope: &Scope<'a>) -> Result<()> {
        let content = Content::decode(content).map_err(|e| Error::MalformedInput(e.to_string()))?;
        for op in &content.operations {
            self.apply(op, scope);
        }
        Ok(())
    }

    /// Collected primitives for a page of the given size.
    pub(crate) fn finish(self, width: f64, height: f64) -> RawPage {
        RawPage {
            width,
            height,
            text_lines: segment_lines(&self.glyphs),
            drawings: self.drawings,
            images: self.images,
        }
    }

    fn apply(&mut self, op: &Operation, scope: &Scope<'a>) {
        let n = numbers(&op.operands);
        match op.operator.as_str() {
            "q" => self.saved.push(self.gs.clone()),
            "Q" => {
                if let Some(gs) = self.saved.pop() {
                    self.gs = gs;
                }
            }
            "cm" => {
                if let Some(m) = Matrix::from_operands(&n) {
                    self.gs.ctm = m.multiply(&self.gs.ctm);
                }
            }
            "w" => {
                if let Some(&w) = n.first() {
                    self.gs.line_width = w;
                }
            }
            "gs" => {
                if let Some(state) = name_operand(op).and_then(|k| scope.ext_gstates.get(k)) {
                    self.apply_ext_gstate(state);
                }
            }

            // Colors
            "g" | "rg" | "k" | "sc" | "scn" => {
                if let Some(color) = RawColor::from_components(&n) {
                    self.gs.fill = color;
                }
            }
            "G" | "RG" | "K" | "SC" | "SCN" => {
                if let Some(color) = RawColor::from_components(&n) {
                    self.gs.stroke = color;
                }
            }
            "cs" => self.gs.fill = RawColor::gray(0.0),
            "CS" => self.gs.stroke = RawColor::gray(0.0),

            // Path construction
            "m" => {
                if let [x, y] = n[..] {
                    let p = self.gs.ctm.apply(x, y);
                    self.path.push(PathOp::MoveTo(p));
                    self.current_point = Some(p);
                    self.subpath_start = Some(p);
                }
            }
            "l" => {
                if let [x, y] = n[..] {
                    let p = self.gs.ctm.apply(x, y);
                    self.path.push(PathOp::LineTo(p));
                    self.current_point = Some(p);
                }
            }
            "c" => {
                if let [x1, y1, x2, y2, x3, y3] = n[..] {
                    let ctm = self.gs.ctm;
                    let end = ctm.apply(x3, y3);
                    self.path
                        .push(PathOp::CurveTo(ctm.apply(x1, y1), ctm.apply(x2, y2), end));
                    self.current_point = Some(end);
                }
            }
            "v" => {
                if let [x2, y2, x3, y3] = n[..] {
                    let ctm = self.gs.ctm;
                    let c2 = ctm.apply(x2, y2);
                    let end = ctm.apply(x3, y3);
                    let c1 = self.current_point.unwrap_or(c2);
                    self.path.push(PathOp::CurveTo(c1, c2, end));
                    self.current_point = Some(end);
                }
            }
            "y" => {
                if let [x1, y1, x3, y3] = n[..] {
                    let ctm = self.gs.ctm;
                    let end = ctm.apply(x3, y3);
                    self.path.push(PathOp::CurveTo(ctm.apply(x1, y1), end, end));
                    self.current_point = Some(end);
                }
            }
            "re" => {
                if let [x, y, w, h] = n[..] {
                    let ctm = self.gs.ctm;
                    let corners = [
                        ctm.apply(x, y),
                        ctm.apply(x + w, y),
                        ctm.apply(x + w, y + h),
                        ctm.apply(x, y + h),
                    ];
                    if let Some(rect) = RawRect::bounding(&corners) {
                        self.path.push(PathOp::Rect(rect));
                    }
                    self.current_point = Some(corners[0]);
                    self.subpath_start = Some(corners[0]);
                }
            }
            "h" => {
                self.path.push(PathOp::Close);
                self.current_point = self.subpath_start;
            }

            // Path painting
            "S" => self.paint(false, true, false),
            "s" => self.paint(false, true, true),
            "f" | "F" | "f*" => self.paint(true, false, false),
            "B" | "B*" => self.paint(true, true, false),
            "b" | "b*" => self.paint(true, true, true),
            "n" => self.paint(false, false, false),

            // Text objects and state
            "BT" => {
                self.tm = Matrix::IDENTITY;
                self.tlm = Matrix::IDENTITY;
            }
            "Tf" => {
                if let Some(Object::Name(name)) = op.operands.first() {
                    self.gs.font = Some(name.clone());
                }
                if let Some(size) = op.operands.get(1).and_then(number) {
                    self.gs.font_size = size;
                }
            }
            "Tc" => self.set_text_param(&n, |gs, v| gs.char_spacing = v),
            "Tw" => self.set_text_param(&n, |gs, v| gs.word_spacing = v),
            "Tz" => self.set_text_param(&n, |gs, v| gs.horizontal_scaling = v / 100.0),
            "TL" => self.set_text_param(&n, |gs, v| gs.leading = v),
            "Ts" => self.set_text_param(&n, |gs, v| gs.rise = v),
            "Td" => {
                if let [tx, ty] = n[..] {
                    self.next_line(tx, ty);
                }
            }
            "TD" => {
                if let [tx, ty] = n[..] {
                    self.gs.leading = -ty;
                    self.next_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = Matrix::from_operands(&n) {
                    self.tm = m;
                    self.tlm = m;
                }
            }
            "T*" => self.next_line(0.0, -self.gs.leading),

            // Text showing
            "Tj" => {
                if let Some(Object::String(bytes, _)) = op.operands.first() {
                    self.show_text(bytes, scope);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = op.operands.first() {
                    self.show_array(items, scope);
                }
            }
            "'" => {
                self.next_line(0.0, -self.gs.leading);
                if let Some(Object::String(bytes, _)) = op.operands.first() {
                    self.show_text(bytes, scope);
                }
            }
            "\"" => {
                if let (Some(aw), Some(ac)) = (
                    op.operands.first().and_then(number),
                    op.operands.get(1).and_then(number),
                ) {
                    self.gs.word_spacing = aw;
                    self.gs.char_spacing = ac;
                }
                self.next_line(0.0, -self.gs.leading);
                if let Some(Object::String(bytes, _)) = op.operands.get(2) {
                    self.show_text(bytes, scope);
                }
            }

            "Do" => {
                if let Some(name) = name_operand(op) {
                    self.do_xobject(name, scope);
                }
            }
            _ => {}
        }
    }

    fn set_text_param(&mut self, n: &[f64], set: impl FnOnce(&mut GraphicsState, f64)) {
        if let Some(&v) = n.first() {
            set(&mut self.gs, v);
        }
    }

    fn apply_ext_gstate(&mut self, state: &Dictionary) {
        if let Some(ca) = state.get(b"ca").ok().and_then(number) {
            self.gs.fill_alpha = ca;
        }
        if let Some(ca) = state.get(b"CA").ok().and_then(number) {
            self.gs.stroke_alpha = ca;
        }
        if let Some(lw) = state.get(b"LW").ok().and_then(number) {
            self.gs.line_width = lw;
        }
    }

    fn paint(&mut self, fill: bool, stroke: bool, close: bool) {
        if close {
            self.path.push(PathOp::Close);
        }
        let ops = std::mem::take(&mut self.path);
        self.current_point = None;
        self.subpath_start = None;
        if ops.is_empty() || !(fill || stroke) {
            return;
        }

        let width = if self.gs.line_width > 0.0 {
            self.gs.line_width
        } else {
            HAIRLINE_WIDTH
        };
        self.drawings.push(RawDrawing {
            ops,
            fill: fill.then_some(self.gs.fill),
            stroke: stroke.then_some(self.gs.stroke),
            stroke_width: width * self.gs.ctm.mean_scale(),
            fill_opacity: self.gs.fill_alpha,
            stroke_opacity: self.gs.stroke_alpha,
        });
    }

    fn next_line(&mut self, tx: f64, ty: f64) {
        self.tlm = Matrix::translate(tx, ty).multiply(&self.tlm);
        self.tm = self.tlm;
    }

    fn show_array(&mut self, items: &[Object], scope: &Scope<'a>) {
        for item in items {
            match item {
                Object::String(bytes, _) => self.show_text(bytes, scope),
                other => {
                    if let Some(adjust) = number(other) {
                        let tx = -adjust / 1000.0 * self.gs.font_size * self.gs.horizontal_scaling;
                        self.tm = Matrix::translate(tx, 0.0).multiply(&self.tm);
                    }
                }
            }
        }
    }

    fn show_text(&mut self, bytes: &[u8], scope: &Scope<'a>) {
        let doc = self.doc;
        let font = self.gs.font.as_ref().and_then(|key| scope.fonts.get(key));
        let encoding = font.and_then(|f| f.dict.get_font_encoding(doc).ok());
        let font_name = match (font, &self.gs.font) {
            (Some(f), _) if !f.base_font.is_empty() => f.base_font.clone(),
            (_, Some(key)) => String::from_utf8_lossy(key).into_owned(),
            _ => String::new(),
        };
        let two_byte = font.is_some_and(|f| f.two_byte);

        for chunk in bytes.chunks(if two_byte { 2 } else { 1 }) {
            let code = chunk.iter().fold(0u32, |acc, b| (acc << 8) | u32::from(*b));
            let width = font.map(|f| f.width(code)).unwrap_or(500.0);
            let text = match &encoding {
                Some(enc) => LopdfDocument::decode_text(enc, chunk)
                    .unwrap_or_else(|_| decode_text_simple(chunk)),
                None => decode_text_simple(chunk),
            };

            let word_spacing = if !two_byte && code == 32 {
                self.gs.word_spacing
            } else {
                0.0
            };
            let tx = (width / 1000.0 * self.gs.font_size + self.gs.char_spacing + word_spacing)
                * self.gs.horizontal_scaling;

            self.place_glyph(text, &font_name, tx);
            self.tm = Matrix::translate(tx, 0.0).multiply(&self.tm);
        }
    }

    fn place_glyph(&mut self, text: String, font_name: &str, advance: f64) {
        if text.is_empty() {
            return;
        }
        let m = self.tm.multiply(&self.gs.ctm);
        let start = m.apply(0.0, self.gs.rise);
        let end = m.apply(advance, self.gs.rise);
        self.glyphs.push(Glyph {
            text,
            font_name: font_name.to_string(),
            size: (self.gs.font_size * m.vertical_scale()).abs(),
            x0: start.x,
            x1: end.x,
            baseline: start.y,
        });
    }

    fn do_xobject(&mut self, name: &[u8], scope: &Scope<'a>) {
        let Some(&id) = scope.xobjects.get(name) else {
            log::debug!("Unknown XObject {}", String::from_utf8_lossy(name));
            return;
        };
        let doc = self.doc;
        let Ok(Object::Stream(stream)) = doc.get_object(id) else {
            return;
        };

        match stream.dict.get(b"Subtype").and_then(Object::as_name) {
            Ok(b"Image") => self.place_image(id, name, stream),
            Ok(b"Form") => self.run_form(stream, scope),
            _ => {}
        }
    }

    fn place_image(&mut self, id: ObjectId, name: &[u8], stream: &Stream) {
        let ctm = self.gs.ctm;
        let corners = [
            ctm.apply(0.0, 0.0),
            ctm.apply(1.0, 0.0),
            ctm.apply(1.0, 1.0),
            ctm.apply(0.0, 1.0),
        ];
        let Some(rect) = RawRect::bounding(&corners) else {
            return;
        };

        let slot = match self.image_slots.get(&id) {
            Some(slot) => *slot,
            None => {
                let slot = encode_image(self.doc, stream).map(|(data, extension)| {
                    self.images.push(RawImage {
                        name: String::from_utf8_lossy(name).into_owned(),
                        data,
                        extension: Some(extension.to_string()),
                        pixel_width: dict_u32(&stream.dict, b"Width"),
                        pixel_height: dict_u32(&stream.dict, b"Height"),
                        placements: Vec::new(),
                    });
                    self.images.len() - 1
                });
                self.image_slots.insert(id, slot);
                slot
            }
        };
        if let Some(index) = slot {
            self.images[index].placements.push(rect);
        }
    }

    fn run_form(&mut self, stream: &'a Stream, scope: &Scope<'a>) {
        if self.depth >= MAX_FORM_DEPTH {
            log::warn!("Form XObjects nested deeper than {}; skipping", MAX_FORM_DEPTH);
            return;
        }
        let Some(content) = stream_bytes(stream) else {
            log::debug!("Form XObject content could not be decoded");
            return;
        };

        let doc = self.doc;
        let own_scope;
        let scope = match stream
            .dict
            .get(b"Resources")
            .ok()
            .and_then(|o| deref_dict(doc, o))
        {
            Some(resources) => {
                own_scope = Scope::new(doc, Some(resources));
                &own_scope
            }
            None => scope,
        };

        let saved_gs = self.gs.clone();
        let saved_depth = self.saved.len();
        let (saved_tm, saved_tlm) = (self.tm, self.tlm);
        if let Some(m) = stream
            .dict
            .get(b"Matrix")
            .ok()
            .and_then(|o| o.as_array().ok())
            .and_then(|arr| Matrix::from_operands(&arr.iter().filter_map(number).collect::<Vec<_>>()))
        {
            self.gs.ctm = m.multiply(&self.gs.ctm);
        }

        self.depth += 1;
        if let Err(e) = self.run(&content, scope) {
            log::warn!("Skipping malformed form XObject: {}", e);
        }
        self.depth -= 1;

        self.saved.truncate(saved_depth);
        self.gs = saved_gs;
        self.tm = saved_tm;
        self.tlm = saved_tlm;
    }
}

/// Encode image XObject bytes into a file format a browser can show.
fn encode_image(doc: &LopdfDocument, stream: &Stream) -> Option<(Vec<u8>, &'static str)> {
    let filters = filter_names(&stream.dict);
    if filters.len() == 1 {
        match filters[0].as_slice() {
            b"DCTDecode" => return Some((stream.content.clone(), "jpg")),
            b"JPXDecode" => return Some((stream.content.clone(), "jp2")),
            b"CCITTFaxDecode" => return Some((stream.content.clone(), "tiff")),
            _ => {}
        }
    }

    let Some(samples) = stream_bytes(stream) else {
        log::debug!("Image samples could not be decompressed");
        return None;
    };
    match samples_to_png(doc, &stream.dict, &samples) {
        Ok(Some(png)) => Some((png, "png")),
        Ok(None) => {
            log::debug!("Unsupported image layout; keeping raw samples");
            Some((samples, "bin"))
        }
        Err(e) => {
            log::warn!("Skipping image: {}", e);
            None
        }
    }
}

/// Encode raw 8-bit Gray/RGB/CMYK (or 1-bit gray) samples as PNG.
///
/// `Ok(None)` means the layout is not one of those. A declared size that
/// overflows or that the samples do not fill is `MalformedInput`, checked
/// before anything is allocated.
fn samples_to_png(doc: &LopdfDocument, dict: &Dictionary, samples: &[u8]) -> Result<Option<Vec<u8>>> {
    let (Some(width), Some(height)) = (dict_u32(dict, b"Width"), dict_u32(dict, b"Height")) else {
        return Ok(None);
    };
    let bits = dict_u32(dict, b"BitsPerComponent").unwrap_or(8);

    let components = match dict.get(b"ColorSpace").ok() {
        Some(space) => match color_components(doc, space) {
            Some(components) => components,
            None => return Ok(None),
        },
        None if dict.get(b"ImageMask").is_ok() => 1,
        None => return Ok(None),
    };
    if !matches!((components, bits), (1, 1) | (1 | 3 | 4, 8)) {
        return Ok(None);
    }

    let expected = sample_len(width, height, components, bits).ok_or_else(|| {
        Error::MalformedInput(format!("image size {}x{} overflows", width, height))
    })?;
    if samples.len() < expected {
        return Err(Error::MalformedInput(format!(
            "image declares {}x{} but carries {} of {} sample bytes",
            width,
            height,
            samples.len(),
            expected
        )));
    }
    Ok(encode_png(width, height, components, bits, &samples[..expected]))
}

/// PNG-encode a sample buffer already checked against `sample_len`.
fn encode_png(width: u32, height: u32, components: usize, bits: u32, samples: &[u8]) -> Option<Vec<u8>> {
    let (width_px, height_px) = (width as usize, height as usize);

    let image = match (components, bits) {
        (1, 8) => image::DynamicImage::ImageLuma8(image::GrayImage::from_raw(
            width,
            height,
            samples.to_vec(),
        )?),
        (1, 1) => {
            let row_bytes = width_px.div_ceil(8);
            let mut gray = Vec::with_capacity(width_px * height_px);
            for line in samples.chunks_exact(row_bytes.max(1)).take(height_px) {
                for x in 0..width_px {
                    let bit = (line[x / 8] >> (7 - (x % 8))) & 1;
                    gray.push(if bit == 1 { 255 } else { 0 });
                }
            }
            image::DynamicImage::ImageLuma8(image::GrayImage::from_raw(width, height, gray)?)
        }
        (3, 8) => image::DynamicImage::ImageRgb8(image::RgbImage::from_raw(
            width,
            height,
            samples.to_vec(),
        )?),
        (4, 8) => {
            let rgb: Vec<u8> = samples
                .chunks_exact(4)
                .flat_map(|px| {
                    let k = 255 - u16::from(px[3]);
                    [
                        ((255 - u16::from(px[0])) * k / 255) as u8,
                        ((255 - u16::from(px[1])) * k / 255) as u8,
                        ((255 - u16::from(px[2])) * k / 255) as u8,
                    ]
                })
                .collect();
            image::DynamicImage::ImageRgb8(image::RgbImage::from_raw(width, height, rgb)?)
        }
        _ => return None,
    };

    let mut png = Cursor::new(Vec::new());
    image.write_to(&mut png, image::ImageFormat::Png).ok()?;
    Some(png.into_inner())
}

/// Byte length of an uncompressed sample buffer, `None` on overflow or an
/// unsupported layout.
fn sample_len(width: u32, height: u32, components: usize, bits: u32) -> Option<usize> {
    let (width, height) = (width as usize, height as usize);
    match (components, bits) {
        (1, 1) => width.div_ceil(8).checked_mul(height),
        (1 | 3 | 4, 8) => width.checked_mul(height)?.checked_mul(components),
        _ => None,
    }
}

/// Number of color components of a device, calibrated or ICC color space.
fn color_components(doc: &LopdfDocument, space: &Object) -> Option<usize> {
    match deref(doc, space)? {
        Object::Name(name) => match name.as_slice() {
            b"DeviceGray" | b"CalGray" | b"G" => Some(1),
            b"DeviceRGB" | b"CalRGB" | b"RGB" => Some(3),
            b"DeviceCMYK" | b"CMYK" => Some(4),
            _ => None,
        },
        Object::Array(items) => match items.first().and_then(|o| o.as_name().ok())? {
            b"ICCBased" => items
                .get(1)
                .and_then(|o| deref_dict(doc, o))
                .and_then(|d| dict_u32(d, b"N"))
                .map(|n| n as usize),
            b"CalGray" => Some(1),
            b"CalRGB" => Some(3),
            _ => None,
        },
        _ => None,
    }
}

fn filter_names(dict: &Dictionary) -> Vec<Vec<u8>> {
    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![name.clone()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|o| o.as_name().ok().map(<[u8]>::to_vec))
            .collect(),
        _ => Vec::new(),
    }
}

/// Stream bytes with filters applied; unfiltered streams are returned as-is.
pub(crate) fn stream_bytes(stream: &Stream) -> Option<Vec<u8>> {
    if stream.dict.get(b"Filter").is_err() {
        return Some(stream.content.clone());
    }
    // lopdf refuses to decode streams tagged as images
    if is_image(&stream.dict) {
        let mut dict = stream.dict.clone();
        dict.remove(b"Subtype");
        return Stream::new(dict, stream.content.clone())
            .decompressed_content()
            .ok();
    }
    stream.decompressed_content().ok()
}

fn is_image(dict: &Dictionary) -> bool {
    dict.get(b"Subtype").and_then(Object::as_name).ok() == Some(&b"Image"[..])
}

fn dict_u32(dict: &Dictionary, key: &[u8]) -> Option<u32> {
    dict.get(key)
        .ok()
        .and_then(number)
        .filter(|n| *n >= 0.0)
        .map(|n| n as u32)
}

fn name_operand(op: &Operation) -> Option<&[u8]> {
    op.operands.first().and_then(|o| o.as_name().ok())
}

fn numbers(operands: &[Object]) -> Vec<f64> {
    operands.iter().filter_map(number).collect()
}

/// Extract a number from a PDF object.
pub(crate) fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

pub(crate) fn deref<'a>(doc: &'a LopdfDocument, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

pub(crate) fn deref_dict<'a>(doc: &'a LopdfDocument, obj: &'a Object) -> Option<&'a Dictionary> {
    match deref(doc, obj)? {
        Object::Dictionary(dict) => Some(dict),
        Object::Stream(stream) => Some(&stream.dict),
        _ => None,
    }
}

/// Text decoding fallback when a font has no usable encoding:
/// UTF-16BE with BOM, then UTF-8, then Latin-1.
pub(crate) fn decode_text_simple(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    bytes.iter().map(|&b| b as char).collect()
}
