/*!
 * Text run extraction from page content streams.
 *
 * Interprets the graphics, text state and text showing operators of a page
 * to recover each shown string with its position, effective size and fill
 * colour. Form XObjects painted with `Do` are interpreted in place, with
 * their own matrix and resources. Spans on the same baseline sharing font,
 * size and colour are merged into one run.
 */

use std::collections::HashMap;

use log::{debug, trace};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use super::encoding::{dict_get, number, resolve, FontInfo};
use super::model::{BoundingBox, RgbColor, SourceOp, TextRun};
use crate::errors::PdfError;

/// Form XObjects nest at most this deep
pub const MAX_FORM_DEPTH: usize = 8;

/// Horizontal gap, in ems, read as a word break
const WORD_GAP_EM: f32 = 0.15;

/// Affine matrix `[a b c d e f]` in PDF row-vector convention
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix([f32; 6]);

impl Matrix {
    pub const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    pub fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Matrix([a, b, c, d, e, f])
    }

    pub fn translate(tx: f32, ty: f32) -> Self {
        Matrix([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    /// `self × other`: apply `self` first, then `other`
    pub fn then(&self, other: &Matrix) -> Matrix {
        let [a1, b1, c1, d1, e1, f1] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Matrix([
            a1 * a2 + b1 * c2,
            a1 * b2 + b1 * d2,
            c1 * a2 + d1 * c2,
            c1 * b2 + d1 * d2,
            e1 * a2 + f1 * c2 + e2,
            e1 * b2 + f1 * d2 + f2,
        ])
    }

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        let [a, b, c, d, e, f] = self.0;
        (x * a + y * c + e, x * b + y * d + f)
    }

    /// Length of the transformed unit vertical axis
    pub fn vertical_scale(&self) -> f32 {
        let [_, _, c, d, _, _] = self.0;
        (c * c + d * d).sqrt()
    }
}

/// Page MediaBox as `(x0, y0, x1, y1)` in default user space
pub fn page_box(doc: &Document, page_id: ObjectId) -> (f32, f32, f32, f32) {
    let values: Option<Vec<f32>> = match inherited_attribute(doc, page_id, b"MediaBox") {
        Some(Object::Array(items)) if items.len() == 4 => {
            items.iter().map(|v| number(resolve(doc, v))).collect()
        }
        _ => None,
    };
    match values.as_deref() {
        Some(&[x0, y0, x1, y1]) => (x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1)),
        _ => (0.0, 0.0, 612.0, 792.0),
    }
}

/// Look up a page attribute, following the `/Parent` chain for inherited keys
pub fn inherited_attribute<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    for _ in 0..32 {
        if let Some(value) = dict_get(doc, current, key) {
            return Some(value);
        }
        current = match dict_get(doc, current, b"Parent") {
            Some(Object::Dictionary(parent)) => parent,
            _ => return None,
        };
    }
    None
}

/// Resource dictionary of a page, inherited from the page tree when absent
pub fn page_resources<'a>(doc: &'a Document, page_id: ObjectId) -> Option<&'a Dictionary> {
    match inherited_attribute(doc, page_id, b"Resources") {
        Some(Object::Dictionary(resources)) => Some(resources),
        _ => None,
    }
}

fn is_form(stream: &Stream) -> bool {
    matches!(stream.dict.get(b"Subtype"), Ok(Object::Name(name)) if name == b"Form")
}

/// Form XObject object id behind an `/XObject` resource entry
pub fn form_id(doc: &Document, xobject: &Object) -> Option<ObjectId> {
    let id = xobject.as_reference().ok()?;
    match doc.get_object(id) {
        Ok(Object::Stream(stream)) if is_form(stream) => Some(id),
        _ => None,
    }
}

/// Form XObject named in a resource dictionary
fn named_form<'a>(doc: &'a Document, resources: Option<&'a Dictionary>, name: &[u8]) -> Option<(ObjectId, &'a Stream)> {
    let Some(Object::Dictionary(xobjects)) = dict_get(doc, resources?, b"XObject") else {
        return None;
    };
    let id = form_id(doc, xobjects.get(name).ok()?)?;
    match doc.get_object(id) {
        Ok(Object::Stream(stream)) => Some((id, stream)),
        _ => None,
    }
}

/// Decoded operators of a Form XObject
pub fn form_operations(stream: &Stream) -> Option<Vec<Operation>> {
    let bytes = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());
    Content::decode(&bytes).ok().map(|content| content.operations)
}

/// Decoded operators of a page, in stream order
pub fn page_operations(doc: &Document, page_id: ObjectId, page_index: usize) -> Result<Vec<Operation>, PdfError> {
    let bytes = doc.get_page_content(page_id).map_err(|e| PdfError::Content {
        page: page_index + 1,
        message: e.to_string(),
    })?;
    let content = Content::decode(&bytes).map_err(|e| PdfError::Content {
        page: page_index + 1,
        message: e.to_string(),
    })?;
    Ok(content.operations)
}

fn operand_numbers(op: &Operation) -> Vec<f32> {
    op.operands.iter().filter_map(number).collect()
}

fn cmyk_to_rgb(c: f32, m: f32, y: f32, k: f32) -> RgbColor {
    RgbColor::from_unit_rgb((1.0 - c) * (1.0 - k), (1.0 - m) * (1.0 - k), (1.0 - y) * (1.0 - k))
}

fn color_from_components(values: &[f32]) -> Option<RgbColor> {
    match values {
        [g] => Some(RgbColor::from_unit_rgb(*g, *g, *g)),
        [r, g, b] => Some(RgbColor::from_unit_rgb(*r, *g, *b)),
        [c, m, y, k] => Some(cmyk_to_rgb(*c, *m, *y, *k)),
        _ => None,
    }
}

#[derive(Debug, Clone)]
struct TextState {
    font: Option<Vec<u8>>,
    size: f32,
    char_spacing: f32,
    word_spacing: f32,
    h_scale: f32,
    leading: f32,
    rise: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: None,
            size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            h_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    fill: RgbColor,
    text: TextState,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self { ctm: Matrix::IDENTITY, fill: RgbColor::BLACK, text: TextState::default() }
    }
}

/// One string painted by a single showing operator
#[derive(Debug, Clone)]
struct Span {
    text: String,
    bbox: BoundingBox,
    size: f32,
    color: RgbColor,
    font: Vec<u8>,
    baseline: f32,
    start_x: f32,
    end_x: f32,
    op: SourceOp,
}

/// Content stream interpreter for one page
struct PageScanner<'a> {
    doc: &'a Document,
    // @field: resources of the stream being interpreted
    resources: Option<&'a Dictionary>,
    // @field: decoded fonts keyed by owning form and resource name
    fonts: HashMap<(Option<ObjectId>, Vec<u8>), FontInfo>,
    // @field: forms being painted, innermost last
    forms: Vec<ObjectId>,
    page_left: f32,
    page_top: f32,
    state: GraphicsState,
    stack: Vec<GraphicsState>,
    tm: Matrix,
    tlm: Matrix,
    spans: Vec<Span>,
}

impl<'a> PageScanner<'a> {
    fn new(doc: &'a Document, page_id: ObjectId) -> Self {
        let (left, _, _, top) = page_box(doc, page_id);

        Self {
            doc,
            resources: page_resources(doc, page_id),
            fonts: HashMap::new(),
            forms: Vec::new(),
            page_left: left,
            page_top: top,
            state: GraphicsState::default(),
            stack: Vec::new(),
            tm: Matrix::IDENTITY,
            tlm: Matrix::IDENTITY,
            spans: Vec::new(),
        }
    }

    fn current_form(&self) -> Option<ObjectId> {
        self.forms.last().copied()
    }

    fn font_info(&mut self, name: &[u8]) -> FontInfo {
        let key = (self.current_form(), name.to_vec());
        if let Some(info) = self.fonts.get(&key) {
            return info.clone();
        }
        let font = match self.resources.map(|resources| dict_get(self.doc, resources, b"Font")) {
            Some(Some(Object::Dictionary(fonts))) => dict_get(self.doc, fonts, name),
            _ => None,
        };
        let info = match font {
            Some(Object::Dictionary(font)) => FontInfo::from_dictionary(self.doc, font),
            _ => {
                debug!("Font /{} not found in resources, using defaults", String::from_utf8_lossy(name));
                FontInfo::default()
            }
        };
        self.fonts.insert(key, info.clone());
        info
    }

    /// Interpret a Form XObject with its matrix and resources, then restore the state
    fn paint_form(&mut self, name: &[u8]) {
        let Some((form_id, stream)) = named_form(self.doc, self.resources, name) else {
            return;
        };
        if self.forms.contains(&form_id) || self.forms.len() >= MAX_FORM_DEPTH {
            debug!("Skipping form /{}: nested too deep", String::from_utf8_lossy(name));
            return;
        }
        let Some(operations) = form_operations(stream) else {
            debug!("Skipping form /{}: content could not be decoded", String::from_utf8_lossy(name));
            return;
        };

        let matrix = match dict_get(self.doc, &stream.dict, b"Matrix") {
            Some(Object::Array(items)) => {
                let values: Vec<f32> = items.iter().filter_map(|v| number(resolve(self.doc, v))).collect();
                match values[..] {
                    [a, b, c, d, e, f] => Matrix::new(a, b, c, d, e, f),
                    _ => Matrix::IDENTITY,
                }
            }
            _ => Matrix::IDENTITY,
        };
        let form_resources = match dict_get(self.doc, &stream.dict, b"Resources") {
            Some(Object::Dictionary(resources)) => Some(resources),
            _ => self.resources,
        };

        let saved_state = self.state.clone();
        let saved_stack = std::mem::take(&mut self.stack);
        let saved_resources = std::mem::replace(&mut self.resources, form_resources);
        let (tm, tlm) = (self.tm, self.tlm);

        self.state.ctm = matrix.then(&self.state.ctm);
        self.forms.push(form_id);
        self.run(&operations);
        self.forms.pop();

        self.state = saved_state;
        self.stack = saved_stack;
        self.resources = saved_resources;
        self.tm = tm;
        self.tlm = tlm;
    }

    fn next_line(&mut self, tx: f32, ty: f32) {
        self.tlm = Matrix::translate(tx, ty).then(&self.tlm);
        self.tm = self.tlm;
    }

    fn run(&mut self, operations: &[Operation]) {
        for (index, op) in operations.iter().enumerate() {
            let nums = operand_numbers(op);
            match op.operator.as_str() {
                "q" => self.stack.push(self.state.clone()),
                "Q" => {
                    if let Some(state) = self.stack.pop() {
                        self.state = state;
                    }
                }
                "cm" => {
                    if let [a, b, c, d, e, f] = nums[..] {
                        self.state.ctm = Matrix::new(a, b, c, d, e, f).then(&self.state.ctm);
                    }
                }
                "BT" => {
                    self.tm = Matrix::IDENTITY;
                    self.tlm = Matrix::IDENTITY;
                }
                "Tf" => {
                    if let Some(Object::Name(name)) = op.operands.first() {
                        self.state.text.font = Some(name.clone());
                    }
                    if let Some(size) = op.operands.get(1).and_then(number) {
                        self.state.text.size = size;
                    }
                }
                "Tc" => self.state.text.char_spacing = nums.first().copied().unwrap_or(0.0),
                "Tw" => self.state.text.word_spacing = nums.first().copied().unwrap_or(0.0),
                "Tz" => self.state.text.h_scale = nums.first().copied().unwrap_or(100.0) / 100.0,
                "TL" => self.state.text.leading = nums.first().copied().unwrap_or(0.0),
                "Ts" => self.state.text.rise = nums.first().copied().unwrap_or(0.0),
                "Td" => {
                    if let [tx, ty] = nums[..] {
                        self.next_line(tx, ty);
                    }
                }
                "TD" => {
                    if let [tx, ty] = nums[..] {
                        self.state.text.leading = -ty;
                        self.next_line(tx, ty);
                    }
                }
                "Tm" => {
                    if let [a, b, c, d, e, f] = nums[..] {
                        self.tlm = Matrix::new(a, b, c, d, e, f);
                        self.tm = self.tlm;
                    }
                }
                "T*" => {
                    let leading = self.state.text.leading;
                    self.next_line(0.0, -leading);
                }
                "Tj" => {
                    if let Some(string @ Object::String(..)) = op.operands.first() {
                        self.show(std::slice::from_ref(string), index);
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = op.operands.first() {
                        self.show(items, index);
                    }
                }
                "'" => {
                    let leading = self.state.text.leading;
                    self.next_line(0.0, -leading);
                    if let Some(string @ Object::String(..)) = op.operands.first() {
                        self.show(std::slice::from_ref(string), index);
                    }
                }
                "\"" => {
                    if let [aw, ac, ..] = nums[..] {
                        self.state.text.word_spacing = aw;
                        self.state.text.char_spacing = ac;
                    }
                    let leading = self.state.text.leading;
                    self.next_line(0.0, -leading);
                    if let Some(string @ Object::String(..)) = op.operands.get(2) {
                        self.show(std::slice::from_ref(string), index);
                    }
                }
                "g" | "rg" | "k" | "sc" | "scn" => {
                    if let Some(color) = color_from_components(&nums) {
                        self.state.fill = color;
                    }
                }
                "cs" => self.state.fill = RgbColor::BLACK,
                "Do" => {
                    if let Some(Object::Name(name)) = op.operands.first() {
                        self.paint_form(name);
                    }
                }
                _ => {}
            }
        }
    }

    /// Advance through the elements of a showing operator and record a span
    fn show(&mut self, items: &[Object], op_index: usize) {
        let Some(font_name) = self.state.text.font.clone() else {
            trace!("Text shown without a font at operator {}", op_index);
            return;
        };
        let font = self.font_info(&font_name);
        let text_state = self.state.text.clone();
        let start_tm = self.tm;

        let mut text = String::new();
        let mut advance = 0.0f32;
        // a kerning gap wide enough to separate words
        let mut word_gap = false;
        for item in items {
            match item {
                Object::String(bytes, _) => {
                    for glyph in font.decode(bytes) {
                        let mut width = glyph.width / 1000.0 * text_state.size + text_state.char_spacing;
                        if glyph.is_word_space {
                            width += text_state.word_spacing;
                        }
                        advance += width * text_state.h_scale;
                        if glyph.text.is_empty() {
                            continue;
                        }
                        if word_gap
                            && !text.is_empty()
                            && !text.ends_with(char::is_whitespace)
                            && !glyph.text.starts_with(char::is_whitespace)
                        {
                            text.push(' ');
                        }
                        word_gap = false;
                        text.push_str(&glyph.text);
                    }
                }
                other => {
                    if let Some(adjust) = number(other) {
                        advance -= adjust / 1000.0 * text_state.size * text_state.h_scale;
                        if -adjust / 1000.0 > WORD_GAP_EM {
                            word_gap = true;
                        }
                    }
                }
            }
        }
        self.tm = Matrix::translate(advance, 0.0).then(&start_tm);

        if text.is_empty() {
            return;
        }

        let to_user = start_tm.then(&self.state.ctm);
        let size = text_state.size * to_user.vertical_scale();
        let bottom = font.descent * text_state.size + text_state.rise;
        let top = font.ascent * text_state.size + text_state.rise;
        let corners = [
            to_user.apply(0.0, bottom),
            to_user.apply(advance, bottom),
            to_user.apply(0.0, top),
            to_user.apply(advance, top),
        ];
        let min_x = corners.iter().map(|c| c.0).fold(f32::INFINITY, f32::min);
        let max_x = corners.iter().map(|c| c.0).fold(f32::NEG_INFINITY, f32::max);
        let min_y = corners.iter().map(|c| c.1).fold(f32::INFINITY, f32::min);
        let max_y = corners.iter().map(|c| c.1).fold(f32::NEG_INFINITY, f32::max);

        let (origin_x, origin_y) = to_user.apply(0.0, text_state.rise);
        let (end_x, _) = to_user.apply(advance, text_state.rise);

        self.spans.push(Span {
            text,
            bbox: BoundingBox::new(
                min_x - self.page_left,
                self.page_top - max_y,
                max_x - self.page_left,
                self.page_top - min_y,
            ),
            size,
            color: self.state.fill,
            font: font_name,
            baseline: self.page_top - origin_y,
            start_x: origin_x - self.page_left,
            end_x: end_x - self.page_left,
            op: SourceOp { form: self.current_form(), index: op_index },
        });
    }
}

fn continues(run: &Span, next: &Span) -> bool {
    let tolerance = run.size.max(1.0);
    run.font == next.font
        && (run.size - next.size).abs() < 0.01
        && run.color == next.color
        && (run.baseline - next.baseline).abs() < tolerance * 0.2
        && next.start_x >= run.end_x - tolerance * 0.5
        && next.start_x - run.end_x < tolerance
}

/// Merge adjacent spans into runs
fn merge_spans(spans: Vec<Span>, page_index: usize) -> Vec<TextRun> {
    let mut runs: Vec<(Span, Vec<SourceOp>)> = Vec::new();

    for span in spans {
        if let Some((current, ops)) = runs.last_mut() {
            if continues(current, &span) {
                let gap = span.start_x - current.end_x;
                let needs_space = gap > current.size * WORD_GAP_EM
                    && !current.text.ends_with(char::is_whitespace)
                    && !span.text.starts_with(char::is_whitespace);
                if needs_space {
                    current.text.push(' ');
                }
                current.text.push_str(&span.text);
                current.bbox = current.bbox.union(&span.bbox);
                current.end_x = span.end_x;
                ops.push(span.op);
                continue;
            }
        }
        let op = span.op;
        runs.push((span, vec![op]));
    }

    runs.into_iter()
        .map(|(span, source_ops)| TextRun {
            page_index,
            bbox: span.bbox,
            text: span.text,
            font_size: span.size,
            color: span.color,
            translated: None,
            source_ops,
        })
        .collect()
}

/// Collect the text runs of one page
///
/// Runs whose trimmed text has fewer than `min_text_chars` characters are dropped.
pub fn extract_page_runs(
    doc: &Document,
    page_id: ObjectId,
    page_index: usize,
    min_text_chars: usize,
) -> Result<Vec<TextRun>, PdfError> {
    let operations = page_operations(doc, page_id, page_index)?;
    let mut scanner = PageScanner::new(doc, page_id);
    scanner.run(&operations);

    let runs: Vec<TextRun> = merge_spans(scanner.spans, page_index)
        .into_iter()
        .filter(|run| run.text.trim().chars().count() >= min_text_chars.max(1))
        .collect();

    debug!("Page {}: {} text runs from {} operators", page_index + 1, runs.len(), operations.len());
    Ok(runs)
}
