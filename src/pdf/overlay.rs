/*!
 * Redaction and re-insertion of text runs.
 *
 * The original text showing operators of each run are removed from the page
 * content, the run boxes are painted white and the display text is written
 * back at the original baseline with the first font of the chain able to
 * render it. Form XObjects holding redacted text are copied for the page, so
 * other pages painting the same form keep their text.
 */

use std::collections::{HashMap, HashSet};

use log::{debug, warn};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use super::encoding::{dict_get, resolve};
use super::extract::{form_id, form_operations, inherited_attribute, page_box, page_operations, MAX_FORM_DEPTH};
use super::fonts::OverlayFont;
use super::model::{PageRuns, TextRun};
use crate::app_config::OverlayConfig;
use crate::errors::PdfError;

/// Counters for one overlay pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayStats {
    pub pages: usize,
    pub redacted: usize,
    pub inserted: usize,
    /// Runs no font of the chain could render
    pub failed: usize,
}

impl OverlayStats {
    pub fn merge(&mut self, other: OverlayStats) {
        self.pages += other.pages;
        self.redacted += other.redacted;
        self.inserted += other.inserted;
        self.failed += other.failed;
    }
}

/// Font objects already added to the document, by font name
pub type FontObjects = HashMap<&'static str, ObjectId>;

fn real(value: f32) -> Object {
    Object::Real(value as _)
}

/// Size and baseline of the inserted text in top-left page space
pub fn insertion_metrics(run: &TextRun, config: &OverlayConfig) -> (f32, f32, f32) {
    let size = (run.font_size * config.font_scale).max(config.min_font_size);
    let baseline_y = run.bbox.y0 + run.font_size * config.baseline_ratio;
    (size, run.bbox.x0, baseline_y)
}

/// Operators that remain once the recorded showing operators are removed
fn strip_text_operators(operations: Vec<Operation>, removed: &HashSet<usize>) -> Vec<Operation> {
    let mut kept = Vec::with_capacity(operations.len() + 2);
    kept.push(Operation::new("q", vec![]));

    for (index, op) in operations.into_iter().enumerate() {
        if !removed.contains(&index) {
            kept.push(op);
            continue;
        }
        // Quote operators also move to the next line and set spacing
        match op.operator.as_str() {
            "'" => kept.push(Operation::new("T*", vec![])),
            "\"" => {
                let mut operands = op.operands.into_iter();
                if let (Some(aw), Some(ac)) = (operands.next(), operands.next()) {
                    kept.push(Operation::new("Tw", vec![aw]));
                    kept.push(Operation::new("Tc", vec![ac]));
                }
                kept.push(Operation::new("T*", vec![]));
            }
            _ => {}
        }
    }

    kept.push(Operation::new("Q", vec![]));
    kept
}

/// Page resources as a direct dictionary with a direct `/Font` entry
fn page_resources(doc: &Document, page_id: ObjectId) -> Dictionary {
    let mut resources = match inherited_attribute(doc, page_id, b"Resources") {
        Some(Object::Dictionary(resources)) => resources.clone(),
        _ => Dictionary::new(),
    };
    let fonts = match dict_get(doc, &resources, b"Font") {
        Some(Object::Dictionary(fonts)) => fonts.clone(),
        _ => Dictionary::new(),
    };
    resources.set("Font", Object::Dictionary(fonts));
    resources
}

fn content_error(page_index: usize, message: impl Into<String>) -> PdfError {
    PdfError::Content { page: page_index + 1, message: message.into() }
}

/// Per-page copies of the Form XObjects whose text is redacted
struct FormRewriter<'a> {
    page_index: usize,
    // @field: operators to remove, by form
    removed: &'a HashMap<ObjectId, HashSet<usize>>,
    // @field: copy of each visited form, `None` when nothing under it changed
    copies: HashMap<ObjectId, Option<ObjectId>>,
}

impl<'a> FormRewriter<'a> {
    /// Copy of a form with the recorded operators removed from it and from its nested forms
    fn rewrite(&mut self, doc: &mut Document, form: ObjectId, depth: usize) -> Result<Option<ObjectId>, PdfError> {
        if let Some(copy) = self.copies.get(&form) {
            return Ok(*copy);
        }
        self.copies.insert(form, None);
        if depth >= MAX_FORM_DEPTH {
            return Ok(None);
        }

        let mut stream = match doc.get_object(form) {
            Ok(Object::Stream(stream)) => stream.clone(),
            _ => return Ok(None),
        };
        let mut resources = match stream.dict.get(b"Resources").map(|r| resolve(doc, r)) {
            Ok(Object::Dictionary(resources)) => Some(resources.clone()),
            _ => None,
        };

        let mut changed = false;
        if let Some(resources) = resources.as_mut() {
            changed |= self.rewrite_xobjects(doc, resources, depth + 1)?;
        }
        if let Some(removed) = self.removed.get(&form) {
            let operations = form_operations(&stream)
                .ok_or_else(|| content_error(self.page_index, "form content could not be decoded"))?;
            let content = Content { operations: strip_text_operators(operations, removed) };
            let bytes = content.encode().map_err(|e| content_error(self.page_index, e.to_string()))?;
            stream.set_plain_content(bytes);
            changed = true;
        }
        if !changed {
            return Ok(None);
        }

        if let Some(resources) = resources {
            stream.dict.set("Resources", Object::Dictionary(resources));
        }
        let copy = doc.add_object(Object::Stream(stream));
        self.copies.insert(form, Some(copy));
        Ok(Some(copy))
    }

    /// Point the `/XObject` entries of a resource dictionary at rewritten forms
    fn rewrite_xobjects(&mut self, doc: &mut Document, resources: &mut Dictionary, depth: usize) -> Result<bool, PdfError> {
        let (mut xobjects, forms) = match dict_get(doc, resources, b"XObject") {
            Some(Object::Dictionary(xobjects)) => {
                let forms: Vec<(Vec<u8>, ObjectId)> = xobjects
                    .iter()
                    .filter_map(|(name, xobject)| form_id(doc, xobject).map(|id| (name.clone(), id)))
                    .collect();
                (xobjects.clone(), forms)
            }
            _ => return Ok(false),
        };

        let mut changed = false;
        for (name, form) in forms {
            if let Some(copy) = self.rewrite(doc, form, depth)? {
                xobjects.set(name, Object::Reference(copy));
                changed = true;
            }
        }
        if changed {
            resources.set("XObject", Object::Dictionary(xobjects));
        }
        Ok(changed)
    }
}

struct PageWriter<'a> {
    config: &'a OverlayConfig,
    chain: &'a [OverlayFont],
    page_left: f32,
    page_top: f32,
    // @field: resource names registered on this page, keyed by font name
    registered: HashMap<&'static str, Vec<u8>>,
}

impl<'a> PageWriter<'a> {
    fn redaction_ops(&self, runs: &[TextRun]) -> Vec<Operation> {
        let mut ops = vec![
            Operation::new("q", vec![]),
            Operation::new("rg", vec![real(1.0), real(1.0), real(1.0)]),
        ];
        for run in runs {
            ops.push(Operation::new(
                "re",
                vec![
                    real(self.page_left + run.bbox.x0),
                    real(self.page_top - run.bbox.y1),
                    real(run.bbox.width()),
                    real(run.bbox.height()),
                ],
            ));
            ops.push(Operation::new("f", vec![]));
        }
        ops.push(Operation::new("Q", vec![]));
        ops
    }

    /// Pick the first font of the chain able to render every line
    fn choose_font(&mut self, lines: &[&str]) -> Option<(OverlayFont, Vec<u8>)> {
        let font = *self
            .chain
            .iter()
            .find(|font| lines.iter().all(|line| font.can_render(line)))?;
        let next_index = self.registered.len();
        let resource = self
            .registered
            .entry(font.name)
            .or_insert_with(|| format!("YaptF{}", next_index).into_bytes())
            .clone();
        Some((font, resource))
    }

    fn insertion_ops(&mut self, run: &TextRun) -> Option<Vec<Operation>> {
        let text = run.display_text();
        let lines: Vec<&str> = text.lines().filter(|line| !line.trim().is_empty()).collect();
        if lines.is_empty() {
            return Some(Vec::new());
        }
        let (font, resource) = self.choose_font(&lines)?;

        let (size, x, baseline_y) = insertion_metrics(run, self.config);
        let (r, g, b) = run.color.to_unit_rgb();

        let mut ops = vec![
            Operation::new("q", vec![]),
            Operation::new("rg", vec![real(r), real(g), real(b)]),
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(resource), real(size)]),
            Operation::new("TL", vec![real(size * 1.2)]),
            Operation::new(
                "Tm",
                vec![
                    real(1.0),
                    real(0.0),
                    real(0.0),
                    real(1.0),
                    real(self.page_left + x),
                    real(self.page_top - baseline_y),
                ],
            ),
        ];
        for (index, line) in lines.iter().enumerate() {
            if index > 0 {
                ops.push(Operation::new("T*", vec![]));
            }
            ops.push(Operation::new("Tj", vec![font.encode(line)?]));
        }
        ops.push(Operation::new("ET", vec![]));
        ops.push(Operation::new("Q", vec![]));
        Some(ops)
    }
}

/// Redact and rewrite the runs of one page
pub fn apply_page(
    doc: &mut Document,
    page_id: ObjectId,
    page: &PageRuns,
    chain: &[OverlayFont],
    config: &OverlayConfig,
    font_objects: &mut FontObjects,
) -> Result<OverlayStats, PdfError> {
    let mut stats = OverlayStats { pages: 1, ..Default::default() };
    if page.runs.is_empty() {
        return Ok(stats);
    }

    let operations = page_operations(doc, page_id, page.page_index)?;
    let mut removed: HashSet<usize> = HashSet::new();
    let mut form_removed: HashMap<ObjectId, HashSet<usize>> = HashMap::new();
    for op in page.runs.iter().flat_map(|run| run.source_ops.iter()) {
        match op.form {
            Some(form) => {
                form_removed.entry(form).or_default().insert(op.index);
            }
            None => {
                removed.insert(op.index);
            }
        }
    }
    let (left, _, _, top) = page_box(doc, page_id);

    let mut writer = PageWriter {
        config,
        chain,
        page_left: left,
        page_top: top,
        registered: HashMap::new(),
    };

    let mut new_ops = strip_text_operators(operations, &removed);
    new_ops.extend(writer.redaction_ops(&page.runs));
    stats.redacted = page.runs.len();

    for run in &page.runs {
        match writer.insertion_ops(run) {
            Some(ops) => {
                new_ops.extend(ops);
                stats.inserted += 1;
            }
            None => {
                warn!(
                    "Page {}: no font can render '{}', left blank",
                    page.page_index + 1,
                    run.display_text()
                );
                stats.failed += 1;
            }
        }
    }

    let mut resources = page_resources(doc, page_id);
    if !form_removed.is_empty() {
        let mut forms = FormRewriter {
            page_index: page.page_index,
            removed: &form_removed,
            copies: HashMap::new(),
        };
        forms.rewrite_xobjects(doc, &mut resources, 0)?;
    }
    if let Ok(Object::Dictionary(fonts)) = resources.get_mut(b"Font") {
        for (name, resource) in &writer.registered {
            let Some(font) = chain.iter().find(|font| font.name == *name) else {
                continue;
            };
            let font_id = *font_objects
                .entry(font.name)
                .or_insert_with(|| font.add_to_document(doc));
            fonts.set(resource.clone(), Object::Reference(font_id));
        }
    }

    let content = Content { operations: new_ops };
    let bytes = content.encode().map_err(|e| content_error(page.page_index, e.to_string()))?;
    let stream_id = doc.add_object(Stream::new(dictionary! {}, bytes));

    match doc.get_object_mut(page_id) {
        Ok(Object::Dictionary(dict)) => {
            dict.set("Contents", Object::Reference(stream_id));
            dict.set("Resources", Object::Dictionary(resources));
        }
        _ => return Err(content_error(page.page_index, "page object is not a dictionary")),
    }

    debug!(
        "Page {}: redacted {}, inserted {}, failed {}",
        page.page_index + 1,
        stats.redacted,
        stats.inserted,
        stats.failed
    );
    Ok(stats)
}
