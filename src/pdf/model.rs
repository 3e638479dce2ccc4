/*!
 * Text run data model.
 *
 * A text run is created while scanning a page, receives its translation once,
 * and is consumed when the page is rewritten.
 */

use lopdf::ObjectId;
use serde::{Deserialize, Serialize};

/// Axis aligned box in page space, origin at the top-left corner of the page
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BoundingBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Smallest box containing both boxes
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }
}

/// Packed `0xRRGGBB` fill colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RgbColor(pub u32);

impl RgbColor {
    pub const BLACK: RgbColor = RgbColor(0);

    /// Pack unit range components, clamping out of range values
    pub fn from_unit_rgb(r: f32, g: f32, b: f32) -> Self {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u32;
        RgbColor((channel(r) << 16) | (channel(g) << 8) | channel(b))
    }

    /// Components in `[0, 1]`
    pub fn to_unit_rgb(&self) -> (f32, f32, f32) {
        if self.0 == 0 {
            return (0.0, 0.0, 0.0);
        }
        let r = ((self.0 >> 16) & 0xFF) as f32 / 255.0;
        let g = ((self.0 >> 8) & 0xFF) as f32 / 255.0;
        let b = (self.0 & 0xFF) as f32 / 255.0;
        (r, g, b)
    }
}

/// Position of a text showing operator in its decoded content stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceOp {
    /// Form XObject holding the operator, `None` for the page content
    pub form: Option<ObjectId>,
    pub index: usize,
}

impl SourceOp {
    pub fn page(index: usize) -> Self {
        Self { form: None, index }
    }
}

/// A contiguous span of text at a fixed position, size and colour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    /// 0-based page index
    pub page_index: usize,
    /// Position on the page
    pub bbox: BoundingBox,
    /// Text as extracted
    pub text: String,
    /// Effective font size in points
    pub font_size: f32,
    /// Fill colour
    pub color: RgbColor,
    /// Translation, attached once after extraction
    pub translated: Option<String>,
    /// Content stream operators that painted this run
    #[serde(skip)]
    pub source_ops: Vec<SourceOp>,
}

impl TextRun {
    /// Text to insert when the page is rewritten
    pub fn display_text(&self) -> &str {
        self.translated.as_deref().unwrap_or(&self.text)
    }

    /// Whether the translation differs from the original text
    pub fn is_translated(&self) -> bool {
        self.translated.as_deref().is_some_and(|t| t != self.text)
    }
}

/// Runs found on a single page, in content order
#[derive(Debug, Clone, Default)]
pub struct PageRuns {
    pub page_index: usize,
    pub runs: Vec<TextRun>,
}
