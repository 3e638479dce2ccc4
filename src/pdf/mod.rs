/*!
 * PDF handling: text run extraction, overlay fonts and page rewriting.
 */

pub mod document;
pub mod encoding;
pub mod extract;
pub mod fonts;
pub mod model;
pub mod overlay;

pub use document::PdfDocument;
pub use fonts::{resolve_font_chain, OverlayFont};
pub use model::{BoundingBox, PageRuns, RgbColor, SourceOp, TextRun};
pub use overlay::OverlayStats;
