//! # Folio
//!
//! A programmatic PDF generation engine.
//!
//! A document is a tree of nodes: pages holding containers, padding,
//! flexible children, text, images, lines and rectangles. Rendering runs
//! the tree through four stages, and any failure aborts the whole render.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON/API)
//!       ↓
//!   [validate]  structural checks on the tree
//!       ↓
//!   [layout]    absolute boxes, flex distribution, text heights
//!       ↓
//!   [render]    per-kind renderers emit content-stream operators
//!       ↓
//!   [pdf]       object numbering, fonts, images, xref, trailer
//! ```
//!
//! Text measurement ([`text`]) and font metrics ([`font`]) are shared by
//! layout and rendering, so wrapped lines are identical in both.

pub mod error;
pub mod font;
pub mod image_loader;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod render;
pub mod style;
pub mod text;
pub mod validate;

pub use error::{FolioError, Result};
pub use model::Document;
pub use render::{Renderer, RendererRegistry};

use font::FontBook;

/// Render a document to PDF bytes using the standard fonts.
///
/// This is the primary entry point. Takes a document tree and returns
/// the raw bytes of a PDF file.
pub fn render(document: &Document) -> Result<Vec<u8>> {
    render::render(document)
}

/// Render with a caller-supplied font book (AFM or TrueType faces loaded
/// on top of, or instead of, the standard fonts).
pub fn render_with_fonts(document: &Document, fonts: FontBook) -> Result<Vec<u8>> {
    Renderer::new().with_fonts(fonts).render(document)
}

/// Render a document described as JSON to PDF bytes.
pub fn render_json(json: &str) -> Result<Vec<u8>> {
    let document: Document = serde_json::from_str(json)?;
    render(&document)
}
