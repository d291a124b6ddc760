//! Structured error types for the Folio engine.
//!
//! Every failure aborts the render: there is no partial-document fallback.
//! Warnings (color clamping, lenient glyph substitution) go through `log`
//! and never surface here.

use thiserror::Error;

use crate::model::NodeKind;
use crate::style::FontStyle;

/// The unified error type returned by all public Folio API functions.
#[derive(Debug, Error)]
pub enum FolioError {
    /// The node tree is malformed (bad nesting, bad flex weight, bad size).
    #[error("Invalid document: {0}")]
    Validation(String),

    /// A node needed a dimension from its parent that was not supplied.
    #[error("{node} must be placed inside a parent that defines its {dimension}")]
    Constraint {
        node: NodeKind,
        dimension: &'static str,
    },

    /// No metrics are loaded for the requested font.
    #[error("No font metrics loaded for {family} ({style})")]
    MetricsNotFound { family: String, style: FontStyle },

    /// The font is known but has no advance width for a character.
    #[error("Font {family} ({style}) has no metrics for {ch:?}")]
    GlyphNotFound {
        family: String,
        style: FontStyle,
        ch: char,
    },

    /// The image source decoded to an empty payload.
    #[error("Image data is empty")]
    MissingImageData,

    /// The image bytes are not in one of the supported encodings.
    #[error("Unsupported image format: {0}")]
    UnsupportedImage(String),

    /// The image bytes looked supported but failed to decode.
    #[error("Image decode error: {0}")]
    ImageDecode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A font program or metrics file could not be parsed.
    #[error("Font error: {0}")]
    FontParse(String),

    /// Dispatch found no renderer for a node kind.
    #[error("No renderer registered for {0}")]
    NoRenderer(NodeKind),

    /// A second renderer was registered for a node kind; the first one stays.
    #[error("A renderer for {0} is already registered")]
    RendererAlreadyRegistered(NodeKind),

    /// An object number that was never allocated.
    #[error("Object {0} does not exist")]
    UnknownObject(usize),

    /// The trailer was requested before a catalog object was created.
    #[error("The catalog object has not been created")]
    MissingCatalog,

    /// JSON input failed to parse as a valid Folio document.
    #[error("Failed to parse document: {source}{hint}")]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },
}

impl From<serde_json::Error> for FolioError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "\n  Hint: check for trailing commas, missing quotes, or unescaped characters."
            }
            serde_json::error::Category::Data => {
                "\n  Hint: the JSON is valid but doesn't match the document schema. Check node types and field names."
            }
            serde_json::error::Category::Eof => "\n  Hint: unexpected end of input. Is the JSON truncated?",
            serde_json::error::Category::Io => "",
        };
        FolioError::Parse {
            source: e,
            hint: hint.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FolioError>;
