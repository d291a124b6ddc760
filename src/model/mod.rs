//! # Document Model
//!
//! The input representation: a tree of typed layout nodes. A document owns
//! its pages, a page owns its content nodes, and every container owns its
//! children exclusively. There is no sharing and no cycles.
//!
//! The tree is pure input. Layout never writes geometry back into it, so
//! the same document can be rendered any number of times.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::style::{BoxFit, Color, Edges, FontStyle, TextAlign};

/// Discriminant of [`Node`], used for dispatch and error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Text,
    Container,
    SizedContainer,
    Padding,
    Expanded,
    Image,
    Line,
    Rectangle,
    Page,
    Document,
}

impl NodeKind {
    pub const ALL: [NodeKind; 10] = [
        NodeKind::Text,
        NodeKind::Container,
        NodeKind::SizedContainer,
        NodeKind::Padding,
        NodeKind::Expanded,
        NodeKind::Image,
        NodeKind::Line,
        NodeKind::Rectangle,
        NodeKind::Page,
        NodeKind::Document,
    ];
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A layout node. JSON uses an internal `"type"` tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Node {
    Text(TextNode),
    Container(Container),
    SizedContainer(SizedContainer),
    Padding(Padding),
    Expanded(Expanded),
    Image(ImageNode),
    Line(LineNode),
    Rectangle(Rectangle),
    Page(Page),
    Document(Document),
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Text(_) => NodeKind::Text,
            Node::Container(_) => NodeKind::Container,
            Node::SizedContainer(_) => NodeKind::SizedContainer,
            Node::Padding(_) => NodeKind::Padding,
            Node::Expanded(_) => NodeKind::Expanded,
            Node::Image(_) => NodeKind::Image,
            Node::Line(_) => NodeKind::Line,
            Node::Rectangle(_) => NodeKind::Rectangle,
            Node::Page(_) => NodeKind::Page,
            Node::Document(_) => NodeKind::Document,
        }
    }

    /// The node's children in declaration order.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Container(c) => &c.children,
            Node::SizedContainer(c) => &c.children,
            Node::Rectangle(r) => &r.children,
            Node::Page(p) => &p.children,
            Node::Document(d) => &d.children,
            Node::Padding(p) => std::slice::from_ref(p.child.as_ref()),
            Node::Expanded(e) => std::slice::from_ref(e.child.as_ref()),
            Node::Text(_) | Node::Image(_) | Node::Line(_) => &[],
        }
    }

    /// Flex weight, if this is a flexible node.
    pub fn flex(&self) -> Option<f64> {
        match self {
            Node::Expanded(e) => Some(e.flex),
            _ => None,
        }
    }
}

macro_rules! impl_into_node {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for Node {
            fn from(n: $ty) -> Self {
                Node::$variant(n)
            }
        })*
    };
}

impl_into_node! {
    TextNode => Text,
    Container => Container,
    SizedContainer => SizedContainer,
    Padding => Padding,
    Expanded => Expanded,
    ImageNode => Image,
    LineNode => Line,
    Rectangle => Rectangle,
    Page => Page,
    Document => Document,
}

// ── Root ────────────────────────────────────────────────────────────

/// A complete document ready for rendering. Its children must be pages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub children: Vec<Node>,

    #[serde(default)]
    pub metadata: Metadata,

    #[serde(default)]
    pub options: RenderOptions,
}

impl Document {
    pub fn new(pages: Vec<Page>) -> Self {
        Self {
            children: pages.into_iter().map(Node::Page).collect(),
            ..Default::default()
        }
    }
}

/// Document metadata embedded in the `/Info` dictionary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
}

impl Metadata {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none() && self.subject.is_none() && self.creator.is_none()
    }
}

/// Render-wide switches.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderOptions {
    pub glyph_policy: GlyphPolicy,
}

/// What to do with a character the font has no advance width for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlyphPolicy {
    /// Fail the render with `GlyphNotFound`.
    #[default]
    Strict,
    /// Use the font's default advance width and log a warning.
    Fallback,
}

// ── Pages ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub config: PageConfig,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Page {
    pub fn new(children: Vec<Node>) -> Self {
        Self {
            config: PageConfig::default(),
            children,
        }
    }

    pub fn with_config(mut self, config: PageConfig) -> Self {
        self.config = config;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PageConfig {
    #[serde(default)]
    pub size: PageSize,
    #[serde(default)]
    pub orientation: Orientation,
}

impl PageConfig {
    /// Width and height in points, orientation applied.
    pub fn dimensions(&self) -> (f64, f64) {
        let (w, h) = self.size.dimensions();
        match self.orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }
}

/// Standard page sizes in points, portrait.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSize {
    A3,
    #[default]
    A4,
    A5,
    Letter,
    Legal,
    Custom { width: f64, height: f64 },
}

impl PageSize {
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A3 => (841.89, 1190.55),
            PageSize::A4 => (595.28, 841.89),
            PageSize::A5 => (419.53, 595.28),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

// ── Content nodes ───────────────────────────────────────────────────

/// A run of text sharing one font, size, and color. Unset fields inherit
/// from the enclosing [`TextNode`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRun {
    pub content: String,
    #[serde(default)]
    pub font_family: Option<String>,
    #[serde(default)]
    pub font_size: Option<f64>,
    #[serde(default)]
    pub font_style: Option<FontStyle>,
    #[serde(default)]
    pub color: Option<Color>,
}

impl TextRun {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn size(mut self, size: f64) -> Self {
        self.font_size = Some(size);
        self
    }

    pub fn style(mut self, style: FontStyle) -> Self {
        self.font_style = Some(style);
        self
    }

    pub fn family(mut self, family: impl Into<String>) -> Self {
        self.font_family = Some(family.into());
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }
}

/// Either a plain string or an ordered list of styled runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextContent {
    Plain(String),
    Runs(Vec<TextRun>),
}

impl Default for TextContent {
    fn default() -> Self {
        TextContent::Plain(String::new())
    }
}

impl From<&str> for TextContent {
    fn from(s: &str) -> Self {
        TextContent::Plain(s.to_string())
    }
}

impl From<String> for TextContent {
    fn from(s: String) -> Self {
        TextContent::Plain(s)
    }
}

impl From<Vec<TextRun>> for TextContent {
    fn from(runs: Vec<TextRun>) -> Self {
        TextContent::Runs(runs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextNode {
    pub content: TextContent,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default)]
    pub font_style: FontStyle,
    #[serde(default)]
    pub color: Color,
    #[serde(default)]
    pub align: TextAlign,
}

fn default_font_size() -> f64 {
    12.0
}

fn default_font_family() -> String {
    "Helvetica".to_string()
}

impl Default for TextNode {
    fn default() -> Self {
        Self {
            content: TextContent::default(),
            font_size: default_font_size(),
            font_family: default_font_family(),
            font_style: FontStyle::Normal,
            color: Color::BLACK,
            align: TextAlign::Left,
        }
    }
}

impl TextNode {
    pub fn new(content: impl Into<TextContent>, font_size: f64) -> Self {
        Self {
            content: content.into(),
            font_size,
            ..Default::default()
        }
    }

    pub fn align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }

    pub fn style(mut self, style: FontStyle) -> Self {
        self.font_style = style;
        self
    }

    pub fn family(mut self, family: impl Into<String>) -> Self {
        self.font_family = family.into();
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

/// A positioned box. Offsets are relative to the parent origin; size is
/// taken from the parent when supplied, else from here, else (height only)
/// from the content.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Container {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Container {
    pub fn new(children: Vec<Node>) -> Self {
        Self {
            children,
            ..Default::default()
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}

/// A box with an explicit, fixed size. Children are overlaid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SizedContainer {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Padding {
    pub margin: Edges,
    pub child: Box<Node>,
}

impl Padding {
    pub fn new(margin: Edges, child: impl Into<Node>) -> Self {
        Self {
            margin,
            child: Box::new(child.into()),
        }
    }
}

/// A flexible node: takes a `flex`-weighted share of the height left over
/// by its fixed siblings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expanded {
    #[serde(default = "default_flex")]
    pub flex: f64,
    pub child: Box<Node>,
}

fn default_flex() -> f64 {
    1.0
}

impl Expanded {
    pub fn new(flex: f64, child: impl Into<Node>) -> Self {
        Self {
            flex,
            child: Box::new(child.into()),
        }
    }
}

/// Where the image bytes come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImageSource {
    /// A file path, a `data:image/...;base64,` URI, or raw base64.
    Src(String),
    /// Raw encoded bytes (JPEG or PNG).
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageNode {
    pub source: ImageSource,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub fit: BoxFit,
}

impl ImageNode {
    pub fn new(source: ImageSource) -> Self {
        Self {
            source,
            width: None,
            height: None,
            fit: BoxFit::Fill,
        }
    }

    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn fit(mut self, fit: BoxFit) -> Self {
        self.fit = fit;
        self
    }
}

/// A straight line. `x`/`y` offset the start from the parent origin,
/// `x_end` is measured back from the parent's right edge, and `y_end`
/// down from the parent's top edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineNode {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub x_end: f64,
    #[serde(default)]
    pub y_end: f64,
    #[serde(default)]
    pub color: Color,
    #[serde(default = "default_stroke")]
    pub stroke_width: f64,
}

fn default_stroke() -> f64 {
    1.0
}

impl Default for LineNode {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            x_end: 0.0,
            y_end: 0.0,
            color: Color::BLACK,
            stroke_width: default_stroke(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rectangle {
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub color: Color,
    #[serde(default)]
    pub background_color: Option<Color>,
    #[serde(default = "default_stroke")]
    pub border_width: f64,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Default for Rectangle {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            color: Color::BLACK,
            background_color: None,
            border_width: default_stroke(),
            children: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_dimensions_orientation() {
        let portrait = PageConfig::default();
        assert_eq!(portrait.dimensions(), (595.28, 841.89));
        let landscape = PageConfig {
            size: PageSize::A4,
            orientation: Orientation::Landscape,
        };
        assert_eq!(landscape.dimensions(), (841.89, 595.28));
    }

    #[test]
    fn test_deserialize_tagged_nodes() {
        let json = r#"{
            "children": [
                { "type": "Page", "children": [
                    { "type": "Text", "content": "Hello", "fontSize": 14 },
                    { "type": "Expanded", "flex": 2, "child": { "type": "Container" } },
                    { "type": "Text", "content": [ { "content": "a", "fontSize": 20 } ] }
                ] }
            ],
            "metadata": { "title": "T" },
            "options": { "glyphPolicy": "Fallback" }
        }"#;
        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(doc.options.glyph_policy, GlyphPolicy::Fallback);
        let page = &doc.children[0];
        assert_eq!(page.kind(), NodeKind::Page);
        let kids = page.children();
        assert_eq!(kids.len(), 3);
        assert_eq!(kids[1].flex(), Some(2.0));
        match &kids[2] {
            Node::Text(t) => assert!(matches!(t.content, TextContent::Runs(_))),
            other => panic!("expected text, got {:?}", other.kind()),
        }
    }

    #[test]
    fn test_single_child_nodes_expose_child_slice() {
        let p: Node = Padding::new(Edges::uniform(5.0), TextNode::new("x", 10.0)).into();
        assert_eq!(p.children().len(), 1);
        assert_eq!(p.children()[0].kind(), NodeKind::Text);
    }
}
