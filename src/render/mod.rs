//! # Render Dispatch
//!
//! Turns laid-out pages into content streams and assembles the file.
//!
//! Each node kind maps to a renderer function through a
//! [`RendererRegistry`]. The built-in registry is filled from one
//! exhaustive match, so every kind has a renderer; custom registries can
//! override kinds, but a kind can only be registered once and dispatching
//! a kind without a renderer is an error rather than silent output loss.
//!
//! Renderers receive a [`RenderContext`] holding the [`ObjectManager`].
//! Registering a font or image is a side effect of rendering, so object
//! numbers follow traversal order: pages in order, nodes depth-first,
//! children in declaration order.

mod nodes;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Write as FmtWrite;

use crate::error::{FolioError, Result};
use crate::font::FontBook;
use crate::image_loader::LoadedImage;
use crate::layout::{LayoutEngine, LayoutNode, LayoutPage};
use crate::model::{Document, NodeKind};
use crate::pdf::{FontHandle, ObjectManager};
use crate::style::FontStyle;
use crate::validate::validate_document;

/// A renderer: operator text for one laid-out node (and its subtree).
pub type RenderFn = fn(&LayoutNode<'_>, &mut RenderContext<'_>) -> Result<String>;

/// Node kind → renderer.
#[derive(Clone, Default)]
pub struct RendererRegistry {
    renderers: HashMap<NodeKind, RenderFn>,
}

impl RendererRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with a renderer for every node kind.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for kind in NodeKind::ALL {
            registry.renderers.insert(kind, builtin_renderer(kind));
        }
        registry
    }

    /// Register a renderer. The first registration for a kind stays; a
    /// second one is rejected.
    pub fn register(&mut self, kind: NodeKind, renderer: RenderFn) -> Result<()> {
        if self.renderers.contains_key(&kind) {
            return Err(FolioError::RendererAlreadyRegistered(kind));
        }
        self.renderers.insert(kind, renderer);
        Ok(())
    }

    /// Drop the renderer for a kind, returning it.
    pub fn unregister(&mut self, kind: NodeKind) -> Option<RenderFn> {
        self.renderers.remove(&kind)
    }

    pub fn resolve(&self, kind: NodeKind) -> Option<RenderFn> {
        self.renderers.get(&kind).copied()
    }
}

fn builtin_renderer(kind: NodeKind) -> RenderFn {
    match kind {
        NodeKind::Text => nodes::render_text,
        NodeKind::Image => nodes::render_image,
        NodeKind::Line => nodes::render_line,
        NodeKind::Rectangle => nodes::render_rectangle,
        NodeKind::Container
        | NodeKind::SizedContainer
        | NodeKind::Padding
        | NodeKind::Expanded
        | NodeKind::Page
        | NodeKind::Document => render_children,
    }
}

/// Render one node through the registry.
pub fn dispatch(node: &LayoutNode<'_>, ctx: &mut RenderContext<'_>) -> Result<String> {
    let kind = node.node.kind();
    let renderer = ctx.registry.resolve(kind).ok_or(FolioError::NoRenderer(kind))?;
    renderer(node, ctx)
}

/// Concatenate the children's output in declaration order.
pub fn render_children(node: &LayoutNode<'_>, ctx: &mut RenderContext<'_>) -> Result<String> {
    let mut out = String::new();
    for child in &node.children {
        out.push_str(&dispatch(child, ctx)?);
    }
    Ok(out)
}

/// Per-page render state: the object manager, the registry and the
/// resources this page's content stream uses.
pub struct RenderContext<'r> {
    pub manager: &'r mut ObjectManager,
    pub registry: &'r RendererRegistry,
    fonts: BTreeMap<usize, usize>,
    images: BTreeSet<usize>,
}

impl<'r> RenderContext<'r> {
    pub fn new(manager: &'r mut ObjectManager, registry: &'r RendererRegistry) -> Self {
        Self {
            manager,
            registry,
            fonts: BTreeMap::new(),
            images: BTreeSet::new(),
        }
    }

    /// Register a font and list it in this page's resources.
    pub fn use_font(&mut self, family: &str, style: FontStyle) -> Result<FontHandle> {
        let handle = self.manager.register_font(family, style)?;
        self.fonts.insert(handle.index, handle.object_number);
        Ok(handle)
    }

    /// Register an image and list it in this page's resources.
    pub fn use_image(&mut self, image: &LoadedImage) -> usize {
        let number = self
            .manager
            .register_image(image.width_px, image.height_px, image.encoding, &image.data);
        self.images.insert(number);
        number
    }

    /// The page's `/Resources` dictionary.
    pub fn resources(&self) -> String {
        let mut dict = String::from("<<");
        if !self.fonts.is_empty() {
            dict.push_str(" /Font <<");
            for (index, number) in &self.fonts {
                let _ = write!(dict, " /F{} {} 0 R", index, number);
            }
            dict.push_str(" >>");
        }
        if !self.images.is_empty() {
            dict.push_str(" /XObject <<");
            for number in &self.images {
                let _ = write!(dict, " /Im{} {} 0 R", number, number);
            }
            dict.push_str(" >>");
        }
        dict.push_str(" >>");
        dict
    }
}

/// Renders documents with a font book and a renderer registry.
pub struct Renderer {
    fonts: FontBook,
    registry: RendererRegistry,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    /// Standard fonts and the built-in renderers.
    pub fn new() -> Self {
        Self {
            fonts: FontBook::standard(),
            registry: RendererRegistry::builtin(),
        }
    }

    pub fn with_fonts(mut self, fonts: FontBook) -> Self {
        self.fonts = fonts;
        self
    }

    pub fn with_registry(mut self, registry: RendererRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn fonts_mut(&mut self) -> &mut FontBook {
        &mut self.fonts
    }

    /// Validate, lay out, render, and serialize a document.
    ///
    /// Object order: the page tree (patched with its kids at the end), then
    /// per page its fonts and images as first used, its content stream and
    /// its page dictionary, then the catalog and optional info dictionary.
    pub fn render(&self, document: &Document) -> Result<Vec<u8>> {
        validate_document(document)?;

        let mut manager = ObjectManager::new(self.fonts.clone()).with_glyph_policy(document.options.glyph_policy);
        let pages = LayoutEngine::new(&manager).layout(document)?;

        let pages_id = manager.add("<< /Type /Pages /Kids [] /Count 0 >>");
        let mut kids = Vec::with_capacity(pages.len());
        for page in &pages {
            kids.push(self.render_page(page, pages_id, &mut manager)?);
        }

        let kid_refs: Vec<String> = kids.iter().map(|id| format!("{} 0 R", id)).collect();
        manager.replace(
            pages_id,
            format!("<< /Type /Pages /Kids [{}] /Count {} >>", kid_refs.join(" "), kids.len()),
        )?;
        manager.add_catalog(pages_id);
        manager.add_info(&document.metadata);
        manager.finish()
    }

    fn render_page(&self, page: &LayoutPage<'_>, parent: usize, manager: &mut ObjectManager) -> Result<usize> {
        let (content, resources) = {
            let mut ctx = RenderContext::new(manager, &self.registry);
            let mut content = String::new();
            for node in &page.children {
                content.push_str(&dispatch(node, &mut ctx)?);
            }
            (content, ctx.resources())
        };

        let content_id = manager.add(format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            content.len(),
            content
        ));
        let page_id = manager.add(format!(
            "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {:.2} {:.2}] /Contents {} 0 R /Resources {} >>",
            parent, page.width, page.height, content_id, resources
        ));
        log::debug!("page {} rendered: {} bytes of content", page_id, content.len());
        Ok(page_id)
    }
}

/// Render a document with the standard fonts and built-in renderers.
pub fn render(document: &Document) -> Result<Vec<u8>> {
    Renderer::new().render(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::ResolvedBox;
    use crate::model::{Container, Node, Page, Rectangle, TextNode};
    use crate::style::Color;

    fn stub(_: &LayoutNode<'_>, _: &mut RenderContext<'_>) -> Result<String> {
        Ok("stub\n".to_string())
    }

    fn other_stub(_: &LayoutNode<'_>, _: &mut RenderContext<'_>) -> Result<String> {
        Ok("other\n".to_string())
    }

    fn layout_one<'a>(node: &'a Node, manager: &ObjectManager) -> LayoutNode<'a> {
        LayoutEngine::new(manager)
            .layout_node(node, Some(ResolvedBox::new(0.0, 0.0, Some(200.0), None)), 800.0)
            .unwrap()
    }

    #[test]
    fn test_first_registration_wins() {
        let mut registry = RendererRegistry::new();
        registry.register(NodeKind::Text, stub).unwrap();
        let err = registry.register(NodeKind::Text, other_stub).unwrap_err();
        assert!(matches!(err, FolioError::RendererAlreadyRegistered(NodeKind::Text)));
        assert!(registry.resolve(NodeKind::Text).is_some());
        assert!(registry.resolve(NodeKind::Image).is_none());
    }

    #[test]
    fn test_builtin_covers_every_kind() {
        let registry = RendererRegistry::builtin();
        for kind in NodeKind::ALL {
            assert!(registry.resolve(kind).is_some(), "{} has no renderer", kind);
        }
    }

    #[test]
    fn test_missing_renderer_is_an_error() {
        let mut manager = ObjectManager::new(FontBook::standard());
        let node: Node = Container::new(vec![]).into();
        let laid = layout_one(&node, &manager);
        let registry = RendererRegistry::new();
        let mut ctx = RenderContext::new(&mut manager, &registry);
        let err = dispatch(&laid, &mut ctx).unwrap_err();
        assert!(matches!(err, FolioError::NoRenderer(NodeKind::Container)));
    }

    #[test]
    fn test_children_render_in_declaration_order() {
        let node: Node = Container::new(vec![
            TextNode::new("a", 12.0).into(),
            Rectangle {
                height: Some(10.0),
                ..Default::default()
            }
            .into(),
            TextNode::new("b", 12.0).into(),
        ])
        .into();
        let mut manager = ObjectManager::new(FontBook::standard());
        let laid = layout_one(&node, &manager);

        let mut registry = RendererRegistry::builtin();
        registry.unregister(NodeKind::Text);
        registry.register(NodeKind::Text, stub).unwrap();
        registry.unregister(NodeKind::Rectangle);
        registry.register(NodeKind::Rectangle, other_stub).unwrap();

        let mut ctx = RenderContext::new(&mut manager, &registry);
        assert_eq!(dispatch(&laid, &mut ctx).unwrap(), "stub\nother\nstub\n");
    }

    #[test]
    fn test_resources_list_only_used_fonts() {
        let mut manager = ObjectManager::new(FontBook::standard());
        let registry = RendererRegistry::builtin();
        manager.register_font("Courier", FontStyle::Normal).unwrap();

        let mut ctx = RenderContext::new(&mut manager, &registry);
        assert_eq!(ctx.resources(), "<< >>");
        let h = ctx.use_font("Helvetica", FontStyle::Normal).unwrap();
        assert_eq!(h.index, 2);
        assert_eq!(ctx.resources(), format!("<< /Font << /F2 {} 0 R >> >>", h.object_number));
    }

    #[test]
    fn test_render_produces_pdf() {
        let doc = Document::new(vec![Page::new(vec![
            TextNode::new("Hello", 12.0).color(Color::new(255.0, 0.0, 0.0)).into()
        ])]);
        let bytes = render(&doc).unwrap();
        let text = String::from_utf8_lossy(&bytes).to_string();
        assert!(text.starts_with("%PDF-1.4\n"));
        assert!(text.contains("/Type /Pages /Kids [4 0 R] /Count 1"));
        assert!(text.contains("1.000 0.000 0.000 rg"));
        assert!(text.contains("(Hello) Tj"));
        assert!(text.ends_with("%%EOF\n"));
    }
}
