//! # Constraint Layout
//!
//! Resolves every node to an absolute box. Each node receives the box its
//! parent hands down (if any), computes its own box, and derives the boxes
//! it hands to its children.
//!
//! Layout is authored top-down (origin top-left, y growing downward) and
//! every node is then normalized once into the bottom-left PDF space using
//! the height of the page it sits on: `y_out = page_height - y - height`.
//! Normalization happens after the node's height is final.
//!
//! Layout never writes into the document tree. It returns a fresh
//! [`LayoutNode`] tree that borrows the nodes it was computed from, so the
//! same document can be laid out (and rendered) any number of times.
//!
//! Stacking containers (pages, containers, rectangles) place their children
//! with the two-pass flex distribution in [`flex`].

pub mod flex;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{FolioError, Result};
use crate::image_loader::{self, LoadedImage};
use crate::model::*;
use crate::text::{self, TextMeasure};

/// A box in top-left page space. Width and height stay `None` until
/// something supplies them.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResolvedBox {
    pub x: f64,
    pub y: f64,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl ResolvedBox {
    pub fn new(x: f64, y: f64, width: Option<f64>, height: Option<f64>) -> Self {
        Self { x, y, width, height }
    }

    /// A fully sized box.
    pub fn sized(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, Some(width), Some(height))
    }
}

/// Endpoints of a line in output (bottom-left) space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineGeometry {
    pub x: f64,
    pub y: f64,
    pub x_end: f64,
    pub y_end: f64,
}

/// Per-kind data computed during layout.
#[derive(Debug, Clone)]
pub enum LayoutContent {
    None,
    Line(LineGeometry),
    Image(Rc<LoadedImage>),
}

/// A node with its resolved geometry.
#[derive(Debug, Clone)]
pub struct LayoutNode<'a> {
    pub node: &'a Node,
    /// Absolute box in top-left space.
    pub bounds: ResolvedBox,
    /// Bottom edge in output space.
    pub y_out: f64,
    pub content: LayoutContent,
    /// Children in declaration order.
    pub children: Vec<LayoutNode<'a>>,
}

impl<'a> LayoutNode<'a> {
    pub fn width(&self) -> f64 {
        self.bounds.width.unwrap_or(0.0)
    }

    pub fn height(&self) -> f64 {
        self.bounds.height.unwrap_or(0.0)
    }

    /// Every box in this subtree, depth-first.
    pub fn boxes(&self) -> Vec<ResolvedBox> {
        let mut out = vec![self.bounds];
        for child in &self.children {
            out.extend(child.boxes());
        }
        out
    }
}

/// A laid-out page.
#[derive(Debug, Clone)]
pub struct LayoutPage<'a> {
    pub page: &'a Page,
    pub width: f64,
    pub height: f64,
    pub children: Vec<LayoutNode<'a>>,
}

pub struct LayoutEngine<'m> {
    measurer: &'m dyn TextMeasure,
    image_cache: RefCell<HashMap<String, Rc<LoadedImage>>>,
}

impl<'m> LayoutEngine<'m> {
    pub fn new(measurer: &'m dyn TextMeasure) -> Self {
        Self {
            measurer,
            image_cache: RefCell::new(HashMap::new()),
        }
    }

    /// Lay out every page of a document.
    pub fn layout<'a>(&self, document: &'a Document) -> Result<Vec<LayoutPage<'a>>> {
        document
            .children
            .iter()
            .map(|child| match child {
                Node::Page(page) => self.layout_page(page),
                other => Err(FolioError::Validation(format!(
                    "Document children must be pages, found {}",
                    other.kind()
                ))),
            })
            .collect()
    }

    /// A page behaves like a container sized to the page.
    pub fn layout_page<'a>(&self, page: &'a Page) -> Result<LayoutPage<'a>> {
        let (width, height) = page.config.dimensions();
        let page_box = ResolvedBox::sized(0.0, 0.0, width, height);
        let (children, _) = self.stack(&page.children, page_box, height)?;
        log::debug!("laid out {:.2}x{:.2} page with {} top-level nodes", width, height, children.len());
        Ok(LayoutPage {
            page,
            width,
            height,
            children,
        })
    }

    /// Lay out one node under optional parent constraints on a page of
    /// height `page_height`.
    pub fn layout_node<'a>(
        &self,
        node: &'a Node,
        parent: Option<ResolvedBox>,
        page_height: f64,
    ) -> Result<LayoutNode<'a>> {
        let origin = parent.unwrap_or_default();
        let mut content = LayoutContent::None;
        let mut children = Vec::new();

        let bounds = match node {
            Node::Container(c) => {
                let x = origin.x + c.x;
                let y = origin.y + c.y;
                let width = origin.width.or(c.width);
                let height = origin.height.or(c.height);
                let (laid, consumed) = self.stack(&c.children, ResolvedBox::new(x, y, width, height), page_height)?;
                children = laid;
                ResolvedBox::new(x, y, width, Some(height.unwrap_or(consumed)))
            }

            Node::Rectangle(r) => {
                let width = origin.width.or(r.width);
                let height = origin.height.or(r.height);
                let (laid, consumed) = self.stack(
                    &r.children,
                    ResolvedBox::new(origin.x, origin.y, width, height),
                    page_height,
                )?;
                children = laid;
                ResolvedBox::new(origin.x, origin.y, width, Some(height.unwrap_or(consumed)))
            }

            Node::SizedContainer(s) => {
                let own = ResolvedBox::sized(origin.x, origin.y, s.width, s.height);
                children = s
                    .children
                    .iter()
                    .map(|child| self.layout_node(child, Some(own), page_height))
                    .collect::<Result<_>>()?;
                own
            }

            Node::Padding(p) => {
                let m = &p.margin;
                let inner = ResolvedBox::new(
                    origin.x + m.left,
                    origin.y + m.top,
                    origin.width.map(|w| w - m.horizontal()),
                    origin.height.map(|h| h - m.vertical()),
                );
                if let Some(w) = inner.width {
                    if w <= 0.0 {
                        return Err(FolioError::Validation(format!(
                            "Padding leaves a non-positive width ({:.2}) for its child",
                            w
                        )));
                    }
                }
                if let Some(h) = inner.height {
                    if h < 0.0 {
                        return Err(FolioError::Validation(format!(
                            "Padding leaves a negative height ({:.2}) for its child",
                            h
                        )));
                    }
                }
                let child = self.layout_node(&p.child, Some(inner), page_height)?;
                let height = child.height() + m.vertical();
                children.push(child);
                ResolvedBox::new(origin.x, origin.y, origin.width, Some(height))
            }

            Node::Expanded(e) => {
                let child = self.layout_node(&e.child, Some(origin), page_height)?;
                let height = origin.height.unwrap_or_else(|| child.height());
                children.push(child);
                ResolvedBox::new(origin.x, origin.y, origin.width, Some(height))
            }

            Node::Text(t) => {
                let runs = text::resolve_runs(t);
                let height = text::text_height(&runs, origin.width, self.measurer)?;
                ResolvedBox::new(origin.x, origin.y, origin.width, Some(height))
            }

            Node::Image(img) => {
                let loaded = self.load_image(&img.source)?;
                let width = origin
                    .width
                    .or(img.width)
                    .unwrap_or_else(|| match origin.height.or(img.height) {
                        Some(h) => h * loaded.aspect_ratio(),
                        None => loaded.width_px as f64,
                    });
                let height = origin
                    .height
                    .or(img.height)
                    .unwrap_or_else(|| width / loaded.aspect_ratio());
                content = LayoutContent::Image(loaded);
                ResolvedBox::sized(origin.x, origin.y, width, height)
            }

            Node::Line(l) => {
                let Some(parent_width) = parent.and_then(|p| p.width) else {
                    return Err(FolioError::Constraint {
                        node: NodeKind::Line,
                        dimension: "width",
                    });
                };
                let x = l.x + origin.x;
                let y = l.y + origin.y;
                let x_end = origin.x + parent_width - l.x_end;
                let y_end = origin.y + l.y_end;
                content = LayoutContent::Line(LineGeometry {
                    x,
                    y: page_height - y,
                    x_end,
                    y_end: page_height - y_end,
                });
                ResolvedBox::sized(x, y, x_end - x, l.y.max(l.y_end))
            }

            Node::Page(_) | Node::Document(_) => {
                return Err(FolioError::Validation(format!(
                    "{} cannot be nested inside content",
                    node.kind()
                )))
            }
        };

        let y_out = match &content {
            // A line's own endpoints are normalized individually.
            LayoutContent::Line(g) => g.y,
            _ => page_height - bounds.y - bounds.height.unwrap_or(0.0),
        };

        Ok(LayoutNode {
            node,
            bounds,
            y_out,
            content,
            children,
        })
    }

    /// Stack children vertically inside `parent`.
    ///
    /// Pass 1 lays out fixed children in declaration order, each starting
    /// where the previous one ended. Pass 2 shares the parent's leftover
    /// height among the flexible children by weight; they are placed after
    /// the fixed ones, in declaration order. Returns the children in
    /// declaration order and the total height consumed.
    fn stack<'a>(
        &self,
        nodes: &'a [Node],
        parent: ResolvedBox,
        page_height: f64,
    ) -> Result<(Vec<LayoutNode<'a>>, f64)> {
        let mut slots: Vec<Option<LayoutNode<'a>>> = nodes.iter().map(|_| None).collect();
        let mut flexible: Vec<(usize, f64)> = Vec::new();
        let mut y = parent.y;
        let mut used = 0.0;

        for (i, child) in nodes.iter().enumerate() {
            if let Some(weight) = child.flex() {
                flexible.push((i, weight));
                continue;
            }
            let constraints = ResolvedBox::new(parent.x, y, parent.width, None);
            let laid = self.layout_node(child, Some(constraints), page_height)?;
            used += laid.height();
            y += laid.height();
            slots[i] = Some(laid);
        }

        let remaining = flex::remaining_space(parent.height, used);
        let weights: Vec<f64> = flexible.iter().map(|(_, w)| *w).collect();
        let heights = flex::flex_heights(&weights, remaining);
        for ((i, _), height) in flexible.iter().zip(heights) {
            let constraints = ResolvedBox::new(parent.x, y, parent.width, Some(height));
            slots[*i] = Some(self.layout_node(&nodes[*i], Some(constraints), page_height)?);
            y += height;
        }

        Ok((slots.into_iter().flatten().collect(), y - parent.y))
    }

    fn load_image(&self, source: &ImageSource) -> Result<Rc<LoadedImage>> {
        let ImageSource::Src(src) = source else {
            return Ok(Rc::new(image_loader::load_image(source)?));
        };
        if let Some(cached) = self.image_cache.borrow().get(src) {
            return Ok(Rc::clone(cached));
        }
        let loaded = Rc::new(image_loader::load_image(source)?);
        self.image_cache
            .borrow_mut()
            .insert(src.clone(), Rc::clone(&loaded));
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{Edges, FontStyle};

    /// 10pt per non-empty word, 5pt per space.
    struct FixedWords;

    impl TextMeasure for FixedWords {
        fn measure(&self, text: &str, _family: &str, _size: f64, _style: FontStyle) -> Result<f64> {
            let words = text.split(' ').filter(|w| !w.is_empty()).count() as f64;
            Ok(words * 10.0 + text.matches(' ').count() as f64 * 5.0)
        }
    }

    fn fixed(height: f64) -> Node {
        SizedContainer {
            width: 10.0,
            height,
            children: vec![],
        }
        .into()
    }

    fn flexible(weight: f64) -> Node {
        Expanded::new(weight, Container::new(vec![])).into()
    }

    const PAGE_H: f64 = 841.89;

    #[test]
    fn test_flex_distribution_scenario() {
        let root: Node = Container::new(vec![fixed(100.0), fixed(50.0), flexible(1.0), flexible(2.0)])
            .size(200.0, 500.0)
            .into();
        let engine = LayoutEngine::new(&FixedWords);
        let laid = engine.layout_node(&root, None, PAGE_H).unwrap();

        let first = &laid.children[2];
        let second = &laid.children[3];
        assert!((first.bounds.y - 150.0).abs() < 1e-9);
        assert!((first.height() - 350.0 / 3.0).abs() < 1e-9);
        assert!((second.bounds.y - (first.bounds.y + first.height())).abs() < 1e-9);
        assert!((first.height() + second.height() - 350.0).abs() < 1e-9);
        // The expanded child's content receives the assigned height.
        assert!((second.children[0].height() - 700.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_flex_gets_nothing_when_fixed_overflow() {
        let root: Node = Container::new(vec![fixed(400.0), flexible(1.0)]).size(100.0, 300.0).into();
        let laid = LayoutEngine::new(&FixedWords).layout_node(&root, None, PAGE_H).unwrap();
        assert_eq!(laid.children[1].height(), 0.0);
    }

    #[test]
    fn test_layout_is_idempotent() {
        let root: Node = Container::new(vec![
            TextNode::new("Hello World, this is a test", 12.0).into(),
            Padding::new(Edges::uniform(5.0), TextNode::new("padded", 10.0)).into(),
            flexible(1.0),
        ])
        .at(10.0, 20.0)
        .size(70.0, 400.0)
        .into();
        let engine = LayoutEngine::new(&FixedWords);
        let first = engine.layout_node(&root, None, PAGE_H).unwrap();
        let second = engine.layout_node(&root, None, PAGE_H).unwrap();
        assert_eq!(first.boxes(), second.boxes());
        assert_eq!(first.y_out, second.y_out);
    }

    #[test]
    fn test_container_adopts_parent_and_offsets() {
        let root: Node = Container::new(vec![]).at(10.0, 20.0).size(50.0, 60.0).into();
        let parent = ResolvedBox::sized(5.0, 5.0, 300.0, 400.0);
        let laid = LayoutEngine::new(&FixedWords)
            .layout_node(&root, Some(parent), PAGE_H)
            .unwrap();
        assert_eq!(laid.bounds, ResolvedBox::sized(15.0, 25.0, 300.0, 400.0));
        assert!((laid.y_out - (PAGE_H - 25.0 - 400.0)).abs() < 1e-9);
    }

    #[test]
    fn test_container_height_from_children() {
        let root: Node = Container::new(vec![fixed(30.0), fixed(12.0)]).into();
        let laid = LayoutEngine::new(&FixedWords)
            .layout_node(&root, Some(ResolvedBox::new(0.0, 0.0, Some(100.0), None)), PAGE_H)
            .unwrap();
        assert_eq!(laid.height(), 42.0);
        assert_eq!(laid.children[1].bounds.y, 30.0);
    }

    #[test]
    fn test_text_height_uses_parent_width() {
        let root: Node = TextNode::new("Hello World, this is a test", 12.0).into();
        let laid = LayoutEngine::new(&FixedWords)
            .layout_node(&root, Some(ResolvedBox::new(0.0, 0.0, Some(70.0), None)), PAGE_H)
            .unwrap();
        assert_eq!(laid.height(), 24.0);
    }

    #[test]
    fn test_padding_height_is_content_plus_vertical_margins() {
        let root: Node = Padding::new(Edges::new(4.0, 3.0, 6.0, 2.0), TextNode::new("one", 12.0)).into();
        let laid = LayoutEngine::new(&FixedWords)
            .layout_node(&root, Some(ResolvedBox::new(0.0, 0.0, Some(100.0), None)), PAGE_H)
            .unwrap();
        assert_eq!(laid.height(), 12.0 + 4.0 + 6.0);
        let child = &laid.children[0];
        assert_eq!(child.bounds.x, 2.0);
        assert_eq!(child.bounds.y, 4.0);
        assert_eq!(child.bounds.width, Some(95.0));
    }

    #[test]
    fn test_padding_rejects_no_room() {
        let root: Node = Padding::new(Edges::uniform(60.0), TextNode::new("x", 12.0)).into();
        let err = LayoutEngine::new(&FixedWords)
            .layout_node(&root, Some(ResolvedBox::new(0.0, 0.0, Some(100.0), None)), PAGE_H)
            .unwrap_err();
        assert!(matches!(err, FolioError::Validation(_)));
    }

    #[test]
    fn test_padding_rejects_negative_inner_height() {
        let root: Node = Padding::new(Edges::uniform(20.0), Rectangle::default()).into();
        let err = LayoutEngine::new(&FixedWords)
            .layout_node(&root, Some(ResolvedBox::new(0.0, 0.0, Some(200.0), Some(10.0))), PAGE_H)
            .unwrap_err();
        assert!(matches!(err, FolioError::Validation(_)));
    }

    #[test]
    fn test_padding_allows_zero_inner_height() {
        let root: Node = Padding::new(Edges::uniform(5.0), Rectangle::default()).into();
        let out = LayoutEngine::new(&FixedWords)
            .layout_node(&root, Some(ResolvedBox::new(0.0, 0.0, Some(200.0), Some(10.0))), PAGE_H)
            .unwrap();
        assert_eq!(out.children[0].bounds.height, Some(0.0));
    }

    #[test]
    fn test_line_requires_parent_width() {
        let line: Node = LineNode::default().into();
        let err = LayoutEngine::new(&FixedWords).layout_node(&line, None, PAGE_H).unwrap_err();
        assert!(matches!(
            err,
            FolioError::Constraint {
                node: NodeKind::Line,
                dimension: "width"
            }
        ));
    }

    #[test]
    fn test_line_endpoints_are_normalized() {
        let line: Node = LineNode {
            x: 10.0,
            y: 5.0,
            x_end: 20.0,
            y_end: 5.0,
            ..Default::default()
        }
        .into();
        let parent = ResolvedBox::new(50.0, 100.0, Some(200.0), None);
        let laid = LayoutEngine::new(&FixedWords)
            .layout_node(&line, Some(parent), 800.0)
            .unwrap();
        match &laid.content {
            LayoutContent::Line(g) => {
                assert_eq!(g.x, 60.0);
                assert_eq!(g.y, 800.0 - 105.0);
                assert_eq!(g.x_end, 230.0);
                assert_eq!(g.y_end, 800.0 - 105.0);
            }
            other => panic!("expected line geometry, got {:?}", other),
        }
        assert_eq!(laid.height(), 5.0);
    }

    #[test]
    fn test_page_stacks_children_and_normalizes_with_page_height() {
        let page = Page::new(vec![fixed(100.0), fixed(50.0)]).with_config(PageConfig {
            size: PageSize::A4,
            orientation: Orientation::Landscape,
        });
        let laid = LayoutEngine::new(&FixedWords).layout_page(&page).unwrap();
        assert_eq!(laid.height, 595.28);
        assert_eq!(laid.children[1].bounds.y, 100.0);
        assert!((laid.children[1].y_out - (595.28 - 100.0 - 50.0)).abs() < 1e-9);
    }

    #[test]
    fn test_document_rejects_non_page_children() {
        let doc = Document {
            children: vec![TextNode::new("loose", 12.0).into()],
            ..Default::default()
        };
        let err = LayoutEngine::new(&FixedWords).layout(&doc).unwrap_err();
        assert!(matches!(err, FolioError::Validation(_)));
    }

    #[test]
    fn test_sized_container_overlays_children() {
        let root: Node = SizedContainer {
            width: 80.0,
            height: 40.0,
            children: vec![Container::new(vec![]).into(), Container::new(vec![]).into()],
        }
        .into();
        let laid = LayoutEngine::new(&FixedWords)
            .layout_node(&root, Some(ResolvedBox::new(5.0, 6.0, Some(500.0), None)), PAGE_H)
            .unwrap();
        assert_eq!(laid.bounds, ResolvedBox::sized(5.0, 6.0, 80.0, 40.0));
        assert_eq!(laid.children[0].bounds, laid.children[1].bounds);
        assert_eq!(laid.children[1].bounds, ResolvedBox::sized(5.0, 6.0, 80.0, 40.0));
    }
}
