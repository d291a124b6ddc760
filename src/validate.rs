//! Structural checks run before layout.
//!
//! Everything here can be decided from the tree alone. Checks that need
//! resolved geometry (a padding that leaves no room for its child, a line
//! without a parent width) are raised by the layout pass instead.

use crate::error::{FolioError, Result};
use crate::model::*;

/// Validate a whole document: its children must be pages, and every page's
/// content must pass [`validate_node`].
pub fn validate_document(document: &Document) -> Result<()> {
    for child in &document.children {
        match child {
            Node::Page(page) => {
                for node in &page.children {
                    validate_node(node)?;
                }
            }
            other => {
                return Err(invalid(format!(
                    "Document children must be pages, found {}",
                    other.kind()
                )))
            }
        }
    }
    Ok(())
}

/// Validate a content node and its subtree.
pub fn validate_node(node: &Node) -> Result<()> {
    match node {
        Node::Page(_) | Node::Document(_) => {
            return Err(invalid(format!("{} cannot be nested inside another node", node.kind())));
        }
        Node::Expanded(e) => {
            if !(e.flex.is_finite() && e.flex > 0.0) {
                return Err(invalid(format!("Expanded flex must be a positive number, got {}", e.flex)));
            }
            if matches!(*e.child, Node::Expanded(_)) {
                return Err(invalid("Expanded cannot directly contain another Expanded".to_string()));
            }
        }
        Node::SizedContainer(s) => {
            positive("SizedContainer width", s.width)?;
            positive("SizedContainer height", s.height)?;
        }
        Node::Container(c) => {
            non_negative("Container x", c.x)?;
            non_negative("Container y", c.y)?;
            optional_positive("Container width", c.width)?;
            optional_positive("Container height", c.height)?;
        }
        Node::Rectangle(r) => {
            optional_positive("Rectangle width", r.width)?;
            optional_positive("Rectangle height", r.height)?;
            non_negative("Rectangle border width", r.border_width)?;
        }
        Node::Image(img) => {
            optional_positive("Image width", img.width)?;
            optional_positive("Image height", img.height)?;
        }
        Node::Line(l) => {
            non_negative("Line x", l.x)?;
            non_negative("Line y", l.y)?;
            non_negative("Line stroke width", l.stroke_width)?;
        }
        Node::Padding(p) => {
            let m = &p.margin;
            for (side, v) in [("top", m.top), ("right", m.right), ("bottom", m.bottom), ("left", m.left)] {
                non_negative(&format!("Padding {}", side), v)?;
            }
        }
        Node::Text(t) => {
            positive("Text font size", t.font_size)?;
            if let TextContent::Runs(runs) = &t.content {
                for run in runs {
                    if let Some(size) = run.font_size {
                        positive("Text run font size", size)?;
                    }
                }
            }
        }
    }

    for child in node.children() {
        validate_node(child)?;
    }
    Ok(())
}

fn invalid(message: String) -> FolioError {
    FolioError::Validation(message)
}

fn positive(what: &str, v: f64) -> Result<()> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{} must be greater than 0, got {}", what, v)))
    }
}

fn optional_positive(what: &str, v: Option<f64>) -> Result<()> {
    v.map_or(Ok(()), |v| positive(what, v))
}

fn non_negative(what: &str, v: f64) -> Result<()> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{} must not be negative, got {}", what, v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Edges;

    fn doc(nodes: Vec<Node>) -> Document {
        Document::new(vec![Page::new(nodes)])
    }

    fn err_message(d: &Document) -> String {
        match validate_document(d) {
            Err(FolioError::Validation(m)) => m,
            other => panic!("expected a validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_document_passes() {
        let d = doc(vec![
            TextNode::new("ok", 12.0).into(),
            Expanded::new(1.0, Container::new(vec![])).into(),
            Padding::new(Edges::uniform(4.0), TextNode::new("x", 9.0)).into(),
        ]);
        assert!(validate_document(&d).is_ok());
    }

    #[test]
    fn test_nested_document_rejected() {
        let inner: Node = Document::default().into();
        let d = doc(vec![Container::new(vec![inner]).into()]);
        assert!(err_message(&d).contains("Document cannot be nested"));
    }

    #[test]
    fn test_non_page_root_child_rejected() {
        let d = Document {
            children: vec![TextNode::new("x", 12.0).into()],
            ..Default::default()
        };
        assert!(err_message(&d).contains("must be pages"));
    }

    #[test]
    fn test_expanded_in_expanded_rejected() {
        let d = doc(vec![Expanded::new(1.0, Expanded::new(1.0, Container::new(vec![]))).into()]);
        assert!(err_message(&d).contains("another Expanded"));
    }

    #[test]
    fn test_flex_must_be_positive() {
        for flex in [0.0, -1.0, f64::NAN] {
            let d = doc(vec![Expanded::new(flex, Container::new(vec![])).into()]);
            assert!(err_message(&d).contains("flex"));
        }
    }

    #[test]
    fn test_sized_container_dimensions() {
        let d = doc(vec![SizedContainer {
            width: 0.0,
            height: 10.0,
            children: vec![],
        }
        .into()]);
        assert!(err_message(&d).contains("width"));
    }

    #[test]
    fn test_negative_origin_rejected() {
        let d = doc(vec![Container::new(vec![]).at(-1.0, 0.0).into()]);
        assert!(err_message(&d).contains("Container x"));
        let line = LineNode {
            y: -3.0,
            ..Default::default()
        };
        assert!(err_message(&doc(vec![line.into()])).contains("Line y"));
    }

    #[test]
    fn test_font_size_must_be_positive() {
        let d = doc(vec![TextNode::new("x", 0.0).into()]);
        assert!(err_message(&d).contains("font size"));
    }
}
