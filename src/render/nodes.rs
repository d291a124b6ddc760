//! Built-in renderers, one per drawable node kind.
//!
//! Coordinates come from the layout tree and are already in output space.
//! Numbers are written with two decimals.

use std::fmt::Write as FmtWrite;

use super::{render_children, RenderContext};
use crate::error::{FolioError, Result};
use crate::layout::{LayoutContent, LayoutNode};
use crate::model::{ImageNode, Node};
use crate::style::{BoxFit, Color, TextAlign};
use crate::text::{self, ResolvedRun, ShapedLine};

fn wrong_node(node: &LayoutNode<'_>) -> FolioError {
    FolioError::NoRenderer(node.node.kind())
}

// ── Rectangle ───────────────────────────────────────────────────────

/// Stroked outline (filled too when a background is set), then children.
pub(super) fn render_rectangle(node: &LayoutNode<'_>, ctx: &mut RenderContext<'_>) -> Result<String> {
    let Node::Rectangle(rect) = node.node else {
        return Err(wrong_node(node));
    };
    let mut out = String::from("q\n");
    let _ = writeln!(out, "{:.2} w", rect.border_width);
    let _ = writeln!(out, "{} RG", rect.color.to_pdf_operands());
    if let Some(bg) = rect.background_color {
        let _ = writeln!(out, "{} rg", bg.to_pdf_operands());
    }
    let _ = writeln!(
        out,
        "{:.2} {:.2} {:.2} {:.2} re {}",
        node.bounds.x,
        node.y_out,
        node.width(),
        node.height(),
        if rect.background_color.is_some() { "B" } else { "S" }
    );
    out.push_str("Q\n");
    out.push_str(&render_children(node, ctx)?);
    Ok(out)
}

// ── Line ────────────────────────────────────────────────────────────

pub(super) fn render_line(node: &LayoutNode<'_>, _ctx: &mut RenderContext<'_>) -> Result<String> {
    let (Node::Line(line), LayoutContent::Line(g)) = (node.node, &node.content) else {
        return Err(wrong_node(node));
    };
    let mut out = String::from("q\n");
    let _ = writeln!(out, "{:.2} w", line.stroke_width);
    let _ = writeln!(out, "{} RG", line.color.to_pdf_operands());
    out.push_str("[] 0 d\n");
    let _ = writeln!(out, "{:.2} {:.2} m", g.x, g.y);
    let _ = writeln!(out, "{:.2} {:.2} l", g.x_end, g.y_end);
    out.push_str("S\nQ\n");
    Ok(out)
}

// ── Image ───────────────────────────────────────────────────────────

/// Where an image is painted and, for fits that can overflow, the clip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Placement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub clip: Option<[f64; 4]>,
}

/// Fit an image of `iw`×`ih` pixels into the box at (`x`, `y`) of size
/// `bw`×`bh`. Pixels map to points one to one for [`BoxFit::None`].
pub(super) fn place_image(fit: BoxFit, x: f64, y: f64, bw: f64, bh: f64, iw: f64, ih: f64) -> Placement {
    let centered = |w: f64, h: f64| Placement {
        x: x + (bw - w) / 2.0,
        y: y + (bh - h) / 2.0,
        width: w,
        height: h,
        clip: Some([x, y, bw, bh]),
    };
    if iw <= 0.0 || ih <= 0.0 {
        return Placement {
            x,
            y,
            width: bw,
            height: bh,
            clip: None,
        };
    }
    match fit {
        BoxFit::Fill => Placement {
            x,
            y,
            width: bw,
            height: bh,
            clip: None,
        },
        BoxFit::Contain => {
            let scale = (bw / iw).min(bh / ih);
            centered(iw * scale, ih * scale)
        }
        BoxFit::Cover => {
            let scale = (bw / iw).max(bh / ih);
            centered(iw * scale, ih * scale)
        }
        BoxFit::None => centered(iw, ih),
    }
}

pub(super) fn render_image(node: &LayoutNode<'_>, ctx: &mut RenderContext<'_>) -> Result<String> {
    let (Node::Image(ImageNode { fit, .. }), LayoutContent::Image(loaded)) = (node.node, &node.content) else {
        return Err(wrong_node(node));
    };
    let number = ctx.use_image(loaded);
    let p = place_image(
        *fit,
        node.bounds.x,
        node.y_out,
        node.width(),
        node.height(),
        loaded.width_px as f64,
        loaded.height_px as f64,
    );

    let mut out = String::new();
    if let Some([cx, cy, cw, ch]) = p.clip {
        let _ = writeln!(out, "q\n{:.2} {:.2} {:.2} {:.2} re W n", cx, cy, cw, ch);
    }
    let _ = writeln!(
        out,
        "q\n{:.2} 0 0 {:.2} {:.2} {:.2} cm\n/Im{} Do\nQ",
        p.width, p.height, p.x, p.y, number
    );
    if p.clip.is_some() {
        out.push_str("Q\n");
    }
    Ok(out)
}

// ── Text ────────────────────────────────────────────────────────────

/// Font and fill color last set inside the current text object.
#[derive(Default)]
struct TextState {
    font: Option<(usize, f64)>,
    color: Option<Color>,
}

/// Left-aligned text is one text object advancing with `T*`; centered and
/// right-aligned lines each get their own text object at an explicit x.
pub(super) fn render_text(node: &LayoutNode<'_>, ctx: &mut RenderContext<'_>) -> Result<String> {
    let Node::Text(text_node) = node.node else {
        return Err(wrong_node(node));
    };
    let runs = text::resolve_runs(text_node);
    let max_width = node.bounds.width;
    let lines = text::wrap(&runs, max_width, &*ctx.manager)?;
    if lines.is_empty() {
        return Ok(String::new());
    }
    let baselines = text::baselines(node.y_out + node.height(), &lines);
    let left = node.bounds.x;

    let mut out = String::new();
    if text_node.align == TextAlign::Left {
        let mut state = TextState::default();
        let mut leading: Option<f64> = None;
        out.push_str("BT\n");
        for (i, line) in lines.iter().enumerate() {
            if i == 0 {
                write_fragments_prelude(&mut out, line, &runs, &mut state, ctx)?;
                let _ = writeln!(out, "{:.2} {:.2} Td", left, baselines[0]);
            } else {
                let lead = baselines[i - 1] - baselines[i];
                if leading.map_or(true, |l| (l - lead).abs() > 1e-9) {
                    let _ = writeln!(out, "{:.2} TL", lead);
                    leading = Some(lead);
                }
                out.push_str("T*\n");
            }
            write_fragments(&mut out, line, &runs, &mut state, ctx)?;
        }
        out.push_str("ET\n");
    } else {
        for (line, baseline) in lines.iter().zip(&baselines) {
            let mut state = TextState::default();
            let x = text::aligned_x(text_node.align, left, max_width, line.width);
            out.push_str("BT\n");
            write_fragments_prelude(&mut out, line, &runs, &mut state, ctx)?;
            let _ = writeln!(out, "{:.2} {:.2} Td", x, baseline);
            write_fragments(&mut out, line, &runs, &mut state, ctx)?;
            out.push_str("ET\n");
        }
    }
    Ok(out)
}

/// Select the first fragment's font and color before positioning.
fn write_fragments_prelude(
    out: &mut String,
    line: &ShapedLine,
    runs: &[ResolvedRun],
    state: &mut TextState,
    ctx: &mut RenderContext<'_>,
) -> Result<()> {
    match line.fragments.iter().find(|f| !f.text.is_empty()) {
        Some(first) => set_run_state(out, &runs[first.run], state, ctx),
        None => Ok(()),
    }
}

fn set_run_state(out: &mut String, run: &ResolvedRun, state: &mut TextState, ctx: &mut RenderContext<'_>) -> Result<()> {
    let handle = ctx.use_font(&run.family, run.style)?;
    if state.color != Some(run.color) {
        let _ = writeln!(out, "{} rg", run.color.to_pdf_operands());
        state.color = Some(run.color);
    }
    if state.font != Some((handle.index, run.size)) {
        let _ = writeln!(out, "/{} {} Tf", handle.resource_name(), run.size);
        state.font = Some((handle.index, run.size));
    }
    Ok(())
}

/// Show each fragment, switching font or color only when the run changes
/// them. The text cursor advances by each fragment's width as it is shown.
fn write_fragments(
    out: &mut String,
    line: &ShapedLine,
    runs: &[ResolvedRun],
    state: &mut TextState,
    ctx: &mut RenderContext<'_>,
) -> Result<()> {
    for fragment in &line.fragments {
        if fragment.text.is_empty() {
            continue;
        }
        let run = &runs[fragment.run];
        set_run_state(out, run, state, ctx)?;
        let metrics = ctx.manager.fonts().metrics(&run.family, run.style)?;
        match text::kerned_array(&fragment.text, |l, r| metrics.kerning(l, r)) {
            Some(array) => {
                let _ = writeln!(out, "{} TJ", array);
            }
            None => {
                let _ = writeln!(out, "{} Tj", text::pdf_literal(&fragment.text));
            }
        }
    }
    Ok(())
}
