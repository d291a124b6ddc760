//! # Text Shaping
//!
//! Greedy word wrapping over one or more styled runs, the matching height
//! pre-pass used by layout, alignment, and WinAnsi string encoding.
//!
//! Layout and rendering must agree on every line break. [`line_heights`]
//! is the pre-pass: it walks the words through the same `LineCursor` as
//! [`wrap`], but only tracks line count and per-line height. The rules:
//!
//! - words are split on single spaces, run by run;
//! - a word joins the open line when `line_width + word <= max`;
//! - every placed word adds its width plus one space, across runs too;
//! - otherwise the line closes and the running width restarts at the word;
//! - a word that is wider than `max` on its own stays on its line;
//! - empty words (from repeated spaces) never start a new line;
//! - a line is as tall as the largest font size that placed a word on it.

use crate::error::Result;
use crate::model::{TextContent, TextNode};
use crate::style::{Color, FontStyle, TextAlign};

/// Cap height of the standard fonts as a fraction of the font size. The
/// baseline of a line sits this far below the line's top edge.
pub const BASELINE_RATIO: f64 = 0.683;

/// Anything that can report the rendered width of a string.
pub trait TextMeasure {
    /// Width in points of `text` set in `family`/`style` at `size`,
    /// including kerning between adjacent characters.
    fn measure(&self, text: &str, family: &str, size: f64, style: FontStyle) -> Result<f64>;
}

/// A run with every inherited property filled in from its text node.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRun {
    pub text: String,
    pub family: String,
    pub size: f64,
    pub style: FontStyle,
    pub color: Color,
}

/// A contiguous piece of one run on one line.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedFragment {
    /// Index into the resolved runs.
    pub run: usize,
    pub text: String,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShapedLine {
    pub fragments: Vec<ShapedFragment>,
    /// Sum of the fragment widths.
    pub width: f64,
    /// Largest font size among the runs that placed a word on this line.
    pub height: f64,
}

/// Expand a text node into runs with the node's defaults applied.
pub fn resolve_runs(node: &TextNode) -> Vec<ResolvedRun> {
    let inherit = |text: &str| ResolvedRun {
        text: text.to_string(),
        family: node.font_family.clone(),
        size: node.font_size,
        style: node.font_style,
        color: node.color,
    };
    match &node.content {
        TextContent::Plain(s) => vec![inherit(s)],
        TextContent::Runs(runs) => runs
            .iter()
            .map(|r| ResolvedRun {
                text: r.content.clone(),
                family: r.font_family.clone().unwrap_or_else(|| node.font_family.clone()),
                size: r.font_size.unwrap_or(node.font_size),
                style: r.font_style.unwrap_or(node.font_style),
                color: r.color.unwrap_or(node.color),
            })
            .collect(),
    }
}

/// Running state of the greedy wrap, shared by [`wrap`] and
/// [`line_heights`] so both break at the same words.
///
/// Every placed word charges its width plus one space; a break resets the
/// running width to the new word alone. A word only breaks onto a new
/// line when the current one already holds something.
struct LineCursor {
    max_width: f64,
    open: bool,
    width: f64,
    height: f64,
}

impl LineCursor {
    fn new(max_width: Option<f64>) -> Self {
        Self {
            max_width: max_width.unwrap_or(f64::INFINITY),
            open: false,
            width: 0.0,
            height: 0.0,
        }
    }

    /// Place one word. Returns the height of the line it closed, if any.
    fn place(&mut self, word: &str, word_width: f64, space: f64, size: f64) -> Option<f64> {
        if self.open && !word.is_empty() && self.width + word_width > self.max_width {
            let closed = self.height;
            self.width = word_width;
            self.height = size;
            return Some(closed);
        }
        self.width += word_width + space;
        self.height = self.height.max(size);
        self.open = true;
        None
    }

    fn finish(self) -> Option<f64> {
        self.open.then_some(self.height)
    }
}

/// Break the runs into lines no wider than `max_width` (unbounded when
/// `None`) and measure every fragment.
pub fn wrap(
    runs: &[ResolvedRun],
    max_width: Option<f64>,
    measurer: &dyn TextMeasure,
) -> Result<Vec<ShapedLine>> {
    let mut cursor = LineCursor::new(max_width);
    let mut lines: Vec<ShapedLine> = Vec::new();
    let mut fragments: Vec<ShapedFragment> = Vec::new();

    for (run_index, run) in runs.iter().enumerate() {
        if run.text.is_empty() {
            continue;
        }
        let space = measurer.measure(" ", &run.family, run.size, run.style)?;

        for (word_index, word) in run.text.split(' ').enumerate() {
            let word_width = measurer.measure(word, &run.family, run.size, run.style)?;
            let was_open = cursor.open;

            if let Some(closed) = cursor.place(word, word_width, space, run.size) {
                lines.push(close_line(&mut fragments, closed, runs, measurer)?);
                fragments.push(ShapedFragment {
                    run: run_index,
                    text: word.to_string(),
                    width: 0.0,
                });
                continue;
            }
            match fragments.last_mut() {
                Some(last) if was_open && word_index > 0 && last.run == run_index => {
                    last.text.push(' ');
                    last.text.push_str(word);
                }
                _ => fragments.push(ShapedFragment {
                    run: run_index,
                    text: word.to_string(),
                    width: 0.0,
                }),
            }
        }
    }

    if let Some(height) = cursor.finish() {
        lines.push(close_line(&mut fragments, height, runs, measurer)?);
    }
    Ok(lines)
}

fn close_line(
    fragments: &mut Vec<ShapedFragment>,
    height: f64,
    runs: &[ResolvedRun],
    measurer: &dyn TextMeasure,
) -> Result<ShapedLine> {
    let mut fragments = std::mem::take(fragments);
    if let Some(last) = fragments.last_mut() {
        let trimmed = last.text.trim_end_matches(' ').len();
        last.text.truncate(trimmed);
    }
    let mut width = 0.0;
    for fragment in &mut fragments {
        let run = &runs[fragment.run];
        fragment.width = measurer.measure(&fragment.text, &run.family, run.size, run.style)?;
        width += fragment.width;
    }
    Ok(ShapedLine {
        fragments,
        width,
        height,
    })
}

/// Height of every line [`wrap`] would produce, without building fragments.
pub fn line_heights(
    runs: &[ResolvedRun],
    max_width: Option<f64>,
    measurer: &dyn TextMeasure,
) -> Result<Vec<f64>> {
    let mut cursor = LineCursor::new(max_width);
    let mut heights = Vec::new();

    for run in runs {
        if run.text.is_empty() {
            continue;
        }
        let space = measurer.measure(" ", &run.family, run.size, run.style)?;
        for word in run.text.split(' ') {
            let word_width = measurer.measure(word, &run.family, run.size, run.style)?;
            heights.extend(cursor.place(word, word_width, space, run.size));
        }
    }

    heights.extend(cursor.finish());
    Ok(heights)
}

/// Total height of a text block: the sum of its line heights.
pub fn text_height(
    runs: &[ResolvedRun],
    max_width: Option<f64>,
    measurer: &dyn TextMeasure,
) -> Result<f64> {
    Ok(line_heights(runs, max_width, measurer)?.iter().sum())
}

/// Left edge of a line of `line_width` inside a box starting at `left`.
pub fn aligned_x(align: TextAlign, left: f64, max_width: Option<f64>, line_width: f64) -> f64 {
    let Some(max) = max_width.filter(|w| w.is_finite()) else {
        return left;
    };
    match align {
        TextAlign::Left => left,
        TextAlign::Center => left + (max - line_width) / 2.0,
        TextAlign::Right => left + (max - line_width),
    }
}

/// Baselines (output space) of each line, given the block's top edge.
pub fn baselines(top: f64, lines: &[ShapedLine]) -> Vec<f64> {
    let mut consumed = 0.0;
    lines
        .iter()
        .map(|line| {
            let baseline = top - consumed - line.height * BASELINE_RATIO;
            consumed += line.height;
            baseline
        })
        .collect()
}

/// The 0x80..=0x9F block of Windows-1252: typographic punctuation and a
/// handful of Latin Extended letters. 0x81, 0x8D, 0x8F, 0x90 and 0x9D are
/// unassigned.
const WINANSI_HIGH: [(char, u8); 27] = [
    ('\u{20AC}', 0x80),
    ('\u{201A}', 0x82),
    ('\u{0192}', 0x83),
    ('\u{201E}', 0x84),
    ('\u{2026}', 0x85),
    ('\u{2020}', 0x86),
    ('\u{2021}', 0x87),
    ('\u{02C6}', 0x88),
    ('\u{2030}', 0x89),
    ('\u{0160}', 0x8A),
    ('\u{2039}', 0x8B),
    ('\u{0152}', 0x8C),
    ('\u{017D}', 0x8E),
    ('\u{2018}', 0x91),
    ('\u{2019}', 0x92),
    ('\u{201C}', 0x93),
    ('\u{201D}', 0x94),
    ('\u{2022}', 0x95),
    ('\u{2013}', 0x96),
    ('\u{2014}', 0x97),
    ('\u{02DC}', 0x98),
    ('\u{2122}', 0x99),
    ('\u{0161}', 0x9A),
    ('\u{203A}', 0x9B),
    ('\u{0153}', 0x9C),
    ('\u{017E}', 0x9E),
    ('\u{0178}', 0x9F),
];

/// Map a character to its WinAnsiEncoding (Windows-1252) byte.
pub fn encode_winansi(ch: char) -> Option<u8> {
    let cp = ch as u32;
    if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
        return Some(cp as u8);
    }
    WINANSI_HIGH.iter().find(|(c, _)| *c == ch).map(|(_, b)| *b)
}

/// The character written for `ch`: itself when WinAnsi has it, `?` otherwise.
pub fn drawn_glyph(ch: char) -> char {
    if encode_winansi(ch).is_some() {
        ch
    } else {
        '?'
    }
}

/// The character a WinAnsi byte stands for, if the code is assigned.
pub fn decode_winansi(byte: u8) -> Option<char> {
    match byte {
        0x20..=0x7E | 0xA0..=0xFF => Some(byte as char),
        _ => WINANSI_HIGH.iter().find(|(_, b)| *b == byte).map(|(c, _)| *c),
    }
}

/// A PDF literal string `( ... )` holding `text` in WinAnsi.
///
/// Backslash and parentheses are escaped, bytes outside printable ASCII
/// are written as octal escapes, and unmappable characters become `?`.
pub fn pdf_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('(');
    for ch in text.chars() {
        let byte = encode_winansi(ch).unwrap_or(b'?');
        match byte {
            b'\\' => out.push_str("\\\\"),
            b'(' => out.push_str("\\("),
            b')' => out.push_str("\\)"),
            0x20..=0x7E => out.push(byte as char),
            _ => out.push_str(&format!("\\{:03o}", byte)),
        }
    }
    out.push(')');
    out
}

/// A `TJ` array for `text`, splitting at every kerned pair. Returns `None`
/// when no adjacent pair is kerned, in which case plain `Tj` suffices.
///
/// Kerning values are in 1000ths of an em; a negative kern tightens the
/// pair, which `TJ` expresses as a positive displacement.
pub fn kerned_array(text: &str, kerning: impl Fn(char, char) -> f64) -> Option<String> {
    let chars: Vec<char> = text.chars().map(drawn_glyph).collect();
    let mut parts: Vec<String> = Vec::new();
    let mut start = 0;
    for i in 1..chars.len() {
        let kern = kerning(chars[i - 1], chars[i]);
        if kern != 0.0 {
            let segment: String = chars[start..i].iter().collect();
            parts.push(pdf_literal(&segment));
            parts.push(format_number(-kern));
            start = i;
        }
    }
    if parts.is_empty() {
        return None;
    }
    let tail: String = chars[start..].iter().collect();
    parts.push(pdf_literal(&tail));
    Some(format!("[{}]", parts.join(" ")))
}

/// Shortest decimal form of a TJ displacement (`70`, `-12.5`).
fn format_number(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        let s = format!("{:.3}", v);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}
