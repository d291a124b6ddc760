//! # Font Management
//!
//! Per-(family, style) font faces: advance widths and kerning pairs for
//! measurement, plus the program the PDF writer needs to emit a font
//! resource. Widths and kerning are stored in 1000ths of an em.
//!
//! Faces come from three places: built-in tables for the standard PDF
//! fonts (no embedding), AFM metric files, and TrueType programs parsed
//! with ttf-parser (embedded as simple TrueType fonts).

pub mod afm;
pub mod standard;

use std::collections::HashMap;

use crate::error::{FolioError, Result};
use crate::style::FontStyle;

#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct FontKey {
    pub family: String,
    pub style: FontStyle,
}

impl FontKey {
    pub fn new(family: &str, style: FontStyle) -> Self {
        Self {
            family: family.to_string(),
            style,
        }
    }
}

/// Glyph metrics for one face, in 1000ths of an em.
#[derive(Debug, Clone, Default)]
pub struct FontMetrics {
    widths: HashMap<char, f64>,
    kerning: HashMap<(char, char), f64>,
    default_width: f64,
    pub ascent: f64,
    pub descent: f64,
    pub cap_height: f64,
}

impl FontMetrics {
    pub fn new(default_width: f64) -> Self {
        Self {
            default_width,
            ascent: 718.0,
            descent: -207.0,
            cap_height: 718.0,
            ..Default::default()
        }
    }

    pub fn set_width(&mut self, ch: char, width: f64) {
        self.widths.insert(ch, width);
    }

    pub fn set_kerning(&mut self, left: char, right: char, adjust: f64) {
        self.kerning.insert((left, right), adjust);
    }

    pub fn with_width(mut self, ch: char, width: f64) -> Self {
        self.set_width(ch, width);
        self
    }

    pub fn with_kerning(mut self, left: char, right: char, adjust: f64) -> Self {
        self.set_kerning(left, right, adjust);
        self
    }

    pub fn advance(&self, ch: char) -> Option<f64> {
        self.widths.get(&ch).copied()
    }

    /// Kerning adjustment between two adjacent characters, 0 when unpaired.
    pub fn kerning(&self, left: char, right: char) -> f64 {
        self.kerning.get(&(left, right)).copied().unwrap_or(0.0)
    }

    /// Width used for unknown characters under the lenient glyph policy.
    pub fn default_width(&self) -> f64 {
        self.default_width
    }

    pub fn glyph_count(&self) -> usize {
        self.widths.len()
    }
}

/// What the PDF writer emits for a face.
#[derive(Debug, Clone)]
pub enum FontProgram {
    /// One of the 14 standard fonts; referenced by name only.
    Standard { base_font: String },
    /// A TrueType program embedded as `FontFile2`.
    TrueType(TrueTypeProgram),
}

#[derive(Debug, Clone)]
pub struct TrueTypeProgram {
    pub data: Vec<u8>,
    pub postscript_name: String,
    /// `[x_min, y_min, x_max, y_max]` scaled to 1000 units.
    pub bbox: [f64; 4],
    pub italic_angle: f64,
}

#[derive(Debug, Clone)]
pub struct FontFace {
    pub metrics: FontMetrics,
    pub program: FontProgram,
}

/// All faces available to a render, keyed by (family, style).
#[derive(Debug, Clone, Default)]
pub struct FontBook {
    faces: HashMap<FontKey, FontFace>,
}

impl FontBook {
    /// An empty book. Every measurement fails until faces are added.
    pub fn new() -> Self {
        Self::default()
    }

    /// A book preloaded with the built-in standard font tables.
    pub fn standard() -> Self {
        let mut book = Self::new();
        standard::register_all(&mut book);
        book
    }

    pub fn insert(&mut self, family: &str, style: FontStyle, face: FontFace) {
        log::debug!("font face loaded: {} ({}), {} glyphs", family, style, face.metrics.glyph_count());
        self.faces.insert(FontKey::new(family, style), face);
    }

    /// Parse an AFM file and register it. The base font name is the AFM
    /// `FontName`; the font is referenced, not embedded.
    pub fn load_afm(&mut self, family: &str, style: FontStyle, afm_text: &str) -> Result<()> {
        let parsed = afm::parse(afm_text)?;
        let face = FontFace {
            metrics: parsed.metrics,
            program: FontProgram::Standard {
                base_font: parsed.font_name,
            },
        };
        self.insert(family, style, face);
        Ok(())
    }

    /// Parse a TrueType program and register it for embedding.
    pub fn load_truetype(&mut self, family: &str, style: FontStyle, data: Vec<u8>) -> Result<()> {
        let face = truetype_face(family, style, data)?;
        self.insert(family, style, face);
        Ok(())
    }

    pub fn face(&self, family: &str, style: FontStyle) -> Result<&FontFace> {
        self.faces
            .get(&FontKey::new(family, style))
            .ok_or_else(|| FolioError::MetricsNotFound {
                family: family.to_string(),
                style,
            })
    }

    pub fn metrics(&self, family: &str, style: FontStyle) -> Result<&FontMetrics> {
        self.face(family, style).map(|f| &f.metrics)
    }
}

/// Sanitize a family name for use as a PDF name object.
fn sanitize_font_name(family: &str, style: FontStyle) -> String {
    let mut name: String = family
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if name.is_empty() {
        name = "CustomFont".to_string();
    }
    match style {
        FontStyle::Normal => {}
        FontStyle::Bold => name.push_str("-Bold"),
        FontStyle::Italic => name.push_str("-Italic"),
        FontStyle::BoldItalic => name.push_str("-BoldItalic"),
    }
    name
}

fn truetype_face(family: &str, style: FontStyle, data: Vec<u8>) -> Result<FontFace> {
    let face = ttf_parser::Face::parse(&data, 0)
        .map_err(|e| FolioError::FontParse(format!("{} ({}): {}", family, style, e)))?;
    let upem = face.units_per_em() as f64;
    let scale = 1000.0 / upem;

    // Only codepoints reachable through WinAnsi are ever drawn, so that is
    // the range worth measuring.
    let mut glyphs: Vec<(char, ttf_parser::GlyphId)> = Vec::new();
    for code in 32u32..=0x2122 {
        let Some(ch) = char::from_u32(code) else {
            continue;
        };
        if crate::text::encode_winansi(ch).is_none() {
            continue;
        }
        if let Some(gid) = face.glyph_index(ch) {
            glyphs.push((ch, gid));
        }
    }

    let space_advance = face
        .glyph_index(' ')
        .and_then(|g| face.glyph_hor_advance(g))
        .map(|a| a as f64 * scale)
        .unwrap_or(500.0);
    let mut metrics = FontMetrics::new(space_advance);
    metrics.ascent = face.ascender() as f64 * scale;
    metrics.descent = face.descender() as f64 * scale;
    metrics.cap_height = face
        .capital_height()
        .map(|h| h as f64 * scale)
        .unwrap_or(metrics.ascent);

    for &(ch, gid) in &glyphs {
        let advance = face.glyph_hor_advance(gid).unwrap_or(0) as f64 * scale;
        metrics.set_width(ch, advance);
    }

    if let Some(kern) = face.tables().kern {
        let ascii: Vec<&(char, ttf_parser::GlyphId)> =
            glyphs.iter().filter(|(ch, _)| ch.is_ascii()).collect();
        for subtable in kern.subtables {
            if !subtable.horizontal || subtable.variable {
                continue;
            }
            for &&(left, lg) in &ascii {
                for &&(right, rg) in &ascii {
                    if let Some(k) = subtable.glyphs_kerning(lg, rg) {
                        if k != 0 {
                            metrics.set_kerning(left, right, k as f64 * scale);
                        }
                    }
                }
            }
        }
    }

    let postscript_name = face
        .names()
        .into_iter()
        .find(|n| n.name_id == ttf_parser::name_id::POST_SCRIPT_NAME)
        .and_then(|n| n.to_string())
        .map(|n| sanitize_font_name(&n, FontStyle::Normal))
        .unwrap_or_else(|| sanitize_font_name(family, style));

    let bb = face.global_bounding_box();
    let program = TrueTypeProgram {
        postscript_name,
        bbox: [
            bb.x_min as f64 * scale,
            bb.y_min as f64 * scale,
            bb.x_max as f64 * scale,
            bb.y_max as f64 * scale,
        ],
        italic_angle: face.italic_angle() as f64,
        data,
    };

    Ok(FontFace {
        metrics,
        program: FontProgram::TrueType(program),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_book_helvetica_space() {
        let book = FontBook::standard();
        let m = book.metrics("Helvetica", FontStyle::Normal).unwrap();
        assert_eq!(m.advance(' '), Some(278.0));
    }

    #[test]
    fn test_bold_wider_than_regular() {
        let book = FontBook::standard();
        let regular = book.metrics("Helvetica", FontStyle::Normal).unwrap();
        let bold = book.metrics("Helvetica", FontStyle::Bold).unwrap();
        assert!(bold.advance('A').unwrap() > regular.advance('A').unwrap());
    }

    #[test]
    fn test_missing_family_reports_metrics_not_found() {
        let book = FontBook::standard();
        let err = book.metrics("Nonexistent", FontStyle::Normal).unwrap_err();
        assert!(matches!(err, FolioError::MetricsNotFound { .. }));
    }

    #[test]
    fn test_kerning_defaults_to_zero() {
        let m = FontMetrics::new(500.0).with_kerning('A', 'V', -70.0);
        assert_eq!(m.kerning('A', 'V'), -70.0);
        assert_eq!(m.kerning('V', 'A'), 0.0);
    }

    #[test]
    fn test_sanitize_font_name() {
        assert_eq!(sanitize_font_name("Inter", FontStyle::Normal), "Inter");
        assert_eq!(sanitize_font_name("Inter", FontStyle::Bold), "Inter-Bold");
        assert_eq!(sanitize_font_name("Noto Sans", FontStyle::Italic), "NotoSans-Italic");
        assert_eq!(sanitize_font_name("()", FontStyle::Normal), "CustomFont");
    }

    #[test]
    fn test_garbage_truetype_is_rejected() {
        let mut book = FontBook::new();
        let err = book
            .load_truetype("Broken", FontStyle::Normal, vec![0, 1, 2, 3])
            .unwrap_err();
        assert!(matches!(err, FolioError::FontParse(_)));
    }
}
