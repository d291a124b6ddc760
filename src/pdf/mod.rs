//! # PDF Object Manager
//!
//! Owns the object table of one output file: sequential object numbers,
//! the byte offset each object will occupy, the font and image resource
//! registries, and the final xref/trailer serialization.
//!
//! ## File Structure
//!
//! ```text
//! %PDF-1.4             <- header (9 bytes)
//! 1 0 obj ... endobj   <- objects, numbered in the order they were added
//! 2 0 obj ... endobj
//! ...
//! xref                 <- one 10-digit byte offset per object
//! trailer              <- object count, catalog, optional info
//! startxref / %%EOF
//! ```
//!
//! Offsets are tracked with a running counter as objects are added, so the
//! xref never has to re-derive the serialized prefix. The counter uses the
//! exact framing [`ObjectManager::finish`] writes.

use std::collections::HashMap;
use std::fmt::Write as FmtWrite;

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::error::{FolioError, Result};
use crate::font::{standard, FontBook, FontFace, FontKey, FontMetrics, FontProgram, TrueTypeProgram};
use crate::model::{GlyphPolicy, Metadata};
use crate::style::FontStyle;
use crate::text::{decode_winansi, drawn_glyph, encode_winansi, pdf_literal, TextMeasure};

/// Version header written before the first object.
pub const HEADER: &[u8] = b"%PDF-1.4\n";

/// A registered font: `/F{index}` in content streams, and the object
/// number of its font dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontHandle {
    pub index: usize,
    pub object_number: usize,
}

impl FontHandle {
    /// Resource name without the leading slash, e.g. `F1`.
    pub fn resource_name(&self) -> String {
        format!("F{}", self.index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    DeviceRGB,
    DeviceGray,
}

impl ColorSpace {
    pub fn pdf_name(&self) -> &'static str {
        match self {
            ColorSpace::DeviceRGB => "DeviceRGB",
            ColorSpace::DeviceGray => "DeviceGray",
        }
    }
}

/// How an image payload is compressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEncoding {
    /// JPEG bytes, embedded as-is.
    Dct(ColorSpace),
    /// zlib-compressed 8-bit samples.
    Flate(ColorSpace),
}

impl ImageEncoding {
    pub fn filter(&self) -> &'static str {
        match self {
            ImageEncoding::Dct(_) => "DCTDecode",
            ImageEncoding::Flate(_) => "FlateDecode",
        }
    }

    pub fn color_space(&self) -> ColorSpace {
        match self {
            ImageEncoding::Dct(cs) | ImageEncoding::Flate(cs) => *cs,
        }
    }
}

#[derive(Debug, Clone)]
struct PdfObject {
    body: Vec<u8>,
    offset: usize,
}

/// The object table for a single render.
///
/// Single owner, single writer: numbering follows call order, so callers
/// must add objects in the order the document is traversed.
#[derive(Debug)]
pub struct ObjectManager {
    fonts: FontBook,
    glyph_policy: GlyphPolicy,
    objects: Vec<PdfObject>,
    next_offset: usize,
    font_handles: HashMap<FontKey, FontHandle>,
    catalog: Option<usize>,
    info: Option<usize>,
}

/// Bytes occupied by `"{n} 0 obj\n{body}\nendobj\n"`.
fn framed_len(number: usize, body_len: usize) -> usize {
    format!("{} 0 obj\n", number).len() + body_len + "\nendobj\n".len()
}

impl ObjectManager {
    pub fn new(fonts: FontBook) -> Self {
        Self {
            fonts,
            glyph_policy: GlyphPolicy::Strict,
            objects: Vec::new(),
            next_offset: HEADER.len(),
            font_handles: HashMap::new(),
            catalog: None,
            info: None,
        }
    }

    pub fn with_glyph_policy(mut self, policy: GlyphPolicy) -> Self {
        self.glyph_policy = policy;
        self
    }

    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Append an object and return its number (1-based).
    pub fn add(&mut self, body: impl Into<Vec<u8>>) -> usize {
        let body = body.into();
        let number = self.objects.len() + 1;
        let offset = self.next_offset;
        self.next_offset += framed_len(number, body.len());
        log::debug!("object {} allocated at offset {} ({} bytes)", number, offset, body.len());
        self.objects.push(PdfObject { body, offset });
        number
    }

    /// Overwrite an existing object's body, keeping its number.
    ///
    /// Later objects keep their numbers; their recorded offsets move by
    /// the difference in body length.
    pub fn replace(&mut self, number: usize, body: impl Into<Vec<u8>>) -> Result<()> {
        if number == 0 || number > self.objects.len() {
            return Err(FolioError::UnknownObject(number));
        }
        self.objects[number - 1].body = body.into();

        let mut offset = self.objects[number - 1].offset;
        for (i, obj) in self.objects.iter_mut().enumerate().skip(number - 1) {
            obj.offset = offset;
            offset += framed_len(i + 1, obj.body.len());
        }
        self.next_offset = offset;
        Ok(())
    }

    pub fn body(&self, number: usize) -> Option<&[u8]> {
        number
            .checked_sub(1)
            .and_then(|i| self.objects.get(i))
            .map(|o| o.body.as_slice())
    }

    /// Byte offset, from the start of the header, at which the object's
    /// framing begins.
    pub fn offset_of(&self, number: usize) -> Option<usize> {
        number
            .checked_sub(1)
            .and_then(|i| self.objects.get(i))
            .map(|o| o.offset)
    }

    // ── Fonts ───────────────────────────────────────────────────────

    /// Register a font resource. Idempotent per (family, style): the first
    /// call emits the font objects, later calls return the same handle.
    pub fn register_font(&mut self, family: &str, style: FontStyle) -> Result<FontHandle> {
        let key = FontKey::new(family, style);
        if let Some(handle) = self.font_handles.get(&key) {
            return Ok(*handle);
        }

        let face = self.fonts.face(family, style)?.clone();
        let object_number = match &face.program {
            FontProgram::Standard { base_font } if standard::is_symbolic(base_font) => self.add(
                format!("<< /Type /Font /Subtype /Type1 /BaseFont /{} >>", base_font),
            ),
            FontProgram::Standard { base_font } => self.add(format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                base_font
            )),
            FontProgram::TrueType(program) => self.embed_truetype(&face, program, style),
        };

        let handle = FontHandle {
            index: self.font_handles.len() + 1,
            object_number,
        };
        log::debug!("font {} ({}) registered as /F{} in object {}", family, style, handle.index, object_number);
        self.font_handles.insert(key, handle);
        Ok(handle)
    }

    pub fn font_handle(&self, family: &str, style: FontStyle) -> Option<FontHandle> {
        self.font_handles.get(&FontKey::new(family, style)).copied()
    }

    /// Emit a simple TrueType font: `FontFile2`, `FontDescriptor`, then the
    /// font dictionary with WinAnsi widths. Returns the dictionary's number.
    fn embed_truetype(&mut self, face: &FontFace, program: &TrueTypeProgram, style: FontStyle) -> usize {
        let compressed = compress_to_vec_zlib(&program.data, 6);
        let mut file: Vec<u8> = Vec::new();
        file.extend_from_slice(
            format!(
                "<< /Length {} /Length1 {} /Filter /FlateDecode >>\nstream\n",
                compressed.len(),
                program.data.len()
            )
            .as_bytes(),
        );
        file.extend_from_slice(&compressed);
        file.extend_from_slice(b"\nendstream");
        let file_id = self.add(file);

        let metrics = &face.metrics;
        // Nonsymbolic, plus Italic when slanted.
        let flags = if style.is_italic() { 32 | 64 } else { 32 };
        let italic_angle = if style.is_italic() && program.italic_angle == 0.0 {
            -12.0
        } else {
            program.italic_angle
        };
        let descriptor = format!(
            "<< /Type /FontDescriptor /FontName /{} /Flags {} \
             /FontBBox [{} {} {} {}] /ItalicAngle {} \
             /Ascent {} /Descent {} /CapHeight {} /StemV {} \
             /FontFile2 {} 0 R >>",
            program.postscript_name,
            flags,
            program.bbox[0] as i32,
            program.bbox[1] as i32,
            program.bbox[2] as i32,
            program.bbox[3] as i32,
            italic_angle,
            metrics.ascent as i32,
            metrics.descent as i32,
            metrics.cap_height as i32,
            if style.is_bold() { 120 } else { 80 },
            file_id,
        );
        let descriptor_id = self.add(descriptor);

        let widths: Vec<String> = (32u8..=255)
            .map(|code| {
                decode_winansi(code)
                    .and_then(|ch| metrics.advance(ch))
                    .unwrap_or(0.0)
                    .round()
                    .to_string()
            })
            .collect();
        self.add(format!(
            "<< /Type /Font /Subtype /TrueType /BaseFont /{} \
             /FirstChar 32 /LastChar 255 /Widths [{}] \
             /FontDescriptor {} 0 R /Encoding /WinAnsiEncoding >>",
            program.postscript_name,
            widths.join(" "),
            descriptor_id
        ))
    }

    // ── Images ──────────────────────────────────────────────────────

    /// Append an image XObject. Every call allocates a new object, even for
    /// identical bytes.
    pub fn register_image(&mut self, width: u32, height: u32, encoding: ImageEncoding, data: &[u8]) -> usize {
        let mut body: Vec<u8> = Vec::with_capacity(data.len() + 160);
        body.extend_from_slice(
            format!(
                "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                 /ColorSpace /{} /BitsPerComponent 8 /Filter /{} /Length {} >>\nstream\n",
                width,
                height,
                encoding.color_space().pdf_name(),
                encoding.filter(),
                data.len()
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\nendstream");
        self.add(body)
    }

    // ── Measurement ─────────────────────────────────────────────────

    /// Width of `text` at `size` points: advances plus pair kerning, both
    /// in 1000ths of an em. A character outside WinAnsi is written as `?`,
    /// so under the fallback policy it is measured as `?` too.
    pub fn measure(&self, text: &str, family: &str, size: f64, style: FontStyle) -> Result<f64> {
        let metrics = self.fonts.metrics(family, style)?;
        let mut units = 0.0;
        let mut prev: Option<char> = None;
        for ch in text.chars() {
            let (glyph, advance) = match metrics.advance(ch).filter(|_| encode_winansi(ch).is_some()) {
                Some(w) => (ch, w),
                None => self.fallback_glyph(ch, family, style, metrics)?,
            };
            units += advance;
            if let Some(p) = prev {
                units += metrics.kerning(p, glyph);
            }
            prev = Some(glyph);
        }
        Ok(units * size / 1000.0)
    }

    /// The glyph drawn in place of `ch` and its advance.
    fn fallback_glyph(
        &self,
        ch: char,
        family: &str,
        style: FontStyle,
        metrics: &FontMetrics,
    ) -> Result<(char, f64)> {
        if let GlyphPolicy::Strict = self.glyph_policy {
            return Err(FolioError::GlyphNotFound {
                family: family.to_string(),
                style,
                ch,
            });
        }
        let glyph = drawn_glyph(ch);
        let advance = if glyph == ch {
            metrics.default_width()
        } else {
            metrics.advance(glyph).unwrap_or_else(|| metrics.default_width())
        };
        log::warn!(
            "no width for {:?} in {} ({}), measuring it as {:?} ({})",
            ch,
            family,
            style,
            glyph,
            advance
        );
        Ok((glyph, advance))
    }

    // ── Document structure ──────────────────────────────────────────

    /// Add the catalog and remember it for the trailer.
    pub fn add_catalog(&mut self, pages: usize) -> usize {
        let number = self.add(format!("<< /Type /Catalog /Pages {} 0 R >>", pages));
        self.catalog = Some(number);
        number
    }

    /// Add an `/Info` dictionary when any metadata field is set.
    pub fn add_info(&mut self, metadata: &Metadata) -> Option<usize> {
        if metadata.is_empty() {
            return None;
        }
        let mut info = String::from("<< ");
        let fields = [
            ("Title", &metadata.title),
            ("Author", &metadata.author),
            ("Subject", &metadata.subject),
            ("Creator", &metadata.creator),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                let _ = write!(info, "/{} {} ", key, pdf_literal(value));
            }
        }
        info.push_str("/Producer (Folio) >>");
        let number = self.add(info);
        self.info = Some(number);
        Some(number)
    }

    /// The cross-reference section: the free-list head for object 0, then
    /// one entry per object in ascending order.
    pub fn build_xref(&self) -> String {
        let mut xref = String::with_capacity(32 + self.objects.len() * 20);
        let _ = write!(xref, "xref\n0 {}\n", self.objects.len() + 1);
        xref.push_str("0000000000 65535 f \n");
        for obj in &self.objects {
            let _ = write!(xref, "{:010} 00000 n \n", obj.offset);
        }
        xref
    }

    pub fn build_trailer(&self, xref_start: usize) -> Result<String> {
        let catalog = self.catalog.ok_or(FolioError::MissingCatalog)?;
        let mut trailer = format!(
            "trailer\n<< /Size {} /Root {} 0 R",
            self.objects.len() + 1,
            catalog
        );
        if let Some(info) = self.info {
            let _ = write!(trailer, " /Info {} 0 R", info);
        }
        let _ = write!(trailer, " >>\nstartxref\n{}\n%%EOF\n", xref_start);
        Ok(trailer)
    }

    /// Serialize the whole file: header, objects, xref, trailer.
    pub fn finish(self) -> Result<Vec<u8>> {
        let trailer = self.build_trailer(self.next_offset)?;
        let xref = self.build_xref();

        let mut output: Vec<u8> = Vec::with_capacity(self.next_offset + xref.len() + trailer.len());
        output.extend_from_slice(HEADER);
        for (i, obj) in self.objects.iter().enumerate() {
            debug_assert_eq!(output.len(), obj.offset);
            output.extend_from_slice(format!("{} 0 obj\n", i + 1).as_bytes());
            output.extend_from_slice(&obj.body);
            output.extend_from_slice(b"\nendobj\n");
        }
        debug_assert_eq!(output.len(), self.next_offset);
        output.extend_from_slice(xref.as_bytes());
        output.extend_from_slice(trailer.as_bytes());
        log::debug!("serialized {} objects, {} bytes", self.objects.len(), output.len());
        Ok(output)
    }
}

impl TextMeasure for ObjectManager {
    fn measure(&self, text: &str, family: &str, size: f64, style: FontStyle) -> Result<f64> {
        ObjectManager::measure(self, text, family, size, style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ObjectManager {
        ObjectManager::new(FontBook::standard())
    }

    fn framed(n: usize, body: &str) -> usize {
        format!("{} 0 obj\n{}\nendobj\n", n, body).len()
    }

    #[test]
    fn test_offsets_follow_header_and_framing() {
        let mut pdf = manager();
        assert_eq!(pdf.add("A"), 1);
        assert_eq!(pdf.add("B"), 2);
        assert_eq!(pdf.add("C"), 3);

        let header = "%PDF-1.4\n".len();
        assert_eq!(pdf.offset_of(1), Some(header));
        assert_eq!(pdf.offset_of(2), Some(header + framed(1, "A")));
        assert_eq!(pdf.offset_of(3), Some(header + framed(1, "A") + framed(2, "B")));

        let xref = pdf.build_xref();
        let expected = format!(
            "xref\n0 4\n0000000000 65535 f \n{:010} 00000 n \n{:010} 00000 n \n{:010} 00000 n \n",
            9,
            9 + framed(1, "A"),
            9 + framed(1, "A") + framed(2, "B")
        );
        assert_eq!(xref, expected);
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let mut pdf = manager();
        pdf.add("<< /Type /Pages /Kids [] /Count 0 >>");
        pdf.add("first");
        pdf.add_catalog(1);
        let offsets: Vec<usize> = (1..=3).map(|n| pdf.offset_of(n).unwrap()).collect();
        let bytes = pdf.finish().unwrap();
        for (i, off) in offsets.iter().enumerate() {
            let prefix = format!("{} 0 obj\n", i + 1);
            assert!(bytes[*off..].starts_with(prefix.as_bytes()), "object {} not at {}", i + 1, off);
        }
    }

    #[test]
    fn test_replace_shifts_later_offsets() {
        let mut pdf = manager();
        pdf.add("<< /Type /Pages /Kids [] /Count 0 >>");
        pdf.add("page");
        let before = pdf.offset_of(2).unwrap();
        pdf.replace(1, "<< /Type /Pages /Kids [2 0 R] /Count 1 >>").unwrap();
        assert_eq!(pdf.offset_of(2).unwrap(), before + "2 0 R".len());
        assert_eq!(pdf.body(1).unwrap(), b"<< /Type /Pages /Kids [2 0 R] /Count 1 >>");
        assert!(matches!(pdf.replace(9, "x"), Err(FolioError::UnknownObject(9))));
    }

    #[test]
    fn test_font_registration_is_idempotent() {
        let mut pdf = manager();
        let first = pdf.register_font("Helvetica", FontStyle::Normal).unwrap();
        let count = pdf.object_count();
        let second = pdf.register_font("Helvetica", FontStyle::Normal).unwrap();
        assert_eq!(first, second);
        assert_eq!(pdf.object_count(), count);
        assert_eq!(first.index, 1);

        let bold = pdf.register_font("Helvetica", FontStyle::Bold).unwrap();
        assert_eq!(bold.index, 2);
        assert_ne!(bold.object_number, first.object_number);
        let body = String::from_utf8_lossy(pdf.body(bold.object_number).unwrap()).to_string();
        assert!(body.contains("/BaseFont /Helvetica-Bold"));
    }

    #[test]
    fn test_unknown_font_fails() {
        let mut pdf = manager();
        let err = pdf.register_font("Nope", FontStyle::Normal).unwrap_err();
        assert!(matches!(err, FolioError::MetricsNotFound { .. }));
    }

    #[test]
    fn test_images_are_never_deduplicated() {
        let mut pdf = manager();
        let data = [1u8, 2, 3];
        let enc = ImageEncoding::Flate(ColorSpace::DeviceRGB);
        let a = pdf.register_image(1, 1, enc, &data);
        let b = pdf.register_image(1, 1, enc, &data);
        let c = pdf.register_image(1, 1, enc, &data);
        assert!(a < b && b < c);
        let body = String::from_utf8_lossy(pdf.body(a).unwrap()).to_string();
        assert!(body.contains("/Filter /FlateDecode"));
        assert!(body.contains("/Length 3"));
    }

    #[test]
    fn test_measure_with_kerning() {
        let mut book = FontBook::new();
        let metrics = FontMetrics::new(500.0)
            .with_width('A', 600.0)
            .with_width('V', 600.0)
            .with_kerning('A', 'V', -100.0);
        book.insert(
            "Test",
            FontStyle::Normal,
            FontFace {
                metrics,
                program: FontProgram::Standard {
                    base_font: "Test".to_string(),
                },
            },
        );
        let pdf = ObjectManager::new(book);
        let w = pdf.measure("AV", "Test", 10.0, FontStyle::Normal).unwrap();
        assert!((w - 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_glyph_policy() {
        let strict = manager();
        let err = strict.measure("中", "Helvetica", 12.0, FontStyle::Normal).unwrap_err();
        assert!(matches!(err, FolioError::GlyphNotFound { ch: '中', .. }));

        let lenient = manager().with_glyph_policy(GlyphPolicy::Fallback);
        let w = lenient.measure("中", "Helvetica", 10.0, FontStyle::Normal).unwrap();
        assert!(w > 0.0);
    }

    #[test]
    fn test_fallback_measures_the_substituted_question_mark() {
        let pdf = manager().with_glyph_policy(GlyphPolicy::Fallback);
        let drawn = pdf.measure("a?b", "Helvetica", 12.0, FontStyle::Normal).unwrap();
        let substituted = pdf.measure("a中b", "Helvetica", 12.0, FontStyle::Normal).unwrap();
        assert_eq!(substituted, drawn);
        // '?' is 556 units, the face default is the 278-unit space.
        assert!((pdf.measure("中", "Helvetica", 10.0, FontStyle::Normal).unwrap() - 5.56).abs() < 1e-9);
    }

    #[test]
    fn test_fallback_keeps_encodable_characters_at_default_width() {
        let mut book = FontBook::new();
        book.insert(
            "Test",
            FontStyle::Normal,
            FontFace {
                metrics: FontMetrics::new(500.0).with_width('?', 900.0),
                program: FontProgram::Standard {
                    base_font: "Test".to_string(),
                },
            },
        );
        let pdf = ObjectManager::new(book).with_glyph_policy(GlyphPolicy::Fallback);
        let w = pdf.measure("é", "Test", 10.0, FontStyle::Normal).unwrap();
        assert!((w - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_symbolic_fonts_use_builtin_encoding() {
        let mut pdf = manager();
        let symbol = pdf.register_font("Symbol", FontStyle::Normal).unwrap();
        let body = String::from_utf8_lossy(pdf.body(symbol.object_number).unwrap()).to_string();
        assert_eq!(body, "<< /Type /Font /Subtype /Type1 /BaseFont /Symbol >>");

        let times = pdf.register_font("Times-Roman", FontStyle::BoldItalic).unwrap();
        let body = String::from_utf8_lossy(pdf.body(times.object_number).unwrap()).to_string();
        assert!(body.contains("/BaseFont /Times-BoldItalic /Encoding /WinAnsiEncoding"));
    }

    #[test]
    fn test_trailer_requires_catalog() {
        let mut pdf = manager();
        pdf.add("x");
        assert!(matches!(pdf.build_trailer(0), Err(FolioError::MissingCatalog)));
        let catalog = pdf.add_catalog(1);
        let trailer = pdf.build_trailer(42).unwrap();
        assert_eq!(
            trailer,
            format!("trailer\n<< /Size 3 /Root {} 0 R >>\nstartxref\n42\n%%EOF\n", catalog)
        );
    }

    #[test]
    fn test_info_dictionary() {
        let mut pdf = manager();
        assert_eq!(pdf.add_info(&Metadata::default()), None);
        let meta = Metadata {
            title: Some("Report (draft)".to_string()),
            ..Default::default()
        };
        let info = pdf.add_info(&meta).unwrap();
        let body = String::from_utf8_lossy(pdf.body(info).unwrap()).to_string();
        assert!(body.contains("/Title (Report \\(draft\\))"));
        assert!(body.contains("/Producer (Folio)"));
    }

    #[test]
    fn test_finish_layout() {
        let mut pdf = manager();
        let pages = pdf.add("<< /Type /Pages /Kids [] /Count 0 >>");
        pdf.add_catalog(pages);
        let bytes = pdf.finish().unwrap();
        let text = String::from_utf8_lossy(&bytes).to_string();
        assert!(text.starts_with("%PDF-1.4\n1 0 obj\n"));
        assert!(text.ends_with("%%EOF\n"));
        let startxref: usize = text
            .rsplit("startxref\n")
            .next()
            .and_then(|s| s.lines().next())
            .and_then(|s| s.parse().ok())
            .unwrap();
        assert!(text[startxref..].starts_with("xref\n0 3\n"));
    }
}
