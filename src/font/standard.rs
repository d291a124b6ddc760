//! Built-in metrics for the standard PDF fonts that need no embedding.
//!
//! The text faces (Helvetica, Courier and Times, four styles each) cover
//! every WinAnsi code; oblique Helvetica shares the upright widths. Symbol
//! and ZapfDingbats use their own built-in encodings and are measured by
//! the byte they are written as, so only codes 0x20..0x7E are covered.
//! Anything else has to be loaded from an AFM file or a TrueType program.

use super::{FontBook, FontFace, FontMetrics, FontProgram};
use crate::style::FontStyle;
use crate::text::decode_winansi;

/// Advance widths for U+0020..=U+007E.
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // space../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0..?
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // P.._
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // `..o
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // p..~
];

const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Advance widths for WinAnsi 0x80..=0xFF; 0 marks an unassigned code.
const HELVETICA_HIGH: [u16; 128] = [
    556, 0, 222, 556, 333, 1000, 556, 556, 333, 1000, 667, 333, 1000, 0, 611, 0, // 0x80..0x8F
    0, 222, 222, 333, 333, 350, 556, 1000, 333, 1000, 500, 333, 944, 0, 500, 667, // 0x90..0x9F
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333, // 0xA0..0xAF
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611, // 0xB0..0xBF
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278, // 0xC0..0xCF
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611, // 0xD0..0xDF
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278, // 0xE0..0xEF
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500, // 0xF0..0xFF
];

const HELVETICA_BOLD_HIGH: [u16; 128] = [
    556, 0, 278, 556, 500, 1000, 556, 556, 333, 1000, 667, 333, 1000, 0, 611, 0,
    0, 278, 278, 500, 500, 350, 556, 1000, 333, 1000, 556, 333, 944, 0, 500, 667,
    278, 333, 556, 556, 556, 556, 280, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    400, 584, 333, 333, 333, 611, 556, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    722, 722, 722, 722, 722, 722, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    556, 556, 556, 556, 556, 556, 889, 556, 556, 556, 556, 556, 278, 278, 278, 278,
    611, 611, 611, 611, 611, 611, 611, 584, 611, 611, 611, 611, 611, 556, 611, 556,
];

const TIMES_ROMAN: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

const TIMES_ROMAN_HIGH: [u16; 128] = [
    500, 0, 333, 500, 444, 1000, 500, 500, 333, 1000, 556, 333, 889, 0, 611, 0,
    0, 333, 333, 444, 444, 350, 500, 1000, 333, 980, 389, 333, 722, 0, 444, 722,
    250, 333, 500, 500, 500, 500, 200, 500, 333, 760, 276, 500, 564, 333, 760, 333,
    400, 564, 300, 300, 333, 500, 453, 250, 333, 300, 310, 500, 750, 750, 750, 444,
    722, 722, 722, 722, 722, 722, 889, 667, 611, 611, 611, 611, 333, 333, 333, 333,
    722, 722, 722, 722, 722, 722, 722, 564, 722, 722, 722, 722, 722, 722, 556, 500,
    444, 444, 444, 444, 444, 444, 667, 444, 444, 444, 444, 444, 278, 278, 278, 278,
    500, 500, 500, 500, 500, 500, 500, 564, 500, 500, 500, 500, 500, 500, 500, 500,
];

const TIMES_BOLD: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    930, 722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778,
    611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, 333, 278, 333, 581, 500,
    333, 500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, 556, 500,
    556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,
];

const TIMES_BOLD_HIGH: [u16; 128] = [
    500, 0, 333, 500, 500, 1000, 500, 500, 333, 1000, 556, 333, 1000, 0, 667, 0,
    0, 333, 333, 500, 500, 350, 500, 1000, 333, 1000, 389, 333, 722, 0, 444, 722,
    250, 333, 500, 500, 500, 500, 220, 500, 333, 747, 300, 500, 570, 333, 747, 333,
    400, 570, 300, 300, 333, 556, 540, 250, 333, 300, 330, 500, 750, 750, 750, 500,
    722, 722, 722, 722, 722, 722, 1000, 722, 667, 667, 667, 667, 389, 389, 389, 389,
    722, 722, 778, 778, 778, 778, 778, 570, 778, 722, 722, 722, 722, 722, 611, 556,
    500, 500, 500, 500, 500, 500, 722, 444, 444, 444, 444, 444, 278, 278, 278, 278,
    500, 556, 500, 500, 500, 500, 500, 570, 500, 556, 556, 556, 556, 500, 556, 500,
];

const TIMES_ITALIC: [u16; 95] = [
    250, 333, 420, 500, 500, 833, 778, 214, 333, 333, 500, 675, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 675, 675, 675, 500,
    920, 611, 611, 667, 722, 611, 611, 722, 722, 333, 444, 667, 556, 833, 667, 722,
    611, 722, 611, 500, 556, 722, 611, 833, 611, 556, 556, 389, 278, 389, 422, 500,
    333, 500, 500, 444, 500, 444, 278, 500, 500, 278, 278, 444, 278, 722, 500, 500,
    500, 500, 389, 389, 278, 500, 444, 667, 444, 444, 389, 400, 275, 400, 541,
];

const TIMES_ITALIC_HIGH: [u16; 128] = [
    500, 0, 333, 500, 556, 889, 500, 500, 333, 1000, 500, 333, 944, 0, 556, 0,
    0, 333, 333, 556, 556, 350, 500, 889, 333, 980, 389, 333, 667, 0, 389, 556,
    250, 389, 500, 500, 500, 500, 275, 500, 333, 760, 276, 500, 675, 333, 760, 333,
    400, 675, 300, 300, 333, 500, 523, 250, 333, 300, 310, 500, 750, 750, 750, 500,
    611, 611, 611, 611, 611, 611, 889, 667, 611, 611, 611, 611, 333, 333, 333, 333,
    722, 667, 722, 722, 722, 722, 722, 675, 722, 722, 722, 722, 722, 556, 611, 500,
    500, 500, 500, 500, 500, 500, 667, 444, 444, 444, 444, 444, 278, 278, 278, 278,
    500, 500, 500, 500, 500, 500, 500, 675, 500, 500, 500, 500, 500, 444, 500, 444,
];

const TIMES_BOLD_ITALIC: [u16; 95] = [
    250, 389, 555, 500, 500, 833, 778, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    832, 667, 667, 667, 722, 667, 667, 722, 778, 389, 500, 667, 611, 889, 722, 722,
    611, 722, 667, 556, 611, 722, 667, 889, 667, 611, 611, 333, 278, 333, 570, 500,
    333, 500, 500, 444, 500, 444, 333, 500, 556, 278, 278, 500, 278, 778, 556, 500,
    500, 500, 389, 389, 278, 556, 444, 667, 500, 444, 389, 348, 220, 348, 570,
];

const TIMES_BOLD_ITALIC_HIGH: [u16; 128] = [
    500, 0, 333, 500, 500, 1000, 500, 500, 333, 1000, 556, 333, 944, 0, 611, 0,
    0, 333, 333, 500, 500, 350, 500, 1000, 333, 1000, 389, 333, 722, 0, 389, 611,
    250, 389, 500, 500, 500, 500, 220, 500, 333, 747, 266, 500, 606, 333, 747, 333,
    400, 570, 300, 300, 333, 576, 500, 250, 333, 300, 300, 500, 750, 750, 750, 500,
    667, 667, 667, 667, 667, 667, 944, 667, 667, 667, 667, 667, 389, 389, 389, 389,
    722, 722, 722, 722, 722, 722, 722, 570, 722, 722, 722, 722, 722, 611, 611, 500,
    500, 500, 500, 500, 500, 500, 722, 444, 444, 444, 444, 444, 278, 278, 278, 278,
    500, 556, 500, 500, 500, 500, 500, 570, 500, 556, 556, 556, 556, 444, 500, 444,
];

/// Symbol and ZapfDingbats by built-in code, 0x20..=0x7E.
const SYMBOL: [u16; 95] = [
    250, 333, 713, 500, 549, 833, 778, 439, 333, 333, 500, 549, 250, 549, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 549, 549, 549, 444,
    549, 722, 667, 722, 612, 611, 763, 603, 722, 333, 631, 722, 686, 889, 722, 722,
    768, 741, 556, 592, 611, 690, 439, 768, 645, 795, 611, 333, 863, 333, 658, 500,
    500, 631, 549, 549, 494, 439, 521, 411, 603, 329, 603, 549, 549, 576, 521, 549,
    549, 521, 549, 603, 439, 576, 713, 686, 493, 686, 494, 480, 200, 480, 549,
];

const ZAPF_DINGBATS: [u16; 95] = [
    278, 974, 961, 974, 980, 719, 789, 790, 791, 690, 960, 939, 549, 855, 911, 933,
    911, 945, 974, 755, 846, 762, 761, 571, 677, 763, 760, 759, 754, 494, 552, 537,
    577, 692, 786, 788, 788, 790, 793, 794, 816, 823, 789, 841, 823, 833, 816, 831,
    923, 744, 723, 749, 790, 792, 695, 776, 768, 792, 759, 707, 708, 682, 701, 826,
    815, 789, 789, 707, 687, 696, 689, 786, 787, 713, 791, 785, 791, 873, 761, 762,
    762, 759, 759, 892, 892, 788, 784, 438, 138, 277, 415, 392, 392, 668, 668,
];

/// The most visible Helvetica kerning pairs.
const HELVETICA_KERNING: &[(char, char, i16)] = &[
    ('A', 'T', -120),
    ('A', 'V', -70),
    ('A', 'W', -50),
    ('A', 'Y', -100),
    ('A', 'v', -40),
    ('A', 'w', -40),
    ('A', 'y', -40),
    ('F', 'A', -80),
    ('F', ',', -150),
    ('F', '.', -150),
    ('L', 'T', -110),
    ('L', 'V', -110),
    ('L', 'W', -70),
    ('L', 'Y', -140),
    ('P', 'A', -120),
    ('P', ',', -180),
    ('P', '.', -180),
    ('T', 'A', -120),
    ('T', 'a', -120),
    ('T', 'e', -120),
    ('T', 'o', -120),
    ('T', ',', -120),
    ('T', '.', -120),
    ('V', 'A', -80),
    ('V', 'a', -70),
    ('V', 'e', -80),
    ('V', 'o', -80),
    ('W', 'A', -50),
    ('W', 'a', -40),
    ('W', 'e', -30),
    ('W', 'o', -30),
    ('Y', 'A', -110),
    ('Y', 'a', -140),
    ('Y', 'e', -140),
    ('Y', 'o', -140),
];

fn ascii_table(widths: &[u16; 95]) -> FontMetrics {
    let mut metrics = FontMetrics::new(widths[0] as f64);
    for (i, &w) in widths.iter().enumerate() {
        if let Some(ch) = char::from_u32(0x20 + i as u32) {
            metrics.set_width(ch, w as f64);
        }
    }
    metrics
}

fn winansi_table(
    ascii: &[u16; 95],
    high: &[u16; 128],
    kerning: &[(char, char, i16)],
) -> FontMetrics {
    let mut metrics = ascii_table(ascii);
    for (i, &w) in high.iter().enumerate() {
        if w == 0 {
            continue;
        }
        if let Some(ch) = decode_winansi(0x80 + i as u8) {
            metrics.set_width(ch, w as f64);
        }
    }
    for &(l, r, k) in kerning {
        metrics.set_kerning(l, r, k as f64);
    }
    metrics
}

fn monospace(width: f64) -> FontMetrics {
    let mut metrics = FontMetrics::new(width);
    metrics.ascent = 629.0;
    metrics.descent = -157.0;
    metrics.cap_height = 562.0;
    for code in 0x20u8..=0xFF {
        if let Some(ch) = decode_winansi(code) {
            metrics.set_width(ch, width);
        }
    }
    metrics
}

fn symbolic(widths: &[u16; 95], ascent: f64, descent: f64) -> FontMetrics {
    let mut metrics = ascii_table(widths);
    metrics.ascent = ascent;
    metrics.descent = descent;
    metrics.cap_height = ascent;
    metrics
}

/// Faces drawn through their built-in encoding rather than WinAnsi.
pub(crate) fn is_symbolic(base_font: &str) -> bool {
    matches!(base_font, "Symbol" | "ZapfDingbats")
}

fn standard(base_font: &str, metrics: FontMetrics) -> FontFace {
    FontFace {
        metrics,
        program: FontProgram::Standard {
            base_font: base_font.to_string(),
        },
    }
}

pub(crate) fn register_all(book: &mut FontBook) {
    let helvetica = [
        (FontStyle::Normal, "Helvetica", &HELVETICA, &HELVETICA_HIGH, HELVETICA_KERNING),
        (FontStyle::Italic, "Helvetica-Oblique", &HELVETICA, &HELVETICA_HIGH, HELVETICA_KERNING),
        (FontStyle::Bold, "Helvetica-Bold", &HELVETICA_BOLD, &HELVETICA_BOLD_HIGH, &[][..]),
        (
            FontStyle::BoldItalic,
            "Helvetica-BoldOblique",
            &HELVETICA_BOLD,
            &HELVETICA_BOLD_HIGH,
            &[][..],
        ),
    ];
    for (style, base, ascii, high, kerning) in helvetica {
        book.insert("Helvetica", style, standard(base, winansi_table(ascii, high, kerning)));
    }

    let courier = [
        (FontStyle::Normal, "Courier"),
        (FontStyle::Bold, "Courier-Bold"),
        (FontStyle::Italic, "Courier-Oblique"),
        (FontStyle::BoldItalic, "Courier-BoldOblique"),
    ];
    for (style, base) in courier {
        book.insert("Courier", style, standard(base, monospace(600.0)));
    }

    let times = [
        (FontStyle::Normal, "Times-Roman", &TIMES_ROMAN, &TIMES_ROMAN_HIGH),
        (FontStyle::Bold, "Times-Bold", &TIMES_BOLD, &TIMES_BOLD_HIGH),
        (FontStyle::Italic, "Times-Italic", &TIMES_ITALIC, &TIMES_ITALIC_HIGH),
        (
            FontStyle::BoldItalic,
            "Times-BoldItalic",
            &TIMES_BOLD_ITALIC,
            &TIMES_BOLD_ITALIC_HIGH,
        ),
    ];
    for (style, base, ascii, high) in times {
        let mut metrics = winansi_table(ascii, high, &[]);
        metrics.ascent = 683.0;
        metrics.descent = -217.0;
        metrics.cap_height = 662.0;
        for family in ["Times-Roman", "Times"] {
            book.insert(family, style, standard(base, metrics.clone()));
        }
    }

    book.insert(
        "Symbol",
        FontStyle::Normal,
        standard("Symbol", symbolic(&SYMBOL, 1010.0, -293.0)),
    );
    let dingbats = symbolic(&ZAPF_DINGBATS, 820.0, -143.0);
    for family in ["ZapfDingbats", "ITC Zapf Dingbats"] {
        book.insert(family, FontStyle::Normal, standard("ZapfDingbats", dingbats.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STYLES: [FontStyle; 4] = [
        FontStyle::Normal,
        FontStyle::Bold,
        FontStyle::Italic,
        FontStyle::BoldItalic,
    ];

    #[test]
    fn test_text_faces_cover_every_winansi_code() {
        let book = FontBook::standard();
        for family in ["Helvetica", "Courier", "Times-Roman", "Times"] {
            for style in ALL_STYLES {
                let m = book.metrics(family, style).unwrap();
                for code in 0x20u8..=0xFF {
                    if let Some(ch) = decode_winansi(code) {
                        assert!(m.advance(ch).is_some(), "{} {:?} missing {:?}", family, style, ch);
                    }
                }
            }
        }
    }

    #[test]
    fn test_latin1_widths() {
        let book = FontBook::standard();
        let helvetica = book.metrics("Helvetica", FontStyle::Normal).unwrap();
        assert_eq!(helvetica.advance('é'), Some(556.0));
        assert_eq!(helvetica.advance('€'), Some(556.0));
        assert_eq!(helvetica.advance('—'), Some(1000.0));
        let times_bold = book.metrics("Times-Roman", FontStyle::Bold).unwrap();
        assert_eq!(times_bold.advance('W'), Some(1000.0));
        assert_eq!(times_bold.advance('ü'), Some(556.0));
    }

    #[test]
    fn test_times_styles_have_their_own_base_fonts() {
        let book = FontBook::standard();
        let expected = ["Times-Roman", "Times-Bold", "Times-Italic", "Times-BoldItalic"];
        for (style, name) in ALL_STYLES.into_iter().zip(expected) {
            match &book.face("Times", style).unwrap().program {
                FontProgram::Standard { base_font } => assert_eq!(base_font, name),
                _ => panic!("Times should be a standard font"),
            }
        }
    }

    #[test]
    fn test_symbolic_faces_registered() {
        let book = FontBook::standard();
        let symbol = book.metrics("Symbol", FontStyle::Normal).unwrap();
        assert_eq!(symbol.advance('a'), Some(631.0));
        let dingbats = book.metrics("ITC Zapf Dingbats", FontStyle::Normal).unwrap();
        assert_eq!(dingbats.advance('!'), Some(974.0));
        assert!(is_symbolic("ZapfDingbats"));
        assert!(!is_symbolic("Times-Roman"));
    }

    #[test]
    fn test_helvetica_kerning_av() {
        let book = FontBook::standard();
        let m = book.metrics("Helvetica", FontStyle::Normal).unwrap();
        assert_eq!(m.kerning('A', 'V'), -70.0);
    }

    #[test]
    fn test_courier_is_monospaced() {
        let book = FontBook::standard();
        let m = book.metrics("Courier", FontStyle::Bold).unwrap();
        assert_eq!(m.advance('i'), m.advance('W'));
        assert_eq!(m.advance('ß'), Some(600.0));
    }

    #[test]
    fn test_base_font_names() {
        let book = FontBook::standard();
        match &book.face("Helvetica", FontStyle::BoldItalic).unwrap().program {
            FontProgram::Standard { base_font } => assert_eq!(base_font, "Helvetica-BoldOblique"),
            _ => panic!("Helvetica should be a standard font"),
        }
    }
}
