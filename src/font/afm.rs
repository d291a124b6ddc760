//! Adobe Font Metrics (AFM) parsing.
//!
//! Reads `FontName`, the vertical metrics, `C ... ; WX ... ; N ...` glyph
//! lines and `KPX` kerning pairs. Glyph names are mapped to characters
//! through the Adobe names used by WinAnsi text; unknown names are skipped.

use std::collections::HashMap;

use super::FontMetrics;
use crate::error::{FolioError, Result};

/// A parsed AFM file.
#[derive(Debug, Clone)]
pub struct AfmFont {
    pub font_name: String,
    pub metrics: FontMetrics,
}

pub fn parse(text: &str) -> Result<AfmFont> {
    let mut font_name = None;
    let mut widths: Vec<(char, f64)> = Vec::new();
    let mut names: HashMap<String, char> = HashMap::new();
    let mut pairs: Vec<(String, String, f64)> = Vec::new();
    let mut ascent = None;
    let mut descent = None;
    let mut cap_height = None;
    let mut in_metrics = false;

    for line in text.lines() {
        let line = line.trim();
        if line.starts_with("StartCharMetrics") {
            in_metrics = true;
            continue;
        }
        if line.starts_with("EndCharMetrics") {
            in_metrics = false;
            continue;
        }

        if in_metrics {
            if let Some((name, wx)) = parse_char_metrics(line) {
                if let Some(ch) = glyph_to_char(&name) {
                    widths.push((ch, wx));
                    names.insert(name, ch);
                }
            }
            continue;
        }

        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("FontName") => font_name = parts.next().map(str::to_string),
            Some("Ascender") => ascent = parts.next().and_then(|v| v.parse().ok()),
            Some("Descender") => descent = parts.next().and_then(|v| v.parse().ok()),
            Some("CapHeight") => cap_height = parts.next().and_then(|v| v.parse().ok()),
            Some("KPX") => {
                let (Some(l), Some(r), Some(k)) = (parts.next(), parts.next(), parts.next()) else {
                    continue;
                };
                if let Ok(k) = k.parse::<f64>() {
                    pairs.push((l.to_string(), r.to_string(), k));
                }
            }
            _ => {}
        }
    }

    let font_name = font_name.ok_or_else(|| FolioError::FontParse("AFM file has no FontName".to_string()))?;
    if widths.is_empty() {
        return Err(FolioError::FontParse(format!(
            "AFM file for {} has no character metrics",
            font_name
        )));
    }

    let default_width = widths
        .iter()
        .find(|(ch, _)| *ch == ' ')
        .map(|(_, w)| *w)
        .unwrap_or(500.0);
    let mut metrics = FontMetrics::new(default_width);
    for (ch, w) in widths {
        metrics.set_width(ch, w);
    }
    for (l, r, k) in pairs {
        if let (Some(&l), Some(&r)) = (names.get(&l), names.get(&r)) {
            metrics.set_kerning(l, r, k);
        }
    }
    if let Some(a) = ascent {
        metrics.ascent = a;
    }
    if let Some(d) = descent {
        metrics.descent = d;
    }
    metrics.cap_height = cap_height.unwrap_or(metrics.ascent);

    Ok(AfmFont { font_name, metrics })
}

/// `C 65 ; WX 667 ; N A ; B 14 0 654 718 ;` -> `("A", 667.0)`
fn parse_char_metrics(line: &str) -> Option<(String, f64)> {
    let mut name = None;
    let mut wx = None;
    for part in line.split(';') {
        let part = part.trim();
        if let Some(v) = part.strip_prefix("WX ") {
            wx = v.trim().parse::<f64>().ok();
        } else if let Some(v) = part.strip_prefix("N ") {
            name = Some(v.trim().to_string());
        }
    }
    Some((name?, wx?))
}

const GLYPH_NAMES: &[(&str, char)] = &[
    ("space", ' '),
    ("exclam", '!'),
    ("quotedbl", '"'),
    ("numbersign", '#'),
    ("dollar", '$'),
    ("percent", '%'),
    ("ampersand", '&'),
    ("quotesingle", '\''),
    ("parenleft", '('),
    ("parenright", ')'),
    ("asterisk", '*'),
    ("plus", '+'),
    ("comma", ','),
    ("hyphen", '-'),
    ("period", '.'),
    ("slash", '/'),
    ("zero", '0'),
    ("one", '1'),
    ("two", '2'),
    ("three", '3'),
    ("four", '4'),
    ("five", '5'),
    ("six", '6'),
    ("seven", '7'),
    ("eight", '8'),
    ("nine", '9'),
    ("colon", ':'),
    ("semicolon", ';'),
    ("less", '<'),
    ("equal", '='),
    ("greater", '>'),
    ("question", '?'),
    ("at", '@'),
    ("bracketleft", '['),
    ("backslash", '\\'),
    ("bracketright", ']'),
    ("asciicircum", '^'),
    ("underscore", '_'),
    ("grave", '`'),
    ("braceleft", '{'),
    ("bar", '|'),
    ("braceright", '}'),
    ("asciitilde", '~'),
    ("quoteleft", '\u{2018}'),
    ("quoteright", '\u{2019}'),
    ("quotedblleft", '\u{201C}'),
    ("quotedblright", '\u{201D}'),
    ("quotesinglbase", '\u{201A}'),
    ("quotedblbase", '\u{201E}'),
    ("endash", '\u{2013}'),
    ("emdash", '\u{2014}'),
    ("bullet", '\u{2022}'),
    ("ellipsis", '\u{2026}'),
    ("dagger", '\u{2020}'),
    ("daggerdbl", '\u{2021}'),
    ("perthousand", '\u{2030}'),
    ("trademark", '\u{2122}'),
    ("Euro", '\u{20AC}'),
    ("florin", '\u{0192}'),
    ("exclamdown", '¡'),
    ("cent", '¢'),
    ("sterling", '£'),
    ("currency", '¤'),
    ("yen", '¥'),
    ("brokenbar", '¦'),
    ("section", '§'),
    ("dieresis", '¨'),
    ("copyright", '©'),
    ("ordfeminine", 'ª'),
    ("guillemotleft", '«'),
    ("logicalnot", '¬'),
    ("registered", '®'),
    ("macron", '¯'),
    ("degree", '°'),
    ("plusminus", '±'),
    ("acute", '´'),
    ("mu", 'µ'),
    ("paragraph", '¶'),
    ("periodcentered", '·'),
    ("cedilla", '¸'),
    ("ordmasculine", 'º'),
    ("guillemotright", '»'),
    ("questiondown", '¿'),
    ("multiply", '×'),
    ("divide", '÷'),
    ("germandbls", 'ß'),
    ("ae", 'æ'),
    ("AE", 'Æ'),
    ("oslash", 'ø'),
    ("Oslash", 'Ø'),
    ("ccedilla", 'ç'),
    ("Ccedilla", 'Ç'),
    ("eth", 'ð'),
    ("Eth", 'Ð'),
    ("thorn", 'þ'),
    ("Thorn", 'Þ'),
];

/// Accented letters named `<base><accent>`, e.g. `eacute` -> é.
const ACCENTS: &[(&str, [char; 6])] = &[
    // a, e, i, o, u, y  (NUL marks a combination WinAnsi lacks)
    ("grave", ['à', 'è', 'ì', 'ò', 'ù', '\0']),
    ("acute", ['á', 'é', 'í', 'ó', 'ú', 'ý']),
    ("circumflex", ['â', 'ê', 'î', 'ô', 'û', '\0']),
    ("dieresis", ['ä', 'ë', 'ï', 'ö', 'ü', 'ÿ']),
    ("tilde", ['ã', '\0', '\0', 'õ', '\0', '\0']),
    ("ring", ['å', '\0', '\0', '\0', '\0', '\0']),
];

fn glyph_to_char(name: &str) -> Option<char> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_alphabetic() {
            return Some(c);
        }
    }
    if let Some(&(_, ch)) = GLYPH_NAMES.iter().find(|(n, _)| *n == name) {
        return Some(ch);
    }
    if let Some(hex) = name.strip_prefix("uni") {
        if hex.len() == 4 {
            return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
        }
    }
    if name == "ntilde" || name == "Ntilde" {
        return Some(if name.starts_with('N') { 'Ñ' } else { 'ñ' });
    }

    let mut it = name.chars();
    let base = it.next()?;
    let accent = it.as_str();
    let idx = "aeiouy".find(base.to_ascii_lowercase())?;
    let (_, row) = ACCENTS.iter().find(|(a, _)| *a == accent)?;
    let lower = row[idx];
    if lower == '\0' {
        return None;
    }
    if base.is_ascii_uppercase() {
        lower.to_uppercase().next()
    } else {
        Some(lower)
    }
}
