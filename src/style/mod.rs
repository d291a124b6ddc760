//! # Style Primitives
//!
//! Small value types shared by the model, the text shaper, and the
//! renderers: colors, font styles, alignment, edge insets, image fit.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An RGB color with 0-255 channels.
///
/// Out-of-range inputs are clamped with a warning rather than rejected.
/// In JSON a color is written as `[r, g, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Color {
    r: u8,
    g: u8,
    b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };
    pub const WHITE: Color = Color {
        r: 255,
        g: 255,
        b: 255,
    };

    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self {
            r: clamp_channel(r, 'r'),
            g: clamp_channel(g, 'g'),
            b: clamp_channel(b, 'b'),
        }
    }

    pub fn channels(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Perceived-luminance grayscale (30/59/11 weighting).
    pub fn to_grayscale(&self) -> Color {
        let gray = (0.3 * self.r as f64 + 0.59 * self.g as f64 + 0.11 * self.b as f64).round();
        Color::new(gray, gray, gray)
    }

    /// The three fractional operands for `rg` / `RG`, e.g. `1.000 0.000 0.000`.
    pub fn to_pdf_operands(&self) -> String {
        format!(
            "{:.3} {:.3} {:.3}",
            self.r as f64 / 255.0,
            self.g as f64 / 255.0,
            self.b as f64 / 255.0
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl From<[f64; 3]> for Color {
    fn from([r, g, b]: [f64; 3]) -> Self {
        Color::new(r, g, b)
    }
}

impl From<Color> for [f64; 3] {
    fn from(c: Color) -> Self {
        [c.r as f64, c.g as f64, c.b as f64]
    }
}

fn clamp_channel(value: f64, channel: char) -> u8 {
    if !(0.0..=255.0).contains(&value) || value.is_nan() {
        log::warn!(
            "{} value {} is out of range (0-255), clamping to valid range",
            channel,
            value
        );
    }
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, 255.0).round() as u8
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FontStyle {
    #[default]
    Normal,
    Bold,
    Italic,
    BoldItalic,
}

impl FontStyle {
    pub fn is_bold(&self) -> bool {
        matches!(self, FontStyle::Bold | FontStyle::BoldItalic)
    }

    pub fn is_italic(&self) -> bool {
        matches!(self, FontStyle::Italic | FontStyle::BoldItalic)
    }
}

impl fmt::Display for FontStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FontStyle::Normal => "normal",
            FontStyle::Bold => "bold",
            FontStyle::Italic => "italic",
            FontStyle::BoldItalic => "bold-italic",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Insets in points, in top/right/bottom/left order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Edges {
    pub fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub fn uniform(v: f64) -> Self {
        Self::new(v, v, v, v)
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// How an image is scaled into its node box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoxFit {
    /// Stretch to the box, ignoring aspect ratio.
    #[default]
    Fill,
    /// Scale to fit entirely inside the box, centered.
    Contain,
    /// Scale to cover the whole box, centered and clipped.
    Cover,
    /// Natural pixel size, centered and clipped.
    None,
}
