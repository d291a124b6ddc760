//! # Folio CLI
//!
//! Usage:
//!   folio input.json -o output.pdf
//!   echo '{ ... }' | folio -o output.pdf
//!   folio --example > letter.json
//!   folio input.json --afm Garamond:Normal:garamond.afm --ttf Inter:Bold:Inter-Bold.ttf
//!
//! Set `RUST_LOG=debug` for layout and object allocation traces.

use std::env;
use std::fs;
use std::io::{self, Read};
use std::process;

use folio::font::FontBook;
use folio::style::FontStyle;
use folio::{Document, FolioError};

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--example") {
        print!("{}", example_document_json());
        return;
    }

    if let Err(e) = run(&args) {
        eprintln!("✗ {}", e);
        process::exit(1);
    }
}

fn run(args: &[String]) -> Result<(), FolioError> {
    let input = if args.len() > 1 && !args[1].starts_with('-') {
        fs::read_to_string(&args[1])?
    } else {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    };

    let output_path = flag_values(args, "-o")
        .last()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "output.pdf".to_string());

    let mut fonts = FontBook::standard();
    for spec in flag_values(args, "--afm") {
        let (family, style, path) = parse_font_arg(spec)?;
        fonts.load_afm(family, style, &fs::read_to_string(path)?)?;
        log::info!("loaded AFM metrics for {} ({}) from {}", family, style, path);
    }
    for spec in flag_values(args, "--ttf") {
        let (family, style, path) = parse_font_arg(spec)?;
        fonts.load_truetype(family, style, fs::read(path)?)?;
        log::info!("loaded TrueType font {} ({}) from {}", family, style, path);
    }

    let document: Document = serde_json::from_str(&input)?;
    let pdf_bytes = folio::render_with_fonts(&document, fonts)?;
    fs::write(&output_path, &pdf_bytes)?;
    eprintln!("✓ Written {} bytes to {}", pdf_bytes.len(), output_path);
    Ok(())
}

/// Every value following an occurrence of `flag`.
fn flag_values<'a>(args: &'a [String], flag: &str) -> Vec<&'a String> {
    args.windows(2).filter(|w| w[0] == flag).map(|w| &w[1]).collect()
}

/// `family:style:path`, e.g. `Garamond:BoldItalic:fonts/garamond-bi.afm`.
fn parse_font_arg(spec: &str) -> Result<(&str, FontStyle, &str), FolioError> {
    let mut parts = spec.splitn(3, ':');
    let (Some(family), Some(style), Some(path)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(FolioError::FontParse(format!(
            "expected family:style:path, got '{}'",
            spec
        )));
    };
    let style = match style.to_ascii_lowercase().as_str() {
        "normal" | "regular" => FontStyle::Normal,
        "bold" => FontStyle::Bold,
        "italic" => FontStyle::Italic,
        "bolditalic" | "bold-italic" => FontStyle::BoldItalic,
        other => {
            return Err(FolioError::FontParse(format!(
                "unknown font style '{}' (use Normal, Bold, Italic or BoldItalic)",
                other
            )))
        }
    };
    Ok((family, style, path))
}

fn example_document_json() -> &'static str {
    r##"{
  "metadata": {
    "title": "Quarterly Letter",
    "author": "Folio"
  },
  "children": [
    {
      "type": "Page",
      "config": { "size": "A4", "orientation": "Portrait" },
      "children": [
        {
          "type": "Padding",
          "margin": { "top": 54, "right": 54, "bottom": 24, "left": 54 },
          "child": {
            "type": "Text",
            "content": "Quarterly Letter",
            "fontSize": 28,
            "fontStyle": "Bold",
            "color": [30, 30, 45]
          }
        },
        {
          "type": "Line",
          "x": 54,
          "y": 0,
          "xEnd": 54,
          "yEnd": 0,
          "color": [180, 180, 190],
          "strokeWidth": 0.5
        },
        {
          "type": "Padding",
          "margin": { "top": 18, "right": 54, "bottom": 18, "left": 54 },
          "child": {
            "type": "Text",
            "content": [
              { "content": "Revenue grew " },
              { "content": "18%", "fontStyle": "Bold", "color": [20, 120, 60] },
              { "content": " over the quarter, driven by renewals in every region and a steady pipeline of new accounts." }
            ],
            "fontSize": 11
          }
        },
        {
          "type": "Expanded",
          "flex": 1,
          "child": {
            "type": "Padding",
            "margin": { "top": 0, "right": 54, "bottom": 0, "left": 54 },
            "child": {
              "type": "Rectangle",
              "color": [200, 200, 210],
              "backgroundColor": [245, 245, 250],
              "borderWidth": 1,
              "children": [
                {
                  "type": "Padding",
                  "margin": { "top": 12, "right": 12, "bottom": 12, "left": 12 },
                  "child": {
                    "type": "Text",
                    "content": "Notes",
                    "fontSize": 10,
                    "color": [100, 100, 110]
                  }
                }
              ]
            }
          }
        },
        {
          "type": "Padding",
          "margin": { "top": 12, "right": 54, "bottom": 54, "left": 54 },
          "child": {
            "type": "Text",
            "content": "Page 1",
            "fontSize": 9,
            "align": "Right",
            "color": [140, 140, 150]
          }
        }
      ]
    }
  ]
}
"##
}
