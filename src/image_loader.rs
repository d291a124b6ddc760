//! # Image Loading and Decoding
//!
//! Resolves an image source (file path, data URI, or raw base64) to bytes
//! and prepares them for embedding. JPEG passes through untouched for
//! `/DCTDecode`. PNG is decoded, composited onto white, and re-compressed
//! as 8-bit RGB samples for `/FlateDecode`.

use std::io::Cursor;

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::error::{FolioError, Result};
use crate::model::ImageSource;
use crate::pdf::{ColorSpace, ImageEncoding};

/// An image ready for [`ObjectManager::register_image`](crate::pdf::ObjectManager::register_image).
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub width_px: u32,
    pub height_px: u32,
    pub encoding: ImageEncoding,
    /// The stream payload, already in `encoding`.
    pub data: Vec<u8>,
}

impl LoadedImage {
    pub fn aspect_ratio(&self) -> f64 {
        if self.height_px == 0 {
            1.0
        } else {
            self.width_px as f64 / self.height_px as f64
        }
    }
}

pub fn load_image(source: &ImageSource) -> Result<LoadedImage> {
    let bytes = match source {
        ImageSource::Src(src) => read_source_bytes(src)?,
        ImageSource::Bytes(bytes) => bytes.clone(),
    };
    decode_image_bytes(&bytes)
}

/// Resolve a source string to raw image bytes.
///
/// `data:image/...;base64,` URIs are decoded, explicit paths (`/`, `./`,
/// `../`, or a `.png`/`.jpg`/`.jpeg` suffix) are read from disk, anything
/// else is treated as raw base64.
fn read_source_bytes(src: &str) -> Result<Vec<u8>> {
    if src.starts_with("data:image/") {
        let comma = src
            .find(',')
            .ok_or_else(|| FolioError::ImageDecode("invalid data URI: missing comma".to_string()))?;
        return base64_decode(&src[comma + 1..]);
    }

    let lower = src.to_ascii_lowercase();
    let looks_like_path = src.starts_with('/')
        || src.starts_with("./")
        || src.starts_with("../")
        || [".png", ".jpg", ".jpeg", ".bmp", ".gif", ".webp"]
            .iter()
            .any(|ext| lower.ends_with(ext));
    if looks_like_path {
        log::debug!("reading image file {}", src);
        return Ok(std::fs::read(src)?);
    }

    base64_decode(src)
}

fn base64_decode(input: &str) -> Result<Vec<u8>> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(input.trim())
        .map_err(|e| FolioError::ImageDecode(format!("base64 decode error: {}", e)))
}

/// Detect the format from magic bytes and decode accordingly.
pub fn decode_image_bytes(data: &[u8]) -> Result<LoadedImage> {
    if data.is_empty() {
        return Err(FolioError::MissingImageData);
    }
    if is_jpeg(data) {
        decode_jpeg(data)
    } else if is_png(data) {
        decode_png(data)
    } else {
        Err(FolioError::UnsupportedImage(describe_unsupported(data).to_string()))
    }
}

fn is_jpeg(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8
}

fn is_png(data: &[u8]) -> bool {
    data.len() >= 4 && data[..4] == [0x89, 0x50, 0x4E, 0x47]
}

fn describe_unsupported(data: &[u8]) -> &'static str {
    if data.starts_with(b"BM") {
        "BMP is not supported, convert to PNG or JPEG"
    } else if data.starts_with(b"GIF8") {
        "GIF is not supported, convert to PNG or JPEG"
    } else if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        "WebP is not supported, convert to PNG or JPEG"
    } else {
        "expected JPEG or PNG data"
    }
}

/// JPEG: read dimensions without decoding pixels.
fn decode_jpeg(data: &[u8]) -> Result<LoadedImage> {
    let reader = image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| FolioError::ImageDecode(format!("JPEG format detection: {}", e)))?;
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| FolioError::ImageDecode(format!("JPEG dimensions: {}", e)))?;

    Ok(LoadedImage {
        width_px: width,
        height_px: height,
        encoding: ImageEncoding::Dct(detect_jpeg_color_space(data)),
        data: data.to_vec(),
    })
}

/// Walk the JPEG markers to the start-of-frame segment and read its
/// component count. One component is grayscale; anything else is treated
/// as RGB.
fn detect_jpeg_color_space(data: &[u8]) -> ColorSpace {
    let mut i = 2;
    while i + 1 < data.len() {
        if data[i] != 0xFF {
            break;
        }
        let marker = data[i + 1];
        let is_sof = matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF);
        if is_sof && i + 9 < data.len() {
            return if data[i + 9] == 1 {
                ColorSpace::DeviceGray
            } else {
                ColorSpace::DeviceRGB
            };
        }
        if i + 3 < data.len() {
            let seg_len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
            i += 2 + seg_len;
        } else {
            break;
        }
    }
    ColorSpace::DeviceRGB
}

/// PNG: decode to RGBA, blend alpha against white, compress the RGB samples.
fn decode_png(data: &[u8]) -> Result<LoadedImage> {
    let reader = image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| FolioError::ImageDecode(format!("PNG format detection: {}", e)))?;
    let img = reader
        .decode()
        .map_err(|e| FolioError::ImageDecode(format!("PNG decode: {}", e)))?;

    let rgba = img.to_rgba8();
    let (width, height) = (rgba.width(), rgba.height());

    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    for pixel in rgba.pixels() {
        let a = pixel[3] as u32;
        for c in &pixel.0[..3] {
            rgb.push(((*c as u32 * a + 255 * (255 - a)) / 255) as u8);
        }
    }
    if rgb.is_empty() {
        return Err(FolioError::MissingImageData);
    }

    Ok(LoadedImage {
        width_px: width,
        height_px: height,
        encoding: ImageEncoding::Flate(ColorSpace::DeviceRGB),
        data: compress_to_vec_zlib(&rgb, 6),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(pixel: [u8; 4]) -> Vec<u8> {
        let mut img = image::RgbaImage::new(1, 1);
        img.put_pixel(0, 0, image::Rgba(pixel));
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(encoder, img.as_raw(), 1, 1, image::ColorType::Rgba8).unwrap();
        buf
    }

    fn inflate(data: &[u8]) -> Vec<u8> {
        miniz_oxide::inflate::decompress_to_vec_zlib(data).unwrap()
    }

    #[test]
    fn test_magic_bytes() {
        assert!(is_jpeg(&[0xFF, 0xD8, 0xFF, 0xE0]));
        assert!(!is_jpeg(&[0x89, 0x50, 0x4E, 0x47]));
        assert!(is_png(&[0x89, 0x50, 0x4E, 0x47]));
        assert!(!is_png(&[0x89, 0x50]));
    }

    #[test]
    fn test_empty_data_is_missing() {
        assert!(matches!(decode_image_bytes(&[]), Err(FolioError::MissingImageData)));
    }

    #[test]
    fn test_unsupported_formats() {
        let err = decode_image_bytes(b"GIF89a....").unwrap_err();
        assert!(matches!(err, FolioError::UnsupportedImage(ref m) if m.contains("GIF")));
        let err = decode_image_bytes(&[0, 1, 2, 3, 4]).unwrap_err();
        assert!(matches!(err, FolioError::UnsupportedImage(_)));
    }

    #[test]
    fn test_invalid_data_uri() {
        let src = ImageSource::Src("data:image/png;base64".to_string());
        assert!(matches!(load_image(&src), Err(FolioError::ImageDecode(_))));
    }

    #[test]
    fn test_png_becomes_flate_rgb() {
        let loaded = decode_image_bytes(&png_bytes([255, 0, 0, 255])).unwrap();
        assert_eq!((loaded.width_px, loaded.height_px), (1, 1));
        assert_eq!(loaded.encoding, ImageEncoding::Flate(ColorSpace::DeviceRGB));
        assert_eq!(inflate(&loaded.data), vec![255, 0, 0]);
    }

    #[test]
    fn test_png_alpha_blends_onto_white() {
        let loaded = decode_image_bytes(&png_bytes([0, 0, 0, 0])).unwrap();
        assert_eq!(inflate(&loaded.data), vec![255, 255, 255]);
    }

    #[test]
    fn test_jpeg_passthrough() {
        let img = image::RgbImage::from_fn(2, 2, |_, _| image::Rgb([0, 128, 255]));
        let mut buf = Vec::new();
        let encoder = image::codecs::jpeg::JpegEncoder::new(&mut buf);
        image::ImageEncoder::write_image(encoder, img.as_raw(), 2, 2, image::ColorType::Rgb8).unwrap();

        let loaded = decode_image_bytes(&buf).unwrap();
        assert_eq!((loaded.width_px, loaded.height_px), (2, 2));
        assert_eq!(loaded.encoding, ImageEncoding::Dct(ColorSpace::DeviceRGB));
        assert_eq!(loaded.data, buf);
    }

    #[test]
    fn test_base64_data_uri_and_raw_bytes() {
        use base64::Engine;
        let png = png_bytes([0, 255, 0, 255]);
        let uri = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&png)
        );
        let from_uri = load_image(&ImageSource::Src(uri)).unwrap();
        let from_bytes = load_image(&ImageSource::Bytes(png)).unwrap();
        assert_eq!(from_uri.data, from_bytes.data);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let src = ImageSource::Src("./definitely/not/here.png".to_string());
        assert!(matches!(load_image(&src), Err(FolioError::Io(_))));
    }
}
