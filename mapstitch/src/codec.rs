//! Image decode and encode helpers shared by the fetch and mosaic stages.

use std::fmt;
use std::str::FromStr;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{ExtendedColorType, ImageEncoder, RgbImage};
use thiserror::Error;

/// Errors raised while decoding or encoding raster data.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("image decode error: {0}")]
    Decode(#[source] image::ImageError),

    #[error("image encode error: {0}")]
    Encode(#[source] image::ImageError),
}

/// Container format of an encoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    /// Label used in the text envelope's `FORMAT=` line.
    pub fn label(&self) -> &'static str {
        match self {
            ImageFormat::Png => "PNG",
            ImageFormat::Jpeg => "JPEG",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ImageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PNG" => Ok(ImageFormat::Png),
            "JPEG" | "JPG" => Ok(ImageFormat::Jpeg),
            other => Err(format!("unknown image format '{}'", other)),
        }
    }
}

/// Encoded bytes together with the pixel size they decode to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl EncodedImage {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Decodes any supported format into 8-bit RGB.
pub fn decode_rgb(bytes: &[u8]) -> Result<RgbImage, CodecError> {
    let img = image::load_from_memory(bytes).map_err(CodecError::Decode)?;
    Ok(img.to_rgb8())
}

/// Encodes as baseline JPEG at `quality` (1-100).
pub fn encode_jpeg(img: &RgbImage, quality: u8) -> Result<Vec<u8>, CodecError> {
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
        .write_image(img.as_raw(), img.width(), img.height(), ExtendedColorType::Rgb8)
        .map_err(CodecError::Encode)?;
    Ok(buffer)
}

/// Encodes as lossless PNG.
pub fn encode_png(img: &RgbImage) -> Result<Vec<u8>, CodecError> {
    let mut buffer = Vec::new();
    PngEncoder::new(&mut buffer)
        .write_image(img.as_raw(), img.width(), img.height(), ExtendedColorType::Rgb8)
        .map_err(CodecError::Encode)?;
    Ok(buffer)
}

/// Encodes `img` in `format`, using `quality` for JPEG.
pub fn encode(img: &RgbImage, format: ImageFormat, quality: u8) -> Result<EncodedImage, CodecError> {
    let bytes = match format {
        ImageFormat::Png => encode_png(img)?,
        ImageFormat::Jpeg => encode_jpeg(img, quality)?,
    };
    Ok(EncodedImage {
        format,
        width: img.width(),
        height: img.height(),
        bytes,
    })
}

/// Resizes by a uniform factor, never below 1×1.
pub fn scale_by(img: &RgbImage, factor: f64, filter: FilterType) -> RgbImage {
    let width = scaled_dimension(img.width(), factor);
    let height = scaled_dimension(img.height(), factor);
    imageops::resize(img, width, height, filter)
}

/// `dimension * factor`, truncated and floored at 1.
pub fn scaled_dimension(dimension: u32, factor: f64) -> u32 {
    ((dimension as f64 * factor) as u32).max(1)
}
