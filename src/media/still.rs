//! Still images: decode to 3-channel RGB, encode as PNG.

use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageFormat, RgbImage};
use tracing::debug;

use super::{unreadable, unwritable};
use crate::{Result, StegoError};

/// Decode any supported image into an RGB carrier.
///
/// Grayscale and alpha layouts are converted to RGB; alpha is dropped.
pub fn decode_rgb(bytes: &[u8]) -> Result<RgbImage> {
    let img = image::load_from_memory(bytes).map_err(|e| unreadable("image", e))?;
    match img {
        DynamicImage::ImageRgb8(rgb) => Ok(rgb),
        convertible @ (DynamicImage::ImageLuma8(_)
        | DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageRgba8(_)) => {
            debug!("converting {:?} carrier to RGB", convertible.color());
            Ok(convertible.to_rgb8())
        }
        other => Err(StegoError::UnsupportedContainer(format!(
            "unsupported pixel layout {:?}, expected 8-bit grayscale or RGB(A)",
            other.color()
        ))),
    }
}

pub fn encode_png(img: &RgbImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(img.clone())
        .write_with_encoder(PngEncoder::new(&mut buffer))
        .map_err(unwritable)?;
    Ok(buffer)
}

/// Formats that keep every low bit intact.
pub fn is_lossless(bytes: &[u8]) -> bool {
    matches!(
        image::guess_format(bytes),
        Ok(ImageFormat::Png) | Ok(ImageFormat::Bmp)
    )
}

/// Reject carriers whose container may have altered low bits.
pub fn require_lossless(bytes: &[u8]) -> Result<()> {
    if is_lossless(bytes) {
        return Ok(());
    }
    let format = image::guess_format(bytes)
        .map(|f| format!("{:?}", f))
        .unwrap_or_else(|_| "unknown".to_string());
    Err(StegoError::UnsupportedContainer(format!(
        "{} is not a lossless format, LSB data needs PNG or BMP",
        format
    )))
}
