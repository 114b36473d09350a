//! Debug tint for freshly fetched imagery.
//!
//! Tinted tiles are shifted towards red so that tiles fetched by a scrape
//! can be told apart from older cache content when viewing a map.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat};
use thiserror::Error;

/// Errors that can occur while tinting a tile.
#[derive(Debug, Error)]
pub enum TintError {
    /// The tile bytes are not an image we can decode.
    #[error("failed to decode tile image: {0}")]
    Decode(#[source] image::ImageError),

    /// The tinted image could not be encoded.
    #[error("failed to encode tinted tile: {0}")]
    Encode(#[source] image::ImageError),
}

/// Apply the debug tint to an encoded tile.
///
/// Each pixel becomes `(r / 2 + 127, g / 2, b / 2)` with alpha preserved.
/// The result is re-encoded in the input format when it is PNG or JPEG,
/// otherwise as PNG.
pub fn apply_debug_tint(data: &[u8]) -> Result<Vec<u8>, TintError> {
    let format = image::guess_format(data).map_err(TintError::Decode)?;
    let decoded = image::load_from_memory_with_format(data, format).map_err(TintError::Decode)?;

    let mut rgba = decoded.to_rgba8();
    for pixel in rgba.pixels_mut() {
        pixel[0] = pixel[0] / 2 + 127;
        pixel[1] /= 2;
        pixel[2] /= 2;
    }

    let (image, out_format) = match format {
        // JPEG has no alpha channel
        ImageFormat::Jpeg => (
            DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(rgba).to_rgb8()),
            ImageFormat::Jpeg,
        ),
        _ => (DynamicImage::ImageRgba8(rgba), ImageFormat::Png),
    };

    let mut out = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut out), out_format)
        .map_err(TintError::Encode)?;
    Ok(out)
}
