//! PNG encode/decode for surface bitmaps.

use std::io::Cursor;

use image::{ImageFormat, ImageReader};

use crate::error::SurfaceError;

use super::Bitmap;
use super::bitmap::dimensions_supported;

pub(super) fn encode_png(bitmap: &Bitmap) -> Result<Vec<u8>, SurfaceError> {
    let mut out = Cursor::new(Vec::new());
    bitmap
        .as_image()
        .write_to(&mut out, ImageFormat::Png)
        .map_err(SurfaceError::Encode)?;
    Ok(out.into_inner())
}

/// Decodes PNG bytes; dimensions come from the decoded image bounds.
///
/// The header is checked before any pixel data is decoded, so oversized
/// images are refused without allocating for them.
pub(super) fn decode_png(bytes: &[u8]) -> Result<Bitmap, SurfaceError> {
    let (width, height) = ImageReader::with_format(Cursor::new(bytes), ImageFormat::Png)
        .into_dimensions()
        .map_err(SurfaceError::Decode)?;
    if !dimensions_supported(width, height) {
        return Err(SurfaceError::InvalidDimensions { width, height });
    }
    let decoded = image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map_err(SurfaceError::Decode)?;
    let rgba = decoded.into_rgba8();
    let (width, height) = rgba.dimensions();
    Bitmap::from_image(rgba).ok_or(SurfaceError::InvalidDimensions { width, height })
}
