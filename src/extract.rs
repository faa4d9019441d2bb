//! Cell extraction - crop a rectangle and normalize its size

use image::imageops::{self, FilterType};
use image::RgbaImage;
use thiserror::Error;

use crate::region::PixelRect;

/// Error extracting a cell
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// Rectangle is empty or not inside the source image
    #[error("invalid rect {rect} for {width}x{height} source")]
    InvalidRect { rect: PixelRect, width: u32, height: u32 },
}

/// Crop `rect` out of `source`, resampling to `target_size` when it is set and
/// differs from the crop size.
///
/// Resampling uses Lanczos3.
pub fn extract(
    source: &RgbaImage,
    rect: PixelRect,
    target_size: Option<(u32, u32)>,
) -> Result<RgbaImage, ExtractError> {
    let (width, height) = source.dimensions();
    if !rect.fits_within(width, height) {
        return Err(ExtractError::InvalidRect { rect, width, height });
    }

    let crop = imageops::crop_imm(source, rect.x1, rect.y1, rect.width(), rect.height()).to_image();

    match target_size {
        Some((tw, th)) if crop.dimensions() != (tw, th) => {
            Ok(imageops::resize(&crop, tw, th, FilterType::Lanczos3))
        }
        _ => Ok(crop),
    }
}
