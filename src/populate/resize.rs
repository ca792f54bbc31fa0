// Auxiliary image processing: decode, resample to a fixed size, re-encode as JPEG.

use image::RgbImage;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

use crate::config::Dimensions;
use crate::error::{Result, SuncacheError};

/// Decode `bytes` and stretch them to exactly `size`.
/// The whole source frame is resampled; nothing is cropped.
pub fn decode_resized(bytes: &[u8], size: Dimensions) -> Result<RgbImage> {
    let source = image::load_from_memory(bytes)?;
    Ok(source
        .resize_exact(size.width, size.height, FilterType::Triangle)
        .to_rgb8())
}

/// Encode an RGB image as JPEG at `quality`.
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut encoded = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut encoded, quality);
    encoder.encode_image(image).map_err(SuncacheError::Encode)?;

    Ok(encoded)
}
