//! Container encoding and decoding.
//!
//! The canonical persisted format is lossless TIFF with 8-bit RGBA samples.
//! Decoding accepts every format enabled on the `image` crate.

use std::io::Cursor;

use image::codecs::tiff::TiffEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageFormat, RgbaImage};

use crate::error::{Error, Result};

/// Encode RGBA pixel data as TIFF bytes.
///
/// # Errors
///
/// Returns [`Error::InvalidImage`] for zero-area images and
/// [`Error::Encode`] if the encoder fails.
pub fn encode(image: &RgbaImage) -> Result<Vec<u8>> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::invalid_image(format!(
            "cannot encode a {width}x{height} image"
        )));
    }

    let mut buffer = Cursor::new(Vec::new());
    TiffEncoder::new(&mut buffer)
        .write_image(image.as_raw(), width, height, ExtendedColorType::Rgba8)
        .map_err(|e| Error::Encode(e.to_string()))?;

    Ok(buffer.into_inner())
}

/// Encode RGBA pixel data in an arbitrary container format.
///
/// Formats without an alpha channel (JPEG) receive the RGB channels only.
pub fn encode_as(image: &RgbaImage, format: ImageFormat) -> Result<Vec<u8>> {
    if format == ImageFormat::Tiff {
        return encode(image);
    }

    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::invalid_image(format!(
            "cannot encode a {width}x{height} image"
        )));
    }

    let mut buffer = Cursor::new(Vec::new());
    let result = if format == ImageFormat::Jpeg {
        image::DynamicImage::ImageRgba8(image.clone())
            .to_rgb8()
            .write_to(&mut buffer, format)
    } else {
        image.write_to(&mut buffer, format)
    };
    result.map_err(|e| Error::Encode(e.to_string()))?;

    Ok(buffer.into_inner())
}

/// Decode image bytes of any supported format into RGBA pixels.
///
/// # Errors
///
/// Returns [`Error::InvalidImage`] if the bytes are not a recognized image.
pub fn decode(bytes: &[u8]) -> Result<RgbaImage> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| Error::invalid_image(format!("decode failed: {e}")))?;
    Ok(decoded.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn test_image(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 16) as u8, (y * 16) as u8, 128, (255 - x) as u8])
        })
    }

    #[test]
    fn test_encode_tiff_magic() {
        let bytes = encode(&test_image(8, 8)).unwrap();
        // Little-endian "II*\0" or big-endian "MM\0*"
        assert!(bytes.starts_with(b"II*\0") || bytes.starts_with(b"MM\0*"));
    }

    #[test]
    fn test_encode_is_lossless() {
        let image = test_image(12, 7);
        let decoded = decode(&encode(&image).unwrap()).unwrap();
        assert_eq!(decoded, image);
    }

    #[test]
    fn test_encode_is_deterministic() {
        let image = test_image(5, 5);
        assert_eq!(encode(&image).unwrap(), encode(&image).unwrap());
    }

    #[test]
    fn test_encode_zero_area_fails() {
        assert!(matches!(
            encode(&RgbaImage::new(0, 4)),
            Err(Error::InvalidImage(_))
        ));
    }

    #[test]
    fn test_encode_png_preserves_alpha() {
        let image = test_image(6, 6);
        let bytes = encode_as(&image, ImageFormat::Png).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        assert_eq!(decode(&bytes).unwrap(), image);
    }

    #[test]
    fn test_encode_jpeg_drops_alpha() {
        let bytes = encode_as(&test_image(16, 16), ImageFormat::Jpeg).unwrap();
        assert_eq!(&bytes[0..2], &[0xFF, 0xD8]);
        let decoded = decode(&bytes).unwrap();
        assert!(decoded.pixels().all(|p| p[3] == 255));
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(matches!(
            decode(b"definitely not an image"),
            Err(Error::InvalidImage(_))
        ));
    }
}
