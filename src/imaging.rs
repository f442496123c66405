//! Image normalization.
//!
//! Every image served to a client goes through [`normalize`]: decode,
//! orientation correction, coercion to three-channel RGB, and a fresh JPEG
//! encode at a fixed quality factor. The output never carries metadata, so
//! running an image through the normalizer twice is a no-op apart from the
//! usual JPEG generation loss.

use std::io::Cursor;

use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader, codecs::jpeg::JpegEncoder};
use thiserror::Error;

/// JPEG quality factor for full-resolution serving.
pub const FULL_QUALITY: u8 = 95;

/// JPEG quality factor for thumbnail serving.
pub const THUMBNAIL_QUALITY: u8 = 85;

/// JPEG quality factor for video poster frames produced by the transcoder.
pub const POSTER_QUALITY: u8 = 90;

/// Edge length of the square video poster thumbnail.
pub const POSTER_EDGE: u32 = 640;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("could not decode image: {0}")]
    Decode(String),
    #[error("could not encode image: {0}")]
    Encode(String),
}

/// Normalize raw image bytes into a metadata-free, three-channel JPEG.
pub fn normalize(data: &[u8], quality: u8) -> Result<Vec<u8>, NormalizeError> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|err| NormalizeError::Decode(err.to_string()))?;
    let mut decoder = reader
        .into_decoder()
        .map_err(|err| NormalizeError::Decode(err.to_string()))?;
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
    let img = DynamicImage::from_decoder(decoder)
        .map_err(|err| NormalizeError::Decode(err.to_string()))?;

    let img = apply_orientation(img, orientation);
    encode_jpeg(&to_rgb(img), quality)
}

/// Center-crop to a square and resize to `edge`×`edge`. Used for the poster
/// frame the transcoder extracts from each video.
pub fn square_thumbnail(data: &[u8], edge: u32, quality: u8) -> Result<Vec<u8>, NormalizeError> {
    let img = image::load_from_memory(data)
        .map_err(|err| NormalizeError::Decode(err.to_string()))?;
    let cropped = img.resize_to_fill(edge, edge, image::imageops::FilterType::Lanczos3);
    encode_jpeg(&to_rgb(cropped), quality)
}

/// Orientation correction as shipped in the existing asset library: only the
/// three pure rotations are applied; mirrored orientation codes (EXIF 2, 4,
/// 5, 7) pass through with pixels untouched.
fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Rotate90 => img.rotate90(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::Rotate270 => img.rotate270(),
        _ => img,
    }
}

fn to_rgb(img: DynamicImage) -> DynamicImage {
    match img {
        DynamicImage::ImageRgb8(_) => img,
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, NormalizeError> {
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, quality);
    img.write_with_encoder(encoder)
        .map_err(|err| NormalizeError::Encode(err.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ColorType, Rgb, Rgba, RgbaImage};

    fn png_with_alpha(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 128]));
        let mut out = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn output_is_three_channel_jpeg() {
        let normalized = normalize(&png_with_alpha(4, 4), FULL_QUALITY).unwrap();
        let reader = ImageReader::new(Cursor::new(normalized.as_slice()))
            .with_guessed_format()
            .unwrap();
        assert_eq!(reader.format(), Some(image::ImageFormat::Jpeg));
        let decoded = image::load_from_memory(&normalized).unwrap();
        assert_eq!(decoded.color(), ColorType::Rgb8);
    }

    #[test]
    fn output_carries_no_orientation_metadata() {
        let normalized = normalize(&png_with_alpha(4, 4), FULL_QUALITY).unwrap();
        let mut decoder = ImageReader::new(Cursor::new(normalized.as_slice()))
            .with_guessed_format()
            .unwrap()
            .into_decoder()
            .unwrap();
        assert_eq!(decoder.orientation().unwrap(), Orientation::NoTransforms);
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize(&png_with_alpha(6, 4), THUMBNAIL_QUALITY).unwrap();
        let twice = normalize(&once, THUMBNAIL_QUALITY).unwrap();
        let a = image::load_from_memory(&once).unwrap();
        let b = image::load_from_memory(&twice).unwrap();
        assert_eq!((a.width(), a.height()), (b.width(), b.height()));
        assert_eq!(b.color(), ColorType::Rgb8);
    }

    #[test]
    fn rejects_undecodable_input() {
        assert!(matches!(
            normalize(b"definitely not an image", FULL_QUALITY),
            Err(NormalizeError::Decode(_))
        ));
    }

    // A 2x1 strip with distinct pixels makes the rotation direction visible.
    fn strip() -> DynamicImage {
        let mut img = image::RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(1, 0, Rgb([0, 0, 255]));
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn tag_six_rotates_clockwise() {
        let rotated = apply_orientation(strip(), Orientation::Rotate90);
        assert_eq!((rotated.width(), rotated.height()), (1, 2));
        let px = rotated.to_rgb8();
        assert_eq!(px.get_pixel(0, 0), &Rgb([255, 0, 0]));
        assert_eq!(px.get_pixel(0, 1), &Rgb([0, 0, 255]));
    }

    #[test]
    fn tag_three_rotates_half_turn() {
        let rotated = apply_orientation(strip(), Orientation::Rotate180);
        assert_eq!((rotated.width(), rotated.height()), (2, 1));
        let px = rotated.to_rgb8();
        assert_eq!(px.get_pixel(0, 0), &Rgb([0, 0, 255]));
        assert_eq!(px.get_pixel(1, 0), &Rgb([255, 0, 0]));
    }

    #[test]
    fn mirrored_codes_leave_pixels_untouched() {
        let img = apply_orientation(strip(), Orientation::FlipHorizontal);
        let px = img.to_rgb8();
        assert_eq!(px.get_pixel(0, 0), &Rgb([255, 0, 0]));
        assert_eq!(px.get_pixel(1, 0), &Rgb([0, 0, 255]));
    }

    #[test]
    fn square_thumbnail_crops_to_edge() {
        let src = png_with_alpha(8, 4);
        let thumb = square_thumbnail(&src, 2, POSTER_QUALITY).unwrap();
        let decoded = image::load_from_memory(&thumb).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (2, 2));
        assert_eq!(decoded.color(), ColorType::Rgb8);
    }
}
