//! Pure Rust codec implementation on the `image` crate.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (GIF, JPEG, PNG) | `ImageReader` with content sniffing |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Crop window | `DynamicImage::crop_imm` |
//! | Watermark paste | `image::imageops::overlay` (alpha-aware) |
//! | Encode → JPEG | `JpegEncoder::new_with_quality` |
//! | Encode → PNG | `PngEncoder::new_with_quality` (compression level) |
//! | Encode → GIF | `DynamicImage::write_to` |

use super::backend::{CodecError, ImageCodec};
use super::format::SourceFormat;
use super::params::{Dimensions, EncodeOptions};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;

/// A decoded image plus the format the reader sniffed from its content.
pub struct CodecImage {
    image: DynamicImage,
    format: Option<ImageFormat>,
}

/// Production codec using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustCodec;

impl RustCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a sniffed `image` crate format onto a supported output format.
fn supported_format(format: ImageFormat) -> Option<SourceFormat> {
    match format {
        ImageFormat::Gif => Some(SourceFormat::Gif),
        ImageFormat::Jpeg => Some(SourceFormat::Jpeg),
        ImageFormat::Png => Some(SourceFormat::Png),
        _ => None,
    }
}

/// Map the 0-9 PNG compression level onto the crate's compression tiers.
fn png_compression(level: u8) -> CompressionType {
    match level {
        0..=2 => CompressionType::Fast,
        3..=6 => CompressionType::Default,
        _ => CompressionType::Best,
    }
}

fn encode_into<W: std::io::Write + std::io::Seek>(
    image: &DynamicImage,
    writer: &mut W,
    format: SourceFormat,
    options: &EncodeOptions,
) -> Result<(), CodecError> {
    let result = match format {
        // JPEG has no alpha channel
        SourceFormat::Jpeg => {
            let quality = options
                .quality
                .map(|q| q.value())
                .unwrap_or(90)
                .clamp(1, 100) as u8;
            DynamicImage::ImageRgb8(image.to_rgb8())
                .write_with_encoder(JpegEncoder::new_with_quality(writer, quality))
        }
        SourceFormat::Png => {
            let compression = options
                .png_compression
                .map(png_compression)
                .unwrap_or(CompressionType::Default);
            image.write_with_encoder(PngEncoder::new_with_quality(
                writer,
                compression,
                PngFilterType::Adaptive,
            ))
        }
        // The GIF encoder wants RGBA input
        SourceFormat::Gif => {
            DynamicImage::ImageRgba8(image.to_rgba8()).write_to(writer, ImageFormat::Gif)
        }
    };
    result.map_err(|e| CodecError::Encode(format!("{} encode failed: {e}", format.as_str())))
}

impl ImageCodec for RustCodec {
    type Handle = CodecImage;

    fn decode(&self, path: &Path) -> Result<Self::Handle, CodecError> {
        let reader = ImageReader::open(path)
            .map_err(CodecError::Io)?
            .with_guessed_format()
            .map_err(CodecError::Io)?;
        let format = reader.format();
        let image = reader
            .decode()
            .map_err(|e| CodecError::Decode(format!("{}: {e}", path.display())))?;
        Ok(CodecImage { image, format })
    }

    fn dimensions(&self, image: &Self::Handle) -> Dimensions {
        let (width, height) = image.image.dimensions();
        Dimensions { width, height }
    }

    fn resize(&self, image: &mut Self::Handle, to: Dimensions) -> Result<(), CodecError> {
        image.image = image
            .image
            .resize_exact(to.width, to.height, FilterType::Lanczos3);
        Ok(())
    }

    fn crop(
        &self,
        image: &mut Self::Handle,
        x: u32,
        y: u32,
        to: Dimensions,
    ) -> Result<(), CodecError> {
        image.image = image.image.crop_imm(x, y, to.width, to.height);
        Ok(())
    }

    fn overlay(
        &self,
        image: &mut Self::Handle,
        overlay: &Self::Handle,
        x: i64,
        y: i64,
    ) -> Result<(), CodecError> {
        image::imageops::overlay(&mut image.image, &overlay.image, x, y);
        Ok(())
    }

    fn encode(
        &self,
        image: &Self::Handle,
        format: Option<SourceFormat>,
        options: &EncodeOptions,
    ) -> Result<Vec<u8>, CodecError> {
        let format = format
            .or_else(|| image.format.and_then(supported_format))
            .ok_or_else(|| CodecError::Encode("no encodable format for image".to_string()))?;
        let mut buffer = Cursor::new(Vec::new());
        encode_into(&image.image, &mut buffer, format, options)?;
        Ok(buffer.into_inner())
    }

    fn save(
        &self,
        image: &Self::Handle,
        path: &Path,
        format: Option<SourceFormat>,
        options: &EncodeOptions,
    ) -> Result<(), CodecError> {
        let bytes = self.encode(image, format, options)?;
        std::fs::write(path, bytes).map_err(CodecError::Io)
    }
}
