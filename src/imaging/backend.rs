//! Codec capability trait and shared error type.
//!
//! The [`ImageCodec`] trait is the seam between the transformation pipeline
//! and the library that actually decodes and encodes pixels. The pipeline
//! computes *which* boxes, offsets and formats to use; the codec supplies the
//! primitive operations on its own handle type.
//!
//! The production implementation is
//! [`RustCodec`](super::rust_backend::RustCodec) — pure Rust on the `image`
//! crate, statically linked. Tests use the recording [`tests::MockCodec`].

use super::format::SourceFormat;
use super::params::{Dimensions, EncodeOptions};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
}

/// Primitive pixel operations supplied by a codec implementation.
///
/// `Handle` owns a decoded pixel buffer plus whatever metadata the codec
/// keeps (at minimum, the format it sniffed during decode). Handles are
/// created by `decode`, mutated in place by `resize`/`crop`/`overlay`, and
/// consumed by `encode`/`save`.
pub trait ImageCodec {
    type Handle;

    /// Decode an image file into a handle. Implementations sniff content,
    /// never file extensions.
    fn decode(&self, path: &Path) -> Result<Self::Handle, CodecError>;

    /// Pixel dimensions of a decoded image.
    fn dimensions(&self, image: &Self::Handle) -> Dimensions;

    /// Resample the image to exactly `to`, using a quality filter.
    fn resize(&self, image: &mut Self::Handle, to: Dimensions) -> Result<(), CodecError>;

    /// Replace the image with the `to`-sized window at `(x, y)`.
    fn crop(&self, image: &mut Self::Handle, x: u32, y: u32, to: Dimensions)
    -> Result<(), CodecError>;

    /// Paste `overlay` onto `image` at `(x, y)`, preserving the overlay's
    /// transparency. Out-of-bounds regions are clipped.
    fn overlay(
        &self,
        image: &mut Self::Handle,
        overlay: &Self::Handle,
        x: i64,
        y: i64,
    ) -> Result<(), CodecError>;

    /// Encode to in-memory bytes. `format: None` falls back to the format the
    /// decoder sniffed; if neither is known the codec reports an encode error.
    fn encode(
        &self,
        image: &Self::Handle,
        format: Option<SourceFormat>,
        options: &EncodeOptions,
    ) -> Result<Vec<u8>, CodecError>;

    /// Encode to a file. Same format fallback as [`ImageCodec::encode`].
    fn save(
        &self,
        image: &Self::Handle,
        path: &Path,
        format: Option<SourceFormat>,
        options: &EncodeOptions,
    ) -> Result<(), CodecError>;
}
