//! High-level transform operations.
//!
//! These functions combine the pure [`calculations`](super::calculations)
//! with codec primitives. They take a target box, compute the geometry, and
//! drive the codec — they never touch pixels themselves.

use super::backend::{CodecError, ImageCodec};
use super::calculations::{centered_offsets, fill_dimensions, resize_dimensions};
use super::params::Dimensions;

/// Resize an image to fit inside `target`, preserving aspect ratio.
///
/// At least one axis of the result touches the target bound.
pub fn resize_to_fit<C: ImageCodec>(
    codec: &C,
    image: &mut C::Handle,
    target: Dimensions,
) -> Result<(), CodecError> {
    let destination = resize_dimensions(codec.dimensions(image), target);
    codec.resize(image, destination)
}

/// Fill `target` and extract the centered window.
///
/// The source is first resampled to the smallest box that covers `target`
/// with the source aspect ratio, then the `target`-sized window at the
/// centered offsets replaces the working image. Output dimensions equal
/// `target` exactly, whatever the source aspect.
pub fn crop_to_fill<C: ImageCodec>(
    codec: &C,
    image: &mut C::Handle,
    target: Dimensions,
) -> Result<(), CodecError> {
    let thumb = fill_dimensions(codec.dimensions(image), target);
    codec.resize(image, thumb)?;
    let (x, y) = centered_offsets(thumb, target);
    codec.crop(image, x, y, target)
}
