//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.
//! Callers guarantee non-zero inputs; zero-sized boxes are rejected by the
//! pipeline's validation layer before any geometry runs.

use super::params::Dimensions;
use thiserror::Error;

/// Per-axis divisor applied on every watermark shrink step.
pub const WATERMARK_SHRINK: f64 = 3.5;

/// Calculate resize dimensions that fit inside a target box while
/// preserving the source aspect ratio.
///
/// The first candidate pins the width to the target and derives the height
/// from the source ratio (rounded up). If that overflows either bound, the
/// height is pinned instead. Identical ratios return the target box exactly.
///
/// At least one axis of the result touches its bound.
pub fn resize_dimensions(source: Dimensions, target: Dimensions) -> Dimensions {
    let source_ratio = source.width as f64 / source.height as f64;
    let target_ratio = target.width as f64 / target.height as f64;

    if source_ratio == target_ratio {
        return target;
    }

    let mut width = target.width;
    let mut height = (target.width as f64 / source_ratio).ceil() as u32;

    if width > target.width || height > target.height {
        width = (target.height as f64 * source_ratio).ceil() as u32;
        height = target.height;
    }

    Dimensions { width, height }
}

/// Calculate dimensions needed to fill a target box (resize before crop).
///
/// Returns dimensions that completely cover the target while maintaining the
/// source aspect ratio. One axis matches the target exactly, the other may
/// exceed it; the centered crop extracts the final window.
pub fn fill_dimensions(source: Dimensions, target: Dimensions) -> Dimensions {
    let source_aspect = source.width as f64 / source.height as f64;
    let desired_aspect = target.width as f64 / target.height as f64;

    if source_aspect > desired_aspect {
        // Source is wider: height matches, width exceeds
        Dimensions {
            width: (target.height as f64 * source_aspect).round() as u32,
            height: target.height,
        }
    } else {
        // Source is taller or equal: width matches, height exceeds
        Dimensions {
            width: target.width,
            height: (target.width as f64 / source_aspect).round() as u32,
        }
    }
}

/// Offsets of the centered target window inside a fill-resized image.
///
/// Integer division truncates toward zero. Callers must pass a `thumb` box
/// produced by [`fill_dimensions`], which covers `target` on both axes.
pub fn centered_offsets(thumb: Dimensions, target: Dimensions) -> (u32, u32) {
    (
        (thumb.width - target.width) / 2,
        (thumb.height - target.height) / 2,
    )
}

/// Degenerate geometry detected while fitting a watermark overlay.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitError {
    #[error("base image has a zero dimension ({0})")]
    DegenerateBase(Dimensions),
    #[error("overlay image has a zero dimension ({0})")]
    DegenerateOverlay(Dimensions),
    #[error("overlay shrank below one pixel before fitting inside {0}")]
    Exhausted(Dimensions),
}

/// Shrink an overlay until it fits strictly inside a base image.
///
/// Both axes are divided by [`WATERMARK_SHRINK`] per step until the overlay
/// is smaller than the base on both axes. The accepted size truncates the
/// fractional dimensions toward zero, floored at one pixel. Termination is
/// guaranteed: both dimensions strictly shrink each step, and dropping below
/// one pixel before fitting is reported as [`FitError::Exhausted`] rather
/// than recursing forever.
pub fn best_fit(overlay: Dimensions, base: Dimensions) -> Result<Dimensions, FitError> {
    if base.width == 0 || base.height == 0 {
        return Err(FitError::DegenerateBase(base));
    }
    if overlay.width == 0 || overlay.height == 0 {
        return Err(FitError::DegenerateOverlay(overlay));
    }
    shrink_until_fit(overlay.width as f64, overlay.height as f64, base)
}

fn shrink_until_fit(width: f64, height: f64, base: Dimensions) -> Result<Dimensions, FitError> {
    if width < 1.0 || height < 1.0 {
        return Err(FitError::Exhausted(base));
    }
    if width < base.width as f64 && height < base.height as f64 {
        return Ok(Dimensions {
            width: width as u32,
            height: height as u32,
        });
    }
    shrink_until_fit(width / WATERMARK_SHRINK, height / WATERMARK_SHRINK, base)
}
