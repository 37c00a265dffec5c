//! Parameter types for image operations.
//!
//! These types describe *what* to do, not *how* to do it. They are the
//! interface between the [`pipeline`](crate::pipeline) (which decides what
//! transformation to run) and the [`backend`](super::backend) (which does the
//! actual pixel work). This separation allows swapping backends (e.g. for
//! testing with a recording mock) without changing pipeline logic.
//!
//! ## Types
//!
//! - [`Dimensions`] — a width/height pair, used for source sizes, target
//!   boxes, and watermark shrink steps alike.
//! - [`Method`] — the transformation strategy tag (`resize` or `crop`).
//! - [`Quality`] — lossy encoding quality (0–100, default 90). Clamped on
//!   construction.
//! - [`EncodeOptions`] — encoder options derived from a request plus config
//!   defaults, passed opaquely to the encode/save operations.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A width/height pair in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Transformation strategy.
///
/// `Resize` fits the image inside the target box preserving aspect ratio;
/// `Crop` fills the box and extracts a centered window. Anything else is
/// rejected at the string boundary with [`UndefinedMethodError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Resize,
    Crop,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resize => "resize",
            Self::Crop => "crop",
        }
    }
}

/// Raised when a request names a transformation method that does not exist.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("undefined method {0}")]
pub struct UndefinedMethodError(pub String);

impl FromStr for Method {
    type Err = UndefinedMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "resize" => Ok(Method::Resize),
            "crop" => Ok(Method::Crop),
            other => Err(UndefinedMethodError(other.to_string())),
        }
    }
}

/// Quality setting for lossy image encoding (0-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.min(100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Encoder options handed opaquely to the codec.
///
/// `quality` drives lossy encoders; `png_compression` is the repurposed
/// quality for PNG output (0 = fastest, 9 = smallest), derived by the
/// pipeline because PNG has no quality concept. Free-form entries the codec
/// does not recognize ride along in `extra` untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    pub quality: Option<Quality>,
    pub png_compression: Option<u8>,
    pub extra: BTreeMap<String, String>,
}
