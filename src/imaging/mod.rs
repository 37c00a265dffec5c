//! Image processing — pure Rust, zero external dependencies.
//!
//! The module is split into:
//! - **Calculations**: pure functions for geometry math (unit testable)
//! - **Format**: content-based signature detection for GIF/JPEG/PNG
//! - **Parameters**: data structures describing transformations
//! - **Backend**: the [`ImageCodec`] capability trait + [`RustCodec`]
//! - **Operations**: high-level functions combining calculations + codec

pub mod backend;
pub mod calculations;
pub mod format;
pub mod operations;
pub mod params;
pub mod rust_backend;

pub use backend::{CodecError, ImageCodec};
pub use calculations::FitError;
pub use format::SourceFormat;
pub use params::{Dimensions, EncodeOptions, Method, Quality, UndefinedMethodError};
pub use rust_backend::RustCodec;
