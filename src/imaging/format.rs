//! Image format detection from file signature bytes.
//!
//! Detection is content-based, never extension-based: a file renamed to
//! `.png` does not become a PNG. Only the three supported raster formats are
//! recognized; anything else yields `None`, and callers degrade (no mime, no
//! PNG-specific options) instead of failing.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_SIGNATURE: [u8; 3] = [0xFF, 0xD8, 0xFF];

/// A recognized source image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Gif,
    Jpeg,
    Png,
}

impl SourceFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gif => "gif",
            Self::Jpeg => "jpeg",
            Self::Png => "png",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Self::Gif => "image/gif",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

/// Detect a format from the leading signature bytes of a file.
pub fn detect(bytes: &[u8]) -> Option<SourceFormat> {
    if bytes.starts_with(&PNG_SIGNATURE) {
        Some(SourceFormat::Png)
    } else if bytes.starts_with(&JPEG_SIGNATURE) {
        Some(SourceFormat::Jpeg)
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some(SourceFormat::Gif)
    } else {
        None
    }
}

/// Read a file's leading bytes and detect its format.
///
/// Only the first eight bytes are read; short files simply fail to match any
/// signature. IO failures propagate — a missing file is an error, not an
/// unknown format.
pub fn detect_file(path: &Path) -> io::Result<Option<SourceFormat>> {
    let mut header = Vec::with_capacity(PNG_SIGNATURE.len());
    File::open(path)?
        .take(PNG_SIGNATURE.len() as u64)
        .read_to_end(&mut header)?;
    Ok(detect(&header))
}

/// Mime type for an optional detected format.
pub fn mime_for(format: Option<SourceFormat>) -> Option<&'static str> {
    format.map(|f| f.mime())
}
