//! The transformation pipeline.
//!
//! A [`Pipeline`] executes exactly one [`TransformRequest`] through a fixed
//! sequence: dimension validation → bounds check → format detection → decode
//! → option derivation → method dispatch → optional watermark. The sequence
//! runs at most once per instance; repeated [`Pipeline::process`] calls are
//! no-ops, making [`Pipeline::response`] and [`Pipeline::save`] idempotent.
//!
//! Pipelines are request-scoped and synchronous. `Pipeline::new` is the
//! factory for re-entrant use: the watermark step builds a fresh pipeline
//! for the overlay image (with watermarking disabled) instead of sharing any
//! mutable state.

use crate::config::TransformConfig;
use crate::imaging::calculations::{FitError, best_fit};
use crate::imaging::format::{self, SourceFormat};
use crate::imaging::params::{Dimensions, EncodeOptions, Method, Quality};
use crate::imaging::{CodecError, ImageCodec, operations};
use crate::request::{RequestParams, Source, TransformRequest};
use crate::resolver::{CachePathKey, PathResolver};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Pixels between the watermark and the base image's bottom-right corner.
const WATERMARK_MARGIN: i64 = 5;

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("source image not found: {0}")]
    SourceNotFound(PathBuf),
    #[error("{0} is not set")]
    MissingDimension(&'static str),
    #[error("{0} must be greater than zero")]
    ZeroDimension(&'static str),
    #[error("maximum {axis} is {limit} (requested {value})")]
    MaxExceeded {
        axis: &'static str,
        value: u32,
        limit: u32,
    },
    #[error("minimum {axis} is {limit} (requested {value})")]
    MinExceeded {
        axis: &'static str,
        value: u32,
        limit: u32,
    },
    #[error("watermark does not fit: {0}")]
    Fit(#[from] FitError),
    #[error("pipeline aborted before an image was produced")]
    Interrupted,
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// An encoded image ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub body: Vec<u8>,
    pub mime: Option<&'static str>,
    pub status: u16,
}

/// One request-scoped transformation run.
pub struct Pipeline<'a, C: ImageCodec> {
    codec: &'a C,
    config: &'a TransformConfig,
    resolver: PathResolver,
    request: TransformRequest,
    source: Source,
    format: Option<SourceFormat>,
    options: EncodeOptions,
    image: Option<C::Handle>,
    processed: bool,
}

impl<'a, C: ImageCodec> Pipeline<'a, C> {
    /// Build a pipeline for one request.
    ///
    /// The source is resolved up front: a missing file falls back to the
    /// configured default source, or fails with [`TransformError::SourceNotFound`]
    /// before any processing.
    pub fn new(
        codec: &'a C,
        config: &'a TransformConfig,
        request: TransformRequest,
    ) -> Result<Self, TransformError> {
        let source = resolve_source(request.source(), config)?;
        Ok(Self {
            codec,
            config,
            resolver: PathResolver::new(&config.routes.base_route, &config.routes.route),
            request,
            source,
            format: None,
            options: EncodeOptions::default(),
            image: None,
            processed: false,
        })
    }

    /// Run the transformation. Idempotent: only the first call does work,
    /// and a pipeline never retries after a failed run.
    pub fn process(&mut self) -> Result<(), TransformError> {
        if self.processed {
            return Ok(());
        }
        self.processed = true;

        let target = self.target()?;
        self.check_bounds(target)?;
        let mut image = self.codec.decode(self.source.file())?;
        self.format = format::detect_file(self.source.file())?;
        self.options = self.build_options();
        match self.request.method() {
            Method::Resize => operations::resize_to_fit(self.codec, &mut image, target)?,
            Method::Crop => operations::crop_to_fill(self.codec, &mut image, target)?,
        }
        self.image = Some(image);
        if self.request.watermark_enabled() {
            self.apply_watermark()?;
        }
        Ok(())
    }

    /// Process and encode, wrapping the bytes with their mime type.
    ///
    /// An unrecognized source signature degrades to a `None` mime; the codec
    /// falls back to the format it sniffed during decode.
    pub fn response(&mut self) -> Result<Rendered, TransformError> {
        self.process()?;
        let image = self.image.as_ref().ok_or(TransformError::Interrupted)?;
        let body = self.codec.encode(image, self.format, &self.options)?;
        Ok(Rendered {
            body,
            mime: format::mime_for(self.format),
            status: 200,
        })
    }

    /// Process and persist the result at its derived cache path.
    pub fn save(&mut self) -> Result<PathBuf, TransformError> {
        self.process()?;
        let path = PathBuf::from(self.cache_path()?);
        let image = self.image.as_ref().ok_or(TransformError::Interrupted)?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        self.codec.save(image, &path, self.format, &self.options)?;
        Ok(path)
    }

    /// Derive the cache path for this request without processing.
    ///
    /// Only the cache key fields (method, dimensions, resolved source,
    /// watermark flag) participate — quality and extra options never do.
    pub fn cache_path(&self) -> Result<String, TransformError> {
        let target = self.target()?;
        let key = CachePathKey {
            method: self.request.method(),
            width: target.width,
            height: target.height,
            source: &self.source,
            watermark: self.request.watermark_enabled(),
        };
        Ok(self.resolver.resolve(&key))
    }

    /// The processed image, if a run completed.
    pub fn image(&self) -> Option<&C::Handle> {
        self.image.as_ref()
    }

    /// Consume the pipeline, yielding the processed image.
    pub fn into_image(self) -> Option<C::Handle> {
        self.image
    }

    fn target(&self) -> Result<Dimensions, TransformError> {
        let width = self
            .request
            .width()
            .ok_or(TransformError::MissingDimension("width"))?;
        let height = self
            .request
            .height()
            .ok_or(TransformError::MissingDimension("height"))?;
        if width == 0 {
            return Err(TransformError::ZeroDimension("width"));
        }
        if height == 0 {
            return Err(TransformError::ZeroDimension("height"));
        }
        Ok(Dimensions { width, height })
    }

    /// Reject dimensions strictly outside the configured bounds. Values equal
    /// to a bound pass.
    fn check_bounds(&self, target: Dimensions) -> Result<(), TransformError> {
        let limits = &self.config.limits;
        for (axis, value, max) in [
            ("width", target.width, limits.max.width),
            ("height", target.height, limits.max.height),
        ] {
            if let Some(limit) = max
                && value > limit
            {
                return Err(TransformError::MaxExceeded { axis, value, limit });
            }
        }
        for (axis, value, min) in [
            ("width", target.width, limits.min.width),
            ("height", target.height, limits.min.height),
        ] {
            if let Some(limit) = min
                && value < limit
            {
                return Err(TransformError::MinExceeded { axis, value, limit });
            }
        }
        Ok(())
    }

    fn build_options(&self) -> EncodeOptions {
        let quality = Quality::new(self.request.quality().unwrap_or(self.config.quality));
        let png_compression = (self.format == Some(SourceFormat::Png))
            .then(|| png_compression_level(quality.value()));
        EncodeOptions {
            quality: Some(quality),
            png_compression,
            extra: self.request.extra().clone(),
        }
    }

    /// Composite the configured watermark bottom-right onto the working
    /// image. An unconfigured watermark silently skips.
    fn apply_watermark(&mut self) -> Result<(), TransformError> {
        let Some(overlay_source) = self.config.watermark.as_deref() else {
            return Ok(());
        };
        let mut base = self.image.take().ok_or(TransformError::Interrupted)?;
        let result = self.composite_watermark(&mut base, overlay_source);
        self.image = Some(base);
        result
    }

    fn composite_watermark(
        &self,
        base: &mut C::Handle,
        overlay_source: &Path,
    ) -> Result<(), TransformError> {
        let base_size = self.codec.dimensions(base);
        let probe = self.codec.decode(overlay_source)?;
        let fitted = best_fit(self.codec.dimensions(&probe), base_size)?;
        drop(probe);

        // The overlay goes through a fresh pipeline at the fitted size, with
        // watermarking disabled so it cannot composite onto itself.
        let request = TransformRequest::new(Source::Path(overlay_source.to_path_buf()))
            .with_params(RequestParams {
                width: Some(fitted.width),
                height: Some(fitted.height),
                method: Some(Method::Resize),
                watermark: Some(false),
                ..RequestParams::default()
            });
        let mut overlay_pipeline = Pipeline::new(self.codec, self.config, request)?;
        overlay_pipeline.process()?;
        let overlay = overlay_pipeline
            .into_image()
            .ok_or(TransformError::Interrupted)?;

        let overlay_size = self.codec.dimensions(&overlay);
        let x = i64::from(base_size.width) - i64::from(overlay_size.width) - WATERMARK_MARGIN;
        let y = i64::from(base_size.height) - i64::from(overlay_size.height) - WATERMARK_MARGIN;
        self.codec.overlay(base, &overlay, x, y)?;
        Ok(())
    }
}

fn resolve_source(source: &Source, config: &TransformConfig) -> Result<Source, TransformError> {
    if source.file().exists() {
        return Ok(source.clone());
    }
    match &config.default_source {
        Some(fallback) => Ok(Source::Path(fallback.clone())),
        None => Err(TransformError::SourceNotFound(source.file().to_path_buf())),
    }
}

/// Derive a PNG compression level (0-9) from an encoder quality (0-100).
///
/// PNG has no quality concept, so quality is repurposed: higher quality
/// means less compression effort.
fn png_compression_level(quality: u32) -> u8 {
    ((100 - quality) as f64 * 9.0 / 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MOCK_ENCODED, MockCodec, RecordedOp};
    use tempfile::TempDir;

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    /// Write a source file with the given leading bytes and return its path.
    fn write_source(tmp: &TempDir, name: &str, header: &[u8]) -> PathBuf {
        let path = tmp.path().join(name);
        fs::write(&path, header).unwrap();
        path
    }

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
    const JPEG_HEADER: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0];

    fn request(source: &Path, width: u32, height: u32) -> TransformRequest {
        TransformRequest::new(Source::Path(source.to_path_buf())).with_params(RequestParams {
            width: Some(width),
            height: Some(height),
            ..RequestParams::default()
        })
    }

    // =========================================================================
    // Source resolution
    // =========================================================================

    #[test]
    fn missing_source_without_fallback_fails_before_processing() {
        let codec = MockCodec::new();
        let config = TransformConfig::default();
        let request = request(Path::new("/nonexistent/cat.jpg"), 100, 100);

        let result = Pipeline::new(&codec, &config, request);
        assert!(matches!(result, Err(TransformError::SourceNotFound(_))));
        assert!(codec.recorded().is_empty());
    }

    #[test]
    fn missing_source_falls_back_to_configured_default() {
        let tmp = TempDir::new().unwrap();
        let fallback = write_source(&tmp, "placeholder.jpg", JPEG_HEADER);
        let codec = MockCodec::with_dimensions(vec![dims(200, 200)]);
        let config = TransformConfig {
            default_source: Some(fallback.clone()),
            ..TransformConfig::default()
        };

        let mut pipeline = Pipeline::new(
            &codec,
            &config,
            request(Path::new("/nonexistent/cat.jpg"), 100, 100),
        )
        .unwrap();
        pipeline.process().unwrap();

        let ops = codec.recorded();
        assert!(
            matches!(&ops[0], RecordedOp::Decode(p) if *p == fallback.to_string_lossy())
        );
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn unset_width_is_a_caller_error() {
        let tmp = TempDir::new().unwrap();
        let source = write_source(&tmp, "cat.jpg", JPEG_HEADER);
        let codec = MockCodec::new();
        let config = TransformConfig::default();
        let request = TransformRequest::new(Source::Path(source)).with_params(RequestParams {
            height: Some(100),
            ..RequestParams::default()
        });

        let mut pipeline = Pipeline::new(&codec, &config, request).unwrap();
        let err = pipeline.process().unwrap_err();
        assert!(matches!(err, TransformError::MissingDimension("width")));
    }

    #[test]
    fn zero_height_is_rejected_before_geometry() {
        let tmp = TempDir::new().unwrap();
        let source = write_source(&tmp, "cat.jpg", JPEG_HEADER);
        let codec = MockCodec::new();
        let config = TransformConfig::default();

        let mut pipeline = Pipeline::new(&codec, &config, request(&source, 100, 0)).unwrap();
        let err = pipeline.process().unwrap_err();
        assert!(matches!(err, TransformError::ZeroDimension("height")));
        assert!(codec.recorded().is_empty());
    }

    #[test]
    fn width_above_max_names_the_axis() {
        let tmp = TempDir::new().unwrap();
        let source = write_source(&tmp, "cat.jpg", JPEG_HEADER);
        let codec = MockCodec::new();
        let mut config = TransformConfig::default();
        config.limits.max.width = Some(2000);

        let mut pipeline = Pipeline::new(&codec, &config, request(&source, 5000, 100)).unwrap();
        let err = pipeline.process().unwrap_err();
        assert!(
            matches!(err, TransformError::MaxExceeded { axis: "width", value: 5000, limit: 2000 })
        );
        assert!(err.to_string().contains("width"));
        // Bounds fail before the decode side effect
        assert!(codec.recorded().is_empty());
    }

    #[test]
    fn height_below_min_names_the_axis() {
        let tmp = TempDir::new().unwrap();
        let source = write_source(&tmp, "cat.jpg", JPEG_HEADER);
        let codec = MockCodec::new();
        let mut config = TransformConfig::default();
        config.limits.min.height = Some(64);

        let mut pipeline = Pipeline::new(&codec, &config, request(&source, 100, 10)).unwrap();
        let err = pipeline.process().unwrap_err();
        assert!(err.to_string().contains("height"));
    }

    #[test]
    fn dimensions_equal_to_bounds_pass() {
        let tmp = TempDir::new().unwrap();
        let source = write_source(&tmp, "cat.jpg", JPEG_HEADER);
        let codec = MockCodec::with_dimensions(vec![dims(4000, 4000)]);
        let mut config = TransformConfig::default();
        config.limits.max.width = Some(2000);
        config.limits.min.width = Some(2000);

        let mut pipeline = Pipeline::new(&codec, &config, request(&source, 2000, 2000)).unwrap();
        assert!(pipeline.process().is_ok());
    }

    // =========================================================================
    // Idempotence
    // =========================================================================

    #[test]
    fn process_runs_side_effects_exactly_once() {
        let tmp = TempDir::new().unwrap();
        let source = write_source(&tmp, "cat.jpg", JPEG_HEADER);
        let codec = MockCodec::with_dimensions(vec![dims(800, 600)]);
        let config = TransformConfig::default();

        let mut pipeline = Pipeline::new(&codec, &config, request(&source, 400, 300)).unwrap();
        pipeline.process().unwrap();
        let ops_after_first = codec.recorded();
        pipeline.process().unwrap();

        assert_eq!(codec.recorded(), ops_after_first);
        assert_eq!(codec.decode_count(), 1);
    }

    #[test]
    fn repeated_response_yields_identical_bytes() {
        let tmp = TempDir::new().unwrap();
        let source = write_source(&tmp, "cat.jpg", JPEG_HEADER);
        let codec = MockCodec::with_dimensions(vec![dims(800, 600)]);
        let config = TransformConfig::default();

        let mut pipeline = Pipeline::new(&codec, &config, request(&source, 400, 300)).unwrap();
        let first = pipeline.response().unwrap();
        let second = pipeline.response().unwrap();

        assert_eq!(first, second);
        assert_eq!(codec.decode_count(), 1);
    }

    #[test]
    fn failed_run_never_retries() {
        let tmp = TempDir::new().unwrap();
        let source = write_source(&tmp, "cat.jpg", JPEG_HEADER);
        // No queued dimensions: the decode step fails
        let codec = MockCodec::new();
        let config = TransformConfig::default();

        let mut pipeline = Pipeline::new(&codec, &config, request(&source, 400, 300)).unwrap();
        assert!(pipeline.process().is_err());
        // Second call is a no-op, and response reports the aborted run
        assert!(pipeline.process().is_ok());
        assert!(matches!(
            pipeline.response(),
            Err(TransformError::Interrupted)
        ));
        assert_eq!(codec.decode_count(), 1);
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    #[test]
    fn resize_dispatch_preserves_aspect_ratio() {
        let tmp = TempDir::new().unwrap();
        let source = write_source(&tmp, "cat.jpg", JPEG_HEADER);
        let codec = MockCodec::with_dimensions(vec![dims(1600, 900)]);
        let config = TransformConfig::default();

        let mut pipeline = Pipeline::new(&codec, &config, request(&source, 400, 400)).unwrap();
        pipeline.process().unwrap();

        assert!(matches!(
            codec.recorded().last(),
            Some(RecordedOp::Resize { width: 400, height: 225 })
        ));
    }

    #[test]
    fn crop_dispatch_fills_then_extracts_centered_window() {
        let tmp = TempDir::new().unwrap();
        let source = write_source(&tmp, "cat.jpg", JPEG_HEADER);
        let codec = MockCodec::with_dimensions(vec![dims(800, 600)]);
        let config = TransformConfig::default();

        let request =
            request(&source, 400, 500).with_params(RequestParams {
                method: Some(Method::Crop),
                ..RequestParams::default()
            });
        let mut pipeline = Pipeline::new(&codec, &config, request).unwrap();
        pipeline.process().unwrap();

        let ops = codec.recorded();
        assert_eq!(
            &ops[1..],
            &[
                RecordedOp::Resize { width: 667, height: 500 },
                RecordedOp::Crop { x: 133, y: 0, width: 400, height: 500 },
            ]
        );
    }

    // =========================================================================
    // Format detection and encode options
    // =========================================================================

    #[test]
    fn png_signature_derives_compression_level() {
        let tmp = TempDir::new().unwrap();
        let source = write_source(&tmp, "cat.png", PNG_HEADER);
        let codec = MockCodec::with_dimensions(vec![dims(800, 600)]);
        let config = TransformConfig::default();

        let mut pipeline = Pipeline::new(&codec, &config, request(&source, 400, 300)).unwrap();
        let rendered = pipeline.response().unwrap();

        assert_eq!(rendered.mime, Some("image/png"));
        // quality 90 → round(10 * 9 / 100) = 1
        assert!(matches!(
            codec.recorded().last(),
            Some(RecordedOp::Encode {
                format: Some(SourceFormat::Png),
                quality: Some(90),
                png_compression: Some(1),
            })
        ));
    }

    #[test]
    fn jpeg_signature_skips_compression_derivation() {
        let tmp = TempDir::new().unwrap();
        let source = write_source(&tmp, "cat.jpg", JPEG_HEADER);
        let codec = MockCodec::with_dimensions(vec![dims(800, 600)]);
        let config = TransformConfig::default();

        let mut pipeline = Pipeline::new(&codec, &config, request(&source, 400, 300)).unwrap();
        let rendered = pipeline.response().unwrap();

        assert_eq!(rendered.mime, Some("image/jpeg"));
        assert!(matches!(
            codec.recorded().last(),
            Some(RecordedOp::Encode { png_compression: None, .. })
        ));
    }

    #[test]
    fn unrecognized_signature_degrades_instead_of_crashing() {
        let tmp = TempDir::new().unwrap();
        let source = write_source(&tmp, "cat.img", b"not an image at all");
        let codec = MockCodec::with_dimensions(vec![dims(800, 600)]);
        let config = TransformConfig::default();

        let mut pipeline = Pipeline::new(&codec, &config, request(&source, 400, 300)).unwrap();
        let rendered = pipeline.response().unwrap();

        assert_eq!(rendered.mime, None);
        assert_eq!(rendered.status, 200);
        assert!(matches!(
            codec.recorded().last(),
            Some(RecordedOp::Encode { format: None, png_compression: None, .. })
        ));
    }

    #[test]
    fn quality_defaults_from_config_and_request_overrides() {
        let tmp = TempDir::new().unwrap();
        let source = write_source(&tmp, "cat.jpg", JPEG_HEADER);
        let config = TransformConfig {
            quality: 70,
            ..TransformConfig::default()
        };

        let codec = MockCodec::with_dimensions(vec![dims(800, 600)]);
        let mut pipeline = Pipeline::new(&codec, &config, request(&source, 400, 300)).unwrap();
        pipeline.response().unwrap();
        assert!(matches!(
            codec.recorded().last(),
            Some(RecordedOp::Encode { quality: Some(70), .. })
        ));

        let codec = MockCodec::with_dimensions(vec![dims(800, 600)]);
        let explicit = request(&source, 400, 300).with_params(RequestParams {
            quality: Some(40),
            ..RequestParams::default()
        });
        let mut pipeline = Pipeline::new(&codec, &config, explicit).unwrap();
        pipeline.response().unwrap();
        assert!(matches!(
            codec.recorded().last(),
            Some(RecordedOp::Encode { quality: Some(40), .. })
        ));
    }

    #[test]
    fn response_wraps_encoded_bytes_with_status_200() {
        let tmp = TempDir::new().unwrap();
        let source = write_source(&tmp, "cat.jpg", JPEG_HEADER);
        let codec = MockCodec::with_dimensions(vec![dims(800, 600)]);
        let config = TransformConfig::default();

        let mut pipeline = Pipeline::new(&codec, &config, request(&source, 400, 300)).unwrap();
        let rendered = pipeline.response().unwrap();

        assert_eq!(rendered.body, MOCK_ENCODED);
        assert_eq!(rendered.status, 200);
    }

    // =========================================================================
    // Watermark
    // =========================================================================

    #[test]
    fn watermark_shrinks_overlay_and_pastes_bottom_right() {
        let tmp = TempDir::new().unwrap();
        let source = write_source(&tmp, "cat.jpg", JPEG_HEADER);
        let overlay = write_source(&tmp, "watermark.png", PNG_HEADER);
        // Decode order: base, probe, overlay sub-pipeline (popped from the end)
        let codec = MockCodec::with_dimensions(vec![
            dims(1000, 1000),
            dims(1000, 1000),
            dims(300, 200),
        ]);
        let config = TransformConfig {
            watermark: Some(overlay),
            ..TransformConfig::default()
        };

        let mut pipeline = Pipeline::new(&codec, &config, request(&source, 300, 200)).unwrap();
        pipeline.process().unwrap();

        // 1000x1000 → /3.5 → 285.7 (too tall for 200) → /3.5 → 81x81,
        // pasted at (300-81-5, 200-81-5)
        assert_eq!(codec.decode_count(), 3);
        let ops = codec.recorded();
        assert!(ops.contains(&RecordedOp::Resize { width: 81, height: 81 }));
        assert!(matches!(
            ops.last(),
            Some(RecordedOp::Overlay { x: 214, y: 114 })
        ));
    }

    #[test]
    fn watermark_skips_silently_when_not_configured() {
        let tmp = TempDir::new().unwrap();
        let source = write_source(&tmp, "cat.jpg", JPEG_HEADER);
        let codec = MockCodec::with_dimensions(vec![dims(800, 600)]);
        let config = TransformConfig::default();

        let mut pipeline = Pipeline::new(&codec, &config, request(&source, 400, 300)).unwrap();
        pipeline.process().unwrap();

        assert_eq!(codec.decode_count(), 1);
        assert!(!codec
            .recorded()
            .iter()
            .any(|op| matches!(op, RecordedOp::Overlay { .. })));
    }

    #[test]
    fn watermark_false_sentinel_disables_compositing() {
        let tmp = TempDir::new().unwrap();
        let source = write_source(&tmp, "cat.jpg", JPEG_HEADER);
        let overlay = write_source(&tmp, "watermark.png", PNG_HEADER);
        let codec = MockCodec::with_dimensions(vec![dims(800, 600)]);
        let config = TransformConfig {
            watermark: Some(overlay),
            ..TransformConfig::default()
        };

        let request = request(&source, 400, 300).with_params(RequestParams {
            watermark: Some(false),
            ..RequestParams::default()
        });
        let mut pipeline = Pipeline::new(&codec, &config, request).unwrap();
        pipeline.process().unwrap();

        assert_eq!(codec.decode_count(), 1);
    }

    #[test]
    fn watermark_against_degenerate_base_is_a_fault() {
        let tmp = TempDir::new().unwrap();
        let source = write_source(&tmp, "cat.jpg", JPEG_HEADER);
        let overlay = write_source(&tmp, "watermark.png", PNG_HEADER);
        // Base decodes to 1x1: nothing can fit strictly inside it
        let codec = MockCodec::with_dimensions(vec![dims(500, 500), dims(1, 1)]);
        let config = TransformConfig {
            watermark: Some(overlay),
            ..TransformConfig::default()
        };

        let mut pipeline = Pipeline::new(&codec, &config, request(&source, 1, 1)).unwrap();
        let err = pipeline.process().unwrap_err();
        assert!(matches!(err, TransformError::Fit(FitError::Exhausted(_))));
    }

    // =========================================================================
    // Cache paths and save
    // =========================================================================

    #[test]
    fn cache_path_ignores_quality() {
        let tmp = TempDir::new().unwrap();
        let source = write_source(&tmp, "cat.jpg", JPEG_HEADER);
        let codec = MockCodec::new();
        let config = TransformConfig::default();

        let plain = Pipeline::new(&codec, &config, request(&source, 400, 300)).unwrap();
        let with_quality = request(&source, 400, 300).with_params(RequestParams {
            quality: Some(10),
            ..RequestParams::default()
        });
        let with_quality = Pipeline::new(&codec, &config, with_quality).unwrap();

        assert_eq!(
            plain.cache_path().unwrap(),
            with_quality.cache_path().unwrap()
        );
    }

    #[test]
    fn cache_path_separates_watermarked_outputs() {
        let tmp = TempDir::new().unwrap();
        let source = write_source(&tmp, "cat.jpg", JPEG_HEADER);
        let codec = MockCodec::new();
        let config = TransformConfig::default();

        let marked = Pipeline::new(&codec, &config, request(&source, 400, 300)).unwrap();
        let plain = request(&source, 400, 300).with_params(RequestParams {
            watermark: Some(false),
            ..RequestParams::default()
        });
        let plain = Pipeline::new(&codec, &config, plain).unwrap();

        let marked_path = marked.cache_path().unwrap();
        assert_ne!(marked_path, plain.cache_path().unwrap());
        assert!(marked_path.contains("/w/"));
    }

    #[test]
    fn save_creates_parent_directories_at_the_derived_path() {
        let tmp = TempDir::new().unwrap();
        let source = write_source(&tmp, "cat.jpg", JPEG_HEADER);
        let codec = MockCodec::with_dimensions(vec![dims(800, 600)]);
        let mut config = TransformConfig::default();
        config.routes.base_route = tmp.path().join("cache").to_string_lossy().into_owned();

        let request = request(&source, 400, 300).with_params(RequestParams {
            watermark: Some(false),
            ..RequestParams::default()
        });
        let mut pipeline = Pipeline::new(&codec, &config, request).unwrap();
        let saved = pipeline.save().unwrap();

        assert!(saved.parent().unwrap().exists());
        assert!(matches!(
            codec.recorded().last(),
            Some(RecordedOp::Save { path, .. }) if *path == saved.to_string_lossy()
        ));
    }

    // =========================================================================
    // Option derivation
    // =========================================================================

    #[test]
    fn png_compression_level_spans_the_quality_range() {
        assert_eq!(png_compression_level(100), 0);
        assert_eq!(png_compression_level(90), 1);
        assert_eq!(png_compression_level(55), 4);
        assert_eq!(png_compression_level(0), 9);
    }
}
