//! # thumbsmith
//!
//! On-demand raster image transformation with deterministic cache paths.
//! A caller supplies a source image and a declarative parameter set (target
//! box, method, quality, watermark flag); thumbsmith derives the canonical
//! cache path for that exact transformation, and — when the cached file is
//! absent — decodes, transforms, optionally watermarks, and encodes the
//! result for delivery or persistence.
//!
//! # Architecture: Request-Scoped Pipeline
//!
//! Each transformation runs through its own [`pipeline::Pipeline`] instance,
//! built from an explicit [`config::TransformConfig`] and an
//! [`imaging::ImageCodec`] implementation:
//!
//! ```text
//! request ──→ cache path (pure)  ──→ already on disk? serve it
//!        └──→ validate → decode → geometry → resize|crop → watermark
//!             └──→ encode bytes (response) or save at the cache path
//! ```
//!
//! This separation exists for three reasons:
//!
//! - **Idempotence**: a pipeline instance processes at most once; repeated
//!   response/save calls reuse the result.
//! - **Re-entrancy**: watermarking runs the overlay image through a fresh
//!   pipeline instance — no shared mutable state, no globals.
//! - **Testability**: the codec is a trait; pipeline logic is exercised
//!   against a recording mock without decoding a single pixel.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`request`] | `TransformRequest`: source + overlay-merged parameters |
//! | [`pipeline`] | The at-most-once state machine: validate → decode → dispatch → watermark → encode/save |
//! | [`resolver`] | Pure cache path derivation from the parameter key |
//! | [`config`] | `thumbsmith.toml` loading, validation, stock config |
//! | [`imaging`] | Geometry math, format sniffing, the codec trait and its `image`-crate implementation |
//!
//! # Design Decisions
//!
//! ## Content-Based Format Detection
//!
//! Output format and mime type come from the source file's signature bytes
//! ([`imaging::format`]), never its extension. A mislabeled file cannot be
//! served with the wrong mime, and an unrecognized signature degrades to "no
//! mime" instead of failing the request.
//!
//! ## The Cache Key Is Deliberately Small
//!
//! Only method, width, height, source and the watermark flag reach the
//! [`resolver`]. Encoder quality does not: two requests for the same
//! geometry at different qualities share one cache entry, because serving a
//! re-encode of identical geometry is cheaper than fragmenting the cache.
//!
//! ## Codec As a Capability
//!
//! The `image` crate is wrapped behind [`imaging::ImageCodec`]
//! ([`imaging::RustCodec`] in production). The pipeline owns every decision
//! — boxes, offsets, shrink steps, formats — and the codec only moves
//! pixels. Pure Rust, statically linked, no system dependencies.

pub mod config;
pub mod imaging;
pub mod pipeline;
pub mod request;
pub mod resolver;
