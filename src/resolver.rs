//! Deterministic cache path derivation.
//!
//! A [`CachePathKey`] carries the exact fields that determine output
//! identity: method, width, height, source, and the watermark flag. Nothing
//! else — in particular, quality and free-form encoder options never reach
//! the resolver, so re-encoding parameters cannot fragment the cache.
//!
//! Resolution substitutes the key into a configured route template.
//! Watermarked keys additionally prefix the source with a `w/` segment and
//! substitute the `{watermark}` placeholder with the marker, so watermarked
//! and plain outputs for identical geometry never share a path.

use crate::imaging::Method;
use crate::request::Source;

/// Marker segment distinguishing watermarked cache entries.
pub const WATERMARK_MARKER: &str = "w";

/// The parameter subset that determines output file identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePathKey<'a> {
    pub method: Method,
    pub width: u32,
    pub height: u32,
    pub source: &'a Source,
    pub watermark: bool,
}

/// Substitutes cache path keys into a route template.
#[derive(Debug, Clone)]
pub struct PathResolver {
    template: String,
}

impl PathResolver {
    /// Join a base route and a placeholder route into one template.
    pub fn new(base_route: &str, route: &str) -> Self {
        Self {
            template: format!(
                "{}/{}",
                base_route.trim_end_matches('/'),
                route.trim_start_matches('/')
            ),
        }
    }

    /// Replace the named placeholders with the key's literal values.
    ///
    /// Structured sources are unwrapped to their `file` field. Placeholders
    /// the template does not mention are simply ignored; an un-watermarked
    /// key leaves any `{watermark}` placeholder untouched.
    pub fn resolve(&self, key: &CachePathKey<'_>) -> String {
        let mut source = key.source.file().to_string_lossy().into_owned();
        let mut path = self.template.clone();
        if key.watermark {
            source = format!("{WATERMARK_MARKER}/{source}");
            path = path.replace("{watermark}", WATERMARK_MARKER);
        }
        path.replace("{method}", key.method.as_str())
            .replace("{width}", &key.width.to_string())
            .replace("{height}", &key.height.to_string())
            .replace("{source}", &source)
    }
}
