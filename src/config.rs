//! Transformation service configuration.
//!
//! Handles loading and validating an optional `thumbsmith.toml`. All values
//! have stock defaults; user files are sparse and override only what they
//! name. Unknown keys are rejected to catch typos early.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! # default_source = "assets/placeholder.png"  # Fallback when a source is missing
//! quality = 90                                 # Encoder quality (0-100)
//! # watermark = "assets/watermark.png"         # Overlay source; absent = no watermarking
//!
//! [limits]
//! # min.width = 16                             # Each bound is independently optional
//! # min.height = 16
//! # max.width = 4096
//! # max.height = 4096
//!
//! [routes]
//! base_route = "cache"                         # Prefix of every derived path
//! route = "{method}/{width}/{height}/{source}" # Placeholder template
//! ```
//!
//! Configuration is passed explicitly into pipeline construction — there is
//! no process-wide lookup.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Service configuration loaded from `thumbsmith.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformConfig {
    /// Fallback source used when a requested source file is missing.
    pub default_source: Option<PathBuf>,
    /// Encoder quality applied when a request does not set one.
    pub quality: u32,
    /// Watermark overlay source. Absent means watermarking silently skips.
    pub watermark: Option<PathBuf>,
    /// Request dimension bounds.
    pub limits: LimitsConfig,
    /// Cache path derivation.
    pub routes: RoutesConfig,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            default_source: None,
            quality: default_quality(),
            watermark: None,
            limits: LimitsConfig::default(),
            routes: RoutesConfig::default(),
        }
    }
}

fn default_quality() -> u32 {
    90
}

/// Per-axis dimension bounds. Every bound is independently optional;
/// an unset bound skips its check.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    pub min: LimitLine,
    pub max: LimitLine,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitLine {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Route template settings for cache path derivation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoutesConfig {
    /// Prefix of every derived path.
    pub base_route: String,
    /// Placeholder template; must mention every cache key field so distinct
    /// keys cannot share a path.
    pub route: String,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            base_route: "cache".to_string(),
            route: "{method}/{width}/{height}/{source}".to_string(),
        }
    }
}

impl TransformConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.quality > 100 {
            return Err(ConfigError::Validation("quality must be 0-100".into()));
        }
        for (axis, min, max) in [
            ("width", self.limits.min.width, self.limits.max.width),
            ("height", self.limits.min.height, self.limits.max.height),
        ] {
            if let (Some(min), Some(max)) = (min, max)
                && min > max
            {
                return Err(ConfigError::Validation(format!(
                    "limits.min.{axis} ({min}) exceeds limits.max.{axis} ({max})"
                )));
            }
        }
        for placeholder in ["{method}", "{width}", "{height}", "{source}"] {
            if !self.routes.route.contains(placeholder) {
                return Err(ConfigError::Validation(format!(
                    "routes.route must contain the {placeholder} placeholder"
                )));
            }
        }
        Ok(())
    }
}

/// Stock `thumbsmith.toml` with every option documented.
pub fn stock_config_toml() -> String {
    let defaults = RoutesConfig::default();
    format!(
        r#"# thumbsmith configuration - all options shown with their defaults.
# Commented options default to "unset".

# Fallback source served when a requested source file does not exist.
# Without it, missing sources are an error.
# default_source = "assets/placeholder.png"

# Encoder quality (0-100) applied when a request does not set one.
# For PNG output this derives the compression level instead.
quality = 90

# Watermark overlay composited bottom-right onto every transformed image
# (unless a request disables it). Absent = watermarking is skipped.
# watermark = "assets/watermark.png"

[limits]
# Requested dimensions outside these bounds are rejected.
# Each bound is independently optional.
# min.width = 16
# min.height = 16
# max.width = 4096
# max.height = 4096

[routes]
# Every transformed image is cached at base_route/route with the
# placeholders substituted. The route must mention {{method}}, {{width}},
# {{height}} and {{source}} so distinct transformations never collide.
base_route = "{base_route}"
route = "{route}"
"#,
        base_route = defaults.base_route,
        route = defaults.route,
    )
}
