//! Transformation requests: the declarative parameter set.
//!
//! A [`TransformRequest`] pairs a [`Source`] with [`RequestParams`]. Params
//! are built up by overlay: later [`TransformRequest::set_params`] calls
//! merge into what is already there — set fields win, free-form extras are
//! merged additively, nothing is wholesale replaced. Once a pipeline starts
//! processing, the request is fixed.

use crate::imaging::{Method, UndefinedMethodError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// A source image reference.
///
/// Plain paths are the common case; structured sources carry a nested `file`
/// identifier (e.g. an upload record) and are unwrapped to it wherever a
/// path is needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Source {
    Path(PathBuf),
    Record { file: PathBuf },
}

impl Source {
    /// The file path this source points at.
    pub fn file(&self) -> &Path {
        match self {
            Source::Path(path) => path,
            Source::Record { file } => file,
        }
    }
}

#[derive(Error, Debug)]
#[error("invalid structured source: {0}")]
pub struct InvalidSource(#[from] serde_json::Error);

impl FromStr for Source {
    type Err = InvalidSource;

    /// Parse a plain path, or a JSON object with a `file` key when the value
    /// starts with `{`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim_start().starts_with('{') {
            Ok(serde_json::from_str(s)?)
        } else {
            Ok(Source::Path(PathBuf::from(s)))
        }
    }
}

/// Named transformation parameters.
///
/// All fields are optional so partial sets can overlay each other; the
/// pipeline enforces that width and height are present before processing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub method: Option<Method>,
    pub quality: Option<u32>,
    pub watermark: Option<bool>,
    /// Free-form options forwarded to the encoder untouched.
    pub extra: BTreeMap<String, String>,
}

/// A parameter value that could not be interpreted.
#[derive(Error, Debug)]
pub enum ParamError {
    #[error(transparent)]
    UndefinedMethod(#[from] UndefinedMethodError),
    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

impl RequestParams {
    /// Overlay `other` onto `self`: set fields replace, extras merge per key.
    pub fn merge(&mut self, other: RequestParams) {
        if other.width.is_some() {
            self.width = other.width;
        }
        if other.height.is_some() {
            self.height = other.height;
        }
        if other.method.is_some() {
            self.method = other.method;
        }
        if other.quality.is_some() {
            self.quality = other.quality;
        }
        if other.watermark.is_some() {
            self.watermark = other.watermark;
        }
        self.extra.extend(other.extra);
    }

    /// Build params from name/value string pairs.
    ///
    /// The well-known names (`width`, `height`, `method`, `quality`,
    /// `watermark`) are parsed into their typed fields; anything else lands
    /// in `extra` verbatim.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ParamError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = Self::default();
        for (name, value) in pairs {
            let value = value.into();
            match name.as_ref() {
                "width" => params.width = Some(parse_number("width", &value)?),
                "height" => params.height = Some(parse_number("height", &value)?),
                "quality" => params.quality = Some(parse_number("quality", &value)?),
                "method" => params.method = Some(value.parse()?),
                "watermark" => params.watermark = Some(parse_flag("watermark", &value)?),
                _ => {
                    params.extra.insert(name.as_ref().to_string(), value);
                }
            }
        }
        Ok(params)
    }
}

fn parse_number(name: &'static str, value: &str) -> Result<u32, ParamError> {
    value.parse().map_err(|_| ParamError::InvalidValue {
        name,
        value: value.to_string(),
    })
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ParamError> {
    match value {
        "true" | "1" | "on" => Ok(true),
        "false" | "0" | "off" => Ok(false),
        _ => Err(ParamError::InvalidValue {
            name,
            value: value.to_string(),
        }),
    }
}

/// A source plus its merged parameters — one transformation to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformRequest {
    source: Source,
    params: RequestParams,
}

impl TransformRequest {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            params: RequestParams::default(),
        }
    }

    pub fn with_params(mut self, params: RequestParams) -> Self {
        self.set_params(params);
        self
    }

    /// Overlay additional parameters; existing keys survive unless overridden.
    pub fn set_params(&mut self, params: RequestParams) {
        self.params.merge(params);
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn width(&self) -> Option<u32> {
        self.params.width
    }

    pub fn height(&self) -> Option<u32> {
        self.params.height
    }

    /// The transformation method, defaulting to resize.
    pub fn method(&self) -> Method {
        self.params.method.unwrap_or_default()
    }

    pub fn quality(&self) -> Option<u32> {
        self.params.quality
    }

    /// Watermarking is on unless the request explicitly disables it.
    pub fn watermark_enabled(&self) -> bool {
        self.params.watermark != Some(false)
    }

    pub fn extra(&self) -> &BTreeMap<String, String> {
        &self.params.extra
    }
}
