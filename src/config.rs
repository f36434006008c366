//! Configuration types for batch conversion.
//!
//! All conversion behaviour is controlled through [`BatchConfig`], built via
//! its [`BatchConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share configs across tasks, serialise them for logging, and
//! diff two runs to understand why their outputs differ.

use crate::error::BatchError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// The image format of the final artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Rasterised via `rsvg-convert`. (default)
    #[default]
    Png,
    /// Rasterised like PNG, then flattened onto a white background
    /// (JPEG has no alpha channel) and encoded at quality 95.
    Jpg,
    /// The `dvisvgm` output, copied as-is.
    Svg,
}

impl OutputFormat {
    /// File extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpg => "jpg",
            OutputFormat::Svg => "svg",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = BatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpg" | "jpeg" => Ok(OutputFormat::Jpg),
            "svg" => Ok(OutputFormat::Svg),
            other => Err(BatchError::InvalidConfig(format!(
                "unknown output format '{other}' (expected png, jpg, or svg)"
            ))),
        }
    }
}

/// Parse a scale argument into a decimal factor.
///
/// Accepts a percentage string (`"125%"` → `1.25`) or a bare decimal
/// (`"1.25"` → `1.25`). The result must be a positive, finite number.
pub fn parse_scale(s: &str) -> Result<f64, BatchError> {
    let trimmed = s.trim();
    let (number, divisor) = match trimmed.strip_suffix('%') {
        Some(pct) => (pct.trim(), 100.0),
        None => (trimmed, 1.0),
    };
    let value: f64 = number.parse().map_err(|_| {
        BatchError::InvalidConfig(format!("invalid scale '{s}' (expected e.g. '125%' or '1.25')"))
    })?;
    let factor = value / divisor;
    if !factor.is_finite() || factor <= 0.0 {
        return Err(BatchError::InvalidConfig(format!(
            "scale must be a positive number, got '{s}'"
        )));
    }
    Ok(factor)
}

/// Configuration for a batch conversion run.
///
/// Built via [`BatchConfig::builder()`] or using [`BatchConfig::default()`].
///
/// # Example
/// ```rust
/// use tex2img::{BatchConfig, OutputFormat};
///
/// let config = BatchConfig::builder()
///     .format(OutputFormat::Svg)
///     .scale_percent("150%")
///     .output_dir("rendered")
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Final artifact format. Default: [`OutputFormat::Png`].
    pub format: OutputFormat,

    /// Scale factor applied by `dvisvgm`. Default: 1.25 (the `125%` CLI default).
    pub scale: f64,

    /// Directory the artifacts are placed in. Created on demand. Default: `output`.
    pub output_dir: PathBuf,

    /// Number of items processed concurrently. Default: 1 (sequential).
    ///
    /// Each item owns a private scratch workspace and a unique output
    /// filename, so items are safe to run in parallel; the summary report is
    /// always reinstated to input order regardless.
    pub concurrency: usize,

    /// Keep each item's scratch workspace instead of deleting it. Default: false.
    ///
    /// The workspace path is logged at INFO level so the `.tex` source and
    /// the raw tool logs can be inspected after a failure.
    pub keep_temp: bool,

    /// Timeout for the `latex` invocation, per item. Default: 30 s.
    pub latex_timeout_secs: u64,

    /// Timeout for each conversion-tool invocation, per item. Default: 20 s.
    pub convert_timeout_secs: u64,

    /// JPEG encoding quality (1–100). Default: 95.
    pub jpeg_quality: u8,

    /// Typesetting command. Default: `latex`.
    pub latex_command: String,

    /// DVI-to-SVG command. Default: `dvisvgm`.
    pub dvisvgm_command: String,

    /// SVG rasteriser command. Default: `rsvg-convert`.
    pub rsvg_command: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Png,
            scale: 1.25,
            output_dir: PathBuf::from("output"),
            concurrency: 1,
            keep_temp: false,
            latex_timeout_secs: 30,
            convert_timeout_secs: 20,
            jpeg_quality: 95,
            latex_command: "latex".to_string(),
            dvisvgm_command: "dvisvgm".to_string(),
            rsvg_command: "rsvg-convert".to_string(),
        }
    }
}

impl BatchConfig {
    /// Create a new builder for `BatchConfig`.
    pub fn builder() -> BatchConfigBuilder {
        BatchConfigBuilder {
            config: Self::default(),
            scale_error: None,
        }
    }
}

/// Builder for [`BatchConfig`].
#[derive(Debug)]
pub struct BatchConfigBuilder {
    config: BatchConfig,
    // A bad scale string is remembered and surfaced from build(), so the
    // builder chain itself stays infallible.
    scale_error: Option<BatchError>,
}

impl BatchConfigBuilder {
    pub fn format(mut self, format: OutputFormat) -> Self {
        self.config.format = format;
        self
    }

    /// Set the scale from an already-parsed factor.
    pub fn scale(mut self, factor: f64) -> Self {
        self.config.scale = factor;
        self
    }

    /// Set the scale from a percentage string such as `"125%"`.
    pub fn scale_percent(mut self, s: impl AsRef<str>) -> Self {
        match parse_scale(s.as_ref()) {
            Ok(factor) => self.config.scale = factor,
            Err(e) => self.scale_error = Some(e),
        }
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn keep_temp(mut self, v: bool) -> Self {
        self.config.keep_temp = v;
        self
    }

    pub fn latex_timeout_secs(mut self, secs: u64) -> Self {
        self.config.latex_timeout_secs = secs;
        self
    }

    pub fn convert_timeout_secs(mut self, secs: u64) -> Self {
        self.config.convert_timeout_secs = secs;
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q.clamp(1, 100);
        self
    }

    pub fn latex_command(mut self, cmd: impl Into<String>) -> Self {
        self.config.latex_command = cmd.into();
        self
    }

    pub fn dvisvgm_command(mut self, cmd: impl Into<String>) -> Self {
        self.config.dvisvgm_command = cmd.into();
        self
    }

    pub fn rsvg_command(mut self, cmd: impl Into<String>) -> Self {
        self.config.rsvg_command = cmd.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<BatchConfig, BatchError> {
        if let Some(e) = self.scale_error {
            return Err(e);
        }
        let c = &self.config;
        if !c.scale.is_finite() || c.scale <= 0.0 {
            return Err(BatchError::InvalidConfig(format!(
                "scale must be positive, got {}",
                c.scale
            )));
        }
        if c.concurrency == 0 {
            return Err(BatchError::InvalidConfig("concurrency must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}
