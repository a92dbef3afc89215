//! Responsive image configuration.
//!
//! Handles loading, validating, and merging `respimg.toml` files. Stock
//! defaults are the base layer; each config file found is merged on top, so a
//! file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [scaling]
//! small_scaling_factor = 0.25   # Fraction of the target size for the small tier
//! medium_scaling_factor = 0.5   # Fraction of the target size for the medium tier
//! tiny_max_size = 64            # Ceiling for the tiny tier's driving axis (px)
//!
//! [method]
//! default_method = "SetWidth"   # Used when a placement names no method
//! zero_dimensions = "lenient"   # "lenient" or "strict"
//!
//! [placeholder]
//! blur_sigma = 8.0              # Gaussian blur of the tiny placeholder
//!
//! [images]
//! quality = 90                  # Encoder quality for derived assets (0-100)
//! resampled_dir = "_resampled"  # Where derived assets go, next to the original
//!
//! [render]
//! source_file_comments = false  # Wrap rendered fragments in template comments
//! base_class = "responsive-image"
//!
//! [processing]
//! max_processes = 4             # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::descriptor::ResponsiveSettings;
use crate::imaging::{Quality, ResizeMethod, ScalingFactors, ZeroDimensionPolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up in a config directory.
pub const CONFIG_FILE_NAME: &str = "respimg.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `respimg.toml`.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResponsiveConfig {
    /// Per-tier scaling factors.
    pub scaling: ScalingConfig,
    /// Method defaults and zero-dimension handling.
    pub method: MethodConfig,
    /// Blurred tiny placeholder.
    pub placeholder: PlaceholderConfig,
    /// Derived asset encoding and location.
    pub images: ImagesConfig,
    /// Template rendering.
    pub render: RenderConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl ResponsiveConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let small = self.scaling.small_scaling_factor;
        let medium = self.scaling.medium_scaling_factor;
        if !(small > 0.0 && small <= 1.0) {
            return Err(ConfigError::Validation(
                "scaling.small_scaling_factor must be in (0, 1]".into(),
            ));
        }
        if !(medium > 0.0 && medium <= 1.0) {
            return Err(ConfigError::Validation(
                "scaling.medium_scaling_factor must be in (0, 1]".into(),
            ));
        }
        if medium < small {
            return Err(ConfigError::Validation(
                "scaling.medium_scaling_factor must not be below small_scaling_factor".into(),
            ));
        }
        if self.scaling.tiny_max_size == 0 {
            return Err(ConfigError::Validation(
                "scaling.tiny_max_size must be non-zero".into(),
            ));
        }
        if !(self.placeholder.blur_sigma.is_finite() && self.placeholder.blur_sigma > 0.0) {
            return Err(ConfigError::Validation(
                "placeholder.blur_sigma must be positive".into(),
            ));
        }
        if self.images.quality > 100 {
            return Err(ConfigError::Validation(
                "images.quality must be 0-100".into(),
            ));
        }
        if self.images.resampled_dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "images.resampled_dir must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Settings for one descriptor.
    pub fn settings(&self) -> ResponsiveSettings {
        ResponsiveSettings {
            factors: ScalingFactors {
                small: self.scaling.small_scaling_factor,
                medium: self.scaling.medium_scaling_factor,
                tiny_max_size: f64::from(self.scaling.tiny_max_size),
            },
            default_method: self.method.default_method,
            zero_policy: self.method.zero_dimensions,
            blur_sigma: self.placeholder.blur_sigma,
            quality: Quality::new(self.images.quality),
            base_class: self.render.base_class.clone(),
        }
    }
}

/// Per-tier scaling factors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScalingConfig {
    pub small_scaling_factor: f64,
    pub medium_scaling_factor: f64,
    pub tiny_max_size: u32,
}

impl Default for ScalingConfig {
    fn default() -> Self {
        Self {
            small_scaling_factor: 0.25,
            medium_scaling_factor: 0.5,
            tiny_max_size: 64,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MethodConfig {
    pub default_method: ResizeMethod,
    pub zero_dimensions: ZeroDimensionPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaceholderConfig {
    /// Gaussian standard deviation in pixels.
    pub blur_sigma: f32,
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self { blur_sigma: 8.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Encoding quality (0 = worst, 100 = best).
    pub quality: u32,
    /// Directory for derived assets, relative to the original's directory.
    pub resampled_dir: String,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            quality: 90,
            resampled_dir: "_resampled".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Initial value of the process-wide source comment toggle.
    pub source_file_comments: bool,
    pub base_class: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            source_file_comments: false,
            base_class: "responsive-image".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer that user overrides are merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ResponsiveConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `respimg.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no config file.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge overlays onto a base value in order, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlays: impl IntoIterator<Item = toml::Value>,
) -> Result<ResponsiveConfig, ConfigError> {
    let merged = overlays.into_iter().fold(base, merge_toml);
    let config: ResponsiveConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `respimg.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<ResponsiveConfig, ConfigError> {
    load_config_layers(&[dir])
}

/// Load and merge `respimg.toml` from several directories, later ones winning.
///
/// Directories without a config file are skipped.
pub fn load_config_layers(dirs: &[&Path]) -> Result<ResponsiveConfig, ConfigError> {
    let mut overlays = Vec::new();
    for dir in dirs {
        if let Some(value) = load_raw_config(dir)? {
            overlays.push(value);
        }
    }
    resolve_config(stock_defaults_value(), overlays)
}

/// Returns a fully-commented stock `respimg.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# respimg configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Tier scaling
# ---------------------------------------------------------------------------
[scaling]
# Fraction of the target size used for the small tier. The tiny tier uses
# half of this, capped at tiny_max_size.
small_scaling_factor = 0.25

# Fraction of the target size used for the medium tier.
medium_scaling_factor = 0.5

# Hard ceiling (px) on the tiny tier's driving axis.
tiny_max_size = 64

# ---------------------------------------------------------------------------
# Resize method
# ---------------------------------------------------------------------------
[method]
# One of: SetWidth, ScaleWidth, SetHeight, ScaleHeight, SetSize, Pad,
# SetRatioSize, Fit, CroppedImage, Fill, FillMax.
default_method = "SetWidth"

# "lenient": zero or negative sizes produce a degenerate result.
# "strict": they are an error.
zero_dimensions = "lenient"

# ---------------------------------------------------------------------------
# Blurred placeholder
# ---------------------------------------------------------------------------
[placeholder]
# Gaussian blur sigma (px) applied to the tiny tier.
blur_sigma = 8.0

# ---------------------------------------------------------------------------
# Derived images
# ---------------------------------------------------------------------------
[images]
# Encoding quality (0 = worst, 100 = best).
quality = 90

# Directory for derived assets, relative to the original image.
resampled_dir = "_resampled"

# ---------------------------------------------------------------------------
# Rendering
# ---------------------------------------------------------------------------
[render]
# Wrap rendered fragments in <!-- template --> comments.
source_file_comments = false

# Class carried by every rendered tag.
base_class = "responsive-image"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-processing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
