//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They sit between
//! the sizing logic (which decides which derived assets a page needs) and the
//! [`backend`](super::backend) (which does the pixel work), so a mock backend
//! can stand in for the real one in tests.
//!
//! ## Types
//!
//! - [`ResizeMethod`]: the resampling strategy requested for a derived asset.
//! - [`VariantRequest`]: method plus the dimensions handed to the image provider.
//! - [`Quality`]: lossy encoding quality (1-100, default 90). Clamped on construction.
//! - [`ResizeParams`]: everything needed to produce one derived file.
//! - [`BlurParams`]: Gaussian blur of a derived file into its own output file.

use super::calculations::Size;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Resampling strategy for a derived asset.
///
/// The variant names are the public method names used in config files and on
/// the command line. Whether a method is height-driven is decided by its name
/// (see [`drives_height`](Self::drives_height)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ResizeMethod {
    /// Scale to a width, keep the aspect ratio.
    #[default]
    SetWidth,
    /// Alias of `SetWidth` that always rescales.
    ScaleWidth,
    /// Scale to a height, keep the aspect ratio.
    SetHeight,
    /// Alias of `SetHeight` that always rescales.
    ScaleHeight,
    /// Fit inside a box, then pad to the exact box.
    SetSize,
    /// Same as `SetSize`.
    Pad,
    /// Fit inside a box, keep the aspect ratio.
    SetRatioSize,
    /// Same as `SetRatioSize`.
    Fit,
    /// Fill the box and crop the overflow from the centre.
    CroppedImage,
    /// Same as `CroppedImage`.
    Fill,
    /// Like `Fill`, but never upscales the source.
    FillMax,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown resize method: {0}")]
pub struct UnknownMethod(pub String);

impl ResizeMethod {
    pub const ALL: [ResizeMethod; 11] = [
        ResizeMethod::SetWidth,
        ResizeMethod::ScaleWidth,
        ResizeMethod::SetHeight,
        ResizeMethod::ScaleHeight,
        ResizeMethod::SetSize,
        ResizeMethod::Pad,
        ResizeMethod::SetRatioSize,
        ResizeMethod::Fit,
        ResizeMethod::CroppedImage,
        ResizeMethod::Fill,
        ResizeMethod::FillMax,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ResizeMethod::SetWidth => "SetWidth",
            ResizeMethod::ScaleWidth => "ScaleWidth",
            ResizeMethod::SetHeight => "SetHeight",
            ResizeMethod::ScaleHeight => "ScaleHeight",
            ResizeMethod::SetSize => "SetSize",
            ResizeMethod::Pad => "Pad",
            ResizeMethod::SetRatioSize => "SetRatioSize",
            ResizeMethod::Fit => "Fit",
            ResizeMethod::CroppedImage => "CroppedImage",
            ResizeMethod::Fill => "Fill",
            ResizeMethod::FillMax => "FillMax",
        }
    }

    /// Height-driven methods are exactly those whose name contains "Height".
    pub fn drives_height(self) -> bool {
        self.name().contains("Height")
    }

    /// Width-driven by name. Methods that are neither (crop/fit/pad) use the
    /// target box as given.
    pub fn drives_width(self) -> bool {
        self.name().contains("Width")
    }

    /// FillMax always receives both dimensions, on every tier.
    pub fn requires_both_dimensions(self) -> bool {
        self == ResizeMethod::FillMax
    }
}

impl fmt::Display for ResizeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResizeMethod {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResizeMethod::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownMethod(s.to_string()))
    }
}

/// What the sizing logic asks the image provider for.
///
/// Height-driven methods pass the height alone, FillMax passes both, and every
/// other method passes width and height (width-only methods ignore the height).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariantRequest {
    pub method: ResizeMethod,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl VariantRequest {
    /// Build the request for one computed tier size. Fractional sizes are
    /// floored, matching the `"<int>w"` / `"<int>h"` descriptors.
    pub fn for_size(method: ResizeMethod, size: Size) -> Self {
        let width = floor_px(size.width);
        let height = floor_px(size.height);
        if method.drives_height() && !method.requires_both_dimensions() {
            Self {
                method,
                width: None,
                height: Some(height),
            }
        } else {
            Self {
                method,
                width: Some(width),
                height: Some(height),
            }
        }
    }
}

fn floor_px(value: f64) -> u32 {
    // `as` saturates: NaN and negatives become 0
    value.floor() as u32
}

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
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

/// Parameters for producing one derived file from a source image.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub request: VariantRequest,
    pub quality: Quality,
}

/// Parameters for blurring an existing file into a separate output file.
#[derive(Debug, Clone, PartialEq)]
pub struct BlurParams {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Gaussian standard deviation in pixels.
    pub sigma: f32,
    pub quality: Quality,
}
