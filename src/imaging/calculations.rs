//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.
//!
//! Two groups live here:
//!
//! - **Tier sizing**: [`compute_dimensions`] derives the tiny/small/medium/large
//!   sizes a responsive tag advertises, and [`compute_from_minimum`] keeps the
//!   older minimum-size based derivation available.
//! - **Resize geometry**: the box math the backend needs to execute a
//!   [`ResizeMethod`](super::ResizeMethod) (fit, fill, fill-without-upscale).

use super::params::ResizeMethod;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DimensionError {
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimension { width: f64, height: f64 },
    #[error("source image has 0 height")]
    ZeroHeight,
}

/// A width/height pair. Fractional until a tier accessor floors it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether this is exactly `width`×`height`, e.g. an original's intrinsic size.
    pub fn is_exactly(&self, width: u32, height: u32) -> bool {
        self.width == f64::from(width) && self.height == f64::from(height)
    }
}

/// Named target size derived from the original.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Tiny,
    Small,
    Medium,
    Large,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Tiny, Tier::Small, Tier::Medium, Tier::Large];

    pub fn name(self) -> &'static str {
        match self {
            Tier::Tiny => "tiny",
            Tier::Small => "small",
            Tier::Medium => "medium",
            Tier::Large => "large",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-tier scaling ratios.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalingFactors {
    /// Fraction of the target size used for the small tier.
    pub small: f64,
    /// Fraction of the target size used for the medium tier.
    pub medium: f64,
    /// Hard ceiling on the tiny tier's driving axis, in pixels.
    pub tiny_max_size: f64,
}

impl Default for ScalingFactors {
    fn default() -> Self {
        Self {
            small: 0.25,
            medium: 0.5,
            tiny_max_size: 64.0,
        }
    }
}

/// How zero (or otherwise unusable) target dimensions are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZeroDimensionPolicy {
    /// Never fail. Height 0 gives an aspect ratio of 1; negative or non-finite
    /// inputs are clamped to 0 and produce a degenerate set.
    #[default]
    Lenient,
    /// Any zero, negative or non-finite dimension is an error.
    Strict,
}

impl ZeroDimensionPolicy {
    fn admit(self, width: f64, height: f64) -> Result<(f64, f64), DimensionError> {
        let usable = |v: f64| v.is_finite() && v > 0.0;
        match self {
            ZeroDimensionPolicy::Strict if !(usable(width) && usable(height)) => {
                Err(DimensionError::InvalidDimension { width, height })
            }
            ZeroDimensionPolicy::Strict => Ok((width, height)),
            ZeroDimensionPolicy::Lenient => Ok((clamp_px(width), clamp_px(height))),
        }
    }
}

fn clamp_px(v: f64) -> f64 {
    if v.is_finite() { v.max(0.0) } else { 0.0 }
}

/// Sizes for every tier. `large` is the target passed in, unrounded.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct DimensionSet {
    pub tiny: Size,
    pub small: Size,
    pub medium: Size,
    pub large: Size,
}

impl DimensionSet {
    pub fn get(&self, tier: Tier) -> Size {
        match tier {
            Tier::Tiny => self.tiny,
            Tier::Small => self.small,
            Tier::Medium => self.medium,
            Tier::Large => self.large,
        }
    }
}

/// `width / height`, or 1 when the height is 0.
pub fn aspect_ratio(width: f64, height: f64) -> f64 {
    if height != 0.0 { width / height } else { 1.0 }
}

/// Height for a width at `ratio`; 0 when the ratio is degenerate (width 0).
fn height_for(width: f64, ratio: f64) -> f64 {
    if ratio > 0.0 { width / ratio } else { 0.0 }
}

/// Derive every tier from a target size and a resize method.
///
/// Height-driven methods scale heights and derive widths from the aspect
/// ratio; all others scale widths and derive heights. Small and medium derived
/// axes are rounded half away from zero. The small tier's *driving* width is
/// left fractional on the width-driven path (accessors floor it).
///
/// The tiny tier's driving axis is `min(tiny_max_size, axis * small / 2)`,
/// left unrounded, and the other axis is derived from that capped value. The
/// cap applies to the driving axis only, which is not necessarily the long side.
///
/// ```
/// # use respimg::imaging::{compute_dimensions, ResizeMethod, ScalingFactors, ZeroDimensionPolicy};
/// let dims = compute_dimensions(
///     485.0, 328.0,
///     ResizeMethod::SetWidth,
///     &ScalingFactors::default(),
///     ZeroDimensionPolicy::Lenient,
/// ).unwrap();
/// assert_eq!(dims.medium.width, 243.0);
/// assert_eq!(dims.medium.height, 164.0);
/// ```
pub fn compute_dimensions(
    width: f64,
    height: f64,
    method: ResizeMethod,
    factors: &ScalingFactors,
    policy: ZeroDimensionPolicy,
) -> Result<DimensionSet, DimensionError> {
    let (width, height) = policy.admit(width, height)?;
    let ratio = aspect_ratio(width, height);
    let tiny_factor = factors.small / 2.0;

    let (tiny, small, medium) = if method.drives_height() {
        let tiny_h = factors.tiny_max_size.min(height * tiny_factor);
        let small_h = (height * factors.small).round();
        let medium_h = (height * factors.medium).round();
        (
            Size::new(tiny_h * ratio, tiny_h),
            Size::new((small_h * ratio).round(), small_h),
            Size::new((medium_h * ratio).round(), medium_h),
        )
    } else {
        let tiny_w = factors.tiny_max_size.min(width * tiny_factor);
        let small_w = width * factors.small;
        let medium_w = (width * factors.medium).round();
        (
            Size::new(tiny_w, height_for(tiny_w, ratio)),
            Size::new(small_w, height_for(small_w, ratio).round()),
            Size::new(medium_w, height_for(medium_w, ratio).round()),
        )
    };

    Ok(DimensionSet {
        tiny,
        small,
        medium,
        large: Size::new(width, height),
    })
}

/// Large tier bound relative to the small tier in [`compute_from_minimum`].
pub const LARGE_SCALING_FACTOR: f64 = 4.0;

/// Small/medium/large sizes derived from a minimum size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MinimumBasedSizes {
    pub small: Size,
    pub medium: Size,
    pub large: Size,
}

/// Derive sizes from a *minimum* (small) size, bounded by the original.
///
/// The smaller (or zero) side of `minimum` is recomputed from the original's
/// proportions, small is truncated to whole pixels, large is bounded by
/// [`LARGE_SCALING_FACTOR`] × small and by the original.
///
/// The medium height is `floor(small.h + large.h / 2)`, not the midpoint the
/// medium width uses. That asymmetry is reproduced as-is; it has not been
/// validated against real expected outputs.
pub fn compute_from_minimum(
    original: (u32, u32),
    minimum: (f64, f64),
    method: ResizeMethod,
) -> Result<MinimumBasedSizes, DimensionError> {
    let (orig_w, orig_h) = (original.0 as f64, original.1 as f64);
    if orig_h == 0.0 {
        return Err(DimensionError::ZeroHeight);
    }
    if orig_w == 0.0 {
        return Err(DimensionError::InvalidDimension {
            width: orig_w,
            height: orig_h,
        });
    }

    let (mut min_w, mut min_h) = minimum;
    if min_w == 0.0 || min_w <= min_h {
        min_w = orig_w / orig_h * min_h;
    } else {
        min_h = orig_h / orig_w * min_w;
    }
    if !(min_w > 0.0 && min_h > 0.0) {
        return Err(DimensionError::InvalidDimension {
            width: min_w,
            height: min_h,
        });
    }

    let small = Size::new(min_w.trunc(), min_h.trunc());

    let large = if method.drives_height() {
        let max_w = (orig_h * min_w / min_h).floor();
        let max_w = (LARGE_SCALING_FACTOR * min_w).min(max_w);
        Size::new(
            orig_w.min(max_w),
            (small.height * LARGE_SCALING_FACTOR).min(orig_h),
        )
    } else {
        let max_h = (orig_w * min_h / min_w).floor();
        let max_h = (LARGE_SCALING_FACTOR * min_h).min(max_h);
        Size::new(
            (small.width * LARGE_SCALING_FACTOR).min(orig_w),
            orig_h.min(max_h),
        )
    };

    let medium = Size::new(
        ((small.width + large.width) / 2.0).floor(),
        (small.height + large.height / 2.0).floor(),
    );

    Ok(MinimumBasedSizes {
        small,
        medium,
        large,
    })
}

// =============================================================================
// Resize geometry
// =============================================================================

/// Pixel rectangle inside a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Scale to a width, keeping the aspect ratio. Never returns a zero side.
pub fn scale_to_width(source: (u32, u32), width: u32) -> (u32, u32) {
    let (src_w, src_h) = source;
    let h = (width as f64 * src_h as f64 / src_w.max(1) as f64).round() as u32;
    (width.max(1), h.max(1))
}

/// Scale to a height, keeping the aspect ratio. Never returns a zero side.
pub fn scale_to_height(source: (u32, u32), height: u32) -> (u32, u32) {
    let (src_w, src_h) = source;
    let w = (height as f64 * src_w as f64 / src_h.max(1) as f64).round() as u32;
    (w.max(1), height.max(1))
}

/// Largest size with the source's aspect ratio that fits inside `target`.
pub fn calculate_fit_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;
    let scale = (tgt_w as f64 / src_w.max(1) as f64).min(tgt_h as f64 / src_h.max(1) as f64);
    let w = (src_w as f64 * scale).round() as u32;
    let h = (src_h as f64 * scale).round() as u32;
    (w.clamp(1, tgt_w.max(1)), h.clamp(1, tgt_h.max(1)))
}

/// Largest centred rectangle of the source with the target's aspect ratio.
pub fn centered_crop(source: (u32, u32), target: (u32, u32)) -> Rect {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = (target.0.max(1), target.1.max(1));

    let tgt_aspect = tgt_w as f64 / tgt_h as f64;
    let src_aspect = src_w as f64 / src_h.max(1) as f64;

    let (w, h) = if src_aspect > tgt_aspect {
        (((src_h as f64) * tgt_aspect).round() as u32, src_h)
    } else {
        (src_w, ((src_w as f64) / tgt_aspect).round() as u32)
    };
    let (w, h) = (w.clamp(1, src_w.max(1)), h.clamp(1, src_h.max(1)));

    Rect {
        x: (src_w - w) / 2,
        y: (src_h - h) / 2,
        width: w,
        height: h,
    }
}

/// Crop and output size for FillMax: fill the box, but never upscale.
///
/// When the source covers the box, this is a regular centre-crop fill. When it
/// doesn't, the crop keeps the box's aspect ratio at the largest size the
/// source allows and the output is that crop, unscaled.
pub fn calculate_fill_max(source: (u32, u32), target: (u32, u32)) -> (Rect, (u32, u32)) {
    let crop = centered_crop(source, target);
    let out = if crop.width >= target.0 && crop.height >= target.1 {
        (target.0.max(1), target.1.max(1))
    } else {
        (crop.width, crop.height)
    };
    (crop, out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lenient(width: f64, height: f64, method: ResizeMethod) -> DimensionSet {
        compute_dimensions(
            width,
            height,
            method,
            &ScalingFactors::default(),
            ZeroDimensionPolicy::Lenient,
        )
        .unwrap()
    }

    fn floored(size: Size) -> (u32, u32) {
        (size.width.floor() as u32, size.height.floor() as u32)
    }

    // =========================================================================
    // compute_dimensions
    // =========================================================================

    #[test]
    fn default_method_on_original_size() {
        // 485x328 original, width-driven
        let dims = lenient(485.0, 328.0, ResizeMethod::SetWidth);
        assert_eq!(floored(dims.large), (485, 328));
        assert_eq!(floored(dims.medium), (243, 164));
        assert_eq!(floored(dims.small), (121, 82));
    }

    #[test]
    fn small_width_stays_fractional_on_width_path() {
        let dims = lenient(485.0, 328.0, ResizeMethod::SetWidth);
        assert_eq!(dims.small.width, 121.25);
        assert_eq!(dims.small.height, 82.0);
    }

    #[test]
    fn crop_factors_apply_to_explicit_target() {
        let dims = lenient(320.0, 200.0, ResizeMethod::CroppedImage);
        assert_eq!(floored(dims.large), (320, 200));
        assert_eq!(floored(dims.medium), (160, 100));
        assert_eq!(floored(dims.small), (80, 50));
    }

    #[test]
    fn width_path_on_height_resolved_target() {
        // SetHeight 200 on 485x328: width resolved to 200 * 485/328
        let target_w = 200.0 * (485.0 / 328.0);
        let dims = lenient(target_w, 200.0, ResizeMethod::SetWidth);
        assert_eq!(floored(dims.large), (295, 200));
        assert_eq!(floored(dims.medium), (148, 100));
        assert_eq!(floored(dims.small), (73, 50));
    }

    #[test]
    fn height_path_derives_widths() {
        let dims = lenient(400.0, 200.0, ResizeMethod::SetHeight);
        assert_eq!(dims.small, Size::new(100.0, 50.0));
        assert_eq!(dims.medium, Size::new(200.0, 100.0));
        assert_eq!(dims.tiny, Size::new(50.0, 25.0));
    }

    #[test]
    fn height_path_rounds_derived_width() {
        // 485x328, height-driven: small height 82, width round(82 * 1.4787) = 121
        let dims = lenient(485.0, 328.0, ResizeMethod::ScaleHeight);
        assert_eq!(dims.small, Size::new(121.0, 82.0));
        assert_eq!(dims.medium.height, 164.0);
    }

    #[test]
    fn tiny_is_small_factor_halved() {
        let dims = lenient(400.0, 200.0, ResizeMethod::SetWidth);
        assert_eq!(dims.tiny, Size::new(50.0, 25.0));
    }

    #[test]
    fn tiny_cap_bounds_driving_axis() {
        // 4000 * 0.125 = 500 → capped to 64; height follows the ratio of 64
        let dims = lenient(4000.0, 1000.0, ResizeMethod::SetWidth);
        assert_eq!(dims.tiny.width, 64.0);
        assert_eq!(dims.tiny.height, 16.0);
    }

    #[test]
    fn tiny_cap_on_height_path() {
        let dims = lenient(1000.0, 4000.0, ResizeMethod::SetHeight);
        assert_eq!(dims.tiny.height, 64.0);
        assert_eq!(dims.tiny.width, 16.0);
    }

    #[test]
    fn custom_factors_are_used() {
        let factors = ScalingFactors {
            small: 0.2,
            medium: 0.6,
            tiny_max_size: 10.0,
        };
        let dims = compute_dimensions(
            1000.0,
            500.0,
            ResizeMethod::SetWidth,
            &factors,
            ZeroDimensionPolicy::Lenient,
        )
        .unwrap();
        assert_eq!(dims.small, Size::new(200.0, 100.0));
        assert_eq!(dims.medium, Size::new(600.0, 300.0));
        assert_eq!(dims.tiny, Size::new(10.0, 5.0));
    }

    #[test]
    fn driving_axis_is_monotonic_below_cap() {
        let factors = ScalingFactors {
            tiny_max_size: f64::INFINITY,
            ..ScalingFactors::default()
        };
        for method in [ResizeMethod::SetWidth, ResizeMethod::SetHeight] {
            for w in (4..=2000).step_by(37) {
                for h in (4..=2000).step_by(41) {
                    let dims = compute_dimensions(
                        w as f64,
                        h as f64,
                        method,
                        &factors,
                        ZeroDimensionPolicy::Strict,
                    )
                    .unwrap();
                    let axis = |s: Size| {
                        if method.drives_height() { s.height } else { s.width }
                    };
                    assert!(axis(dims.tiny) <= axis(dims.small), "{method} {w}x{h}");
                    assert!(axis(dims.small) <= axis(dims.medium), "{method} {w}x{h}");
                    assert!(axis(dims.medium) <= axis(dims.large), "{method} {w}x{h}");
                }
            }
        }
    }

    #[test]
    fn results_are_non_negative() {
        for (w, h) in [(0.0, 0.0), (0.0, 50.0), (50.0, 0.0), (-10.0, 20.0)] {
            let dims = lenient(w, h, ResizeMethod::SetWidth);
            for tier in Tier::ALL {
                let s = dims.get(tier);
                assert!(s.width >= 0.0 && s.height >= 0.0, "{tier} for {w}x{h}");
            }
        }
    }

    // =========================================================================
    // Zero-dimension policy
    // =========================================================================

    #[test]
    fn zero_height_lenient_uses_unit_ratio() {
        let dims = lenient(400.0, 0.0, ResizeMethod::SetWidth);
        assert_eq!(dims.small, Size::new(100.0, 100.0));
        assert_eq!(dims.large, Size::new(400.0, 0.0));
    }

    #[test]
    fn zero_height_strict_is_invalid() {
        let result = compute_dimensions(
            400.0,
            0.0,
            ResizeMethod::SetWidth,
            &ScalingFactors::default(),
            ZeroDimensionPolicy::Strict,
        );
        assert!(matches!(
            result,
            Err(DimensionError::InvalidDimension { width, height }) if width == 400.0 && height == 0.0
        ));
    }

    #[test]
    fn both_zero_strict_is_invalid() {
        let result = compute_dimensions(
            0.0,
            0.0,
            ResizeMethod::SetHeight,
            &ScalingFactors::default(),
            ZeroDimensionPolicy::Strict,
        );
        assert!(result.is_err());
    }

    #[test]
    fn both_zero_lenient_is_degenerate() {
        let dims = lenient(0.0, 0.0, ResizeMethod::SetWidth);
        assert_eq!(dims, DimensionSet::default());
    }

    #[test]
    fn aspect_ratio_defaults_to_one() {
        assert_eq!(aspect_ratio(300.0, 0.0), 1.0);
        assert_eq!(aspect_ratio(300.0, 150.0), 2.0);
    }

    // =========================================================================
    // compute_from_minimum
    // =========================================================================

    #[test]
    fn minimum_based_default_quarter() {
        // 400x300 with a quarter-size minimum
        let sizes = compute_from_minimum((400, 300), (100.0, 75.0), ResizeMethod::SetWidth).unwrap();
        assert_eq!(sizes.small, Size::new(100.0, 75.0));
        assert_eq!(sizes.large, Size::new(400.0, 300.0));
        assert_eq!(sizes.medium.width, 250.0);
        // floor(75 + 300 / 2), not the midpoint 187
        assert_eq!(sizes.medium.height, 225.0);
    }

    #[test]
    fn minimum_based_height_method() {
        let sizes = compute_from_minimum((400, 800), (100.0, 200.0), ResizeMethod::SetHeight).unwrap();
        assert_eq!(sizes.small, Size::new(100.0, 200.0));
        assert_eq!(sizes.large, Size::new(400.0, 800.0));
        assert_eq!(sizes.medium, Size::new(250.0, 600.0));
    }

    #[test]
    fn minimum_based_zero_height_original() {
        let result = compute_from_minimum((485, 0), (10.0, 10.0), ResizeMethod::SetWidth);
        assert_eq!(result, Err(DimensionError::ZeroHeight));
    }

    // =========================================================================
    // Resize geometry
    // =========================================================================

    #[test]
    fn scale_to_width_keeps_ratio() {
        assert_eq!(scale_to_width((485, 328), 121), (121, 82));
    }

    #[test]
    fn scale_to_height_keeps_ratio() {
        assert_eq!(scale_to_height((485, 328), 200), (296, 200));
    }

    #[test]
    fn fit_inside_box() {
        assert_eq!(calculate_fit_dimensions((800, 600), (400, 400)), (400, 300));
        assert_eq!(calculate_fit_dimensions((600, 800), (400, 400)), (300, 400));
    }

    #[test]
    fn centered_crop_landscape_source() {
        let crop = centered_crop((800, 600), (100, 100));
        assert_eq!(
            crop,
            Rect {
                x: 100,
                y: 0,
                width: 600,
                height: 600
            }
        );
    }

    #[test]
    fn fill_max_downscales_when_source_covers_box() {
        let (crop, out) = calculate_fill_max((800, 600), (200, 200));
        assert_eq!((crop.width, crop.height), (600, 600));
        assert_eq!(out, (200, 200));
    }

    #[test]
    fn fill_max_never_upscales() {
        // 300x200 into 600x600: crop to square at source scale
        let (crop, out) = calculate_fill_max((300, 200), (600, 600));
        assert_eq!(crop.x, 50);
        assert_eq!(out, (200, 200));
    }
}
