//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Dims
//!
//! ```text
//! SetWidth 485x328
//!     tiny:   60.625 x 41
//!     small:  121.25 x 82
//!     medium: 243 x 164
//!     large:  485 x 328
//! ```
//!
//! ## Min sizes
//!
//! ```text
//! SetWidth from 800x400
//!     small:  100 x 50
//!     medium: 250 x 250
//!     large:  400 x 200
//! ```
//!
//! ## Generate
//!
//! ```text
//! lenna.jpg (485x328, SetWidth)
//!     tiny: SetWidth60x41-lenna.jpg (created)
//!     small: SetWidth121x82-lenna.jpg (cached)
//!     medium: failed: Image processing failed: ...
//!
//! Generated 1, cached 1, failed 1
//! ```
//!
//! A large tier at the original's own size needs no file and is not listed.
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::imaging::operations::TierVariant;
use crate::imaging::{DimensionSet, MinimumBasedSizes, ResizeMethod, Size, Tier};
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `{tier}:` padded so the sizes line up.
fn tier_label(tier: Tier) -> String {
    format!("{:<7}", format!("{}:", tier))
}

fn size_text(size: Size) -> String {
    format!("{} x {}", size.width, size.height)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// Dims
// ============================================================================

pub fn format_dims_output(
    method: ResizeMethod,
    width: f64,
    height: f64,
    dimensions: &DimensionSet,
) -> Vec<String> {
    let mut lines = vec![format!("{} {}x{}", method, width, height)];
    for tier in Tier::ALL {
        lines.push(format!(
            "{}{} {}",
            indent(1),
            tier_label(tier),
            size_text(dimensions.get(tier))
        ));
    }
    lines
}

pub fn print_dims_output(method: ResizeMethod, width: f64, height: f64, dimensions: &DimensionSet) {
    for line in format_dims_output(method, width, height, dimensions) {
        println!("{}", line);
    }
}

// ============================================================================
// Min sizes
// ============================================================================

pub fn format_min_sizes_output(
    method: ResizeMethod,
    (width, height): (u32, u32),
    sizes: &MinimumBasedSizes,
) -> Vec<String> {
    vec![
        format!("{} from {}x{}", method, width, height),
        format!("{}{} {}", indent(1), tier_label(Tier::Small), size_text(sizes.small)),
        format!("{}{} {}", indent(1), tier_label(Tier::Medium), size_text(sizes.medium)),
        format!("{}{} {}", indent(1), tier_label(Tier::Large), size_text(sizes.large)),
    ]
}

pub fn print_min_sizes_output(method: ResizeMethod, original: (u32, u32), sizes: &MinimumBasedSizes) {
    for line in format_min_sizes_output(method, original, sizes) {
        println!("{}", line);
    }
}

// ============================================================================
// Generate
// ============================================================================

/// Counts for the generate summary line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GenerateCounts {
    pub created: usize,
    pub cached: usize,
    pub failed: usize,
}

impl GenerateCounts {
    pub fn tally(results: &[TierVariant]) -> Self {
        results
            .iter()
            .fold(Self::default(), |mut counts, tv| {
                match &tv.result {
                    Ok(v) if v.created => counts.created += 1,
                    Ok(_) => counts.cached += 1,
                    Err(_) => counts.failed += 1,
                }
                counts
            })
    }
}

pub fn format_generate_output(
    image: &Path,
    (width, height): (u32, u32),
    method: ResizeMethod,
    results: &[TierVariant],
) -> Vec<String> {
    let mut lines = vec![format!(
        "{} ({}x{}, {})",
        file_name(image),
        width,
        height,
        method
    )];
    for tv in results {
        let status = match &tv.result {
            Ok(v) if v.created => format!("{} (created)", file_name(&v.path)),
            Ok(v) => format!("{} (cached)", file_name(&v.path)),
            Err(e) => format!("failed: {}", e),
        };
        lines.push(format!("{}{}: {}", indent(1), tv.tier, status));
    }
    let counts = GenerateCounts::tally(results);
    lines.push(String::new());
    lines.push(format!(
        "Generated {}, cached {}, failed {}",
        counts.created, counts.cached, counts.failed
    ));
    lines
}

pub fn print_generate_output(
    image: &Path,
    dims: (u32, u32),
    method: ResizeMethod,
    results: &[TierVariant],
) {
    for line in format_generate_output(image, dims, method, results) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::{BackendError, ScalingFactors, Variant, VariantRequest, ZeroDimensionPolicy};
    use crate::imaging::compute_dimensions;
    use std::path::PathBuf;

    fn lenna_dims() -> DimensionSet {
        compute_dimensions(
            485.0,
            328.0,
            ResizeMethod::SetWidth,
            &ScalingFactors::default(),
            ZeroDimensionPolicy::Lenient,
        )
        .unwrap()
    }

    fn ok(tier: Tier, name: &str, created: bool) -> TierVariant {
        TierVariant {
            tier,
            result: Ok(Variant {
                url: format!("/_resampled/{name}"),
                path: PathBuf::from("/site/_resampled").join(name),
                request: VariantRequest {
                    method: ResizeMethod::SetWidth,
                    width: Some(1),
                    height: Some(1),
                },
                created,
            }),
        }
    }

    // =========================================================================
    // dims
    // =========================================================================

    #[test]
    fn dims_header_names_method_and_size() {
        let lines = format_dims_output(ResizeMethod::SetWidth, 485.0, 328.0, &lenna_dims());
        assert_eq!(lines[0], "SetWidth 485x328");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn dims_lists_tiers_in_order() {
        let lines = format_dims_output(ResizeMethod::SetWidth, 485.0, 328.0, &lenna_dims());
        assert!(lines[1].trim_start().starts_with("tiny:"));
        assert!(lines[2].trim_start().starts_with("small:"));
        assert!(lines[3].trim_start().starts_with("medium:"));
        assert!(lines[4].trim_start().starts_with("large:"));
    }

    #[test]
    fn dims_shows_unrounded_tiny_width() {
        let lines = format_dims_output(ResizeMethod::SetWidth, 485.0, 328.0, &lenna_dims());
        assert_eq!(lines[1], "    tiny:   60.625 x 41");
        assert_eq!(lines[4], "    large:  485 x 328");
    }

    // =========================================================================
    // min sizes
    // =========================================================================

    #[test]
    fn min_sizes_lists_three_tiers() {
        let sizes = MinimumBasedSizes {
            small: Size::new(100.0, 50.0),
            medium: Size::new(250.0, 250.0),
            large: Size::new(400.0, 200.0),
        };
        let lines = format_min_sizes_output(ResizeMethod::SetWidth, (800, 400), &sizes);
        assert_eq!(
            lines,
            vec![
                "SetWidth from 800x400",
                "    small:  100 x 50",
                "    medium: 250 x 250",
                "    large:  400 x 200",
            ]
        );
    }

    // =========================================================================
    // generate
    // =========================================================================

    #[test]
    fn generate_reports_each_tier() {
        let results = vec![
            ok(Tier::Tiny, "SetWidth60x41-lenna.jpg", true),
            ok(Tier::Small, "SetWidth121x82-lenna.jpg", false),
            TierVariant {
                tier: Tier::Medium,
                result: Err(BackendError::ProcessingFailed("boom".into())),
            },
            ok(Tier::Large, "SetWidth485x328-lenna.jpg", true),
        ];
        let lines = format_generate_output(
            Path::new("/site/lenna.jpg"),
            (485, 328),
            ResizeMethod::SetWidth,
            &results,
        );
        assert_eq!(lines[0], "lenna.jpg (485x328, SetWidth)");
        assert_eq!(lines[1], "    tiny: SetWidth60x41-lenna.jpg (created)");
        assert_eq!(lines[2], "    small: SetWidth121x82-lenna.jpg (cached)");
        assert!(lines[3].starts_with("    medium: failed:"));
        assert!(lines[3].contains("boom"));
        assert_eq!(lines.last().unwrap(), "Generated 2, cached 1, failed 1");
    }

    #[test]
    fn tally_empty() {
        assert_eq!(GenerateCounts::tally(&[]), GenerateCounts::default());
    }
}
