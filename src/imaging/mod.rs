//! Image sizing and derived assets, pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Resample** | Lanczos3 `resize_exact` / `resize_to_fill` / `crop_imm` |
//! | **Placeholder blur** | `DynamicImage::blur` |
//! | **Data URI** | `image::guess_format` + `base64` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for tier dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Source**: [`OriginalImage`] trait + file-backed [`SourceImage`]
//! - **Locks**: per-path write serialization
//! - **Operations**: High-level functions combining the above

pub mod backend;
mod calculations;
mod locks;
pub mod operations;
mod params;
pub mod rust_backend;
pub mod source;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{
    DimensionError, DimensionSet, LARGE_SCALING_FACTOR, MinimumBasedSizes, ScalingFactors, Size,
    Tier, ZeroDimensionPolicy, aspect_ratio, compute_dimensions, compute_from_minimum,
};
pub use operations::{blurred_variant, image_to_data_uri, pregenerate_variants};
pub use params::{BlurParams, Quality, ResizeMethod, ResizeParams, UnknownMethod, VariantRequest};
pub use rust_backend::RustBackend;
pub use source::{OriginalImage, ResampleTarget, SourceImage, Variant};
