//! # respimg
//!
//! Responsive image tiers, blurred placeholders and markup for one original
//! image at a time.
//!
//! Every placement of an image is described by a target size and a resize
//! method. From those, four tiers are derived:
//!
//! ```text
//! tiny    min(64, target * 0.125)    blurred, inlined as a data URI
//! small   target * 0.25              srcset 1x candidate, fallback src
//! medium  target * 0.5               srcset candidate
//! large   target                     srcset candidate (or the original itself)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Tier dimension math, the `ImageBackend` trait and its pure-Rust implementation, file-backed originals |
//! | [`naming`] | Derived-file naming: `SetWidth121x82-lenna.jpg` |
//! | [`descriptor`] | `ResponsiveImage`: tier sizes, sources, placeholder, markup for one placement |
//! | [`facade`] | `Responsive`: builder over an original that resolves method arguments and caches the descriptor |
//! | [`render`] | Template capability, built-in Maud templates, source-comment toggle |
//! | [`config`] | `respimg.toml` loading, merging and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Usage
//!
//! ```no_run
//! use respimg::facade::Responsive;
//! use respimg::imaging::{Quality, ResampleTarget, ResizeMethod, RustBackend, SourceImage};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = RustBackend::new();
//! let target = ResampleTarget {
//!     dir: "site/_resampled".into(),
//!     base_url: "/_resampled".into(),
//! };
//! let original = SourceImage::open(&backend, Path::new("site/lenna.jpg"), target, Quality::default())?;
//!
//! let mut image = Responsive::new(&backend, Default::default(), &original);
//! image.size(ResizeMethod::CroppedImage, Some(320), Some(200));
//! if let Some(html) = image.tag() {
//!     println!("{html}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Failure Model
//!
//! Building a descriptor fails loudly (no original, unusable dimensions). Once
//! built, rendering degrades instead of failing: a tier whose variant can't be
//! produced drops out of the `srcset`, and a placeholder that can't be blurred
//! or read is omitted. Every degradation is logged through `tracing`.

pub mod config;
pub mod descriptor;
pub mod facade;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod render;

#[cfg(test)]
pub(crate) mod test_helpers;
