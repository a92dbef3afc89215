//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations the sizing layer
//! needs from pixel code: identify, resize (produce a derived asset), and
//! blur (derive a placeholder file from an existing derived asset).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use the recording `MockBackend` in this module.

use super::params::{BlurParams, ResizeParams};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// Implementations must be safe to share across threads: tier variants may be
/// generated in parallel, and concurrent writers to the same output path must
/// never observe a partially written file.
pub trait ImageBackend: Sync {
    /// Get image dimensions.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Produce `params.output` from `params.source` using the requested method.
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError>;

    /// Gaussian-blur `params.source` into `params.output`.
    ///
    /// The output appears only once it is complete; a failed blur leaves no
    /// output behind.
    fn blur(&self, params: &BlurParams) -> Result<(), BackendError>;
}
