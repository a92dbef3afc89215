//! Original images and their derived variants.
//!
//! [`OriginalImage`] is the narrow view the sizing layer has of a source
//! image: intrinsic size, URL, and a way to obtain a resampled variant. The
//! file-backed implementation is [`SourceImage`], which names variants with
//! the [`naming`](crate::naming) convention and reuses files that already
//! exist.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::locks::with_path_lock;
use super::params::{Quality, ResizeParams, VariantRequest};
use crate::naming::{variant_file_name, variant_url};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A derived asset produced for one [`VariantRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub url: String,
    pub path: PathBuf,
    pub request: VariantRequest,
    /// True when this call wrote the file; false when an existing one was reused.
    pub created: bool,
}

/// Source image as seen by the descriptor.
pub trait OriginalImage {
    /// Intrinsic width in pixels.
    fn width(&self) -> u32;
    /// Intrinsic height in pixels.
    fn height(&self) -> u32;
    fn url(&self) -> String;
    fn filename(&self) -> &Path;
    /// Used as the `alt` text of rendered tags.
    fn title(&self) -> Option<&str> {
        None
    }
    /// Produce (or reuse) the resampled variant for `request`.
    fn variant(&self, request: &VariantRequest) -> Result<Variant, BackendError>;
}

/// Where derived files go and how they are addressed.
#[derive(Debug, Clone, PartialEq)]
pub struct ResampleTarget {
    pub dir: PathBuf,
    pub base_url: String,
}

/// An image file on disk, resampled through an [`ImageBackend`].
pub struct SourceImage<'b> {
    backend: &'b dyn ImageBackend,
    path: PathBuf,
    dims: Dimensions,
    target: ResampleTarget,
    url: String,
    title: Option<String>,
    quality: Quality,
}

impl<'b> SourceImage<'b> {
    /// Identify `path` and prepare it for resampling into `target`.
    ///
    /// The original's URL defaults to `{base_url}/{file name}`; override it
    /// with [`with_url`](Self::with_url).
    pub fn open(
        backend: &'b dyn ImageBackend,
        path: &Path,
        target: ResampleTarget,
        quality: Quality,
    ) -> Result<Self, BackendError> {
        let dims = backend.identify(path)?;
        let file_name = file_name_of(path);
        let url = variant_url(&target.base_url, &file_name);
        Ok(Self {
            backend,
            path: path.to_path_buf(),
            dims,
            target,
            url,
            title: None,
            quality,
        })
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl OriginalImage for SourceImage<'_> {
    fn width(&self) -> u32 {
        self.dims.width
    }

    fn height(&self) -> u32 {
        self.dims.height
    }

    fn url(&self) -> String {
        self.url.clone()
    }

    fn filename(&self) -> &Path {
        &self.path
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn variant(&self, request: &VariantRequest) -> Result<Variant, BackendError> {
        let file_name = variant_file_name(request, &file_name_of(&self.path));
        let output = self.target.dir.join(&file_name);
        std::fs::create_dir_all(&self.target.dir)?;

        let created = with_path_lock(&output, || -> Result<bool, BackendError> {
            if output.exists() {
                return Ok(false);
            }
            debug!(output = %output.display(), method = %request.method, "resampling");
            self.backend.resize(&ResizeParams {
                source: self.path.clone(),
                output: output.clone(),
                request: *request,
                quality: self.quality,
            })?;
            Ok(true)
        })?;

        Ok(Variant {
            url: variant_url(&self.target.base_url, &file_name),
            path: output,
            request: *request,
            created,
        })
    }
}
