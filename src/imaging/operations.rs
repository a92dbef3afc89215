//! High-level image operations.
//!
//! These functions combine calculations, naming and backend execution. The
//! descriptor calls them for the tiny placeholder; the CLI calls
//! [`pregenerate_variants`] to warm every tier up front.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{DimensionSet, Tier};
use super::locks::with_path_lock;
use super::params::{BlurParams, Quality, ResizeMethod, VariantRequest};
use super::source::{OriginalImage, Variant};
use crate::naming::{blurred_file_name, sibling_url};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rayon::prelude::*;
use std::path::Path;
use tracing::{debug, warn};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// The Gaussian-blurred sibling of `variant`, created on first use.
///
/// The blurred file has its own name (see
/// [`blurred_file_name`](crate::naming::blurred_file_name)), so its existence
/// means the blur finished. The existence check and the blur run under one
/// lock on the blurred path. A failed blur leaves no file and the next call
/// retries.
pub fn blurred_variant(
    backend: &dyn ImageBackend,
    variant: &Variant,
    sigma: f32,
    quality: Quality,
) -> Result<Variant> {
    let sharp_name = variant
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            BackendError::ProcessingFailed(format!(
                "Variant has no file name: {}",
                variant.path.display()
            ))
        })?;
    let name = blurred_file_name(sigma, &sharp_name);
    let path = variant.path.with_file_name(&name);

    let created = with_path_lock(&path, || -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        debug!(source = %variant.path.display(), output = %path.display(), sigma, "blurring placeholder");
        let params = BlurParams {
            source: variant.path.clone(),
            output: path.clone(),
            sigma,
            quality,
        };
        if let Err(e) = backend.blur(&params) {
            discard_partial(&path);
            return Err(e);
        }
        Ok(true)
    })?;

    Ok(Variant {
        url: sibling_url(&variant.url, &name),
        path,
        request: variant.request,
        created,
    })
}

/// Remove whatever a failed blur left at `path`.
fn discard_partial(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed partial placeholder"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "cannot remove partial placeholder"),
    }
}

/// MIME type of an encoded image, sniffed from its leading bytes.
pub fn mime_type(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes).ok().map(|f| f.to_mime_type())
}

/// Read an image file and encode it as `data:<mime>;base64,<data>`.
pub fn image_to_data_uri(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    let mime = mime_type(&bytes).ok_or_else(|| {
        BackendError::ProcessingFailed(format!("Not an image: {}", path.display()))
    })?;
    Ok(format!("data:{};base64,{}", mime, STANDARD.encode(&bytes)))
}

/// Outcome of generating one tier.
#[derive(Debug)]
pub struct TierVariant {
    pub tier: Tier,
    pub result: Result<Variant>,
}

/// Generate the variant for every tier in parallel.
///
/// Results come back in [`Tier::ALL`] order. A large tier at the original's
/// own size is served by the original, so it is skipped. One tier failing
/// does not stop the others.
pub fn pregenerate_variants<O>(
    original: &O,
    dimensions: &DimensionSet,
    method: ResizeMethod,
) -> Vec<TierVariant>
where
    O: OriginalImage + Sync + ?Sized,
{
    let original_is_large = dimensions
        .large
        .is_exactly(original.width(), original.height());
    let tiers: Vec<Tier> = Tier::ALL
        .into_iter()
        .filter(|&tier| !(tier == Tier::Large && original_is_large))
        .collect();
    tiers
        .par_iter()
        .map(|&tier| TierVariant {
            tier,
            result: original.variant(&VariantRequest::for_size(method, dimensions.get(tier))),
        })
        .collect()
}
