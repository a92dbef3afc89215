//! Filename convention for derived assets.
//!
//! Every derived file lives next to its siblings in the resampled directory and
//! encodes how it was made in its name, so an existing file can be reused
//! without a manifest:
//!
//! - `SetWidth243x164-lenna.jpg` → method `SetWidth`, 243×164, from `lenna.jpg`
//! - `SetHeight100-lenna.jpg` → method `SetHeight`, height 100 only
//! - `FillMax121x82-lenna.jpg` → method `FillMax`, 121×82
//! - `Blur8-SetWidth60x41-lenna.jpg` → the tiny variant blurred with sigma 8
//!
//! A blurred placeholder gets its own name, so the sharp variant it is made
//! from is never mistaken for it.
//!
//! The URL of a derived file is `{base_url}/{file name}`.

use crate::imaging::VariantRequest;

/// Name of the derived file for `request`, made from `source_file_name`.
pub fn variant_file_name(request: &VariantRequest, source_file_name: &str) -> String {
    let method = request.method;
    match (request.width, request.height) {
        (Some(w), Some(h)) => format!("{method}{w}x{h}-{source_file_name}"),
        (Some(w), None) => format!("{method}{w}-{source_file_name}"),
        (None, Some(h)) => format!("{method}{h}-{source_file_name}"),
        (None, None) => format!("{method}-{source_file_name}"),
    }
}

/// Name of the blurred placeholder made from the derived file `file_name`.
pub fn blurred_file_name(sigma: f32, file_name: &str) -> String {
    format!("Blur{sigma}-{file_name}")
}

/// `url` with its last path segment replaced by `file_name`.
pub fn sibling_url(url: &str, file_name: &str) -> String {
    match url.rsplit_once('/') {
        Some((dir, _)) => format!("{dir}/{file_name}"),
        None => file_name.to_string(),
    }
}

/// Public URL of a derived file.
pub fn variant_url(base_url: &str, file_name: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.is_empty() {
        file_name.to_string()
    } else {
        format!("{base}/{file_name}")
    }
}
