//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP, GIF) | `image` crate (pure Rust decoders) |
//! | Scale (width/height/fit) | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Fill / crop | `DynamicImage::resize_to_fill`, `crop_imm` |
//! | Pad | `imageops::overlay` onto a white canvas |
//! | Blur | `DynamicImage::blur` (Gaussian) |
//! | Atomic write | `tempfile::NamedTempFile` in the target directory, then rename |
//!
//! Output format follows the output file's extension. Callers serialize
//! writers per path with [`locks`](super::locks); this module only guarantees
//! that a finished file replaces the old one in a single rename.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{
    calculate_fill_max, calculate_fit_dimensions, scale_to_height, scale_to_width,
};
use super::params::{BlurParams, ResizeMethod, ResizeParams, VariantRequest};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader, Rgba, RgbaImage};
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

fn require(value: Option<u32>, what: &str, method: ResizeMethod) -> Result<u32, BackendError> {
    match value {
        Some(v) if v > 0 => Ok(v),
        _ => Err(BackendError::ProcessingFailed(format!(
            "{method} needs a non-zero {what}"
        ))),
    }
}

/// Apply one resize method to a decoded image.
fn apply_method(img: &DynamicImage, request: &VariantRequest) -> Result<DynamicImage, BackendError> {
    let method = request.method;
    let source = (img.width(), img.height());

    let out = match method {
        ResizeMethod::SetWidth | ResizeMethod::ScaleWidth => {
            let (w, h) = scale_to_width(source, require(request.width, "width", method)?);
            img.resize_exact(w, h, FilterType::Lanczos3)
        }
        ResizeMethod::SetHeight | ResizeMethod::ScaleHeight => {
            let (w, h) = scale_to_height(source, require(request.height, "height", method)?);
            img.resize_exact(w, h, FilterType::Lanczos3)
        }
        ResizeMethod::SetRatioSize | ResizeMethod::Fit => {
            let target = box_of(request)?;
            let (w, h) = calculate_fit_dimensions(source, target);
            img.resize_exact(w, h, FilterType::Lanczos3)
        }
        ResizeMethod::SetSize | ResizeMethod::Pad => {
            let (box_w, box_h) = box_of(request)?;
            let (w, h) = calculate_fit_dimensions(source, (box_w, box_h));
            let fitted = img.resize_exact(w, h, FilterType::Lanczos3).to_rgba8();
            let mut canvas = RgbaImage::from_pixel(box_w, box_h, Rgba([255, 255, 255, 255]));
            let x = i64::from((box_w - w) / 2);
            let y = i64::from((box_h - h) / 2);
            image::imageops::overlay(&mut canvas, &fitted, x, y);
            DynamicImage::ImageRgba8(canvas)
        }
        ResizeMethod::CroppedImage | ResizeMethod::Fill => {
            let (w, h) = box_of(request)?;
            img.resize_to_fill(w, h, FilterType::Lanczos3)
        }
        ResizeMethod::FillMax => {
            let (crop, (w, h)) = calculate_fill_max(source, box_of(request)?);
            let cropped = img.crop_imm(crop.x, crop.y, crop.width, crop.height);
            if (w, h) == (crop.width, crop.height) {
                cropped
            } else {
                cropped.resize_exact(w, h, FilterType::Lanczos3)
            }
        }
    };
    Ok(out)
}

fn box_of(request: &VariantRequest) -> Result<(u32, u32), BackendError> {
    Ok((
        require(request.width, "width", request.method)?,
        require(request.height, "height", request.method)?,
    ))
}

/// Encode `img` for `path` into a temp file next to it, then rename over `path`.
fn save_image(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let format = ImageFormat::from_path(path).map_err(|_| {
        BackendError::ProcessingFailed(format!("Unsupported output format: {}", path.display()))
    })?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        match format {
            ImageFormat::Jpeg => {
                let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
                let encoder = JpegEncoder::new_with_quality(&mut writer, quality.clamp(1, 100) as u8);
                rgb.write_with_encoder(encoder)
            }
            other => img.write_to(&mut writer, other),
        }
        .map_err(|e| BackendError::ProcessingFailed(format!("Encode failed: {}", e)))?;
        writer.flush()?;
    }
    tmp.persist(path).map_err(|e| BackendError::Io(e.error))?;
    Ok(())
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
        })?;
        Ok(Dimensions { width, height })
    }

    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let resized = apply_method(&img, &params.request)?;
        save_image(&resized, &params.output, params.quality.value())
    }

    fn blur(&self, params: &BlurParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let blurred = img.blur(params.sigma);
        save_image(&blurred, &params.output, params.quality.value())
    }
}
