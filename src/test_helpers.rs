//! Shared test utilities for the respimg test suite.
//!
//! Provides a recording [`MockOriginal`] that stands in for an image on disk,
//! plus helpers that write small synthetic images.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let lenna = MockOriginal::lenna();
//! let mut image = ResponsiveImage::new(&backend, ResponsiveSettings::default());
//! image.set_original(Some(&lenna), 485.0, 328.0).unwrap();
//! assert_eq!(lenna.requests().len(), 0);
//! ```

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use image::{ImageEncoder, RgbImage};

use crate::imaging::{BackendError, OriginalImage, Variant, VariantRequest};
use crate::naming::variant_file_name;

// =========================================================================
// Synthetic images
// =========================================================================

/// Create a small valid JPEG file with the given dimensions.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

// =========================================================================
// MockOriginal: records variant requests, never touches pixels
// =========================================================================

/// An [`OriginalImage`] that records every variant request.
///
/// Variants live under `dir` (default `/tmp/respimg-mock`) and are reported
/// as freshly created unless [`reused`](Self::reused) was called. With
/// [`with_files`](Self::with_files), each request also writes a synthetic
/// JPEG so that data-URI code has something to read.
pub struct MockOriginal {
    pub width: u32,
    pub height: u32,
    pub url: String,
    pub filename: PathBuf,
    pub title: Option<String>,
    dir: PathBuf,
    requests: Mutex<Vec<VariantRequest>>,
    fail: bool,
    reuse: bool,
    write_files: bool,
}

impl MockOriginal {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            url: "/assets/lenna.jpg".into(),
            filename: PathBuf::from("assets/lenna.jpg"),
            title: None,
            dir: PathBuf::from("/tmp/respimg-mock"),
            requests: Mutex::new(Vec::new()),
            fail: false,
            reuse: false,
            write_files: false,
        }
    }

    /// The 485×328 fixture used throughout the suite.
    pub fn lenna() -> Self {
        Self::new(485, 328)
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn reused(mut self) -> Self {
        self.reuse = true;
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_files(mut self, dir: &Path) -> Self {
        self.dir = dir.to_path_buf();
        self.write_files = true;
        self
    }

    /// Every request seen so far, in order.
    pub fn requests(&self) -> Vec<VariantRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl OriginalImage for MockOriginal {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn url(&self) -> String {
        self.url.clone()
    }

    fn filename(&self) -> &Path {
        &self.filename
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn variant(&self, request: &VariantRequest) -> Result<Variant, BackendError> {
        self.requests.lock().unwrap().push(*request);
        if self.fail {
            return Err(BackendError::ProcessingFailed("mock variant failure".into()));
        }

        let name = variant_file_name(request, "lenna.jpg");
        let path = self.dir.join(&name);
        if self.write_files {
            let w = request.width.unwrap_or(1).max(1);
            let h = request.height.unwrap_or(1).max(1);
            create_test_jpeg(&path, w, h);
        }
        Ok(Variant {
            url: format!("/assets/_resampled/{name}"),
            path,
            request: *request,
            created: !self.reuse,
        })
    }
}
