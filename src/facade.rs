//! Typed facade over [`ResponsiveImage`].
//!
//! [`Responsive`] is what a page template holds: an original plus the
//! arguments of one placement (media query, method and target size, extra
//! classes). The descriptor is built lazily on first use and cached until an
//! argument changes.
//!
//! ## Target size resolution
//!
//! | Method | Width | Height |
//! |---|---|---|
//! | name contains `Height` | `height × aspect` | given height, else the width argument |
//! | name contains `Width` | given width | `width / aspect` |
//! | anything else | given width | given height |
//!
//! A missing or zero result falls back to the original's size. Both
//! `Height` and `Width` methods need a non-zero original height.
//!
//! The descriptor computes its tiers *before* the method is applied, so the
//! tiers always follow the width-driven formulas and the method only shapes
//! the variant requests.

use crate::descriptor::{ResponsiveError, ResponsiveImage, ResponsiveSettings};
use crate::imaging::{
    DimensionSet, ImageBackend, OriginalImage, ResizeMethod, Tier, aspect_ratio,
};
use crate::render::TemplateRenderer;
use std::cell::OnceCell;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq)]
struct SizeArgs {
    method: ResizeMethod,
    width: Option<f64>,
    height: Option<f64>,
}

/// One placement of an original image.
pub struct Responsive<'a> {
    backend: &'a dyn ImageBackend,
    settings: ResponsiveSettings,
    original: &'a dyn OriginalImage,
    renderer: Option<&'a dyn TemplateRenderer>,
    media_query: Option<String>,
    size: Option<SizeArgs>,
    extra_classes: Option<String>,
    image: OnceCell<Result<ResponsiveImage<'a>, ResponsiveError>>,
}

fn nonzero(v: Option<f64>) -> Option<f64> {
    v.filter(|v| *v != 0.0)
}

impl<'a> Responsive<'a> {
    pub fn new(
        backend: &'a dyn ImageBackend,
        settings: ResponsiveSettings,
        original: &'a dyn OriginalImage,
    ) -> Self {
        Self {
            backend,
            settings,
            original,
            renderer: None,
            media_query: None,
            size: None,
            extra_classes: None,
            image: OnceCell::new(),
        }
    }

    pub fn with_renderer(mut self, renderer: &'a dyn TemplateRenderer) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn media_query(&mut self, query: impl Into<String>) -> &mut Self {
        self.media_query = Some(query.into());
        self.image.take();
        self
    }

    /// Method plus target size. For height methods a lone `width` is read as
    /// the height.
    pub fn size(
        &mut self,
        method: ResizeMethod,
        width: Option<u32>,
        height: Option<u32>,
    ) -> &mut Self {
        self.size = Some(SizeArgs {
            method,
            width: width.map(f64::from),
            height: height.map(f64::from),
        });
        self.image.take();
        self
    }

    pub fn extra_classes(&mut self, classes: impl Into<String>) -> &mut Self {
        self.extra_classes = Some(classes.into());
        self.image.take();
        self
    }

    /// Target width and height handed to the descriptor.
    pub fn resolved_size(&self) -> Result<(f64, f64), ResponsiveError> {
        let ow = f64::from(self.original.width());
        let oh = f64::from(self.original.height());

        let (width, height) = match self.size {
            None => (None, None),
            Some(args) if args.method.drives_height() => {
                let height = nonzero(args.height.or(args.width));
                if oh == 0.0 {
                    return Err(ResponsiveError::ZeroHeight);
                }
                let ratio = aspect_ratio(ow, oh);
                (height.map(|h| h * ratio), height)
            }
            Some(args) if args.method.drives_width() => {
                if oh == 0.0 {
                    return Err(ResponsiveError::ZeroHeight);
                }
                let ratio = aspect_ratio(ow, oh);
                let height = nonzero(args.width).filter(|_| ratio != 0.0).map(|w| w / ratio);
                (args.width, height)
            }
            Some(args) => (args.width, args.height),
        };

        Ok((
            nonzero(width).unwrap_or(ow),
            nonzero(height).unwrap_or(oh),
        ))
    }

    fn build(&self) -> Result<ResponsiveImage<'a>, ResponsiveError> {
        let (width, height) = self.resolved_size()?;

        let mut image = ResponsiveImage::new(self.backend, self.settings.clone());
        if let Some(renderer) = self.renderer {
            image = image.with_renderer(renderer);
        }
        image.set_original(Some(self.original), width, height)?;

        if let Some(args) = self.size {
            image.set_method(args.method);
        }
        if let Some(query) = &self.media_query {
            image.set_media_query(query.clone());
        }
        if let Some(classes) = &self.extra_classes {
            image.add_extra_classes(classes.clone());
        }
        Ok(image)
    }

    /// The underlying descriptor, or the error that prevented building it.
    pub fn image(&self) -> Result<&ResponsiveImage<'a>, ResponsiveError> {
        self.image.get_or_init(|| self.build()).as_ref().map_err(Clone::clone)
    }

    fn image_or_log(&self, what: &str) -> Option<&ResponsiveImage<'a>> {
        match self.image() {
            Ok(image) => Some(image),
            Err(e) => {
                warn!(error = %e, "responsive image unavailable, no {what} rendered");
                None
            }
        }
    }

    fn render(
        &self,
        what: &str,
        f: impl FnOnce(&ResponsiveImage<'a>) -> Result<String, ResponsiveError>,
    ) -> Option<String> {
        let image = self.image_or_log(what)?;
        match f(image) {
            Ok(html) => Some(html),
            Err(e) => {
                warn!(error = %e, "failed to render {what}");
                None
            }
        }
    }

    // ==== rendering: never fails, logs instead ====

    pub fn tag(&self) -> Option<String> {
        self.render("tag", ResponsiveImage::tag)
    }

    pub fn open_tag(&self) -> Option<String> {
        self.render("open tag", ResponsiveImage::open_tag)
    }

    pub fn background_attr(&self) -> Option<String> {
        self.render("background attributes", ResponsiveImage::background_attr)
    }

    // ==== accessors ====

    pub fn dimensions(&self) -> Result<DimensionSet, ResponsiveError> {
        self.image()?.dimensions().copied()
    }

    pub fn source(&self, tier: Tier) -> Result<Option<String>, ResponsiveError> {
        self.image()?.source(tier)
    }

    pub fn source_width(&self, tier: Tier) -> Result<String, ResponsiveError> {
        self.image()?.source_width(tier)
    }

    pub fn source_height(&self, tier: Tier) -> Result<String, ResponsiveError> {
        self.image()?.source_height(tier)
    }

    pub fn tiny_blurred_source(&self) -> Result<Option<String>, ResponsiveError> {
        self.image()?.tiny_blurred_source()
    }

    pub fn tiny_blurred_data_uri(&self) -> Result<Option<String>, ResponsiveError> {
        self.image()?.tiny_blurred_data_uri()
    }

    pub fn tiny_source_attributes(&self) -> Result<Option<String>, ResponsiveError> {
        self.image()?.tiny_source_attributes()
    }

    pub fn method(&self) -> Result<ResizeMethod, ResponsiveError> {
        Ok(self.image()?.method())
    }

    pub fn width(&self) -> Result<u32, ResponsiveError> {
        self.image()?.width()
    }

    pub fn height(&self) -> Result<u32, ResponsiveError> {
        self.image()?.height()
    }
}
