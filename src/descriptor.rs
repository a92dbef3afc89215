//! Responsive image descriptor.
//!
//! A [`ResponsiveImage`] serves one rendering pass for one image placement.
//! It starts empty; [`set_original`](ResponsiveImage::set_original) computes
//! the tier sizes once, after which every accessor is valid:
//!
//! ```text
//! ResponsiveImage::new ──► set_original(original, w, h) ──► accessors / tag()
//!      (no original)          computes DimensionSet            (read-only,
//!                                                               cached)
//! ```
//!
//! ## Degradation
//!
//! Only construction errors ([`ResponsiveError::MissingOriginal`], invalid
//! dimensions under the strict policy) are surfaced. A tier whose variant
//! cannot be produced has no source, and a placeholder that can't be blurred
//! or read is simply left out of the markup; both are logged with `tracing`.
//!
//! ## Caching
//!
//! Tier sources and the blurred tiny variant are cached in `OnceCell`s, so
//! accessors are idempotent and the placeholder is blurred at most once per
//! descriptor. A descriptor is therefore `!Sync`; build one per request.

use crate::imaging::{
    DimensionError, DimensionSet, ImageBackend, OriginalImage, Quality, ResizeMethod,
    ScalingFactors, Size, Tier, Variant, VariantRequest, ZeroDimensionPolicy, blurred_variant,
    compute_dimensions, image_to_data_uri,
};
use crate::render::{
    MaudRenderer, SourceCommentsSuppressed, TagData, Template, TemplateRenderer, TierSource,
    placeholder_style,
};
use std::cell::OnceCell;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResponsiveError {
    #[error("no original image has been set")]
    MissingOriginal,
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimension { width: f64, height: f64 },
    #[error("original image has 0 height")]
    ZeroHeight,
    #[error("variant unavailable: {0}")]
    VariantUnavailable(String),
    #[error("cannot read {path}: {reason}")]
    AssetUnreadable { path: String, reason: String },
    #[error("render failed: {0}")]
    Render(String),
}

impl From<DimensionError> for ResponsiveError {
    fn from(e: DimensionError) -> Self {
        match e {
            DimensionError::InvalidDimension { width, height } => {
                ResponsiveError::InvalidDimension { width, height }
            }
            DimensionError::ZeroHeight => ResponsiveError::ZeroHeight,
        }
    }
}

/// Per-descriptor settings, usually produced by
/// [`ResponsiveConfig::settings`](crate::config::ResponsiveConfig::settings).
#[derive(Debug, Clone, PartialEq)]
pub struct ResponsiveSettings {
    pub factors: ScalingFactors,
    /// Method used when none is set explicitly.
    pub default_method: ResizeMethod,
    pub zero_policy: ZeroDimensionPolicy,
    /// Gaussian sigma for the tiny placeholder.
    pub blur_sigma: f32,
    pub quality: Quality,
    /// Class every rendered tag carries, before any extra classes.
    pub base_class: String,
}

impl Default for ResponsiveSettings {
    fn default() -> Self {
        Self {
            factors: ScalingFactors::default(),
            default_method: ResizeMethod::SetWidth,
            zero_policy: ZeroDimensionPolicy::Lenient,
            blur_sigma: 8.0,
            quality: Quality::default(),
            base_class: "responsive-image".into(),
        }
    }
}

static DEFAULT_RENDERER: MaudRenderer = MaudRenderer;

enum State<'a> {
    Uninitialized,
    Computed {
        original: &'a dyn OriginalImage,
        dimensions: DimensionSet,
    },
}

/// Tier sizes, sources and placeholder for one image placement.
pub struct ResponsiveImage<'a> {
    backend: &'a dyn ImageBackend,
    renderer: &'a dyn TemplateRenderer,
    settings: ResponsiveSettings,
    state: State<'a>,
    method: Option<ResizeMethod>,
    media_query: Option<String>,
    extra_classes: Option<String>,
    sources: [OnceCell<Option<String>>; 4],
    tiny_blurred: OnceCell<Option<Variant>>,
}

impl<'a> ResponsiveImage<'a> {
    pub fn new(backend: &'a dyn ImageBackend, settings: ResponsiveSettings) -> Self {
        Self {
            backend,
            renderer: &DEFAULT_RENDERER,
            settings,
            state: State::Uninitialized,
            method: None,
            media_query: None,
            extra_classes: None,
            sources: Default::default(),
            tiny_blurred: OnceCell::new(),
        }
    }

    /// Use `renderer` instead of the built-in maud templates.
    pub fn with_renderer(mut self, renderer: &'a dyn TemplateRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn settings(&self) -> &ResponsiveSettings {
        &self.settings
    }

    /// Attach the original and compute every tier from `width` × `height`.
    ///
    /// The method in effect at this point decides the driving axis. On error
    /// the descriptor keeps its previous state.
    pub fn set_original(
        &mut self,
        original: Option<&'a dyn OriginalImage>,
        width: f64,
        height: f64,
    ) -> Result<(), ResponsiveError> {
        let original = original.ok_or(ResponsiveError::MissingOriginal)?;
        let dimensions = compute_dimensions(
            width,
            height,
            self.method(),
            &self.settings.factors,
            self.settings.zero_policy,
        )?;
        debug!(
            width,
            height,
            method = %self.method(),
            "computed responsive dimensions"
        );
        self.state = State::Computed {
            original,
            dimensions,
        };
        self.clear_caches();
        Ok(())
    }

    fn clear_caches(&mut self) {
        self.sources = Default::default();
        self.tiny_blurred = OnceCell::new();
    }

    pub fn dimensions(&self) -> Result<&DimensionSet, ResponsiveError> {
        match &self.state {
            State::Computed { dimensions, .. } => Ok(dimensions),
            State::Uninitialized => Err(ResponsiveError::MissingOriginal),
        }
    }

    pub fn original(&self) -> Result<&'a dyn OriginalImage, ResponsiveError> {
        match self.state {
            State::Computed { original, .. } => Ok(original),
            State::Uninitialized => Err(ResponsiveError::MissingOriginal),
        }
    }

    pub fn size(&self, tier: Tier) -> Result<Size, ResponsiveError> {
        Ok(self.dimensions()?.get(tier))
    }

    // ==== per-tier accessors ====

    /// Floored width of `tier`, as `"<int>w"`.
    pub fn source_width(&self, tier: Tier) -> Result<String, ResponsiveError> {
        Ok(format!("{}w", floor_px(self.size(tier)?.width)))
    }

    /// Floored height of `tier`, as `"<int>h"`.
    pub fn source_height(&self, tier: Tier) -> Result<String, ResponsiveError> {
        Ok(format!("{}h", floor_px(self.size(tier)?.height)))
    }

    /// The request the original is asked to fulfil for `tier`.
    pub fn variant_request(&self, tier: Tier) -> Result<VariantRequest, ResponsiveError> {
        Ok(VariantRequest::for_size(self.method(), self.size(tier)?))
    }

    /// URL for `tier`, failing if the variant can't be produced.
    ///
    /// The large tier is served from the original itself when its size equals
    /// the original's intrinsic size.
    pub fn try_source(&self, tier: Tier) -> Result<String, ResponsiveError> {
        let original = self.original()?;
        let size = self.size(tier)?;
        if tier == Tier::Large && size.is_exactly(original.width(), original.height()) {
            return Ok(original.url());
        }
        let request = self.variant_request(tier)?;
        original
            .variant(&request)
            .map(|v| v.url)
            .map_err(|e| ResponsiveError::VariantUnavailable(format!("{tier}: {e}")))
    }

    /// URL for `tier`, or `None` if its variant can't be produced.
    pub fn source(&self, tier: Tier) -> Result<Option<String>, ResponsiveError> {
        self.dimensions()?;
        let cell = &self.sources[tier as usize];
        let url = cell.get_or_init(|| match self.try_source(tier) {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(%tier, error = %e, "tier source unavailable");
                None
            }
        });
        Ok(url.clone())
    }

    // ==== tiny placeholder ====

    /// The blurred copy of the tiny variant. Looked up at most once per
    /// descriptor; `None` if it could not be produced or blurred.
    pub fn tiny_blurred_image(&self) -> Result<Option<&Variant>, ResponsiveError> {
        let original = self.original()?;
        let request = self.variant_request(Tier::Tiny)?;
        let variant = self.tiny_blurred.get_or_init(|| {
            let variant = match original.variant(&request) {
                Ok(v) => v,
                Err(e) => {
                    warn!(error = %e, "tiny variant unavailable");
                    return None;
                }
            };
            match blurred_variant(
                self.backend,
                &variant,
                self.settings.blur_sigma,
                self.settings.quality,
            ) {
                Ok(blurred) => Some(blurred),
                Err(e) => {
                    warn!(path = %variant.path.display(), error = %e, "blur failed");
                    None
                }
            }
        });
        Ok(variant.as_ref())
    }

    /// URL of the blurred tiny variant.
    pub fn tiny_blurred_source(&self) -> Result<Option<String>, ResponsiveError> {
        Ok(self.tiny_blurred_image()?.map(|v| v.url.clone()))
    }

    /// The blurred tiny variant as a `data:` URI, failing if it can't be read.
    pub fn try_tiny_blurred_data_uri(&self) -> Result<String, ResponsiveError> {
        let variant = self.tiny_blurred_image()?.ok_or_else(|| {
            ResponsiveError::VariantUnavailable("tiny placeholder".into())
        })?;
        image_to_data_uri(&variant.path).map_err(|e| ResponsiveError::AssetUnreadable {
            path: variant.path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// The blurred tiny variant as a `data:` URI, or `None` if unavailable.
    pub fn tiny_blurred_data_uri(&self) -> Result<Option<String>, ResponsiveError> {
        match self.try_tiny_blurred_data_uri() {
            Ok(uri) => Ok(Some(uri)),
            Err(ResponsiveError::MissingOriginal) => Err(ResponsiveError::MissingOriginal),
            Err(e) => {
                warn!(error = %e, "placeholder omitted");
                Ok(None)
            }
        }
    }

    /// `style="..."` attribute that paints the placeholder as a background.
    pub fn tiny_source_attributes(&self) -> Result<Option<String>, ResponsiveError> {
        Ok(self
            .tiny_blurred_data_uri()?
            .map(|uri| format!(r#"style="{}""#, placeholder_style(&uri))))
    }

    // ==== metadata ====

    /// The explicitly set method, or the configured default.
    pub fn method(&self) -> ResizeMethod {
        self.method.unwrap_or(self.settings.default_method)
    }

    /// Change the method used for variant requests. Computed sizes stay as
    /// they are; cached sources are dropped.
    pub fn set_method(&mut self, method: ResizeMethod) {
        self.method = Some(method);
        self.clear_caches();
    }

    pub fn media_query(&self) -> Option<&str> {
        self.media_query.as_deref()
    }

    pub fn set_media_query(&mut self, media_query: impl Into<String>) {
        self.media_query = Some(media_query.into());
    }

    pub fn extra_classes(&self) -> Option<&str> {
        self.extra_classes.as_deref()
    }

    /// Replaces any previously added classes.
    pub fn add_extra_classes(&mut self, classes: impl Into<String>) {
        self.extra_classes = Some(classes.into());
    }

    /// Original intrinsic width when known, else the small tier's width.
    pub fn width(&self) -> Result<u32, ResponsiveError> {
        let original = self.original()?;
        if original.width() > 0 {
            Ok(original.width())
        } else {
            Ok(floor_px(self.size(Tier::Small)?.width))
        }
    }

    /// Original intrinsic height when known, else the small tier's height.
    pub fn height(&self) -> Result<u32, ResponsiveError> {
        let original = self.original()?;
        if original.height() > 0 {
            Ok(original.height())
        } else {
            Ok(floor_px(self.size(Tier::Small)?.height))
        }
    }

    // ==== rendering ====

    /// Everything the templates read, with degraded parts left empty.
    pub fn tag_data(&self) -> Result<TagData, ResponsiveError> {
        let tiers = Tier::ALL
            .into_iter()
            .map(|tier| {
                Ok(TierSource {
                    tier,
                    url: self.source(tier)?,
                    width: self.source_width(tier)?,
                    height: self.source_height(tier)?,
                })
            })
            .collect::<Result<Vec<_>, ResponsiveError>>()?;

        let classes = match self.extra_classes() {
            Some(extra) if !extra.trim().is_empty() => {
                format!("{} {}", self.settings.base_class, extra.trim())
            }
            _ => self.settings.base_class.clone(),
        };
        let original = self.original()?;

        Ok(TagData {
            tiers,
            media_query: self.media_query.clone(),
            classes,
            alt: original.title().unwrap_or_default().to_string(),
            width: self.width()?,
            height: self.height()?,
            placeholder_style: self.tiny_blurred_data_uri()?.map(|uri| placeholder_style(&uri)),
        })
    }

    fn render(&self, template: Template) -> Result<String, ResponsiveError> {
        let data = self.tag_data()?;
        self.renderer
            .render(template, &data)
            .map_err(|e| ResponsiveError::Render(e.to_string()))
    }

    /// Complete `<img>` tag.
    pub fn tag(&self) -> Result<String, ResponsiveError> {
        self.render(Template::Tag)
    }

    /// Opening wrapper tag, rendered without source file comments.
    pub fn open_tag(&self) -> Result<String, ResponsiveError> {
        let _quiet = SourceCommentsSuppressed::new();
        self.render(Template::OpenTag)
    }

    /// Attribute list for a background image, rendered without source file
    /// comments.
    pub fn background_attr(&self) -> Result<String, ResponsiveError> {
        let _quiet = SourceCommentsSuppressed::new();
        self.render(Template::BackgroundAttr)
    }
}

fn floor_px(value: f64) -> u32 {
    value.floor() as u32
}
