//! HTML fragments for responsive images.
//!
//! The descriptor hands a [`TagData`] to a [`TemplateRenderer`] together with
//! the name of the template to use. [`MaudRenderer`] is the built-in renderer:
//!
//! | Template | Output |
//! |---|---|
//! | [`Template::Tag`] | a complete `<img>` with `srcset`, `sizes` and the blurred placeholder |
//! | [`Template::OpenTag`] | an opening `<div ...>` carrying the same data, for wrapping content |
//! | [`Template::BackgroundAttr`] | a bare attribute list for an element with a background image |
//!
//! ## Source file comments
//!
//! When the process-wide source-comment toggle is on, every rendered fragment
//! is wrapped in `<!-- template ... -->` markers. That is useful when debugging
//! a page but breaks fragments that end up inside another tag, so the open tag
//! and the attribute list are rendered under a [`SourceCommentsSuppressed`]
//! guard, which turns the toggle off and restores it when dropped (including
//! on unwind).
//!
//! The toggle is a single process-wide flag, not per thread. While one thread
//! holds the guard, a `tag()` rendered concurrently on another thread also
//! comes out without comments. Set the toggle once at startup and do not rely
//! on comments in output rendered from several threads at a time.

use crate::imaging::Tier;
use maud::{Markup, html};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("template {0} has no sources to render")]
    NoSources(Template),
    #[error("template {template} failed: {reason}")]
    Failed { template: Template, reason: String },
}

/// Named templates a renderer must provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Template {
    Tag,
    OpenTag,
    BackgroundAttr,
}

impl Template {
    pub fn name(self) -> &'static str {
        match self {
            Template::Tag => "ResponsiveImageTag",
            Template::OpenTag => "ResponsiveImageOpenTag",
            Template::BackgroundAttr => "ResponsiveImageBackgroundAttr",
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One tier as seen by a template.
#[derive(Debug, Clone, PartialEq)]
pub struct TierSource {
    pub tier: Tier,
    /// `None` when the variant could not be produced.
    pub url: Option<String>,
    /// `"<int>w"`
    pub width: String,
    /// `"<int>h"`
    pub height: String,
}

/// Everything a template can read from a descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct TagData {
    /// Tiny, small, medium, large, in that order.
    pub tiers: Vec<TierSource>,
    pub media_query: Option<String>,
    /// Base class followed by any extra classes.
    pub classes: String,
    pub alt: String,
    pub width: u32,
    pub height: u32,
    /// Inline style value for the blurred tiny placeholder.
    pub placeholder_style: Option<String>,
}

impl TagData {
    fn tier(&self, tier: Tier) -> Option<&TierSource> {
        self.tiers.iter().find(|t| t.tier == tier)
    }

    /// `srcset` over the small, medium and large tiers that have a URL.
    pub fn srcset(&self) -> String {
        [Tier::Small, Tier::Medium, Tier::Large]
            .into_iter()
            .filter_map(|tier| self.tier(tier))
            .filter_map(|t| t.url.as_ref().map(|url| format!("{} {}", url, t.width)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Default `src`: the small tier, else the first tier with a URL.
    pub fn fallback_src(&self) -> Option<&str> {
        self.tier(Tier::Small)
            .and_then(|t| t.url.as_deref())
            .or_else(|| self.tiers.iter().find_map(|t| t.url.as_deref()))
    }
}

/// Inline style for a background placeholder image.
pub fn placeholder_style(data_uri: &str) -> String {
    format!(
        "background-image: url({data_uri}); background-repeat: no-repeat; background-size: cover;"
    )
}

/// Renders named templates against descriptor data.
pub trait TemplateRenderer {
    fn render(&self, template: Template, data: &TagData) -> Result<String, RenderError>;
}

// =========================================================================
// Source file comment toggle
// =========================================================================

static SOURCE_FILE_COMMENTS: AtomicBool = AtomicBool::new(false);

pub fn source_file_comments() -> bool {
    SOURCE_FILE_COMMENTS.load(Ordering::SeqCst)
}

pub fn set_source_file_comments(enabled: bool) {
    SOURCE_FILE_COMMENTS.store(enabled, Ordering::SeqCst);
}

/// Turns source file comments off until dropped, then restores the previous value.
///
/// The flag is process-wide: other threads rendering while the guard is held
/// see comments switched off too.
#[must_use = "comments are restored as soon as the guard is dropped"]
pub struct SourceCommentsSuppressed {
    previous: bool,
}

impl SourceCommentsSuppressed {
    pub fn new() -> Self {
        Self {
            previous: SOURCE_FILE_COMMENTS.swap(false, Ordering::SeqCst),
        }
    }
}

impl Default for SourceCommentsSuppressed {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SourceCommentsSuppressed {
    fn drop(&mut self) {
        SOURCE_FILE_COMMENTS.store(self.previous, Ordering::SeqCst);
    }
}

// =========================================================================
// Built-in maud templates
// =========================================================================

/// Renders the built-in templates with maud.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaudRenderer;

impl TemplateRenderer for MaudRenderer {
    fn render(&self, template: Template, data: &TagData) -> Result<String, RenderError> {
        let Some(src) = data.fallback_src() else {
            return Err(RenderError::NoSources(template));
        };
        let srcset = data.srcset();

        let fragment = match template {
            Template::Tag => render_tag(data, src, &srcset).into_string(),
            Template::OpenTag => open_tag(data, src, &srcset)?,
            Template::BackgroundAttr => background_attr(data, &srcset),
        };

        if source_file_comments() {
            Ok(format!(
                "<!-- template {template} -->{fragment}<!-- end template {template} -->"
            ))
        } else {
            Ok(fragment)
        }
    }
}

fn render_tag(data: &TagData, src: &str, srcset: &str) -> Markup {
    html! {
        img class=(data.classes)
            src=(src)
            srcset=(srcset)
            sizes=[data.media_query.as_deref()]
            width=(data.width)
            height=(data.height)
            alt=(data.alt)
            style=[data.placeholder_style.as_deref()];
    }
}

fn open_tag(data: &TagData, src: &str, srcset: &str) -> Result<String, RenderError> {
    let markup = html! {
        div class=(data.classes)
            data-src=(src)
            data-srcset=(srcset)
            data-sizes=[data.media_query.as_deref()]
            style=[data.placeholder_style.as_deref()] {}
    };
    let full = markup.into_string();
    full.strip_suffix("</div>")
        .map(str::to_string)
        .ok_or_else(|| RenderError::Failed {
            template: Template::OpenTag,
            reason: "unexpected element shape".into(),
        })
}

fn escape(value: &str) -> String {
    html! { (value) }.into_string()
}

fn background_attr(data: &TagData, srcset: &str) -> String {
    let mut attrs = vec![format!(r#"data-bgset="{}""#, escape(srcset))];
    if let Some(mq) = &data.media_query {
        attrs.push(format!(r#"data-sizes="{}""#, escape(mq)));
    }
    if let Some(style) = &data.placeholder_style {
        attrs.push(format!(r#"style="{}""#, escape(style)));
    }
    attrs.join(" ")
}
