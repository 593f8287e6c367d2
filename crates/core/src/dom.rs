//! DOM fragments and the live document they are rasterized in.

use std::fmt;
use std::sync::Arc;

/// Inline box styling applied to a fragment's container element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FragmentStyle {
    /// Container width in CSS pixels.
    pub width_px: Option<u32>,
    /// Container height in CSS pixels.
    pub height_px: Option<u32>,
}

impl FragmentStyle {
    /// Fixed-size container.
    pub fn sized(width_px: u32, height_px: u32) -> Self {
        Self {
            width_px: Some(width_px),
            height_px: Some(height_px),
        }
    }

    /// Render as an inline `style` attribute value.
    pub fn to_css(&self) -> String {
        let mut css = String::new();
        if let Some(width) = self.width_px {
            css.push_str(&format!("width: {width}px;"));
        }
        if let Some(height) = self.height_px {
            if !css.is_empty() {
                css.push(' ');
            }
            css.push_str(&format!("height: {height}px;"));
        }
        css
    }
}

/// A `<div>` container holding an HTML subtree, used as rasterization input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    inner_html: String,
    style: FragmentStyle,
}

impl Fragment {
    /// Container with `inner_html` as its content and no explicit size.
    pub fn new(inner_html: impl Into<String>) -> Self {
        Self {
            inner_html: inner_html.into(),
            style: FragmentStyle::default(),
        }
    }

    /// Builder: set the container style.
    pub fn with_style(mut self, style: FragmentStyle) -> Self {
        self.style = style;
        self
    }

    /// Serialized inner markup (the content-hash input).
    pub fn inner_html(&self) -> &str {
        &self.inner_html
    }

    /// Container style.
    pub fn style(&self) -> FragmentStyle {
        self.style
    }

    /// Serialized outer markup including the container element.
    pub fn outer_html(&self) -> String {
        let css = self.style.to_css();
        if css.is_empty() {
            format!("<div>{}</div>", self.inner_html)
        } else {
            format!("<div style=\"{css}\">{}</div>", self.inner_html)
        }
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.outer_html())
    }
}

/// Live document tree the rasterizer lays fragments out in.
pub trait Document: Send + Sync {
    /// Append `fragment` to the document body. Returns a host handle.
    fn attach(&self, fragment: &Fragment) -> u64;

    /// Rendered client box `(width, height)` of an attached fragment, in pixels.
    fn client_size(&self, handle: u64) -> (u32, u32);

    /// Remove a previously attached fragment.
    fn detach(&self, handle: u64);
}

/// A fragment attached to a [`Document`] for the lifetime of this guard.
///
/// Detaches on drop, so the fragment never outlives a failed rasterization.
pub struct AttachedFragment<'a> {
    document: Arc<dyn Document>,
    fragment: &'a Fragment,
    handle: u64,
}

impl<'a> AttachedFragment<'a> {
    /// Attach `fragment` to `document`.
    pub fn attach(document: Arc<dyn Document>, fragment: &'a Fragment) -> Self {
        let handle = document.attach(fragment);
        Self {
            document,
            fragment,
            handle,
        }
    }

    /// The attached fragment.
    pub fn fragment(&self) -> &Fragment {
        self.fragment
    }

    /// Rendered client box of the fragment.
    pub fn client_size(&self) -> (u32, u32) {
        self.document.client_size(self.handle)
    }
}

impl Drop for AttachedFragment<'_> {
    fn drop(&mut self) {
        self.document.detach(self.handle);
    }
}
