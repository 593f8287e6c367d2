//! Mesh and button options, and the pure merge functions that fill defaults.

use htmlmesh_core::{Fragment, FragmentStyle, ImageData};

use crate::interaction::StateTextures;

/// Plane height used by buttons when none is given.
pub const DEFAULT_PLANE_HEIGHT: f32 = 0.1;

/// Snapshot resolution used by buttons when none is given.
pub const DEFAULT_SNAPSHOT_SIZE: ImageSize = ImageSize {
    width: 256,
    height: 256,
};

/// Container size of a snapshot, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ImageSize {
    /// Create a size.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Input contract for [`HtmlMeshBuilder::create_plane`](crate::HtmlMeshBuilder::create_plane).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshOptions {
    /// Markup shown in the idle state.
    pub html: String,
    /// Plane width in world units.
    pub width: Option<f32>,
    /// Plane height in world units.
    pub height: Option<f32>,
    /// Snapshot container size.
    pub image: Option<ImageSize>,
    /// Markup shown while hovered (defaults to `html`).
    pub hover_html: Option<String>,
    /// Markup shown while pressed (defaults to `html`).
    pub click_html: Option<String>,
}

impl MeshOptions {
    /// Options with only the idle markup set.
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            ..Default::default()
        }
    }

    /// Builder: set the plane width.
    pub fn with_width(mut self, width: f32) -> Self {
        self.width = Some(width);
        self
    }

    /// Builder: set the plane height.
    pub fn with_height(mut self, height: f32) -> Self {
        self.height = Some(height);
        self
    }

    /// Builder: set the snapshot container size.
    pub fn with_image(mut self, width: u32, height: u32) -> Self {
        self.image = Some(ImageSize::new(width, height));
        self
    }

    /// Builder: set the hover markup.
    pub fn with_hover_html(mut self, html: impl Into<String>) -> Self {
        self.hover_html = Some(html.into());
        self
    }

    /// Builder: set the click markup.
    pub fn with_click_html(mut self, html: impl Into<String>) -> Self {
        self.click_html = Some(html.into());
        self
    }

    /// Returns true when no idle markup was supplied.
    pub fn is_missing_html(&self) -> bool {
        self.html.trim().is_empty()
    }

    /// Build the idle/hover/click fragments.
    pub fn fragments(&self) -> StateTextures<Fragment> {
        let style = self
            .image
            .map(|size| FragmentStyle::sized(size.width, size.height))
            .unwrap_or_default();
        let fragment = |html: &str| Fragment::new(html).with_style(style);
        StateTextures {
            idle: fragment(&self.html),
            hover: fragment(self.hover_html.as_deref().unwrap_or(&self.html)),
            click: fragment(self.click_html.as_deref().unwrap_or(&self.html)),
        }
    }

    /// Fill unset fields of `partial` from `defaults`.
    ///
    /// `width` is never defaulted. When `defaults` carries a height (as
    /// button defaults do) both dimensions end up set and no aspect-ratio
    /// derivation takes place.
    pub fn merged(partial: Option<&MeshOptions>, defaults: &MeshOptions) -> MeshOptions {
        let Some(partial) = partial else {
            return defaults.clone();
        };
        MeshOptions {
            html: if partial.is_missing_html() {
                defaults.html.clone()
            } else {
                partial.html.clone()
            },
            width: partial.width,
            height: set_dimension(partial.height).or(defaults.height),
            image: partial.image.or(defaults.image),
            hover_html: non_empty(&partial.hover_html).or_else(|| defaults.hover_html.clone()),
            click_html: non_empty(&partial.click_html).or_else(|| defaults.click_html.clone()),
        }
    }

    /// Default mesh options for a button labelled `name`.
    pub fn for_button(name: &str, style: &ButtonStyle) -> MeshOptions {
        MeshOptions {
            html: style.render(name, &style.main),
            width: None,
            height: Some(DEFAULT_PLANE_HEIGHT),
            image: Some(DEFAULT_SNAPSHOT_SIZE),
            hover_html: Some(style.render(name, &style.hover)),
            click_html: Some(style.render(name, &style.click)),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|html| !html.trim().is_empty()).cloned()
}

/// Zero and NaN count as "not given".
fn set_dimension(value: Option<f32>) -> Option<f32> {
    value.filter(|v| *v != 0.0 && !v.is_nan())
}

/// Final plane dimensions in world units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneSize {
    /// Width in world units.
    pub width: f32,
    /// Height in world units.
    pub height: f32,
}

impl PlaneSize {
    /// Derive plane dimensions from the requested ones and the idle snapshot.
    ///
    /// Neither given yields a unit quad; one given derives the other from the
    /// snapshot's aspect ratio.
    pub fn resolve(width: Option<f32>, height: Option<f32>, image: &ImageData) -> PlaneSize {
        match (set_dimension(width), set_dimension(height)) {
            (None, None) => PlaneSize {
                width: 1.0,
                height: 1.0,
            },
            (Some(width), Some(height)) => PlaneSize { width, height },
            (Some(width), None) => PlaneSize {
                width,
                height: width * image.aspect_ratio(),
            },
            (None, Some(height)) => PlaneSize {
                width: height / image.aspect_ratio(),
                height,
            },
        }
    }
}

/// Idle style used when a button sets none.
pub const DEFAULT_STYLE: &str = "border-style: outset; border-radius: 32px; background: #000000; width: 100%; height: 100%; color: #ffffff; font-size: 64px";
/// Hover style used when a button sets none.
pub const DEFAULT_HOVER_STYLE: &str = "border-style: outset; border-radius: 32px; background: #333366; width: 100%; height: 100%; color: #ffffee; font-size: 68px";
/// Click style used when a button sets none.
pub const DEFAULT_CLICK_STYLE: &str = "border-style: inset; border-radius: 32px; background: #666633; width: 100%; height: 100%; color: #000000; font-size: 60px";
/// Markup template used when a button sets none. `{style}` and `{name}` are substituted.
pub const DEFAULT_TEMPLATE: &str = "<button style='{style}'>{name}</button>";

/// Partial button styling supplied by callers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ButtonOptions {
    /// Markup template with `{style}` and `{name}` placeholders.
    pub template: Option<String>,
    /// Inline style of the idle state.
    pub main_style: Option<String>,
    /// Inline style of the hover state.
    pub hover_style: Option<String>,
    /// Inline style of the click state.
    pub click_style: Option<String>,
}

impl ButtonOptions {
    /// Builder: set the markup template.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Builder: set the idle style.
    pub fn with_main_style(mut self, style: impl Into<String>) -> Self {
        self.main_style = Some(style.into());
        self
    }

    /// Builder: set the hover style.
    pub fn with_hover_style(mut self, style: impl Into<String>) -> Self {
        self.hover_style = Some(style.into());
        self
    }

    /// Builder: set the click style.
    pub fn with_click_style(mut self, style: impl Into<String>) -> Self {
        self.click_style = Some(style.into());
        self
    }
}

/// Fully populated button styling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonStyle {
    /// Markup template.
    pub template: String,
    /// Idle style.
    pub main: String,
    /// Hover style.
    pub hover: String,
    /// Click style.
    pub click: String,
}

impl Default for ButtonStyle {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
            main: DEFAULT_STYLE.to_string(),
            hover: DEFAULT_HOVER_STYLE.to_string(),
            click: DEFAULT_CLICK_STYLE.to_string(),
        }
    }
}

impl ButtonStyle {
    /// Fill unset fields of `partial` with the built-in defaults.
    pub fn resolve(partial: Option<&ButtonOptions>) -> ButtonStyle {
        let defaults = ButtonStyle::default();
        let Some(partial) = partial else {
            return defaults;
        };
        ButtonStyle {
            template: non_empty(&partial.template).unwrap_or(defaults.template),
            main: non_empty(&partial.main_style).unwrap_or(defaults.main),
            hover: non_empty(&partial.hover_style).unwrap_or(defaults.hover),
            click: non_empty(&partial.click_style).unwrap_or(defaults.click),
        }
    }

    /// Render the template for `name` in `style`.
    pub fn render(&self, name: &str, style: &str) -> String {
        self.template
            .replace("{style}", style)
            .replace("{name}", name)
    }
}
