#![warn(missing_docs)]
//! Host interfaces shared across the workspace.
//!
//! The HTML snapshot pipeline never talks to a concrete 3D engine or browser.
//! Everything it needs from the host (scene graph, action system, live
//! document, DOM-to-PNG rasterizer, image decoder) is reached through the
//! traits defined here.

mod codec;
mod dom;
mod pointer;
mod raster;
mod scene;

pub use codec::{decode_png_dimensions, encode_png_data_url, PngDataUrlDecoder, PNG_DATA_URL_PREFIX};
pub use dom::{AttachedFragment, Document, Fragment, FragmentStyle};
pub use pointer::{PointerEvent, PointerTrigger};
pub use raster::{Background, DecodeError, ImageDecoder, RasterError, Rasterizer, SnapshotOptions};
pub use scene::{
    ActionCallback, DisposeMode, MaterialId, NodeId, Scene, SceneAction, TextureChannel, TextureId,
};

use std::sync::Arc;

/// Result of rasterizing one HTML fragment.
///
/// Immutable once produced; clones share the encoded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    /// Encoded image as a data URL (`data:image/png;base64,...`).
    pub base64_url: Arc<str>,
    /// Decoded pixel width.
    pub width: u32,
    /// Decoded pixel height.
    pub height: u32,
}

impl ImageData {
    /// Bundle an encoded snapshot with its decoded dimensions.
    pub fn new(base64_url: impl Into<Arc<str>>, width: u32, height: u32) -> Self {
        Self {
            base64_url: base64_url.into(),
            width,
            height,
        }
    }

    /// Height divided by width, used to derive plane dimensions.
    pub fn aspect_ratio(&self) -> f32 {
        self.height as f32 / self.width as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_data_clones_share_payload() {
        let a = ImageData::new("data:image/png;base64,AAAA", 100, 50);
        let b = a.clone();
        assert!(Arc::ptr_eq(&a.base64_url, &b.base64_url));
        assert_eq!(a, b);
    }

    #[test]
    fn aspect_ratio_is_height_over_width() {
        let image = ImageData::new("x", 100, 50);
        assert!((image.aspect_ratio() - 0.5).abs() < f32::EPSILON);
    }
}
