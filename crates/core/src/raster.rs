//! DOM-to-PNG rasterization and image decode primitives.

use async_trait::async_trait;
use thiserror::Error;

use crate::AttachedFragment;

/// Background painted behind the fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Background {
    /// Fully transparent (alpha = 0).
    Transparent,
    /// Solid RGBA color.
    Solid([u8; 4]),
}

/// Target box and background for one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotOptions {
    /// Background behind the fragment.
    pub background: Background,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
}

impl SnapshotOptions {
    /// Transparent snapshot of the given box.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            background: Background::Transparent,
            width,
            height,
        }
    }
}

/// Failure reported by a [`Rasterizer`].
#[derive(Debug, Error)]
pub enum RasterError {
    /// The fragment laid out to an empty box.
    #[error("fragment has an empty client box ({width}x{height})")]
    EmptyBox {
        /// Laid-out width.
        width: u32,
        /// Laid-out height.
        height: u32,
    },
    /// PNG encoding of the captured pixels failed.
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] image::ImageError),
    /// Host-specific failure.
    #[error("rasterizer failed: {0}")]
    Host(String),
}

/// Host DOM-to-PNG primitive.
///
/// The fragment is attached to a live document for the duration of the call.
#[async_trait]
pub trait Rasterizer: Send + Sync {
    /// Capture `fragment` as a PNG data URL.
    async fn to_png(
        &self,
        fragment: &AttachedFragment<'_>,
        options: SnapshotOptions,
    ) -> Result<String, RasterError>;
}

/// Failure reported by an [`ImageDecoder`].
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The URL is not a base64 data URL.
    #[error("not a base64 data URL")]
    NotDataUrl,
    /// The payload is not valid base64.
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    /// The payload is not a decodable image.
    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),
    /// Host-specific failure.
    #[error("decoder failed: {0}")]
    Host(String),
}

/// Host image decode primitive.
#[async_trait]
pub trait ImageDecoder: Send + Sync {
    /// Resolve the pixel dimensions `(width, height)` of an encoded image.
    async fn decode(&self, url: &str) -> Result<(u32, u32), DecodeError>;
}
