//! PNG data-URL encoding and dimension decoding.

use std::io::Cursor;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ColorType, ImageEncoder, ImageReader};

use crate::{DecodeError, ImageDecoder};

/// Prefix of every PNG snapshot URL.
pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Encode tightly packed RGBA8 pixels as a PNG data URL.
pub fn encode_png_data_url(size: (u32, u32), rgba: &[u8]) -> Result<String, image::ImageError> {
    let (width, height) = size;
    let mut png = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut png, CompressionType::Fast, FilterType::NoFilter);
    encoder.write_image(rgba, width, height, ColorType::Rgba8.into())?;
    Ok(format!("{PNG_DATA_URL_PREFIX}{}", STANDARD.encode(&png)))
}

/// Read the pixel dimensions of a base64 image data URL without decoding pixels.
pub fn decode_png_dimensions(url: &str) -> Result<(u32, u32), DecodeError> {
    let payload = data_url_payload(url).ok_or(DecodeError::NotDataUrl)?;
    let bytes = STANDARD.decode(payload)?;
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(image::ImageError::IoError)?;
    Ok(reader.into_dimensions()?)
}

fn data_url_payload(url: &str) -> Option<&str> {
    let rest = url.strip_prefix("data:")?;
    let (_, payload) = rest.split_once(";base64,")?;
    Some(payload)
}

/// [`ImageDecoder`] for in-memory `data:` URLs.
#[derive(Debug, Default, Clone, Copy)]
pub struct PngDataUrlDecoder;

#[async_trait]
impl ImageDecoder for PngDataUrlDecoder {
    async fn decode(&self, url: &str) -> Result<(u32, u32), DecodeError> {
        decode_png_dimensions(url)
    }
}
