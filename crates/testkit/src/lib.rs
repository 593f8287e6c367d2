#![warn(missing_docs)]
//! Headless host surfaces for exercising the snapshot pipeline without a 3D
//! engine or a browser.

mod document;
mod raster;
mod scene;

pub use document::{layout_size, HeadlessDocument, GLYPH_WIDTH_PX, LINE_HEIGHT_PX};
pub use raster::{
    FixedSizeDecoder, FlakyDecoder, HeadlessRasterizer, RasterGate, ScriptedRasterizer,
};
pub use scene::{HeadlessScene, MaterialRecord, NodeKind, NodeRecord, TextureRecord};
