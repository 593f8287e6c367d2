//! Pointer interaction for snapshot planes.
//!
//! The host action system fires the triggers; this module only decides
//! which texture each trigger shows.

pub mod state;

pub use state::{PlaneVisualState, StateTextures, TEXTURE_SWAP_TRIGGERS};
