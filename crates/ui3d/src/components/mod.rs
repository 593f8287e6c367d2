//! Interactive components built from HTML snapshots.

pub mod button;

pub use button::{ButtonLifecycle, HtmlButton, FORWARDED_TRIGGERS};
