//! Interactive HTML planes for 3D scenes
//!
//! This crate rasterizes HTML fragments to PNG snapshots and maps them onto
//! planes in a host 3D scene, swapping idle/hover/click textures on pointer
//! triggers.
//!
//! # Features
//!
//! - **Snapshot cache**: snapshots are memoized by the SHA-256 of their markup
//! - **Decode retry**: flaky image decodes are retried before giving up
//! - **Interactive planes**: idle/hover/click textures wired to pointer triggers
//! - **Buttons**: a transform + plane with ready and pointer event streams
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use htmlmesh_core::{Document, ImageDecoder, Rasterizer, Scene};
//! use htmlmesh_ui3d::{HtmlButton, HtmlMeshBuilder};
//!
//! async fn spawn_ok_button(
//!     scene: Arc<dyn Scene>,
//!     document: Arc<dyn Document>,
//!     rasterizer: Arc<dyn Rasterizer>,
//!     decoder: Arc<dyn ImageDecoder>,
//! ) -> HtmlButton {
//!     let builder = HtmlMeshBuilder::new(document, rasterizer, decoder);
//!     let button = HtmlButton::new("OK", "ok-1", scene, None, None);
//!     button.on_pointer().add(|event| tracing::info!(trigger = ?event.trigger, "pointer"));
//!     button.build(&builder).await;
//!     button
//! }
//! ```

pub mod builder;
pub mod cache;
pub mod components;
pub mod interaction;
pub mod observable;
pub mod options;

// Re-export commonly used types
pub use builder::{BuilderConfig, HtmlMeshBuilder, PlaneMesh, SnapshotError};
pub use cache::{CacheStats, ContentHash, SnapshotCache};
pub use components::{ButtonLifecycle, HtmlButton};
pub use interaction::{PlaneVisualState, StateTextures};
pub use observable::{Observable, ObserverId};
pub use options::{ButtonOptions, ButtonStyle, ImageSize, MeshOptions, PlaneSize};
