//! HTML snapshot to textured plane pipeline.

use std::sync::Arc;

use htmlmesh_core::{
    AttachedFragment, DecodeError, DisposeMode, Document, Fragment, ImageData, ImageDecoder,
    MaterialId, NodeId, RasterError, Rasterizer, Scene, SceneAction, SnapshotOptions,
    TextureChannel, TextureId,
};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::cache::{ContentHash, SnapshotCache};
use crate::interaction::{PlaneVisualState, StateTextures, TEXTURE_SWAP_TRIGGERS};
use crate::options::{MeshOptions, PlaneSize};

/// Tunables for [`HtmlMeshBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuilderConfig {
    /// Maximum number of cached snapshots.
    pub cache_capacity: usize,
    /// Total decode attempts per snapshot (first try included).
    pub decode_attempts: u32,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            cache_capacity: SnapshotCache::DEFAULT_CAPACITY,
            decode_attempts: 3,
        }
    }
}

/// Why a snapshot or a plane could not be produced.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Mesh options carry no markup to rasterize.
    #[error("mesh options carry no html")]
    MissingMarkup,
    /// The decoded snapshot has no area.
    #[error("snapshot decoded to an empty {width}x{height} image")]
    EmptyBox {
        /// Decoded width in pixels.
        width: u32,
        /// Decoded height in pixels.
        height: u32,
    },
    /// The host rasterizer failed.
    #[error(transparent)]
    Raster(#[from] RasterError),
    /// Every decode attempt failed.
    #[error("image decode failed after {attempts} attempts: {source}")]
    Decode {
        /// Attempts made.
        attempts: u32,
        /// Error of the last attempt.
        #[source]
        source: DecodeError,
    },
}

/// Handles of a plane built by [`HtmlMeshBuilder::create_plane`].
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneMesh {
    /// The plane mesh.
    pub mesh: NodeId,
    /// Its unlit material.
    pub material: MaterialId,
    /// Host textures per visual state.
    pub textures: StateTextures<TextureId>,
    /// Snapshots per visual state.
    pub images: StateTextures<ImageData>,
    /// Final plane dimensions.
    pub size: PlaneSize,
}

impl PlaneMesh {
    /// Dispose the mesh, its material and every state texture, bound or not.
    pub fn dispose(&self, scene: &dyn Scene) {
        scene.dispose(self.mesh, DisposeMode::FULL);
        for texture in self.textures.iter() {
            scene.dispose_texture(*texture);
        }
    }
}

/// Rasterizes HTML fragments (memoized by content hash) and builds
/// interactive textured planes from them.
#[derive(Clone)]
pub struct HtmlMeshBuilder {
    document: Arc<dyn Document>,
    rasterizer: Arc<dyn Rasterizer>,
    decoder: Arc<dyn ImageDecoder>,
    cache: Arc<SnapshotCache>,
    config: BuilderConfig,
}

impl HtmlMeshBuilder {
    /// Builder with the default configuration and a private cache.
    pub fn new(
        document: Arc<dyn Document>,
        rasterizer: Arc<dyn Rasterizer>,
        decoder: Arc<dyn ImageDecoder>,
    ) -> Self {
        Self::with_config(document, rasterizer, decoder, BuilderConfig::default())
    }

    /// Builder with an explicit configuration and a private cache.
    pub fn with_config(
        document: Arc<dyn Document>,
        rasterizer: Arc<dyn Rasterizer>,
        decoder: Arc<dyn ImageDecoder>,
        config: BuilderConfig,
    ) -> Self {
        Self {
            document,
            rasterizer,
            decoder,
            cache: Arc::new(SnapshotCache::new(config.cache_capacity)),
            config,
        }
    }

    /// Builder: share `cache` instead of the private one.
    pub fn with_cache(mut self, cache: Arc<SnapshotCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Snapshot cache used by this builder.
    pub fn cache(&self) -> &Arc<SnapshotCache> {
        &self.cache
    }

    /// Active configuration.
    pub fn config(&self) -> BuilderConfig {
        self.config
    }

    /// Rasterize `fragment`, or return the cached snapshot of identical markup.
    ///
    /// Failures are logged together with the fragment and reported as `None`.
    pub async fn create_image_data(&self, fragment: &Fragment) -> Option<ImageData> {
        match self.try_create_image_data(fragment).await {
            Ok(data) => Some(data),
            Err(err) => {
                error!(%err, %fragment, "failed to snapshot html fragment");
                None
            }
        }
    }

    /// Fallible variant of [`HtmlMeshBuilder::create_image_data`].
    pub async fn try_create_image_data(
        &self,
        fragment: &Fragment,
    ) -> Result<ImageData, SnapshotError> {
        let hash = ContentHash::of_markup(fragment.inner_html());
        if let Some(data) = self.cache.get(&hash) {
            debug!(%hash, "snapshot cache hit");
            return Ok(data);
        }

        let url = self.rasterize(fragment).await?;
        let (width, height) = self.decode_with_retry(&url).await?;
        if width == 0 || height == 0 {
            return Err(SnapshotError::EmptyBox { width, height });
        }
        let data = ImageData::new(url, width, height);
        self.cache.insert(hash, data.clone());
        Ok(data)
    }

    async fn rasterize(&self, fragment: &Fragment) -> Result<String, RasterError> {
        let attached = AttachedFragment::attach(Arc::clone(&self.document), fragment);
        let (width, height) = attached.client_size();
        let url = self
            .rasterizer
            .to_png(&attached, SnapshotOptions::transparent(width, height))
            .await?;
        drop(attached);
        Ok(url)
    }

    async fn decode_with_retry(&self, url: &str) -> Result<(u32, u32), SnapshotError> {
        let attempts = self.config.decode_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.decoder.decode(url).await {
                Ok(size) => {
                    if attempt > 1 {
                        warn!(
                            attempt,
                            "image decode succeeded after retrying; too many or too complex html fragments may be in flight"
                        );
                    }
                    return Ok(size);
                }
                Err(err) if attempt < attempts => {
                    warn!(attempt, %err, "image decode failed, retrying");
                    attempt += 1;
                }
                Err(source) => {
                    return Err(SnapshotError::Decode {
                        attempts: attempt,
                        source,
                    })
                }
            }
        }
    }

    /// Build an interactive plane showing `options.html`, swapping to the
    /// hover/click snapshots on pointer triggers.
    ///
    /// Returns `None` (after logging) if the markup is missing or the idle
    /// snapshot fails; nothing is created in `scene` in that case. Hover and
    /// click snapshot failures fall back to the idle snapshot.
    pub async fn create_plane(
        &self,
        name: &str,
        options: &MeshOptions,
        scene: &dyn Scene,
    ) -> Option<PlaneMesh> {
        match self.try_create_plane(name, options, scene).await {
            Ok(plane) => Some(plane),
            Err(err) => {
                error!(name, %err, html = %options.html, "html plane not built");
                None
            }
        }
    }

    /// Fallible variant of [`HtmlMeshBuilder::create_plane`].
    pub async fn try_create_plane(
        &self,
        name: &str,
        options: &MeshOptions,
        scene: &dyn Scene,
    ) -> Result<PlaneMesh, SnapshotError> {
        if options.is_missing_html() {
            return Err(SnapshotError::MissingMarkup);
        }

        let fragments = options.fragments();
        let idle = self.try_create_image_data(&fragments.idle).await?;
        let hover = self
            .create_image_data(&fragments.hover)
            .await
            .unwrap_or_else(|| idle.clone());
        let click = self
            .create_image_data(&fragments.click)
            .await
            .unwrap_or_else(|| idle.clone());
        let images = StateTextures { idle, hover, click };

        let size = PlaneSize::resolve(options.width, options.height, &images.idle);
        let mesh = scene.create_plane(name, size.width, size.height);
        let material = scene.create_unlit_material(&format!("{name}Material"));
        scene.set_material(mesh, material);

        let textures = images.map(|image| self.create_texture(&image.base64_url, scene));
        for channel in TextureChannel::BOTH {
            scene.set_material_texture(material, channel, textures.idle);
        }
        for trigger in TEXTURE_SWAP_TRIGGERS {
            let Some(state) = PlaneVisualState::after(trigger) else {
                continue;
            };
            let texture = *textures.for_state(state);
            for channel in TextureChannel::BOTH {
                scene.register_action(
                    mesh,
                    trigger,
                    SceneAction::SetTexture {
                        material,
                        channel,
                        texture,
                    },
                );
            }
        }

        debug!(name, width = size.width, height = size.height, "built html plane");
        Ok(PlaneMesh {
            mesh,
            material,
            textures,
            images,
            size,
        })
    }

    /// Create a host texture from an encoded image URL.
    pub fn create_texture(&self, base64: &str, scene: &dyn Scene) -> TextureId {
        scene.create_texture(base64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use htmlmesh_core::PointerTrigger;
    use htmlmesh_testkit::{
        FixedSizeDecoder, FlakyDecoder, HeadlessDocument, HeadlessScene, ScriptedRasterizer,
    };

    struct Harness {
        builder: HtmlMeshBuilder,
        rasterizer: Arc<ScriptedRasterizer>,
        decoder: Arc<FlakyDecoder>,
        document: Arc<HeadlessDocument>,
    }

    fn harness(rasterizer: ScriptedRasterizer, decoder: FlakyDecoder) -> Harness {
        let document = Arc::new(HeadlessDocument::new());
        let rasterizer = Arc::new(rasterizer);
        let decoder = Arc::new(decoder);
        let builder = HtmlMeshBuilder::new(document.clone(), rasterizer.clone(), decoder.clone());
        Harness {
            builder,
            rasterizer,
            decoder,
            document,
        }
    }

    fn sized(html: &str, width: u32, height: u32) -> Fragment {
        Fragment::new(html).with_style(htmlmesh_core::FragmentStyle::sized(width, height))
    }

    #[tokio::test]
    async fn identical_markup_hits_cache() {
        let h = harness(ScriptedRasterizer::new(), FlakyDecoder::reliable());
        let first = h.builder.create_image_data(&sized("<b>A</b>", 100, 50)).await;
        let second = h.builder.create_image_data(&sized("<b>A</b>", 100, 50)).await;

        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(h.rasterizer.calls(), 1);
        assert_eq!(h.builder.cache().stats().hits, 1);
        assert_eq!(h.builder.cache().len(), 1);
    }

    #[tokio::test]
    async fn snapshot_uses_client_box_and_detaches() {
        let h = harness(ScriptedRasterizer::new(), FlakyDecoder::reliable());
        let data = h
            .builder
            .create_image_data(&sized("<b>A</b>", 100, 50))
            .await
            .expect("snapshot");
        assert_eq!((data.width, data.height), (100, 50));
        assert_eq!(h.rasterizer.last_options(), Some(SnapshotOptions::transparent(100, 50)));
        assert_eq!(h.document.attached_count(), 0);
        assert_eq!(h.document.total_attached(), 1);
    }

    #[tokio::test]
    async fn decode_succeeds_on_third_attempt() {
        let h = harness(ScriptedRasterizer::new(), FlakyDecoder::failing_first(2));
        let data = h.builder.create_image_data(&Fragment::new("<p>x</p>")).await;
        assert!(data.is_some());
        assert_eq!(h.decoder.calls(), 3);
    }

    #[tokio::test]
    async fn decode_gives_up_after_three_attempts() {
        let h = harness(ScriptedRasterizer::new(), FlakyDecoder::failing_first(3));
        let err = h
            .builder
            .try_create_image_data(&Fragment::new("<p>x</p>"))
            .await
            .expect_err("decode should fail");
        assert!(matches!(err, SnapshotError::Decode { attempts: 3, .. }));
        assert_eq!(h.decoder.calls(), 3);
        assert!(h.builder.cache().is_empty());
    }

    #[tokio::test]
    async fn raster_failure_detaches_fragment() {
        let h = harness(
            ScriptedRasterizer::new().fail_on("broken"),
            FlakyDecoder::reliable(),
        );
        assert!(h.builder.create_image_data(&Fragment::new("broken")).await.is_none());
        assert_eq!(h.document.attached_count(), 0);
        assert_eq!(h.decoder.calls(), 0);
    }

    #[tokio::test]
    async fn width_only_plane_follows_image_aspect() {
        let h = harness(ScriptedRasterizer::new(), FlakyDecoder::reliable());
        let scene = HeadlessScene::new();
        let options = MeshOptions::new("<b>A</b>").with_width(2.0).with_image(100, 50);
        let plane = h
            .builder
            .create_plane("btn", &options, &scene)
            .await
            .expect("plane");

        assert_eq!(plane.size, PlaneSize { width: 2.0, height: 1.0 });
        assert_eq!(scene.plane_size(plane.mesh), Some((2.0, 1.0)));
        let material = scene.material(plane.material).expect("material");
        assert_eq!(material.name, "btnMaterial");
        assert!(material.unlit);
    }

    #[tokio::test]
    async fn plane_defaults_to_unit_quad() {
        let h = harness(ScriptedRasterizer::new(), FlakyDecoder::reliable());
        let scene = HeadlessScene::new();
        let plane = h
            .builder
            .create_plane("p", &MeshOptions::new("<b>A</b>").with_image(300, 100), &scene)
            .await
            .expect("plane");
        assert_eq!(plane.size, PlaneSize { width: 1.0, height: 1.0 });
    }

    #[tokio::test]
    async fn pointer_triggers_swap_both_channels() {
        let h = harness(ScriptedRasterizer::new(), FlakyDecoder::reliable());
        let scene = HeadlessScene::new();
        let options = MeshOptions::new("<b>idle</b>")
            .with_hover_html("<b>hover</b>")
            .with_click_html("<b>click</b>")
            .with_image(64, 32);
        let plane = h
            .builder
            .create_plane("p", &options, &scene)
            .await
            .expect("plane");

        let bound = |channel| scene.material_texture(plane.material, channel);
        let assert_showing = |texture: TextureId| {
            assert_eq!(bound(TextureChannel::Emissive), Some(texture));
            assert_eq!(bound(TextureChannel::Opacity), Some(texture));
        };

        assert_showing(plane.textures.idle);
        scene.fire(plane.mesh, PointerTrigger::PointerOver);
        assert_showing(plane.textures.hover);
        scene.fire(plane.mesh, PointerTrigger::PickDown);
        assert_showing(plane.textures.click);
        scene.fire(plane.mesh, PointerTrigger::PickUp);
        assert_showing(plane.textures.hover);
        scene.fire(plane.mesh, PointerTrigger::PointerOut);
        assert_showing(plane.textures.idle);
        assert_eq!(h.rasterizer.calls(), 3);
    }

    #[tokio::test]
    async fn hover_and_click_failures_fall_back_to_idle() {
        let h = harness(
            ScriptedRasterizer::new().fail_on("hover").fail_on("click"),
            FlakyDecoder::reliable(),
        );
        let scene = HeadlessScene::new();
        let options = MeshOptions::new("<b>idle</b>")
            .with_hover_html("<b>hover</b>")
            .with_click_html("<b>click</b>");
        let plane = h
            .builder
            .create_plane("p", &options, &scene)
            .await
            .expect("plane survives hover/click failure");

        assert_eq!(plane.images.hover, plane.images.idle);
        assert_eq!(plane.images.click, plane.images.idle);
        let idle_url = scene.texture_url(plane.textures.idle);
        assert_eq!(scene.texture_url(plane.textures.hover), idle_url);
        assert_eq!(scene.texture_url(plane.textures.click), idle_url);
    }

    #[tokio::test]
    async fn idle_failure_builds_nothing() {
        let h = harness(ScriptedRasterizer::new().fail_on("idle"), FlakyDecoder::reliable());
        let scene = HeadlessScene::new();
        let options = MeshOptions::new("<b>idle</b>").with_hover_html("<b>hover</b>");
        assert!(h.builder.create_plane("p", &options, &scene).await.is_none());
        assert_eq!(scene.node_count(), 0);
        assert_eq!(scene.material_count(), 0);
        assert_eq!(scene.texture_count(), 0);
        // Hover/click are never attempted once the idle snapshot fails.
        assert_eq!(h.rasterizer.calls(), 1);
    }

    #[tokio::test]
    async fn missing_html_is_rejected_before_rasterizing() {
        let h = harness(ScriptedRasterizer::new(), FlakyDecoder::reliable());
        let scene = HeadlessScene::new();
        let err = h
            .builder
            .try_create_plane("p", &MeshOptions::new("  "), &scene)
            .await
            .expect_err("no markup");
        assert!(matches!(err, SnapshotError::MissingMarkup));
        assert!(h
            .builder
            .create_plane("p", &MeshOptions::new(""), &scene)
            .await
            .is_none());
        assert_eq!(h.rasterizer.calls(), 0);
        assert_eq!(scene.node_count(), 0);
    }

    #[tokio::test]
    async fn empty_decoded_image_builds_no_plane() {
        let rasterizer = Arc::new(ScriptedRasterizer::new());
        let builder = HtmlMeshBuilder::new(
            Arc::new(HeadlessDocument::new()),
            rasterizer.clone(),
            Arc::new(FixedSizeDecoder::new(0, 0)),
        );
        let scene = HeadlessScene::new();
        let options = MeshOptions::new("<b>A</b>").with_width(2.0);

        let err = builder
            .try_create_plane("p", &options, &scene)
            .await
            .expect_err("empty snapshot");
        assert!(matches!(err, SnapshotError::EmptyBox { width: 0, height: 0 }));
        assert!(builder.create_plane("p", &options, &scene).await.is_none());
        assert_eq!(scene.node_count(), 0);
        assert!(builder.cache().is_empty());
        assert_eq!(rasterizer.calls(), 2);
    }

    #[tokio::test]
    async fn disposing_a_plane_releases_every_state_texture() {
        let h = harness(ScriptedRasterizer::new(), FlakyDecoder::reliable());
        let scene = HeadlessScene::new();
        let options = MeshOptions::new("<b>idle</b>")
            .with_hover_html("<b>hover</b>")
            .with_click_html("<b>click</b>");
        let plane = h
            .builder
            .create_plane("p", &options, &scene)
            .await
            .expect("plane");
        assert_eq!(scene.live_texture_count(), 3);

        plane.dispose(&scene);

        assert!(scene.is_disposed(plane.mesh));
        assert!(scene.material(plane.material).expect("material").disposed);
        for texture in plane.textures.iter() {
            assert!(scene.texture(*texture).expect("texture").disposed);
        }
        assert_eq!(scene.live_texture_count(), 0);
    }

    #[tokio::test]
    async fn shared_cache_spans_builders() {
        let cache = Arc::new(SnapshotCache::new(8));
        let a = harness(ScriptedRasterizer::new(), FlakyDecoder::reliable());
        let b = harness(ScriptedRasterizer::new(), FlakyDecoder::reliable());
        let builder_a = a.builder.clone().with_cache(cache.clone());
        let builder_b = b.builder.clone().with_cache(cache.clone());

        let fragment = Fragment::new("<b>shared</b>");
        assert!(builder_a.create_image_data(&fragment).await.is_some());
        assert!(builder_b.create_image_data(&fragment).await.is_some());
        assert_eq!(a.rasterizer.calls(), 1);
        assert_eq!(b.rasterizer.calls(), 0);
    }
}
