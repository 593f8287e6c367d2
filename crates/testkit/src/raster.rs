use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use htmlmesh_core::{
    encode_png_data_url, AttachedFragment, Background, DecodeError, ImageDecoder,
    PngDataUrlDecoder, RasterError, Rasterizer, SnapshotOptions,
};
use tokio::sync::Notify;

/// [`Rasterizer`] that paints the target box with the requested background.
///
/// No markup is rendered; the output has the exact size and alpha a real
/// snapshot of the box would have.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessRasterizer;

#[async_trait]
impl Rasterizer for HeadlessRasterizer {
    async fn to_png(
        &self,
        _fragment: &AttachedFragment<'_>,
        options: SnapshotOptions,
    ) -> Result<String, RasterError> {
        let SnapshotOptions {
            background,
            width,
            height,
        } = options;
        if width == 0 || height == 0 {
            return Err(RasterError::EmptyBox { width, height });
        }
        let pixel = match background {
            Background::Transparent => [0, 0, 0, 0],
            Background::Solid(rgba) => rgba,
        };
        let rgba: Vec<u8> = pixel
            .iter()
            .copied()
            .cycle()
            .take((width as usize) * (height as usize) * 4)
            .collect();
        Ok(encode_png_data_url((width, height), &rgba)?)
    }
}

#[derive(Default)]
struct GateInner {
    entered: Notify,
    released: Notify,
    is_released: AtomicBool,
}

impl GateInner {
    async fn pass(&self) {
        self.entered.notify_one();
        if !self.is_released.load(Ordering::SeqCst) {
            self.released.notified().await;
        }
    }
}

/// Holds a gated [`ScriptedRasterizer`] inside its first call until released.
#[derive(Clone)]
pub struct RasterGate {
    inner: Arc<GateInner>,
}

impl RasterGate {
    /// Wait until a rasterization call reached the gate.
    pub async fn wait_until_entered(&self) {
        self.inner.entered.notified().await;
    }

    /// Let every pending and future call through.
    pub fn release(&self) {
        self.inner.is_released.store(true, Ordering::SeqCst);
        self.inner.released.notify_one();
    }
}

/// [`HeadlessRasterizer`] with call counting, markup-triggered failures and
/// an optional gate.
#[derive(Default)]
pub struct ScriptedRasterizer {
    inner: HeadlessRasterizer,
    failures: Vec<String>,
    calls: AtomicUsize,
    last_options: Mutex<Option<SnapshotOptions>>,
    gate: Option<Arc<GateInner>>,
}

impl ScriptedRasterizer {
    /// Rasterizer that always succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: fail every fragment whose inner markup contains `pattern`.
    pub fn fail_on(mut self, pattern: impl Into<String>) -> Self {
        self.failures.push(pattern.into());
        self
    }

    /// Builder: hold calls at a gate until [`RasterGate::release`].
    pub fn gated(mut self) -> (Self, RasterGate) {
        let inner = Arc::new(GateInner::default());
        self.gate = Some(Arc::clone(&inner));
        (self, RasterGate { inner })
    }

    /// Calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Options passed to the most recent call.
    pub fn last_options(&self) -> Option<SnapshotOptions> {
        *self.last_options.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Rasterizer for ScriptedRasterizer {
    async fn to_png(
        &self,
        fragment: &AttachedFragment<'_>,
        options: SnapshotOptions,
    ) -> Result<String, RasterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_options.lock().unwrap_or_else(PoisonError::into_inner) = Some(options);
        if let Some(gate) = &self.gate {
            gate.pass().await;
        }

        let markup = fragment.fragment().inner_html();
        if let Some(pattern) = self.failures.iter().find(|p| markup.contains(p.as_str())) {
            tracing::debug!(%pattern, "scripted rasterizer failure");
            return Err(RasterError::Host(format!("scripted failure for `{pattern}`")));
        }
        self.inner.to_png(fragment, options).await
    }
}

/// [`PngDataUrlDecoder`] that fails a scripted number of times first.
#[derive(Debug, Default)]
pub struct FlakyDecoder {
    inner: PngDataUrlDecoder,
    failures_left: AtomicU32,
    always_fail: bool,
    calls: AtomicUsize,
}

impl FlakyDecoder {
    /// Never fails on its own.
    pub fn reliable() -> Self {
        Self::failing_first(0)
    }

    /// Fails the first `failures` calls, then decodes normally.
    pub fn failing_first(failures: u32) -> Self {
        Self {
            failures_left: AtomicU32::new(failures),
            ..Default::default()
        }
    }

    /// Fails every call.
    pub fn always_failing() -> Self {
        Self {
            always_fail: true,
            ..Default::default()
        }
    }

    /// Calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageDecoder for FlakyDecoder {
    async fn decode(&self, url: &str) -> Result<(u32, u32), DecodeError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let scripted_failure = self.always_fail
            || self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
        if scripted_failure {
            return Err(DecodeError::Host(format!("scripted decode failure #{call}")));
        }
        self.inner.decode(url).await
    }
}

/// [`ImageDecoder`] that reports the same size for every payload.
#[derive(Debug, Clone, Copy)]
pub struct FixedSizeDecoder {
    size: (u32, u32),
}

impl FixedSizeDecoder {
    /// Decoder reporting `width` x `height`.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
        }
    }
}

#[async_trait]
impl ImageDecoder for FixedSizeDecoder {
    async fn decode(&self, _url: &str) -> Result<(u32, u32), DecodeError> {
        Ok(self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HeadlessDocument;
    use htmlmesh_core::{decode_png_dimensions, Fragment, FragmentStyle};

    #[tokio::test]
    async fn headless_snapshot_has_requested_size() {
        let document = Arc::new(HeadlessDocument::new());
        let fragment = Fragment::new("<b>A</b>").with_style(FragmentStyle::sized(100, 50));
        let attached = AttachedFragment::attach(document, &fragment);
        let url = HeadlessRasterizer
            .to_png(&attached, SnapshotOptions::transparent(100, 50))
            .await
            .expect("snapshot");
        assert_eq!(decode_png_dimensions(&url).expect("dims"), (100, 50));
    }

    #[tokio::test]
    async fn empty_box_is_an_error() {
        let document = Arc::new(HeadlessDocument::new());
        let fragment = Fragment::new("");
        let attached = AttachedFragment::attach(document, &fragment);
        let err = HeadlessRasterizer
            .to_png(&attached, SnapshotOptions::transparent(0, 16))
            .await
            .expect_err("empty box");
        assert!(matches!(err, RasterError::EmptyBox { width: 0, height: 16 }));
    }

    #[tokio::test]
    async fn flaky_decoder_recovers_after_scripted_failures() {
        let url = encode_png_data_url((2, 2), &[0u8; 16]).expect("encode");
        let decoder = FlakyDecoder::failing_first(2);
        assert!(decoder.decode(&url).await.is_err());
        assert!(decoder.decode(&url).await.is_err());
        assert_eq!(decoder.decode(&url).await.expect("third call"), (2, 2));
        assert_eq!(decoder.calls(), 3);

        let broken = FlakyDecoder::always_failing();
        assert!(broken.decode(&url).await.is_err());
    }

    #[tokio::test]
    async fn fixed_size_decoder_ignores_payload() {
        let decoder = FixedSizeDecoder::new(0, 0);
        assert_eq!(decoder.decode("not a png").await.expect("fixed"), (0, 0));
    }
}
