//! Headless walkthrough of an HTML button: build, hover, press, release, leave.

use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{bail, Result};
use htmlmesh_core::{PngDataUrlDecoder, PointerTrigger, TextureChannel};
use htmlmesh_testkit::{HeadlessDocument, HeadlessRasterizer, HeadlessScene};
use htmlmesh_ui3d::{HtmlButton, HtmlMeshBuilder};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::AppConfig;

/// Pointer sequence replayed against the built button.
pub const POINTER_SEQUENCE: [PointerTrigger; 5] = [
    PointerTrigger::PointerOver,
    PointerTrigger::PickDown,
    PointerTrigger::PickUp,
    PointerTrigger::Pick,
    PointerTrigger::PointerOut,
];

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DemoReport {
    pub name: String,
    pub id: String,
    pub plane_width: f32,
    pub plane_height: f32,
    /// Triggers that reached the button's pointer observers, in order.
    pub forwarded: Vec<String>,
    /// Snapshot cache counters after a second button with the same label was built.
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_len: usize,
    pub steps: Vec<DemoStep>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DemoStep {
    pub trigger: String,
    pub emissive_texture: Option<u64>,
    pub opacity_texture: Option<u64>,
}

impl DemoReport {
    pub fn log(&self) {
        info!(
            name = %self.name,
            id = %self.id,
            width = self.plane_width,
            height = self.plane_height,
            "button ready"
        );
        for step in &self.steps {
            info!(
                trigger = %step.trigger,
                emissive = ?step.emissive_texture,
                opacity = ?step.opacity_texture,
                "pointer step"
            );
        }
        info!(
            forwarded = self.forwarded.len(),
            hits = self.cache_hits,
            misses = self.cache_misses,
            cached = self.cache_len,
            "demo finished"
        );
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

pub async fn run(config: &AppConfig) -> Result<DemoReport> {
    let scene = Arc::new(HeadlessScene::new());
    let builder = HtmlMeshBuilder::with_config(
        Arc::new(HeadlessDocument::new()),
        Arc::new(HeadlessRasterizer),
        Arc::new(PngDataUrlDecoder),
        config.builder_config(),
    );

    let button_config = &config.button;
    let button = HtmlButton::new(
        button_config.name.clone(),
        button_config.id.clone(),
        scene.clone(),
        Some(button_config.button_options()),
        button_config.mesh_options(),
    );

    let forwarded = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&forwarded);
    button.on_pointer().add(move |event| {
        sink.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(format!("{:?}", event.trigger));
    });
    button
        .on_ready()
        .add(|button| debug!(name = button.name(), mesh = ?button.mesh(), "on_ready"));

    let Some(mesh) = button.build(&builder).await else {
        bail!("button `{}` could not be rasterized", button_config.name);
    };
    let Some(material) = scene.node(mesh).and_then(|node| node.material) else {
        bail!("button mesh has no material");
    };
    let (plane_width, plane_height) = scene.plane_size(mesh).unwrap_or_default();

    let mut steps = Vec::with_capacity(POINTER_SEQUENCE.len());
    for trigger in POINTER_SEQUENCE {
        scene.fire(mesh, trigger);
        steps.push(DemoStep {
            trigger: format!("{trigger:?}"),
            emissive_texture: scene
                .material_texture(material, TextureChannel::Emissive)
                .map(|texture| texture.0),
            opacity_texture: scene
                .material_texture(material, TextureChannel::Opacity)
                .map(|texture| texture.0),
        });
    }

    let twin = HtmlButton::new(
        button_config.name.clone(),
        format!("{}-twin", button_config.id),
        scene.clone(),
        Some(button_config.button_options()),
        button_config.mesh_options(),
    );
    twin.build(&builder).await;
    let stats = builder.cache().stats();

    twin.dispose();
    button.dispose();

    let forwarded = std::mem::take(&mut *forwarded.lock().unwrap_or_else(PoisonError::into_inner));
    Ok(DemoReport {
        name: button_config.name.clone(),
        id: button_config.id.clone(),
        plane_width,
        plane_height,
        forwarded,
        cache_hits: stats.hits,
        cache_misses: stats.misses,
        cache_len: stats.len,
        steps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_button_walkthrough() {
        let report = run(&AppConfig::default()).await.expect("demo runs");

        assert_eq!(report.name, "OK");
        assert!((report.plane_width - 0.1).abs() < 1e-6);
        assert!((report.plane_height - 0.1).abs() < 1e-6);
        assert_eq!(report.forwarded, ["PointerOver", "Pick", "PointerOut"]);

        for step in &report.steps {
            assert_eq!(step.emissive_texture, step.opacity_texture);
        }
        let idle = report.steps[4].emissive_texture;
        let hover = report.steps[0].emissive_texture;
        let click = report.steps[1].emissive_texture;
        assert_ne!(idle, hover);
        assert_ne!(hover, click);
        assert_eq!(report.steps[2].emissive_texture, hover);
        assert_eq!(report.steps[3].emissive_texture, hover);

        assert_eq!(report.cache_misses, 3);
        assert_eq!(report.cache_hits, 3);
        assert_eq!(report.cache_len, 3);
        assert!(report.to_toml().expect("toml").contains("cache_hits = 3"));
    }

    #[tokio::test]
    async fn configured_width_keeps_default_height() {
        let mut config = AppConfig::default();
        config.button.width = Some(0.5);
        let report = run(&config).await.expect("demo runs");
        assert!((report.plane_width - 0.5).abs() < 1e-6);
        assert!((report.plane_height - 0.1).abs() < 1e-6);
    }
}
