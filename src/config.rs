use anyhow::Result;
use htmlmesh_ui3d::{BuilderConfig, ButtonOptions, MeshOptions};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::warn;

const DEFAULT_CONFIG_PATH: &str = "config/htmlmesh.toml";

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Maximum number of cached snapshots.
    pub cache_capacity: usize,
    /// Total decode attempts per snapshot.
    pub decode_attempts: u32,
    pub button: ButtonConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ButtonConfig {
    pub name: String,
    pub id: String,
    /// Plane width in world units; derived from the snapshot when unset.
    pub width: Option<f32>,
    /// Plane height in world units; 0.1 when unset.
    pub height: Option<f32>,
    pub template: Option<String>,
    pub main_style: Option<String>,
    pub hover_style: Option<String>,
    pub click_style: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let builder = BuilderConfig::default();
        Self {
            cache_capacity: builder.cache_capacity,
            decode_attempts: builder.decode_attempts,
            button: ButtonConfig::default(),
        }
    }
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            name: "OK".to_string(),
            id: "ok-1".to_string(),
            width: None,
            height: None,
            template: None,
            main_style: None,
            hover_style: None,
            click_style: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path.
    pub fn load() -> Self {
        Self::load_from_path(Path::new(DEFAULT_CONFIG_PATH))
    }

    /// Load configuration from an explicit path, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<AppConfig>(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    AppConfig::default()
                }
            },
            Err(err) => {
                if path != Path::new(DEFAULT_CONFIG_PATH) || err.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                }
                AppConfig::default()
            }
        }
    }

    /// Save configuration to an explicit path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let toml = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        Ok(())
    }

    pub fn builder_config(&self) -> BuilderConfig {
        BuilderConfig {
            cache_capacity: self.cache_capacity,
            decode_attempts: self.decode_attempts,
        }
    }
}

impl ButtonConfig {
    pub fn button_options(&self) -> ButtonOptions {
        ButtonOptions {
            template: self.template.clone(),
            main_style: self.main_style.clone(),
            hover_style: self.hover_style.clone(),
            click_style: self.click_style.clone(),
        }
    }

    /// Partial mesh options; the button fills everything left unset.
    pub fn mesh_options(&self) -> Option<MeshOptions> {
        if self.width.is_none() && self.height.is_none() {
            return None;
        }
        Some(MeshOptions {
            width: self.width,
            height: self.height,
            ..Default::default()
        })
    }
}
