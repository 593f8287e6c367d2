//! htmlmesh - interactive HTML snapshots on 3D planes
//!
//! Headless demo executable: builds a button, replays pointer input and
//! reports which textures were bound along the way.

mod config;
mod demo;

use anyhow::{Context, Result};
use config::AppConfig;
use std::{env, fs, path::PathBuf};
use tracing::info;

fn main() -> Result<()> {
    // Initialize tracing with WARN level by default (can be overridden via RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    info!("Starting htmlmesh v{}", env!("CARGO_PKG_VERSION"));

    let cli = CliOptions::parse(env::args().skip(1));
    if let Some(path) = &cli.write_config {
        AppConfig::default().save_to_path(path)?;
        info!(path = %path.display(), "wrote default configuration");
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from_path(path),
        None => AppConfig::load(),
    };
    cli.apply(&mut config);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let report = runtime.block_on(demo::run(&config))?;
    report.log();

    if let Some(path) = &cli.out {
        fs::write(path, report.to_toml()?)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        info!(path = %path.display(), "wrote demo report");
    }

    Ok(())
}

#[derive(Debug, Default)]
struct CliOptions {
    config: Option<PathBuf>,
    write_config: Option<PathBuf>,
    name: Option<String>,
    id: Option<String>,
    width: Option<f32>,
    height: Option<f32>,
    out: Option<PathBuf>,
}

impl CliOptions {
    fn parse<I: Iterator<Item = String>>(mut args: I) -> Self {
        let mut opts = CliOptions::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => {
                    if let Some(path) = args.next() {
                        opts.config = Some(PathBuf::from(path));
                    } else {
                        tracing::error!("--config requires a file path");
                    }
                }
                "--write-config" => {
                    if let Some(path) = args.next() {
                        opts.write_config = Some(PathBuf::from(path));
                    } else {
                        tracing::error!("--write-config requires a file path");
                    }
                }
                "--name" => {
                    if let Some(name) = args.next() {
                        opts.name = Some(name);
                    } else {
                        tracing::error!("--name requires a label");
                    }
                }
                "--id" => {
                    if let Some(id) = args.next() {
                        opts.id = Some(id);
                    } else {
                        tracing::error!("--id requires an identifier");
                    }
                }
                "--width" => opts.width = parse_dimension("--width", args.next()),
                "--height" => opts.height = parse_dimension("--height", args.next()),
                "--out" => {
                    if let Some(path) = args.next() {
                        opts.out = Some(PathBuf::from(path));
                    } else {
                        tracing::error!("--out requires a file path");
                    }
                }
                other => tracing::warn!(arg = %other, "ignoring unknown argument"),
            }
        }

        opts
    }

    fn apply(&self, config: &mut AppConfig) {
        if let Some(name) = &self.name {
            config.button.name = name.clone();
        }
        if let Some(id) = &self.id {
            config.button.id = id.clone();
        }
        if self.width.is_some() {
            config.button.width = self.width;
        }
        if self.height.is_some() {
            config.button.height = self.height;
        }
    }
}

fn parse_dimension(flag: &str, raw: Option<String>) -> Option<f32> {
    let Some(raw) = raw else {
        tracing::error!("{flag} requires a number");
        return None;
    };
    match raw.parse::<f32>() {
        Ok(value) if value.is_finite() && value > 0.0 => Some(value),
        Ok(_) => {
            tracing::error!(value = %raw, "{flag} must be a positive number");
            None
        }
        Err(err) => {
            tracing::error!(%err, value = %raw, "{flag} must be a number");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliOptions {
        CliOptions::parse(args.iter().map(|arg| arg.to_string()))
    }

    #[test]
    fn overrides_apply_on_top_of_config() {
        let cli = parse(&["--name", "Go", "--id", "go-1", "--width", "0.25"]);
        let mut config = AppConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.button.name, "Go");
        assert_eq!(config.button.id, "go-1");
        assert_eq!(config.button.width, Some(0.25));
        assert_eq!(config.button.height, None);
    }

    #[test]
    fn invalid_dimensions_are_ignored() {
        let cli = parse(&["--width", "wide", "--height", "-1"]);
        assert_eq!(cli.width, None);
        assert_eq!(cli.height, None);
    }

    #[test]
    fn missing_values_leave_options_unset() {
        let cli = parse(&["--out"]);
        assert!(cli.out.is_none());
        let cli = parse(&["--config", "a.toml", "--out", "report.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("a.toml")));
        assert_eq!(cli.out, Some(PathBuf::from("report.toml")));
    }
}
