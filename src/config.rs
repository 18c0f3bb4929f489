//! Resolved build/runtime settings.
//!
//! A [`RuntimeConfig`] is loaded once per bootstrap call and treated as
//! immutable afterwards. Two independently resolved instances exist per
//! bootstrap: one for the running package's own base directory (serving its
//! assets) and one for the target project being built/served. They must not
//! be conflated.

use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "stagehand.toml";
const DEFAULT_ASSETS_PREFIX: &str = "assets";
const DEFAULT_PORT: u16 = 3000;

/// Optional overrides read from `stagehand.toml` in the base directory.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    assets_path_prefix: Option<String>,
    server_public_dir: Option<PathBuf>,
    port: Option<u16>,
}

/// Settings resolved for one base directory.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Directory the config was resolved for.
    pub base: PathBuf,
    /// URL prefix the build assets are mounted under. May lack a leading
    /// slash; the bootstrap normalizes it before mounting.
    pub assets_path_prefix: String,
    /// Development public directory holding the source `index.html`. Absent
    /// in pure production setups.
    pub server_public_dir: Option<PathBuf>,
    /// Configured listen port. Env and explicit fallbacks take precedence,
    /// see [`resolve_port`].
    pub port: u16,
}

impl RuntimeConfig {
    /// Resolve the configuration for `base`: defaults merged with an optional
    /// `stagehand.toml` found there. A relative `server_public_dir` is
    /// resolved against `base`.
    pub fn load(base: &Path) -> anyhow::Result<Self> {
        let file_path = base.join(CONFIG_FILE);
        let file: ConfigFile = if file_path.is_file() {
            let raw = std::fs::read_to_string(&file_path)
                .with_context(|| format!("reading {}", file_path.display()))?;
            toml::from_str(&raw).with_context(|| format!("parsing {}", file_path.display()))?
        } else {
            ConfigFile::default()
        };

        let server_public_dir = file.server_public_dir.map(|dir| {
            if dir.is_absolute() {
                dir
            } else {
                base.join(dir)
            }
        });

        Ok(RuntimeConfig {
            base: base.to_path_buf(),
            assets_path_prefix: file
                .assets_path_prefix
                .unwrap_or_else(|| DEFAULT_ASSETS_PREFIX.to_string()),
            server_public_dir,
            port: file.port.unwrap_or(DEFAULT_PORT),
        })
    }
}

/// Listen-port precedence: `PORT` env var, then the explicit fallback
/// argument, then the configured value.
pub fn resolve_port(config: &RuntimeConfig, fallback: Option<u16>) -> u16 {
    port_from(std::env::var("PORT").ok().as_deref(), fallback, config.port)
}

fn port_from(env_value: Option<&str>, fallback: Option<u16>, configured: u16) -> u16 {
    env_value
        .and_then(|v| v.parse::<u16>().ok())
        .or(fallback)
        .unwrap_or(configured)
}
