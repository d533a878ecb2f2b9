//! Application config file (`~/.config/cloudsweep/config.yaml`)
//!
//! Every field is optional. Command line flags win over the file.

use anyhow::Context;
use cloudsweep_core::{DiscoveryConfig, SupervisorConfig};
use cloudsweep_search::SearchConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_LOG_FILE: &str = "/tmp/cloudsweep.log";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub scaleway: ScalewayConfig,
    pub discovery: DiscoveryConfig,
    pub supervisor: SupervisorConfig,
    pub search: SearchConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `error`, `warn`, `info`, `debug` or `trace`, or any `EnvFilter` directive.
    pub level: String,
    pub file: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalewayConfig {
    /// Profile of the Scaleway CLI config. Unset means the active profile.
    pub profile: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Resource cache database. Unset means `<cache dir>/cloudsweep/cache.db`.
    pub path: Option<PathBuf>,
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("cloudsweep").join("config.yaml"))
}

/// Default location of the resource cache, one file per mode.
pub fn default_db_path(demo: bool) -> PathBuf {
    let file = if demo { "demo.db" } else { "cache.db" };
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("cloudsweep")
        .join(file)
}

impl AppConfig {
    /// Loads `path`, or the default location. A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("config file not found: {}", path.display());
                }
                path.to_path_buf()
            }
            None => match config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: AppConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        config.discovery.validate()?;
        Ok(config)
    }
}
