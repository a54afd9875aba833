use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::error::ConfigError;
use crate::scaling::ScalingOptions;

/// Settings shared by the CLI tools. Every field has a default, so an empty
/// file is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EngineConfig {
    /// Adversary dataset; the builtin one when absent.
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub scaling: ScalingOptions,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            log_level: default_log_level(),
            scaling: ScalingOptions::default(),
        }
    }
}

impl EngineConfig {
    /// Reads a `.json`, `.yaml` or `.yml` config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_text_for_path(path, &text)
    }

    /// Parses already-read `text` in the format implied by `path`.
    pub fn from_text_for_path(path: &Path, text: &str) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        let config: EngineConfig = match ext.as_deref() {
            Some("json") => serde_json::from_str(text)?,
            Some("yaml") | Some("yml") => {
                if text.trim().is_empty() {
                    EngineConfig::default()
                } else {
                    serde_yaml::from_str(text)?
                }
            }
            _ => return Err(ConfigError::UnknownFormat(path.to_path_buf())),
        };
        config.level()?;
        Ok(config)
    }

    pub fn level(&self) -> Result<Level, ConfigError> {
        parse_level(&self.log_level)
    }
}

pub fn parse_level(s: &str) -> Result<Level, ConfigError> {
    s.trim()
        .parse::<Level>()
        .map_err(|_| ConfigError::InvalidLogLevel(s.to_string()))
}

/// Installs the global fmt subscriber on stderr. Later calls are no-ops.
pub fn init_tracing(level: Level) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
