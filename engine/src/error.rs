use std::path::PathBuf;

use thiserror::Error;

/// Why a dice expression could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
    #[error("empty dice expression")]
    Empty,
    #[error("invalid dice notation: {0}")]
    InvalidNotation(String),
    #[error("dice count must be at least 1 (in {0})")]
    NoDice(String),
    #[error("die must have at least 1 side (in {0})")]
    InvalidDieSize(String),
    #[error("number out of range in {0}")]
    OutOfRange(String),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog JSON")]
    Json(#[from] serde_json::Error),
    #[error("failed to parse catalog YAML")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unsupported catalog format: {0} (expected .json, .yaml or .yml)")]
    UnknownFormat(PathBuf),
    #[error("adversary '{id}' has tier {tier}, expected 1..=4")]
    InvalidTier { id: String, tier: u8 },
    #[error("duplicate adversary id '{0}'")]
    DuplicateId(String),
}

#[derive(Debug, Error)]
pub enum EncounterError {
    #[error("share code is not valid base64")]
    Base64(#[from] base64::DecodeError),
    #[error("share code does not contain UTF-8 text")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("encounter JSON is malformed")]
    Json(#[from] serde_json::Error),
    #[error("encounter '{0}' must have at least one player")]
    InvalidPlayerCount(String),
    #[error("entry '{0}' must have a quantity between 1 and 1000")]
    InvalidQuantity(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config JSON")]
    Json(#[from] serde_json::Error),
    #[error("failed to parse config YAML")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unsupported config format: {0} (expected .json, .yaml or .yml)")]
    UnknownFormat(PathBuf),
    #[error("unknown log level '{0}'")]
    InvalidLogLevel(String),
}
