//! File-based configuration loading

use super::model::Config;
use crate::cache::StoreBackend;
use crate::error::{RecallError, RecallResult};
use std::fs;
use std::path::Path;

/// Formats a configuration file may be written in, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
    Yaml,
}

impl ConfigFormat {
    /// Detect the format from the file extension
    pub fn from_path(path: &Path) -> RecallResult<Self> {
        match path.extension().and_then(|s| s.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            other => Err(RecallError::config_with_context(
                format!(
                    "Unsupported config file extension {:?}; use .toml, .json, .yaml or .yml",
                    other.unwrap_or("")
                ),
                format!("Loading configuration from '{}'", path.display()),
            )),
        }
    }

    fn parse(self, content: &str) -> Result<Config, String> {
        match self {
            Self::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            Self::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            Self::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        }
    }
}

/// Load configuration from a file.
///
/// A missing file yields the defaults. A relative disk cache directory is
/// taken relative to the file, so `recall.toml` can sit next to its cache.
pub fn load_from_file(path: &Path) -> RecallResult<Config> {
    if !path.exists() {
        tracing::debug!("Config file {} not found, using defaults", path.display());
        return Ok(Config::default());
    }

    let format = ConfigFormat::from_path(path)?;
    let content = fs::read_to_string(path).map_err(|e| {
        RecallError::config_with_context(
            format!("Failed to read config file: {}", e),
            format!("Reading configuration from '{}'", path.display()),
        )
    })?;

    let mut config = format.parse(&content).map_err(|e| {
        RecallError::config_with_context(
            format!("Failed to parse {:?} config: {}", format, e),
            format!("Deserializing configuration from '{}'", path.display()),
        )
    })?;

    if let StoreBackend::Disk { directory } = &mut config.cache.backend {
        if directory.is_relative() {
            if let Some(base) = path.parent() {
                *directory = base.join(&*directory);
            }
        }
    }

    Ok(config)
}
