//! Configuration loading from multiple sources

use super::env_loader::apply_env;
use super::file_loader::load_from_file;
use super::model::Config;
use crate::error::RecallResult;
use std::path::{Path, PathBuf};

/// Source of configuration data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// A JSON, TOML or YAML file; replaces everything loaded before it
    File(PathBuf),
    /// `RECALL_*` variables; override individual settings
    Environment,
    /// Built-in defaults
    Default,
}

/// Configuration loader with support for multiple sources
///
/// Sources are applied in the order they were added, so later sources win.
/// The result is validated before it is returned.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    sources: Vec<ConfigSource>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a configuration source
    pub fn add_source(mut self, source: ConfigSource) -> Self {
        self.sources.push(source);
        self
    }

    pub fn with_file<P: AsRef<Path>>(self, path: P) -> Self {
        self.add_source(ConfigSource::File(path.as_ref().to_path_buf()))
    }

    pub fn with_env(self) -> Self {
        self.add_source(ConfigSource::Environment)
    }

    pub fn with_defaults(self) -> Self {
        self.add_source(ConfigSource::Default)
    }

    /// Load configuration from all sources
    pub fn load(self) -> RecallResult<Config> {
        let mut config = Config::default();

        for source in &self.sources {
            match source {
                ConfigSource::File(path) => {
                    tracing::debug!("Loading config from file: {}", path.display());
                    config = load_from_file(path)?;
                }
                ConfigSource::Environment => {
                    tracing::debug!("Applying config from environment");
                    apply_env(&mut config)?;
                }
                ConfigSource::Default => {
                    tracing::debug!("Loading default config");
                    config = Config::default();
                }
            }
        }

        config.validate()?;
        Ok(config)
    }
}

/// Load configuration the way the CLI does: defaults, then the file, then
/// the environment
pub fn load_config(path: Option<&Path>) -> RecallResult<Config> {
    let mut loader = ConfigLoader::new().with_defaults();
    if let Some(path) = path {
        loader = loader.with_file(path);
    }
    loader.with_env().load()
}
