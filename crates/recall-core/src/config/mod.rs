//! Configuration
//!
//! Settings for every component, loadable from JSON/TOML/YAML files and
//! `RECALL_*` environment variables. Durations are written in humantime
//! notation (`"7days"`, `"30m"`).

mod env_loader;
mod file_loader;
mod loader;
mod logging;
mod model;

pub use env_loader::{apply_env, apply_env_with};
pub use file_loader::{ConfigFormat, load_from_file};
pub use loader::{ConfigLoader, ConfigSource, load_config};
pub use logging::{LogFormat, LoggingConfig};
pub use model::Config;
