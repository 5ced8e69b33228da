//! Configuration commands

use recall_core::config::{Config, ConfigLoader};
use std::path::Path;

/// Print the effective configuration (API key masked)
pub fn show(config: &Config, config_file: &Path) -> anyhow::Result<()> {
    if config_file.exists() {
        println!("# Loaded from {}", config_file.display());
    } else {
        println!(
            "# {} not found; defaults and environment only",
            config_file.display()
        );
    }
    println!("{}", serde_json::to_string_pretty(config)?);
    match config.generation.masked_api_key() {
        Some(key) => println!("# API key: {}", key),
        None => println!("# API key: not set"),
    }
    Ok(())
}

/// Check that the configuration file loads and validates
pub fn validate(config_file: &Path) -> anyhow::Result<()> {
    if !config_file.exists() {
        anyhow::bail!("Configuration file not found: {}", config_file.display());
    }
    ConfigLoader::new().with_file(config_file).load()?;
    println!("{} is valid", config_file.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_validate() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.toml");
        fs::write(&good, "[cache]\nttl = \"2days\"\n").unwrap();
        assert!(validate(&good).is_ok());

        let bad = dir.path().join("bad.toml");
        fs::write(&bad, "[chat]\nmax_prompt_chars = 0\n").unwrap();
        assert!(validate(&bad).is_err());

        assert!(validate(&dir.path().join("missing.toml")).is_err());
    }
}
