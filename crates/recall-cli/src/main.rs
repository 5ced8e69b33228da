//! Recall CLI application
//!
//! Command-line front end for the Recall core library: multi-turn chat that
//! threads provider continuation tokens, and review summaries served from a
//! disk-backed summary cache.

mod args;
mod commands;
mod router;

use args::Cli;
use anyhow::Context;
use clap::Parser;
use recall_core::config::{Config, LogFormat, load_config};
use recall_core::generation::ProviderKind;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Ignore a missing .env; the environment may already be set.
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let mut config = load_config(Some(&cli.config_file))
        .with_context(|| format!("Failed to load {}", cli.config_file.display()))?;
    if cli.offline {
        config.generation.provider = ProviderKind::Echo;
    }
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }

    init_logging(&config);

    router::route(cli, config).await
}

/// Initialize logging; `RUST_LOG` takes precedence over the configured level
fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match config.logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}
