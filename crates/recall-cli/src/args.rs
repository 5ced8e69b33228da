//! CLI argument definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default configuration file name used across all CLI commands.
pub const DEFAULT_CONFIG_FILE: &str = "recall.toml";

#[derive(Parser, Debug)]
#[command(name = "recall")]
#[command(about = "Recall - cached review summaries and multi-turn chat over an LLM provider")]
#[command(
    long_about = r#"Recall - cached review summaries and multi-turn chat over an LLM provider

USAGE:
  recall chat                              # Start a new conversation
  recall chat --conversation <id>          # Continue a conversation in this session
  recall summarize <product> --reviews f   # Summarize reviews (cached on disk)
  recall invalidate <product>              # Drop a cached summary
  recall config show                       # Show the effective configuration

Set OPENAI_API_KEY (or put it in .env), or pass --offline to use the echo generator."#
)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config_file: PathBuf,

    /// Use the offline echo generator instead of the provider
    #[arg(long, global = true)]
    pub offline: bool,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Chat interactively; one line per message, `exit` to quit
    Chat {
        /// Conversation id (a new UUID if omitted)
        #[arg(long = "conversation")]
        conversation_id: Option<String>,
    },

    /// Summarize a product's reviews through the summary cache
    Summarize {
        /// Product key
        product: String,

        /// JSON file with the product's reviews
        #[arg(long)]
        reviews: PathBuf,

        /// Summary cache directory (overrides the configured backend)
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },

    /// Remove a product's cached summary
    Invalidate {
        /// Product key
        product: String,

        /// Summary cache directory (overrides the configured backend)
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Validate the configuration file
    Validate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_summarize() {
        let cli = Cli::parse_from([
            "recall",
            "summarize",
            "product-42",
            "--reviews",
            "reviews.json",
            "--offline",
        ]);
        assert!(cli.offline);
        match cli.command {
            Commands::Summarize {
                product, reviews, ..
            } => {
                assert_eq!(product, "product-42");
                assert_eq!(reviews, PathBuf::from("reviews.json"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_chat_defaults() {
        let cli = Cli::parse_from(["recall", "chat"]);
        assert_eq!(cli.config_file, PathBuf::from(DEFAULT_CONFIG_FILE));
        assert!(matches!(
            cli.command,
            Commands::Chat {
                conversation_id: None
            }
        ));
    }

    #[test]
    fn test_parse_config_show() {
        let cli = Cli::parse_from(["recall", "--config-file", "custom.yaml", "config", "show"]);
        assert_eq!(cli.config_file, PathBuf::from("custom.yaml"));
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Show
            }
        ));
    }
}
