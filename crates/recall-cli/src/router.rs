//! Command routing logic for CLI

use crate::args::{Cli, Commands, ConfigAction};
use crate::commands;
use recall_core::config::Config;

/// Route CLI commands to their respective handlers
pub async fn route(cli: Cli, config: Config) -> anyhow::Result<()> {
    match cli.command {
        Commands::Chat { conversation_id } => commands::chat::run(&config, conversation_id).await,
        Commands::Summarize {
            product,
            reviews,
            cache_dir,
        } => commands::summarize::summarize(&config, &product, &reviews, cache_dir).await,
        Commands::Invalidate { product, cache_dir } => {
            commands::summarize::invalidate(&config, &product, cache_dir).await
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(&config, &cli.config_file),
            ConfigAction::Validate => commands::config::validate(&cli.config_file),
        },
    }
}
