//! Interactive chat command

use anyhow::Context;
use recall_core::config::Config;
use recall_core::{ChatService, ConversationRegistry, RecallError};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Run a chat loop on stdin/stdout for one conversation
pub async fn run(config: &Config, conversation_id: Option<String>) -> anyhow::Result<()> {
    let conversation_id = conversation_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let generator = config
        .generation
        .build_generator()
        .context("Failed to set up the generation provider")?;
    let registry = Arc::new(ConversationRegistry::new(config.conversations.clone())?);
    let chat = ChatService::new(
        generator,
        registry,
        config.generation.clone(),
        config.chat.clone(),
    );

    tracing::info!("Starting conversation {}", conversation_id);
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(format!("Conversation {} (type `exit` to quit)\n", conversation_id).as_bytes())
        .await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if matches!(line.trim(), "exit" | "quit") {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        match chat.send_message(&line, &conversation_id).await {
            Ok(reply) => {
                stdout
                    .write_all(format!("{}\n", reply.message).as_bytes())
                    .await?;
            }
            // Bad input or a failed turn ends only this message
            Err(e @ (RecallError::InvalidInput { .. } | RecallError::Generation { .. })) => {
                stdout.write_all(format!("error: {}\n", e).as_bytes()).await?;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
