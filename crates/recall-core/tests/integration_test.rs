//! Integration tests for Recall core
//!
//! Exercises the public API: the summary cache behind the review summarizer,
//! and the conversation registry behind the chat service.

use futures::future::join_all;
use recall_core::cache::{DEFAULT_SUMMARY_TTL, StoreBackend};
use recall_core::generation::{EchoGenerator, GenerationConfig, ProviderKind};
use recall_core::services::{
    ChatConfig, InMemoryReviewSource, Review, ReviewSummaryConfig,
};
use recall_core::{
    ChatService, ConversationRegistry, RecallError, RecallResult, ReviewSummarizer, SummaryCache,
    SummaryCacheConfig,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn review(content: &str) -> Review {
    Review {
        author: "visitor".to_string(),
        rating: 5,
        content: content.to_string(),
        created_at: chrono::Utc::now(),
    }
}

/// Concurrent callers on a cold key share one generation
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_misses_collapse() -> RecallResult<()> {
    let cache = Arc::new(SummaryCache::in_memory(DEFAULT_SUMMARY_TTL));
    let calls = Arc::new(AtomicUsize::new(0));

    let callers = (0..16).map(|_| {
        let cache = Arc::clone(&cache);
        let calls = Arc::clone(&calls);
        tokio::spawn(async move {
            cache
                .get_or_generate("product-7", move |_| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok("solid value for money".to_string())
                })
                .await
        })
    });

    for result in join_all(callers).await {
        let value = result.expect("caller task panicked")?;
        assert_eq!(value, "solid value for money");
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let stats = cache.statistics().await?;
    assert_eq!(stats.generations, 1);
    assert_eq!(stats.stored_entries, 1);
    Ok(())
}

/// A disk-backed summary survives a new cache over the same directory
#[tokio::test]
async fn test_disk_backed_summaries_persist() -> RecallResult<()> {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = SummaryCacheConfig {
        ttl: DEFAULT_SUMMARY_TTL,
        backend: StoreBackend::Disk {
            directory: dir.path().to_path_buf(),
        },
    };

    let source = Arc::new(InMemoryReviewSource::new());
    source.add_review("product-42", review("Great trail map, friendly rangers."));

    let generation = GenerationConfig {
        provider: ProviderKind::Echo,
        ..Default::default()
    };

    let first = ReviewSummarizer::new(
        Arc::new(SummaryCache::new(config.clone())?),
        source.clone(),
        generation.build_generator()?,
        generation.clone(),
        ReviewSummaryConfig::default(),
    );
    let summary = first.summarize("product-42").await?;
    assert_eq!(summary, "Great trail map, friendly rangers.");

    // New reviews do not matter until the cached summary is invalidated
    source.add_review("product-42", review("Parking was a nightmare."));
    let reopened = Arc::new(SummaryCache::new(config)?);
    let second = ReviewSummarizer::new(
        Arc::clone(&reopened),
        source.clone(),
        generation.build_generator()?,
        generation,
        ReviewSummaryConfig::default(),
    );
    assert_eq!(second.summarize("product-42").await?, summary);

    reopened.invalidate("product-42").await?;
    let refreshed = second.summarize("product-42").await?;
    assert!(refreshed.contains("Parking was a nightmare."));
    Ok(())
}

/// Chat turns thread the provider's response ids through the registry
#[tokio::test]
async fn test_chat_conversation_chaining() -> RecallResult<()> {
    let registry = Arc::new(ConversationRegistry::default());
    let chat = ChatService::new(
        Arc::new(EchoGenerator::new()),
        Arc::clone(&registry),
        GenerationConfig::default(),
        ChatConfig::default(),
    );

    assert_eq!(registry.get_continuation_token("conv-1")?, None);

    let first = chat.send_message("Hi there", "conv-1").await?;
    assert_eq!(first.message, "Hi there");
    assert_eq!(
        registry.get_continuation_token("conv-1")?.as_deref(),
        Some(first.id.as_str())
    );

    let second = chat.send_message("Any hikes?", "conv-1").await?;
    assert_eq!(second.message, format!("(after {}) Any hikes?", first.id));

    // Another conversation starts fresh
    let other = chat.send_message("Hello", "conv-2").await?;
    assert_eq!(other.message, "Hello");
    assert_eq!(
        registry.get_continuation_token("conv-1")?.as_deref(),
        Some(second.id.as_str())
    );
    Ok(())
}

#[tokio::test]
async fn test_invalid_keys_are_client_errors() {
    let cache = SummaryCache::in_memory(DEFAULT_SUMMARY_TTL);
    let error = cache
        .get_or_generate("", |_| async { Ok("never".to_string()) })
        .await
        .unwrap_err();

    assert!(matches!(error, RecallError::InvalidKey { .. }));
    assert_eq!(error.category().status_code(), 400);
}
