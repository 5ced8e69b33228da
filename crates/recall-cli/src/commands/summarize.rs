//! Review summary commands

use anyhow::Context;
use recall_core::cache::{StoreBackend, SummaryCacheConfig};
use recall_core::config::Config;
use recall_core::services::InMemoryReviewSource;
use recall_core::{ReviewSummarizer, SummaryCache};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Summarize `product` from the reviews in `reviews_file`
pub async fn summarize(
    config: &Config,
    product: &str,
    reviews_file: &Path,
    cache_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    let cache = Arc::new(open_cache(config, cache_dir)?);
    let source = InMemoryReviewSource::from_json_file(product, reviews_file)
        .with_context(|| format!("Failed to load reviews from {}", reviews_file.display()))?;
    let generator = config
        .generation
        .build_generator()
        .context("Failed to set up the generation provider")?;

    let summarizer = ReviewSummarizer::new(
        Arc::clone(&cache),
        Arc::new(source),
        generator,
        config.generation.clone(),
        config.reviews.clone(),
    );
    let summary = summarizer.summarize(product).await?;
    println!("{}", summary);

    let stats = cache.statistics().await?;
    tracing::debug!(
        "Summary cache: {} hits, {} misses, {} generations",
        stats.hits,
        stats.misses,
        stats.generations
    );
    Ok(())
}

/// Drop the cached summary of `product`
pub async fn invalidate(
    config: &Config,
    product: &str,
    cache_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    let cache = open_cache(config, cache_dir)?;
    cache.invalidate(product).await?;
    println!("Invalidated summary for {}", product);
    Ok(())
}

/// Open the summary cache on disk so results survive between runs
fn open_cache(config: &Config, cache_dir: Option<PathBuf>) -> anyhow::Result<SummaryCache> {
    let cache_config = SummaryCacheConfig {
        ttl: config.cache.ttl,
        backend: disk_backend(&config.cache.backend, cache_dir),
    };
    Ok(SummaryCache::new(cache_config)?)
}

fn disk_backend(configured: &StoreBackend, cache_dir: Option<PathBuf>) -> StoreBackend {
    match (cache_dir, configured) {
        (Some(directory), _) => StoreBackend::Disk { directory },
        (None, StoreBackend::Disk { .. }) => configured.clone(),
        (None, StoreBackend::Memory) => StoreBackend::default_disk(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_core::generation::ProviderKind;
    use std::fs;

    #[test]
    fn test_disk_backend_selection() {
        let dir = PathBuf::from("/tmp/recall-test");
        assert_eq!(
            disk_backend(&StoreBackend::Memory, Some(dir.clone())),
            StoreBackend::Disk {
                directory: dir.clone()
            }
        );
        let configured = StoreBackend::Disk {
            directory: dir.clone(),
        };
        assert_eq!(disk_backend(&configured, None), configured);
        assert!(matches!(
            disk_backend(&StoreBackend::Memory, None),
            StoreBackend::Disk { .. }
        ));
    }

    #[tokio::test]
    async fn test_summarize_then_invalidate_offline() {
        let dir = tempfile::tempdir().unwrap();
        let reviews = dir.path().join("reviews.json");
        fs::write(
            &reviews,
            r#"[{"author": "ana", "rating": 5, "content": "Loved the waterfalls."}]"#,
        )
        .unwrap();
        let cache_dir = dir.path().join("cache");

        let mut config = Config::default();
        config.generation.provider = ProviderKind::Echo;

        summarize(&config, "product-42", &reviews, Some(cache_dir.clone()))
            .await
            .unwrap();
        let cache = open_cache(&config, Some(cache_dir.clone())).unwrap();
        assert_eq!(
            cache.get("product-42").await.unwrap().as_deref(),
            Some("Loved the waterfalls.")
        );

        invalidate(&config, "product-42", Some(cache_dir.clone()))
            .await
            .unwrap();
        let cache = open_cache(&config, Some(cache_dir)).unwrap();
        assert!(cache.get("product-42").await.unwrap().is_none());
    }
}
