//! Review summaries served through the summary cache

use crate::cache::SummaryCache;
use crate::error::{RecallError, RecallResult};
use crate::generation::{GenerationConfig, Generator};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, instrument};

const DEFAULT_SUMMARY_INSTRUCTIONS: &str = "Summarize the following customer reviews into a short \
paragraph highlighting key themes, both positive and negative.";

/// A customer review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub author: String,
    pub rating: u8,
    pub content: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// Where reviews come from
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReviewSource: Send + Sync {
    /// Up to `limit` reviews of a product, newest first
    async fn latest_reviews(&self, product_key: &str, limit: usize) -> RecallResult<Vec<Review>>;
}

/// Reviews held in memory, keyed by product
#[derive(Debug, Default)]
pub struct InMemoryReviewSource {
    reviews: DashMap<String, Vec<Review>>,
}

impl InMemoryReviewSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON array of reviews for one product
    pub fn from_json_file(product_key: &str, path: impl AsRef<Path>) -> RecallResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            RecallError::io_with_path(
                format!("Failed to read reviews: {}", e),
                path.display().to_string(),
            )
        })?;
        let reviews: Vec<Review> = serde_json::from_str(&content)?;

        let source = Self::new();
        for review in reviews {
            source.add_review(product_key, review);
        }
        Ok(source)
    }

    pub fn add_review(&self, product_key: &str, review: Review) {
        self.reviews
            .entry(product_key.to_string())
            .or_default()
            .push(review);
    }
}

#[async_trait]
impl ReviewSource for InMemoryReviewSource {
    async fn latest_reviews(&self, product_key: &str, limit: usize) -> RecallResult<Vec<Review>> {
        let mut reviews = self
            .reviews
            .get(product_key)
            .map(|r| r.clone())
            .unwrap_or_default();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        reviews.truncate(limit);
        Ok(reviews)
    }
}

/// Summary settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewSummaryConfig {
    /// How many of the newest reviews go into a summary
    pub review_limit: usize,
    pub instructions: String,
}

impl Default for ReviewSummaryConfig {
    fn default() -> Self {
        Self {
            review_limit: 10,
            instructions: DEFAULT_SUMMARY_INSTRUCTIONS.to_string(),
        }
    }
}

/// Summarizes a product's reviews, calling the provider only on a cache miss
pub struct ReviewSummarizer {
    cache: Arc<SummaryCache>,
    source: Arc<dyn ReviewSource>,
    generator: Arc<dyn Generator>,
    generation: GenerationConfig,
    config: ReviewSummaryConfig,
}

impl ReviewSummarizer {
    pub fn new(
        cache: Arc<SummaryCache>,
        source: Arc<dyn ReviewSource>,
        generator: Arc<dyn Generator>,
        generation: GenerationConfig,
        config: ReviewSummaryConfig,
    ) -> Self {
        Self {
            cache,
            source,
            generator,
            generation,
            config,
        }
    }

    pub fn cache(&self) -> &Arc<SummaryCache> {
        &self.cache
    }

    /// Summary of the product's newest reviews
    #[instrument(skip(self), level = "debug")]
    pub async fn summarize(&self, product_key: &str) -> RecallResult<String> {
        if let Some(summary) = self.cache.get(product_key).await? {
            return Ok(summary);
        }

        let reviews = self
            .source
            .latest_reviews(product_key, self.config.review_limit)
            .await?;
        if reviews.is_empty() {
            return Err(RecallError::invalid_input_field(
                format!("No reviews to summarize for '{}'", product_key),
                "product_key",
            ));
        }
        debug!("Summarizing {} reviews for '{}'", reviews.len(), product_key);

        let request = self
            .generation
            .request(summary_prompt(&reviews))
            .with_instructions(self.config.instructions.clone());
        let generator = Arc::clone(&self.generator);

        self.cache
            .get_or_generate(product_key, move |_key| async move {
                generator.generate(request).await.map(|r| r.text)
            })
            .await
    }
}

fn summary_prompt(reviews: &[Review]) -> String {
    reviews
        .iter()
        .map(|review| review.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
