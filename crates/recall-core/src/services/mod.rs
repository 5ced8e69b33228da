//! Application services built on the cache and the registry

mod chat;
mod reviews;

pub use chat::{ChatConfig, ChatReply, ChatService};
pub use reviews::{
    InMemoryReviewSource, Review, ReviewSource, ReviewSummarizer, ReviewSummaryConfig,
};
