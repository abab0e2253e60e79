//! Records exchanged between the pipeline stages.

use serde::{Deserialize, Deserializer, Serialize};

/// One app-store review as stored in a per-date input file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(rename = "reviewId")]
    pub review_id: String,
    /// Review body. Stores occasionally emit `null` for rating-only reviews.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
    #[serde(default)]
    pub score: u8,
    /// ISO-8601 timestamp of the review.
    #[serde(default)]
    pub at: String,
}

impl Review {
    pub fn new(review_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            review_id: review_id.into(),
            content: content.into(),
            score: 0,
            at: String::new(),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A `(reviewId, topic)` pair emitted by the extractor for one review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawExtraction {
    #[serde(rename = "reviewId")]
    pub review_id: String,
    pub topic: String,
}

impl RawExtraction {
    pub fn new(review_id: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            review_id: review_id.into(),
            topic: topic.into(),
        }
    }

    /// Whether the extraction carries a usable topic phrase.
    pub fn has_topic(&self) -> bool {
        !self.topic.trim().is_empty()
    }
}
