//! Taxonomy data types.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// A named cluster of similar raw topic phrases.
#[derive(Debug, Clone)]
pub struct Topic {
    /// Canonical name, unique within the taxonomy.
    pub name: String,
    /// Embedding of the phrase that created the topic. Never recomputed.
    pub embedding: Array1<f32>,
    /// Raw phrases mapped into this topic, in insertion order.
    pub examples: Vec<String>,
    /// ISO-8601 local timestamp of creation.
    pub created_at: String,
}

/// On-disk form of a topic (the map key carries the name).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicRecord {
    pub examples: Vec<String>,
    pub embedding: Vec<f32>,
    pub created_at: String,
}

impl Topic {
    pub fn from_record(name: String, record: TopicRecord) -> Self {
        Self {
            name,
            embedding: Array1::from_vec(record.embedding),
            examples: record.examples,
            created_at: record.created_at,
        }
    }

    pub fn to_record(&self) -> TopicRecord {
        TopicRecord {
            examples: self.examples.clone(),
            embedding: self.embedding.to_vec(),
            created_at: self.created_at.clone(),
        }
    }
}

/// Result of matching a raw phrase against the taxonomy.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Canonical name if matched, otherwise the raw phrase.
    pub name: String,
    /// Best similarity seen, `None` when the taxonomy was empty.
    pub best_score: Option<f32>,
    /// Whether `name` refers to an existing topic.
    pub matched: bool,
}
