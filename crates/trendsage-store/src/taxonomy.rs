//! Taxonomy store: durable registry of topics with similarity resolution.
//!
//! The taxonomy is a JSON object keyed by canonical topic name:
//!
//! ```json
//! { "login crash": { "examples": ["login crash"], "embedding": [0.1, ...], "created_at": "2025-12-24T10:00:00.000000" } }
//! ```
//!
//! Topics keep insertion order in memory and on disk, so resolution ties
//! always go to the oldest topic. The store has a single owner: the batch
//! processor borrows it mutably for the duration of one run.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ndarray::Array1;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use tracing::{debug, info};

use trendsage_core::config::SIMILARITY_THRESHOLD;
use trendsage_core::files::backup_path;
use trendsage_core::{Error, Result};
use trendsage_infer::{best_match, EmbedderBackend};

use crate::types::{Resolution, Topic, TopicRecord};

/// In-memory taxonomy backed by a JSON file with a one-generation backup.
pub struct TaxonomyStore {
    path: PathBuf,
    topics: Vec<Topic>,
    index: HashMap<String, usize>,
    embedder: Arc<dyn EmbedderBackend>,
    threshold: f32,
}

impl TaxonomyStore {
    /// Create an empty store bound to `path` without reading it.
    pub fn new(path: impl AsRef<Path>, embedder: Arc<dyn EmbedderBackend>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            topics: Vec::new(),
            index: HashMap::new(),
            embedder,
            threshold: SIMILARITY_THRESHOLD,
        }
    }

    /// Create a store and load whatever is persisted at `path`.
    pub fn open(path: impl AsRef<Path>, embedder: Arc<dyn EmbedderBackend>) -> Result<Self> {
        let mut store = Self::new(path, embedder);
        store.load()?;
        Ok(store)
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> PathBuf {
        backup_path(&self.path)
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    // ---------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------

    /// Replace the in-memory taxonomy with the persisted one.
    ///
    /// A missing file is a cold start and yields an empty taxonomy. An
    /// unreadable or malformed file is an error.
    pub fn load(&mut self) -> Result<()> {
        self.topics.clear();
        self.index.clear();

        if !self.path.exists() {
            info!(
                "No existing taxonomy at {}. Starting fresh.",
                self.path.display()
            );
            return Ok(());
        }

        for topic in read_topics(&self.path)? {
            self.insert(topic);
        }

        info!("Loaded {} topics from {}", self.topics.len(), self.path.display());
        Ok(())
    }

    /// Write the full taxonomy, first copying the previous file to `<path>.bak`.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        if self.path.exists() {
            std::fs::copy(&self.path, self.backup_path())?;
        }

        let json = serde_json::to_string_pretty(&SerializeTopics(&self.topics))?;
        std::fs::write(&self.path, json)?;
        info!("Saved {} topics to {}", self.topics.len(), self.path.display());
        Ok(())
    }

    // ---------------------------------------------------------------
    // Resolution
    // ---------------------------------------------------------------

    /// Embed `text` with the configured provider.
    pub fn embed(&self, text: &str) -> Result<Array1<f32>> {
        self.embedder.embed(text)
    }

    /// Map a raw phrase to an existing canonical name, or return it unchanged.
    pub fn resolve(&self, raw_topic: &str) -> Result<String> {
        Ok(self.resolve_scored(raw_topic)?.name)
    }

    /// Like [`resolve`](Self::resolve), also reporting the best score.
    pub fn resolve_scored(&self, raw_topic: &str) -> Result<Resolution> {
        if self.topics.is_empty() {
            return Ok(Resolution {
                name: raw_topic.to_string(),
                best_score: None,
                matched: false,
            });
        }

        let query = self.embed(raw_topic)?;
        let best = best_match(&query, self.topics.iter().map(|t| &t.embedding))
            .map_err(|e| self.dimension_error(e))?;

        let Some(best) = best else {
            return Ok(Resolution {
                name: raw_topic.to_string(),
                best_score: None,
                matched: false,
            });
        };

        let candidate = &self.topics[best.index];
        debug!(
            "'{}' vs '{}' score: {:.3}",
            raw_topic, candidate.name, best.score
        );

        if best.score >= self.threshold {
            Ok(Resolution {
                name: candidate.name.clone(),
                best_score: Some(best.score),
                matched: true,
            })
        } else {
            Ok(Resolution {
                name: raw_topic.to_string(),
                best_score: Some(best.score),
                matched: false,
            })
        }
    }

    // ---------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------

    /// Create a topic named `name` with itself as the only example.
    ///
    /// Returns `false` (and does not call the embedder) if it already exists.
    pub fn add_topic(&mut self, name: &str) -> Result<bool> {
        if self.contains(name) {
            return Ok(false);
        }
        let embedding = self.embed(name)?;
        if let Some(first) = self.topics.first() {
            if first.embedding.len() != embedding.len() {
                return Err(self.dimension_error(format!(
                    "'{}' embeds to {} values, stored topics have {}",
                    name,
                    embedding.len(),
                    first.embedding.len()
                )));
            }
        }
        self.insert(Topic {
            name: name.to_string(),
            embedding,
            examples: vec![name.to_string()],
            created_at: now_iso(),
        });
        Ok(true)
    }

    /// Append a raw phrase to an existing topic's examples.
    ///
    /// Returns `true` if the phrase was appended. Phrases already listed and
    /// unknown topics are ignored. The topic's embedding never changes.
    pub fn record_example(&mut self, canonical: &str, raw_topic: &str) -> bool {
        let Some(&idx) = self.index.get(canonical) else {
            return false;
        };
        let topic = &mut self.topics[idx];
        if topic.examples.iter().any(|e| e == raw_topic) {
            return false;
        }
        topic.examples.push(raw_topic.to_string());
        true
    }

    /// Vectors from another model cannot be compared with the stored ones.
    fn dimension_error(&self, cause: impl fmt::Display) -> Error {
        Error::Taxonomy(format!(
            "{} was built with a different embedder than {} ({}): {}",
            self.path.display(),
            self.embedder.name(),
            self.embedder.dimension(),
            cause
        ))
    }

    fn insert(&mut self, topic: Topic) {
        match self.index.get(&topic.name) {
            Some(&idx) => self.topics[idx] = topic,
            None => {
                self.index.insert(topic.name.clone(), self.topics.len());
                self.topics.push(topic);
            }
        }
    }

    // ---------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Topic> {
        self.index.get(name).map(|&idx| &self.topics[idx])
    }

    /// Topics in insertion order.
    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }
}

/// Read a persisted taxonomy without binding an embedder, in file order.
///
/// All embeddings must share one dimension.
pub fn read_topics(path: &Path) -> Result<Vec<Topic>> {
    let raw = std::fs::read_to_string(path)?;
    let OrderedTopics(entries) = serde_json::from_str(&raw).map_err(|e| {
        Error::Taxonomy(format!("Corrupt taxonomy file {}: {}", path.display(), e))
    })?;

    let topics: Vec<Topic> = entries
        .into_iter()
        .map(|(name, record)| Topic::from_record(name, record))
        .collect();
    if let Some(first) = topics.first() {
        let dim = first.embedding.len();
        if let Some(odd) = topics.iter().find(|t| t.embedding.len() != dim) {
            return Err(Error::Taxonomy(format!(
                "Mixed embedding dimensions in {}: '{}' has {}, '{}' has {}",
                path.display(),
                first.name,
                dim,
                odd.name,
                odd.embedding.len()
            )));
        }
    }
    Ok(topics)
}

/// Local time in the `YYYY-MM-DDTHH:MM:SS.ffffff` form.
fn now_iso() -> String {
    chrono::Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

/// Serializes topics as a JSON object in insertion order.
struct SerializeTopics<'a>(&'a [Topic]);

impl serde::Serialize for SerializeTopics<'_> {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|t| (&t.name, t.to_record())))
    }
}

/// Deserializes the taxonomy object preserving document order.
struct OrderedTopics(Vec<(String, TopicRecord)>);

impl<'de> Deserialize<'de> for OrderedTopics {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct TopicsVisitor;

        impl<'de> Visitor<'de> for TopicsVisitor {
            type Value = OrderedTopics;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of topic name to topic record")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, record)) = map.next_entry::<String, TopicRecord>()? {
                    entries.push((name, record));
                }
                Ok(OrderedTopics(entries))
            }
        }

        deserializer.deserialize_map(TopicsVisitor)
    }
}
