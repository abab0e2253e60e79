//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Similarity at or above which a raw phrase joins an existing topic.
pub const SIMILARITY_THRESHOLD: f32 = 0.82;
/// Reviews per extraction call.
pub const CHUNK_SIZE: usize = 20;
/// Reviews shorter than this (in characters) are not sent to the extractor.
pub const MIN_REVIEW_CHARS: usize = 4;

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_EMBEDDING_URL: &str = "https://api.openai.com/v1";

/// Paths to all TrendSage inputs and outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Per-date review files (`data/<date>.json`).
    pub data_dir: PathBuf,
    /// Stats, reports and images (`output/`).
    pub output_dir: PathBuf,
    /// Persisted taxonomy (`taxonomy.json`, backup at `taxonomy.json.bak`).
    pub taxonomy_file: PathBuf,
    /// ONNX model + tokenizer directory.
    pub model_dir: PathBuf,
    /// LLM configuration (`data/llm-config.json`).
    pub llm_config_file: PathBuf,
}

impl DataPaths {
    pub fn new(
        data_dir: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
        taxonomy_file: impl AsRef<Path>,
        model_dir: impl AsRef<Path>,
    ) -> Self {
        let data_dir = data_dir.as_ref().to_path_buf();
        Self {
            llm_config_file: data_dir.join("llm-config.json"),
            data_dir,
            output_dir: output_dir.as_ref().to_path_buf(),
            taxonomy_file: taxonomy_file.as_ref().to_path_buf(),
            model_dir: model_dir.as_ref().to_path_buf(),
        }
    }

    /// Resolve paths from `TRENDSAGE_*` environment variables, falling back to
    /// the working-directory layout (`data/`, `output/`, `taxonomy.json`).
    pub fn from_env() -> Self {
        let var = |key: &str, default: &str| {
            std::env::var(key)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(default))
        };
        Self::new(
            var("TRENDSAGE_DATA_DIR", "data"),
            var("TRENDSAGE_OUTPUT_DIR", "output"),
            var("TRENDSAGE_TAXONOMY_FILE", "taxonomy.json"),
            var("TRENDSAGE_MODEL_DIR", "models/all-MiniLM-L6-v2"),
        )
    }
}

/// Fixed tuning knobs of the batch pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    pub chunk_size: usize,
    pub similarity_threshold: f32,
    pub min_review_chars: usize,
    /// Rows in the heatmap.
    pub heatmap_top_n: usize,
    /// Bars in the per-date chart.
    pub bar_top_n: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            similarity_threshold: SIMILARITY_THRESHOLD,
            min_review_chars: MIN_REVIEW_CHARS,
            heatmap_top_n: 30,
            bar_top_n: 20,
        }
    }
}

/// Which embedding provider backs the taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderBackendKind {
    /// Local all-MiniLM-L6-v2 via ONNX Runtime.
    Onnx,
    /// Hosted OpenAI-compatible `/embeddings` endpoint.
    OpenAi,
}

impl std::str::FromStr for EmbedderBackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "onnx" | "local" => Ok(Self::Onnx),
            "openai" | "hosted" => Ok(Self::OpenAi),
            other => Err(Error::Config(format!("Unknown embedder backend: {}", other))),
        }
    }
}

impl std::fmt::Display for EmbedderBackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Onnx => write!(f, "onnx"),
            Self::OpenAi => write!(f, "openai"),
        }
    }
}

/// Embedding provider selection and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedderConfig {
    pub backend: EmbedderBackendKind,
    pub model: String,
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            backend: EmbedderBackendKind::Onnx,
            model: DEFAULT_EMBEDDING_MODEL.into(),
            base_url: DEFAULT_EMBEDDING_URL.into(),
            api_key: None,
        }
    }
}

impl EmbedderConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env() -> Result<Self> {
        let backend = match std::env::var("TRENDSAGE_EMBEDDER") {
            Ok(v) => v.parse()?,
            Err(_) => EmbedderBackendKind::Onnx,
        };
        let defaults = Self::default();
        Ok(Self {
            backend,
            model: std::env::var("TRENDSAGE_EMBEDDING_MODEL").unwrap_or(defaults.model),
            base_url: std::env::var("TRENDSAGE_EMBEDDING_URL").unwrap_or(defaults.base_url),
            api_key: std::env::var("OPENAI_API_KEY").ok(),
        })
    }
}
