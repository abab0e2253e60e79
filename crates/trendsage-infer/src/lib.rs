//! TrendSage Infer: embedding providers and vector similarity.
//!
//! Provides the `EmbedderBackend` trait used by the taxonomy store.
//! When the `onnx` feature is enabled and model files are present,
//! `OnnxEmbedder` loads all-MiniLM-L6-v2 for 384-dim embeddings.
//! `OpenAiEmbedder` talks to a hosted OpenAI-compatible endpoint instead.

pub mod embedder;
pub mod onnx_embedder;
pub mod openai_embedder;
pub mod similarity;

pub use embedder::EmbedderBackend;
pub use openai_embedder::OpenAiEmbedder;
pub use similarity::{best_match, cosine_similarity, BestMatch};

#[cfg(feature = "onnx")]
pub use onnx_embedder::OnnxEmbedder;

use std::path::Path;
use std::sync::Arc;

use trendsage_core::{EmbedderBackendKind, EmbedderConfig, Error, Result};

/// Create the embedder selected by `config`.
///
/// Unlike a search index, the taxonomy cannot run without vectors, so a
/// missing model or credential is an error rather than a silent fallback.
pub fn create_embedder(
    config: &EmbedderConfig,
    model_dir: &Path,
) -> Result<Arc<dyn EmbedderBackend>> {
    match config.backend {
        EmbedderBackendKind::OpenAi => {
            let api_key = config.api_key.clone().ok_or_else(|| {
                Error::Config("OPENAI_API_KEY is required for the openai embedder".into())
            })?;
            let embedder = OpenAiEmbedder::new(&api_key, &config.base_url, &config.model)?;
            tracing::info!("Using hosted embedder (model={})", config.model);
            Ok(Arc::new(embedder))
        }
        EmbedderBackendKind::Onnx => create_onnx(model_dir),
    }
}

#[cfg(feature = "onnx")]
fn create_onnx(model_dir: &Path) -> Result<Arc<dyn EmbedderBackend>> {
    let embedder = OnnxEmbedder::load(model_dir)?;
    tracing::info!("Using ONNX embedder (dim={})", embedder.dimension());
    Ok(Arc::new(embedder))
}

#[cfg(not(feature = "onnx"))]
fn create_onnx(model_dir: &Path) -> Result<Arc<dyn EmbedderBackend>> {
    Err(Error::Config(format!(
        "ONNX feature disabled; cannot load model from {}. Set TRENDSAGE_EMBEDDER=openai.",
        model_dir.display()
    )))
}
