//! Embedding provider trait.
//!
//! Implementations:
//! - `OnnxEmbedder`: ONNX Runtime with all-MiniLM-L6-v2 (requires `onnx` feature)
//! - `OpenAiEmbedder`: hosted OpenAI-compatible `/embeddings` endpoint

use ndarray::Array1;
use trendsage_core::Result;

/// Maps text to a fixed-length vector.
///
/// No caching and no retry: failures surface as `Error::Embedding` and the
/// caller decides what to do with them.
pub trait EmbedderBackend: Send + Sync {
    /// Generate an embedding for a text string.
    fn embed(&self, text: &str) -> Result<Array1<f32>>;

    /// Embedding dimension.
    fn dimension(&self) -> usize;

    /// Short identifier for logs.
    fn name(&self) -> &str;
}
