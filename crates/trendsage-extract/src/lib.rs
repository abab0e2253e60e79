//! Topic extraction with external LLMs (Groq/OpenAI/Anthropic).
//!
//! Reviews go out in one prompt per chunk; the model answers with a JSON
//! list of `{reviewId, topic}` objects. Calls are blocking and best-effort:
//! a failed call degrades to an empty result instead of an error.

pub mod config;
pub mod extractor;
pub mod parse;
pub mod prompt;
pub mod providers;
pub mod types;

pub use config::LLMConfig;
pub use extractor::{ExtractionOutcome, LlmExtractor, TopicExtractor};
pub use types::*;
