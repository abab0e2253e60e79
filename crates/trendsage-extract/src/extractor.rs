//! Topic extractor: reviews in, `{reviewId, topic}` pairs out.

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, error};

use trendsage_core::config::MIN_REVIEW_CHARS;
use trendsage_core::{Error, RawExtraction, Result, Review};

use crate::config::LLMConfig;
use crate::parse::parse_extractions;
use crate::prompt::{build_messages, format_reviews};
use crate::providers::{build_client, complete};
use crate::types::{LLMProvider, ResolvedProvider};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// What one extraction call produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    /// The model answered; the list may be empty.
    Extracted(Vec<RawExtraction>),
    /// Nothing in the batch was long enough to send; no call was made.
    Skipped,
    /// The call or its parsing failed. Counts as zero topics.
    Failed(String),
}

impl ExtractionOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Extractions to count, empty for `Skipped` and `Failed`.
    pub fn into_extractions(self) -> Vec<RawExtraction> {
        match self {
            Self::Extracted(items) => items,
            Self::Skipped | Self::Failed(_) => Vec::new(),
        }
    }
}

/// Turns a batch of reviews into raw topic candidates.
pub trait TopicExtractor {
    fn extract(&self, batch: &[Review]) -> ExtractionOutcome;
}

/// Extractor backed by a hosted chat-completion model.
pub struct LlmExtractor {
    client: Client,
    provider: LLMProvider,
    model: String,
    api_key: String,
    temperature: f64,
    max_tokens: usize,
    min_review_chars: usize,
}

impl LlmExtractor {
    pub fn new(resolved: ResolvedProvider, temperature: f64, max_tokens: usize) -> Result<Self> {
        Ok(Self {
            client: build_client(REQUEST_TIMEOUT)?,
            provider: resolved.provider,
            model: resolved.model,
            api_key: resolved.api_key,
            temperature,
            max_tokens,
            min_review_chars: MIN_REVIEW_CHARS,
        })
    }

    /// Build from configuration; fails if no provider credential resolves.
    pub fn from_config(config: &LLMConfig) -> Result<Self> {
        let resolved = config.resolve_provider().ok_or_else(|| {
            Error::Config(
                "No LLM API key configured. Set GROQ_API_KEY (or OPENAI_API_KEY / ANTHROPIC_API_KEY)."
                    .into(),
            )
        })?;
        Self::new(resolved, config.temperature, config.max_tokens)
    }

    pub fn with_min_review_chars(mut self, min_chars: usize) -> Self {
        self.min_review_chars = min_chars;
        self
    }

    pub fn provider(&self) -> LLMProvider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn call(&self, reviews_text: &str) -> Result<String> {
        complete(
            &self.client,
            self.provider,
            &build_messages(reviews_text),
            &self.model,
            &self.api_key,
            self.temperature,
            self.max_tokens,
        )
    }

    /// Parse a completion, or report the call error, as an outcome.
    fn parse_or_fail(&self, completion: Result<String>) -> ExtractionOutcome {
        match completion.and_then(|text| parse_extractions(&text)) {
            Ok(items) => ExtractionOutcome::Extracted(items),
            Err(e) => {
                error!("LLM extraction failed ({} / {}): {}", self.provider, self.model, e);
                ExtractionOutcome::Failed(e.to_string())
            }
        }
    }
}

impl TopicExtractor for LlmExtractor {
    fn extract(&self, batch: &[Review]) -> ExtractionOutcome {
        let Some(reviews_text) = format_reviews(batch, self.min_review_chars) else {
            debug!(
                "No reviews of at least {} chars in batch; skipping call",
                self.min_review_chars
            );
            return ExtractionOutcome::Skipped;
        };

        self.parse_or_fail(self.call(&reviews_text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_extractor() -> LlmExtractor {
        LlmExtractor::new(
            ResolvedProvider {
                provider: LLMProvider::Groq,
                model: "llama-3.3-70b-versatile".into(),
                api_key: "test-key".into(),
            },
            0.0,
            256,
        )
        .unwrap()
    }

    #[test]
    fn test_outcome_into_extractions() {
        let items = vec![RawExtraction::new("r1", "slow delivery")];
        assert_eq!(ExtractionOutcome::Extracted(items.clone()).into_extractions(), items);
        assert!(ExtractionOutcome::Skipped.into_extractions().is_empty());
        assert!(ExtractionOutcome::Failed("boom".into()).into_extractions().is_empty());
        assert!(ExtractionOutcome::Failed("boom".into()).is_failed());
    }

    #[test]
    fn test_short_batch_skips_call() {
        let extractor = offline_extractor();
        let batch = vec![Review::new("r1", "ok"), Review::new("r2", "")];
        assert_eq!(extractor.extract(&batch), ExtractionOutcome::Skipped);
    }

    #[test]
    fn test_unparseable_completion_fails_chunk() {
        let extractor = offline_extractor();
        let outcome = extractor.parse_or_fail(Ok("Sorry, I can't help with that.".into()));
        assert!(outcome.is_failed());
        assert!(outcome.into_extractions().is_empty());
    }

    #[test]
    fn test_call_error_fails_chunk() {
        let extractor = offline_extractor();
        let outcome = extractor.parse_or_fail(Err(Error::Http("API error 503".into())));
        assert_eq!(outcome, ExtractionOutcome::Failed("HTTP error: API error 503".into()));
    }

    #[test]
    fn test_parsed_completion_is_extracted() {
        let extractor = offline_extractor();
        let completion = r#"```json
[{"reviewId": "r1", "topic": "slow delivery"}]
```"#;
        assert_eq!(
            extractor.parse_or_fail(Ok(completion.into())),
            ExtractionOutcome::Extracted(vec![RawExtraction::new("r1", "slow delivery")])
        );
    }

    #[test]
    fn test_from_config_requires_key() {
        let config = LLMConfig::default();
        assert!(matches!(LlmExtractor::from_config(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_from_config_uses_resolved_provider() {
        let config = LLMConfig {
            anthropic_api_key: Some("a".into()),
            ..Default::default()
        };
        let extractor = LlmExtractor::from_config(&config).unwrap();
        assert_eq!(extractor.provider(), LLMProvider::Anthropic);
    }
}
