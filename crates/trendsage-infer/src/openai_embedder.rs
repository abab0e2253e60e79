//! Hosted embeddings over an OpenAI-compatible `/embeddings` endpoint.

use std::time::Duration;

use ndarray::Array1;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::debug;

use trendsage_core::{Error, Result};

use crate::embedder::EmbedderBackend;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking embeddings client. One request per text, no retry.
pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    dimension: usize,
}

impl OpenAiEmbedder {
    pub fn new(api_key: &str, base_url: &str, model: &str) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(Error::Config("missing embeddings API key".into()));
        }
        if model.trim().is_empty() {
            return Err(Error::Config("missing embeddings model name".into()));
        }
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .map_err(|e| Error::Config(format!("invalid embeddings API key: {}", e)))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Http(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint_url(base_url),
            model: model.to_string(),
            dimension: default_dimension(model),
        })
    }
}

fn endpoint_url(base_url: &str) -> String {
    format!("{}/embeddings", base_url.trim_end_matches('/'))
}

fn default_dimension(model: &str) -> usize {
    match model {
        "text-embedding-3-large" => 3072,
        "text-embedding-3-small" | "text-embedding-ada-002" => 1536,
        _ => 0,
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingEntry>,
}

#[derive(Deserialize)]
struct EmbeddingEntry {
    embedding: Vec<f32>,
}

fn parse_response(body: &str) -> Result<Array1<f32>> {
    let parsed: EmbeddingResponse = serde_json::from_str(body)
        .map_err(|e| Error::Embedding(format!("failed to parse embedding response: {}", e)))?;
    let entry = parsed
        .data
        .into_iter()
        .next()
        .ok_or_else(|| Error::Embedding("embedding response contained no vectors".into()))?;
    if entry.embedding.is_empty() {
        return Err(Error::Embedding("embedding response contained an empty vector".into()));
    }
    Ok(Array1::from_vec(entry.embedding))
}

impl EmbedderBackend for OpenAiEmbedder {
    fn embed(&self, text: &str) -> Result<Array1<f32>> {
        debug!("Embedding {:?} via {}", text, self.endpoint);
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: text,
            })
            .send()
            .map_err(|e| Error::Embedding(format!("Request failed: {}", e)))?;

        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| Error::Embedding(format!("Failed to read response: {}", e)))?;
        if !status.is_success() {
            return Err(Error::Embedding(format!("API error {}: {}", status, body)));
        }
        parse_response(&body)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url() {
        assert_eq!(
            endpoint_url("https://api.openai.com/v1/"),
            "https://api.openai.com/v1/embeddings"
        );
        assert_eq!(endpoint_url("http://localhost:8080/v1"), "http://localhost:8080/v1/embeddings");
    }

    #[test]
    fn test_parse_response() {
        let body = r#"{"object":"list","data":[{"object":"embedding","index":0,"embedding":[0.25,-0.5,1.0]}],"model":"m"}"#;
        let v = parse_response(body).unwrap();
        assert_eq!(v.to_vec(), vec![0.25, -0.5, 1.0]);
    }

    #[test]
    fn test_parse_response_empty() {
        assert!(matches!(parse_response(r#"{"data":[]}"#), Err(Error::Embedding(_))));
        assert!(matches!(parse_response("not json"), Err(Error::Embedding(_))));
    }

    #[test]
    fn test_new_rejects_blank_key() {
        assert!(OpenAiEmbedder::new("  ", "https://api.openai.com/v1", "m").is_err());
    }

    #[test]
    fn test_known_dimensions() {
        assert_eq!(default_dimension("text-embedding-3-small"), 1536);
        assert_eq!(default_dimension("custom"), 0);
    }
}
