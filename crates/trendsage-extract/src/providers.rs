//! Blocking chat-completion calls to external LLM providers.
//!
//! OpenAI and Groq share the chat-completions format. Anthropic uses the
//! Messages API with the system prompt hoisted out of the conversation.

use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::{json, Value};
use tracing::debug;

use trendsage_core::{Error, Result};

use crate::types::{ChatMessage, LLMProvider};

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const GROQ_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";

/// Build the shared HTTP client for provider calls.
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Http(format!("failed to build HTTP client: {}", e)))
}

/// Send `messages` and return the full completion text.
pub fn complete(
    client: &Client,
    provider: LLMProvider,
    messages: &[ChatMessage],
    model: &str,
    api_key: &str,
    temperature: f64,
    max_tokens: usize,
) -> Result<String> {
    match provider {
        LLMProvider::OpenAI | LLMProvider::Groq => {
            let url = if provider == LLMProvider::Groq { GROQ_URL } else { OPENAI_URL };
            let body = openai_body(messages, model, temperature, max_tokens);
            complete_openai_compat(client, url, &body, model, api_key)
        }
        LLMProvider::Anthropic => {
            let body = anthropic_body(messages, model, temperature, max_tokens);
            complete_anthropic(client, &body, model, api_key)
        }
    }
}

fn openai_body(
    messages: &[ChatMessage],
    model: &str,
    temperature: f64,
    max_tokens: usize,
) -> Value {
    let msgs: Vec<Value> = messages
        .iter()
        .map(|m| json!({"role": m.role, "content": m.content}))
        .collect();
    json!({
        "model": model,
        "messages": msgs,
        "temperature": temperature,
        "max_tokens": max_tokens,
    })
}

/// Messages API body: the system message moves to the top-level `system` field.
fn anthropic_body(
    messages: &[ChatMessage],
    model: &str,
    temperature: f64,
    max_tokens: usize,
) -> Value {
    let system_msg: Option<&str> = messages
        .iter()
        .find(|m| m.role == "system")
        .map(|m| m.content.as_str());
    let conv_msgs: Vec<Value> = messages
        .iter()
        .filter(|m| m.role != "system")
        .map(|m| json!({"role": m.role, "content": m.content}))
        .collect();

    let mut body = json!({
        "model": model,
        "messages": conv_msgs,
        "temperature": temperature,
        "max_tokens": max_tokens,
    });
    if let Some(sys) = system_msg {
        body["system"] = json!(sys);
    }
    body
}

fn complete_openai_compat(
    client: &Client,
    url: &str,
    body: &Value,
    model: &str,
    api_key: &str,
) -> Result<String> {
    debug!("Requesting completion from {} with model {}", url, model);

    let response = client
        .post(url)
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .json(body)
        .send()
        .map_err(|e| Error::Http(format!("Request failed: {}", e)))?;

    let parsed = read_json(response)?;
    openai_content(&parsed)
}

fn complete_anthropic(client: &Client, body: &Value, model: &str, api_key: &str) -> Result<String> {
    debug!("Requesting completion from Anthropic with model {}", model);

    let response = client
        .post(ANTHROPIC_URL)
        .header("x-api-key", api_key)
        .header("anthropic-version", "2023-06-01")
        .header("Content-Type", "application/json")
        .json(body)
        .send()
        .map_err(|e| Error::Http(format!("Request failed: {}", e)))?;

    let parsed = read_json(response)?;
    anthropic_content(&parsed)
}

fn read_json(response: reqwest::blocking::Response) -> Result<Value> {
    let status = response.status();
    let body = response
        .text()
        .map_err(|e| Error::Http(format!("Failed to read response: {}", e)))?;
    if !status.is_success() {
        return Err(Error::Http(format!("API error {}: {}", status, body)));
    }
    Ok(serde_json::from_str(&body)?)
}

fn openai_content(parsed: &Value) -> Result<String> {
    parsed["choices"][0]["message"]["content"]
        .as_str()
        .map(String::from)
        .ok_or_else(|| Error::Extraction("completion response has no message content".into()))
}

fn anthropic_content(parsed: &Value) -> Result<String> {
    let blocks = parsed["content"]
        .as_array()
        .ok_or_else(|| Error::Extraction("Anthropic response has no content blocks".into()))?;
    let text: String = blocks
        .iter()
        .filter(|b| b["type"].as_str() == Some("text"))
        .filter_map(|b| b["text"].as_str())
        .collect();
    Ok(text)
}
