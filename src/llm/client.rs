// src/llm/client.rs

//! Chat-completion port and the OpenAI-compatible client behind it.
//! No wrappers; just reqwest and Rust.

use crate::config::CONFIG;
use crate::error::SolaceError;
use crate::llm::ChatMessage;
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::warn;

// Generation parameters are fixed product constants, not user knobs.
const TEMPERATURE: f32 = 0.8;
const MAX_TOKENS: u32 = 300;
const TOP_P: f32 = 0.95;
const FREQUENCY_PENALTY: f32 = 0.3;
const PRESENCE_PENALTY: f32 = 0.2;

/// The external chat model: ordered role-tagged messages in, one assistant
/// reply out. All failure modes collapse to `LlmUnavailable` for the turn
/// controller; the distinction only matters in logs.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, SolaceError>;
}

#[derive(Clone)]
pub struct OpenAiChatClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiChatClient {
    /// Returns `None` when no credential is configured; the controller then
    /// answers every turn with the fixed not-configured fallback instead of
    /// surfacing a raw auth error.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").ok()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(CONFIG.http_timeout))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Some(Self {
            client,
            api_key,
            model: CONFIG.chat_model.clone(),
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiChatClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, SolaceError> {
        let url = CONFIG.openai_api_url("chat/completions");
        let body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
            "top_p": TOP_P,
            "frequency_penalty": FREQUENCY_PENALTY,
            "presence_penalty": PRESENCE_PENALTY,
        });

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!("chat completion network error: {}", e);
                SolaceError::LlmUnavailable(format!("network error: {}", e))
            })?;

        let status = resp.status();
        if status.as_u16() == 401 {
            warn!("chat completion rejected: invalid credential");
            return Err(SolaceError::LlmUnavailable("auth error".into()));
        }
        if status.as_u16() == 429 {
            warn!("chat completion rejected: rate limited");
            return Err(SolaceError::LlmUnavailable("rate limited".into()));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(%status, "chat completion failed");
            return Err(SolaceError::LlmUnavailable(format!(
                "{}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let resp_json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| SolaceError::LlmUnavailable(format!("bad response: {}", e)))?;

        let reply = resp_json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| SolaceError::LlmUnavailable("no completion in response".into()))?;

        Ok(reply.trim().to_string())
    }
}
