// src/llm/summarizer.rs

//! Hosted summarization adapter (BART-style model behind the HF inference
//! API). Input is validated before any network call; a cold model (503) is
//! retried exactly once after a short delay, never in a loop.

use crate::config::CONFIG;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

const MIN_WORDS: usize = 10;
const MAX_WORDS: usize = 1000;
const MODEL_LOADING_RETRY_DELAY: Duration = Duration::from_secs(20);

const SUMMARY_MAX_LENGTH: u32 = 130;
const SUMMARY_MIN_LENGTH: u32 = 30;

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("text too short for a meaningful summary (minimum {MIN_WORDS} words)")]
    InputTooShort,

    #[error("text too long for summarization (maximum {MAX_WORDS} words)")]
    InputTooLong,

    #[error("summarization model is still loading")]
    ModelLoading,

    #[error("summarizer unavailable: {0}")]
    Unavailable(String),
}

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static SPECIAL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s.,!?;:'\-]").expect("valid regex"));

/// Strip markup and collapse whitespace before validation.
pub fn clean_text(text: &str) -> String {
    let text = HTML_TAG.replace_all(text, "");
    let text = SPECIAL_CHARS.replace_all(&text, "");
    let text = WHITESPACE.replace_all(&text, " ");
    text.trim().to_string()
}

fn validate(text: &str) -> Result<(), SummaryError> {
    let word_count = text.split_whitespace().count();
    if word_count < MIN_WORDS {
        return Err(SummaryError::InputTooShort);
    }
    if word_count > MAX_WORDS {
        return Err(SummaryError::InputTooLong);
    }
    Ok(())
}

pub struct Summarizer {
    client: reqwest::Client,
    api_key: String,
    model_url: String,
}

impl Summarizer {
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("HUGGINGFACE_API_KEY").ok()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(CONFIG.http_timeout))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Some(Self {
            client,
            api_key,
            model_url: CONFIG.hf_model_url(&CONFIG.summarizer_model),
        })
    }

    /// Summarize `text` (recommended 10-1000 words). Retries once if the
    /// hosted model is cold.
    pub async fn summarize(&self, text: &str) -> Result<String, SummaryError> {
        let cleaned = clean_text(text);
        validate(&cleaned)?;

        match self.request(&cleaned).await {
            Err(SummaryError::ModelLoading) => {
                debug!("summarization model loading, retrying once");
                tokio::time::sleep(MODEL_LOADING_RETRY_DELAY).await;
                self.request(&cleaned).await
            }
            other => other,
        }
    }

    async fn request(&self, text: &str) -> Result<String, SummaryError> {
        let body = serde_json::json!({
            "inputs": text,
            "parameters": {
                "max_length": SUMMARY_MAX_LENGTH,
                "min_length": SUMMARY_MIN_LENGTH,
                "do_sample": false,
            }
        });

        let resp = self
            .client
            .post(&self.model_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| SummaryError::Unavailable(format!("network error: {}", e)))?;

        match resp.status().as_u16() {
            200 => {}
            503 => return Err(SummaryError::ModelLoading),
            401 => {
                warn!("summarizer rejected: invalid credential");
                return Err(SummaryError::Unavailable("auth error".into()));
            }
            code => {
                let body = resp.text().await.unwrap_or_default();
                return Err(SummaryError::Unavailable(format!(
                    "{}: {}",
                    code,
                    body.chars().take(100).collect::<String>()
                )));
            }
        }

        let resp_json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| SummaryError::Unavailable(format!("bad response: {}", e)))?;

        resp_json[0]["summary_text"]
            .as_str()
            .map(|s| s.to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SummaryError::Unavailable("no summary in response".into()))
    }
}
