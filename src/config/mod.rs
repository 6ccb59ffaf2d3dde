// src/config/mod.rs
// All tunables load from the environment (.env supported); session capacity
// constants live in src/session, not here - they are part of the data-model
// contract, not configuration.

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct SolaceConfig {
    // ── Chat model (OpenAI-compatible)
    pub openai_base_url: String,
    pub chat_model: String,

    // ── Emotion classifier + summarizer (HF inference API)
    pub hf_api_base: String,
    pub classifier_model: String,
    pub summarizer_model: String,
    pub emotion_threshold: f32,

    // ── Retrieval
    pub qdrant_url: String,
    pub qdrant_collection: String,
    pub embedding_model: String,
    pub embedding_dim: usize,
    pub enable_retrieval: bool,
    pub retrieval_k: usize,
    pub retrieval_min_score: f32,

    // ── Timeouts (seconds)
    pub http_timeout: u64,

    // ── Logging
    pub log_level: String,
}

fn env_var_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match std::env::var(key) {
        Ok(val) => {
            // Trim whitespace and strip inline comments before parsing
            let clean_val = val.split('#').next().unwrap_or("").trim();
            match clean_val.parse::<T>() {
                Ok(parsed) => parsed,
                Err(_) => {
                    eprintln!("Config: {} = '{}' (parse failed, using default)", key, val);
                    default
                }
            }
        }
        Err(_) => default,
    }
}

impl SolaceConfig {
    pub fn from_env() -> Self {
        if dotenvy::dotenv().is_err() {
            eprintln!("Warning: .env file not found. Using environment variables and defaults.");
        }

        Self {
            openai_base_url: env_var_or("OPENAI_BASE_URL", "https://api.openai.com/v1".to_string()),
            chat_model: env_var_or("SOLACE_CHAT_MODEL", "gpt-4o-mini".to_string()),
            hf_api_base: env_var_or(
                "SOLACE_HF_API_BASE",
                "https://api-inference.huggingface.co/models".to_string(),
            ),
            classifier_model: env_var_or(
                "SOLACE_CLASSIFIER_MODEL",
                "SamLowe/roberta-base-go_emotions".to_string(),
            ),
            summarizer_model: env_var_or(
                "SOLACE_SUMMARIZER_MODEL",
                "facebook/bart-large-cnn".to_string(),
            ),
            emotion_threshold: env_var_or("SOLACE_EMOTION_THRESHOLD", 0.3),
            qdrant_url: env_var_or("QDRANT_URL", "http://localhost:6333".to_string()),
            qdrant_collection: env_var_or("QDRANT_COLLECTION", "solace-research".to_string()),
            embedding_model: env_var_or(
                "SOLACE_EMBEDDING_MODEL",
                "text-embedding-3-small".to_string(),
            ),
            embedding_dim: env_var_or("SOLACE_EMBEDDING_DIM", 1536),
            enable_retrieval: env_var_or("SOLACE_ENABLE_RETRIEVAL", false),
            retrieval_k: env_var_or("SOLACE_RETRIEVAL_K", 3),
            retrieval_min_score: env_var_or("SOLACE_RETRIEVAL_MIN_SCORE", 0.25),
            http_timeout: env_var_or("SOLACE_HTTP_TIMEOUT", 30),
            log_level: env_var_or("SOLACE_LOG_LEVEL", "info".to_string()),
        }
    }

    /// Full URL for an OpenAI-compatible endpoint.
    pub fn openai_api_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.openai_base_url.trim_end_matches('/'), endpoint)
    }

    /// Full URL for a hosted-inference model.
    pub fn hf_model_url(&self, model: &str) -> String {
        format!("{}/{}", self.hf_api_base.trim_end_matches('/'), model)
    }
}

// Global config instance - loaded once at startup
pub static CONFIG: Lazy<SolaceConfig> = Lazy::new(SolaceConfig::from_env);
