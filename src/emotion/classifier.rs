// src/emotion/classifier.rs
// Emotion classifier port + hosted-inference adapter.

use crate::config::CONFIG;
use crate::emotion::labels::EMOTION_LABELS;
use crate::emotion::{EmotionSnapshot, dominant_labels};
use crate::error::SolaceError;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// External multi-label classifier: text in, one sigmoid probability per
/// known label out. Implementations must return an entry for every label
/// they score; missing labels are zero-filled by the adapter.
#[async_trait]
pub trait EmotionClassifier: Send + Sync {
    async fn label_probabilities(&self, text: &str) -> Result<HashMap<String, f32>, SolaceError>;
}

/// Run the classifier and build an immutable snapshot. The caller decides
/// what to do on `ClassifierUnavailable` - the conversation never blocks on
/// a classifier failure.
pub async fn analyze(
    classifier: &dyn EmotionClassifier,
    text: &str,
    threshold: f32,
    source_message: Uuid,
) -> Result<EmotionSnapshot, SolaceError> {
    let mut probabilities = classifier.label_probabilities(text).await?;

    // Invariant: one entry per known label, even if the model omitted some.
    for label in EMOTION_LABELS {
        probabilities.entry(label.to_string()).or_insert(0.0);
    }

    let snapshot = EmotionSnapshot::new(probabilities, threshold, source_message);
    debug!(
        dominant = ?snapshot.dominant_labels,
        "emotion analysis complete"
    );
    Ok(snapshot)
}

#[derive(Debug, Deserialize)]
struct ScoredLabel {
    label: String,
    score: f32,
}

/// Classifier adapter for the Hugging Face inference API.
pub struct HfEmotionClassifier {
    client: reqwest::Client,
    api_key: String,
    model_url: String,
}

impl HfEmotionClassifier {
    /// Returns `None` when no credential is configured, so callers get a
    /// clean "skip emotion analysis" path instead of a raw auth error.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("HUGGINGFACE_API_KEY").ok()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(CONFIG.http_timeout))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Some(Self {
            client,
            api_key,
            model_url: CONFIG.hf_model_url(&CONFIG.classifier_model),
        })
    }
}

#[async_trait]
impl EmotionClassifier for HfEmotionClassifier {
    async fn label_probabilities(&self, text: &str) -> Result<HashMap<String, f32>, SolaceError> {
        let resp = self
            .client
            .post(&self.model_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&serde_json::json!({ "inputs": text }))
            .send()
            .await
            .map_err(|e| SolaceError::ClassifierUnavailable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(%status, "classifier request failed");
            return Err(SolaceError::ClassifierUnavailable(format!(
                "{}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        // The API wraps multi-label output in a per-input list:
        // [[{"label": "...", "score": ...}, ...]]
        let scored: Vec<Vec<ScoredLabel>> = resp
            .json()
            .await
            .map_err(|e| SolaceError::ClassifierUnavailable(format!("bad response: {}", e)))?;

        let first = scored
            .into_iter()
            .next()
            .ok_or_else(|| SolaceError::ClassifierUnavailable("empty response".into()))?;

        Ok(first
            .into_iter()
            .map(|s| (s.label, s.score.clamp(0.0, 1.0)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClassifier(HashMap<String, f32>);

    #[async_trait]
    impl EmotionClassifier for FixedClassifier {
        async fn label_probabilities(
            &self,
            _text: &str,
        ) -> Result<HashMap<String, f32>, SolaceError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_analyze_zero_fills_missing_labels() {
        let classifier = FixedClassifier(
            [("joy".to_string(), 0.8), ("sadness".to_string(), 0.4)]
                .into_iter()
                .collect(),
        );
        let snap = analyze(&classifier, "great day", 0.3, Uuid::new_v4())
            .await
            .unwrap();

        assert_eq!(snap.label_probabilities.len(), 28);
        assert_eq!(snap.probability("grief"), 0.0);
        assert_eq!(snap.dominant_labels, vec!["joy", "sadness"]);
    }

    #[tokio::test]
    async fn test_analyze_propagates_unavailable() {
        struct DownClassifier;

        #[async_trait]
        impl EmotionClassifier for DownClassifier {
            async fn label_probabilities(
                &self,
                _text: &str,
            ) -> Result<HashMap<String, f32>, SolaceError> {
                Err(SolaceError::ClassifierUnavailable("connection refused".into()))
            }
        }

        let err = analyze(&DownClassifier, "hi", 0.3, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, SolaceError::ClassifierUnavailable(_)));
    }

    #[test]
    fn test_dominant_labels_use_canonical_tie_break() {
        let probs: HashMap<String, f32> = [("fear".to_string(), 0.5), ("anger".to_string(), 0.5)]
            .into_iter()
            .collect();
        assert_eq!(dominant_labels(&probs, 0.3), vec!["anger", "fear"]);
    }
}
