// src/emotion/mod.rs

//! Emotion analysis: the snapshot data model, the classifier port, and the
//! stress-trend window.

pub mod classifier;
pub mod labels;
pub mod trend;

pub use classifier::{EmotionClassifier, HfEmotionClassifier, analyze};
pub use labels::EMOTION_LABELS;
pub use trend::{TrendClass, TrendWindow};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// One classified message. Immutable once created.
///
/// Probabilities are independent sigmoid outputs (multi-label); they do not
/// sum to 1. Every snapshot carries all 28 known labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionSnapshot {
    pub timestamp: DateTime<Utc>,
    pub label_probabilities: HashMap<String, f32>,
    /// Labels at or above the confidence threshold, highest probability
    /// first. Derived from `label_probabilities` - recompute after any
    /// threshold change, never store independently.
    pub dominant_labels: Vec<String>,
    /// Id of the message this snapshot was computed from (no ownership).
    pub source_message: Uuid,
}

impl EmotionSnapshot {
    pub fn new(
        label_probabilities: HashMap<String, f32>,
        threshold: f32,
        source_message: Uuid,
    ) -> Self {
        let dominant_labels = dominant_labels(&label_probabilities, threshold);
        Self {
            timestamp: Utc::now(),
            label_probabilities,
            dominant_labels,
            source_message,
        }
    }

    /// Probability for a label, 0.0 if unknown.
    pub fn probability(&self, label: &str) -> f32 {
        self.label_probabilities.get(label).copied().unwrap_or(0.0)
    }

    /// The single highest-probability label, if any passed the threshold.
    pub fn top_label(&self) -> Option<&str> {
        self.dominant_labels.first().map(String::as_str)
    }
}

/// Filter and rank labels by probability. Ties break on canonical label
/// order so the result is stable across calls.
pub fn dominant_labels(probabilities: &HashMap<String, f32>, threshold: f32) -> Vec<String> {
    let mut ranked: Vec<(&str, f32)> = probabilities
        .iter()
        .filter(|(_, p)| **p >= threshold)
        .map(|(l, p)| (l.as_str(), *p))
        .collect();

    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                let ia = labels::canonical_index(a.0).unwrap_or(usize::MAX);
                let ib = labels::canonical_index(b.0).unwrap_or(usize::MAX);
                ia.cmp(&ib)
            })
    });

    ranked.into_iter().map(|(l, _)| l.to_string()).collect()
}
