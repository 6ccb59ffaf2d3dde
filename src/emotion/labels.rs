// src/emotion/labels.rs

//! The closed 28-label emotion vocabulary the classifier is trained on.
//! Array order is the canonical ordering: it matches the model's output
//! heads and breaks probability ties when ranking dominant labels.

pub const EMOTION_LABELS: [&str; 28] = [
    "admiration",
    "amusement",
    "anger",
    "annoyance",
    "approval",
    "caring",
    "confusion",
    "curiosity",
    "desire",
    "disappointment",
    "disapproval",
    "disgust",
    "embarrassment",
    "excitement",
    "fear",
    "gratitude",
    "grief",
    "joy",
    "love",
    "nervousness",
    "optimism",
    "pride",
    "realization",
    "relief",
    "remorse",
    "sadness",
    "surprise",
    "neutral",
];

/// Position of a label in the canonical ordering, or `None` for labels the
/// model does not know.
pub fn canonical_index(label: &str) -> Option<usize> {
    EMOTION_LABELS.iter().position(|l| *l == label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_count() {
        assert_eq!(EMOTION_LABELS.len(), 28);
    }

    #[test]
    fn test_canonical_index() {
        assert_eq!(canonical_index("admiration"), Some(0));
        assert_eq!(canonical_index("neutral"), Some(27));
        assert_eq!(canonical_index("anxiety"), None);
    }
}
