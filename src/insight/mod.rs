// src/insight/mod.rs

//! Emotional insight reports: a rule-based read of a snapshot, optionally
//! enhanced with retrieved research context and a model-written
//! recommendation.
//!
//! The rule-based path has no external dependencies and always succeeds;
//! enhancement is strictly additive and fails soft back to it.

use crate::emotion::EmotionSnapshot;
use crate::llm::{ChatMessage, ChatModel};
use crate::retrieval::DocumentRetriever;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// How many research snippets back an enhanced recommendation.
const RESEARCH_K: usize = 3;

const POSITIVE_LABELS: &[&str] = &[
    "admiration",
    "amusement",
    "approval",
    "caring",
    "excitement",
    "gratitude",
    "joy",
    "love",
    "optimism",
    "pride",
    "relief",
];

const NEGATIVE_LABELS: &[&str] = &[
    "anger",
    "annoyance",
    "disappointment",
    "disapproval",
    "disgust",
    "embarrassment",
    "fear",
    "grief",
    "nervousness",
    "remorse",
    "sadness",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentCategory {
    Positive,
    Negative,
    Mixed,
    Neutral,
}

impl SentimentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentCategory::Positive => "positive",
            SentimentCategory::Negative => "negative",
            SentimentCategory::Mixed => "mixed",
            SentimentCategory::Neutral => "neutral",
        }
    }
}

/// Categorize a snapshot by which valence its dominant labels lean toward.
pub fn sentiment_of(snapshot: &EmotionSnapshot) -> SentimentCategory {
    let positive = snapshot
        .dominant_labels
        .iter()
        .filter(|l| POSITIVE_LABELS.contains(&l.as_str()))
        .count();
    let negative = snapshot
        .dominant_labels
        .iter()
        .filter(|l| NEGATIVE_LABELS.contains(&l.as_str()))
        .count();

    match (positive, negative) {
        (0, 0) => SentimentCategory::Neutral,
        (p, 0) if p > 0 => SentimentCategory::Positive,
        (0, n) if n > 0 => SentimentCategory::Negative,
        _ => SentimentCategory::Mixed,
    }
}

/// Concrete next steps per dominant emotion. These are the rule-based
/// recommendations shown when no model is reachable.
pub fn suggested_actions(emotion: &str) -> &'static [&'static str] {
    match emotion {
        "sadness" | "grief" | "disappointment" => &[
            "Reach out to someone you trust, even just to say hello",
            "Try writing down what's weighing on you",
            "Be gentle with yourself today; rest counts as progress",
        ],
        "nervousness" | "fear" => &[
            "Try a slow breathing exercise: in for 4, hold for 4, out for 6",
            "Name the specific worry; vague dread shrinks when it has edges",
            "Break the next step into something you can do in five minutes",
        ],
        "anger" | "annoyance" | "disgust" => &[
            "Step away from the trigger for a few minutes if you can",
            "Move your body: a brisk walk burns the edge off",
            "Write the angry version first, then decide what to actually send",
        ],
        "joy" | "excitement" | "amusement" => &[
            "Savor it: note what made this moment good",
            "Share the good news with someone who'll celebrate with you",
        ],
        "embarrassment" | "remorse" => &[
            "Reconnect with one person, however briefly",
            "Treat yourself the way you'd treat a friend in the same spot",
        ],
        "confusion" => &[
            "List what you know and what you don't; clarity starts there",
            "Talk it through out loud, even to yourself",
        ],
        _ => &[
            "Check in with yourself: what does your body need right now?",
            "A short walk or a glass of water is never a wrong move",
        ],
    }
}

/// One-paragraph explanation of why the report says what it says.
pub fn reasoning(snapshot: &EmotionSnapshot, sentiment: SentimentCategory) -> String {
    let top: Vec<String> = snapshot
        .dominant_labels
        .iter()
        .take(3)
        .map(|label| {
            format!("{} ({:.0}%)", label, snapshot.probability(label) * 100.0)
        })
        .collect();

    if top.is_empty() {
        return "No single emotion stood out above the confidence threshold, so this read \
                leans neutral."
            .to_string();
    }

    format!(
        "The strongest signals were {}. Taken together they read as {} overall, which is \
         what the suggestions below are tuned for.",
        top.join(", "),
        sentiment.as_str()
    )
}

/// A complete insight report. `enhanced` is true only when a model-written
/// recommendation (grounded in retrieved research) replaced the rule-based
/// one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightReport {
    pub sentiment: SentimentCategory,
    pub top_emotions: Vec<(String, f32)>,
    pub reasoning: String,
    pub suggested_actions: Vec<String>,
    pub recommendation: String,
    pub sources: Vec<String>,
    pub enhanced: bool,
}

pub struct InsightEngine {
    llm: Option<Arc<dyn ChatModel>>,
    retriever: Option<Arc<dyn DocumentRetriever>>,
}

impl InsightEngine {
    pub fn new(
        llm: Option<Arc<dyn ChatModel>>,
        retriever: Option<Arc<dyn DocumentRetriever>>,
    ) -> Self {
        Self { llm, retriever }
    }

    /// Build a report for one snapshot. Never fails; enhancement problems
    /// downgrade to the rule-based report.
    pub async fn generate(&self, snapshot: &EmotionSnapshot, user_context: &str) -> InsightReport {
        let sentiment = sentiment_of(snapshot);
        let top_emotions: Vec<(String, f32)> = snapshot
            .dominant_labels
            .iter()
            .take(3)
            .map(|l| (l.clone(), snapshot.probability(l)))
            .collect();

        let actions: Vec<String> = snapshot
            .top_label()
            .map(suggested_actions)
            .unwrap_or_else(|| suggested_actions(""))
            .iter()
            .map(|s| s.to_string())
            .collect();

        let mut report = InsightReport {
            sentiment,
            top_emotions,
            reasoning: reasoning(snapshot, sentiment),
            recommendation: actions.first().cloned().unwrap_or_default(),
            suggested_actions: actions,
            sources: Vec::new(),
            enhanced: false,
        };

        match self.enhance(&report, user_context).await {
            Some((recommendation, sources)) => {
                report.recommendation = recommendation;
                report.sources = sources;
                report.enhanced = true;
            }
            None => {
                debug!("insight enhancement unavailable, using rule-based report");
            }
        }

        report
    }

    /// Retrieve research context and ask the model for a grounded
    /// recommendation. Any failure along the way returns `None`.
    async fn enhance(
        &self,
        report: &InsightReport,
        user_context: &str,
    ) -> Option<(String, Vec<String>)> {
        let llm = self.llm.as_ref()?;

        let query = report
            .top_emotions
            .iter()
            .map(|(l, _)| l.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let mut sources = Vec::new();
        let mut research = String::new();
        if let Some(retriever) = self.retriever.as_ref() {
            match retriever.query(&query, RESEARCH_K).await {
                Ok(snippets) => {
                    for snippet in snippets {
                        research.push_str(&format!("- {}\n", snippet.text.trim()));
                        sources.push(snippet.source_id);
                    }
                }
                Err(e) => {
                    warn!("research retrieval skipped for insight: {}", e);
                }
            }
        }

        let prompt = recommendation_prompt(report, user_context, &research);
        let messages = vec![
            ChatMessage::system(
                "You write short, warm, practical wellbeing suggestions. Two to four \
                 sentences. No clinical language, no diagnoses, no bullet points.",
            ),
            ChatMessage::user(prompt),
        ];

        match llm.complete(&messages).await {
            Ok(recommendation) if !recommendation.trim().is_empty() => {
                Some((recommendation, sources))
            }
            Ok(_) => None,
            Err(e) => {
                warn!("insight recommendation failed: {}", e);
                None
            }
        }
    }
}

fn recommendation_prompt(report: &InsightReport, user_context: &str, research: &str) -> String {
    let emotions = report
        .top_emotions
        .iter()
        .map(|(label, prob)| format!("{} ({:.0}%)", label, prob * 100.0))
        .collect::<Vec<_>>()
        .join(", ");

    let mut prompt = format!(
        "Someone's recent messages read as {} overall. Detected emotions: {}.\n\n\
         What they said recently:\n{}\n",
        report.sentiment.as_str(),
        if emotions.is_empty() {
            "nothing above threshold".to_string()
        } else {
            emotions
        },
        user_context
    );

    if !research.is_empty() {
        prompt.push_str(&format!(
            "\nRelevant research notes (use naturally, never cite):\n{}",
            research
        ));
    }

    prompt.push_str("\nWrite one personal, practical suggestion for them right now.");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SolaceError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use uuid::Uuid;

    fn snapshot(pairs: &[(&str, f32)]) -> EmotionSnapshot {
        let probs: HashMap<String, f32> = pairs
            .iter()
            .map(|(l, p)| (l.to_string(), *p))
            .collect();
        EmotionSnapshot::new(probs, 0.3, Uuid::new_v4())
    }

    #[test]
    fn test_sentiment_positive() {
        assert_eq!(
            sentiment_of(&snapshot(&[("joy", 0.8), ("gratitude", 0.5)])),
            SentimentCategory::Positive
        );
    }

    #[test]
    fn test_sentiment_negative() {
        assert_eq!(
            sentiment_of(&snapshot(&[("sadness", 0.7)])),
            SentimentCategory::Negative
        );
    }

    #[test]
    fn test_sentiment_mixed() {
        assert_eq!(
            sentiment_of(&snapshot(&[("joy", 0.6), ("sadness", 0.5)])),
            SentimentCategory::Mixed
        );
    }

    #[test]
    fn test_sentiment_neutral_when_nothing_dominant() {
        assert_eq!(
            sentiment_of(&snapshot(&[("joy", 0.1)])),
            SentimentCategory::Neutral
        );
    }

    #[test]
    fn test_curiosity_alone_is_neutral() {
        // curiosity is neither valence list's member
        assert_eq!(
            sentiment_of(&snapshot(&[("curiosity", 0.8)])),
            SentimentCategory::Neutral
        );
    }

    #[test]
    fn test_reasoning_names_top_emotions() {
        let snap = snapshot(&[("fear", 0.6), ("nervousness", 0.4)]);
        let text = reasoning(&snap, sentiment_of(&snap));
        assert!(text.contains("fear (60%)"));
        assert!(text.contains("negative"));
    }

    #[test]
    fn test_every_known_label_has_actions() {
        for label in crate::emotion::EMOTION_LABELS {
            assert!(!suggested_actions(label).is_empty());
        }
    }

    #[test]
    fn test_remorse_maps_to_reconnect_actions() {
        assert!(suggested_actions("remorse")[0].contains("Reconnect"));
        assert_eq!(suggested_actions("remorse"), suggested_actions("embarrassment"));
    }

    #[tokio::test]
    async fn test_rule_based_report_without_llm() {
        let engine = InsightEngine::new(None, None);
        let report = engine
            .generate(&snapshot(&[("sadness", 0.7)]), "rough week at work")
            .await;

        assert!(!report.enhanced);
        assert_eq!(report.sentiment, SentimentCategory::Negative);
        assert!(!report.suggested_actions.is_empty());
        assert_eq!(report.recommendation, report.suggested_actions[0]);
    }

    #[tokio::test]
    async fn test_enhanced_report_with_llm() {
        struct CannedModel;

        #[async_trait]
        impl ChatModel for CannedModel {
            async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, SolaceError> {
                Ok("Take a slow evening walk and call someone you miss.".to_string())
            }
        }

        let engine = InsightEngine::new(Some(Arc::new(CannedModel)), None);
        let report = engine
            .generate(&snapshot(&[("sadness", 0.7)]), "rough week")
            .await;

        assert!(report.enhanced);
        assert!(report.recommendation.contains("evening walk"));
    }

    #[tokio::test]
    async fn test_llm_failure_downgrades_to_rule_based() {
        struct DownModel;

        #[async_trait]
        impl ChatModel for DownModel {
            async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, SolaceError> {
                Err(SolaceError::LlmUnavailable("timeout".into()))
            }
        }

        let engine = InsightEngine::new(Some(Arc::new(DownModel)), None);
        let report = engine
            .generate(&snapshot(&[("fear", 0.6)]), "big exam tomorrow")
            .await;

        assert!(!report.enhanced);
        assert!(!report.recommendation.is_empty());
    }
}
