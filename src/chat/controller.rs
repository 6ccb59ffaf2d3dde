// src/chat/controller.rs

//! The per-turn orchestrator. Owns session state and wires the safety scan,
//! emotion analysis, retrieval, prompt composition, and the chat model into
//! one `handle_message` call.
//!
//! Order of operations is a hard contract: the safety scan always runs
//! first, and a crisis turn short-circuits everything else (no classifier
//! call, no retrieval, no generated text).

use crate::chat::style;
use crate::emotion::{self, EmotionClassifier, EmotionSnapshot, TrendClass, TrendWindow};
use crate::llm::ChatModel;
use crate::prompt::{self, PromptInputs};
use crate::retrieval::{DocumentRetriever, RetrievedSnippet};
use crate::safety;
use crate::session::{ConversationConfig, ConversationMode, Message, SessionHistory};
use std::sync::Arc;
use tracing::{debug, warn};

/// Phrases that count as an explicit request for emotion analysis.
const ANALYSIS_TRIGGERS: &[&str] = &[
    "how am i feeling",
    "what emotions",
    "analyze",
    "what's my mood",
];

/// Reply used when the chat model fails mid-conversation.
const LLM_FALLBACK_REPLY: &str = "I'm having a little trouble connecting right now, but I'm \
still here with you. Tell me more about what's on your mind.";

/// Reply used when no chat model is configured at all.
const NOT_CONFIGURED_REPLY: &str = "I can't reach my language model right now (no API \
credential is configured), so I can't chat properly. I'm still tracking how you're feeling, \
though.";

/// What one turn produced, for display layers.
#[derive(Debug, Clone)]
pub struct TurnResult {
    pub reply: String,
    pub emotion: Option<EmotionSnapshot>,
    pub trend: TrendClass,
    pub is_crisis: bool,
    /// How many retrieved snippets informed the reply.
    pub context_used: usize,
}

pub struct TurnController {
    classifier: Option<Arc<dyn EmotionClassifier>>,
    retriever: Option<Arc<dyn DocumentRetriever>>,
    llm: Option<Arc<dyn ChatModel>>,
    retrieval_k: usize,
    emotion_threshold: f32,
    pub config: ConversationConfig,
    history: SessionHistory,
    trend: TrendWindow,
}

impl TurnController {
    pub fn new(
        classifier: Option<Arc<dyn EmotionClassifier>>,
        retriever: Option<Arc<dyn DocumentRetriever>>,
        llm: Option<Arc<dyn ChatModel>>,
        config: ConversationConfig,
        emotion_threshold: f32,
        retrieval_k: usize,
    ) -> Self {
        Self {
            classifier,
            retriever,
            llm,
            retrieval_k,
            emotion_threshold,
            config,
            history: SessionHistory::new(),
            trend: TrendWindow::new(),
        }
    }

    pub fn history(&self) -> &SessionHistory {
        &self.history
    }

    /// Wipe all session state. Configuration survives.
    pub fn reset(&mut self) {
        self.history.clear();
        self.trend.clear();
    }

    /// Process one user message end to end. Always produces a reply; the
    /// only hard error left is invalid configuration, which cannot happen
    /// once the controller is constructed.
    pub async fn handle_message(&mut self, text: &str) -> TurnResult {
        let scan = safety::classify(text);

        if scan.is_crisis {
            let reply = safety::crisis_response().to_string();
            self.history.append(Message::user(text));
            self.history.append(Message::assistant(reply.clone()));
            return TurnResult {
                reply,
                emotion: None,
                trend: self.trend.classify(),
                is_crisis: true,
                context_used: 0,
            };
        }

        let asked_for_analysis = is_analysis_request(text);
        let should_analyze = self.config.mode == ConversationMode::Reflect
            || scan.is_distress
            || asked_for_analysis;

        let user_message = Message::user(text);
        let snapshot = if should_analyze {
            self.classify_emotion(text, user_message.id).await
        } else {
            None
        };

        let trend = match &snapshot {
            Some(snap) => {
                self.history.append_emotion(snap.clone());
                self.trend.push(snap.clone())
            }
            None => self.trend.classify(),
        };

        let snippets = self.retrieve_context(text).await;

        let recent = self.history.recent_messages(usize::MAX);
        let style_instructions = style::analyze(&recent).map(|p| style::instructions(&p));

        let composed = prompt::compose(&PromptInputs {
            config: &self.config,
            user_message: text,
            history: &recent,
            emotion: snapshot.as_ref(),
            trend,
            snippets: &snippets,
            style_instructions,
        });

        let reply = self.complete(composed.into_messages()).await;

        self.history
            .append(attach_snapshot(&user_message, snapshot.clone()));
        self.history.append(Message::assistant(reply.clone()));

        TurnResult {
            reply,
            emotion: snapshot,
            trend,
            is_crisis: false,
            context_used: snippets.len(),
        }
    }

    /// The explicit analyze operation: always classify `text` (no gating),
    /// record the snapshot, and reply with a short reflection on the
    /// detected emotions instead of a conversational turn. The safety scan
    /// still runs first.
    pub async fn analyze_message(&mut self, text: &str) -> TurnResult {
        let scan = safety::classify(text);
        if scan.is_crisis {
            let reply = safety::crisis_response().to_string();
            self.history.append(Message::user(text));
            self.history.append(Message::assistant(reply.clone()));
            return TurnResult {
                reply,
                emotion: None,
                trend: self.trend.classify(),
                is_crisis: true,
                context_used: 0,
            };
        }

        let user_message = Message::user(text);
        let snapshot = self.classify_emotion(text, user_message.id).await;

        let trend = match &snapshot {
            Some(snap) => {
                self.history.append_emotion(snap.clone());
                self.trend.push(snap.clone())
            }
            None => self.trend.classify(),
        };

        let reply = self.reflect(text, snapshot.as_ref(), trend).await;
        self.history
            .append(attach_snapshot(&user_message, snapshot.clone()));
        self.history.append(Message::assistant(reply.clone()));

        TurnResult {
            reply,
            emotion: snapshot,
            trend,
            is_crisis: false,
            context_used: 0,
        }
    }

    async fn classify_emotion(&self, text: &str, message_id: uuid::Uuid) -> Option<EmotionSnapshot> {
        let classifier = self.classifier.as_ref()?;
        match emotion::analyze(classifier.as_ref(), text, self.emotion_threshold, message_id).await
        {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                // Fail soft: the turn continues without emotion context.
                warn!("emotion analysis skipped: {}", e);
                None
            }
        }
    }

    /// Ask the model for a 2-3 sentence reflection on the detected emotions.
    /// Without a model, a snapshot, or on any failure, the deterministic
    /// reflection text stands in.
    async fn reflect(
        &self,
        text: &str,
        snapshot: Option<&EmotionSnapshot>,
        trend: TrendClass,
    ) -> String {
        let fallback = render_reflection(snapshot, trend);

        let (Some(llm), Some(snap)) = (self.llm.as_ref(), snapshot) else {
            return fallback;
        };
        if snap.dominant_labels.is_empty() {
            return fallback;
        }

        let detected = snap
            .dominant_labels
            .iter()
            .take(3)
            .map(|label| format!("{} ({:.0}%)", label, snap.probability(label) * 100.0))
            .collect::<Vec<_>>()
            .join(", ");

        let messages = vec![
            crate::llm::ChatMessage::system(format!(
                "They asked how they're feeling. Emotion analysis of their recent messages \
                 detected: {}. Reflect this back warmly in 2-3 sentences, in plain language, \
                 and end by checking whether it rings true. Never mention percentages, \
                 models, or analysis.",
                detected
            )),
            crate::llm::ChatMessage::user(text.to_string()),
        ];

        match llm.complete(&messages).await {
            Ok(reply) if !reply.trim().is_empty() => reply,
            Ok(_) => fallback,
            Err(e) => {
                warn!("reflection generation failed, using fixed acknowledgment: {}", e);
                fallback
            }
        }
    }

    async fn retrieve_context(&self, text: &str) -> Vec<RetrievedSnippet> {
        if !self.config.enable_retrieval {
            return Vec::new();
        }
        let Some(retriever) = self.retriever.as_ref() else {
            return Vec::new();
        };
        match retriever.query(text, self.retrieval_k).await {
            Ok(snippets) => {
                debug!(count = snippets.len(), "context retrieved");
                snippets
            }
            Err(e) => {
                warn!("retrieval skipped: {}", e);
                Vec::new()
            }
        }
    }

    async fn complete(&self, messages: Vec<crate::llm::ChatMessage>) -> String {
        let Some(llm) = self.llm.as_ref() else {
            return NOT_CONFIGURED_REPLY.to_string();
        };
        match llm.complete(&messages).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("chat completion failed, using fallback: {}", e);
                LLM_FALLBACK_REPLY.to_string()
            }
        }
    }
}

fn attach_snapshot(message: &Message, snapshot: Option<EmotionSnapshot>) -> Message {
    let mut message = message.clone();
    message.emotion_snapshot = snapshot;
    message
}

fn is_analysis_request(text: &str) -> bool {
    let lower = text.to_lowercase();
    ANALYSIS_TRIGGERS.iter().any(|t| lower.contains(t))
}

/// Plain-language reflection for an explicit analysis request.
fn render_reflection(snapshot: Option<&EmotionSnapshot>, trend: TrendClass) -> String {
    let Some(snapshot) = snapshot else {
        return "I wasn't able to read your emotions just now - my emotion model isn't \
                reachable. From the words alone, though, I'm listening. How do *you* think \
                you're feeling?"
            .to_string();
    };

    if snapshot.dominant_labels.is_empty() {
        return "Honestly, nothing stands out strongly in what you've written - your messages \
                read fairly even. Does that match how you feel?"
            .to_string();
    }

    let named: Vec<String> = snapshot
        .dominant_labels
        .iter()
        .take(3)
        .map(|label| {
            format!("{} ({:.0}%)", label, snapshot.probability(label) * 100.0)
        })
        .collect();

    let mut reply = format!(
        "From what you've shared, I'm mostly picking up: {}.",
        named.join(", ")
    );

    match trend {
        TrendClass::RisingStress => {
            reply.push_str(
                " Across your recent messages, your stress seems to be climbing - it might be \
                 worth taking things a bit gently right now.",
            );
        }
        TrendClass::Improving => {
            reply.push_str(
                " Compared to earlier, you actually seem to be feeling a bit lighter.",
            );
        }
        TrendClass::Neutral => {}
    }

    reply.push_str(" Does that sound right to you?");
    reply
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SolaceError;
    use crate::session::Personality;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedClassifier {
        probs: HashMap<String, f32>,
        calls: AtomicUsize,
    }

    impl FixedClassifier {
        fn new(pairs: &[(&str, f32)]) -> Arc<Self> {
            Arc::new(Self {
                probs: pairs.iter().map(|(l, p)| (l.to_string(), *p)).collect(),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl EmotionClassifier for FixedClassifier {
        async fn label_probabilities(
            &self,
            _text: &str,
        ) -> Result<HashMap<String, f32>, SolaceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.probs.clone())
        }
    }

    struct EchoModel;

    #[async_trait]
    impl ChatModel for EchoModel {
        async fn complete(
            &self,
            messages: &[crate::llm::ChatMessage],
        ) -> Result<String, SolaceError> {
            Ok(format!("echo: {}", messages.last().unwrap().content))
        }
    }

    struct DownModel;

    #[async_trait]
    impl ChatModel for DownModel {
        async fn complete(
            &self,
            _messages: &[crate::llm::ChatMessage],
        ) -> Result<String, SolaceError> {
            Err(SolaceError::LlmUnavailable("timeout".into()))
        }
    }

    fn controller(
        classifier: Option<Arc<dyn EmotionClassifier>>,
        llm: Option<Arc<dyn ChatModel>>,
        mode: ConversationMode,
    ) -> TurnController {
        let config = ConversationConfig {
            mode,
            personality: Personality::Friendly,
            show_emotion_chips: false,
            enable_retrieval: false,
        };
        TurnController::new(classifier, None, llm, config, 0.3, 3)
    }

    #[tokio::test]
    async fn test_crisis_short_circuits_classifier_and_llm() {
        let classifier = FixedClassifier::new(&[("sadness", 0.9)]);
        let mut ctrl = controller(
            Some(classifier.clone()),
            Some(Arc::new(DownModel)),
            ConversationMode::Reflect,
        );

        let result = ctrl.handle_message("I want to die").await;
        assert!(result.is_crisis);
        assert!(result.reply.contains("988"));
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
        // Both sides of the exchange are recorded.
        assert_eq!(ctrl.history().message_count(), 2);
    }

    #[tokio::test]
    async fn test_casual_turn_skips_classifier() {
        let classifier = FixedClassifier::new(&[("joy", 0.8)]);
        let mut ctrl = controller(
            Some(classifier.clone()),
            Some(Arc::new(EchoModel)),
            ConversationMode::Casual,
        );

        let result = ctrl.handle_message("what should I cook tonight?").await;
        assert!(result.emotion.is_none());
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
        assert!(result.reply.starts_with("echo:"));
    }

    #[tokio::test]
    async fn test_reflect_mode_always_analyzes() {
        let classifier = FixedClassifier::new(&[("joy", 0.8)]);
        let mut ctrl = controller(
            Some(classifier.clone()),
            Some(Arc::new(EchoModel)),
            ConversationMode::Reflect,
        );

        let result = ctrl.handle_message("what should I cook tonight?").await;
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.emotion.unwrap().top_label(), Some("joy"));
    }

    #[tokio::test]
    async fn test_distress_triggers_analysis_in_casual_mode() {
        let classifier = FixedClassifier::new(&[("sadness", 0.7)]);
        let mut ctrl = controller(
            Some(classifier.clone()),
            Some(Arc::new(EchoModel)),
            ConversationMode::Casual,
        );

        ctrl.handle_message("I'm feeling really overwhelmed").await;
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_analysis_phrase_still_gets_full_conversational_turn() {
        // The trigger phrase widens should_analyze; the turn itself stays a
        // normal composed exchange.
        let classifier = FixedClassifier::new(&[("joy", 0.8)]);
        let mut ctrl = controller(
            Some(classifier.clone()),
            Some(Arc::new(EchoModel)),
            ConversationMode::Casual,
        );

        let result = ctrl.handle_message("can you analyze my mood").await;
        assert!(result.reply.starts_with("echo:"));
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.emotion.unwrap().top_label(), Some("joy"));
    }

    #[tokio::test]
    async fn test_analyze_message_falls_back_when_llm_down() {
        let classifier = FixedClassifier::new(&[("sadness", 0.7), ("fear", 0.4)]);
        let mut ctrl = controller(
            Some(classifier),
            Some(Arc::new(DownModel)),
            ConversationMode::Casual,
        );

        let result = ctrl.analyze_message("rough stretch lately").await;
        assert!(result.reply.contains("sadness (70%)"));
        assert!(result.reply.contains("fear (40%)"));
        // The exchange is still recorded.
        assert_eq!(ctrl.history().message_count(), 2);
    }

    #[tokio::test]
    async fn test_analyze_message_uses_llm_when_available() {
        let classifier = FixedClassifier::new(&[("joy", 0.8)]);
        let mut ctrl = controller(
            Some(classifier),
            Some(Arc::new(EchoModel)),
            ConversationMode::Casual,
        );

        let result = ctrl.analyze_message("things are going well").await;
        assert!(result.reply.starts_with("echo:"));
        assert_eq!(result.emotion.unwrap().top_label(), Some("joy"));
    }

    #[tokio::test]
    async fn test_analyze_message_crisis_still_short_circuits() {
        let classifier = FixedClassifier::new(&[("sadness", 0.9)]);
        let mut ctrl = controller(
            Some(classifier.clone()),
            Some(Arc::new(EchoModel)),
            ConversationMode::Casual,
        );

        let result = ctrl.analyze_message("I want to die").await;
        assert!(result.is_crisis);
        assert!(result.reply.contains("988"));
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_classifier_failure_is_soft() {
        struct BrokenClassifier;

        #[async_trait]
        impl EmotionClassifier for BrokenClassifier {
            async fn label_probabilities(
                &self,
                _text: &str,
            ) -> Result<HashMap<String, f32>, SolaceError> {
                Err(SolaceError::ClassifierUnavailable("down".into()))
            }
        }

        let mut ctrl = controller(
            Some(Arc::new(BrokenClassifier)),
            Some(Arc::new(EchoModel)),
            ConversationMode::Reflect,
        );

        let result = ctrl.handle_message("I feel so sad today").await;
        assert!(result.emotion.is_none());
        assert!(result.reply.starts_with("echo:"));
    }

    #[tokio::test]
    async fn test_llm_failure_gets_fallback_reply() {
        let mut ctrl = controller(None, Some(Arc::new(DownModel)), ConversationMode::Casual);
        let result = ctrl.handle_message("hello there").await;
        assert_eq!(result.reply, LLM_FALLBACK_REPLY);
        assert_eq!(ctrl.history().message_count(), 2);
    }

    #[tokio::test]
    async fn test_no_llm_configured_gets_fixed_reply() {
        let mut ctrl = controller(None, None, ConversationMode::Casual);
        let result = ctrl.handle_message("hello there").await;
        assert_eq!(result.reply, NOT_CONFIGURED_REPLY);
    }

    #[tokio::test]
    async fn test_reset_clears_history_and_trend() {
        let mut ctrl = controller(None, Some(Arc::new(EchoModel)), ConversationMode::Casual);
        ctrl.handle_message("hi").await;
        assert_eq!(ctrl.history().message_count(), 2);
        ctrl.reset();
        assert_eq!(ctrl.history().message_count(), 0);
    }

    #[test]
    fn test_reflection_without_snapshot_admits_it() {
        let reply = render_reflection(None, TrendClass::Neutral);
        assert!(reply.contains("isn't"));
    }
}
