// src/prompt/composer.rs

//! Assembles the full chat-completion request for one turn. The system
//! prompt is built from fixed-order blocks; conversation history and any
//! retrieved context follow as separate messages so the model sees them
//! with the right roles.

use crate::emotion::{EmotionSnapshot, TrendClass};
use crate::llm::ChatMessage;
use crate::prompt::{cope, persona};
use crate::retrieval::RetrievedSnippet;
use crate::session::{ConversationConfig, Message, MessageRole};

/// How many prior messages ride along with each request.
const HISTORY_WINDOW: usize = 10;

/// Everything the composer needs for one turn. All borrowed; composing
/// never mutates session state.
pub struct PromptInputs<'a> {
    pub config: &'a ConversationConfig,
    pub user_message: &'a str,
    pub history: &'a [&'a Message],
    pub emotion: Option<&'a EmotionSnapshot>,
    pub trend: TrendClass,
    pub snippets: &'a [RetrievedSnippet],
    /// Rendered style-matching instructions, when enough history exists to
    /// profile the user's writing.
    pub style_instructions: Option<String>,
}

/// A ready-to-send message list. Kept as a struct so callers can inspect
/// the system prompt separately from the conversation.
#[derive(Debug, Clone)]
pub struct ComposedPrompt {
    pub system_prompt: String,
    pub messages: Vec<ChatMessage>,
}

impl ComposedPrompt {
    /// The full ordered list for the chat-completion request.
    pub fn into_messages(self) -> Vec<ChatMessage> {
        self.messages
    }
}

/// Build the request for one turn. Block order inside the system prompt is
/// fixed: persona, mode, core principles, then the optional emotion, trend,
/// style, and coping blocks in that order.
pub fn compose(inputs: &PromptInputs<'_>) -> ComposedPrompt {
    let mut blocks: Vec<String> = Vec::new();

    blocks.push(format!(
        "You are an emotionally intelligent companion.\n\n\
         **Your Personality:** {}\n{}",
        inputs.config.personality.as_str(),
        persona::personality_traits(inputs.config.personality)
    ));

    blocks.push(format!(
        "**Current Mode:** {}\n{}",
        inputs.config.mode.as_str(),
        persona::mode_instructions(inputs.config.mode)
    ));

    blocks.push(persona::CORE_PRINCIPLES.to_string());

    if let Some(snapshot) = inputs.emotion {
        if let Some(block) = emotion_block(snapshot) {
            blocks.push(block);
        }
    }

    if let Some(block) = trend_block(inputs.trend) {
        blocks.push(block);
    }

    if let Some(style) = &inputs.style_instructions {
        blocks.push(style.clone());
    }

    if let Some(snapshot) = inputs.emotion {
        if let Some(line) = cope::suggestion(snapshot) {
            blocks.push(cope::integration_block(line));
        }
    }

    let system_prompt = blocks.join("\n\n");

    let mut messages = Vec::with_capacity(inputs.history.len() + 3);
    messages.push(ChatMessage::system(system_prompt.clone()));

    let skip = inputs.history.len().saturating_sub(HISTORY_WINDOW);
    for message in inputs.history.iter().skip(skip) {
        messages.push(match message.role {
            MessageRole::User => ChatMessage::user(message.content.clone()),
            MessageRole::Assistant => ChatMessage::assistant(message.content.clone()),
        });
    }

    if let Some(block) = context_block(inputs.snippets) {
        messages.push(ChatMessage::system(block));
    }

    messages.push(ChatMessage::user(inputs.user_message.to_string()));

    ComposedPrompt {
        system_prompt,
        messages,
    }
}

/// Detected-emotion block. Skipped when nothing passed the threshold, so a
/// flat snapshot never injects an empty section.
fn emotion_block(snapshot: &EmotionSnapshot) -> Option<String> {
    if snapshot.dominant_labels.is_empty() {
        return None;
    }
    let labels = snapshot
        .dominant_labels
        .iter()
        .map(|label| {
            format!(
                "{} ({:.0}%)",
                label,
                snapshot.probability(label) * 100.0
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    Some(format!(
        "**Detected Emotional State:** {}\n\
         Shape your tone around this, but never name these emotions back to them.",
        labels
    ))
}

fn trend_block(trend: TrendClass) -> Option<String> {
    match trend {
        TrendClass::RisingStress => Some(
            "**Emotional Trend:** Their stress appears to be building across recent messages. \
             Be extra gentle and grounding; slow the conversation down."
                .to_string(),
        ),
        TrendClass::Improving => Some(
            "**Emotional Trend:** They seem to be feeling better than earlier in the \
             conversation. Gently reinforce the shift without drawing attention to it."
                .to_string(),
        ),
        TrendClass::Neutral => None,
    }
}

/// Retrieved background context, injected after history so the model reads
/// it as reference material rather than conversation.
fn context_block(snippets: &[RetrievedSnippet]) -> Option<String> {
    if snippets.is_empty() {
        return None;
    }
    let mut block = String::from(
        "Background context that may be relevant (never quote or cite it directly; \
         let it inform your response naturally):\n",
    );
    for snippet in snippets {
        block.push_str(&format!(
            "\n- [{} {:.2}] {}",
            snippet.source_id,
            snippet.similarity_score,
            snippet.text.trim()
        ));
    }
    Some(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Message;
    use std::collections::HashMap;
    use uuid::Uuid;

    fn snapshot(pairs: &[(&str, f32)]) -> EmotionSnapshot {
        let probs: HashMap<String, f32> = pairs
            .iter()
            .map(|(label, prob)| (label.to_string(), *prob))
            .collect();
        EmotionSnapshot::new(probs, 0.3, Uuid::new_v4())
    }

    fn inputs<'a>(
        config: &'a ConversationConfig,
        history: &'a [&'a Message],
        emotion: Option<&'a EmotionSnapshot>,
    ) -> PromptInputs<'a> {
        PromptInputs {
            config,
            user_message: "hello there",
            history,
            emotion,
            trend: TrendClass::Neutral,
            snippets: &[],
            style_instructions: None,
        }
    }

    #[test]
    fn test_block_order_persona_before_mode_before_principles() {
        let config = ConversationConfig::default();
        let composed = compose(&inputs(&config, &[], None));

        let persona_at = composed.system_prompt.find("**Your Personality:**").unwrap();
        let mode_at = composed.system_prompt.find("**Current Mode:**").unwrap();
        let principles_at = composed.system_prompt.find("**Core Principles:**").unwrap();
        assert!(persona_at < mode_at);
        assert!(mode_at < principles_at);
    }

    #[test]
    fn test_emotion_block_included_when_dominant() {
        let config = ConversationConfig::default();
        let snap = snapshot(&[("sadness", 0.7)]);
        let composed = compose(&inputs(&config, &[], Some(&snap)));
        assert!(composed.system_prompt.contains("Detected Emotional State"));
        assert!(composed.system_prompt.contains("sadness (70%)"));
    }

    #[test]
    fn test_flat_snapshot_omits_emotion_block() {
        let config = ConversationConfig::default();
        let snap = snapshot(&[("sadness", 0.1)]);
        let composed = compose(&inputs(&config, &[], Some(&snap)));
        assert!(!composed.system_prompt.contains("Detected Emotional State"));
    }

    #[test]
    fn test_trend_block_on_rising_stress() {
        let config = ConversationConfig::default();
        let mut turn = inputs(&config, &[], None);
        turn.trend = TrendClass::RisingStress;
        let composed = compose(&turn);
        assert!(composed.system_prompt.contains("stress appears to be building"));
    }

    #[test]
    fn test_snippets_land_after_history_before_user_message() {
        let config = ConversationConfig::default();
        let user = Message::user("earlier message");
        let assistant = Message::assistant("earlier reply");
        let history: Vec<&Message> = vec![&user, &assistant];
        let snippets = vec![RetrievedSnippet {
            text: "journaling reduces rumination".to_string(),
            source_id: "doc_journaling".to_string(),
            similarity_score: 0.8,
        }];

        let mut turn = inputs(&config, &history, None);
        turn.snippets = &snippets;
        let composed = compose(&turn);

        // system, user, assistant, context, final user
        assert_eq!(composed.messages.len(), 5);
        assert!(composed.messages[3].content.contains("journaling"));
        assert_eq!(composed.messages[4].content, "hello there");
    }

    #[test]
    fn test_history_trimmed_to_window() {
        let config = ConversationConfig::default();
        let owned: Vec<Message> = (0..15).map(|i| Message::user(format!("m{}", i))).collect();
        let history: Vec<&Message> = owned.iter().collect();
        let composed = compose(&inputs(&config, &history, None));

        // system + 10 history + user
        assert_eq!(composed.messages.len(), 12);
        assert_eq!(composed.messages[1].content, "m5");
    }

    #[test]
    fn test_style_instructions_included_verbatim() {
        let config = ConversationConfig::default();
        let mut turn = inputs(&config, &[], None);
        turn.style_instructions = Some("**Style Matching:** mirror their brevity".to_string());
        let composed = compose(&turn);
        assert!(composed.system_prompt.contains("mirror their brevity"));
    }
}
