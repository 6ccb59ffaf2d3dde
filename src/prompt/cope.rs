// src/prompt/cope.rs

//! Coping-strategy suggestions woven into the system prompt. The mapping
//! runs dominant emotion -> strategy -> one naturally-worded line; the
//! strategy names never reach the user.

use crate::emotion::EmotionSnapshot;

/// Natural-language line for each strategy.
fn strategy_line(strategy: &str) -> Option<&'static str> {
    match strategy {
        "active_coping" => Some(
            "Let's break this down together and find one small step you can take right now.",
        ),
        "planning" => Some(
            "It might help to map out a simple plan. What feels like the first thing to tackle?",
        ),
        "emotional_support" => Some(
            "It makes total sense to feel this way. You don't have to carry this alone.",
        ),
        "positive_reframing" => Some(
            "Even in tough moments, there can be a silver lining. What's one small thing that's still going okay?",
        ),
        "acceptance" => Some(
            "Sometimes the bravest thing is accepting what we can't change. How do you feel about that?",
        ),
        "humor" => Some(
            "Sometimes a little lightness can help. What usually makes you smile, even a tiny bit?",
        ),
        "venting" => Some("Let it out - I'm listening. You don't need to hold this in."),
        "self_distraction" => Some(
            "Taking a break is totally valid. What helps you reset when things get heavy?",
        ),
        _ => None,
    }
}

/// First-choice strategy per dominant emotion.
fn strategy_for_emotion(emotion: &str) -> &'static str {
    match emotion {
        "sadness" | "grief" | "disappointment" => "emotional_support",
        "nervousness" | "fear" => "active_coping",
        "anger" | "annoyance" | "disgust" => "venting",
        "joy" | "amusement" | "excitement" => "positive_reframing",
        "love" | "caring" | "gratitude" => "emotional_support",
        "surprise" | "realization" => "acceptance",
        "confusion" => "planning",
        _ => "active_coping",
    }
}

/// A coping line for the snapshot's top emotion, or `None` when nothing
/// passed the threshold.
pub fn suggestion(snapshot: &EmotionSnapshot) -> Option<&'static str> {
    let dominant = snapshot.top_label()?;
    strategy_line(strategy_for_emotion(dominant))
}

/// Wrap a coping line in its integration instructions for the system
/// prompt.
pub fn integration_block(line: &str) -> String {
    format!(
        "**COPING SUPPORT INTEGRATION:**\n\
         Consider weaving this supportive approach into your response NATURALLY:\n\
         \"{}\"\n\
         - Do NOT mention \"coping strategies\", \"technique\", or clinical terms.\n\
         - Translate this into warm, human language that fits the conversation.\n\
         - Make it feel like natural advice from a caring friend, not a therapist.\n\
         - Only include if it fits naturally - don't force it.",
        line
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use uuid::Uuid;

    fn snapshot(label: &str, prob: f32) -> EmotionSnapshot {
        let probs: HashMap<String, f32> = [(label.to_string(), prob)].into_iter().collect();
        EmotionSnapshot::new(probs, 0.3, Uuid::new_v4())
    }

    #[test]
    fn test_sadness_gets_emotional_support() {
        let line = suggestion(&snapshot("sadness", 0.8)).unwrap();
        assert!(line.contains("carry this alone"));
    }

    #[test]
    fn test_no_dominant_emotion_no_suggestion() {
        assert!(suggestion(&snapshot("sadness", 0.1)).is_none());
    }

    #[test]
    fn test_integration_block_forbids_clinical_terms() {
        let block = integration_block("a supportive line");
        assert!(block.contains("a supportive line"));
        assert!(block.contains("clinical terms"));
    }
}
