// src/chat/style.rs

//! Linguistic style profiling over the user's recent messages. The profile
//! feeds one system-prompt block telling the model to mirror how the user
//! actually writes.

use crate::session::{Message, MessageRole};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Messages needed before a profile is worth rendering.
const MIN_SAMPLE: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Formality {
    Casual,
    Neutral,
    Formal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageLength {
    Short,
    Medium,
    Long,
}

/// Overall tone read from fixed keyword lists. Crude on purpose; the
/// classifier owns the real emotional read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tone {
    Upbeat,
    Down,
    Frustrated,
    Neutral,
}

const UPBEAT_WORDS: &[&str] = &["great", "awesome", "happy", "excited", "amazing", "love", "yay"];
const DOWN_WORDS: &[&str] = &["sad", "tired", "down", "lonely", "meh", "exhausted", "drained"];
const FRUSTRATED_WORDS: &[&str] = &["annoying", "ugh", "hate", "frustrated", "sick of", "fed up"];

fn detect_tone(messages: &[&str]) -> Tone {
    let count = |words: &[&str]| {
        messages
            .iter()
            .map(|m| {
                let lower = m.to_lowercase();
                words.iter().filter(|w| lower.contains(*w)).count()
            })
            .sum::<usize>()
    };

    let upbeat = count(UPBEAT_WORDS);
    let down = count(DOWN_WORDS);
    let frustrated = count(FRUSTRATED_WORDS);

    let max = upbeat.max(down).max(frustrated);
    if max == 0 {
        Tone::Neutral
    } else if max == frustrated {
        Tone::Frustrated
    } else if max == down {
        Tone::Down
    } else {
        Tone::Upbeat
    }
}

/// Observed writing habits, all derived from raw text. Never persisted; a
/// fresh profile is computed each turn from whatever history remains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleProfile {
    pub formality: Formality,
    pub uses_emoji: bool,
    pub uses_slang: bool,
    pub typical_length: MessageLength,
    /// Exclamation marks or all-caps words signal high intensity.
    pub high_intensity: bool,
    pub tone: Tone,
}

static SLANG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(lol|lmao|omg|idk|tbh|ngl|fr|bruh|gonna|wanna|gotta|kinda|sorta|u|ur|rn|imo|smh)\b")
        .expect("valid regex")
});

static FORMAL_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(however|therefore|furthermore|nevertheless|regarding|additionally|consequently)\b")
        .expect("valid regex")
});

static ALL_CAPS_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z]{3,}\b").expect("valid regex"));

fn contains_emoji(text: &str) -> bool {
    text.chars().any(|c| {
        matches!(c as u32,
            0x1F300..=0x1FAFF   // pictographs, transport, supplemental
            | 0x2600..=0x27BF   // misc symbols and dingbats
            | 0x1F1E6..=0x1F1FF // regional indicators
        )
    })
}

/// Profile the user's side of the history. Returns `None` until enough user
/// messages exist to say anything meaningful.
pub fn analyze(history: &[&Message]) -> Option<StyleProfile> {
    let user_messages: Vec<&str> = history
        .iter()
        .filter(|m| m.role == MessageRole::User)
        .map(|m| m.content.as_str())
        .collect();

    if user_messages.len() < MIN_SAMPLE {
        return None;
    }

    let total: usize = user_messages.len();
    let slang_hits = user_messages.iter().filter(|m| SLANG.is_match(m)).count();
    let formal_hits = user_messages
        .iter()
        .filter(|m| FORMAL_MARKERS.is_match(m))
        .count();
    let emoji_hits = user_messages
        .iter()
        .filter(|m| contains_emoji(m))
        .count();
    let intense_hits = user_messages
        .iter()
        .filter(|m| m.contains('!') || ALL_CAPS_WORD.is_match(m))
        .count();

    let avg_words: usize =
        user_messages.iter().map(|m| m.split_whitespace().count()).sum::<usize>() / total;

    let formality = if slang_hits * 2 >= total {
        Formality::Casual
    } else if formal_hits > 0 && slang_hits == 0 {
        Formality::Formal
    } else {
        Formality::Neutral
    };

    let typical_length = match avg_words {
        0..=8 => MessageLength::Short,
        9..=30 => MessageLength::Medium,
        _ => MessageLength::Long,
    };

    Some(StyleProfile {
        formality,
        uses_emoji: emoji_hits * 2 >= total,
        uses_slang: slang_hits * 2 >= total,
        typical_length,
        high_intensity: intense_hits * 2 >= total,
        tone: detect_tone(&user_messages),
    })
}

/// Render the profile as a system-prompt block.
pub fn instructions(profile: &StyleProfile) -> String {
    let mut lines = vec!["**Style Matching:** Mirror how they write:".to_string()];

    lines.push(match profile.formality {
        Formality::Casual => "- They write casually; keep your language relaxed and informal".into(),
        Formality::Formal => "- They write formally; keep your language polished and complete".into(),
        Formality::Neutral => "- Keep a natural, everyday register".into(),
    });

    if profile.uses_emoji {
        lines.push("- They use emoji; an occasional fitting emoji is welcome".into());
    } else {
        lines.push("- They don't use emoji; avoid them".into());
    }

    if profile.uses_slang {
        lines.push("- Casual abbreviations and slang are fine in moderation".into());
    }

    lines.push(match profile.typical_length {
        MessageLength::Short => "- They send short messages; keep replies brief too".into(),
        MessageLength::Medium => "- Match their moderate message length".into(),
        MessageLength::Long => {
            "- They write at length; fuller responses are appropriate".into()
        }
    });

    if profile.high_intensity {
        lines.push("- They write with energy; matching enthusiasm is okay".into());
    }

    match profile.tone {
        Tone::Upbeat => lines.push("- Their tone is upbeat; feel free to be playful".into()),
        Tone::Down => lines.push("- Their tone is low; be gentle and unhurried".into()),
        Tone::Frustrated => {
            lines.push("- They sound frustrated; validate before anything else".into())
        }
        Tone::Neutral => {}
    }

    lines.join("\n")
}
