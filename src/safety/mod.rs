// src/safety/mod.rs

//! Lexical safety triggers: fixed lowercase substring lists scanned against
//! every incoming message before anything else runs.
//!
//! Matching is deliberately plain `contains` - no tokenization, no stemming.
//! That produces known false positives ("sad" inside "crusade", "hurt"
//! inside "yoghurt") and the lists will miss paraphrases. Altering that
//! sensitivity is a product decision, not a code cleanup.

use serde::{Deserialize, Serialize};

/// Phrases that demand an immediate grounding response. No classifier, no
/// LLM - the crisis reply is fixed text.
const CRISIS_KEYWORDS: &[&str] = &[
    "want to die",
    "kill myself",
    "suicidal",
    "end it all",
    "better off dead",
    "no point living",
    "want to disappear",
    "hurt myself",
    "self harm",
];

/// Broader vocabulary of sadness, anxiety, exhaustion, and loneliness that
/// makes a turn eligible for emotion analysis.
const DISTRESS_KEYWORDS: &[&str] = &[
    "sad",
    "depressed",
    "hopeless",
    "worthless",
    "hate myself",
    "want to die",
    "suicidal",
    "end it all",
    "give up",
    "can't go on",
    "hurt",
    "pain",
    "suffering",
    "exhausted",
    "tired of life",
    "anxious",
    "panic",
    "scared",
    "terrified",
    "overwhelmed",
    "stressed",
    "burned out",
    "breaking down",
    "falling apart",
    "lonely",
    "isolated",
    "nobody cares",
    "all alone",
];

/// Outcome of scanning one message. Crisis implies distress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerScan {
    pub is_crisis: bool,
    pub is_distress: bool,
}

/// Scan a raw message for crisis and distress substrings. Pure and
/// case-insensitive.
pub fn classify(text: &str) -> TriggerScan {
    let lower = text.to_lowercase();
    let is_crisis = CRISIS_KEYWORDS.iter().any(|kw| lower.contains(kw));
    let is_distress = is_crisis || DISTRESS_KEYWORDS.iter().any(|kw| lower.contains(kw));
    TriggerScan {
        is_crisis,
        is_distress,
    }
}

/// The fixed grounding reply for crisis turns. Shown verbatim instead of a
/// generated response, regardless of mode or personality.
pub fn crisis_response() -> &'static str {
    "I hear that you're going through an incredibly difficult time right now, and I want you \
to know that your feelings are valid. But I'm concerned about your safety.\n\n\
**Please reach out to someone who can help:**\n\n\
**Crisis Resources:**\n\
- **National Suicide Prevention Lifeline**: 988 (US)\n\
- **Crisis Text Line**: Text HOME to 741741\n\
- **International Association for Suicide Prevention**: https://www.iasp.info/resources/Crisis_Centres/\n\n\
You don't have to face this alone. These services are available 24/7, and the people there \
are trained to help. They won't judge you - they're there to support you through this moment.\n\n\
Would you be willing to reach out to one of these resources? I'm here to listen, but I want \
to make sure you have the professional support you deserve right now."
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crisis_implies_distress() {
        let scan = classify("I want to die");
        assert!(scan.is_crisis);
        assert!(scan.is_distress);
    }

    #[test]
    fn test_distress_without_crisis() {
        let scan = classify("I'm so exhausted and lonely lately");
        assert!(!scan.is_crisis);
        assert!(scan.is_distress);
    }

    #[test]
    fn test_neutral_message() {
        let scan = classify("Hey, how's it going?");
        assert!(!scan.is_crisis);
        assert!(!scan.is_distress);
    }

    #[test]
    fn test_case_insensitive() {
        assert!(classify("I FEEL SO HOPELESS").is_distress);
        assert!(classify("Kill Myself").is_crisis);
    }

    #[test]
    fn test_substring_false_positive_is_accepted() {
        // "sad" inside "crusade", "hurt" inside "yoghurt" - documented
        // limitation, not a bug
        assert!(classify("writing my essay on the crusades").is_distress);
        assert!(classify("grabbing a yoghurt before class").is_distress);
    }

    #[test]
    fn test_crisis_response_names_hotlines() {
        let reply = crisis_response();
        assert!(reply.contains("988"));
        assert!(reply.contains("741741"));
    }
}
