// src/session/mod.rs

//! Per-session state: the bounded message/emotion history rings and the
//! user-settable conversation configuration.
//!
//! Everything here is in-memory only and owned by exactly one session; a
//! process restart discards it all.

use crate::emotion::EmotionSnapshot;
use crate::error::SolaceError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Message ring capacity (10 exchanges).
pub const MESSAGE_HISTORY_CAP: usize = 20;

/// Emotion snapshot ring capacity.
pub const EMOTION_HISTORY_CAP: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// One conversation entry. Immutable after append.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Present only when this (user) message was emotion-analyzed.
    pub emotion_snapshot: Option<EmotionSnapshot>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            emotion_snapshot: None,
        }
    }

    pub fn with_snapshot(mut self, snapshot: EmotionSnapshot) -> Self {
        self.emotion_snapshot = Some(snapshot);
        self
    }
}

/// How the companion should carry the conversation this turn onward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversationMode {
    Casual,
    Comfort,
    Reflect,
    Hype,
    Listen,
}

impl ConversationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationMode::Casual => "Casual Chat",
            ConversationMode::Comfort => "Comfort Me",
            ConversationMode::Reflect => "Help Me Reflect",
            ConversationMode::Hype => "Hype Me Up",
            ConversationMode::Listen => "Just Listen",
        }
    }

    pub fn all() -> &'static [ConversationMode] {
        &[
            ConversationMode::Casual,
            ConversationMode::Comfort,
            ConversationMode::Reflect,
            ConversationMode::Hype,
            ConversationMode::Listen,
        ]
    }
}

impl fmt::Display for ConversationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ConversationMode {
    type Err = SolaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "casual" | "casual chat" => Ok(ConversationMode::Casual),
            "comfort" | "comfort me" => Ok(ConversationMode::Comfort),
            "reflect" | "help me reflect" => Ok(ConversationMode::Reflect),
            "hype" | "hype me up" => Ok(ConversationMode::Hype),
            "listen" | "just listen" => Ok(ConversationMode::Listen),
            other => Err(SolaceError::InvalidConfiguration(format!(
                "unknown conversation mode: '{}'",
                other
            ))),
        }
    }
}

/// The companion's voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Personality {
    Friendly,
    Calm,
    BigSister,
    Funny,
    DeepThinker,
}

impl Personality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Personality::Friendly => "Friendly",
            Personality::Calm => "Calm",
            Personality::BigSister => "Big Sister",
            Personality::Funny => "Funny",
            Personality::DeepThinker => "Deep Thinker",
        }
    }

    pub fn all() -> &'static [Personality] {
        &[
            Personality::Friendly,
            Personality::Calm,
            Personality::BigSister,
            Personality::Funny,
            Personality::DeepThinker,
        ]
    }
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Personality {
    type Err = SolaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "friendly" => Ok(Personality::Friendly),
            "calm" => Ok(Personality::Calm),
            "big sister" | "bigsister" | "big-sister" => Ok(Personality::BigSister),
            "funny" => Ok(Personality::Funny),
            "deep thinker" | "deepthinker" | "deep-thinker" => Ok(Personality::DeepThinker),
            other => Err(SolaceError::InvalidConfiguration(format!(
                "unknown personality: '{}'",
                other
            ))),
        }
    }
}

/// User-settable knobs. Mutable at any time; affects only future turns.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConversationConfig {
    pub mode: ConversationMode,
    pub personality: Personality,
    pub show_emotion_chips: bool,
    /// When set, turns also query the document retriever for background
    /// context.
    pub enable_retrieval: bool,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            mode: ConversationMode::Casual,
            personality: Personality::Friendly,
            show_emotion_chips: false,
            enable_retrieval: false,
        }
    }
}

impl ConversationConfig {
    /// Parse from user-facing strings, rejecting unknown values up front so
    /// a turn never sees a bad enum.
    pub fn parse(mode: &str, personality: &str) -> Result<Self, SolaceError> {
        Ok(Self {
            mode: mode.parse()?,
            personality: personality.parse()?,
            ..Self::default()
        })
    }
}

/// Bounded append-only logs with FIFO eviction. `clear` is the only other
/// way entries leave.
#[derive(Debug, Clone, Default)]
pub struct SessionHistory {
    messages: VecDeque<Message>,
    emotions: VecDeque<EmotionSnapshot>,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self {
            messages: VecDeque::with_capacity(MESSAGE_HISTORY_CAP),
            emotions: VecDeque::with_capacity(EMOTION_HISTORY_CAP),
        }
    }

    pub fn append(&mut self, message: Message) {
        if self.messages.len() == MESSAGE_HISTORY_CAP {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    pub fn append_emotion(&mut self, snapshot: EmotionSnapshot) {
        if self.emotions.len() == EMOTION_HISTORY_CAP {
            self.emotions.pop_front();
        }
        self.emotions.push_back(snapshot);
    }

    /// Up to the last `n` messages, oldest first.
    pub fn recent_messages(&self, n: usize) -> Vec<&Message> {
        let skip = self.messages.len().saturating_sub(n);
        self.messages.iter().skip(skip).collect()
    }

    /// Up to the last `n` snapshots, oldest first.
    pub fn recent_emotions(&self, n: usize) -> Vec<&EmotionSnapshot> {
        let skip = self.emotions.len().saturating_sub(n);
        self.emotions.iter().skip(skip).collect()
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn emotion_count(&self) -> usize {
        self.emotions.len()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.emotions.clear();
    }
}
