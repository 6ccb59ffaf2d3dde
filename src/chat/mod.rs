// src/chat/mod.rs

//! Conversation orchestration: the turn controller and style profiling.

pub mod controller;
pub mod style;

pub use controller::{TurnController, TurnResult};
pub use style::{StyleProfile, analyze as analyze_style};
