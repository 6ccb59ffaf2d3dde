// src/prompt/mod.rs

pub mod composer;
pub mod cope;
pub mod persona;

pub use composer::{ComposedPrompt, PromptInputs, compose};
