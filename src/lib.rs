// src/lib.rs

pub mod chat;
pub mod config;
pub mod emotion;
pub mod error;
pub mod insight;
pub mod llm;
pub mod prompt;
pub mod retrieval;
pub mod safety;
pub mod session;

pub use error::SolaceError;
