//! Gemini integration for the graduate program assistant
//!
//! This crate provides the Gemini implementation of the LLMProvider trait.

mod client;
mod config;


pub use client::GeminiClient;
pub use config::{GeminiConfig, DEFAULT_API_URL, DEFAULT_MODEL};

// Re-export core types for convenience
pub use gradchat_core::{
    LLMProvider, GenerationConfig, GenerationResult, Error, Result,
};
