//! LLM integration module.
//!
//! Provides an OpenAI-compatible client for chat completions, the
//! [`ChatModel`] seam the answer generator and judge are written against,
//! and the prompt templates they use.

mod client;
mod prompts;

pub use client::{ChatModel, LlmClient, LlmResponse, Message, Role, TokenUsage};
pub use prompts::Prompts;
