//! LLM module: reply-generation capability, HTTP client and persona prompt
//!
//! This module provides:
//! - `ReplyGenerator`, the capability the orchestrator depends on
//! - `LlmClientConfig`, `LlmClient` for OpenAI-compatible Chat Completions backends
//! - `SYSTEM_PROMPT`, the avatar persona and output-format contract

mod client;
mod prompt;

pub use client::{LlmClient, LlmClientConfig};
pub use prompt::SYSTEM_PROMPT;

use crate::Result;
use async_trait::async_trait;

/// Produces the raw model text for a system instruction and a user turn
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn generate(&self, system: &str, user: &str) -> Result<String>;
}
