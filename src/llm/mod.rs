//! Text-generation service integration.
//!
//! The core only needs one operation from the service: system instructions
//! plus a user prompt in, raw text out. Parsing that text into a plan is
//! the caller's job (see `plan::parser`).

pub mod client;

pub use client::ChatCompletionsClient;

use async_trait::async_trait;

use crate::error::GenerationError;

/// Single request/response text-generation call.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Send one completion request and return the raw response text.
    async fn complete(
        &self,
        system_instructions: &str,
        user_prompt: &str,
    ) -> Result<String, GenerationError>;

    /// Model identifier, for logging.
    fn model_name(&self) -> &str;
}
