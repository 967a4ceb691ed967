// Generative text: trait-based abstraction over chat-completion providers.
//
// Topic-name cleaning and RAG answers only need "prompt in, text out", so
// that is all the trait asks for. ChatClient implements it against any
// OpenAI-compatible endpoint (LM Studio, Ollama, vLLM, hosted APIs).

pub mod client;
pub mod rate_limiter;

use anyhow::Result;
use async_trait::async_trait;

/// Trait for generating text from a prompt. Async because every real
/// provider is an HTTP call.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for a single user prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
