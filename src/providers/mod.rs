//! Thought generation, behind an adapter boundary. The daemon only ever talks
//! to [`ThoughtProvider`]; the concrete endpoint is an external collaborator.

mod ollama;

pub use ollama::OllamaProvider;

use crate::error::ProviderError;
use async_trait::async_trait;

#[async_trait]
pub trait ThoughtProvider: Send + Sync {
    /// Ask the generator for a short text. `Unavailable` covers connection
    /// failure and timeout; callers treat any failure as a silent tick rather
    /// than retrying.
    async fn generate(&self, prompt: &str, model: &str) -> Result<String, ProviderError>;
}
