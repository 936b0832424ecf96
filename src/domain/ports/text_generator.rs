//! Text-generation port - interface for LLM backends.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;

/// An external capability that produces text from a system instruction and user content.
///
/// Implementations make exactly one backend call per `generate` and report
/// failures (HTTP errors, quota, malformed envelopes) as `DomainError::GenerationFailed`.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Label recorded as the origin of generated reports (e.g. the model name).
    fn name(&self) -> &str;

    /// Produce raw text for the given prompt pair.
    async fn generate(&self, system_instruction: &str, user_content: &str) -> DomainResult<String>;
}
