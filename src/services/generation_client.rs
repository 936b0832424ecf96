//! Generation client: one bounded call to the text-generation backend.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::TextGenerator;
use crate::services::output_extraction::{extract, ExtractedOutput};

pub struct GenerationClient {
    generator: Arc<dyn TextGenerator>,
    timeout: Duration,
}

impl GenerationClient {
    pub fn new(generator: Arc<dyn TextGenerator>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    /// Origin label of the underlying backend.
    pub fn origin(&self) -> &str {
        self.generator.name()
    }

    /// Invoke the backend once and return its raw text.
    ///
    /// A timeout is reported as `GenerationTimeout` and a blank reply as
    /// `GenerationFailed`; both count as a failed attempt.
    pub async fn generate_raw(&self, system_instruction: &str, user_content: &str) -> DomainResult<String> {
        let started = Instant::now();
        let result = tokio::time::timeout(self.timeout, self.generator.generate(system_instruction, user_content))
            .await
            .map_err(|_| DomainError::GenerationTimeout(self.timeout.as_secs()))?
            .and_then(|text| {
                if text.trim().is_empty() {
                    Err(DomainError::GenerationFailed("empty response".to_string()))
                } else {
                    Ok(text)
                }
            });

        match &result {
            Ok(text) => tracing::debug!(
                backend = self.generator.name(),
                chars = text.chars().count(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "generation call completed"
            ),
            Err(e) => tracing::warn!(
                backend = self.generator.name(),
                error = %e,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "generation call failed"
            ),
        }
        result
    }

    /// Invoke the backend once and extract `report` / `next_action`.
    pub async fn generate(&self, system_instruction: &str, user_content: &str) -> DomainResult<ExtractedOutput> {
        let raw = self.generate_raw(system_instruction, user_content).await?;
        Ok(extract(&raw))
    }
}
