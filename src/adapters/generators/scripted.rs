//! Scripted generator for tests and offline runs.
//!
//! Replies are consumed in order; once the script is exhausted the default
//! reply (if any) is repeated.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::TextGenerator;

/// One recorded `generate` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub system: String,
    pub user: String,
}

pub struct ScriptedGenerator {
    name: String,
    script: Mutex<VecDeque<DomainResult<String>>>,
    default_text: Option<String>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedGenerator {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: Mutex::new(VecDeque::new()),
            default_text: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful reply.
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.push(Ok(text.into()))
    }

    /// Queue a failed call.
    pub fn with_error(self, error: DomainError) -> Self {
        self.push(Err(error))
    }

    /// Reply used once the queue is empty.
    pub fn with_default_text(mut self, text: impl Into<String>) -> Self {
        self.default_text = Some(text.into());
        self
    }

    fn push(self, reply: DomainResult<String>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(reply);
        }
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, system_instruction: &str, user_content: &str) -> DomainResult<String> {
        self.calls
            .lock()
            .map_err(|_| DomainError::GenerationFailed("call log poisoned".to_string()))?
            .push(RecordedCall { system: system_instruction.to_string(), user: user_content.to_string() });

        let next = self
            .script
            .lock()
            .map_err(|_| DomainError::GenerationFailed("script poisoned".to_string()))?
            .pop_front();

        match (next, &self.default_text) {
            (Some(reply), _) => reply,
            (None, Some(text)) => Ok(text.clone()),
            (None, None) => Err(DomainError::GenerationFailed("script exhausted".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replies_in_order_then_default() {
        let generator = ScriptedGenerator::new("scripted")
            .with_text("one")
            .with_error(DomainError::GenerationFailed("boom".to_string()))
            .with_default_text("again");

        assert_eq!(generator.generate("s", "u1").await.unwrap(), "one");
        assert!(generator.generate("s", "u2").await.is_err());
        assert_eq!(generator.generate("s", "u3").await.unwrap(), "again");
        assert_eq!(generator.generate("s", "u4").await.unwrap(), "again");

        assert_eq!(generator.call_count(), 4);
        assert_eq!(generator.calls()[2].user, "u3");
    }

    #[tokio::test]
    async fn test_exhausted_without_default_fails() {
        let generator = ScriptedGenerator::new("scripted");
        assert!(matches!(generator.generate("s", "u").await, Err(DomainError::GenerationFailed(_))));
        assert_eq!(generator.name(), "scripted");
    }
}
