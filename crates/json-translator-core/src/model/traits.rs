use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;

/// Information about a language model backend
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// Human-readable backend name
    pub name: &'static str,
    /// Model identifier sent to the backend
    pub model: String,
}

/// Everything a provider needs to build a model client.
#[derive(Clone)]
pub struct ModelEnv {
    /// API credential (the global key at construction time)
    pub api_key: String,
    /// Model identifier, e.g. "gpt-4"
    pub model: String,
}

impl std::fmt::Debug for ModelEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelEnv")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .finish()
    }
}

/// A language model client bound to one backend and one credential
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Get information about this model
    fn info(&self) -> ModelInfo;

    /// Send a single-turn prompt and return the raw completion text
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Builds model clients from a [`ModelEnv`]
#[async_trait]
pub trait ModelProvider: Send + Sync {
    async fn create(&self, env: &ModelEnv) -> Result<Arc<dyn LanguageModel>>;
}
