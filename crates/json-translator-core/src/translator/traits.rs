use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::error::Result;
use crate::model::LanguageModel;

/// Result of one prompt translation.
///
/// An unsuccessful outcome is a normal return value, not an `Err`: it carries
/// the validation or parse message produced while coercing the model output.
#[derive(Debug, Clone, PartialEq)]
pub enum TranslationOutcome {
    Success(Value),
    Failure { message: String },
}

impl TranslationOutcome {
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Converts free text into a JSON value matching a fixed schema and type
#[async_trait]
pub trait JsonTranslator: Send + Sync {
    /// Name of the target type this translator produces
    fn type_name(&self) -> &str;

    /// Translate a natural language request into a JSON value
    async fn translate(&self, prompt: &str) -> Result<TranslationOutcome>;
}

/// Builds schema-bound translators on top of a model client
#[async_trait]
pub trait TranslatorProvider: Send + Sync {
    async fn create(
        &self,
        model: Arc<dyn LanguageModel>,
        schema: &str,
        type_name: &str,
    ) -> Result<Arc<dyn JsonTranslator>>;
}
