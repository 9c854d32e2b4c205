use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use super::traits::{JsonTranslator, TranslationOutcome, TranslatorProvider};
use super::validate::SchemaValidator;
use crate::config::TranslatorSettings;
use crate::error::Result;
use crate::model::LanguageModel;

/// Translates requests into JSON values of one exported schema type.
///
/// The model is asked for a JSON object matching the TypeScript-style schema.
/// The reply is sliced from its first `{` to its last `}`, parsed, and checked
/// against the target type. A failed check earns one repair round trip when
/// `attempt_repair` is set.
pub struct SchemaTranslator {
    model: Arc<dyn LanguageModel>,
    schema: String,
    type_name: String,
    attempt_repair: bool,
}

impl SchemaTranslator {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        schema: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        Self {
            model,
            schema: schema.into(),
            type_name: type_name.into(),
            attempt_repair: true,
        }
    }

    #[must_use]
    pub const fn with_attempt_repair(mut self, attempt_repair: bool) -> Self {
        self.attempt_repair = attempt_repair;
        self
    }

    /// Create the prompt for a natural language request
    pub fn create_request_prompt(&self, request: &str) -> String {
        format!(
            "You are a service that translates user requests into JSON objects of type \"{}\" according to the following TypeScript definitions:\n\
             ```\n{}\n```\n\
             The following is a user request:\n\"\"\"\n{}\n\"\"\"\n\
             The following is the user request translated into a JSON object with 2 spaces of indentation and no properties with the value undefined:\n",
            self.type_name,
            self.schema.trim(),
            request
        )
    }

    /// Create the follow-up prompt asking the model to fix an invalid object
    pub fn create_repair_prompt(validation_error: &str) -> String {
        format!(
            "The JSON object is invalid for the following reason:\n\"\"\"\n{validation_error}\n\"\"\"\n\
             The following is a revised JSON object:\n"
        )
    }
}

/// Pull the outermost `{ ... }` out of a model reply and parse it.
fn extract_json(response: &str) -> std::result::Result<Value, String> {
    let (Some(start), Some(end)) = (response.find('{'), response.rfind('}')) else {
        return Err(format!("Response is not JSON:\n{response}"));
    };
    if end <= start {
        return Err(format!("Response is not JSON:\n{response}"));
    }

    serde_json::from_str(&response[start..=end])
        .map_err(|e| format!("Response is not valid JSON: {e}"))
}

#[async_trait]
impl JsonTranslator for SchemaTranslator {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    async fn translate(&self, request: &str) -> Result<TranslationOutcome> {
        let validator = match SchemaValidator::new(&self.schema, &self.type_name) {
            Ok(validator) => validator,
            Err(message) => return Ok(TranslationOutcome::failure(message)),
        };

        let mut prompt = self.create_request_prompt(request);
        let mut attempt_repair = self.attempt_repair;

        loop {
            let response = self.model.complete(&prompt).await?;

            let value = match extract_json(&response) {
                Ok(value) => value,
                Err(message) => return Ok(TranslationOutcome::failure(message)),
            };

            match validator.validate(&value) {
                Ok(()) => return Ok(TranslationOutcome::Success(value)),
                Err(message) if attempt_repair => {
                    debug!("Repairing {} response: {}", self.type_name, message);
                    prompt.push_str(&response);
                    prompt.push('\n');
                    prompt.push_str(&Self::create_repair_prompt(&message));
                    attempt_repair = false;
                }
                Err(message) => return Ok(TranslationOutcome::failure(message)),
            }
        }
    }
}

/// Builds [`SchemaTranslator`]s with shared settings.
#[derive(Debug, Clone, Default)]
pub struct SchemaTranslatorProvider {
    settings: TranslatorSettings,
}

impl SchemaTranslatorProvider {
    pub const fn new(settings: TranslatorSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl TranslatorProvider for SchemaTranslatorProvider {
    async fn create(
        &self,
        model: Arc<dyn LanguageModel>,
        schema: &str,
        type_name: &str,
    ) -> Result<Arc<dyn JsonTranslator>> {
        Ok(Arc::new(
            SchemaTranslator::new(model, schema, type_name)
                .with_attempt_repair(self.settings.attempt_repair),
        ))
    }
}
