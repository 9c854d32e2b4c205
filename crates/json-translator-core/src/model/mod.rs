mod openai;
mod traits;

pub use openai::{OpenAiModel, OpenAiProvider, DEFAULT_RETRY_COUNT, DEFAULT_RETRY_DELAY_MS};
pub use traits::{LanguageModel, ModelEnv, ModelInfo, ModelProvider};

use crate::config::ModelConfig;
use std::sync::Arc;

/// Create the default model provider from configuration
pub fn create_model_provider(config: &ModelConfig) -> Arc<dyn ModelProvider> {
    Arc::new(OpenAiProvider::new(config.clone()))
}
