//! JSON Translator Core Library
//!
//! This library turns free-text prompts into schema-validated JSON values:
//! - Translator cache keyed by id, rebuilding model and translator handles
//!   only when their arguments change
//! - OpenAI-compatible language model client
//! - Schema translator for TypeScript-style type declarations
//! - TOML configuration

pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod translator;
pub mod util;

pub use cache::{
    EntryState, Status, TranslatorArgs, TranslatorCache, TranslatorDescriptor, TranslatorPatch,
    TranslatorRef,
};
pub use config::{AppConfig, ModelConfig, TranslatorDefinition, TranslatorSettings};
pub use error::{Error, Result};
pub use model::{LanguageModel, ModelEnv, ModelInfo, ModelProvider, OpenAiModel, OpenAiProvider};
pub use translator::{
    JsonTranslator, SchemaTranslator, SchemaTranslatorProvider, TranslationOutcome,
    TranslatorProvider,
};

use tracing::{info, warn};

/// Build a cache from `config` and configure every translator it registers.
pub async fn cache_from_config(config: &AppConfig) -> Result<TranslatorCache> {
    let cache = TranslatorCache::from_config(config);

    let patches = config.translator_patches()?;
    if patches.is_empty() {
        return Ok(cache);
    }

    if !cache.status().is_ready() {
        let ids: Vec<_> = patches.iter().map(|(id, _)| id.as_str()).collect();
        warn!("No API key set, skipping configured translators: {}", ids.join(", "));
        return Ok(cache);
    }

    for (id, patch) in patches {
        cache.configure(&id, patch).await?;
        info!("Configured translator '{}' from config", id);
    }

    Ok(cache)
}
