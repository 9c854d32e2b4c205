mod schema;
mod traits;
pub mod validate;

pub use schema::{SchemaTranslator, SchemaTranslatorProvider};
pub use traits::{JsonTranslator, TranslationOutcome, TranslatorProvider};

use crate::config::TranslatorSettings;
use std::sync::Arc;

/// Create the default translator provider from configuration
pub fn create_translator_provider(settings: &TranslatorSettings) -> Arc<dyn TranslatorProvider> {
    Arc::new(SchemaTranslatorProvider::new(settings.clone()))
}
