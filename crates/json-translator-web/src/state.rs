use json_translator_core::TranslatorCache;

/// Global application state
pub struct AppState {
    /// Translators by id, plus the API key they are built with
    pub cache: TranslatorCache,
}

impl AppState {
    pub const fn new(cache: TranslatorCache) -> Self {
        Self { cache }
    }
}
