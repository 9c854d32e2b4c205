use thiserror::Error;

/// Unified error type for json-translator-core
///
/// This enum encompasses all error cases that can occur in the library:
/// - Translator cache operations (missing arguments, unconfigured ids)
/// - Translation outcomes reported by the schema translator
/// - Language model operations (client setup, API requests, rate limiting)
/// - Configuration operations (loading, validation)
/// - General I/O operations
#[derive(Error, Debug)]
pub enum Error {
    // ==========================================================================
    // Translator Cache Errors
    // ==========================================================================
    /// A required translator argument is absent after merging with stored values
    #[error("missing translator argument: {0}")]
    MissingConfig(&'static str),

    /// `translate` was called on an id with no translator
    #[error("translator '{0}' is not configured")]
    NotConfigured(String),

    /// No API key has been configured for the service
    #[error("API key not configured")]
    MissingApiKey,

    /// The schema translator returned an unsuccessful result
    #[error("{0}")]
    TranslationFailed(String),

    // ==========================================================================
    // Language Model Errors
    // ==========================================================================
    /// Failed to build the model client
    #[error("failed to create language model client: {0}")]
    ModelInit(String),

    /// Model API request failed
    #[error("language model request failed: {0}")]
    ModelRequest(String),

    /// Invalid response from model API
    #[error("invalid language model response: {0}")]
    ModelInvalidResponse(String),

    /// Rate limited by model API
    #[error("language model rate limited{}", retry_after.map(|s| format!(", retry after {s} seconds")).unwrap_or_default())]
    ModelRateLimited { retry_after: Option<u64> },

    /// Model request timed out
    #[error("language model request timed out")]
    ModelTimeout,

    /// Maximum retry attempts exceeded for a model request
    #[error("language model request failed after maximum retries")]
    ModelMaxRetriesExceeded,

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Failed to load configuration file
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    /// Invalid configuration value
    #[error("invalid config value for '{field}': {reason}")]
    ConfigInvalid { field: String, reason: String },

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
