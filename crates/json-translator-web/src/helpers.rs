//! Helper types and traits for cleaner route handlers.
//!
//! Provides an extension trait for converting library results into
//! HTTP-appropriate error responses, reducing boilerplate in routes.

use axum::http::StatusCode;
use json_translator_core::Error;

/// Standard result type for route handlers.
pub type RouteResult<T> = Result<T, (StatusCode, String)>;

/// HTTP status for a library error.
pub const fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::MissingConfig(_) | Error::ConfigInvalid { .. } => StatusCode::BAD_REQUEST,
        Error::NotConfigured(_) => StatusCode::CONFLICT,
        Error::MissingApiKey => StatusCode::PRECONDITION_FAILED,
        Error::TranslationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::ModelTimeout => StatusCode::GATEWAY_TIMEOUT,
        Error::ModelInit(_)
        | Error::ModelRequest(_)
        | Error::ModelInvalidResponse(_)
        | Error::ModelRateLimited { .. }
        | Error::ModelMaxRetriesExceeded => StatusCode::BAD_GATEWAY,
        Error::ConfigLoad(_) | Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Extension trait for converting `json_translator_core::Result<T>` to `RouteResult<T>`.
pub trait ResultExt<T> {
    /// Converts the error to the matching status code with its message.
    fn or_status(self) -> RouteResult<T>;
}

impl<T> ResultExt<T> for json_translator_core::Result<T> {
    fn or_status(self) -> RouteResult<T> {
        self.map_err(|e| (status_for(&e), e.to_string()))
    }
}
