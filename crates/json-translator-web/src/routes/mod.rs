//! HTTP route handlers for the JSON translator service.
//!
//! All routes speak JSON except the status stream, which is server-sent events.

mod status;
mod translators;

pub use status::{configure, get_status, status_stream};
pub use translators::{configure_translator, get_translator, list_translators, translate};

use axum::{
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::state::AppState;

/// Body of `POST /api/configure`.
#[derive(Deserialize, Default)]
pub struct ConfigureRequest {
    #[serde(default)]
    pub key: Option<String>,
}

/// Readiness as returned by the status routes.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct StatusResponse {
    pub ready: bool,
    /// Markdown, including the setup link while not configured
    pub status: String,
}

impl From<json_translator_core::Status> for StatusResponse {
    fn from(status: json_translator_core::Status) -> Self {
        Self {
            ready: status.is_ready(),
            status: status.to_string(),
        }
    }
}

/// Body of `POST /api/translators/{id}/translate`.
///
/// Any translator arguments present are applied before translating.
#[derive(Deserialize)]
pub struct TranslateRequest {
    pub prompt: String,
    #[serde(flatten)]
    pub patch: json_translator_core::TranslatorPatch,
}

/// Build the API router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/status", get(get_status))
        .route("/api/status/stream", get(status_stream))
        .route("/api/configure", post(configure))
        .route("/api/translators", get(list_translators))
        .route(
            "/api/translators/{id}",
            get(get_translator).patch(configure_translator),
        )
        .route("/api/translators/{id}/translate", post(translate))
        .with_state(state)
}
