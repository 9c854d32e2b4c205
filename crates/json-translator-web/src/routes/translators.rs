//! Translator routes - configure named translators and run prompts.

use axum::{
    extract::{Path, State},
    Json,
};
use json_translator_core::{TranslatorDescriptor, TranslatorPatch};
use serde_json::Value;
use std::sync::Arc;

use super::TranslateRequest;
use crate::helpers::{ResultExt, RouteResult};
use crate::state::AppState;

/// Every translator with cached state.
pub async fn list_translators(State(state): State<Arc<AppState>>) -> Json<Vec<TranslatorDescriptor>> {
    let mut descriptors = Vec::new();
    for id in state.cache.ids().await {
        descriptors.push(state.cache.describe(&id).await);
    }
    Json(descriptors)
}

/// One translator's arguments and state. Unknown ids are reported as unbuilt.
pub async fn get_translator(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<TranslatorDescriptor> {
    Json(state.cache.translator(id).descriptor().await)
}

/// Partial update of a translator's model, schema and type name.
pub async fn configure_translator(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<TranslatorPatch>,
) -> RouteResult<Json<TranslatorDescriptor>> {
    let descriptor = state.cache.translator(id).configure(patch).await.or_status()?;
    Ok(Json(descriptor))
}

/// Translate a prompt, configuring first when arguments are included.
pub async fn translate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<TranslateRequest>,
) -> RouteResult<Json<Value>> {
    let value = state
        .cache
        .configure_and_translate(&id, request.patch, &request.prompt)
        .await
        .or_status()?;
    Ok(Json(value))
}
