//! Status routes - readiness and API key configuration.

use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::Stream;
use std::convert::Infallible;
use std::sync::Arc;

use super::{ConfigureRequest, StatusResponse};
use crate::state::AppState;

/// Current readiness.
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(state.cache.status().into())
}

/// Replace the API key. Every translator must be configured again afterwards.
///
/// Returns 204 No Content.
pub async fn configure(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ConfigureRequest>,
) -> StatusCode {
    state.cache.set_api_key(request.key).await;
    StatusCode::NO_CONTENT
}

/// SSE stream of readiness, one `status` event now and one per change.
#[allow(tail_expr_drop_order)] // Drop order change in async_stream macro is harmless here
pub async fn status_stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.cache.subscribe();

    let stream = async_stream::stream! {
        loop {
            let status = *rx.borrow_and_update();
            let payload = StatusResponse::from(status);
            if let Ok(event) = Event::default().event("status").json_data(&payload) {
                yield Ok(event);
            }

            if rx.changed().await.is_err() {
                break;
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}
