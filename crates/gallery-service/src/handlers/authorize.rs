//! Authorizer entry point.
//!
//! `POST /v1/authorize` accepts the gateway's authorizer event and always
//! answers 200 with an allow or deny policy.

use crate::routes::AppState;
use authorizer::{AuthorizerEvent, AuthorizerResponse};
use axum::{body::Bytes, extract::State, Json};
use std::sync::Arc;
use tracing::instrument;

/// Handler for POST /v1/authorize
///
/// A body that is not a valid event is treated as an event without a token,
/// which is denied.
#[instrument(skip_all, name = "gallery.handlers.authorize")]
pub async fn authorize(State(state): State<Arc<AppState>>, body: Bytes) -> Json<AuthorizerResponse> {
    let event: AuthorizerEvent = serde_json::from_slice(&body).unwrap_or_else(|e| {
        tracing::debug!(target: "gallery.handlers.authorize", error = %e, "Unparseable authorizer event");
        AuthorizerEvent::default()
    });

    Json(state.authorizer.authorize(&event).await)
}
