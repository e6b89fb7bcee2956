//! Editor token authentication middleware.
//!
//! Checks `Authorization: Bearer <token>` headers against the configured
//! editor tokens and records the resulting [`Caller`] in request extensions.

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::debug;

use crate::permissions::Caller;
use crate::state::AppState;

/// Middleware that identifies the caller.
///
/// - Valid editor token -> editor caller
/// - Invalid token -> 401 JSON error
/// - No bearer header -> anonymous caller
pub async fn identify_caller(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let raw_token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let caller = match raw_token {
        None => Caller::anonymous(),
        Some(token) if state.editor_tokens().verify(token.trim()) => Caller::editor(),
        Some(_) => {
            debug!("rejected unknown editor token");
            return (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Bearer error=\"invalid_token\"")],
                Json(json!({
                    "code": StatusCode::UNAUTHORIZED.as_u16(),
                    "message": "Invalid API token",
                })),
            )
                .into_response();
        }
    };

    request.extensions_mut().insert(caller);
    next.run(request).await
}
