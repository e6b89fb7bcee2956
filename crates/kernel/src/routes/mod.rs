//! HTTP route handlers.

pub mod block_updater;
pub mod health;
pub mod metrics;

use axum::Router;

use crate::state::AppState;

/// Build the application router with its state-aware middleware.
///
/// Layers run outermost first: request metrics, then caller identification.
/// Transport layers (CORS, tracing) are added by the binary.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(block_updater::router())
        .merge(health::router())
        .merge(metrics::router())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::identify_caller,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::track_requests,
        ))
        .with_state(state)
}
