//! Block updater REST routes.
//!
//! Every route requires a caller the access gate admits. Anonymous callers
//! get 401, authenticated callers without the capability get 403.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::metrics::FORBIDDEN_BLOCK;
use crate::models::PostId;
use crate::permissions::Caller;
use crate::services::{BulkUpdateReport, UpdateError, UpdateOutcome};
use crate::state::AppState;

/// Create the block updater router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/block-updater/update-post", get(update_post))
        .route("/block-updater/posts", get(list_posts))
        .route("/block-updater/types", get(list_types))
        .route("/block-updater/update-all", get(update_all))
}

/// Query for `update-post`. Kept as strings so bad input gets our own 400.
#[derive(Debug, Deserialize)]
struct UpdatePostQuery {
    #[serde(rename = "postId")]
    post_id: Option<String>,
    block: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpdateAllQuery {
    block: Option<String>,
}

fn require_editor(state: &AppState, caller: &Caller) -> AppResult<()> {
    if state.gate().permits(caller) {
        return Ok(());
    }
    if caller.authenticated {
        Err(AppError::Forbidden(
            "Sorry, you are not allowed to do that.".to_string(),
        ))
    } else {
        Err(AppError::Unauthorized)
    }
}

/// Turn a query rejection into our 400. Call only after `require_editor`.
fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> AppResult<T> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

fn required_block(block: Option<String>) -> AppResult<String> {
    block
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing parameter: block".to_string()))
}

fn parse_post_id(raw: Option<&str>) -> AppResult<PostId> {
    let raw = raw
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing parameter: postId".to_string()))?;

    raw.parse::<PostId>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid parameter: postId ({raw})")))
}

/// Update one post.
///
/// GET /block-updater/update-post?postId=&block=
async fn update_post(
    State(state): State<AppState>,
    caller: Caller,
    query: Result<Query<UpdatePostQuery>, QueryRejection>,
) -> AppResult<Json<UpdateOutcome>> {
    require_editor(&state, &caller)?;
    let query = query_params(query)?;
    let post_id = parse_post_id(query.post_id.as_deref())?;
    let block = required_block(query.block)?;

    match state.updater().update_post(post_id, &block).await {
        Ok(outcome) => {
            state.metrics().record_update(&block, outcome.as_str());
            info!(post_id, block = %block, outcome = outcome.as_str(), "update-post handled");
            Ok(Json(outcome))
        }
        Err(e @ UpdateError::Forbidden(_)) => {
            state.metrics().record_update(FORBIDDEN_BLOCK, e.kind());
            Err(e.into())
        }
        Err(e) => {
            state.metrics().record_update(&block, e.kind());
            Err(e.into())
        }
    }
}

/// IDs of published posts and pages.
///
/// GET /block-updater/posts
async fn list_posts(State(state): State<AppState>, caller: Caller) -> AppResult<Json<Vec<PostId>>> {
    require_editor(&state, &caller)?;
    let ids = state.updater().list_published_content().await?;
    Ok(Json(ids))
}

/// Allowed block type names.
///
/// GET /block-updater/types
async fn list_types(State(state): State<AppState>, caller: Caller) -> AppResult<Json<Vec<String>>> {
    require_editor(&state, &caller)?;
    Ok(Json(state.updater().list_updatable_block_types()))
}

/// Update one block type across all published content.
///
/// GET /block-updater/update-all?block=
async fn update_all(
    State(state): State<AppState>,
    caller: Caller,
    query: Result<Query<UpdateAllQuery>, QueryRejection>,
) -> AppResult<Json<BulkUpdateReport>> {
    require_editor(&state, &caller)?;
    let query = query_params(query)?;
    let block = required_block(query.block)?;

    let report = state.updater().update_all(&block).await?;
    let metrics = state.metrics();
    for _ in &report.updated {
        metrics.record_update(&block, UpdateOutcome::Updated.as_str());
    }
    for _ in &report.unchanged {
        metrics.record_update(&block, UpdateOutcome::Unchanged.as_str());
    }
    for _ in &report.failed {
        metrics.record_update(&block, "failed");
    }
    Ok(Json(report))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn post_id_must_be_a_positive_integer() {
        assert_eq!(parse_post_id(Some("42")).unwrap(), 42);
        assert_eq!(parse_post_id(Some(" 7 ")).unwrap(), 7);

        for bad in [None, Some(""), Some("abc"), Some("0"), Some("-3"), Some("1.5")] {
            let err = parse_post_id(bad).unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST, "{bad:?}");
        }
    }

    #[test]
    fn block_is_required() {
        assert_eq!(required_block(Some("acme/hero".into())).unwrap(), "acme/hero");
        assert!(required_block(None).is_err());
        assert!(required_block(Some("  ".into())).is_err());
    }
}
