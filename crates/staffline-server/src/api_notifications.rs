//! Notification history and read-state endpoints.

use axum::extract::{Extension, Query};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use staffline_db::{list_notifications, mark_all_read, mark_one_read, Recipient};
use staffline_types::PrincipalKind;
use std::sync::Arc;

use crate::error::ApiError;
use crate::middleware::PrincipalContext;
use crate::AppState;

/// Wire sentinel meaning "mark everything read". Mapped to the explicit
/// mark-all operation at this boundary; it never reaches the persistence
/// layer as a row id.
const MARK_ALL_SENTINEL: i64 = -1;

/// History rows are scoped per principal: employees read their private
/// history, staff read the shared staff feed.
fn recipient_for(ctx: &PrincipalContext) -> Recipient {
    match ctx.principal.kind {
        PrincipalKind::Employee => Recipient::Employee(ctx.principal.id),
        PrincipalKind::Staff => Recipient::Staff,
    }
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<u32>,
}

/// `GET /employee/notifications` — the snapshot the client store merges.
pub async fn list_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(ctx): Extension<PrincipalContext>,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>, ApiError> {
    let recipient = recipient_for(&ctx);
    let pool = state.pool.clone();

    let rows = tokio::task::spawn_blocking(move || {
        let conn = pool.get().map_err(|e| {
            tracing::error!(error = %e, "pool checkout failed");
            ApiError::Internal
        })?;
        list_notifications(&conn, recipient, params.limit).map_err(ApiError::from)
    })
    .await
    .map_err(|_| ApiError::Internal)??;

    Ok(Json(json!({ "notifications": rows })))
}

#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    pub notification_id: i64,
}

/// `POST /employee/notifications/mark-read` `{notification_id}`.
///
/// Idempotent: marking an already-read or unknown row reports
/// `updated: false` with a 200, matching the client's optimistic apply.
/// Scoped to the caller's history — a row id from another recipient's
/// feed is treated the same as an unknown id.
pub async fn mark_read_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(ctx): Extension<PrincipalContext>,
    Json(req): Json<MarkReadRequest>,
) -> Result<Json<Value>, ApiError> {
    let recipient = recipient_for(&ctx);
    let pool = state.pool.clone();

    let updated = tokio::task::spawn_blocking(move || {
        let conn = pool.get().map_err(|e| {
            tracing::error!(error = %e, "pool checkout failed");
            ApiError::Internal
        })?;
        if req.notification_id == MARK_ALL_SENTINEL {
            let count = mark_all_read(&conn, recipient).map_err(ApiError::from)?;
            Ok(count > 0)
        } else {
            mark_one_read(&conn, recipient, req.notification_id).map_err(ApiError::from)
        }
    })
    .await
    .map_err(|_| ApiError::Internal)??;

    Ok(Json(json!({ "updated": updated })))
}

/// `POST /employee/notifications/mark-all-read`.
pub async fn mark_all_read_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(ctx): Extension<PrincipalContext>,
) -> Result<Json<Value>, ApiError> {
    let recipient = recipient_for(&ctx);
    let pool = state.pool.clone();

    let count = tokio::task::spawn_blocking(move || {
        let conn = pool.get().map_err(|e| {
            tracing::error!(error = %e, "pool checkout failed");
            ApiError::Internal
        })?;
        mark_all_read(&conn, recipient).map_err(ApiError::from)
    })
    .await
    .map_err(|_| ApiError::Internal)??;

    Ok(Json(json!({ "updated": count })))
}
