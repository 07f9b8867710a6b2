//! Domain event ingest (`POST /api/events`).
//!
//! Domain services hand a typed event to this endpoint; the server persists
//! the matching notification row, resolves the channel set, and fans the
//! frame out over the broadcast hub. Fan-out problems for individual
//! connections are the hub's concern (dropped with a warning) and never
//! fail the ingest call.

use axum::extract::Extension;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use staffline_broker::{route_event, FanoutTarget};
use staffline_db::{insert_notification, NewNotification, Recipient};
use staffline_types::{DomainEvent, EventFrame, PrincipalKind};
use std::sync::Arc;

use crate::error::ApiError;
use crate::middleware::PrincipalContext;
use crate::AppState;

/// Private-channel targets named by the producing service.
#[derive(Debug, Default, Deserialize)]
pub struct TargetParams {
    pub supervisor_id: Option<i64>,
    pub hr_id: Option<i64>,
}

/// Ingest body: the tagged event fields inline, plus the optional fan-out
/// target.
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    #[serde(flatten)]
    pub event: DomainEvent,
    #[serde(default)]
    pub target: TargetParams,
}

/// `POST /api/events` — staff-authenticated ingest boundary.
pub async fn ingest_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(ctx): Extension<PrincipalContext>,
    Json(req): Json<IngestRequest>,
) -> Result<Json<Value>, ApiError> {
    if ctx.principal.kind != PrincipalKind::Staff {
        tracing::info!(
            principal = ctx.principal.id,
            "event ingest rejected for non-staff session"
        );
        return Err(ApiError::Forbidden("event ingest is staff-only".to_string()));
    }

    let event = req.event;
    let target = FanoutTarget {
        supervisor_id: req.target.supervisor_id,
        hr_id: req.target.hr_id,
    };

    // Request events materialize a row in the shared staff history. Status
    // updates reconcile existing client rows in place, so they fan out
    // without persisting anything new.
    let notification_id = match event.notification_kind() {
        Some(kind) => {
            let new = NewNotification {
                recipient: Recipient::Staff,
                kind,
                data: event.payload_json(),
                domain_key: event.domain_key(),
            };
            let pool = state.pool.clone();
            let id = tokio::task::spawn_blocking(move || {
                let conn = pool.get().map_err(|e| {
                    tracing::error!(error = %e, "pool checkout failed");
                    ApiError::Internal
                })?;
                insert_notification(&conn, &new).map_err(ApiError::from)
            })
            .await
            .map_err(|_| ApiError::Internal)??;
            Some(id)
        }
        None => None,
    };

    let channels = route_event(&event, &target);
    for channel in &channels {
        let frame = EventFrame::for_event(channel, &event);
        match serde_json::to_string(&frame) {
            Ok(frame_json) => state.hub.publish(channel, frame_json).await,
            Err(e) => {
                tracing::error!(channel = %channel, error = %e, "frame serialization failed");
            }
        }
    }

    tracing::info!(
        event = event.event_name(),
        channels = channels.len(),
        notification_id,
        "event ingested"
    );

    Ok(Json(json!({
        "notification_id": notification_id,
        "channels": channels.iter().map(ToString::to_string).collect::<Vec<_>>(),
    })))
}
