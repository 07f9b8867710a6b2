//! Channel admission endpoint (`/broadcasting/auth`).

use axum::extract::{Extension, Query};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use staffline_auth::{Authorizer, Decision, StaticRoles};
use staffline_types::ChannelName;

use crate::error::ApiError;
use crate::middleware::PrincipalContext;

/// Admission request. `socket_id` identifies the client's transport
/// connection; it is logged for correlation but takes no part in the
/// decision.
#[derive(Debug, Deserialize)]
pub struct AuthRequest {
    pub channel_name: String,
    #[serde(default)]
    pub socket_id: Option<String>,
}

/// `GET /broadcasting/auth?channel_name=...&socket_id=...`
pub async fn broadcasting_auth_get(
    Extension(ctx): Extension<PrincipalContext>,
    Query(req): Query<AuthRequest>,
) -> Result<Json<Value>, ApiError> {
    authorize_channel(&ctx, req)
}

/// `POST /broadcasting/auth` with a JSON body.
pub async fn broadcasting_auth_post(
    Extension(ctx): Extension<PrincipalContext>,
    Json(req): Json<AuthRequest>,
) -> Result<Json<Value>, ApiError> {
    authorize_channel(&ctx, req)
}

fn authorize_channel(ctx: &PrincipalContext, req: AuthRequest) -> Result<Json<Value>, ApiError> {
    let channel: ChannelName = req.channel_name.parse().map_err(|_| {
        tracing::warn!(
            channel = %req.channel_name,
            principal = ctx.principal.id,
            "admission request for unknown channel"
        );
        ApiError::Forbidden(format!("unknown channel: {}", req.channel_name))
    })?;

    let authorizer = Authorizer::new(StaticRoles::single(ctx.principal.id, ctx.flags));
    match authorizer.authorize(Some(&ctx.principal), &channel) {
        Decision::Allow(presence) => {
            tracing::debug!(
                channel = %channel,
                principal = ctx.principal.id,
                socket_id = req.socket_id.as_deref().unwrap_or("-"),
                "channel admission granted"
            );
            Ok(Json(json!({ "id": presence.id, "name": presence.name })))
        }
        Decision::Deny => {
            tracing::info!(
                channel = %channel,
                principal = ctx.principal.id,
                kind = ctx.principal.kind.label(),
                "channel admission denied"
            );
            Err(ApiError::Forbidden(format!(
                "not authorized for {}",
                req.channel_name
            )))
        }
    }
}
