//! WebSocket delivery endpoint (`GET /ws`).

use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket},
        Extension, Query, WebSocketUpgrade,
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use staffline_auth::{Authorizer, Decision, StaticRoles};
use staffline_types::ChannelName;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::middleware::{resolve_principal_blocking, PrincipalContext};
use crate::AppState;

/// Per-session frame buffer. Beyond this the client is too slow and frames
/// are dropped by the hub.
const SESSION_BUFFER: usize = 256;

#[derive(Debug, Deserialize)]
pub struct WsConnectParams {
    pub token: String,
}

/// Client-to-server control frames.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum IncomingFrame {
    #[serde(rename = "subscribe")]
    Subscribe { channel: String },
    #[serde(rename = "unsubscribe")]
    Unsubscribe { channel: String },
}

/// Server-to-client control frames. Event frames are serialized
/// [`staffline_types::EventFrame`]s published through the hub.
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum OutgoingFrame {
    #[serde(rename = "subscribed")]
    Subscribed { channel: String },
    #[serde(rename = "error")]
    Error { message: String },
}

fn send_control_frame(tx: &mpsc::Sender<String>, frame: OutgoingFrame) {
    match serde_json::to_string(&frame) {
        Ok(json) => {
            if let Err(e) = tx.try_send(json) {
                tracing::warn!("failed to queue control frame: {}", e);
            }
        }
        Err(e) => {
            tracing::error!("failed to serialize control frame: {}", e);
        }
    }
}

/// `GET /ws?token=...` — authenticates the session token, then upgrades.
pub async fn ws_handler(
    Extension(state): Extension<Arc<AppState>>,
    ws: WebSocketUpgrade,
    Query(params): Query<WsConnectParams>,
) -> impl IntoResponse {
    match resolve_principal_blocking(state.pool.clone(), params.token).await {
        Ok(Some(ctx)) => {
            tracing::info!(
                principal = ctx.principal.id,
                kind = ctx.principal.kind.label(),
                "websocket session authenticated"
            );
            ws.on_upgrade(move |socket| handle_socket(socket, state, ctx))
        }
        Ok(None) => {
            tracing::warn!("websocket connect with invalid token");
            StatusCode::UNAUTHORIZED.into_response()
        }
        Err(code) => code.into_response(),
    }
}

/// Drives one WebSocket session: registers it with the hub, forwards
/// published frames out, and applies subscribe/unsubscribe control frames
/// gated by the channel authorizer. Channel-level failures are reported as
/// error frames; they never tear the connection down.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, ctx: PrincipalContext) {
    let (mut sink, mut stream) = socket.split();

    let (tx, mut rx) = mpsc::channel::<String>(SESSION_BUFFER);
    let connection_id = state.hub.add_session(tx.clone()).await;

    let send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sink.send(WsMessage::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    let authorizer = Authorizer::new(StaticRoles::single(ctx.principal.id, ctx.flags));

    while let Some(Ok(msg)) = stream.next().await {
        let WsMessage::Text(text) = msg else {
            continue;
        };

        let incoming = match serde_json::from_str::<IncomingFrame>(&text) {
            Ok(frame) => frame,
            Err(e) => {
                send_control_frame(
                    &tx,
                    OutgoingFrame::Error {
                        message: format!("malformed frame: {e}"),
                    },
                );
                continue;
            }
        };

        match incoming {
            IncomingFrame::Subscribe { channel } => {
                let parsed: ChannelName = match channel.parse() {
                    Ok(name) => name,
                    Err(_) => {
                        send_control_frame(
                            &tx,
                            OutgoingFrame::Error {
                                message: format!("unknown channel: {channel}"),
                            },
                        );
                        continue;
                    }
                };

                match authorizer.authorize(Some(&ctx.principal), &parsed) {
                    Decision::Allow(_) => {
                        state.hub.subscribe(parsed, connection_id).await;
                        send_control_frame(&tx, OutgoingFrame::Subscribed { channel });
                    }
                    Decision::Deny => {
                        send_control_frame(
                            &tx,
                            OutgoingFrame::Error {
                                message: format!("not authorized for {channel}"),
                            },
                        );
                    }
                }
            }
            IncomingFrame::Unsubscribe { channel } => {
                if let Ok(parsed) = channel.parse::<ChannelName>() {
                    state.hub.unsubscribe(&parsed, connection_id).await;
                }
            }
        }
    }

    state.hub.remove_session(connection_id).await;
    send_task.abort();
    tracing::info!(
        principal = ctx.principal.id,
        connection_id = %connection_id,
        "websocket session closed"
    );
}
