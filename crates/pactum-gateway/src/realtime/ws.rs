// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket upgrade and per-connection loop.
//!
//! The token comes from `?token=` (browsers cannot set headers on an
//! upgrade) or, failing that, from the `Authorization` header.

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::HeaderMap,
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, info};

use pactum_core::Identity;

use super::dispatch::handle_frame;
use crate::auth::{AuthError, bearer_token, unauthorized};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    #[serde(default)]
    token: Option<String>,
}

/// Authenticates, then upgrades. Unauthenticated upgrades get a 401.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Response {
    let token = query.token.as_deref().or_else(|| bearer_token(&headers));
    let identity = match token
        .ok_or(AuthError::Missing)
        .and_then(|token| state.signer.verify(token))
    {
        Ok(identity) => identity,
        Err(e) => {
            debug!(error = %e, "websocket upgrade rejected");
            return unauthorized(&e);
        }
    };
    ws.max_message_size(state.max_frame_bytes)
        .on_upgrade(move |socket| handle_socket(socket, state, identity))
}

/// Runs one connection: a writer task drains the hub queue into the socket
/// while this task reads frames and dispatches them.
async fn handle_socket(socket: WebSocket, state: AppState, identity: Identity) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (conn_id, mut rx) = state.hub.register(identity.clone()).await;
    info!(conn_id, email = %identity.email, role = %identity.role, "websocket connected");

    let mut writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if ws_sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            incoming = ws_receiver.next() => {
                let Some(Ok(msg)) = incoming else { break };
                match msg {
                    Message::Text(text) => {
                        if let Some(ack) = handle_frame(&state, conn_id, &identity, text.as_str()).await {
                            if !state.hub.reply(conn_id, ack).await {
                                break;
                            }
                        }
                    }
                    Message::Close(_) => break,
                    _ => {} // binary is ignored, ping/pong handled by axum
                }
            }
            // Queue dropped (hub shutdown) or the socket stopped accepting writes.
            _ = &mut writer => break,
        }
    }

    state.hub.unregister(conn_id).await;
    writer.abort();
    info!(conn_id, email = %identity.email, "websocket disconnected");
}
