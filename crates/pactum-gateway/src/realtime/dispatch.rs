// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client-to-server realtime events and their routing.
//!
//! Frames look like `{"id": 7, "event": "joinRoom", "data": {"room": "..."}}`.
//! When a frame carries an `id`, the outcome comes back on the same socket as
//! `{"type": "ack", "id": 7, "result": ...}` or `{"type": "ack", "id": 7, "error": {...}}`.

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use pactum_chat::SendMessage;
use pactum_core::model::FileKind;
use pactum_core::{Broadcaster, Identity, PactumError, Room};

use super::hub::ConnId;
use crate::error::error_body;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    JoinRoom {
        room: String,
    },
    LeaveRoom {
        room: String,
    },
    Typing {
        session_id: String,
    },
    StopTyping {
        session_id: String,
    },
    SendUserMessage(SendMessage),
    MessageRead {
        session_id: String,
        #[serde(default)]
        message_id: Option<String>,
    },
    AddReaction {
        message_id: String,
        emoji: String,
    },
    EditMessage {
        message_id: String,
        text: String,
    },
    DeleteMessage {
        message_id: String,
    },
    SupportUserMessage(SupportMessage),
    SupportAgentMessage(SendMessage),
    AssignSession {
        session_id: String,
    },
    CloseSupportChat {
        session_id: String,
    },
    Ping,
}

/// A user's support message; without a `sessionId` the user's open support
/// session is used, or a new one is opened.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportMessage {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub file_type: Option<FileKind>,
}

#[derive(Debug)]
pub struct ClientEnvelope {
    pub id: Option<Value>,
    pub event: ClientEvent,
}

impl ClientEnvelope {
    /// Decodes a text frame. On failure returns the frame's `id` (if one
    /// could be read) with the reason.
    pub fn parse(frame: &str) -> Result<Self, (Option<Value>, String)> {
        let value: Value =
            serde_json::from_str(frame).map_err(|e| (None, format!("invalid JSON: {e}")))?;
        let id = value.get("id").filter(|id| !id.is_null()).cloned();
        match ClientEvent::deserialize(&value) {
            Ok(event) => Ok(Self { id, event }),
            Err(e) => Err((id, format!("invalid event: {e}"))),
        }
    }
}

pub fn ack_ok(id: &Value, result: Value) -> String {
    json!({"type": "ack", "id": id, "result": result}).to_string()
}

pub fn ack_err(id: &Value, err: &PactumError) -> String {
    json!({"type": "ack", "id": id, "error": error_body(err)}).to_string()
}

/// Handles one text frame. Returns the ack to send back, if any.
pub async fn handle_frame(
    state: &AppState,
    conn: ConnId,
    identity: &Identity,
    frame: &str,
) -> Option<String> {
    let envelope = match ClientEnvelope::parse(frame) {
        Ok(envelope) => envelope,
        Err((Some(id), reason)) => {
            debug!(conn_id = conn, reason = %reason, "rejected realtime frame");
            return Some(ack_err(&id, &PactumError::InvalidInput(reason)));
        }
        Err((None, reason)) => {
            warn!(conn_id = conn, reason = %reason, "dropped malformed realtime frame");
            return None;
        }
    };

    let outcome = dispatch(state, conn, identity, envelope.event).await;
    match (envelope.id, outcome) {
        (Some(id), Ok(result)) => Some(ack_ok(&id, result)),
        (Some(id), Err(e)) => Some(ack_err(&id, &e)),
        (None, Ok(_)) => None,
        (None, Err(e)) => {
            debug!(conn_id = conn, error = %e, "realtime event failed without ack id");
            None
        }
    }
}

async fn dispatch(
    state: &AppState,
    conn: ConnId,
    identity: &Identity,
    event: ClientEvent,
) -> Result<Value, PactumError> {
    let chat = &state.chat;
    match event {
        ClientEvent::JoinRoom { room } => {
            let room = Room::parse(&room);
            authorize_join(state, identity, &room).await?;
            state.hub.join(conn, &room);
            Ok(json!({"room": room.key()}))
        }
        ClientEvent::LeaveRoom { room } => {
            let room = Room::parse(&room);
            state.hub.leave(conn, &room);
            Ok(json!({"room": room.key()}))
        }
        ClientEvent::Typing { session_id } => {
            chat.accessible_session(&session_id, identity).await?;
            state.hub.start_typing(&session_id, &identity.email).await;
            Ok(json!({"ok": true}))
        }
        ClientEvent::StopTyping { session_id } => {
            state.hub.stop_typing(&session_id, &identity.email).await;
            Ok(json!({"ok": true}))
        }
        ClientEvent::SendUserMessage(input) => to_value(chat.send_message(identity, input).await?),
        ClientEvent::MessageRead {
            session_id,
            message_id,
        } => {
            let changed = chat
                .mark_read(identity, &session_id, message_id.as_deref())
                .await?;
            Ok(json!({"messageIds": changed}))
        }
        ClientEvent::AddReaction { message_id, emoji } => {
            let reactions = chat.react(identity, &message_id, &emoji).await?;
            Ok(json!({"reactions": reactions}))
        }
        ClientEvent::EditMessage { message_id, text } => {
            to_value(chat.edit_message(identity, &message_id, &text).await?)
        }
        ClientEvent::DeleteMessage { message_id } => {
            to_value(chat.delete_message(identity, &message_id).await?)
        }
        ClientEvent::SupportUserMessage(input) => {
            let session_id = match input.session_id.filter(|id| !id.is_empty()) {
                Some(id) => id,
                None => {
                    let session = chat.open_support_session(identity).await?;
                    state.hub.join(conn, &Room::Session(session.id.clone()));
                    session.id
                }
            };
            let message = chat
                .send_message(
                    identity,
                    SendMessage {
                        session_id,
                        text: input.text,
                        client_id: input.client_id,
                        file_url: input.file_url,
                        file_type: input.file_type,
                    },
                )
                .await?;
            to_value(message)
        }
        ClientEvent::SupportAgentMessage(input) => {
            if !identity.is_agent() {
                return Err(PactumError::Forbidden(
                    "only agents can send agent messages".to_string(),
                ));
            }
            to_value(chat.send_message(identity, input).await?)
        }
        ClientEvent::AssignSession { session_id } => {
            let session = chat.assign_agent(&session_id, identity).await?;
            state.hub.join(conn, &Room::Session(session.id.clone()));
            to_value(session)
        }
        ClientEvent::CloseSupportChat { session_id } => {
            to_value(chat.close_session(&session_id, identity).await?)
        }
        ClientEvent::Ping => Ok(json!({"pong": chrono::Utc::now().timestamp_millis()})),
    }
}

/// Own user room, own agent room (agents only), or an accessible session.
async fn authorize_join(
    state: &AppState,
    identity: &Identity,
    room: &Room,
) -> Result<(), PactumError> {
    match room {
        Room::User(email) if *email == identity.email => Ok(()),
        Room::Agent(email) if identity.is_agent() && *email == identity.email => Ok(()),
        Room::Session(id) => state.chat.accessible_session(id, identity).await.map(|_| ()),
        other => Err(PactumError::Forbidden(format!("cannot join room {other}"))),
    }
}

fn to_value<T: serde::Serialize>(value: T) -> Result<Value, PactumError> {
    serde_json::to_value(value).map_err(|e| PactumError::Internal(e.to_string()))
}
