// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat sessions and their messages.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};

use pactum_chat::SendMessage;
use pactum_core::Identity;
use pactum_core::model::{ArchivedMessage, ChatSession, FileKind, Message, Reaction};

use super::ApiResult;
use crate::error::ApiJson;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateSession {
    #[serde(default)]
    participants: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct QueueQuery {
    #[serde(default)]
    unassigned: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageBody {
    #[serde(default)]
    text: String,
    #[serde(default)]
    client_id: Option<String>,
    #[serde(default)]
    file_url: Option<String>,
    #[serde(default)]
    file_type: Option<FileKind>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadBody {
    #[serde(default)]
    message_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReactionBody {
    emoji: String,
}

#[derive(Debug, Deserialize)]
pub struct EditBody {
    text: String,
}

/// POST /v1/sessions -- open (or return) the peer session for two participants.
pub async fn create_session(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(body): ApiJson<CreateSession>,
) -> ApiResult<ChatSession> {
    Ok(Json(
        state
            .chat
            .create_or_get_session(&identity, &body.participants)
            .await?,
    ))
}

pub async fn list_sessions(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Vec<ChatSession>> {
    Ok(Json(state.chat.list_sessions_for(&identity).await?))
}

pub async fn open_support(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<ChatSession> {
    Ok(Json(state.chat.open_support_session(&identity).await?))
}

/// GET /v1/sessions/support?unassigned=true -- agent queue.
pub async fn support_queue(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<QueueQuery>,
) -> ApiResult<Vec<ChatSession>> {
    Ok(Json(
        state
            .chat
            .list_support_queue(&identity, query.unassigned)
            .await?,
    ))
}

pub async fn get_session(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ApiResult<ChatSession> {
    Ok(Json(state.chat.get_session(&id, &identity).await?))
}

pub async fn assign(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ApiResult<ChatSession> {
    Ok(Json(state.chat.assign_agent(&id, &identity).await?))
}

pub async fn close(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ApiResult<ChatSession> {
    Ok(Json(state.chat.close_session(&id, &identity).await?))
}

/// POST /v1/sessions/{id}/clear -- returns the successor session.
pub async fn clear(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ApiResult<ChatSession> {
    Ok(Json(state.chat.clear_session(&id, &identity).await?))
}

pub async fn history(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ApiResult<Vec<Message>> {
    Ok(Json(state.chat.history(&identity, &id).await?))
}

pub async fn send_message(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<MessageBody>,
) -> ApiResult<Message> {
    let input = SendMessage {
        session_id: id,
        text: body.text,
        client_id: body.client_id,
        file_url: body.file_url,
        file_type: body.file_type,
    };
    Ok(Json(state.chat.send_message(&identity, input).await?))
}

/// POST /v1/sessions/{id}/read -- one message with `messageId`, else all.
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<ReadBody>,
) -> ApiResult<Value> {
    let changed = state
        .chat
        .mark_read(&identity, &id, body.message_id.as_deref())
        .await?;
    Ok(Json(json!({"messageIds": changed})))
}

pub async fn archive(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ApiResult<Vec<ArchivedMessage>> {
    Ok(Json(state.chat.archived_history(&identity, &id).await?))
}

pub async fn react(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(message_id): Path<String>,
    ApiJson(body): ApiJson<ReactionBody>,
) -> ApiResult<Vec<Reaction>> {
    Ok(Json(
        state.chat.react(&identity, &message_id, &body.emoji).await?,
    ))
}

pub async fn edit_message(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(message_id): Path<String>,
    ApiJson(body): ApiJson<EditBody>,
) -> ApiResult<Message> {
    Ok(Json(
        state
            .chat
            .edit_message(&identity, &message_id, &body.text)
            .await?,
    ))
}

pub async fn delete_message(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(message_id): Path<String>,
) -> ApiResult<Message> {
    Ok(Json(
        state.chat.delete_message(&identity, &message_id).await?,
    ))
}
