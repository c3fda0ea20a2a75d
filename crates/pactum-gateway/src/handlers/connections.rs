// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use axum::{Extension, Json, extract::State};
use serde::Deserialize;

use pactum_chat::PeerStatus;
use pactum_core::Identity;
use pactum_core::model::Connection;

use super::ApiResult;
use crate::error::ApiJson;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct PeerBody {
    email: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusesBody {
    #[serde(default)]
    emails: Vec<String>,
}

pub async fn invite(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(body): ApiJson<PeerBody>,
) -> ApiResult<Connection> {
    Ok(Json(state.connections.invite(&identity, &body.email).await?))
}

pub async fn accept(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(body): ApiJson<PeerBody>,
) -> ApiResult<Connection> {
    Ok(Json(state.connections.accept(&identity, &body.email).await?))
}

pub async fn reject(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(body): ApiJson<PeerBody>,
) -> ApiResult<Connection> {
    Ok(Json(state.connections.reject(&identity, &body.email).await?))
}

pub async fn statuses(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(body): ApiJson<StatusesBody>,
) -> ApiResult<Vec<PeerStatus>> {
    Ok(Json(
        state.connections.statuses(&identity, &body.emails).await?,
    ))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Vec<Connection>> {
    Ok(Json(state.connections.list(&identity).await?))
}
