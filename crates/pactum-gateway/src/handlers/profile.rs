// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use axum::{Extension, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::debug;

use pactum_core::Identity;

use crate::error::{ApiError, ApiJson};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct PushTokenBody {
    #[serde(default)]
    token: Option<String>,
}

/// PUT /v1/profile/push-token -- an empty or absent token clears it.
pub async fn set_push_token(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(body): ApiJson<PushTokenBody>,
) -> Result<StatusCode, ApiError> {
    let token = body.token.as_deref().map(str::trim).filter(|t| !t.is_empty());
    state.storage.set_push_token(&identity.email, token).await?;
    debug!(email = %identity.email, cleared = token.is_none(), "push token updated");
    Ok(StatusCode::NO_CONTENT)
}
