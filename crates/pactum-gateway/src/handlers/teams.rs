// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::Deserialize;

use pactum_core::Identity;
use pactum_core::model::Team;

use super::ApiResult;
use crate::error::ApiJson;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateTeam {
    name: String,
}

#[derive(Debug, Deserialize)]
pub struct AddMember {
    email: String,
}

pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(body): ApiJson<CreateTeam>,
) -> ApiResult<Team> {
    Ok(Json(state.teams.create_team(&identity, &body.name).await?))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Vec<Team>> {
    Ok(Json(state.teams.list_teams(&identity).await?))
}

pub async fn add_member(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(team_id): Path<String>,
    ApiJson(body): ApiJson<AddMember>,
) -> ApiResult<Team> {
    Ok(Json(
        state
            .teams
            .add_member(&identity, &team_id, &body.email)
            .await?,
    ))
}
