// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contract drafting, signing, and text assistance.

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde_json::{Value, json};

use pactum_contracts::{SendContract, SignContract};
use pactum_core::Identity;
use pactum_core::model::{Contract, ContractInput};

use super::ApiResult;
use crate::error::ApiJson;
use crate::server::AppState;

pub async fn draft(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(input): ApiJson<ContractInput>,
) -> ApiResult<Contract> {
    Ok(Json(state.contracts.create_draft(&identity, input).await?))
}

/// POST /v1/contracts/send -- originator signs and sends, optionally from a draft.
pub async fn send(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(req): ApiJson<SendContract>,
) -> ApiResult<Contract> {
    Ok(Json(state.contracts.send(&identity, req).await?))
}

pub async fn sign(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(req): ApiJson<SignContract>,
) -> ApiResult<Contract> {
    Ok(Json(state.contracts.sign(&identity, req).await?))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Vec<Contract>> {
    Ok(Json(state.contracts.list(&identity).await?))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ApiResult<Contract> {
    Ok(Json(state.contracts.get(&identity, &id).await?))
}

/// PATCH /v1/contracts/{id} -- drafts only.
pub async fn update(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<ContractInput>,
) -> ApiResult<Contract> {
    Ok(Json(
        state.contracts.update_draft(&identity, &id, patch).await?,
    ))
}

pub async fn summary(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let summary = state.assistant.summarize(&identity, &id).await?;
    Ok(Json(json!({"summary": summary})))
}

pub async fn review(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let review = state.assistant.review(&identity, &id).await?;
    Ok(Json(json!({"review": review})))
}
