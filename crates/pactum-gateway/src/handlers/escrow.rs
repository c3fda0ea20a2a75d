// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Escrow funding and release.

use axum::{Extension, Json, extract::State};
use serde::Deserialize;

use pactum_contracts::{ConfirmFunding, LocalPayment};
use pactum_core::Identity;
use pactum_core::model::Contract;
use pactum_core::traits::PaymentIntent;

use super::ApiResult;
use crate::error::ApiJson;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentBody {
    contract_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseBody {
    contract_id: String,
    /// Omitted: release whatever remains in escrow.
    #[serde(default)]
    amount: Option<f64>,
}

pub async fn create_payment_intent(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(body): ApiJson<IntentBody>,
) -> ApiResult<PaymentIntent> {
    Ok(Json(
        state
            .escrow
            .create_payment_intent(&identity, &body.contract_id)
            .await?,
    ))
}

pub async fn confirm(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(req): ApiJson<ConfirmFunding>,
) -> ApiResult<Contract> {
    Ok(Json(state.escrow.confirm_funding(&identity, req).await?))
}

pub async fn release(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(body): ApiJson<ReleaseBody>,
) -> ApiResult<Contract> {
    Ok(Json(
        state
            .escrow
            .release(&identity, &body.contract_id, body.amount)
            .await?,
    ))
}

pub async fn local_payment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(req): ApiJson<LocalPayment>,
) -> ApiResult<Contract> {
    Ok(Json(state.escrow.record_local_payment(&identity, req).await?))
}
