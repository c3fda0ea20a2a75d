// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use axum::{Extension, Json, extract::State};
use serde::Deserialize;

use pactum_contracts::OnboardingLink;
use pactum_core::Identity;
use pactum_core::model::{WalletSummary, WalletTransaction};

use super::ApiResult;
use crate::error::ApiJson;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct WithdrawBody {
    amount: f64,
    #[serde(default)]
    currency: Option<String>,
}

pub async fn summary(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<WalletSummary> {
    Ok(Json(state.wallet.summary(&identity).await?))
}

pub async fn transactions(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Vec<WalletTransaction>> {
    Ok(Json(state.wallet.transactions(&identity).await?))
}

pub async fn onboard(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<OnboardingLink> {
    Ok(Json(state.wallet.onboard(&identity).await?))
}

pub async fn withdraw(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(body): ApiJson<WithdrawBody>,
) -> ApiResult<WalletTransaction> {
    Ok(Json(
        state
            .wallet
            .withdraw(&identity, body.amount, body.currency.as_deref())
            .await?,
    ))
}
