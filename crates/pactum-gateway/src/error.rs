// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Maps [`PactumError`] onto HTTP responses and realtime ack errors.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use tracing::{error, warn};

use pactum_core::PactumError;

/// Handler error wrapper; every handler returns `Result<_, ApiError>`.
#[derive(Debug)]
pub struct ApiError(pub PactumError);

impl From<PactumError> for ApiError {
    fn from(err: PactumError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(PactumError::InvalidInput(rejection.body_text()))
    }
}

/// Request body extractor whose failures render like every other API error
/// (400 with a JSON body) instead of axum's plain-text rejection.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

pub fn status_for(err: &PactumError) -> StatusCode {
    match err {
        PactumError::InvalidInput(_) | PactumError::MissingFields(_) => StatusCode::BAD_REQUEST,
        PactumError::Forbidden(_) => StatusCode::FORBIDDEN,
        PactumError::NotFound { .. } => StatusCode::NOT_FOUND,
        PactumError::Conflict(_) => StatusCode::CONFLICT,
        PactumError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        PactumError::Storage { .. } | PactumError::Config(_) | PactumError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Client-safe JSON body for `err`. Server-side details are logged here and
/// never leave the process.
pub fn error_body(err: &PactumError) -> Value {
    let mut body = json!({
        "error": err.kind().to_string(),
        "message": err.public_message(),
    });
    match err {
        PactumError::MissingFields(fields) => {
            body["missingFields"] = json!(fields);
        }
        PactumError::Upstream {
            service,
            status,
            message,
        } => {
            warn!(service = %service, status = ?status, message = %message, "upstream service failed");
            body["status"] = json!(status);
        }
        PactumError::Storage { .. } | PactumError::Config(_) | PactumError::Internal(_) => {
            error!(error = %err, "request failed");
        }
        _ => {}
    }
    body
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (status_for(&self.0), Json(error_body(&self.0))).into_response()
    }
}
