// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};
use tracing::warn;

use pactum_core::{Backend, HealthStatus};

use crate::server::AppState;

/// GET /v1/health -- public liveness plus a storage probe.
pub async fn get_health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let (code, storage) = match state.storage.health_check().await {
        Ok(HealthStatus::Healthy) => (StatusCode::OK, "healthy".to_string()),
        Ok(HealthStatus::Degraded(reason)) => (StatusCode::OK, format!("degraded: {reason}")),
        Ok(HealthStatus::Unhealthy(reason)) => {
            warn!(reason = %reason, "storage unhealthy");
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy".to_string())
        }
        Err(e) => {
            warn!(error = %e, "storage health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy".to_string())
        }
    };
    let status = if code == StatusCode::OK { "ok" } else { "degraded" };
    (
        code,
        Json(json!({
            "status": status,
            "version": env!("CARGO_PKG_VERSION"),
            "uptimeSecs": state.started.elapsed().as_secs(),
            "connections": state.hub.connection_count(),
            "storage": {
                "backend": state.storage.name(),
                "version": state.storage.version().to_string(),
                "status": storage,
            },
        })),
    )
}
