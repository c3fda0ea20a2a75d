// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway test fixtures built on the shared harness.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use serde_json::Value;

use pactum_config::PactumConfig;
use pactum_core::Identity;
use pactum_test_utils::TestHarness;

use crate::server::{AppState, Services, router};

pub(crate) const SECRET: &str = "gateway-test-secret";

pub(crate) fn services(harness: &TestHarness) -> Services {
    Services {
        payments: harness.payments.clone(),
        text: harness.text.clone(),
        push: harness.push.clone(),
        email: harness.email.clone(),
    }
}

pub(crate) fn test_config(harness: &TestHarness) -> PactumConfig {
    let mut config = harness.config.clone();
    config.auth.token_secret = Some(SECRET.to_string());
    config
}

pub(crate) fn test_state(harness: &TestHarness) -> AppState {
    AppState::new(
        &test_config(harness),
        harness.storage.clone(),
        services(harness),
    )
    .unwrap()
}

pub(crate) fn test_router(harness: &TestHarness) -> (Router, AppState) {
    let state = test_state(harness);
    (router(state.clone(), &test_config(harness)), state)
}

pub(crate) fn bearer(state: &AppState, identity: &Identity) -> String {
    format!("Bearer {}", state.signer.issue(identity).unwrap())
}

pub(crate) fn json_request(
    method: &str,
    uri: &str,
    auth: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub(crate) async fn response_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    }
}
