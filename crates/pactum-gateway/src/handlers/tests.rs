// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use pactum_core::Identity;
use pactum_test_utils::TestHarness;

use crate::testing::{bearer, json_request, response_json, test_router};

#[tokio::test]
async fn health_is_public() {
    let harness = TestHarness::new().await.unwrap();
    let (app, _) = test_router(&harness);

    let response = app
        .oneshot(json_request("GET", "/v1/health", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"]["status"], "healthy");
    assert_eq!(body["storage"]["backend"], "sqlite");
    assert_eq!(body["connections"], 0);
}

#[tokio::test]
async fn api_requires_a_valid_token() {
    let harness = TestHarness::new().await.unwrap();
    let (app, _) = test_router(&harness);

    let response = app
        .clone()
        .oneshot(json_request("GET", "/v1/sessions", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response_json(response).await["error"], "unauthorized");

    let response = app
        .oneshot(json_request("GET", "/v1/sessions", Some("Bearer nope"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn websocket_upgrade_without_token_is_rejected() {
    let harness = TestHarness::new().await.unwrap();
    let (app, _) = test_router(&harness);
    let response = app
        .oneshot(json_request("GET", "/v1/ws", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn peer_session_needs_a_relationship() {
    let harness = TestHarness::new().await.unwrap();
    let (app, state) = test_router(&harness);
    let alice = bearer(&state, &Identity::user("alice@x.io"));
    let body = json!({"participants": ["alice@x.io", "bob@x.io"]});

    let response = app
        .clone()
        .oneshot(json_request("POST", "/v1/sessions", Some(&alice), Some(body.clone())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(response_json(response).await["error"], "forbidden");

    harness.connect("alice@x.io", "bob@x.io").await.unwrap();
    let response = app
        .clone()
        .oneshot(json_request("POST", "/v1/sessions", Some(&alice), Some(body.clone())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let first = response_json(response).await;

    let response = app
        .oneshot(json_request("POST", "/v1/sessions", Some(&alice), Some(body)))
        .await
        .unwrap();
    assert_eq!(response_json(response).await["id"], first["id"]);
}

#[tokio::test]
async fn messages_round_trip_through_rest() {
    let harness = TestHarness::new().await.unwrap();
    harness.connect("alice@x.io", "bob@x.io").await.unwrap();
    let (app, state) = test_router(&harness);
    let alice = bearer(&state, &Identity::user("alice@x.io"));
    let bob = bearer(&state, &Identity::user("bob@x.io"));
    let mallory = bearer(&state, &Identity::user("mallory@x.io"));

    let session = response_json(
        app.clone()
            .oneshot(json_request(
                "POST",
                "/v1/sessions",
                Some(&alice),
                Some(json!({"participants": ["alice@x.io", "bob@x.io"]})),
            ))
            .await
            .unwrap(),
    )
    .await;
    let id = session["id"].as_str().unwrap();
    let messages_uri = format!("/v1/sessions/{id}/messages");

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &messages_uri,
            Some(&alice),
            Some(json!({"text": "hello", "clientId": "c-1"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let message = response_json(response).await;
    assert_eq!(message["status"], "sent");

    let response = app
        .clone()
        .oneshot(json_request("POST", &messages_uri, Some(&alice), Some(json!({"text": "  "}))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(json_request("GET", &messages_uri, Some(&mallory), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/v1/sessions/{id}/read"),
            Some(&bob),
            Some(json!({})),
        ))
        .await
        .unwrap();
    assert_eq!(response_json(response).await["messageIds"], json!([message["id"]]));

    let history = response_json(
        app.oneshot(json_request("GET", &messages_uri, Some(&bob), None))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["status"], "read");
}

#[tokio::test]
async fn support_queue_is_for_agents() {
    let harness = TestHarness::new().await.unwrap();
    let (app, state) = test_router(&harness);
    let user = bearer(&state, &Identity::user("alice@x.io"));
    let agent = bearer(&state, &Identity::agent("amy@x.io"));

    let session = response_json(
        app.clone()
            .oneshot(json_request("POST", "/v1/sessions/support", Some(&user), None))
            .await
            .unwrap(),
    )
    .await;

    let response = app
        .clone()
        .oneshot(json_request("GET", "/v1/sessions/support?unassigned=true", Some(&user), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let queue = response_json(
        app.clone()
            .oneshot(json_request("GET", "/v1/sessions/support?unassigned=true", Some(&agent), None))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(queue[0]["id"], session["id"]);

    let assign_uri = format!("/v1/sessions/{}/assign", session["id"].as_str().unwrap());
    let response = app
        .clone()
        .oneshot(json_request("POST", &assign_uri, Some(&agent), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let other = bearer(&state, &Identity::agent("zed@x.io"));
    let response = app
        .oneshot(json_request("POST", &assign_uri, Some(&other), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn contract_lifecycle_over_rest() {
    let harness = TestHarness::builder()
        .with_completions(vec!["A logo for 100 USD.".into()])
        .build()
        .await
        .unwrap();
    let (app, state) = test_router(&harness);
    let alice = bearer(&state, &Identity::user("alice@x.io"));
    let bob = bearer(&state, &Identity::user("bob@x.io"));

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/contracts/send",
            Some(&alice),
            Some(json!({"title": "Logo", "signature": "alice-sig"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(
        body["missingFields"],
        json!(["recipient", "description", "amount", "deadline"])
    );

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/contracts/send",
            Some(&alice),
            Some(json!({
                "recipient": {"name": "Bob", "email": "bob@x.io"},
                "title": "Logo",
                "description": "Design a logo",
                "amount": 100.0,
                "deadline": "2026-12-01",
                "signature": "alice-sig"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let sent = response_json(response).await;
    assert_eq!(sent["status"], "sent");
    let id = sent["id"].as_str().unwrap().to_string();

    let sign = json!({"contractId": id, "role": "recipient", "signature": "bob-sig"});
    let response = app
        .clone()
        .oneshot(json_request("POST", "/v1/contracts/sign", Some(&bob), Some(sign.clone())))
        .await
        .unwrap();
    assert_eq!(response_json(response).await["status"], "signed");

    let response = app
        .clone()
        .oneshot(json_request("POST", "/v1/contracts/sign", Some(&bob), Some(sign)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(json_request("POST", &format!("/v1/contracts/{id}/summary"), Some(&bob), None))
        .await
        .unwrap();
    assert_eq!(response_json(response).await["summary"], "A logo for 100 USD.");

    harness.text.set_failing(true);
    let response = app
        .oneshot(json_request("POST", &format!("/v1/contracts/{id}/review"), Some(&bob), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(response_json(response).await["error"], "upstream_service_error");
}

#[tokio::test]
async fn escrow_and_wallet_over_rest() {
    let harness = TestHarness::new().await.unwrap();
    let (app, state) = test_router(&harness);
    let alice_id = Identity::user("alice@x.io");
    let alice = bearer(&state, &alice_id);
    let bob = bearer(&state, &Identity::user("bob@x.io"));

    let sent = response_json(
        app.clone()
            .oneshot(json_request(
                "POST",
                "/v1/contracts/send",
                Some(&alice),
                Some(json!({
                    "recipient": {"name": "Bob", "email": "bob@x.io"},
                    "title": "Logo",
                    "description": "Design a logo",
                    "amount": 100.0,
                    "deadline": "2026-12-01",
                    "signature": "alice-sig"
                })),
            ))
            .await
            .unwrap(),
    )
    .await;
    let id = sent["id"].as_str().unwrap().to_string();

    // Funding before the recipient signs conflicts.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/create-payment-intent",
            Some(&alice),
            Some(json!({"contractId": id})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    app.clone()
        .oneshot(json_request(
            "POST",
            "/v1/contracts/sign",
            Some(&bob),
            Some(json!({"contractId": id, "role": "recipient", "signature": "bob-sig"})),
        ))
        .await
        .unwrap();

    let intent = response_json(
        app.clone()
            .oneshot(json_request(
                "POST",
                "/v1/create-payment-intent",
                Some(&alice),
                Some(json!({"contractId": id})),
            ))
            .await
            .unwrap(),
    )
    .await;
    assert!(intent["clientSecret"].as_str().unwrap().ends_with("_secret"));

    let funded = response_json(
        app.clone()
            .oneshot(json_request(
                "POST",
                "/v1/escrow/confirm",
                Some(&alice),
                Some(json!({"contractId": id, "amount": 100.0, "reference": intent["id"]})),
            ))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(funded["escrowStatus"], "funded");

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/release-funds",
            Some(&bob),
            Some(json!({"contractId": id})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let released = response_json(
        app.clone()
            .oneshot(json_request(
                "POST",
                "/v1/release-funds",
                Some(&alice),
                Some(json!({"contractId": id, "amount": 40.0})),
            ))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(released["escrowStatus"], "partially_released");
    assert_eq!(released["releasedAmount"], 40.0);

    let summary = response_json(
        app.clone()
            .oneshot(json_request("GET", "/v1/wallet/summary", Some(&bob), None))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(summary["available"], 40.0);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/wallet/withdraw",
            Some(&bob),
            Some(json!({"amount": 10.0})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    app.clone()
        .oneshot(json_request("POST", "/v1/wallet/onboard", Some(&bob), None))
        .await
        .unwrap();
    let response = app
        .oneshot(json_request(
            "POST",
            "/v1/wallet/withdraw",
            Some(&bob),
            Some(json!({"amount": 10.0})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["amount"], 10.0);
}

#[tokio::test]
async fn push_token_can_be_set_and_cleared() {
    let harness = TestHarness::new().await.unwrap();
    let (app, state) = test_router(&harness);
    let alice = bearer(&state, &Identity::user("alice@x.io"));

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/v1/profile/push-token",
            Some(&alice),
            Some(json!({"token": "expo-token-1"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let profile = harness.storage.get_profile("alice@x.io").await.unwrap().unwrap();
    assert_eq!(profile.push_token.as_deref(), Some("expo-token-1"));

    app.oneshot(json_request(
        "PUT",
        "/v1/profile/push-token",
        Some(&alice),
        Some(json!({"token": ""})),
    ))
    .await
    .unwrap();
    let profile = harness.storage.get_profile("alice@x.io").await.unwrap().unwrap();
    assert!(profile.push_token.is_none());
}

#[tokio::test]
async fn malformed_bodies_get_json_errors() {
    let harness = TestHarness::new().await.unwrap();
    let (app, state) = test_router(&harness);
    let alice = bearer(&state, &Identity::user("alice@x.io"));

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/contracts/sign",
            Some(&alice),
            Some(json!({"contractId": "x"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "application/json"
    );
    let body = response_json(response).await;
    assert_eq!(body["error"], "invalid_input");
    assert!(body["message"].as_str().unwrap().contains("role"));

    // Broken JSON and a missing content type take the same path.
    let broken = axum::http::Request::builder()
        .method("POST")
        .uri("/v1/escrow/confirm")
        .header("authorization", alice.as_str())
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{\"contractId\":"))
        .unwrap();
    let response = app.clone().oneshot(broken).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(response).await["error"], "invalid_input");

    let untyped = axum::http::Request::builder()
        .method("POST")
        .uri("/v1/teams")
        .header("authorization", alice.as_str())
        .body(axum::body::Body::from("{\"name\":\"crew\"}"))
        .unwrap();
    let response = app.oneshot(untyped).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(response).await["error"], "invalid_input");
}
