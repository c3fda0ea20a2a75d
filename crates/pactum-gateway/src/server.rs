// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    Router,
    http::HeaderValue,
    middleware as axum_middleware,
    routing::{get, patch, post, put},
};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use pactum_chat::{ChatManager, ConnectionService, TeamService};
use pactum_config::PactumConfig;
use pactum_contracts::{ContractAssistant, ContractService, EscrowLedger, WalletService};
use pactum_core::{
    Broadcaster, EmailSender, PactumError, PaymentProcessor, PushNotifier, StorageAdapter,
    TextGenerator,
};

use crate::auth::{TokenSigner, auth_middleware};
use crate::handlers;
use crate::realtime::{RealtimeHub, ws};

/// External integrations the gateway wires into its services.
#[derive(Clone)]
pub struct Services {
    pub payments: Arc<dyn PaymentProcessor>,
    pub text: Arc<dyn TextGenerator>,
    pub push: Arc<dyn PushNotifier>,
    pub email: Arc<dyn EmailSender>,
}

/// Shared state for axum request handlers and WebSocket connections.
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatManager>,
    pub connections: Arc<ConnectionService>,
    pub teams: Arc<TeamService>,
    pub contracts: Arc<ContractService>,
    pub escrow: Arc<EscrowLedger>,
    pub wallet: Arc<WalletService>,
    pub assistant: Arc<ContractAssistant>,
    pub storage: Arc<dyn StorageAdapter>,
    pub hub: Arc<RealtimeHub>,
    pub signer: TokenSigner,
    pub max_frame_bytes: usize,
    pub started: Instant,
}

impl AppState {
    /// Builds every domain service around one hub. Requires `auth.token_secret`.
    pub fn new(
        config: &PactumConfig,
        storage: Arc<dyn StorageAdapter>,
        services: Services,
    ) -> Result<Self, PactumError> {
        let secret = config
            .auth
            .token_secret
            .as_deref()
            .ok_or_else(|| PactumError::Config("auth.token_secret is not set".to_string()))?;
        let signer = TokenSigner::new(secret, config.auth.token_ttl_secs)?;

        let hub = Arc::new(RealtimeHub::new(config.realtime.channel_capacity));
        let broadcaster: Arc<dyn Broadcaster> = hub.clone();
        let currency = config.payments.currency.as_str();

        let chat = ChatManager::new(storage.clone(), broadcaster.clone(), services.push)
            .with_auto_assign(config.realtime.auto_assign);

        Ok(Self {
            chat: Arc::new(chat),
            connections: Arc::new(ConnectionService::new(storage.clone(), broadcaster.clone())),
            teams: Arc::new(TeamService::new(storage.clone())),
            contracts: Arc::new(ContractService::new(
                storage.clone(),
                broadcaster.clone(),
                services.email,
                currency,
            )),
            escrow: Arc::new(EscrowLedger::new(
                storage.clone(),
                broadcaster,
                services.payments.clone(),
            )),
            wallet: Arc::new(WalletService::new(storage.clone(), services.payments, currency)),
            assistant: Arc::new(ContractAssistant::new(
                storage.clone(),
                services.text,
                config.ai.max_tokens,
            )),
            storage,
            hub,
            signer,
            max_frame_bytes: config.realtime.max_frame_bytes,
            started: Instant::now(),
        })
    }
}

/// Builds the full application router.
///
/// `/v1/health` and `/v1/ws` are public (the socket authenticates during the
/// handshake); everything else sits behind the bearer-token middleware.
pub fn router(state: AppState, config: &PactumConfig) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health::get_health))
        .route("/ws", get(ws::ws_handler));

    let api_routes = Router::new()
        // Sessions
        .route(
            "/sessions",
            post(handlers::sessions::create_session).get(handlers::sessions::list_sessions),
        )
        .route(
            "/sessions/support",
            post(handlers::sessions::open_support).get(handlers::sessions::support_queue),
        )
        .route("/sessions/{id}", get(handlers::sessions::get_session))
        .route("/sessions/{id}/assign", post(handlers::sessions::assign))
        .route("/sessions/{id}/close", post(handlers::sessions::close))
        .route("/sessions/{id}/clear", post(handlers::sessions::clear))
        .route(
            "/sessions/{id}/messages",
            get(handlers::sessions::history).post(handlers::sessions::send_message),
        )
        .route("/sessions/{id}/read", post(handlers::sessions::mark_read))
        .route("/sessions/{id}/archive", get(handlers::sessions::archive))
        .route("/messages/{id}/reactions", post(handlers::sessions::react))
        .route(
            "/messages/{id}",
            patch(handlers::sessions::edit_message)
                .delete(handlers::sessions::delete_message),
        )
        // Connections
        .route("/connections", get(handlers::connections::list))
        .route("/connections/invite", post(handlers::connections::invite))
        .route("/connections/accept", post(handlers::connections::accept))
        .route("/connections/reject", post(handlers::connections::reject))
        .route("/connections/statuses", post(handlers::connections::statuses))
        // Teams
        .route(
            "/teams",
            post(handlers::teams::create).get(handlers::teams::list),
        )
        .route("/teams/{id}/members", post(handlers::teams::add_member))
        // Contracts
        .route("/contracts", get(handlers::contracts::list))
        .route("/contracts/draft", post(handlers::contracts::draft))
        .route("/contracts/send", post(handlers::contracts::send))
        .route("/contracts/sign", post(handlers::contracts::sign))
        .route(
            "/contracts/{id}",
            get(handlers::contracts::get).patch(handlers::contracts::update),
        )
        .route("/contracts/{id}/summary", post(handlers::contracts::summary))
        .route("/contracts/{id}/review", post(handlers::contracts::review))
        // Escrow
        .route(
            "/create-payment-intent",
            post(handlers::escrow::create_payment_intent),
        )
        .route("/escrow/confirm", post(handlers::escrow::confirm))
        .route("/release-funds", post(handlers::escrow::release))
        .route("/escrow/local-payment", post(handlers::escrow::local_payment))
        // Wallet
        .route("/wallet/summary", get(handlers::wallet::summary))
        .route("/wallet/transactions", get(handlers::wallet::transactions))
        .route("/wallet/onboard", post(handlers::wallet::onboard))
        .route("/wallet/withdraw", post(handlers::wallet::withdraw))
        // Profile
        .route("/profile/push-token", put(handlers::profile::set_push_token))
        .route_layer(axum_middleware::from_fn_with_state(
            state.signer.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/v1", public_routes.merge(api_routes))
        .with_state(state)
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(cors_layer(&config.server.cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(origin = %origin, error = %e, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Binds `server.host:server.port` and serves until `shutdown` is cancelled.
pub async fn serve(
    config: &PactumConfig,
    state: AppState,
    shutdown: CancellationToken,
) -> Result<(), PactumError> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| PactumError::Config(format!("failed to bind gateway to {addr}: {e}")))?;
    serve_listener(listener, config, state, shutdown).await
}

/// Serves on an already-bound listener, then closes the hub.
pub async fn serve_listener(
    listener: tokio::net::TcpListener,
    config: &PactumConfig,
    state: AppState,
    shutdown: CancellationToken,
) -> Result<(), PactumError> {
    let hub = state.hub.clone();
    let app = router(state, config);
    match listener.local_addr() {
        Ok(addr) => info!(addr = %addr, "gateway listening"),
        Err(e) => warn!(error = %e, "gateway listening on unknown address"),
    }

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| PactumError::Internal(format!("gateway server error: {e}")));

    hub.shutdown();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pactum_test_utils::TestHarness;

    use crate::testing::services;

    #[tokio::test]
    async fn state_requires_token_secret() {
        let harness = TestHarness::new().await.unwrap();
        let err = AppState::new(&harness.config, harness.storage.clone(), services(&harness))
            .err()
            .unwrap();
        assert!(matches!(err, PactumError::Config(ref m) if m.contains("token_secret")));
    }

    #[test]
    fn cors_skips_invalid_origins() {
        let _ = cors_layer(&["https://app.pactum.io".into(), "bad\norigin".into()]);
        let _ = cors_layer(&[]);
    }
}
