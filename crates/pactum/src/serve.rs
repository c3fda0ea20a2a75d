// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `pactum serve`: wires storage, integrations, and the gateway together.

use std::sync::Arc;

use tracing::{info, warn};

use pactum_config::PactumConfig;
use pactum_contracts::{
    HttpTextGenerator, LogOnlyEmail, LogOnlyPayments, LogOnlyPush, UnconfiguredTextGenerator,
};
use pactum_core::traits::TextGenerator;
use pactum_core::{PactumError, StorageAdapter};
use pactum_gateway::{AppState, Services};
use pactum_storage::SqliteStorage;

use crate::shutdown;

pub async fn run_serve(config: PactumConfig) -> Result<(), PactumError> {
    init_tracing(&config.server.log_level);

    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;
    info!(path = %config.storage.database_path, "storage ready");

    let services = build_services(&config)?;
    let storage: Arc<dyn StorageAdapter> = storage;
    let state = AppState::new(&config, storage.clone(), services)?;

    let cancel = shutdown::install_signal_handler();
    let served = pactum_gateway::serve(&config, state, cancel).await;

    if let Err(e) = storage.close().await {
        warn!(error = %e, "storage did not close cleanly");
    }
    info!("pactum stopped");
    served
}

/// Picks the integration behind each service seam.
///
/// Only text generation has a real client; push, email, and payments log.
pub fn build_services(config: &PactumConfig) -> Result<Services, PactumError> {
    let text: Arc<dyn TextGenerator> = match config.ai.api_key.as_deref() {
        Some(key) if !key.is_empty() => {
            let generator = HttpTextGenerator::new(&config.ai)?;
            info!(model = %generator.model(), "text generation enabled");
            Arc::new(generator)
        }
        _ => {
            warn!("ai.api_key not set, contract summaries and reviews are disabled");
            Arc::new(UnconfiguredTextGenerator)
        }
    };
    if config.payments.sandbox {
        warn!("payments running in sandbox mode");
    }
    if !config.notifications.push_enabled {
        info!("push notifications are log-only");
    }

    Ok(Services {
        payments: Arc::new(LogOnlyPayments::new(config.payments.sandbox)),
        text,
        push: Arc::new(LogOnlyPush),
        email: Arc::new(LogOnlyEmail::new(&config.notifications.email_from)),
    })
}

/// Initializes the tracing subscriber; `RUST_LOG` overrides the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pactum={log_level},warn")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .try_init();
}
