// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns SIGINT / SIGTERM into a cancelled [`CancellationToken`].

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Interrupt,
    Terminate,
}

/// Returns a token that is cancelled on the first SIGINT or SIGTERM.
///
/// The watcher task also exits if the token is cancelled by someone else.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        let signal = tokio::select! {
            signal = next_signal() => signal,
            () = trigger.cancelled() => {
                debug!("shutdown already requested, signal watcher exiting");
                return;
            }
        };
        info!(?signal, "shutdown requested, draining connections");
        trigger.cancel();
    });

    token
}

async fn next_signal() -> Signal {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                return tokio::select! {
                    _ = term.recv() => Signal::Terminate,
                    signal = interrupt() => signal,
                };
            }
            Err(e) => warn!(error = %e, "cannot watch SIGTERM, only Ctrl+C will stop the server"),
        }
    }
    interrupt().await
}

async fn interrupt() -> Signal {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // Without a handler there is nothing to wait for; never resolve.
        warn!(error = %e, "cannot watch Ctrl+C");
        std::future::pending::<()>().await;
    }
    Signal::Interrupt
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn token_starts_live_and_watcher_yields_to_manual_cancel() {
        let token = install_signal_handler();
        assert!(!token.is_cancelled());
        token.cancel();
        tokio::time::timeout(Duration::from_secs(1), token.cancelled())
            .await
            .unwrap();
    }
}
