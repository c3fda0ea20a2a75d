// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP and WebSocket gateway for Pactum.
//!
//! The REST surface lives under `/v1` behind bearer-token auth. The realtime
//! side is an in-process [`realtime::RealtimeHub`] that implements
//! [`pactum_core::Broadcaster`], so domain services fan out through it
//! without knowing about sockets.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod realtime;
pub mod server;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::{AuthError, TokenSigner};
pub use error::{ApiError, ApiJson};
pub use realtime::RealtimeHub;
pub use server::{AppState, Services, router, serve, serve_listener};
