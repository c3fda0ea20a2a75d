// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Realtime side of the gateway: the hub, presence and typing trackers,
//! and the per-connection WebSocket loop.

pub mod dispatch;
pub mod hub;
pub mod presence;
pub mod typing;
pub mod ws;

pub use hub::{ConnId, RealtimeHub};
pub use presence::PresenceTracker;
pub use typing::TypingTracker;
