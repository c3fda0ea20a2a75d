// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fan-out seam between domain services and the realtime gateway.

use async_trait::async_trait;

use crate::model::RealtimeEvent;
use crate::types::Room;

/// Delivers events to connected clients and answers presence questions.
///
/// Delivery is best effort: members that have disconnected are skipped and
/// nothing is persisted or replayed.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Sends `event` to every current member of `room`.
    async fn broadcast(&self, room: &Room, event: &RealtimeEvent);

    /// Sends `event` to every connection.
    async fn broadcast_all(&self, event: &RealtimeEvent);

    /// Whether `email` has at least one live connection.
    fn is_online(&self, email: &str) -> bool;

    /// Connected agents, sorted; the first entry is the first available agent.
    fn available_agents(&self) -> Vec<String>;

    /// Drops `email` from the typing set of `session_id`.
    async fn stop_typing(&self, _session_id: &str, _email: &str) {}
}

/// Broadcasts to each room in turn.
pub async fn broadcast_to(broadcaster: &dyn Broadcaster, rooms: &[Room], event: &RealtimeEvent) {
    for room in rooms {
        broadcaster.broadcast(room, event).await;
    }
}
