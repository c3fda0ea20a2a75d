// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Room membership and fan-out for live WebSocket connections.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, warn};

use pactum_core::model::RealtimeEvent;
use pactum_core::{Broadcaster, Identity, Room};

use super::presence::PresenceTracker;
use super::typing::TypingTracker;

pub type ConnId = u64;

struct Conn {
    identity: Identity,
    tx: mpsc::Sender<String>,
    rooms: HashSet<String>,
}

/// In-process realtime hub.
///
/// Each connection owns a bounded queue drained by its socket writer task.
/// Delivery never waits on a slow client: a full queue drops the event for
/// that connection only.
pub struct RealtimeHub {
    conns: DashMap<ConnId, Conn>,
    rooms: DashMap<String, HashSet<ConnId>>,
    presence: PresenceTracker,
    typing: TypingTracker,
    next_id: AtomicU64,
    capacity: usize,
}

impl RealtimeHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            conns: DashMap::new(),
            rooms: DashMap::new(),
            presence: PresenceTracker::new(),
            typing: TypingTracker::new(),
            next_id: AtomicU64::new(1),
            capacity: capacity.max(1),
        }
    }

    /// Adds a connection and joins it to its own user room (and agent room
    /// for agents). Returns the id and the queue its writer drains.
    pub async fn register(&self, identity: Identity) -> (ConnId, mpsc::Receiver<String>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.capacity);
        let agent = identity.is_agent();
        let email = identity.email.clone();
        self.conns.insert(
            id,
            Conn {
                identity,
                tx,
                rooms: HashSet::new(),
            },
        );
        self.join(id, &Room::User(email.clone()));
        if agent {
            self.join(id, &Room::Agent(email.clone()));
        }

        if self.presence.connect(&email, agent) {
            info!(conn_id = id, email = %email, "identity online");
            self.announce_presence(&email, true, agent);
        } else {
            debug!(conn_id = id, email = %email, "additional connection");
        }
        (id, rx)
    }

    /// Drops a connection, its memberships, and its typing state.
    pub async fn unregister(&self, id: ConnId) {
        let Some((_, conn)) = self.conns.remove(&id) else {
            return;
        };
        for key in &conn.rooms {
            self.rooms.remove_if_mut(key, |_, members| {
                members.remove(&id);
                members.is_empty()
            });
        }

        let email = conn.identity.email.clone();
        for (session_id, users) in self.typing.remove_everywhere(&email) {
            self.emit_typing(session_id, users);
        }
        if self.presence.disconnect(&email) {
            info!(conn_id = id, email = %email, "identity offline");
            self.announce_presence(&email, false, conn.identity.is_agent());
        }
    }

    /// Adds the connection to `room`. Returns `false` for an unknown connection.
    pub fn join(&self, id: ConnId, room: &Room) -> bool {
        let key = room.key();
        let Some(mut conn) = self.conns.get_mut(&id) else {
            return false;
        };
        if conn.rooms.insert(key.clone()) {
            self.rooms.entry(key).or_default().insert(id);
        }
        true
    }

    pub fn leave(&self, id: ConnId, room: &Room) {
        let key = room.key();
        if let Some(mut conn) = self.conns.get_mut(&id) {
            conn.rooms.remove(&key);
        }
        self.rooms.remove_if_mut(&key, |_, members| {
            members.remove(&id);
            members.is_empty()
        });
    }

    /// Queues a reply for one connection, waiting for queue space instead of
    /// dropping. Returns false once the connection is gone.
    pub async fn reply(&self, id: ConnId, frame: String) -> bool {
        let Some(tx) = self.conns.get(&id).map(|conn| conn.tx.clone()) else {
            return false;
        };
        if tx.send(frame).await.is_err() {
            debug!(conn_id = id, "connection closed before reply");
            return false;
        }
        true
    }

    /// Adds `email` to the typing set of `session_id`, broadcasting on change.
    pub async fn start_typing(&self, session_id: &str, email: &str) {
        if let Some(users) = self.typing.start(session_id, email) {
            self.emit_typing(session_id.to_string(), users);
        }
    }

    pub fn members(&self, room: &Room) -> usize {
        self.rooms.get(&room.key()).map_or(0, |members| members.len())
    }

    pub fn connection_count(&self) -> usize {
        self.conns.len()
    }

    /// Drops every connection queue and clears presence and typing.
    pub fn shutdown(&self) {
        let open = self.conns.len();
        self.conns.clear();
        self.rooms.clear();
        self.presence.clear();
        self.typing.clear();
        info!(open, "realtime hub shut down");
    }

    fn announce_presence(&self, email: &str, online: bool, agent: bool) {
        self.send_all(&RealtimeEvent::Presence {
            email: email.to_string(),
            online,
        });
        if agent {
            self.send_all(&RealtimeEvent::AgentAvailability {
                agents: self.presence.agents(),
            });
        }
    }

    fn emit_typing(&self, session_id: String, users: Vec<String>) {
        let room = Room::Session(session_id.clone());
        self.send_room(&room, &RealtimeEvent::Typing { session_id, users });
    }

    fn send_room(&self, room: &Room, event: &RealtimeEvent) {
        let Some(frame) = encode(event) else {
            return;
        };
        // Clone senders out so no map guard is held while queueing.
        let ids: Vec<ConnId> = match self.rooms.get(&room.key()) {
            Some(members) => members.iter().copied().collect(),
            None => return,
        };
        let targets: Vec<(ConnId, mpsc::Sender<String>)> = ids
            .into_iter()
            .filter_map(|id| self.conns.get(&id).map(|conn| (id, conn.tx.clone())))
            .collect();
        debug!(room = %room, event = event.name(), recipients = targets.len(), "broadcast");
        for (id, tx) in targets {
            deliver(id, &tx, frame.clone());
        }
    }

    fn send_all(&self, event: &RealtimeEvent) {
        let Some(frame) = encode(event) else {
            return;
        };
        let targets: Vec<(ConnId, mpsc::Sender<String>)> = self
            .conns
            .iter()
            .map(|entry| (*entry.key(), entry.tx.clone()))
            .collect();
        for (id, tx) in targets {
            deliver(id, &tx, frame.clone());
        }
    }
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new(64)
    }
}

fn encode(event: &RealtimeEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(frame) => Some(frame),
        Err(e) => {
            error!(event = event.name(), error = %e, "failed to encode realtime event");
            None
        }
    }
}

fn deliver(id: ConnId, tx: &mpsc::Sender<String>, frame: String) {
    match tx.try_send(frame) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            warn!(conn_id = id, "connection queue full, dropping event");
        }
        Err(TrySendError::Closed(_)) => {
            debug!(conn_id = id, "connection closed before delivery");
        }
    }
}

#[async_trait]
impl Broadcaster for RealtimeHub {
    async fn broadcast(&self, room: &Room, event: &RealtimeEvent) {
        self.send_room(room, event);
    }

    async fn broadcast_all(&self, event: &RealtimeEvent) {
        self.send_all(event);
    }

    fn is_online(&self, email: &str) -> bool {
        self.presence.is_online(email)
    }

    fn available_agents(&self) -> Vec<String> {
        self.presence.agents()
    }

    async fn stop_typing(&self, session_id: &str, email: &str) {
        if let Some(users) = self.typing.stop(session_id, email) {
            self.emit_typing(session_id.to_string(), users);
        }
    }
}
