// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recording broadcaster for deterministic testing.
//!
//! `MockBroadcaster` implements `Broadcaster` by capturing every emitted
//! event with its room, and answers presence questions from a set the test
//! controls.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use pactum_core::model::RealtimeEvent;
use pactum_core::{Broadcaster, Room};

/// Where a captured event was sent.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Room(Room),
    All,
}

#[derive(Default)]
struct State {
    sent: Vec<(Target, RealtimeEvent)>,
    online: BTreeSet<String>,
    agents: BTreeSet<String>,
    stopped_typing: Vec<(String, String)>,
}

/// A broadcaster that records instead of delivering.
#[derive(Default)]
pub struct MockBroadcaster {
    state: Mutex<State>,
}

impl MockBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Mark a user online or offline.
    pub fn set_online(&self, email: &str, online: bool) {
        let mut state = self.state();
        if online {
            state.online.insert(email.to_string());
        } else {
            state.online.remove(email);
            state.agents.remove(email);
        }
    }

    /// Mark an agent as connected; agents are online too.
    pub fn connect_agent(&self, email: &str) {
        let mut state = self.state();
        state.online.insert(email.to_string());
        state.agents.insert(email.to_string());
    }

    /// Every captured event, in emission order.
    pub fn sent(&self) -> Vec<(Target, RealtimeEvent)> {
        self.state().sent.clone()
    }

    /// Captured events with the given wire name.
    pub fn events_named(&self, name: &str) -> Vec<RealtimeEvent> {
        self.state()
            .sent
            .iter()
            .filter(|(_, event)| event.name() == name)
            .map(|(_, event)| event.clone())
            .collect()
    }

    /// Rooms that received an event with the given wire name.
    pub fn rooms_for(&self, name: &str) -> Vec<Room> {
        self.state()
            .sent
            .iter()
            .filter_map(|(target, event)| match target {
                Target::Room(room) if event.name() == name => Some(room.clone()),
                _ => None,
            })
            .collect()
    }

    /// `(session_id, email)` pairs passed to `stop_typing`.
    pub fn stopped_typing(&self) -> Vec<(String, String)> {
        self.state().stopped_typing.clone()
    }

    pub fn sent_count(&self) -> usize {
        self.state().sent.len()
    }

    pub fn clear(&self) {
        let mut state = self.state();
        state.sent.clear();
        state.stopped_typing.clear();
    }
}

#[async_trait]
impl Broadcaster for MockBroadcaster {
    async fn broadcast(&self, room: &Room, event: &RealtimeEvent) {
        self.state()
            .sent
            .push((Target::Room(room.clone()), event.clone()));
    }

    async fn broadcast_all(&self, event: &RealtimeEvent) {
        self.state().sent.push((Target::All, event.clone()));
    }

    fn is_online(&self, email: &str) -> bool {
        self.state().online.contains(email)
    }

    fn available_agents(&self) -> Vec<String> {
        self.state().agents.iter().cloned().collect()
    }

    async fn stop_typing(&self, session_id: &str, email: &str) {
        self.state()
            .stopped_typing
            .push((session_id.to_string(), email.to_string()));
    }
}
