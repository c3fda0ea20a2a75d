// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reference-counted presence: an identity is online from its first
//! connection until its last one closes.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

#[derive(Debug, Default)]
pub struct PresenceTracker {
    counts: DashMap<String, Slot>,
}

#[derive(Debug)]
struct Slot {
    connections: usize,
    agent: bool,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a connection. Returns `true` when the identity just came online.
    pub fn connect(&self, email: &str, agent: bool) -> bool {
        let mut slot = self.counts.entry(email.to_string()).or_insert(Slot {
            connections: 0,
            agent,
        });
        slot.connections += 1;
        slot.agent |= agent;
        slot.connections == 1
    }

    /// Records a disconnect. Returns `true` when the identity just went offline.
    pub fn disconnect(&self, email: &str) -> bool {
        match self.counts.entry(email.to_string()) {
            Entry::Occupied(mut occupied) => {
                let slot = occupied.get_mut();
                slot.connections = slot.connections.saturating_sub(1);
                if slot.connections == 0 {
                    occupied.remove();
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(_) => false,
        }
    }

    pub fn is_online(&self, email: &str) -> bool {
        self.counts.contains_key(email)
    }

    pub fn connections(&self, email: &str) -> usize {
        self.counts.get(email).map_or(0, |slot| slot.connections)
    }

    /// Online agents in sorted order.
    pub fn agents(&self) -> Vec<String> {
        let mut agents: Vec<String> = self
            .counts
            .iter()
            .filter(|entry| entry.agent)
            .map(|entry| entry.key().clone())
            .collect();
        agents.sort();
        agents
    }

    pub fn clear(&self) {
        self.counts.clear();
    }
}
