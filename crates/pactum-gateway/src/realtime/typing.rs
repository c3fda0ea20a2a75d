// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ephemeral "who is typing" sets, one per session.

use std::collections::BTreeSet;

use dashmap::DashMap;

#[derive(Debug, Default)]
pub struct TypingTracker {
    sessions: DashMap<String, BTreeSet<String>>,
}

impl TypingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `email` to the session's set. Returns the new set if it changed.
    pub fn start(&self, session_id: &str, email: &str) -> Option<Vec<String>> {
        let mut users = self.sessions.entry(session_id.to_string()).or_default();
        users
            .insert(email.to_string())
            .then(|| users.iter().cloned().collect())
    }

    /// Removes `email` from the session's set. Returns the new set if it changed.
    pub fn stop(&self, session_id: &str, email: &str) -> Option<Vec<String>> {
        let mut users = self.sessions.get_mut(session_id)?;
        if !users.remove(email) {
            return None;
        }
        let remaining: Vec<String> = users.iter().cloned().collect();
        let empty = users.is_empty();
        drop(users);
        if empty {
            self.sessions.remove_if(session_id, |_, set| set.is_empty());
        }
        Some(remaining)
    }

    /// Removes `email` everywhere. Returns each affected session with its new set.
    pub fn remove_everywhere(&self, email: &str) -> Vec<(String, Vec<String>)> {
        let keys: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| entry.contains(email))
            .map(|entry| entry.key().clone())
            .collect();
        keys.into_iter()
            .filter_map(|session_id| {
                self.stop(&session_id, email)
                    .map(|users| (session_id, users))
            })
            .collect()
    }

    pub fn users(&self, session_id: &str) -> Vec<String> {
        self.sessions
            .get(session_id)
            .map(|users| users.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        self.sessions.clear();
    }
}
