// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session lifecycle: create, assign, close, clear.
//!
//! Every transition is a single storage call that either succeeds or reports
//! why it did not, so two clients racing on the same session see one winner
//! and one clean error.

use std::sync::Arc;

use pactum_core::model::{
    ChatSession, ClearOutcome, CloseOutcome, ConnectionStatus, ParticipantPair, RealtimeEvent,
    SessionKind,
};
use pactum_core::traits::broadcast_to;
use pactum_core::types::normalize_email;
use pactum_core::{
    Broadcaster, Identity, Insertion, PactumError, PushNotifier, Role, Room, StorageAdapter,
};
use tracing::{debug, info, warn};

use crate::access::ensure_access;

/// Coordinates sessions and messages over storage and realtime fan-out.
pub struct ChatManager {
    pub(crate) storage: Arc<dyn StorageAdapter>,
    pub(crate) broadcaster: Arc<dyn Broadcaster>,
    pub(crate) push: Arc<dyn PushNotifier>,
    auto_assign: bool,
}

impl ChatManager {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        broadcaster: Arc<dyn Broadcaster>,
        push: Arc<dyn PushNotifier>,
    ) -> Self {
        Self {
            storage,
            broadcaster,
            push,
            auto_assign: true,
        }
    }

    /// Whether new support sessions are handed to the first available agent.
    pub fn with_auto_assign(mut self, enabled: bool) -> Self {
        self.auto_assign = enabled;
        self
    }

    /// Returns the open session between two users, creating it if they are
    /// allowed to talk.
    ///
    /// Permission comes from an accepted connection, a shared team, or a
    /// contract between the two. The caller must be one of them unless it
    /// is an admin.
    pub async fn create_or_get_session(
        &self,
        actor: &Identity,
        participants: &[String],
    ) -> Result<ChatSession, PactumError> {
        let pair = ParticipantPair::from_list(participants)?;
        if actor.role != Role::Admin && actor.email != pair.first() && actor.email != pair.second()
        {
            return Err(PactumError::Forbidden(
                "caller must be one of the participants".to_string(),
            ));
        }

        if let Some(existing) = self.storage.find_open_session(&pair.key()).await? {
            return Ok(existing);
        }
        self.ensure_may_chat(pair.first(), pair.second()).await?;

        match self
            .storage
            .insert_session(&ChatSession::open(pair.into_kind()))
            .await?
        {
            Insertion::Created(session) => {
                info!(session_id = %session.id, "peer session created");
                let event = RealtimeEvent::SessionCreated {
                    session: session.clone(),
                };
                broadcast_to(self.broadcaster.as_ref(), &user_rooms(&session), &event).await;
                Ok(session)
            }
            Insertion::Existing(session) => {
                debug!(session_id = %session.id, "concurrent create resolved to existing session");
                Ok(session)
            }
        }
    }

    async fn ensure_may_chat(&self, a: &str, b: &str) -> Result<(), PactumError> {
        let accepted = self
            .storage
            .get_connection(a, b)
            .await?
            .is_some_and(|c| c.status == ConnectionStatus::Accepted);
        if accepted
            || self.storage.share_team(a, b).await?
            || self.storage.share_contract(a, b).await?
        {
            return Ok(());
        }
        Err(PactumError::Forbidden(
            "no accepted connection, shared team, or contract between participants".to_string(),
        ))
    }

    /// Returns the user's open support session, opening one if needed.
    pub async fn open_support_session(&self, user: &Identity) -> Result<ChatSession, PactumError> {
        let kind = SessionKind::Support {
            user_email: user.email.clone(),
            agent_email: None,
        };
        if let Some(existing) = self.storage.find_open_session(&kind.participant_key()).await? {
            return Ok(existing);
        }
        let session = match self.storage.insert_session(&ChatSession::open(kind)).await? {
            Insertion::Created(session) => session,
            Insertion::Existing(session) => return Ok(session),
        };
        info!(session_id = %session.id, user = %user.email, "support session opened");
        self.announce_support_session(&session).await;
        Ok(self.maybe_auto_assign(session).await)
    }

    /// Tells the user and every connected agent about a new support session.
    async fn announce_support_session(&self, session: &ChatSession) {
        let event = RealtimeEvent::SessionCreated {
            session: session.clone(),
        };
        let mut rooms = user_rooms(session);
        rooms.extend(
            self.broadcaster
                .available_agents()
                .into_iter()
                .map(Room::Agent),
        );
        broadcast_to(self.broadcaster.as_ref(), &rooms, &event).await;
    }

    async fn maybe_auto_assign(&self, session: ChatSession) -> ChatSession {
        if !self.auto_assign {
            return session;
        }
        match self.auto_assign(&session.id).await {
            Ok(Some(assigned)) => assigned,
            Ok(None) => session,
            Err(e) => {
                warn!(session_id = %session.id, error = %e, "auto-assign failed");
                session
            }
        }
    }

    /// Assigns an unclaimed support session to `agent`.
    pub async fn assign_agent(
        &self,
        session_id: &str,
        agent: &Identity,
    ) -> Result<ChatSession, PactumError> {
        if !agent.is_agent() {
            return Err(PactumError::Forbidden(
                "only agents can take support sessions".to_string(),
            ));
        }
        self.try_assign(session_id, &agent.email)
            .await?
            .ok_or_else(|| {
                PactumError::Conflict("session not found or already assigned".to_string())
            })
    }

    /// Hands the session to the first available agent, if any is online.
    pub async fn auto_assign(&self, session_id: &str) -> Result<Option<ChatSession>, PactumError> {
        let Some(agent) = self.broadcaster.available_agents().into_iter().next() else {
            debug!(session_id, "no agent online for auto-assign");
            return Ok(None);
        };
        self.try_assign(session_id, &agent).await
    }

    async fn try_assign(
        &self,
        session_id: &str,
        agent_email: &str,
    ) -> Result<Option<ChatSession>, PactumError> {
        let agent_email = normalize_email(agent_email);
        let Some(session) = self.storage.assign_agent(session_id, &agent_email).await? else {
            return Ok(None);
        };
        info!(session_id, agent = %agent_email, "agent assigned");
        let event = RealtimeEvent::SessionAssigned {
            session_id: session.id.clone(),
            agent_email: agent_email.clone(),
            session: session.clone(),
        };
        let mut rooms = vec![Room::Session(session.id.clone())];
        rooms.extend(user_rooms(&session));
        rooms.push(Room::Agent(agent_email));
        broadcast_to(self.broadcaster.as_ref(), &rooms, &event).await;
        Ok(Some(session))
    }

    /// Closes a session and archives its messages.
    pub async fn close_session(
        &self,
        session_id: &str,
        actor: &Identity,
    ) -> Result<ChatSession, PactumError> {
        self.accessible_session(session_id, actor).await?;
        match self.storage.close_session(session_id).await? {
            CloseOutcome::Closed { session, archived } => {
                info!(session_id, archived, "session closed");
                let event = RealtimeEvent::SessionClosed {
                    session_id: session.id.clone(),
                    archived,
                };
                self.notify_session(&session, &event).await;
                Ok(session)
            }
            CloseOutcome::AlreadyClosed => {
                Err(PactumError::Conflict("session already closed".to_string()))
            }
            CloseOutcome::NotFound => Err(PactumError::not_found("session", session_id)),
        }
    }

    /// Archives and closes a support session, then opens its successor.
    pub async fn clear_session(
        &self,
        session_id: &str,
        actor: &Identity,
    ) -> Result<ChatSession, PactumError> {
        self.accessible_session(session_id, actor).await?;
        match self.storage.clear_session(session_id).await? {
            ClearOutcome::Cleared {
                previous,
                successor,
                archived,
            } => {
                info!(session_id, successor_id = %successor.id, archived, "support session cleared");
                let event = RealtimeEvent::SessionCleared {
                    session_id: previous.id.clone(),
                    successor_id: successor.id.clone(),
                    successor: successor.clone(),
                };
                self.notify_session(&previous, &event).await;
                Ok(self.maybe_auto_assign(successor).await)
            }
            ClearOutcome::NotSupport => Err(PactumError::InvalidInput(
                "only support sessions can be cleared".to_string(),
            )),
            ClearOutcome::AlreadyClosed => {
                Err(PactumError::Conflict("session already closed".to_string()))
            }
            ClearOutcome::NotFound => Err(PactumError::not_found("session", session_id)),
        }
    }

    pub async fn get_session(
        &self,
        session_id: &str,
        actor: &Identity,
    ) -> Result<ChatSession, PactumError> {
        self.accessible_session(session_id, actor).await
    }

    pub async fn list_sessions_for(&self, actor: &Identity) -> Result<Vec<ChatSession>, PactumError> {
        self.storage.list_sessions_for(&actor.email).await
    }

    /// Support sessions for the agent queue view.
    pub async fn list_support_queue(
        &self,
        actor: &Identity,
        unassigned_only: bool,
    ) -> Result<Vec<ChatSession>, PactumError> {
        if !actor.is_agent() {
            return Err(PactumError::Forbidden(
                "only agents can view the support queue".to_string(),
            ));
        }
        self.storage.list_support_sessions(unassigned_only).await
    }

    /// Loads a session and checks the access rule.
    pub async fn accessible_session(
        &self,
        session_id: &str,
        actor: &Identity,
    ) -> Result<ChatSession, PactumError> {
        let session = self
            .storage
            .get_session(session_id)
            .await?
            .ok_or_else(|| PactumError::not_found("session", session_id))?;
        ensure_access(&session, actor)?;
        Ok(session)
    }

    /// Session room plus every member's user room.
    pub(crate) async fn notify_session(&self, session: &ChatSession, event: &RealtimeEvent) {
        let mut rooms = vec![Room::Session(session.id.clone())];
        rooms.extend(user_rooms(session));
        broadcast_to(self.broadcaster.as_ref(), &rooms, event).await;
    }
}

fn user_rooms(session: &ChatSession) -> Vec<Room> {
    session.audience().into_iter().map(Room::User).collect()
}
