// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message operations on a session: send, read receipts, reactions, edits.

use serde::Deserialize;
use tracing::{debug, warn};

use pactum_core::model::{
    ArchivedMessage, ChatSession, FileKind, Message, MessageStatus, NewMessage, RealtimeEvent,
    Reaction, SenderKind, SessionKind,
};
use pactum_core::traits::broadcast_to;
use pactum_core::{Identity, Insertion, PactumError, Room};

use crate::manager::ChatManager;

/// A message as submitted by a client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessage {
    pub session_id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub file_type: Option<FileKind>,
}

const NOT_OWNED: &str = "message not found or not owned by sender";

impl ChatManager {
    /// Stores a message and fans it out.
    ///
    /// Re-sending with a known `client_id` returns the stored message and
    /// broadcasts nothing. An agent writing into an unclaimed support session
    /// claims it first.
    pub async fn send_message(
        &self,
        actor: &Identity,
        input: SendMessage,
    ) -> Result<Message, PactumError> {
        let mut session = self.accessible_session(&input.session_id, actor).await?;
        if !session.is_open() {
            return Err(PactumError::Conflict("session is closed".to_string()));
        }
        let text = input.text.trim().to_string();
        let file_url = input.file_url.filter(|url| !url.trim().is_empty());
        if text.is_empty() && file_url.is_none() {
            return Err(PactumError::InvalidInput(
                "message text is required unless a file is attached".to_string(),
            ));
        }

        let from = sender_kind(&session, actor);
        if from == SenderKind::Agent && session.agent_email().is_none() {
            session = self.assign_agent(&session.id, actor).await?;
        }

        let recipient = session.kind.counterpart(&actor.email).map(str::to_string);
        let recipient_online = recipient
            .as_deref()
            .is_some_and(|r| self.broadcaster.is_online(r));
        let file_type = match (&file_url, input.file_type) {
            (Some(_), Some(kind)) => Some(kind),
            (Some(url), None) => Some(FileKind::classify(url)),
            (None, _) => None,
        };

        let new = NewMessage {
            session_id: session.id.clone(),
            sender: actor.email.clone(),
            from,
            text,
            client_id: input.client_id.filter(|c| !c.is_empty()),
            file_url,
            file_type,
            status: if recipient_online {
                MessageStatus::Delivered
            } else {
                MessageStatus::Sent
            },
        };
        let message = match self.storage.insert_message(&new).await? {
            Some(Insertion::Created(message)) => message,
            Some(Insertion::Existing(message)) => {
                debug!(message_id = %message.id, "duplicate client id, returning stored message");
                return Ok(message);
            }
            None => return Err(PactumError::Conflict("session is closed".to_string())),
        };

        self.broadcaster.stop_typing(&session.id, &actor.email).await;

        let mut rooms = vec![Room::Session(session.id.clone())];
        match &recipient {
            Some(recipient) => rooms.push(Room::User(recipient.clone())),
            // Unclaimed support session: every connected agent hears about it.
            None => rooms.extend(
                self.broadcaster
                    .available_agents()
                    .into_iter()
                    .map(Room::Agent),
            ),
        }
        broadcast_to(
            self.broadcaster.as_ref(),
            &rooms,
            &RealtimeEvent::NewMessage(message.clone()),
        )
        .await;

        if let Some(recipient) = recipient.filter(|_| !recipient_online) {
            self.push_offline(&recipient, &message).await;
        }
        Ok(message)
    }

    /// Best effort: push failures are logged, never returned.
    async fn push_offline(&self, recipient: &str, message: &Message) {
        let token = match self.storage.get_profile(recipient).await {
            Ok(profile) => profile.and_then(|p| p.push_token),
            Err(e) => {
                warn!(recipient, error = %e, "push token lookup failed");
                return;
            }
        };
        let body = if message.text.is_empty() {
            "Sent an attachment".to_string()
        } else {
            message.text.clone()
        };
        let data = serde_json::json!({
            "sessionId": message.session_id,
            "messageId": message.id,
        });
        if let Err(e) = self
            .push
            .send(token.as_deref(), &message.sender, &body, data)
            .await
        {
            warn!(recipient, message_id = %message.id, error = %e, "push notification failed");
        }
    }

    /// Moves one message, or every message the reader did not send, to `read`.
    /// Returns the ids that changed.
    pub async fn mark_read(
        &self,
        actor: &Identity,
        session_id: &str,
        message_id: Option<&str>,
    ) -> Result<Vec<String>, PactumError> {
        let session = self.accessible_session(session_id, actor).await?;
        let changed = match message_id {
            Some(id) => {
                let message = self.message_in_session(id, &session).await?;
                if message.sender == actor.email {
                    Vec::new()
                } else {
                    self.storage
                        .advance_message_status(id, MessageStatus::Read)
                        .await?
                        .map(|m| vec![m.id])
                        .unwrap_or_default()
                }
            }
            None => self.storage.mark_session_read(session_id, &actor.email).await?,
        };
        if !changed.is_empty() {
            let event = RealtimeEvent::MessagesRead {
                session_id: session.id.clone(),
                reader: actor.email.clone(),
                message_ids: changed.clone(),
            };
            self.broadcaster
                .broadcast(&Room::Session(session.id.clone()), &event)
                .await;
        }
        Ok(changed)
    }

    /// Sets, replaces, or toggles off the actor's reaction.
    pub async fn react(
        &self,
        actor: &Identity,
        message_id: &str,
        emoji: &str,
    ) -> Result<Vec<Reaction>, PactumError> {
        let emoji = emoji.trim();
        if emoji.is_empty() {
            return Err(PactumError::InvalidInput("emoji is required".to_string()));
        }
        let message = self
            .storage
            .get_message(message_id)
            .await?
            .ok_or_else(|| PactumError::not_found("message", message_id))?;
        self.accessible_session(&message.session_id, actor).await?;
        if message.deleted {
            return Err(PactumError::Conflict(
                "cannot react to a deleted message".to_string(),
            ));
        }
        let reactions = self
            .storage
            .set_reaction(message_id, &actor.email, emoji)
            .await?
            .ok_or_else(|| PactumError::not_found("message", message_id))?;
        let event = RealtimeEvent::ReactionUpdated {
            session_id: message.session_id.clone(),
            message_id: message.id.clone(),
            reactions: reactions.clone(),
        };
        self.broadcaster
            .broadcast(&Room::Session(message.session_id), &event)
            .await;
        Ok(reactions)
    }

    /// Replaces the text of the actor's own message.
    pub async fn edit_message(
        &self,
        actor: &Identity,
        message_id: &str,
        text: &str,
    ) -> Result<Message, PactumError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(PactumError::InvalidInput("message text is required".to_string()));
        }
        let message = self
            .storage
            .edit_message(message_id, &actor.email, text)
            .await?
            .ok_or_else(|| PactumError::Forbidden(NOT_OWNED.to_string()))?;
        self.broadcaster
            .broadcast(
                &Room::Session(message.session_id.clone()),
                &RealtimeEvent::MessageEdited(message.clone()),
            )
            .await;
        Ok(message)
    }

    /// Soft-deletes the actor's own message.
    pub async fn delete_message(
        &self,
        actor: &Identity,
        message_id: &str,
    ) -> Result<Message, PactumError> {
        let message = self
            .storage
            .soft_delete_message(message_id, &actor.email)
            .await?
            .ok_or_else(|| PactumError::Forbidden(NOT_OWNED.to_string()))?;
        let event = RealtimeEvent::MessageDeleted {
            session_id: message.session_id.clone(),
            message_id: message.id.clone(),
        };
        self.broadcaster
            .broadcast(&Room::Session(message.session_id.clone()), &event)
            .await;
        Ok(message)
    }

    /// Live messages of a session in send order.
    pub async fn history(
        &self,
        actor: &Identity,
        session_id: &str,
    ) -> Result<Vec<Message>, PactumError> {
        self.accessible_session(session_id, actor).await?;
        self.storage.list_messages(session_id).await
    }

    pub async fn archived_history(
        &self,
        actor: &Identity,
        session_id: &str,
    ) -> Result<Vec<ArchivedMessage>, PactumError> {
        self.accessible_session(session_id, actor).await?;
        self.storage.list_archived_messages(session_id).await
    }

    async fn message_in_session(
        &self,
        message_id: &str,
        session: &ChatSession,
    ) -> Result<Message, PactumError> {
        self.storage
            .get_message(message_id)
            .await?
            .filter(|m| m.session_id == session.id)
            .ok_or_else(|| PactumError::not_found("message", message_id))
    }
}

/// Agents writing into a support session they do not own as the user speak as agents.
fn sender_kind(session: &ChatSession, actor: &Identity) -> SenderKind {
    match &session.kind {
        SessionKind::Support { user_email, .. } if *user_email != actor.email && actor.is_agent() => {
            SenderKind::Agent
        }
        _ => SenderKind::User,
    }
}
