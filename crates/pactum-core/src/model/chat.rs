// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat sessions, messages, connections, and teams.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::PactumError;
use crate::types::normalize_email;

/// Whether a session still accepts messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Open,
    Closed,
}

/// The two shapes a session can take, resolved once when a row is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum SessionKind {
    /// A conversation between two users; participants are sorted.
    Peer { participants: [String; 2] },
    /// A legacy support conversation between a user and an optional agent.
    Support {
        user_email: String,
        agent_email: Option<String>,
    },
}

impl SessionKind {
    /// Uniqueness key for open sessions of this shape.
    pub fn participant_key(&self) -> String {
        match self {
            Self::Peer { participants } => {
                format!("peer:{}|{}", participants[0], participants[1])
            }
            Self::Support { user_email, .. } => format!("support:{user_email}"),
        }
    }

    /// Whether `email` is a named participant (peer, support user, or assigned agent).
    pub fn involves(&self, email: &str) -> bool {
        match self {
            Self::Peer { participants } => participants.iter().any(|p| p == email),
            Self::Support {
                user_email,
                agent_email,
            } => user_email == email || agent_email.as_deref() == Some(email),
        }
    }

    /// The other side of the conversation from `email`'s point of view.
    pub fn counterpart(&self, email: &str) -> Option<&str> {
        match self {
            Self::Peer { participants } => {
                if participants[0] == email {
                    Some(participants[1].as_str())
                } else if participants[1] == email {
                    Some(participants[0].as_str())
                } else {
                    None
                }
            }
            Self::Support {
                user_email,
                agent_email,
            } => {
                if user_email == email {
                    agent_email.as_deref()
                } else {
                    Some(user_email.as_str())
                }
            }
        }
    }

    pub fn is_support(&self) -> bool {
        matches!(self, Self::Support { .. })
    }
}

/// A persisted chat session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: String,
    #[serde(flatten)]
    pub kind: SessionKind,
    pub status: SessionStatus,
    pub created_at: String,
    pub updated_at: String,
    pub closed_at: Option<String>,
}

impl ChatSession {
    /// Builds a fresh open session with a new id.
    pub fn open(kind: SessionKind) -> Self {
        let now = crate::types::now_timestamp();
        Self {
            id: crate::types::new_id(),
            kind,
            status: SessionStatus::Open,
            created_at: now.clone(),
            updated_at: now,
            closed_at: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == SessionStatus::Open
    }

    /// Assigned agent, for support sessions.
    pub fn agent_email(&self) -> Option<&str> {
        match &self.kind {
            SessionKind::Support { agent_email, .. } => agent_email.as_deref(),
            SessionKind::Peer { .. } => None,
        }
    }

    /// Every identity that should hear about changes to this session.
    pub fn audience(&self) -> Vec<String> {
        match &self.kind {
            SessionKind::Peer { participants } => participants.to_vec(),
            SessionKind::Support {
                user_email,
                agent_email,
            } => std::iter::once(user_email.clone())
                .chain(agent_email.clone())
                .collect(),
        }
    }
}

/// An order-independent, validated pair of peer identities.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParticipantPair {
    low: String,
    high: String,
}

impl ParticipantPair {
    /// Normalizes and sorts two identities.
    ///
    /// Fails with `InvalidInput` when either side is empty or both are equal.
    pub fn new(a: &str, b: &str) -> Result<Self, PactumError> {
        let a = normalize_email(a);
        let b = normalize_email(b);
        if a.is_empty() || b.is_empty() {
            return Err(PactumError::InvalidInput(
                "two participant identities are required".to_string(),
            ));
        }
        if a == b {
            return Err(PactumError::InvalidInput(
                "cannot open a session with yourself".to_string(),
            ));
        }
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        Ok(Self { low, high })
    }

    /// Builds a pair from a client-supplied participant list.
    pub fn from_list(participants: &[String]) -> Result<Self, PactumError> {
        match participants {
            [a, b] => Self::new(a, b),
            _ => Err(PactumError::InvalidInput(format!(
                "exactly two participants are required, got {}",
                participants.len()
            ))),
        }
    }

    pub fn first(&self) -> &str {
        &self.low
    }

    pub fn second(&self) -> &str {
        &self.high
    }

    pub fn into_kind(self) -> SessionKind {
        SessionKind::Peer {
            participants: [self.low, self.high],
        }
    }

    /// Uniqueness key shared with [`SessionKind::participant_key`].
    pub fn key(&self) -> String {
        format!("peer:{}|{}", self.low, self.high)
    }
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SenderKind {
    User,
    Agent,
}

/// Delivery progress of a message; variants are ordered so progress only moves forward.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Sent,
    Delivered,
    Read,
}

impl MessageStatus {
    /// Numeric rank persisted next to the status for forward-only updates.
    pub fn rank(self) -> i64 {
        match self {
            Self::Sent => 0,
            Self::Delivered => 1,
            Self::Read => 2,
        }
    }
}

/// Coarse classification of an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Image,
    File,
}

impl FileKind {
    /// Classifies a MIME type or file name.
    pub fn classify(hint: &str) -> Self {
        const IMAGE_EXTENSIONS: [&str; 6] = [".png", ".jpg", ".jpeg", ".gif", ".webp", ".heic"];
        let hint = hint.to_ascii_lowercase();
        if hint.starts_with("image/") || IMAGE_EXTENSIONS.iter().any(|ext| hint.ends_with(ext)) {
            Self::Image
        } else {
            Self::File
        }
    }
}

/// A single emoji reaction; at most one per user per message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub emoji: String,
    pub user: String,
}

/// A live chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub session_id: String,
    pub sender: String,
    pub from: SenderKind,
    pub text: String,
    pub time: String,
    pub client_id: Option<String>,
    pub file_url: Option<String>,
    pub file_type: Option<FileKind>,
    pub status: MessageStatus,
    pub edited: bool,
    pub deleted: bool,
    pub reactions: Vec<Reaction>,
    pub updated_at: String,
}

/// Input for inserting a message.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub session_id: String,
    pub sender: String,
    pub from: SenderKind,
    pub text: String,
    pub client_id: Option<String>,
    pub file_url: Option<String>,
    pub file_type: Option<FileKind>,
    pub status: MessageStatus,
}

/// A message moved out of the live store when its session closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedMessage {
    #[serde(flatten)]
    pub message: Message,
    pub archived_at: String,
}

/// Result of closing (and archiving) a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseOutcome {
    Closed { session: ChatSession, archived: usize },
    AlreadyClosed,
    NotFound,
}

/// Result of clearing a support session into a fresh successor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearOutcome {
    Cleared {
        previous: ChatSession,
        successor: ChatSession,
        archived: usize,
    },
    /// Only support sessions have a successor.
    NotSupport,
    AlreadyClosed,
    NotFound,
}

/// State of a chat-permission request between two users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Pending,
    Accepted,
    Rejected,
}

/// A chat-permission record for an unordered pair of users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    pub user_a: String,
    pub user_b: String,
    pub status: ConnectionStatus,
    pub requested_by: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Connection {
    /// The member of the pair that is not `email`.
    pub fn other(&self, email: &str) -> &str {
        if self.user_a == email {
            &self.user_b
        } else {
            &self.user_a
        }
    }
}

/// Result of an invite against any existing record for the pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InviteOutcome {
    Created(Connection),
    Reopened(Connection),
    Exists(Connection),
}

/// A group of users who may chat with each other freely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: String,
    pub name: String,
    pub owner_email: String,
    pub members: Vec<String>,
    pub created_at: String,
}

/// Per-user settings that external services need.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub email: String,
    pub display_name: Option<String>,
    pub push_token: Option<String>,
    pub payment_account_id: Option<String>,
}
