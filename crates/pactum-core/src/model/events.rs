// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Events pushed from the server to realtime clients.

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::model::chat::{ChatSession, Connection, Message, MessageStatus, Reaction};
use crate::model::contract::{Contract, EscrowEvent, EscrowStatus};
use crate::types::cents;

/// A server-to-client event, encoded as `{"event": <name>, "data": <payload>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, IntoStaticStr)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
#[strum(serialize_all = "camelCase")]
pub enum RealtimeEvent {
    SessionCreated {
        session: ChatSession,
    },
    SessionAssigned {
        session_id: String,
        agent_email: String,
        session: ChatSession,
    },
    SessionClosed {
        session_id: String,
        archived: usize,
    },
    SessionCleared {
        session_id: String,
        successor_id: String,
        successor: ChatSession,
    },
    NewMessage(Message),
    MessageStatus {
        session_id: String,
        message_id: String,
        status: MessageStatus,
    },
    MessagesRead {
        session_id: String,
        reader: String,
        message_ids: Vec<String>,
    },
    ReactionUpdated {
        session_id: String,
        message_id: String,
        reactions: Vec<Reaction>,
    },
    MessageEdited(Message),
    MessageDeleted {
        session_id: String,
        message_id: String,
    },
    Typing {
        session_id: String,
        users: Vec<String>,
    },
    Presence {
        email: String,
        online: bool,
    },
    AgentAvailability {
        agents: Vec<String>,
    },
    ConnectionUpdated(Connection),
    ContractUpdated(Contract),
    EscrowUpdated {
        contract_id: String,
        escrow_status: EscrowStatus,
        #[serde(with = "cents")]
        escrowed_amount: i64,
        #[serde(with = "cents")]
        released_amount: i64,
        entry: EscrowEvent,
    },
}

impl RealtimeEvent {
    /// Wire name of the event, e.g. `newMessage`.
    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// Snapshot of a contract's escrow state after `entry` was appended.
    pub fn escrow_updated(contract: &Contract, entry: EscrowEvent) -> Self {
        Self::EscrowUpdated {
            contract_id: contract.id.clone(),
            escrow_status: contract.escrow_status,
            escrowed_amount: contract.escrowed_amount,
            released_amount: contract.released_amount,
            entry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_use_adjacent_tagging() {
        let event = RealtimeEvent::Typing {
            session_id: "s1".into(),
            users: vec!["a@x.io".into()],
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "typing");
        assert_eq!(json["data"]["sessionId"], "s1");
        assert_eq!(event.name(), "typing");
    }

    #[test]
    fn names_are_camel_case() {
        let event = RealtimeEvent::AgentAvailability { agents: vec![] };
        assert_eq!(event.name(), "agentAvailability");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "agentAvailability");
        assert_eq!(
            RealtimeEvent::SessionClosed {
                session_id: "s".into(),
                archived: 0
            }
            .name(),
            "sessionClosed"
        );
    }
}
