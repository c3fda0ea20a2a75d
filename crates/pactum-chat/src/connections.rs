// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat-permission requests between users.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use pactum_core::model::{Connection, ConnectionStatus, InviteOutcome, ParticipantPair, RealtimeEvent};
use pactum_core::traits::broadcast_to;
use pactum_core::types::normalize_email;
use pactum_core::{Broadcaster, Identity, PactumError, Room, StorageAdapter};

/// Connection state between the caller and one other user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerStatus {
    pub email: String,
    pub status: Option<ConnectionStatus>,
    pub requested_by: Option<String>,
}

pub struct ConnectionService {
    storage: Arc<dyn StorageAdapter>,
    broadcaster: Arc<dyn Broadcaster>,
}

impl ConnectionService {
    pub fn new(storage: Arc<dyn StorageAdapter>, broadcaster: Arc<dyn Broadcaster>) -> Self {
        Self {
            storage,
            broadcaster,
        }
    }

    /// Sends a request. A rejected pair may be invited again; a pending or
    /// accepted one conflicts.
    pub async fn invite(&self, actor: &Identity, to: &str) -> Result<Connection, PactumError> {
        let to = normalize_email(to);
        match self.storage.invite_connection(&actor.email, &to).await? {
            InviteOutcome::Created(connection) | InviteOutcome::Reopened(connection) => {
                info!(from = %actor.email, to = %to, "connection requested");
                self.announce(&connection).await;
                Ok(connection)
            }
            InviteOutcome::Exists(existing) => Err(PactumError::Conflict(format!(
                "connection already {}",
                existing.status
            ))),
        }
    }

    pub async fn accept(&self, actor: &Identity, other: &str) -> Result<Connection, PactumError> {
        self.resolve(actor, other, ConnectionStatus::Accepted).await
    }

    pub async fn reject(&self, actor: &Identity, other: &str) -> Result<Connection, PactumError> {
        self.resolve(actor, other, ConnectionStatus::Rejected).await
    }

    async fn resolve(
        &self,
        actor: &Identity,
        other: &str,
        status: ConnectionStatus,
    ) -> Result<Connection, PactumError> {
        let other = normalize_email(other);
        let connection = self
            .storage
            .resolve_connection(&actor.email, &other, status)
            .await?
            .ok_or_else(|| {
                PactumError::Conflict(format!("no pending invitation from {other}"))
            })?;
        info!(by = %actor.email, other = %other, %status, "connection resolved");
        self.announce(&connection).await;
        Ok(connection)
    }

    /// Status with each of `others`; unknown or invalid peers report no status.
    pub async fn statuses(
        &self,
        actor: &Identity,
        others: &[String],
    ) -> Result<Vec<PeerStatus>, PactumError> {
        let mut out = Vec::with_capacity(others.len());
        for other in others {
            let email = normalize_email(other);
            let connection = if ParticipantPair::new(&actor.email, &email).is_ok() {
                self.storage.get_connection(&actor.email, &email).await?
            } else {
                None
            };
            out.push(PeerStatus {
                email,
                status: connection.as_ref().map(|c| c.status),
                requested_by: connection.map(|c| c.requested_by),
            });
        }
        Ok(out)
    }

    pub async fn list(&self, actor: &Identity) -> Result<Vec<Connection>, PactumError> {
        self.storage.list_connections(&actor.email).await
    }

    async fn announce(&self, connection: &Connection) {
        let rooms = [
            Room::User(connection.user_a.clone()),
            Room::User(connection.user_b.clone()),
        ];
        broadcast_to(
            self.broadcaster.as_ref(),
            &rooms,
            &RealtimeEvent::ConnectionUpdated(connection.clone()),
        )
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pactum_test_utils::TestHarness;

    fn service(harness: &TestHarness) -> ConnectionService {
        ConnectionService::new(harness.storage.clone(), harness.broadcaster.clone())
    }

    #[tokio::test]
    async fn invite_accept_flow_notifies_both_users() {
        let harness = TestHarness::new().await.unwrap();
        let svc = service(&harness);
        let alice = Identity::user("alice@x.io");
        let bob = Identity::user("bob@x.io");

        let pending = svc.invite(&alice, "Bob@x.io").await.unwrap();
        assert_eq!(pending.status, ConnectionStatus::Pending);
        let accepted = svc.accept(&bob, "alice@x.io").await.unwrap();
        assert_eq!(accepted.status, ConnectionStatus::Accepted);

        let rooms = harness.broadcaster.rooms_for("connectionUpdated");
        assert_eq!(rooms.len(), 4);
        assert!(rooms.contains(&Room::User("alice@x.io".into())));
        assert!(rooms.contains(&Room::User("bob@x.io".into())));
    }

    #[tokio::test]
    async fn duplicate_and_self_invites_fail() {
        let harness = TestHarness::new().await.unwrap();
        let svc = service(&harness);
        let alice = Identity::user("alice@x.io");
        svc.invite(&alice, "bob@x.io").await.unwrap();

        let err = svc.invite(&Identity::user("bob@x.io"), "alice@x.io").await.unwrap_err();
        assert!(matches!(err, PactumError::Conflict(_)));
        let err = svc.invite(&alice, "ALICE@x.io").await.unwrap_err();
        assert!(matches!(err, PactumError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn requester_cannot_answer_own_invite() {
        let harness = TestHarness::new().await.unwrap();
        let svc = service(&harness);
        let alice = Identity::user("alice@x.io");
        svc.invite(&alice, "bob@x.io").await.unwrap();
        let err = svc.accept(&alice, "bob@x.io").await.unwrap_err();
        assert!(matches!(err, PactumError::Conflict(_)));
    }

    #[tokio::test]
    async fn rejected_pair_can_be_reinvited() {
        let harness = TestHarness::new().await.unwrap();
        let svc = service(&harness);
        let alice = Identity::user("alice@x.io");
        let bob = Identity::user("bob@x.io");
        svc.invite(&alice, "bob@x.io").await.unwrap();
        svc.reject(&bob, "alice@x.io").await.unwrap();
        let again = svc.invite(&alice, "bob@x.io").await.unwrap();
        assert_eq!(again.status, ConnectionStatus::Pending);
    }

    #[tokio::test]
    async fn statuses_cover_known_and_unknown_peers() {
        let harness = TestHarness::new().await.unwrap();
        let svc = service(&harness);
        let alice = Identity::user("alice@x.io");
        svc.invite(&alice, "bob@x.io").await.unwrap();

        let statuses = svc
            .statuses(
                &alice,
                &["bob@x.io".into(), "carol@x.io".into(), "alice@x.io".into()],
            )
            .await
            .unwrap();
        assert_eq!(statuses[0].status, Some(ConnectionStatus::Pending));
        assert_eq!(statuses[0].requested_by.as_deref(), Some("alice@x.io"));
        assert_eq!(statuses[1].status, None);
        assert_eq!(statuses[2].status, None);
        assert_eq!(svc.list(&alice).await.unwrap().len(), 1);
    }
}
