// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use pactum_config::model::StorageConfig;
use pactum_core::model::{
    ArchivedMessage, ChatSession, ClearOutcome, CloseOutcome, Connection, ConnectionStatus,
    Contract, ContractStatus, EscrowEvent, EscrowOutcome, InviteOutcome, Message, MessageStatus,
    NewMessage, Reaction, Signature, SignatureOutcome, Team, TransactionStatus, UserProfile,
    WalletTransaction,
};
use pactum_core::{Backend, HealthStatus, Insertion, PactumError, StorageAdapter};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates every operation to the query
/// modules. The database is opened by [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// The connection is not opened until [`StorageAdapter::initialize`] is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, PactumError> {
        self.db.get().ok_or_else(|| PactumError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    async fn checkpoint(db: &Database) -> Result<(), PactumError> {
        db.connection()
            .call(|conn| conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);"))
            .await
            .map_err(map_tr_err)
    }
}

#[async_trait]
impl Backend for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    /// Version of the bundled SQLite library.
    fn version(&self) -> semver::Version {
        let n = rusqlite::version_number();
        semver::Version::new((n / 1_000_000) as u64, (n / 1_000 % 1_000) as u64, (n % 1_000) as u64)
    }

    async fn health_check(&self) -> Result<HealthStatus, PactumError> {
        let Some(db) = self.db.get() else {
            return Ok(HealthStatus::Unhealthy("not initialized".into()));
        };
        let journal: String = db
            .connection()
            .call(|conn| conn.query_row("PRAGMA journal_mode;", [], |row| row.get(0)))
            .await
            .map_err(map_tr_err)?;
        if self.config.wal_mode && !journal.eq_ignore_ascii_case("wal") {
            return Ok(HealthStatus::Degraded(format!("journal mode is {journal}")));
        }
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), PactumError> {
        let path = self.config.database_path.clone();
        let db = Database::open_with(&path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| PactumError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), PactumError> {
        Self::checkpoint(self.db()?).await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    // --- Sessions ---

    async fn insert_session(
        &self,
        session: &ChatSession,
    ) -> Result<Insertion<ChatSession>, PactumError> {
        queries::sessions::insert_session(self.db()?, session).await
    }

    async fn get_session(&self, id: &str) -> Result<Option<ChatSession>, PactumError> {
        queries::sessions::get_session(self.db()?, id).await
    }

    async fn find_open_session(
        &self,
        participant_key: &str,
    ) -> Result<Option<ChatSession>, PactumError> {
        queries::sessions::find_open_session(self.db()?, participant_key).await
    }

    async fn list_sessions_for(&self, email: &str) -> Result<Vec<ChatSession>, PactumError> {
        queries::sessions::list_sessions_for(self.db()?, email).await
    }

    async fn list_support_sessions(
        &self,
        unassigned_only: bool,
    ) -> Result<Vec<ChatSession>, PactumError> {
        queries::sessions::list_support_sessions(self.db()?, unassigned_only).await
    }

    async fn assign_agent(
        &self,
        session_id: &str,
        agent_email: &str,
    ) -> Result<Option<ChatSession>, PactumError> {
        queries::sessions::assign_agent(self.db()?, session_id, agent_email).await
    }

    async fn close_session(&self, session_id: &str) -> Result<CloseOutcome, PactumError> {
        queries::sessions::close_session(self.db()?, session_id).await
    }

    async fn clear_session(&self, session_id: &str) -> Result<ClearOutcome, PactumError> {
        queries::sessions::clear_session(self.db()?, session_id).await
    }

    // --- Messages ---

    async fn insert_message(
        &self,
        message: &NewMessage,
    ) -> Result<Option<Insertion<Message>>, PactumError> {
        queries::messages::insert_message(self.db()?, message).await
    }

    async fn get_message(&self, id: &str) -> Result<Option<Message>, PactumError> {
        queries::messages::get_message(self.db()?, id).await
    }

    async fn list_messages(&self, session_id: &str) -> Result<Vec<Message>, PactumError> {
        queries::messages::list_messages(self.db()?, session_id).await
    }

    async fn advance_message_status(
        &self,
        message_id: &str,
        status: MessageStatus,
    ) -> Result<Option<Message>, PactumError> {
        queries::messages::advance_message_status(self.db()?, message_id, status).await
    }

    async fn mark_session_read(
        &self,
        session_id: &str,
        reader: &str,
    ) -> Result<Vec<String>, PactumError> {
        queries::messages::mark_session_read(self.db()?, session_id, reader).await
    }

    async fn set_reaction(
        &self,
        message_id: &str,
        user: &str,
        emoji: &str,
    ) -> Result<Option<Vec<Reaction>>, PactumError> {
        queries::messages::set_reaction(self.db()?, message_id, user, emoji).await
    }

    async fn edit_message(
        &self,
        message_id: &str,
        sender: &str,
        text: &str,
    ) -> Result<Option<Message>, PactumError> {
        queries::messages::edit_message(self.db()?, message_id, sender, text).await
    }

    async fn soft_delete_message(
        &self,
        message_id: &str,
        sender: &str,
    ) -> Result<Option<Message>, PactumError> {
        queries::messages::soft_delete_message(self.db()?, message_id, sender).await
    }

    async fn list_archived_messages(
        &self,
        session_id: &str,
    ) -> Result<Vec<ArchivedMessage>, PactumError> {
        queries::archive::list_archived_messages(self.db()?, session_id).await
    }

    // --- Connections ---

    async fn get_connection(&self, a: &str, b: &str) -> Result<Option<Connection>, PactumError> {
        queries::connections::get_connection(self.db()?, a, b).await
    }

    async fn invite_connection(
        &self,
        from: &str,
        to: &str,
    ) -> Result<InviteOutcome, PactumError> {
        queries::connections::invite_connection(self.db()?, from, to).await
    }

    async fn resolve_connection(
        &self,
        by: &str,
        other: &str,
        status: ConnectionStatus,
    ) -> Result<Option<Connection>, PactumError> {
        queries::connections::resolve_connection(self.db()?, by, other, status).await
    }

    async fn list_connections(&self, email: &str) -> Result<Vec<Connection>, PactumError> {
        queries::connections::list_connections(self.db()?, email).await
    }

    // --- Teams ---

    async fn insert_team(&self, team: &Team) -> Result<(), PactumError> {
        queries::teams::insert_team(self.db()?, team).await
    }

    async fn get_team(&self, id: &str) -> Result<Option<Team>, PactumError> {
        queries::teams::get_team(self.db()?, id).await
    }

    async fn add_team_member(&self, team_id: &str, email: &str) -> Result<(), PactumError> {
        queries::teams::add_team_member(self.db()?, team_id, email).await
    }

    async fn list_teams_for(&self, email: &str) -> Result<Vec<Team>, PactumError> {
        queries::teams::list_teams_for(self.db()?, email).await
    }

    async fn share_team(&self, a: &str, b: &str) -> Result<bool, PactumError> {
        queries::teams::share_team(self.db()?, a, b).await
    }

    // --- Contracts ---

    async fn insert_contract(&self, contract: &Contract) -> Result<(), PactumError> {
        queries::contracts::insert_contract(self.db()?, contract).await
    }

    async fn get_contract(&self, id: &str) -> Result<Option<Contract>, PactumError> {
        queries::contracts::get_contract(self.db()?, id).await
    }

    async fn list_contracts_for(&self, email: &str) -> Result<Vec<Contract>, PactumError> {
        queries::contracts::list_contracts_for(self.db()?, email).await
    }

    async fn update_draft(&self, contract: &Contract) -> Result<Option<Contract>, PactumError> {
        queries::contracts::update_draft(self.db()?, contract).await
    }

    async fn share_contract(&self, a: &str, b: &str) -> Result<bool, PactumError> {
        queries::contracts::share_contract(self.db()?, a, b).await
    }

    async fn append_signature(
        &self,
        contract_id: &str,
        signature: &Signature,
        expected: &[ContractStatus],
    ) -> Result<SignatureOutcome, PactumError> {
        queries::contracts::append_signature(self.db()?, contract_id, signature, expected).await
    }

    // --- Escrow ---

    async fn record_payment_intent(
        &self,
        contract_id: &str,
        payer_email: &str,
        intent_id: &str,
        entry: &EscrowEvent,
    ) -> Result<EscrowOutcome, PactumError> {
        queries::escrow::record_payment_intent(self.db()?, contract_id, payer_email, intent_id, entry)
            .await
    }

    async fn confirm_funding(
        &self,
        contract_id: &str,
        amount: i64,
        entry: &EscrowEvent,
        deposit: &WalletTransaction,
    ) -> Result<EscrowOutcome, PactumError> {
        queries::escrow::confirm_funding(self.db()?, contract_id, amount, entry, deposit).await
    }

    async fn release_funds(
        &self,
        contract_id: &str,
        amount: i64,
        entry: &EscrowEvent,
        payout: &WalletTransaction,
    ) -> Result<EscrowOutcome, PactumError> {
        queries::escrow::release_funds(self.db()?, contract_id, amount, entry, payout).await
    }

    async fn record_local_payment(
        &self,
        contract_id: &str,
        entry: &EscrowEvent,
        payment: &WalletTransaction,
    ) -> Result<EscrowOutcome, PactumError> {
        queries::escrow::record_local_payment(self.db()?, contract_id, entry, payment).await
    }

    // --- Wallet ---

    async fn list_wallet_transactions(
        &self,
        email: &str,
    ) -> Result<Vec<WalletTransaction>, PactumError> {
        queries::wallet::list_wallet_transactions(self.db()?, email).await
    }

    async fn reserve_withdrawal(
        &self,
        withdrawal: &WalletTransaction,
    ) -> Result<Option<WalletTransaction>, PactumError> {
        queries::wallet::reserve_withdrawal(self.db()?, withdrawal).await
    }

    async fn update_transaction_status(
        &self,
        id: &str,
        status: TransactionStatus,
        reference: Option<&str>,
    ) -> Result<(), PactumError> {
        queries::wallet::update_transaction_status(self.db()?, id, status, reference).await
    }

    // --- Profiles ---

    async fn get_profile(&self, email: &str) -> Result<Option<UserProfile>, PactumError> {
        queries::profiles::get_profile(self.db()?, email).await
    }

    async fn set_push_token(&self, email: &str, token: Option<&str>) -> Result<(), PactumError> {
        queries::profiles::set_push_token(self.db()?, email, token).await
    }

    async fn set_payment_account(
        &self,
        email: &str,
        account_id: &str,
    ) -> Result<(), PactumError> {
        queries::profiles::set_payment_account(self.db()?, email, account_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pactum_core::model::{ParticipantPair, SessionKind};
    use tempfile::tempdir;

    fn config(dir: &tempfile::TempDir) -> StorageConfig {
        StorageConfig {
            database_path: dir.path().join("adapter.db").to_string_lossy().into_owned(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn operations_before_initialize_fail() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(config(&dir));
        let err = storage.get_session("s1").await.unwrap_err();
        assert!(matches!(err, PactumError::Storage { .. }));
        assert!(matches!(
            storage.health_check().await.unwrap(),
            HealthStatus::Unhealthy(_)
        ));
    }

    #[tokio::test]
    async fn initialize_twice_fails() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(config(&dir));
        storage.initialize().await.unwrap();
        assert!(storage.initialize().await.is_err());
        storage.close().await.unwrap();
    }

    #[tokio::test]
    async fn health_and_delegation() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(config(&dir));
        storage.initialize().await.unwrap();
        assert_eq!(storage.name(), "sqlite");
        assert!(storage.version().major >= 3);
        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);

        let kind = ParticipantPair::new("bob@x.io", "alice@x.io")
            .unwrap()
            .into_kind();
        let key = kind.participant_key();
        let inserted = storage
            .insert_session(&ChatSession::open(kind))
            .await
            .unwrap();
        assert!(inserted.is_created());
        let found = storage.find_open_session(&key).await.unwrap().unwrap();
        assert!(matches!(found.kind, SessionKind::Peer { .. }));
        storage.close().await.unwrap();
    }
}
