// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends (SQLite, etc.).

use async_trait::async_trait;

use crate::error::PactumError;
use crate::model::{
    ArchivedMessage, ChatSession, ClearOutcome, CloseOutcome, Connection, ConnectionStatus,
    Contract, ContractStatus, EscrowEvent, EscrowOutcome, InviteOutcome, Message, MessageStatus,
    NewMessage, Reaction, Signature, SignatureOutcome, Team, TransactionStatus, UserProfile,
    WalletTransaction,
};
use crate::traits::backend::Backend;
use crate::types::Insertion;

/// Adapter for storage and persistence backends.
///
/// Every state transition that has a precondition is expressed as a single
/// conditional statement or a single transaction, so callers never need to
/// read-then-write.
#[async_trait]
pub trait StorageAdapter: Backend {
    /// Initializes the storage backend (migrations, connection, pragmas).
    async fn initialize(&self) -> Result<(), PactumError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), PactumError>;

    // --- Sessions ---

    /// Inserts an open session, or returns the open session that already holds its key.
    async fn insert_session(
        &self,
        session: &ChatSession,
    ) -> Result<Insertion<ChatSession>, PactumError>;

    async fn get_session(&self, id: &str) -> Result<Option<ChatSession>, PactumError>;

    /// Open session for a participant key (`peer:a|b` or `support:user`).
    async fn find_open_session(
        &self,
        participant_key: &str,
    ) -> Result<Option<ChatSession>, PactumError>;

    /// Sessions `email` takes part in, newest first.
    async fn list_sessions_for(&self, email: &str) -> Result<Vec<ChatSession>, PactumError>;

    /// Support sessions, optionally limited to open ones without an agent.
    async fn list_support_sessions(
        &self,
        unassigned_only: bool,
    ) -> Result<Vec<ChatSession>, PactumError>;

    /// Assigns an agent to an open, unassigned support session.
    ///
    /// Returns `None` when the session is missing, closed, not a support
    /// session, or already has an agent.
    async fn assign_agent(
        &self,
        session_id: &str,
        agent_email: &str,
    ) -> Result<Option<ChatSession>, PactumError>;

    /// Closes a session and archives its live messages in one transaction.
    async fn close_session(&self, session_id: &str) -> Result<CloseOutcome, PactumError>;

    /// Archives and closes a support session and opens its successor in one transaction.
    async fn clear_session(&self, session_id: &str) -> Result<ClearOutcome, PactumError>;

    // --- Messages ---

    /// Inserts a message into an open session.
    ///
    /// A repeated `(session_id, client_id)` returns the stored row. Returns
    /// `None` when the session is missing or closed.
    async fn insert_message(
        &self,
        message: &NewMessage,
    ) -> Result<Option<Insertion<Message>>, PactumError>;

    async fn get_message(&self, id: &str) -> Result<Option<Message>, PactumError>;

    /// Live messages of a session in send order.
    async fn list_messages(&self, session_id: &str) -> Result<Vec<Message>, PactumError>;

    /// Moves one message forward to `status`; returns `None` if it was already at or past it.
    async fn advance_message_status(
        &self,
        message_id: &str,
        status: MessageStatus,
    ) -> Result<Option<Message>, PactumError>;

    /// Marks every message in the session not sent by `reader` as read.
    /// Returns the ids that changed.
    async fn mark_session_read(
        &self,
        session_id: &str,
        reader: &str,
    ) -> Result<Vec<String>, PactumError>;

    /// Sets, replaces, or toggles off `user`'s reaction.
    /// Returns the message's reactions afterwards, or `None` if it does not exist.
    async fn set_reaction(
        &self,
        message_id: &str,
        user: &str,
        emoji: &str,
    ) -> Result<Option<Vec<Reaction>>, PactumError>;

    /// Replaces the text of a live message, if `sender` wrote it.
    async fn edit_message(
        &self,
        message_id: &str,
        sender: &str,
        text: &str,
    ) -> Result<Option<Message>, PactumError>;

    /// Soft-deletes a message, if `sender` wrote it.
    async fn soft_delete_message(
        &self,
        message_id: &str,
        sender: &str,
    ) -> Result<Option<Message>, PactumError>;

    async fn list_archived_messages(
        &self,
        session_id: &str,
    ) -> Result<Vec<ArchivedMessage>, PactumError>;

    // --- Connections ---

    async fn get_connection(&self, a: &str, b: &str) -> Result<Option<Connection>, PactumError>;

    /// Creates a pending connection, reopens a rejected one, or reports the existing record.
    async fn invite_connection(&self, from: &str, to: &str)
    -> Result<InviteOutcome, PactumError>;

    /// Moves a pending connection to `status` when `by` is not the requester.
    async fn resolve_connection(
        &self,
        by: &str,
        other: &str,
        status: ConnectionStatus,
    ) -> Result<Option<Connection>, PactumError>;

    async fn list_connections(&self, email: &str) -> Result<Vec<Connection>, PactumError>;

    // --- Teams ---

    async fn insert_team(&self, team: &Team) -> Result<(), PactumError>;

    async fn get_team(&self, id: &str) -> Result<Option<Team>, PactumError>;

    /// Adds a member; adding an existing member is a no-op.
    async fn add_team_member(&self, team_id: &str, email: &str) -> Result<(), PactumError>;

    async fn list_teams_for(&self, email: &str) -> Result<Vec<Team>, PactumError>;

    /// Whether both users belong to at least one common team.
    async fn share_team(&self, a: &str, b: &str) -> Result<bool, PactumError>;

    // --- Contracts ---

    async fn insert_contract(&self, contract: &Contract) -> Result<(), PactumError>;

    async fn get_contract(&self, id: &str) -> Result<Option<Contract>, PactumError>;

    /// Contracts where `email` is originator or recipient, newest first.
    async fn list_contracts_for(&self, email: &str) -> Result<Vec<Contract>, PactumError>;

    /// Overwrites the editable fields of a contract that is still a draft.
    /// Returns `None` once the contract has left `draft`.
    async fn update_draft(&self, contract: &Contract) -> Result<Option<Contract>, PactumError>;

    /// Whether the two users are originator and recipient of some contract.
    async fn share_contract(&self, a: &str, b: &str) -> Result<bool, PactumError>;

    /// Appends a signature and recomputes the status, in one transaction.
    ///
    /// The contract must currently be in one of `expected` statuses.
    async fn append_signature(
        &self,
        contract_id: &str,
        signature: &Signature,
        expected: &[ContractStatus],
    ) -> Result<SignatureOutcome, PactumError>;

    // --- Escrow ---

    /// Records a payment intent on a signed contract whose escrow is pending funding.
    async fn record_payment_intent(
        &self,
        contract_id: &str,
        payer_email: &str,
        intent_id: &str,
        entry: &EscrowEvent,
    ) -> Result<EscrowOutcome, PactumError>;

    /// `pending_funding -> funded`, with the history entry and deposit row.
    async fn confirm_funding(
        &self,
        contract_id: &str,
        amount: i64,
        entry: &EscrowEvent,
        deposit: &WalletTransaction,
    ) -> Result<EscrowOutcome, PactumError>;

    /// Releases `amount` if the escrow is releasable and the balance covers it.
    async fn release_funds(
        &self,
        contract_id: &str,
        amount: i64,
        entry: &EscrowEvent,
        payout: &WalletTransaction,
    ) -> Result<EscrowOutcome, PactumError>;

    /// Appends a local-payment history entry and wallet row without touching balances.
    async fn record_local_payment(
        &self,
        contract_id: &str,
        entry: &EscrowEvent,
        payment: &WalletTransaction,
    ) -> Result<EscrowOutcome, PactumError>;

    // --- Wallet ---

    async fn list_wallet_transactions(
        &self,
        email: &str,
    ) -> Result<Vec<WalletTransaction>, PactumError>;

    /// Inserts a pending withdrawal if the user's available balance covers it.
    /// Returns `None` when it does not.
    async fn reserve_withdrawal(
        &self,
        withdrawal: &WalletTransaction,
    ) -> Result<Option<WalletTransaction>, PactumError>;

    async fn update_transaction_status(
        &self,
        id: &str,
        status: TransactionStatus,
        reference: Option<&str>,
    ) -> Result<(), PactumError>;

    // --- Profiles ---

    async fn get_profile(&self, email: &str) -> Result<Option<UserProfile>, PactumError>;

    async fn set_push_token(&self, email: &str, token: Option<&str>) -> Result<(), PactumError>;

    async fn set_payment_account(&self, email: &str, account_id: &str)
    -> Result<(), PactumError>;
}
