// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wallet transactions and the balance fold over them.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::model::contract::Contract;
use crate::types::cents;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    LocalPayment,
    Payout,
    Adjustment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Available,
    Completed,
    Failed,
    Escrowed,
}

/// One ledger row for a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletTransaction {
    pub id: String,
    pub user_email: String,
    pub kind: TransactionKind,
    pub status: TransactionStatus,
    #[serde(with = "cents")]
    pub amount: i64,
    pub currency: String,
    pub contract_id: Option<String>,
    pub reference: Option<String>,
    pub created_at: String,
}

impl WalletTransaction {
    pub fn new(
        user_email: &str,
        kind: TransactionKind,
        status: TransactionStatus,
        amount: i64,
        currency: &str,
    ) -> Self {
        Self {
            id: crate::types::new_id(),
            user_email: user_email.to_string(),
            kind,
            status,
            amount,
            currency: currency.to_string(),
            contract_id: None,
            reference: None,
            created_at: crate::types::now_timestamp(),
        }
    }

    pub fn for_contract(mut self, contract_id: &str) -> Self {
        self.contract_id = Some(contract_id.to_string());
        self
    }

    pub fn with_reference(mut self, reference: Option<String>) -> Self {
        self.reference = reference;
        self
    }
}

/// Derived balances for a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSummary {
    #[serde(with = "cents")]
    pub available: i64,
    #[serde(with = "cents")]
    pub pending: i64,
    #[serde(with = "cents")]
    pub escrowed: i64,
}

impl WalletSummary {
    /// Folds a user's transactions and contracts into balances.
    ///
    /// Withdrawals that are pending or completed count against the available
    /// balance; failed ones are ignored.
    pub fn fold(email: &str, transactions: &[WalletTransaction], contracts: &[Contract]) -> Self {
        let mut summary = Self::default();
        for tx in transactions.iter().filter(|tx| tx.user_email == email) {
            match (tx.kind, tx.status) {
                (TransactionKind::Payout, TransactionStatus::Available) => {
                    summary.available += tx.amount;
                }
                (TransactionKind::Withdrawal, TransactionStatus::Pending) => {
                    summary.available -= tx.amount;
                    summary.pending += tx.amount;
                }
                (TransactionKind::Withdrawal, TransactionStatus::Completed) => {
                    summary.available -= tx.amount;
                }
                _ => {}
            }
        }
        summary.escrowed = contracts
            .iter()
            .filter(|c| c.is_party(email))
            .map(Contract::remaining_escrow)
            .sum();
        summary
    }
}
