// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contracts, signatures, and escrow bookkeeping.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::types::cents;

/// Lifecycle of a contract. Transitions only move forward.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
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
pub enum ContractStatus {
    #[default]
    Draft,
    Sent,
    Signed,
}

/// Which side of a contract a party or signature belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PartyRole {
    Originator,
    Recipient,
}

/// One side of a contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub user_id: Option<String>,
    /// Free-form business role ("client", "contractor", ...).
    #[serde(default)]
    pub role: Option<String>,
}

/// A titled clause; order within the contract is significant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    pub title: String,
    pub body: String,
}

/// An append-only signature record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    pub email: String,
    pub role: PartyRole,
    pub signature: String,
    pub signed_at: String,
}

/// Escrow funding state, independent of the signing lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EscrowStatus {
    #[default]
    PendingFunding,
    Funded,
    PartiallyReleased,
    Released,
}

impl EscrowStatus {
    /// States from which funds may still be released.
    pub fn is_releasable(self) -> bool {
        matches!(self, Self::Funded | Self::PartiallyReleased)
    }
}

/// Kind of entry in a contract's escrow history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EscrowEventKind {
    PaymentIntent,
    Funding,
    Release,
    LocalPayment,
}

/// An append-only escrow history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscrowEvent {
    pub kind: EscrowEventKind,
    pub status: String,
    #[serde(with = "cents")]
    pub amount: i64,
    pub currency: String,
    pub actor: String,
    pub note: Option<String>,
    pub reference: Option<String>,
    pub created_at: String,
}

impl EscrowEvent {
    /// Builds a history entry stamped with the current time.
    pub fn new(
        kind: EscrowEventKind,
        status: &str,
        amount: i64,
        currency: &str,
        actor: &str,
    ) -> Self {
        Self {
            kind,
            status: status.to_string(),
            amount,
            currency: currency.to_string(),
            actor: actor.to_string(),
            note: None,
            reference: None,
            created_at: crate::types::now_timestamp(),
        }
    }

    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note;
        self
    }

    pub fn with_reference(mut self, reference: Option<String>) -> Self {
        self.reference = reference;
        self
    }
}

/// A persisted contract with its signatures and escrow state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: String,
    pub originator: Party,
    pub recipient: Party,
    pub title: String,
    pub description: String,
    #[serde(with = "cents")]
    pub amount: i64,
    pub currency: String,
    pub deadline: String,
    pub clauses: Vec<Clause>,
    pub status: ContractStatus,
    pub signatures: Vec<Signature>,
    pub escrow_status: EscrowStatus,
    #[serde(with = "cents")]
    pub escrowed_amount: i64,
    #[serde(with = "cents")]
    pub released_amount: i64,
    pub payer_email: Option<String>,
    pub payment_intent_id: Option<String>,
    pub escrow_history: Vec<EscrowEvent>,
    pub created_at: String,
    pub updated_at: String,
}

impl Contract {
    /// The party role `email` holds on this contract, if any.
    ///
    /// When someone drafts a contract addressed to themselves the originator
    /// role wins, but drafting rejects that shape up front.
    pub fn party_role(&self, email: &str) -> Option<PartyRole> {
        if self.originator.email == email {
            Some(PartyRole::Originator)
        } else if self.recipient.email == email {
            Some(PartyRole::Recipient)
        } else {
            None
        }
    }

    pub fn is_party(&self, email: &str) -> bool {
        self.party_role(email).is_some()
    }

    /// The party on the other side from `email`.
    pub fn counterparty(&self, email: &str) -> Option<&Party> {
        match self.party_role(email)? {
            PartyRole::Originator => Some(&self.recipient),
            PartyRole::Recipient => Some(&self.originator),
        }
    }

    /// Funds still held in escrow, never negative.
    pub fn remaining_escrow(&self) -> i64 {
        (self.escrowed_amount - self.released_amount).max(0)
    }

    /// The party funds are released to: whichever side did not pay.
    pub fn payee_email(&self) -> &str {
        match self.payer_email.as_deref() {
            Some(payer) if payer == self.recipient.email => &self.originator.email,
            _ => &self.recipient.email,
        }
    }

    /// Status implied by the current signature list.
    ///
    /// A contract is signed once both party emails appear among the
    /// signatures. A draft stays a draft until the originator signs.
    pub fn status_after_signatures(&self) -> ContractStatus {
        let signed_by = |email: &str| self.signatures.iter().any(|s| s.email == email);
        let originator_signed = signed_by(&self.originator.email);
        if originator_signed && signed_by(&self.recipient.email) {
            ContractStatus::Signed
        } else if originator_signed || self.status != ContractStatus::Draft {
            ContractStatus::Sent
        } else {
            ContractStatus::Draft
        }
    }

    /// Both parties' emails, originator first.
    pub fn party_emails(&self) -> [&str; 2] {
        [&self.originator.email, &self.recipient.email]
    }
}

/// Client-supplied contract fields for drafting, updating, and sending.
///
/// Everything is optional at the wire level so that missing fields can be
/// reported together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractInput {
    #[serde(default)]
    pub originator: Option<Party>,
    #[serde(default)]
    pub recipient: Option<Party>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub clauses: Option<Vec<Clause>>,
}

impl ContractInput {
    /// Names of required fields that are absent or blank, in a stable order.
    pub fn missing_fields(&self) -> Vec<String> {
        fn blank(value: &Option<String>) -> bool {
            value.as_deref().is_none_or(|v| v.trim().is_empty())
        }

        let mut missing = Vec::new();
        if self
            .recipient
            .as_ref()
            .is_none_or(|p| p.email.trim().is_empty())
        {
            missing.push("recipient".to_string());
        }
        if blank(&self.title) {
            missing.push("title".to_string());
        }
        if blank(&self.description) {
            missing.push("description".to_string());
        }
        if self.amount.is_none() {
            missing.push("amount".to_string());
        }
        if blank(&self.deadline) {
            missing.push("deadline".to_string());
        }
        missing
    }

    /// Overlays the fields present in `patch` onto `self`.
    pub fn merge(&mut self, patch: ContractInput) {
        if patch.recipient.is_some() {
            self.recipient = patch.recipient;
        }
        if patch.title.is_some() {
            self.title = patch.title;
        }
        if patch.description.is_some() {
            self.description = patch.description;
        }
        if patch.amount.is_some() {
            self.amount = patch.amount;
        }
        if patch.currency.is_some() {
            self.currency = patch.currency;
        }
        if patch.deadline.is_some() {
            self.deadline = patch.deadline;
        }
        if patch.clauses.is_some() {
            self.clauses = patch.clauses;
        }
    }
}

impl From<&Contract> for ContractInput {
    fn from(contract: &Contract) -> Self {
        Self {
            originator: Some(contract.originator.clone()),
            recipient: Some(contract.recipient.clone()),
            title: Some(contract.title.clone()),
            description: Some(contract.description.clone()),
            amount: Some(crate::types::from_cents(contract.amount)),
            currency: Some(contract.currency.clone()),
            deadline: Some(contract.deadline.clone()),
            clauses: Some(contract.clauses.clone()),
        }
    }
}

/// Result of appending a signature inside one storage transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureOutcome {
    Appended(Contract),
    AlreadySigned,
    /// The contract was not in one of the expected statuses.
    WrongStatus(ContractStatus),
    NotFound,
}

/// Result of a conditional escrow update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscrowOutcome {
    Applied(Contract),
    /// The precondition (status or balance) no longer held.
    Rejected(Contract),
    NotFound,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contract() -> Contract {
        Contract {
            id: "c1".into(),
            originator: Party {
                name: "Alice".into(),
                email: "alice@x.io".into(),
                ..Party::default()
            },
            recipient: Party {
                name: "Bob".into(),
                email: "bob@x.io".into(),
                ..Party::default()
            },
            title: "Logo".into(),
            description: "Design a logo".into(),
            amount: 10_000,
            currency: "usd".into(),
            deadline: "2026-12-01".into(),
            clauses: vec![],
            status: ContractStatus::Sent,
            signatures: vec![],
            escrow_status: EscrowStatus::PendingFunding,
            escrowed_amount: 0,
            released_amount: 0,
            payer_email: None,
            payment_intent_id: None,
            escrow_history: vec![],
            created_at: "2026-01-01T00:00:00.000Z".into(),
            updated_at: "2026-01-01T00:00:00.000Z".into(),
        }
    }

    fn sig(email: &str, role: PartyRole) -> Signature {
        Signature {
            email: email.into(),
            role,
            signature: "sig".into(),
            signed_at: "2026-01-02T00:00:00.000Z".into(),
        }
    }

    #[test]
    fn signed_requires_both_party_emails() {
        let mut c = contract();
        c.signatures.push(sig("alice@x.io", PartyRole::Originator));
        assert_eq!(c.status_after_signatures(), ContractStatus::Sent);
        c.signatures.push(sig("bob@x.io", PartyRole::Recipient));
        assert_eq!(c.status_after_signatures(), ContractStatus::Signed);
    }

    #[test]
    fn stray_signatures_do_not_sign() {
        let mut c = contract();
        c.signatures.push(sig("alice@x.io", PartyRole::Originator));
        c.signatures.push(sig("mallory@x.io", PartyRole::Recipient));
        assert_eq!(c.status_after_signatures(), ContractStatus::Sent);
    }

    #[test]
    fn draft_without_signatures_stays_draft() {
        let mut c = contract();
        c.status = ContractStatus::Draft;
        assert_eq!(c.status_after_signatures(), ContractStatus::Draft);
    }

    #[test]
    fn missing_fields_are_reported_together() {
        let input = ContractInput {
            title: Some("  ".into()),
            description: Some("x".into()),
            ..ContractInput::default()
        };
        assert_eq!(
            input.missing_fields(),
            vec!["recipient", "title", "amount", "deadline"]
        );
    }

    #[test]
    fn payee_is_the_non_paying_party() {
        let mut c = contract();
        assert_eq!(c.payee_email(), "bob@x.io");
        c.payer_email = Some("bob@x.io".into());
        assert_eq!(c.payee_email(), "alice@x.io");
        c.payer_email = Some("alice@x.io".into());
        assert_eq!(c.payee_email(), "bob@x.io");
    }

    #[test]
    fn amounts_serialize_as_decimals() {
        let mut c = contract();
        c.escrowed_amount = 10_000;
        c.released_amount = 4_000;
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["amount"], 100.0);
        assert_eq!(json["releasedAmount"], 40.0);
        assert_eq!(json["escrowStatus"], "pending_funding");
        assert_eq!(c.remaining_escrow(), 6_000);
    }
}
