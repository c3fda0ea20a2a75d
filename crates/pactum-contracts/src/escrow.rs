// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Escrow ledger: payment intents, funding, releases, and local payments.
//!
//! Each mutation is a single conditional storage transaction that appends
//! exactly one history entry. The checks here only produce friendlier
//! errors; storage rejects anything that lost a race.

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use pactum_core::model::{
    Contract, ContractStatus, EscrowEvent, EscrowEventKind, EscrowOutcome, EscrowStatus,
    RealtimeEvent, TransactionKind, TransactionStatus, WalletTransaction,
};
use pactum_core::traits::{PaymentIntent, broadcast_to};
use pactum_core::types::to_cents;
use pactum_core::{Broadcaster, Identity, PactumError, PaymentProcessor, Room, StorageAdapter};

use crate::service::ensure_party;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmFunding {
    pub contract_id: String,
    pub amount: f64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalPayment {
    pub contract_id: String,
    pub amount: f64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Amount and resulting status of releasing `requested` cents (or the
/// remaining balance) from `contract`.
pub fn plan_release(
    contract: &Contract,
    requested: Option<i64>,
) -> Result<(i64, EscrowStatus), PactumError> {
    if !contract.escrow_status.is_releasable() {
        return Err(PactumError::Conflict(format!(
            "escrow is {}, nothing to release",
            contract.escrow_status
        )));
    }
    let amount = requested.unwrap_or_else(|| contract.remaining_escrow());
    if amount <= 0 {
        return Err(PactumError::InvalidInput(
            "release amount must be positive".to_string(),
        ));
    }
    let released = contract.released_amount + amount;
    if released > contract.escrowed_amount {
        return Err(PactumError::Conflict(
            "release exceeds the escrowed balance".to_string(),
        ));
    }
    let status = if released >= contract.escrowed_amount {
        EscrowStatus::Released
    } else {
        EscrowStatus::PartiallyReleased
    };
    Ok((amount, status))
}

pub struct EscrowLedger {
    storage: Arc<dyn StorageAdapter>,
    broadcaster: Arc<dyn Broadcaster>,
    payments: Arc<dyn PaymentProcessor>,
}

impl EscrowLedger {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        broadcaster: Arc<dyn Broadcaster>,
        payments: Arc<dyn PaymentProcessor>,
    ) -> Self {
        Self {
            storage,
            broadcaster,
            payments,
        }
    }

    /// Asks the processor for an intent covering the contract amount, routed
    /// to the payee's account when they have onboarded.
    pub async fn create_payment_intent(
        &self,
        actor: &Identity,
        contract_id: &str,
    ) -> Result<PaymentIntent, PactumError> {
        let contract = self.load(contract_id).await?;
        ensure_party(&contract, actor)?;
        ensure_intent_allowed(&contract)?;

        let payee = contract
            .counterparty(&actor.email)
            .map(|p| p.email.clone())
            .unwrap_or_default();
        let destination = self
            .storage
            .get_profile(&payee)
            .await?
            .and_then(|p| p.payment_account_id);
        let intent = self
            .payments
            .create_payment_intent(contract.amount, &contract.currency, destination.as_deref())
            .await?;

        let entry = EscrowEvent::new(
            EscrowEventKind::PaymentIntent,
            "created",
            contract.amount,
            &contract.currency,
            &actor.email,
        )
        .with_reference(Some(intent.id.clone()));
        let outcome = self
            .storage
            .record_payment_intent(contract_id, &actor.email, &intent.id, &entry)
            .await?;
        self.apply(contract_id, outcome, entry, "escrow is no longer pending funding")
            .await?;
        info!(contract_id, payer = %actor.email, intent_id = %intent.id, "payment intent created");
        Ok(intent)
    }

    /// `pending_funding -> funded`, with a deposit row for the payer.
    pub async fn confirm_funding(
        &self,
        actor: &Identity,
        req: ConfirmFunding,
    ) -> Result<Contract, PactumError> {
        let amount = positive_cents(req.amount)?;
        let contract = self.load(&req.contract_id).await?;
        ensure_party(&contract, actor)?;
        ensure_pending(&contract)?;

        let currency = currency_or(&req.currency, &contract);
        let payer = contract
            .payer_email
            .clone()
            .unwrap_or_else(|| actor.email.clone());
        let entry = EscrowEvent::new(EscrowEventKind::Funding, "funded", amount, &currency, &actor.email)
            .with_reference(req.reference.clone());
        let deposit = WalletTransaction::new(
            &payer,
            TransactionKind::Deposit,
            TransactionStatus::Escrowed,
            amount,
            &currency,
        )
        .for_contract(&contract.id)
        .with_reference(req.reference);
        let outcome = self
            .storage
            .confirm_funding(&contract.id, amount, &entry, &deposit)
            .await?;
        let funded = self
            .apply(&contract.id, outcome, entry, "escrow is not pending funding")
            .await?;
        info!(contract_id = %funded.id, amount, payer = %payer, "escrow funded");
        Ok(funded)
    }

    /// Releases `amount` (default: everything left) to the payee.
    pub async fn release(
        &self,
        actor: &Identity,
        contract_id: &str,
        amount: Option<f64>,
    ) -> Result<Contract, PactumError> {
        let contract = self.load(contract_id).await?;
        ensure_party(&contract, actor)?;
        if contract.payer_email.as_deref() != Some(actor.email.as_str()) {
            return Err(PactumError::Forbidden(
                "only the payer can release funds".to_string(),
            ));
        }
        let (amount, status) = plan_release(&contract, amount.map(to_cents))?;

        let entry = EscrowEvent::new(
            EscrowEventKind::Release,
            &status.to_string(),
            amount,
            &contract.currency,
            &actor.email,
        );
        let payout = WalletTransaction::new(
            contract.payee_email(),
            TransactionKind::Payout,
            TransactionStatus::Available,
            amount,
            &contract.currency,
        )
        .for_contract(&contract.id);
        let outcome = self
            .storage
            .release_funds(&contract.id, amount, &entry, &payout)
            .await?;
        let released = self
            .apply(&contract.id, outcome, entry, "release exceeds the escrowed balance")
            .await?;
        info!(
            contract_id = %released.id,
            amount,
            payee = %released.payee_email(),
            status = %released.escrow_status,
            "escrow released"
        );
        Ok(released)
    }

    /// Records a payment made outside the processor. Balances are untouched.
    pub async fn record_local_payment(
        &self,
        actor: &Identity,
        req: LocalPayment,
    ) -> Result<Contract, PactumError> {
        let amount = positive_cents(req.amount)?;
        let contract = self.load(&req.contract_id).await?;
        ensure_party(&contract, actor)?;

        let currency = currency_or(&req.currency, &contract);
        let note = req.note.filter(|n| !n.trim().is_empty());
        let entry = EscrowEvent::new(
            EscrowEventKind::LocalPayment,
            "recorded",
            amount,
            &currency,
            &actor.email,
        )
        .with_note(note);
        let payment = WalletTransaction::new(
            &actor.email,
            TransactionKind::LocalPayment,
            TransactionStatus::Completed,
            amount,
            &currency,
        )
        .for_contract(&contract.id);
        let outcome = self
            .storage
            .record_local_payment(&contract.id, &entry, &payment)
            .await?;
        self.apply(&contract.id, outcome, entry, "local payment was not recorded")
            .await
    }

    async fn load(&self, id: &str) -> Result<Contract, PactumError> {
        self.storage
            .get_contract(id)
            .await?
            .ok_or_else(|| PactumError::not_found("contract", id))
    }

    async fn apply(
        &self,
        contract_id: &str,
        outcome: EscrowOutcome,
        entry: EscrowEvent,
        rejected: &str,
    ) -> Result<Contract, PactumError> {
        let contract = match outcome {
            EscrowOutcome::Applied(contract) => contract,
            EscrowOutcome::Rejected(_) => return Err(PactumError::Conflict(rejected.to_string())),
            EscrowOutcome::NotFound => return Err(PactumError::not_found("contract", contract_id)),
        };
        // The stored row may differ from the planned one (release status).
        let entry = contract.escrow_history.last().cloned().unwrap_or(entry);
        let rooms = contract.party_emails().map(|e| Room::User(e.to_string()));
        broadcast_to(
            self.broadcaster.as_ref(),
            &rooms,
            &RealtimeEvent::escrow_updated(&contract, entry),
        )
        .await;
        Ok(contract)
    }
}

/// Intents are only created for fully signed contracts.
fn ensure_intent_allowed(contract: &Contract) -> Result<(), PactumError> {
    if contract.status != ContractStatus::Signed {
        return Err(PactumError::Conflict(
            "contract must be signed before funding".to_string(),
        ));
    }
    ensure_pending(contract)
}

/// Processor callbacks fund the escrow whatever the signature state is.
fn ensure_pending(contract: &Contract) -> Result<(), PactumError> {
    if contract.escrow_status != EscrowStatus::PendingFunding {
        return Err(PactumError::Conflict(
            "escrow is not pending funding".to_string(),
        ));
    }
    Ok(())
}

fn positive_cents(amount: f64) -> Result<i64, PactumError> {
    let cents = if amount.is_finite() { to_cents(amount) } else { 0 };
    if cents <= 0 {
        return Err(PactumError::InvalidInput(
            "amount must be positive".to_string(),
        ));
    }
    Ok(cents)
}

fn currency_or(currency: &Option<String>, contract: &Contract) -> String {
    currency
        .as_deref()
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| contract.currency.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pactum_core::model::{ContractInput, Party};
    use pactum_test_utils::TestHarness;
    use pactum_test_utils::mock_services::PaymentCall;
    use proptest::prelude::*;

    use crate::testing::{ledger, signed_contract};

    fn funding(id: &str, amount: f64) -> ConfirmFunding {
        ConfirmFunding {
            contract_id: id.to_string(),
            amount,
            currency: None,
            reference: Some("pi_ref".into()),
        }
    }

    #[tokio::test]
    async fn intent_fund_and_release_in_two_steps() {
        let harness = TestHarness::new().await.unwrap();
        let escrow = ledger(&harness);
        let contract = signed_contract(&harness).await;
        let alice = Identity::user("alice@x.io");
        harness
            .storage
            .set_payment_account("bob@x.io", "acct_bob")
            .await
            .unwrap();

        let intent = escrow.create_payment_intent(&alice, &contract.id).await.unwrap();
        assert!(intent.client_secret.starts_with(&intent.id));
        assert_eq!(
            harness.payments.calls().await,
            vec![PaymentCall::PaymentIntent {
                amount_cents: 10_000,
                currency: "usd".into(),
                destination: Some("acct_bob".into()),
            }]
        );

        let funded = escrow
            .confirm_funding(&alice, funding(&contract.id, 100.0))
            .await
            .unwrap();
        assert_eq!(funded.escrow_status, EscrowStatus::Funded);
        assert_eq!(funded.escrowed_amount, 10_000);
        assert_eq!(funded.payer_email.as_deref(), Some("alice@x.io"));

        let partial = escrow.release(&alice, &contract.id, Some(40.0)).await.unwrap();
        assert_eq!(partial.escrow_status, EscrowStatus::PartiallyReleased);
        assert_eq!(partial.released_amount, 4_000);

        let done = escrow.release(&alice, &contract.id, None).await.unwrap();
        assert_eq!(done.escrow_status, EscrowStatus::Released);
        assert_eq!(done.released_amount, 10_000);
        assert_eq!(done.escrow_history.len(), 4);

        let bob_txs = harness.storage.list_wallet_transactions("bob@x.io").await.unwrap();
        assert_eq!(bob_txs.len(), 2);
        assert!(bob_txs.iter().all(|t| t.kind == TransactionKind::Payout));
        assert_eq!(harness.broadcaster.events_named("escrowUpdated").len(), 4 * 2);
    }

    #[tokio::test]
    async fn funding_needs_pending_escrow_not_signatures() {
        let harness = TestHarness::new().await.unwrap();
        let escrow = ledger(&harness);
        let contracts = crate::testing::contracts(&harness);
        let alice = Identity::user("alice@x.io");
        let draft = contracts
            .create_draft(&alice, crate::testing::contract_input())
            .await
            .unwrap();
        let sent = contracts
            .sign(
                &alice,
                crate::service::SignContract {
                    contract_id: draft.id.clone(),
                    role: pactum_core::model::PartyRole::Originator,
                    signature: "sig".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(sent.status, ContractStatus::Sent);

        // Intents still wait for both signatures.
        assert!(matches!(
            escrow.create_payment_intent(&alice, &sent.id).await.unwrap_err(),
            PactumError::Conflict(_)
        ));
        assert!(matches!(
            escrow.confirm_funding(&alice, funding(&sent.id, 0.0)).await.unwrap_err(),
            PactumError::InvalidInput(_)
        ));

        let funded = escrow
            .confirm_funding(&alice, funding(&sent.id, 100.0))
            .await
            .unwrap();
        assert_eq!(funded.status, ContractStatus::Sent);
        assert_eq!(funded.escrow_status, EscrowStatus::Funded);
        assert!(matches!(
            escrow.confirm_funding(&alice, funding(&sent.id, 100.0)).await.unwrap_err(),
            PactumError::Conflict(_)
        ));
    }

    #[tokio::test]
    async fn concurrent_releases_log_the_final_status() {
        let harness = TestHarness::new().await.unwrap();
        let escrow = ledger(&harness);
        let contract = signed_contract(&harness).await;
        let alice = Identity::user("alice@x.io");
        escrow
            .confirm_funding(&alice, funding(&contract.id, 100.0))
            .await
            .unwrap();

        let (first, second) = tokio::join!(
            escrow.release(&alice, &contract.id, Some(60.0)),
            escrow.release(&alice, &contract.id, Some(40.0)),
        );
        first.unwrap();
        second.unwrap();

        let done = harness.storage.get_contract(&contract.id).await.unwrap().unwrap();
        assert_eq!(done.escrow_status, EscrowStatus::Released);
        assert_eq!(done.released_amount, 10_000);
        let statuses: Vec<&str> = done.escrow_history.iter().map(|e| e.status.as_str()).collect();
        assert_eq!(statuses, ["funded", "partially_released", "released"]);
    }

    #[tokio::test]
    async fn only_payer_releases_and_never_past_balance() {
        let harness = TestHarness::new().await.unwrap();
        let escrow = ledger(&harness);
        let contract = signed_contract(&harness).await;
        let alice = Identity::user("alice@x.io");
        escrow
            .confirm_funding(&alice, funding(&contract.id, 100.0))
            .await
            .unwrap();

        assert!(matches!(
            escrow
                .release(&Identity::user("bob@x.io"), &contract.id, None)
                .await
                .unwrap_err(),
            PactumError::Forbidden(_)
        ));
        assert!(matches!(
            escrow.release(&alice, &contract.id, Some(150.0)).await.unwrap_err(),
            PactumError::Conflict(_)
        ));
        escrow.release(&alice, &contract.id, None).await.unwrap();
        assert!(matches!(
            escrow.release(&alice, &contract.id, Some(1.0)).await.unwrap_err(),
            PactumError::Conflict(_)
        ));
    }

    #[tokio::test]
    async fn local_payment_leaves_balances_alone() {
        let harness = TestHarness::new().await.unwrap();
        let escrow = ledger(&harness);
        let contract = signed_contract(&harness).await;
        let bob = Identity::user("bob@x.io");

        let updated = escrow
            .record_local_payment(
                &bob,
                LocalPayment {
                    contract_id: contract.id.clone(),
                    amount: 25.0,
                    currency: Some("EUR".into()),
                    note: Some("cash on delivery".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.escrow_status, EscrowStatus::PendingFunding);
        assert_eq!(updated.escrowed_amount, 0);
        let entry = updated.escrow_history.last().unwrap();
        assert_eq!(entry.kind, EscrowEventKind::LocalPayment);
        assert_eq!(entry.currency, "eur");
        assert_eq!(entry.note.as_deref(), Some("cash on delivery"));

        let txs = harness.storage.list_wallet_transactions("bob@x.io").await.unwrap();
        assert_eq!(txs[0].status, TransactionStatus::Completed);
    }

    #[tokio::test]
    async fn strangers_and_processor_failures() {
        let harness = TestHarness::new().await.unwrap();
        let escrow = ledger(&harness);
        let contract = signed_contract(&harness).await;

        assert!(matches!(
            escrow
                .create_payment_intent(&Identity::user("mallory@x.io"), &contract.id)
                .await
                .unwrap_err(),
            PactumError::Forbidden(_)
        ));

        harness.payments.set_failing(true);
        let err = escrow
            .create_payment_intent(&Identity::user("alice@x.io"), &contract.id)
            .await
            .unwrap_err();
        assert!(matches!(err, PactumError::Upstream { .. }));
        let unchanged = harness.storage.get_contract(&contract.id).await.unwrap().unwrap();
        assert!(unchanged.payment_intent_id.is_none());
        assert!(unchanged.escrow_history.is_empty());
    }

    fn funded(escrowed: i64, released: i64) -> Contract {
        let mut contract = crate::signing::build_draft(
            "alice@x.io",
            ContractInput {
                recipient: Some(Party {
                    email: "bob@x.io".into(),
                    ..Party::default()
                }),
                title: Some("t".into()),
                description: Some("d".into()),
                amount: Some(1.0),
                deadline: Some("2026-12-01".into()),
                ..ContractInput::default()
            },
            "usd",
        )
        .unwrap();
        contract.escrowed_amount = escrowed;
        contract.released_amount = released;
        contract.escrow_status = if released == 0 {
            EscrowStatus::Funded
        } else {
            EscrowStatus::PartiallyReleased
        };
        contract
    }

    proptest! {
        #[test]
        fn release_never_exceeds_escrow(
            escrowed in 1i64..1_000_000,
            released_frac in 0.0f64..1.0,
            requested in proptest::option::of(-10i64..2_000_000),
        ) {
            let released = ((escrowed as f64) * released_frac) as i64;
            let contract = funded(escrowed, released.min(escrowed - 1));
            match plan_release(&contract, requested) {
                Ok((amount, status)) => {
                    let total = contract.released_amount + amount;
                    prop_assert!(amount > 0);
                    prop_assert!(total <= contract.escrowed_amount);
                    prop_assert_eq!(status == EscrowStatus::Released, total == contract.escrowed_amount);
                }
                Err(PactumError::InvalidInput(_)) => prop_assert!(requested.is_some_and(|r| r <= 0)),
                Err(PactumError::Conflict(_)) => {
                    prop_assert!(requested.is_some_and(|r| contract.released_amount + r > contract.escrowed_amount));
                }
                Err(other) => prop_assert!(false, "unexpected error: {other:?}"),
            }
        }
    }
}
