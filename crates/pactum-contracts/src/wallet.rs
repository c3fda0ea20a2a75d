// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wallet balances, payout onboarding, and withdrawals.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use pactum_core::model::{TransactionKind, TransactionStatus, WalletSummary, WalletTransaction};
use pactum_core::traits::PayoutStatus;
use pactum_core::types::to_cents;
use pactum_core::{Identity, PactumError, PaymentProcessor, StorageAdapter};

/// A hosted onboarding link for the caller's processor account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingLink {
    pub account_id: String,
    pub url: String,
}

pub struct WalletService {
    storage: Arc<dyn StorageAdapter>,
    payments: Arc<dyn PaymentProcessor>,
    currency: String,
}

impl WalletService {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        payments: Arc<dyn PaymentProcessor>,
        currency: &str,
    ) -> Self {
        Self {
            storage,
            payments,
            currency: currency.to_string(),
        }
    }

    pub async fn summary(&self, actor: &Identity) -> Result<WalletSummary, PactumError> {
        let transactions = self.storage.list_wallet_transactions(&actor.email).await?;
        let contracts = self.storage.list_contracts_for(&actor.email).await?;
        Ok(WalletSummary::fold(&actor.email, &transactions, &contracts))
    }

    pub async fn transactions(
        &self,
        actor: &Identity,
    ) -> Result<Vec<WalletTransaction>, PactumError> {
        self.storage.list_wallet_transactions(&actor.email).await
    }

    /// Creates the caller's processor account on first use.
    pub async fn onboard(&self, actor: &Identity) -> Result<OnboardingLink, PactumError> {
        let existing = self
            .storage
            .get_profile(&actor.email)
            .await?
            .and_then(|p| p.payment_account_id);
        let account_id = match existing {
            Some(id) => id,
            None => {
                let id = self.payments.create_account(&actor.email).await?;
                self.storage.set_payment_account(&actor.email, &id).await?;
                info!(email = %actor.email, account_id = %id, "payment account created");
                id
            }
        };
        let url = self.payments.create_onboarding_link(&account_id).await?;
        Ok(OnboardingLink { account_id, url })
    }

    /// Reserves the amount against the available balance, then asks the
    /// processor to pay it out. The withdrawal row follows the payout status.
    pub async fn withdraw(
        &self,
        actor: &Identity,
        amount: f64,
        currency: Option<&str>,
    ) -> Result<WalletTransaction, PactumError> {
        let cents = if amount.is_finite() { to_cents(amount) } else { 0 };
        if cents <= 0 {
            return Err(PactumError::InvalidInput(
                "amount must be positive".to_string(),
            ));
        }
        let account_id = self
            .storage
            .get_profile(&actor.email)
            .await?
            .and_then(|p| p.payment_account_id)
            .ok_or_else(|| {
                PactumError::InvalidInput("complete payout onboarding before withdrawing".to_string())
            })?;
        let currency = currency
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| self.currency.clone());

        let request = WalletTransaction::new(
            &actor.email,
            TransactionKind::Withdrawal,
            TransactionStatus::Pending,
            cents,
            &currency,
        );
        let mut withdrawal = self
            .storage
            .reserve_withdrawal(&request)
            .await?
            .ok_or_else(|| {
                PactumError::InvalidInput("amount exceeds available balance".to_string())
            })?;

        let payout = match self
            .payments
            .create_payout(&account_id, cents, &currency)
            .await
        {
            Ok(payout) => payout,
            Err(e) => {
                warn!(email = %actor.email, error = %e, "payout failed");
                self.storage
                    .update_transaction_status(&withdrawal.id, TransactionStatus::Failed, None)
                    .await?;
                return Err(e);
            }
        };

        let status = match payout.status {
            PayoutStatus::Paid => TransactionStatus::Completed,
            PayoutStatus::Pending => TransactionStatus::Pending,
            PayoutStatus::Failed => TransactionStatus::Failed,
        };
        self.storage
            .update_transaction_status(&withdrawal.id, status, Some(&payout.id))
            .await?;
        withdrawal.status = status;
        withdrawal.reference = Some(payout.id);
        info!(email = %actor.email, amount = cents, %status, "withdrawal recorded");
        Ok(withdrawal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pactum_test_utils::TestHarness;
    use pactum_test_utils::mock_services::PaymentCall;

    use crate::testing::released_to_bob;

    fn wallet(harness: &TestHarness) -> WalletService {
        WalletService::new(harness.storage.clone(), harness.payments.clone(), "usd")
    }

    #[tokio::test]
    async fn onboarding_creates_account_once() {
        let harness = TestHarness::new().await.unwrap();
        let svc = wallet(&harness);
        let bob = Identity::user("bob@x.io");

        let first = svc.onboard(&bob).await.unwrap();
        let second = svc.onboard(&bob).await.unwrap();
        assert_eq!(first.account_id, second.account_id);
        assert!(first.url.contains(&first.account_id));

        let creates = harness
            .payments
            .calls()
            .await
            .into_iter()
            .filter(|c| matches!(c, PaymentCall::CreateAccount { .. }))
            .count();
        assert_eq!(creates, 1);
    }

    #[tokio::test]
    async fn summary_folds_payouts_and_escrow() {
        let harness = TestHarness::new().await.unwrap();
        released_to_bob(&harness, 40.0).await;
        let svc = wallet(&harness);

        let bob = svc.summary(&Identity::user("bob@x.io")).await.unwrap();
        assert_eq!(bob.available, 4_000);
        assert_eq!(bob.escrowed, 6_000);
        let alice = svc.summary(&Identity::user("alice@x.io")).await.unwrap();
        assert_eq!(alice.available, 0);
        assert_eq!(alice.escrowed, 6_000);
    }

    #[tokio::test]
    async fn withdrawal_follows_payout_status() {
        let harness = TestHarness::new().await.unwrap();
        released_to_bob(&harness, 40.0).await;
        let svc = wallet(&harness);
        let bob = Identity::user("bob@x.io");
        svc.onboard(&bob).await.unwrap();

        let pending = svc.withdraw(&bob, 15.0, None).await.unwrap();
        assert_eq!(pending.status, TransactionStatus::Pending);
        assert!(pending.reference.is_some());
        let summary = svc.summary(&bob).await.unwrap();
        assert_eq!(summary.available, 2_500);
        assert_eq!(summary.pending, 1_500);

        harness.payments.set_payout_status(PayoutStatus::Paid).await;
        let paid = svc.withdraw(&bob, 5.0, Some("USD")).await.unwrap();
        assert_eq!(paid.status, TransactionStatus::Completed);
        assert_eq!(paid.currency, "usd");
        assert_eq!(svc.summary(&bob).await.unwrap().available, 2_000);

        let stored = svc.transactions(&bob).await.unwrap();
        let row = stored.iter().find(|t| t.id == paid.id).unwrap();
        assert_eq!(row.status, TransactionStatus::Completed);
        assert_eq!(row.reference, paid.reference);
    }

    #[tokio::test]
    async fn failed_payout_releases_the_reservation() {
        let harness = TestHarness::new().await.unwrap();
        released_to_bob(&harness, 40.0).await;
        let svc = wallet(&harness);
        let bob = Identity::user("bob@x.io");
        svc.onboard(&bob).await.unwrap();

        harness.payments.set_failing(true);
        let err = svc.withdraw(&bob, 10.0, None).await.unwrap_err();
        assert!(matches!(err, PactumError::Upstream { .. }));
        assert_eq!(svc.summary(&bob).await.unwrap().available, 4_000);
        let failed = svc
            .transactions(&bob)
            .await
            .unwrap()
            .into_iter()
            .filter(|t| t.kind == TransactionKind::Withdrawal)
            .collect::<Vec<_>>();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].status, TransactionStatus::Failed);
    }

    #[tokio::test]
    async fn withdraw_requires_onboarding_and_balance() {
        let harness = TestHarness::new().await.unwrap();
        released_to_bob(&harness, 40.0).await;
        let svc = wallet(&harness);
        let bob = Identity::user("bob@x.io");

        assert!(matches!(
            svc.withdraw(&bob, 10.0, None).await.unwrap_err(),
            PactumError::InvalidInput(m) if m.contains("onboarding")
        ));
        svc.onboard(&bob).await.unwrap();
        assert!(matches!(
            svc.withdraw(&bob, 40.01, None).await.unwrap_err(),
            PactumError::InvalidInput(m) if m == "amount exceeds available balance"
        ));
        assert!(matches!(
            svc.withdraw(&bob, -5.0, None).await.unwrap_err(),
            PactumError::InvalidInput(_)
        ));
    }
}
