// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Escrow transitions. Each one is a conditional UPDATE plus exactly one
//! history row, committed together.

use pactum_core::PactumError;
use pactum_core::model::{Contract, EscrowEvent, EscrowOutcome, WalletTransaction};
use pactum_core::types::now_timestamp;
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::queries::contracts::load_contract;
use crate::queries::wallet::insert_wallet_tx;

pub(crate) fn insert_history(
    conn: &rusqlite::Connection,
    contract_id: &str,
    entry: &EscrowEvent,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO escrow_history (contract_id, kind, status, amount_cents, currency,
                                     actor, note, reference, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            contract_id,
            entry.kind.to_string(),
            entry.status,
            entry.amount,
            entry.currency,
            entry.actor,
            entry.note,
            entry.reference,
            entry.created_at,
        ],
    )?;
    Ok(())
}

/// Shared tail of every transition: on zero changed rows report why,
/// otherwise append the side rows and commit.
fn finish(
    tx: rusqlite::Transaction<'_>,
    contract_id: &str,
    changed: usize,
    entry: &EscrowEvent,
    wallet: Option<&WalletTransaction>,
) -> rusqlite::Result<EscrowOutcome> {
    if changed == 0 {
        return Ok(match load_contract(&tx, contract_id)? {
            Some(contract) => EscrowOutcome::Rejected(contract),
            None => EscrowOutcome::NotFound,
        });
    }
    insert_history(&tx, contract_id, entry)?;
    if let Some(wallet) = wallet {
        insert_wallet_tx(&tx, wallet)?;
    }
    let contract: Option<Contract> = load_contract(&tx, contract_id)?;
    tx.commit()?;
    Ok(contract.map_or(EscrowOutcome::NotFound, EscrowOutcome::Applied))
}

pub async fn record_payment_intent(
    db: &Database,
    contract_id: &str,
    payer_email: &str,
    intent_id: &str,
    entry: &EscrowEvent,
) -> Result<EscrowOutcome, PactumError> {
    let contract_id = contract_id.to_string();
    let payer_email = payer_email.to_string();
    let intent_id = intent_id.to_string();
    let entry = entry.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE contracts SET payer_email = ?2, payment_intent_id = ?3, updated_at = ?4
                 WHERE id = ?1 AND status = 'signed' AND escrow_status = 'pending_funding'",
                params![contract_id, payer_email, intent_id, now_timestamp()],
            )?;
            finish(tx, &contract_id, changed, &entry, None)
        })
        .await
        .map_err(map_tr_err)
}

/// `pending_funding -> funded`, setting the escrowed balance. The depositor
/// becomes the payer unless a payment intent already named one.
pub async fn confirm_funding(
    db: &Database,
    contract_id: &str,
    amount: i64,
    entry: &EscrowEvent,
    deposit: &WalletTransaction,
) -> Result<EscrowOutcome, PactumError> {
    let contract_id = contract_id.to_string();
    let entry = entry.clone();
    let deposit = deposit.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE contracts SET escrow_status = 'funded', escrowed_cents = ?2,
                                      released_cents = 0, updated_at = ?3,
                                      payer_email = COALESCE(payer_email, ?4)
                 WHERE id = ?1 AND escrow_status = 'pending_funding' AND ?2 > 0",
                params![contract_id, amount, now_timestamp(), deposit.user_email],
            )?;
            finish(tx, &contract_id, changed, &entry, Some(&deposit))
        })
        .await
        .map_err(map_tr_err)
}

/// Adds `amount` to the released balance when the escrow still covers it.
///
/// The history row records the status the UPDATE actually produced, not the
/// caller's plan, which may be stale under concurrent releases.
pub async fn release_funds(
    db: &Database,
    contract_id: &str,
    amount: i64,
    entry: &EscrowEvent,
    payout: &WalletTransaction,
) -> Result<EscrowOutcome, PactumError> {
    let contract_id = contract_id.to_string();
    let mut entry = entry.clone();
    let payout = payout.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE contracts SET
                    released_cents = released_cents + ?2,
                    escrow_status = CASE WHEN released_cents + ?2 >= escrowed_cents
                                         THEN 'released' ELSE 'partially_released' END,
                    updated_at = ?3
                 WHERE id = ?1 AND ?2 > 0
                   AND escrow_status IN ('funded', 'partially_released')
                   AND released_cents + ?2 <= escrowed_cents",
                params![contract_id, amount, now_timestamp()],
            )?;
            if changed > 0 {
                entry.status = tx.query_row(
                    "SELECT escrow_status FROM contracts WHERE id = ?1",
                    params![contract_id],
                    |row| row.get(0),
                )?;
            }
            finish(tx, &contract_id, changed, &entry, Some(&payout))
        })
        .await
        .map_err(map_tr_err)
}

/// History and wallet rows only; balances stay as they are.
pub async fn record_local_payment(
    db: &Database,
    contract_id: &str,
    entry: &EscrowEvent,
    payment: &WalletTransaction,
) -> Result<EscrowOutcome, PactumError> {
    let contract_id = contract_id.to_string();
    let entry = entry.clone();
    let payment = payment.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE contracts SET updated_at = ?2 WHERE id = ?1",
                params![contract_id, now_timestamp()],
            )?;
            finish(tx, &contract_id, changed, &entry, Some(&payment))
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::contracts::{get_contract, insert_contract};
    use crate::queries::contracts::tests::{sample_contract, setup_db};
    use crate::queries::wallet::list_wallet_transactions;
    use pactum_core::model::{
        ContractStatus, EscrowEventKind, EscrowStatus, TransactionKind, TransactionStatus,
    };

    fn entry(kind: EscrowEventKind, status: &str, amount: i64) -> EscrowEvent {
        EscrowEvent::new(kind, status, amount, "usd", "alice@x.io")
    }

    fn wallet(email: &str, kind: TransactionKind, status: TransactionStatus, amount: i64) -> WalletTransaction {
        WalletTransaction::new(email, kind, status, amount, "usd").for_contract("c1")
    }

    async fn funded_db() -> (Database, tempfile::TempDir) {
        let (db, dir) = setup_db().await;
        insert_contract(&db, &sample_contract("c1", ContractStatus::Signed))
            .await
            .unwrap();
        record_payment_intent(
            &db,
            "c1",
            "alice@x.io",
            "pi_1",
            &entry(EscrowEventKind::PaymentIntent, "created", 10_000),
        )
        .await
        .unwrap();
        let outcome = confirm_funding(
            &db,
            "c1",
            10_000,
            &entry(EscrowEventKind::Funding, "funded", 10_000),
            &wallet("alice@x.io", TransactionKind::Deposit, TransactionStatus::Escrowed, 10_000),
        )
        .await
        .unwrap();
        assert!(matches!(outcome, EscrowOutcome::Applied(ref c) if c.escrow_status == EscrowStatus::Funded));
        (db, dir)
    }

    #[tokio::test]
    async fn payment_intent_requires_signed_contract() {
        let (db, _dir) = setup_db().await;
        insert_contract(&db, &sample_contract("c1", ContractStatus::Sent))
            .await
            .unwrap();
        let outcome = record_payment_intent(
            &db,
            "c1",
            "alice@x.io",
            "pi_1",
            &entry(EscrowEventKind::PaymentIntent, "created", 10_000),
        )
        .await
        .unwrap();
        let EscrowOutcome::Rejected(contract) = outcome else {
            panic!("expected Rejected, got {outcome:?}");
        };
        assert!(contract.escrow_history.is_empty());
        assert!(contract.payment_intent_id.is_none());

        let missing = record_payment_intent(
            &db,
            "nope",
            "alice@x.io",
            "pi_1",
            &entry(EscrowEventKind::PaymentIntent, "created", 1),
        )
        .await
        .unwrap();
        assert_eq!(missing, EscrowOutcome::NotFound);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn funding_twice_is_rejected() {
        let (db, _dir) = funded_db().await;
        let again = confirm_funding(
            &db,
            "c1",
            10_000,
            &entry(EscrowEventKind::Funding, "funded", 10_000),
            &wallet("alice@x.io", TransactionKind::Deposit, TransactionStatus::Escrowed, 10_000),
        )
        .await
        .unwrap();
        let EscrowOutcome::Rejected(contract) = again else {
            panic!("expected Rejected, got {again:?}");
        };
        assert_eq!(contract.escrowed_amount, 10_000);
        // payment intent + funding
        assert_eq!(contract.escrow_history.len(), 2);
        assert_eq!(
            list_wallet_transactions(&db, "alice@x.io").await.unwrap().len(),
            1
        );
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn partial_then_full_release() {
        let (db, _dir) = funded_db().await;
        let payout = |amount| {
            wallet("bob@x.io", TransactionKind::Payout, TransactionStatus::Available, amount)
        };

        let outcome = release_funds(
            &db,
            "c1",
            4_000,
            &entry(EscrowEventKind::Release, "partially_released", 4_000),
            &payout(4_000),
        )
        .await
        .unwrap();
        let EscrowOutcome::Applied(partial) = outcome else {
            panic!("expected Applied, got {outcome:?}");
        };
        assert_eq!(partial.escrow_status, EscrowStatus::PartiallyReleased);
        assert_eq!(partial.released_amount, 4_000);

        let over = release_funds(
            &db,
            "c1",
            7_000,
            &entry(EscrowEventKind::Release, "released", 7_000),
            &payout(7_000),
        )
        .await
        .unwrap();
        assert!(matches!(over, EscrowOutcome::Rejected(ref c) if c.released_amount == 4_000));

        let outcome = release_funds(
            &db,
            "c1",
            6_000,
            &entry(EscrowEventKind::Release, "released", 6_000),
            &payout(6_000),
        )
        .await
        .unwrap();
        let EscrowOutcome::Applied(done) = outcome else {
            panic!("expected Applied, got {outcome:?}");
        };
        assert_eq!(done.escrow_status, EscrowStatus::Released);
        assert_eq!(done.released_amount, done.escrowed_amount);
        assert_eq!(done.escrow_history.len(), 4);
        assert_eq!(list_wallet_transactions(&db, "bob@x.io").await.unwrap().len(), 2);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn history_records_the_status_actually_reached() {
        let (db, _dir) = funded_db().await;
        let payout = |amount| {
            wallet("bob@x.io", TransactionKind::Payout, TransactionStatus::Available, amount)
        };
        // Both callers planned against released = 0.
        for amount in [6_000, 4_000] {
            release_funds(
                &db,
                "c1",
                amount,
                &entry(EscrowEventKind::Release, "partially_released", amount),
                &payout(amount),
            )
            .await
            .unwrap();
        }
        let contract = get_contract(&db, "c1").await.unwrap().unwrap();
        assert_eq!(contract.escrow_status, EscrowStatus::Released);
        let statuses: Vec<&str> = contract
            .escrow_history
            .iter()
            .map(|e| e.status.as_str())
            .collect();
        assert_eq!(statuses, ["created", "funded", "partially_released", "released"]);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn funding_does_not_wait_for_signatures() {
        let (db, _dir) = setup_db().await;
        insert_contract(&db, &sample_contract("c1", ContractStatus::Sent))
            .await
            .unwrap();
        let outcome = confirm_funding(
            &db,
            "c1",
            10_000,
            &entry(EscrowEventKind::Funding, "funded", 10_000),
            &wallet("alice@x.io", TransactionKind::Deposit, TransactionStatus::Escrowed, 10_000),
        )
        .await
        .unwrap();
        let EscrowOutcome::Applied(contract) = outcome else {
            panic!("expected Applied, got {outcome:?}");
        };
        assert_eq!(contract.status, ContractStatus::Sent);
        assert_eq!(contract.escrow_status, EscrowStatus::Funded);
        assert_eq!(contract.payer_email.as_deref(), Some("alice@x.io"));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn local_payment_leaves_balances_alone() {
        let (db, _dir) = funded_db().await;
        let outcome = record_local_payment(
            &db,
            "c1",
            &entry(EscrowEventKind::LocalPayment, "recorded", 2_500)
                .with_note(Some("cash".into())),
            &wallet("alice@x.io", TransactionKind::LocalPayment, TransactionStatus::Completed, 2_500),
        )
        .await
        .unwrap();
        let EscrowOutcome::Applied(contract) = outcome else {
            panic!("expected Applied, got {outcome:?}");
        };
        assert_eq!(contract.escrowed_amount, 10_000);
        assert_eq!(contract.released_amount, 0);
        let last = contract.escrow_history.last().unwrap();
        assert_eq!(last.kind, EscrowEventKind::LocalPayment);
        assert_eq!(last.note.as_deref(), Some("cash"));
        db.close().await.unwrap();
    }
}
