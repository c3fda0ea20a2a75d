// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wallet ledger rows.

use pactum_core::PactumError;
use pactum_core::model::{TransactionStatus, WalletTransaction};
use pactum_core::types::now_timestamp;
use rusqlite::{Row, params};

use crate::database::{Database, map_tr_err, parse_column};

const WALLET_COLUMNS: &str =
    "id, user_email, kind, status, amount_cents, currency, contract_id, reference, created_at";

fn wallet_from_row(row: &Row<'_>) -> rusqlite::Result<WalletTransaction> {
    Ok(WalletTransaction {
        id: row.get(0)?,
        user_email: row.get(1)?,
        kind: parse_column(2, row.get(2)?)?,
        status: parse_column(3, row.get(3)?)?,
        amount: row.get(4)?,
        currency: row.get(5)?,
        contract_id: row.get(6)?,
        reference: row.get(7)?,
        created_at: row.get(8)?,
    })
}

pub(crate) fn insert_wallet_tx(
    conn: &rusqlite::Connection,
    tx: &WalletTransaction,
) -> rusqlite::Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO wallet_transactions ({WALLET_COLUMNS}, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)"
        ),
        params![
            tx.id,
            tx.user_email,
            tx.kind.to_string(),
            tx.status.to_string(),
            tx.amount,
            tx.currency,
            tx.contract_id,
            tx.reference,
            tx.created_at,
        ],
    )?;
    Ok(())
}

/// Available balance as computed by `WalletSummary::fold`, in SQL.
fn available_cents(conn: &rusqlite::Connection, email: &str) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COALESCE(SUM(CASE
                    WHEN kind = 'payout' AND status = 'available' THEN amount_cents
                    WHEN kind = 'withdrawal' AND status IN ('pending', 'completed')
                        THEN -amount_cents
                    ELSE 0 END), 0)
         FROM wallet_transactions WHERE user_email = ?1",
        params![email],
        |row| row.get(0),
    )
}

/// A user's transactions, newest first.
pub async fn list_wallet_transactions(
    db: &Database,
    email: &str,
) -> Result<Vec<WalletTransaction>, PactumError> {
    let email = email.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {WALLET_COLUMNS} FROM wallet_transactions
                 WHERE user_email = ?1 ORDER BY created_at DESC, rowid DESC"
            ))?;
            let rows = stmt
                .query_map(params![email], wallet_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>();
            rows
        })
        .await
        .map_err(map_tr_err)
}

/// Insert the withdrawal only if the balance check and the insert see the
/// same ledger.
pub async fn reserve_withdrawal(
    db: &Database,
    withdrawal: &WalletTransaction,
) -> Result<Option<WalletTransaction>, PactumError> {
    let withdrawal = withdrawal.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            if available_cents(&tx, &withdrawal.user_email)? < withdrawal.amount {
                return Ok(None);
            }
            insert_wallet_tx(&tx, &withdrawal)?;
            tx.commit()?;
            Ok(Some(withdrawal))
        })
        .await
        .map_err(map_tr_err)
}

pub async fn update_transaction_status(
    db: &Database,
    id: &str,
    status: TransactionStatus,
    reference: Option<&str>,
) -> Result<(), PactumError> {
    let id = id.to_string();
    let reference = reference.map(str::to_string);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE wallet_transactions
                 SET status = ?2, reference = COALESCE(?3, reference), updated_at = ?4
                 WHERE id = ?1",
                params![id, status.to_string(), reference, now_timestamp()],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pactum_core::model::TransactionKind;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("w.db").to_str().unwrap())
            .await
            .unwrap();
        (db, dir)
    }

    async fn seed_payout(db: &Database, amount: i64) {
        let payout = WalletTransaction::new(
            "bob@x.io",
            TransactionKind::Payout,
            TransactionStatus::Available,
            amount,
            "usd",
        );
        db.connection()
            .call(move |conn| insert_wallet_tx(conn, &payout))
            .await
            .map_err(map_tr_err)
            .unwrap();
    }

    fn withdrawal(amount: i64) -> WalletTransaction {
        WalletTransaction::new(
            "bob@x.io",
            TransactionKind::Withdrawal,
            TransactionStatus::Pending,
            amount,
            "usd",
        )
    }

    #[tokio::test]
    async fn withdrawal_is_bounded_by_available_balance() {
        let (db, _dir) = setup_db().await;
        seed_payout(&db, 5_000).await;

        assert!(reserve_withdrawal(&db, &withdrawal(3_000)).await.unwrap().is_some());
        // 2_000 left; pending withdrawals count against it.
        assert!(reserve_withdrawal(&db, &withdrawal(2_500)).await.unwrap().is_none());
        assert!(reserve_withdrawal(&db, &withdrawal(2_000)).await.unwrap().is_some());
        assert_eq!(list_wallet_transactions(&db, "bob@x.io").await.unwrap().len(), 3);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn failed_withdrawal_frees_the_balance() {
        let (db, _dir) = setup_db().await;
        seed_payout(&db, 1_000).await;
        let reserved = reserve_withdrawal(&db, &withdrawal(1_000))
            .await
            .unwrap()
            .unwrap();
        update_transaction_status(&db, &reserved.id, TransactionStatus::Failed, Some("po_x"))
            .await
            .unwrap();

        let rows = list_wallet_transactions(&db, "bob@x.io").await.unwrap();
        let failed = rows.iter().find(|t| t.id == reserved.id).unwrap();
        assert_eq!(failed.status, TransactionStatus::Failed);
        assert_eq!(failed.reference.as_deref(), Some("po_x"));

        assert!(reserve_withdrawal(&db, &withdrawal(1_000)).await.unwrap().is_some());
        db.close().await.unwrap();
    }
}
