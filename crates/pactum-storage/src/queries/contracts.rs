// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contracts and their append-only signature list.

use pactum_core::PactumError;
use pactum_core::model::{
    Contract, ContractStatus, EscrowEvent, Party, Signature, SignatureOutcome,
};
use pactum_core::types::now_timestamp;
use rusqlite::{OptionalExtension, Row, params};

use crate::database::{
    Database, is_unique_violation, json_column, map_tr_err, parse_column, to_json,
};

const CONTRACT_COLUMNS: &str = "id, originator_name, originator_email, originator_user_id, \
     originator_role, recipient_name, recipient_email, recipient_user_id, recipient_role, \
     title, description, amount_cents, currency, deadline, clauses, status, escrow_status, \
     escrowed_cents, released_cents, payer_email, payment_intent_id, created_at, updated_at";

fn contract_from_row(row: &Row<'_>) -> rusqlite::Result<Contract> {
    Ok(Contract {
        id: row.get(0)?,
        originator: Party {
            name: row.get(1)?,
            email: row.get(2)?,
            user_id: row.get(3)?,
            role: row.get(4)?,
        },
        recipient: Party {
            name: row.get(5)?,
            email: row.get(6)?,
            user_id: row.get(7)?,
            role: row.get(8)?,
        },
        title: row.get(9)?,
        description: row.get(10)?,
        amount: row.get(11)?,
        currency: row.get(12)?,
        deadline: row.get(13)?,
        clauses: json_column(14, row.get(14)?)?,
        status: parse_column(15, row.get(15)?)?,
        escrow_status: parse_column(16, row.get(16)?)?,
        escrowed_amount: row.get(17)?,
        released_amount: row.get(18)?,
        payer_email: row.get(19)?,
        payment_intent_id: row.get(20)?,
        signatures: Vec::new(),
        escrow_history: Vec::new(),
        created_at: row.get(21)?,
        updated_at: row.get(22)?,
    })
}

fn load_signatures(conn: &rusqlite::Connection, contract_id: &str) -> rusqlite::Result<Vec<Signature>> {
    let mut stmt = conn.prepare(
        "SELECT email, role, signature, signed_at FROM contract_signatures
         WHERE contract_id = ?1 ORDER BY id ASC",
    )?;
    let signatures = stmt
        .query_map(params![contract_id], |row| {
            Ok(Signature {
                email: row.get(0)?,
                role: parse_column(1, row.get(1)?)?,
                signature: row.get(2)?,
                signed_at: row.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>();
    signatures
}

fn load_history(conn: &rusqlite::Connection, contract_id: &str) -> rusqlite::Result<Vec<EscrowEvent>> {
    let mut stmt = conn.prepare(
        "SELECT kind, status, amount_cents, currency, actor, note, reference, created_at
         FROM escrow_history WHERE contract_id = ?1 ORDER BY id ASC",
    )?;
    let history = stmt
        .query_map(params![contract_id], |row| {
            Ok(EscrowEvent {
                kind: parse_column(0, row.get(0)?)?,
                status: row.get(1)?,
                amount: row.get(2)?,
                currency: row.get(3)?,
                actor: row.get(4)?,
                note: row.get(5)?,
                reference: row.get(6)?,
                created_at: row.get(7)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>();
    history
}

/// Load a contract with its signatures and escrow history.
pub(crate) fn load_contract(
    conn: &rusqlite::Connection,
    id: &str,
) -> rusqlite::Result<Option<Contract>> {
    let contract = conn
        .query_row(
            &format!("SELECT {CONTRACT_COLUMNS} FROM contracts WHERE id = ?1"),
            params![id],
            contract_from_row,
        )
        .optional()?;
    let Some(mut contract) = contract else {
        return Ok(None);
    };
    contract.signatures = load_signatures(conn, id)?;
    contract.escrow_history = load_history(conn, id)?;
    Ok(Some(contract))
}

pub async fn insert_contract(db: &Database, contract: &Contract) -> Result<(), PactumError> {
    let c = contract.clone();
    db.connection()
        .call(move |conn| {
            let clauses = to_json(&c.clauses)?;
            conn.execute(
                &format!(
                    "INSERT INTO contracts ({CONTRACT_COLUMNS}) VALUES
                     (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                      ?17, ?18, ?19, ?20, ?21, ?22, ?23)"
                ),
                params![
                    c.id,
                    c.originator.name,
                    c.originator.email,
                    c.originator.user_id,
                    c.originator.role,
                    c.recipient.name,
                    c.recipient.email,
                    c.recipient.user_id,
                    c.recipient.role,
                    c.title,
                    c.description,
                    c.amount,
                    c.currency,
                    c.deadline,
                    clauses,
                    c.status.to_string(),
                    c.escrow_status.to_string(),
                    c.escrowed_amount,
                    c.released_amount,
                    c.payer_email,
                    c.payment_intent_id,
                    c.created_at,
                    c.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_contract(db: &Database, id: &str) -> Result<Option<Contract>, PactumError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| load_contract(conn, &id))
        .await
        .map_err(map_tr_err)
}

/// Contracts where `email` is either party, newest first.
pub async fn list_contracts_for(db: &Database, email: &str) -> Result<Vec<Contract>, PactumError> {
    let email = email.to_string();
    db.connection()
        .call(move |conn| {
            let ids = {
                let mut stmt = conn.prepare(
                    "SELECT id FROM contracts
                     WHERE originator_email = ?1 OR recipient_email = ?1
                     ORDER BY created_at DESC, rowid DESC",
                )?;
                stmt.query_map(params![email], |row| row.get::<_, String>(0))?
                    .collect::<rusqlite::Result<Vec<_>>>()?
            };
            let mut contracts = Vec::with_capacity(ids.len());
            for id in ids {
                if let Some(contract) = load_contract(conn, &id)? {
                    contracts.push(contract);
                }
            }
            Ok(contracts)
        })
        .await
        .map_err(map_tr_err)
}

/// Overwrite the editable fields while the contract is still a draft.
pub async fn update_draft(db: &Database, contract: &Contract) -> Result<Option<Contract>, PactumError> {
    let c = contract.clone();
    db.connection()
        .call(move |conn| {
            let clauses = to_json(&c.clauses)?;
            let changed = conn.execute(
                "UPDATE contracts SET
                    recipient_name = ?2, recipient_email = ?3, recipient_user_id = ?4,
                    recipient_role = ?5, title = ?6, description = ?7, amount_cents = ?8,
                    currency = ?9, deadline = ?10, clauses = ?11, updated_at = ?12
                 WHERE id = ?1 AND status = 'draft'",
                params![
                    c.id,
                    c.recipient.name,
                    c.recipient.email,
                    c.recipient.user_id,
                    c.recipient.role,
                    c.title,
                    c.description,
                    c.amount,
                    c.currency,
                    c.deadline,
                    clauses,
                    now_timestamp(),
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            load_contract(conn, &c.id)
        })
        .await
        .map_err(map_tr_err)
}

/// Whether `a` and `b` are the two parties of some contract.
pub async fn share_contract(db: &Database, a: &str, b: &str) -> Result<bool, PactumError> {
    let a = a.to_string();
    let b = b.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT EXISTS (
                    SELECT 1 FROM contracts
                    WHERE (originator_email = ?1 AND recipient_email = ?2)
                       OR (originator_email = ?2 AND recipient_email = ?1)
                 )",
                params![a, b],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Append a signature and recompute the status in one transaction.
///
/// A duplicate `(email, role)` hits the unique constraint and leaves the
/// contract untouched.
pub async fn append_signature(
    db: &Database,
    contract_id: &str,
    signature: &Signature,
    expected: &[ContractStatus],
) -> Result<SignatureOutcome, PactumError> {
    let contract_id = contract_id.to_string();
    let signature = signature.clone();
    let expected = expected.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let Some(mut contract) = load_contract(&tx, &contract_id)? else {
                return Ok(SignatureOutcome::NotFound);
            };
            if !expected.contains(&contract.status) {
                return Ok(SignatureOutcome::WrongStatus(contract.status));
            }
            let inserted = tx.execute(
                "INSERT INTO contract_signatures (contract_id, email, role, signature, signed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    contract_id,
                    signature.email,
                    signature.role.to_string(),
                    signature.signature,
                    signature.signed_at,
                ],
            );
            match inserted {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => return Ok(SignatureOutcome::AlreadySigned),
                Err(e) => return Err(e),
            }

            contract.signatures.push(signature);
            contract.status = contract.status_after_signatures();
            contract.updated_at = now_timestamp();
            tx.execute(
                "UPDATE contracts SET status = ?2, updated_at = ?3 WHERE id = ?1",
                params![contract_id, contract.status.to_string(), contract.updated_at],
            )?;
            tx.commit()?;
            Ok(SignatureOutcome::Appended(contract))
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pactum_core::model::{Clause, EscrowStatus, PartyRole};
    use tempfile::tempdir;

    pub(crate) fn sample_contract(id: &str, status: ContractStatus) -> Contract {
        let now = now_timestamp();
        Contract {
            id: id.into(),
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
            title: "Logo design".into(),
            description: "A new logo".into(),
            amount: 10_000,
            currency: "usd".into(),
            deadline: "2026-12-31".into(),
            clauses: vec![Clause {
                title: "Revisions".into(),
                body: "Two rounds".into(),
            }],
            status,
            signatures: Vec::new(),
            escrow_status: EscrowStatus::PendingFunding,
            escrowed_amount: 0,
            released_amount: 0,
            payer_email: None,
            payment_intent_id: None,
            escrow_history: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub(crate) fn signature(email: &str, role: PartyRole) -> Signature {
        Signature {
            email: email.into(),
            role,
            signature: format!("signed by {email}"),
            signed_at: now_timestamp(),
        }
    }

    pub(crate) async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("k.db").to_str().unwrap())
            .await
            .unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn insert_and_load_roundtrips() {
        let (db, _dir) = setup_db().await;
        let contract = sample_contract("c1", ContractStatus::Draft);
        insert_contract(&db, &contract).await.unwrap();
        assert_eq!(get_contract(&db, "c1").await.unwrap(), Some(contract));
        assert!(share_contract(&db, "bob@x.io", "alice@x.io").await.unwrap());
        assert!(!share_contract(&db, "bob@x.io", "carol@x.io").await.unwrap());
        assert_eq!(list_contracts_for(&db, "bob@x.io").await.unwrap().len(), 1);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn signing_flow_reaches_signed() {
        let (db, _dir) = setup_db().await;
        insert_contract(&db, &sample_contract("c1", ContractStatus::Draft))
            .await
            .unwrap();

        let outcome = append_signature(
            &db,
            "c1",
            &signature("alice@x.io", PartyRole::Originator),
            &[ContractStatus::Draft, ContractStatus::Sent],
        )
        .await
        .unwrap();
        let SignatureOutcome::Appended(sent) = outcome else {
            panic!("expected Appended, got {outcome:?}");
        };
        assert_eq!(sent.status, ContractStatus::Sent);

        let outcome = append_signature(
            &db,
            "c1",
            &signature("bob@x.io", PartyRole::Recipient),
            &[ContractStatus::Sent],
        )
        .await
        .unwrap();
        let SignatureOutcome::Appended(signed) = outcome else {
            panic!("expected Appended, got {outcome:?}");
        };
        assert_eq!(signed.status, ContractStatus::Signed);

        let stored = get_contract(&db, "c1").await.unwrap().unwrap();
        assert_eq!(stored.status, ContractStatus::Signed);
        assert_eq!(stored.signatures.len(), 2);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_signature_is_rejected_without_append() {
        let (db, _dir) = setup_db().await;
        insert_contract(&db, &sample_contract("c1", ContractStatus::Sent))
            .await
            .unwrap();
        let sig = signature("bob@x.io", PartyRole::Recipient);
        append_signature(&db, "c1", &sig, &[ContractStatus::Sent])
            .await
            .unwrap();
        let again = append_signature(&db, "c1", &sig, &[ContractStatus::Sent])
            .await
            .unwrap();
        assert_eq!(again, SignatureOutcome::AlreadySigned);
        assert_eq!(get_contract(&db, "c1").await.unwrap().unwrap().signatures.len(), 1);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn wrong_status_and_missing_contract() {
        let (db, _dir) = setup_db().await;
        insert_contract(&db, &sample_contract("c1", ContractStatus::Draft))
            .await
            .unwrap();
        let outcome = append_signature(
            &db,
            "c1",
            &signature("bob@x.io", PartyRole::Recipient),
            &[ContractStatus::Sent],
        )
        .await
        .unwrap();
        assert_eq!(outcome, SignatureOutcome::WrongStatus(ContractStatus::Draft));

        let outcome = append_signature(
            &db,
            "nope",
            &signature("bob@x.io", PartyRole::Recipient),
            &[ContractStatus::Sent],
        )
        .await
        .unwrap();
        assert_eq!(outcome, SignatureOutcome::NotFound);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn update_draft_only_while_draft() {
        let (db, _dir) = setup_db().await;
        let mut contract = sample_contract("c1", ContractStatus::Draft);
        insert_contract(&db, &contract).await.unwrap();

        contract.title = "Brand refresh".into();
        contract.amount = 25_000;
        let updated = update_draft(&db, &contract).await.unwrap().unwrap();
        assert_eq!(updated.title, "Brand refresh");
        assert_eq!(updated.amount, 25_000);

        append_signature(
            &db,
            "c1",
            &signature("alice@x.io", PartyRole::Originator),
            &[ContractStatus::Draft],
        )
        .await
        .unwrap();
        assert!(update_draft(&db, &contract).await.unwrap().is_none());
        db.close().await.unwrap();
    }
}
