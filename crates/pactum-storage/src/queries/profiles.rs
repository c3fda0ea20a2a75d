// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user settings: push token and payment processor account.

use pactum_core::PactumError;
use pactum_core::model::UserProfile;
use pactum_core::types::now_timestamp;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

pub async fn get_profile(db: &Database, email: &str) -> Result<Option<UserProfile>, PactumError> {
    let email = email.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT email, display_name, push_token, payment_account_id
                 FROM user_profiles WHERE email = ?1",
                params![email],
                |row| {
                    Ok(UserProfile {
                        email: row.get(0)?,
                        display_name: row.get(1)?,
                        push_token: row.get(2)?,
                        payment_account_id: row.get(3)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Set or clear the device push token, creating the profile if needed.
pub async fn set_push_token(
    db: &Database,
    email: &str,
    token: Option<&str>,
) -> Result<(), PactumError> {
    let email = email.to_string();
    let token = token.map(str::to_string);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO user_profiles (email, push_token, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT (email)
                 DO UPDATE SET push_token = excluded.push_token, updated_at = excluded.updated_at",
                params![email, token, now_timestamp()],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn set_payment_account(
    db: &Database,
    email: &str,
    account_id: &str,
) -> Result<(), PactumError> {
    let email = email.to_string();
    let account_id = account_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO user_profiles (email, payment_account_id, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT (email) DO UPDATE
                 SET payment_account_id = excluded.payment_account_id,
                     updated_at = excluded.updated_at",
                params![email, account_id, now_timestamp()],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn upserts_keep_other_fields() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("p.db").to_str().unwrap())
            .await
            .unwrap();
        assert!(get_profile(&db, "bob@x.io").await.unwrap().is_none());

        set_push_token(&db, "bob@x.io", Some("tok-1")).await.unwrap();
        set_payment_account(&db, "bob@x.io", "acct_1").await.unwrap();
        let profile = get_profile(&db, "bob@x.io").await.unwrap().unwrap();
        assert_eq!(profile.push_token.as_deref(), Some("tok-1"));
        assert_eq!(profile.payment_account_id.as_deref(), Some("acct_1"));

        set_push_token(&db, "bob@x.io", None).await.unwrap();
        let profile = get_profile(&db, "bob@x.io").await.unwrap().unwrap();
        assert!(profile.push_token.is_none());
        assert_eq!(profile.payment_account_id.as_deref(), Some("acct_1"));
        db.close().await.unwrap();
    }
}
