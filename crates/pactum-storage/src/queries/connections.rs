// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat-permission records between unordered pairs of users.

use pactum_core::PactumError;
use pactum_core::model::{Connection, ConnectionStatus, InviteOutcome, ParticipantPair};
use pactum_core::types::{new_id, now_timestamp};
use rusqlite::{OptionalExtension, Row, params};

use crate::database::{Database, map_tr_err, parse_column};

const CONNECTION_COLUMNS: &str =
    "id, user_a, user_b, status, requested_by, created_at, updated_at";

fn connection_from_row(row: &Row<'_>) -> rusqlite::Result<Connection> {
    Ok(Connection {
        id: row.get(0)?,
        user_a: row.get(1)?,
        user_b: row.get(2)?,
        status: parse_column(3, row.get(3)?)?,
        requested_by: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn load_by_pair(conn: &rusqlite::Connection, pair_key: &str) -> rusqlite::Result<Option<Connection>> {
    conn.query_row(
        &format!("SELECT {CONNECTION_COLUMNS} FROM connections WHERE pair_key = ?1"),
        params![pair_key],
        connection_from_row,
    )
    .optional()
}

pub async fn get_connection(
    db: &Database,
    a: &str,
    b: &str,
) -> Result<Option<Connection>, PactumError> {
    let key = ParticipantPair::new(a, b)?.key();
    db.connection()
        .call(move |conn| load_by_pair(conn, &key))
        .await
        .map_err(map_tr_err)
}

/// Create a pending request, reopen a rejected one, or report what already exists.
pub async fn invite_connection(
    db: &Database,
    from: &str,
    to: &str,
) -> Result<InviteOutcome, PactumError> {
    let pair = ParticipantPair::new(from, to)?;
    let from = from.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let key = pair.key();
            let now = now_timestamp();
            let outcome = match load_by_pair(&tx, &key)? {
                None => {
                    tx.execute(
                        "INSERT INTO connections (id, pair_key, user_a, user_b, status,
                                                  requested_by, created_at, updated_at)
                         VALUES (?1, ?2, ?3, ?4, 'pending', ?5, ?6, ?6)",
                        params![new_id(), key, pair.first(), pair.second(), from, now],
                    )?;
                    InviteOutcome::Created(load_by_pair(&tx, &key)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?)
                }
                Some(existing) if existing.status == ConnectionStatus::Rejected => {
                    tx.execute(
                        "UPDATE connections SET status = 'pending', requested_by = ?2, updated_at = ?3
                         WHERE pair_key = ?1",
                        params![key, from, now],
                    )?;
                    InviteOutcome::Reopened(load_by_pair(&tx, &key)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?)
                }
                Some(existing) => InviteOutcome::Exists(existing),
            };
            tx.commit()?;
            Ok(outcome)
        })
        .await
        .map_err(map_tr_err)
}

/// Accept or reject a pending request. Only the party that did not ask may answer.
pub async fn resolve_connection(
    db: &Database,
    by: &str,
    other: &str,
    status: ConnectionStatus,
) -> Result<Option<Connection>, PactumError> {
    let key = ParticipantPair::new(by, other)?.key();
    let by = by.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE connections SET status = ?3, updated_at = ?4
                 WHERE pair_key = ?1 AND status = 'pending' AND requested_by != ?2",
                params![key, by, status.to_string(), now_timestamp()],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            load_by_pair(conn, &key)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn list_connections(db: &Database, email: &str) -> Result<Vec<Connection>, PactumError> {
    let email = email.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CONNECTION_COLUMNS} FROM connections
                 WHERE user_a = ?1 OR user_b = ?1 ORDER BY updated_at DESC"
            ))?;
            let connections = stmt
                .query_map(params![email], connection_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>();
            connections
        })
        .await
        .map_err(map_tr_err)
}
