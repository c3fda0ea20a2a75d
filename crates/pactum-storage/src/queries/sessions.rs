// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat session lifecycle: creation, agent assignment, close, and clear.

use pactum_core::PactumError;
use pactum_core::model::{ChatSession, ClearOutcome, CloseOutcome, SessionKind, SessionStatus};
use pactum_core::types::{Insertion, now_timestamp};
use rusqlite::{OptionalExtension, Row, params};

use crate::database::{Database, is_unique_violation, map_tr_err, parse_column};
use crate::queries::archive::archive_session_messages;

const SESSION_COLUMNS: &str = "id, kind, participant_a, participant_b, agent_email, status, \
                               created_at, updated_at, closed_at";

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<ChatSession> {
    let kind: String = row.get(1)?;
    let participant_a: String = row.get(2)?;
    let participant_b: Option<String> = row.get(3)?;
    let kind = match (kind.as_str(), participant_b) {
        ("peer", Some(participant_b)) => SessionKind::Peer {
            participants: [participant_a, participant_b],
        },
        ("support", _) => SessionKind::Support {
            user_email: participant_a,
            agent_email: row.get(4)?,
        },
        (other, _) => {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                1,
                rusqlite::types::Type::Text,
                format!("malformed session kind `{other}`").into(),
            ));
        }
    };
    Ok(ChatSession {
        id: row.get(0)?,
        kind,
        status: parse_column(5, row.get(5)?)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
        closed_at: row.get(8)?,
    })
}

pub(crate) fn load_session(
    conn: &rusqlite::Connection,
    id: &str,
) -> rusqlite::Result<Option<ChatSession>> {
    conn.query_row(
        &format!("SELECT {SESSION_COLUMNS} FROM chat_sessions WHERE id = ?1"),
        params![id],
        session_from_row,
    )
    .optional()
}

fn load_open_by_key(
    conn: &rusqlite::Connection,
    participant_key: &str,
) -> rusqlite::Result<Option<ChatSession>> {
    conn.query_row(
        &format!(
            "SELECT {SESSION_COLUMNS} FROM chat_sessions
             WHERE participant_key = ?1 AND status = 'open'"
        ),
        params![participant_key],
        session_from_row,
    )
    .optional()
}

fn insert_row(conn: &rusqlite::Connection, session: &ChatSession) -> rusqlite::Result<usize> {
    let (kind, participant_a, participant_b, agent_email) = match &session.kind {
        SessionKind::Peer { participants } => (
            "peer",
            participants[0].as_str(),
            Some(participants[1].as_str()),
            None,
        ),
        SessionKind::Support {
            user_email,
            agent_email,
        } => ("support", user_email.as_str(), None, agent_email.as_deref()),
    };
    conn.execute(
        "INSERT INTO chat_sessions (id, kind, participant_key, participant_a, participant_b,
                                    agent_email, status, created_at, updated_at, closed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            session.id,
            kind,
            session.kind.participant_key(),
            participant_a,
            participant_b,
            agent_email,
            session.status.to_string(),
            session.created_at,
            session.updated_at,
            session.closed_at,
        ],
    )
}

/// Insert an open session; if its participant key is already open, return that session.
pub async fn insert_session(
    db: &Database,
    session: &ChatSession,
) -> Result<Insertion<ChatSession>, PactumError> {
    let session = session.clone();
    db.connection()
        .call(move |conn| match insert_row(conn, &session) {
            Ok(_) => Ok(Insertion::Created(session)),
            Err(e) if is_unique_violation(&e) => {
                match load_open_by_key(conn, &session.kind.participant_key())? {
                    Some(existing) => Ok(Insertion::Existing(existing)),
                    None => Err(e),
                }
            }
            Err(e) => Err(e),
        })
        .await
        .map_err(map_tr_err)
}

/// Get a session by ID.
pub async fn get_session(db: &Database, id: &str) -> Result<Option<ChatSession>, PactumError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| load_session(conn, &id))
        .await
        .map_err(map_tr_err)
}

pub async fn find_open_session(
    db: &Database,
    participant_key: &str,
) -> Result<Option<ChatSession>, PactumError> {
    let key = participant_key.to_string();
    db.connection()
        .call(move |conn| load_open_by_key(conn, &key))
        .await
        .map_err(map_tr_err)
}

/// Sessions an identity takes part in as peer, support user, or assigned agent.
pub async fn list_sessions_for(
    db: &Database,
    email: &str,
) -> Result<Vec<ChatSession>, PactumError> {
    let email = email.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM chat_sessions
                 WHERE participant_a = ?1 OR participant_b = ?1 OR agent_email = ?1
                 ORDER BY updated_at DESC, rowid DESC"
            ))?;
            let sessions = stmt
                .query_map(params![email], session_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>();
            sessions
        })
        .await
        .map_err(map_tr_err)
}

/// The support queue: all support sessions, or only open unassigned ones (oldest first).
pub async fn list_support_sessions(
    db: &Database,
    unassigned_only: bool,
) -> Result<Vec<ChatSession>, PactumError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM chat_sessions
                 WHERE kind = 'support'
                   AND (?1 = 0 OR (status = 'open' AND agent_email IS NULL))
                 ORDER BY created_at ASC, rowid ASC"
            ))?;
            let sessions = stmt
                .query_map(params![unassigned_only], session_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>();
            sessions
        })
        .await
        .map_err(map_tr_err)
}

/// Assign an agent with a single conditional update.
pub async fn assign_agent(
    db: &Database,
    session_id: &str,
    agent_email: &str,
) -> Result<Option<ChatSession>, PactumError> {
    let session_id = session_id.to_string();
    let agent_email = agent_email.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE chat_sessions SET agent_email = ?2, updated_at = ?3
                 WHERE id = ?1 AND status = 'open' AND kind = 'support' AND agent_email IS NULL",
                params![session_id, agent_email, now_timestamp()],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            load_session(conn, &session_id)
        })
        .await
        .map_err(map_tr_err)
}

fn mark_closed(conn: &rusqlite::Connection, session_id: &str, now: &str) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE chat_sessions SET status = 'closed', closed_at = ?2, updated_at = ?2
         WHERE id = ?1 AND status = 'open'",
        params![session_id, now],
    )?;
    Ok(())
}

/// Close a session, moving its live messages into the archive in the same transaction.
pub async fn close_session(db: &Database, session_id: &str) -> Result<CloseOutcome, PactumError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let Some(session) = load_session(&tx, &session_id)? else {
                return Ok(CloseOutcome::NotFound);
            };
            if session.status == SessionStatus::Closed {
                return Ok(CloseOutcome::AlreadyClosed);
            }
            let now = now_timestamp();
            let archived = archive_session_messages(&tx, &session_id, &now)?;
            mark_closed(&tx, &session_id, &now)?;
            let session = load_session(&tx, &session_id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
            tx.commit()?;
            Ok(CloseOutcome::Closed { session, archived })
        })
        .await
        .map_err(map_tr_err)
}

/// Archive and close a support session, then open an unassigned successor for the same user.
pub async fn clear_session(db: &Database, session_id: &str) -> Result<ClearOutcome, PactumError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let Some(previous) = load_session(&tx, &session_id)? else {
                return Ok(ClearOutcome::NotFound);
            };
            let SessionKind::Support { user_email, .. } = &previous.kind else {
                return Ok(ClearOutcome::NotSupport);
            };
            if previous.status == SessionStatus::Closed {
                return Ok(ClearOutcome::AlreadyClosed);
            }
            let now = now_timestamp();
            let archived = archive_session_messages(&tx, &session_id, &now)?;
            mark_closed(&tx, &session_id, &now)?;
            let successor = ChatSession::open(SessionKind::Support {
                user_email: user_email.clone(),
                agent_email: None,
            });
            insert_row(&tx, &successor)?;
            let previous = load_session(&tx, &session_id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
            tx.commit()?;
            Ok(ClearOutcome::Cleared {
                previous,
                successor,
                archived,
            })
        })
        .await
        .map_err(map_tr_err)
}
