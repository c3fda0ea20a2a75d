// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live chat messages: idempotent insert, delivery status, reactions, edit, delete.

use pactum_core::PactumError;
use pactum_core::model::{Message, MessageStatus, NewMessage, Reaction};
use pactum_core::types::{Insertion, new_id, now_timestamp};
use rusqlite::{OptionalExtension, Row, params};

use crate::database::{Database, json_column, map_tr_err, parse_column};

/// Columns shared by the live and archived tables, aliased as `m`.
pub(crate) const MESSAGE_FIELDS: &str = "m.id, m.session_id, m.sender, m.sender_kind, m.text, \
                                         m.client_id, m.file_url, m.file_type, m.status, \
                                         m.edited, m.deleted";

const LIVE_SELECT: &str = "SELECT m.id, m.session_id, m.sender, m.sender_kind, m.text, \
     m.client_id, m.file_url, m.file_type, m.status, m.edited, m.deleted, \
     (SELECT json_group_array(json_object('emoji', r.emoji, 'user', r.user)) \
        FROM message_reactions r WHERE r.message_id = m.id), \
     m.created_at, m.updated_at \
     FROM messages m";

/// Maps columns `0..=13` laid out as [`MESSAGE_FIELDS`], reactions JSON, created, updated.
pub(crate) fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    let file_type: Option<String> = row.get(7)?;
    Ok(Message {
        id: row.get(0)?,
        session_id: row.get(1)?,
        sender: row.get(2)?,
        from: parse_column(3, row.get(3)?)?,
        text: row.get(4)?,
        client_id: row.get(5)?,
        file_url: row.get(6)?,
        file_type: file_type.map(|v| parse_column(7, v)).transpose()?,
        status: parse_column(8, row.get(8)?)?,
        edited: row.get(9)?,
        deleted: row.get(10)?,
        reactions: json_column(11, row.get(11)?)?,
        time: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

pub(crate) fn load_message(
    conn: &rusqlite::Connection,
    id: &str,
) -> rusqlite::Result<Option<Message>> {
    conn.query_row(
        &format!("{LIVE_SELECT} WHERE m.id = ?1"),
        params![id],
        message_from_row,
    )
    .optional()
}

fn load_by_client_id(
    conn: &rusqlite::Connection,
    session_id: &str,
    client_id: &str,
) -> rusqlite::Result<Option<Message>> {
    conn.query_row(
        &format!("{LIVE_SELECT} WHERE m.session_id = ?1 AND m.client_id = ?2"),
        params![session_id, client_id],
        message_from_row,
    )
    .optional()
}

fn load_reactions(conn: &rusqlite::Connection, message_id: &str) -> rusqlite::Result<Vec<Reaction>> {
    let mut stmt = conn.prepare(
        "SELECT emoji, user FROM message_reactions WHERE message_id = ?1
         ORDER BY created_at ASC, rowid ASC",
    )?;
    let reactions = stmt
        .query_map(params![message_id], |row| {
            Ok(Reaction {
                emoji: row.get(0)?,
                user: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>();
    reactions
}

/// Insert a message into an open session.
///
/// Idempotent on `(session_id, client_id)`. Returns `None` if the session is
/// missing or closed, so nothing lands in the live table after archival.
pub async fn insert_message(
    db: &Database,
    message: &NewMessage,
) -> Result<Option<Insertion<Message>>, PactumError> {
    let message = message.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            if let Some(client_id) = &message.client_id
                && let Some(existing) = load_by_client_id(&tx, &message.session_id, client_id)?
            {
                return Ok(Some(Insertion::Existing(existing)));
            }

            let id = new_id();
            let now = now_timestamp();
            let inserted = tx.execute(
                "INSERT INTO messages (id, session_id, sender, sender_kind, text, client_id,
                                       file_url, file_type, status, status_rank, created_at, updated_at)
                 SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11
                 WHERE EXISTS (SELECT 1 FROM chat_sessions WHERE id = ?2 AND status = 'open')",
                params![
                    id,
                    message.session_id,
                    message.sender,
                    message.from.to_string(),
                    message.text,
                    message.client_id,
                    message.file_url,
                    message.file_type.map(|k| k.to_string()),
                    message.status.to_string(),
                    message.status.rank(),
                    now,
                ],
            )?;
            if inserted == 0 {
                return Ok(None);
            }
            tx.execute(
                "UPDATE chat_sessions SET updated_at = ?2 WHERE id = ?1",
                params![message.session_id, now],
            )?;
            let stored = load_message(&tx, &id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
            tx.commit()?;
            Ok(Some(Insertion::Created(stored)))
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_message(db: &Database, id: &str) -> Result<Option<Message>, PactumError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| load_message(conn, &id))
        .await
        .map_err(map_tr_err)
}

/// Live messages of a session in the order they were sent.
pub async fn list_messages(db: &Database, session_id: &str) -> Result<Vec<Message>, PactumError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{LIVE_SELECT} WHERE m.session_id = ?1 ORDER BY m.created_at ASC, m.rowid ASC"
            ))?;
            let messages = stmt
                .query_map(params![session_id], message_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>();
            messages
        })
        .await
        .map_err(map_tr_err)
}

/// Move a message forward to `status`. Never moves backwards.
pub async fn advance_message_status(
    db: &Database,
    message_id: &str,
    status: MessageStatus,
) -> Result<Option<Message>, PactumError> {
    let message_id = message_id.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE messages SET status = ?2, status_rank = ?3, updated_at = ?4
                 WHERE id = ?1 AND status_rank < ?3",
                params![message_id, status.to_string(), status.rank(), now_timestamp()],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            load_message(conn, &message_id)
        })
        .await
        .map_err(map_tr_err)
}

/// Mark every message not sent by `reader` as read; returns the ids that moved.
pub async fn mark_session_read(
    db: &Database,
    session_id: &str,
    reader: &str,
) -> Result<Vec<String>, PactumError> {
    let session_id = session_id.to_string();
    let reader = reader.to_string();
    let read = MessageStatus::Read;
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let ids = {
                let mut stmt = tx.prepare(
                    "SELECT id FROM messages
                     WHERE session_id = ?1 AND sender != ?2 AND status_rank < ?3
                     ORDER BY created_at ASC, rowid ASC",
                )?;
                stmt.query_map(params![session_id, reader, read.rank()], |row| row.get(0))?
                    .collect::<rusqlite::Result<Vec<String>>>()?
            };
            tx.execute(
                "UPDATE messages SET status = ?4, status_rank = ?3, updated_at = ?5
                 WHERE session_id = ?1 AND sender != ?2 AND status_rank < ?3",
                params![session_id, reader, read.rank(), read.to_string(), now_timestamp()],
            )?;
            tx.commit()?;
            Ok(ids)
        })
        .await
        .map_err(map_tr_err)
}

/// Set `user`'s reaction. Reacting again with the same emoji removes it; a
/// different emoji replaces it.
pub async fn set_reaction(
    db: &Database,
    message_id: &str,
    user: &str,
    emoji: &str,
) -> Result<Option<Vec<Reaction>>, PactumError> {
    let message_id = message_id.to_string();
    let user = user.to_string();
    let emoji = emoji.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let live: Option<bool> = tx
                .query_row(
                    "SELECT deleted FROM messages WHERE id = ?1",
                    params![message_id],
                    |row| row.get(0),
                )
                .optional()?;
            if live != Some(false) {
                return Ok(None);
            }

            let current: Option<String> = tx
                .query_row(
                    "SELECT emoji FROM message_reactions WHERE message_id = ?1 AND user = ?2",
                    params![message_id, user],
                    |row| row.get(0),
                )
                .optional()?;
            if current.as_deref() == Some(emoji.as_str()) {
                tx.execute(
                    "DELETE FROM message_reactions WHERE message_id = ?1 AND user = ?2",
                    params![message_id, user],
                )?;
            } else {
                tx.execute(
                    "INSERT INTO message_reactions (message_id, user, emoji, created_at)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT (message_id, user)
                     DO UPDATE SET emoji = excluded.emoji, created_at = excluded.created_at",
                    params![message_id, user, emoji, now_timestamp()],
                )?;
            }
            let reactions = load_reactions(&tx, &message_id)?;
            tx.commit()?;
            Ok(Some(reactions))
        })
        .await
        .map_err(map_tr_err)
}

/// Replace the text of a live message; only its sender may do so.
pub async fn edit_message(
    db: &Database,
    message_id: &str,
    sender: &str,
    text: &str,
) -> Result<Option<Message>, PactumError> {
    let message_id = message_id.to_string();
    let sender = sender.to_string();
    let text = text.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE messages SET text = ?3, edited = 1, updated_at = ?4
                 WHERE id = ?1 AND sender = ?2 AND deleted = 0",
                params![message_id, sender, text, now_timestamp()],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            load_message(conn, &message_id)
        })
        .await
        .map_err(map_tr_err)
}

/// Soft-delete a message: content is cleared, the row stays for ordering.
pub async fn soft_delete_message(
    db: &Database,
    message_id: &str,
    sender: &str,
) -> Result<Option<Message>, PactumError> {
    let message_id = message_id.to_string();
    let sender = sender.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE messages
                 SET text = '', file_url = NULL, file_type = NULL, deleted = 1, updated_at = ?3
                 WHERE id = ?1 AND sender = ?2 AND deleted = 0",
                params![message_id, sender, now_timestamp()],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            load_message(conn, &message_id)
        })
        .await
        .map_err(map_tr_err)
}
