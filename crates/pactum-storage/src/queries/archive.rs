// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message archive written when a session closes.

use pactum_core::PactumError;
use pactum_core::model::ArchivedMessage;
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::queries::messages::{MESSAGE_FIELDS, message_from_row};

/// Copy a session's live messages (with reactions as JSON) into the archive,
/// then delete them. Must run inside the caller's transaction.
pub(crate) fn archive_session_messages(
    conn: &rusqlite::Connection,
    session_id: &str,
    archived_at: &str,
) -> rusqlite::Result<usize> {
    let archived = conn.execute(
        "INSERT INTO archived_messages (id, session_id, sender, sender_kind, text, client_id,
                                        file_url, file_type, status, status_rank, edited, deleted,
                                        reactions, created_at, updated_at, archived_at)
         SELECT m.id, m.session_id, m.sender, m.sender_kind, m.text, m.client_id,
                m.file_url, m.file_type, m.status, m.status_rank, m.edited, m.deleted,
                (SELECT json_group_array(json_object('emoji', r.emoji, 'user', r.user))
                   FROM message_reactions r WHERE r.message_id = m.id),
                m.created_at, m.updated_at, ?2
         FROM messages m WHERE m.session_id = ?1
         ORDER BY m.created_at ASC, m.rowid ASC",
        params![session_id, archived_at],
    )?;
    conn.execute(
        "DELETE FROM messages WHERE session_id = ?1",
        params![session_id],
    )?;
    Ok(archived)
}

/// Archived messages of a session in their original order.
pub async fn list_archived_messages(
    db: &Database,
    session_id: &str,
) -> Result<Vec<ArchivedMessage>, PactumError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_FIELDS}, m.reactions, m.created_at, m.updated_at, m.archived_at
                 FROM archived_messages m WHERE m.session_id = ?1
                 ORDER BY m.created_at ASC, m.rowid ASC"
            ))?;
            let messages = stmt
                .query_map(params![session_id], |row| {
                    Ok(ArchivedMessage {
                        message: message_from_row(row)?,
                        archived_at: row.get(14)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>();
            messages
        })
        .await
        .map_err(map_tr_err)
}
