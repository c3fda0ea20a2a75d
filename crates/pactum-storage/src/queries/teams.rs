// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Teams and their members.

use pactum_core::PactumError;
use pactum_core::model::Team;
use pactum_core::types::now_timestamp;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

fn load_members(conn: &rusqlite::Connection, team_id: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT email FROM team_members WHERE team_id = ?1 ORDER BY added_at ASC, email ASC",
    )?;
    let members = stmt
        .query_map(params![team_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>();
    members
}

fn load_team(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<Option<Team>> {
    let team = conn
        .query_row(
            "SELECT id, name, owner_email, created_at FROM teams WHERE id = ?1",
            params![id],
            |row| {
                Ok(Team {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    owner_email: row.get(2)?,
                    members: Vec::new(),
                    created_at: row.get(3)?,
                })
            },
        )
        .optional()?;
    match team {
        Some(mut team) => {
            team.members = load_members(conn, &team.id)?;
            Ok(Some(team))
        }
        None => Ok(None),
    }
}

/// Insert a team together with its initial members.
pub async fn insert_team(db: &Database, team: &Team) -> Result<(), PactumError> {
    let team = team.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO teams (id, name, owner_email, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![team.id, team.name, team.owner_email, team.created_at],
            )?;
            for email in &team.members {
                tx.execute(
                    "INSERT OR IGNORE INTO team_members (team_id, email, added_at)
                     VALUES (?1, ?2, ?3)",
                    params![team.id, email, team.created_at],
                )?;
            }
            tx.commit()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_team(db: &Database, id: &str) -> Result<Option<Team>, PactumError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| load_team(conn, &id))
        .await
        .map_err(map_tr_err)
}

pub async fn add_team_member(db: &Database, team_id: &str, email: &str) -> Result<(), PactumError> {
    let team_id = team_id.to_string();
    let email = email.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO team_members (team_id, email, added_at) VALUES (?1, ?2, ?3)",
                params![team_id, email, now_timestamp()],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn list_teams_for(db: &Database, email: &str) -> Result<Vec<Team>, PactumError> {
    let email = email.to_string();
    db.connection()
        .call(move |conn| {
            let ids = {
                let mut stmt = conn.prepare(
                    "SELECT t.id FROM teams t JOIN team_members m ON m.team_id = t.id
                     WHERE m.email = ?1 ORDER BY t.created_at ASC",
                )?;
                stmt.query_map(params![email], |row| row.get::<_, String>(0))?
                    .collect::<rusqlite::Result<Vec<_>>>()?
            };
            let mut teams = Vec::with_capacity(ids.len());
            for id in ids {
                if let Some(team) = load_team(conn, &id)? {
                    teams.push(team);
                }
            }
            Ok(teams)
        })
        .await
        .map_err(map_tr_err)
}

/// Whether two users are members of at least one common team.
pub async fn share_team(db: &Database, a: &str, b: &str) -> Result<bool, PactumError> {
    let a = a.to_string();
    let b = b.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT EXISTS (
                    SELECT 1 FROM team_members x JOIN team_members y ON x.team_id = y.team_id
                    WHERE x.email = ?1 AND y.email = ?2
                 )",
                params![a, b],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn team(id: &str, owner: &str, members: &[&str]) -> Team {
        Team {
            id: id.into(),
            name: format!("team {id}"),
            owner_email: owner.into(),
            members: members.iter().map(|m| m.to_string()).collect(),
            created_at: now_timestamp(),
        }
    }

    #[tokio::test]
    async fn shared_membership_is_detected() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("t.db").to_str().unwrap())
            .await
            .unwrap();
        insert_team(&db, &team("t1", "alice@x.io", &["alice@x.io", "bob@x.io"]))
            .await
            .unwrap();
        insert_team(&db, &team("t2", "carol@x.io", &["carol@x.io"]))
            .await
            .unwrap();

        assert!(share_team(&db, "alice@x.io", "bob@x.io").await.unwrap());
        assert!(!share_team(&db, "alice@x.io", "carol@x.io").await.unwrap());

        add_team_member(&db, "t2", "alice@x.io").await.unwrap();
        add_team_member(&db, "t2", "alice@x.io").await.unwrap();
        assert!(share_team(&db, "carol@x.io", "alice@x.io").await.unwrap());

        let t2 = get_team(&db, "t2").await.unwrap().unwrap();
        assert_eq!(t2.members.len(), 2);
        assert_eq!(list_teams_for(&db, "alice@x.io").await.unwrap().len(), 2);
        db.close().await.unwrap();
    }
}
