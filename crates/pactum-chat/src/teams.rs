// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Teams: shared membership grants chat permission.

use std::sync::Arc;

use tracing::info;

use pactum_core::model::Team;
use pactum_core::types::{new_id, normalize_email, now_timestamp};
use pactum_core::{Identity, PactumError, StorageAdapter};

pub struct TeamService {
    storage: Arc<dyn StorageAdapter>,
}

impl TeamService {
    pub fn new(storage: Arc<dyn StorageAdapter>) -> Self {
        Self { storage }
    }

    /// Creates a team owned by (and containing) the caller.
    pub async fn create_team(&self, owner: &Identity, name: &str) -> Result<Team, PactumError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PactumError::InvalidInput("team name is required".to_string()));
        }
        let team = Team {
            id: new_id(),
            name: name.to_string(),
            owner_email: owner.email.clone(),
            members: vec![owner.email.clone()],
            created_at: now_timestamp(),
        };
        self.storage.insert_team(&team).await?;
        info!(team_id = %team.id, owner = %owner.email, "team created");
        Ok(team)
    }

    /// Only the owner may add members.
    pub async fn add_member(
        &self,
        actor: &Identity,
        team_id: &str,
        email: &str,
    ) -> Result<Team, PactumError> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(PactumError::InvalidInput("member email is required".to_string()));
        }
        let team = self
            .storage
            .get_team(team_id)
            .await?
            .ok_or_else(|| PactumError::not_found("team", team_id))?;
        if team.owner_email != actor.email {
            return Err(PactumError::Forbidden(
                "only the team owner can add members".to_string(),
            ));
        }
        self.storage.add_team_member(team_id, &email).await?;
        self.storage
            .get_team(team_id)
            .await?
            .ok_or_else(|| PactumError::not_found("team", team_id))
    }

    pub async fn list_teams(&self, actor: &Identity) -> Result<Vec<Team>, PactumError> {
        self.storage.list_teams_for(&actor.email).await
    }
}
