// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and services.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Role carried by an authenticated identity.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Agent,
    Admin,
}

/// An authenticated caller: an email identity plus its role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub email: String,
    pub role: Role,
}

impl Identity {
    /// Builds an identity, normalizing the email.
    pub fn new(email: &str, role: Role) -> Self {
        Self {
            email: normalize_email(email),
            role,
        }
    }

    /// Shorthand for a plain user identity.
    pub fn user(email: &str) -> Self {
        Self::new(email, Role::User)
    }

    /// Shorthand for a support agent identity.
    pub fn agent(email: &str) -> Self {
        Self::new(email, Role::Agent)
    }

    /// Agents and admins may work the support queue.
    pub fn is_agent(&self) -> bool {
        matches!(self.role, Role::Agent | Role::Admin)
    }
}

/// Canonical form of an email identity: trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Current UTC time in the storage timestamp format.
pub fn now_timestamp() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

/// Fresh random identifier for persisted entities.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Outcome of an idempotent insert: either a new row or the one that already held the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insertion<T> {
    Created(T),
    Existing(T),
}

impl<T> Insertion<T> {
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Self::Created(value) | Self::Existing(value) => value,
        }
    }
}

/// A realtime fan-out group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Room {
    /// Everyone viewing one chat session.
    Session(String),
    /// Every connection of one identity.
    User(String),
    /// Every connection of one support agent, keyed `agent:<email>`.
    Agent(String),
}

impl Room {
    /// Wire key for this room.
    pub fn key(&self) -> String {
        match self {
            Self::Session(id) => id.clone(),
            Self::User(email) => email.clone(),
            Self::Agent(email) => format!("agent:{email}"),
        }
    }

    /// Parses a room key sent by a client.
    ///
    /// `agent:<email>` is an agent room, anything containing `@` is a user
    /// room, everything else is treated as a session id.
    pub fn parse(key: &str) -> Self {
        let key = key.trim();
        if let Some(email) = key.strip_prefix("agent:") {
            Self::Agent(normalize_email(email))
        } else if key.contains('@') {
            Self::User(normalize_email(key))
        } else {
            Self::Session(key.to_string())
        }
    }
}

impl std::fmt::Display for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key())
    }
}

/// Converts a decimal amount to minor units using `round(amount * 100)`.
pub fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Converts minor units back to a decimal amount.
pub fn from_cents(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Serde adapter exposing an `i64` cents field as a decimal amount.
pub mod cents {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(super::from_cents(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let amount = f64::deserialize(deserializer)?;
        Ok(super::to_cents(amount))
    }
}
