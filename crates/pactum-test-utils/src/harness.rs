// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for service and end-to-end tests.
//!
//! `TestHarness` assembles temp SQLite storage with the recording doubles
//! for every external seam. Services under test are constructed from its
//! public fields.

use std::sync::Arc;

use pactum_config::PactumConfig;
use pactum_config::model::StorageConfig;
use pactum_core::model::ConnectionStatus;
use pactum_core::{PactumError, StorageAdapter};
use pactum_storage::SqliteStorage;

use crate::mock_broadcaster::MockBroadcaster;
use crate::mock_services::{MockEmail, MockPayments, MockPush, MockTextGenerator};

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    completions: Vec<String>,
    agents: Vec<String>,
    online: Vec<String>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            completions: Vec::new(),
            agents: Vec::new(),
            online: Vec::new(),
        }
    }

    /// Canned text-generator responses.
    pub fn with_completions(mut self, completions: Vec<String>) -> Self {
        self.completions = completions;
        self
    }

    /// Agents that start out connected.
    pub fn with_agents(mut self, agents: &[&str]) -> Self {
        self.agents = agents.iter().map(|a| a.to_string()).collect();
        self
    }

    /// Users that start out online.
    pub fn with_online(mut self, users: &[&str]) -> Self {
        self.online = users.iter().map(|u| u.to_string()).collect();
        self
    }

    pub async fn build(self) -> Result<TestHarness, PactumError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| PactumError::Storage { source: e.into() })?;
        let storage_config = StorageConfig {
            database_path: temp_dir.path().join("test.db").to_string_lossy().into_owned(),
            wal_mode: true,
        };
        let storage = SqliteStorage::new(storage_config.clone());
        storage.initialize().await?;

        let broadcaster = Arc::new(MockBroadcaster::new());
        for agent in &self.agents {
            broadcaster.connect_agent(agent);
        }
        for user in &self.online {
            broadcaster.set_online(user, true);
        }

        let mut config = PactumConfig {
            storage: storage_config,
            ..PactumConfig::default()
        };
        config.payments.sandbox = true;

        Ok(TestHarness {
            storage: Arc::new(storage),
            broadcaster,
            payments: Arc::new(MockPayments::new()),
            text: Arc::new(MockTextGenerator::with_responses(self.completions)),
            push: Arc::new(MockPush::new()),
            email: Arc::new(MockEmail::new()),
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// Temp storage plus recording doubles.
pub struct TestHarness {
    /// SQLite storage adapter (temp DB, cleaned up on drop).
    pub storage: Arc<dyn StorageAdapter>,
    pub broadcaster: Arc<MockBroadcaster>,
    pub payments: Arc<MockPayments>,
    pub text: Arc<MockTextGenerator>,
    pub push: Arc<MockPush>,
    pub email: Arc<MockEmail>,
    pub config: PactumConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Shorthand for a harness with default options.
    pub async fn new() -> Result<Self, PactumError> {
        Self::builder().build().await
    }

    /// Records an accepted connection between `a` and `b`.
    pub async fn connect(&self, a: &str, b: &str) -> Result<(), PactumError> {
        self.storage.invite_connection(a, b).await?;
        self.storage
            .resolve_connection(b, a, ConnectionStatus::Accepted)
            .await?;
        Ok(())
    }
}
