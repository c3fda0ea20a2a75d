// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity and health probe shared by pluggable backends.

use async_trait::async_trait;

use crate::error::PactumError;
use crate::types::HealthStatus;

/// A swappable backend that `/v1/health` can describe and probe.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    /// Short backend name, e.g. `sqlite`.
    fn name(&self) -> &str;

    fn version(&self) -> semver::Version;

    /// Cheap liveness probe. `Err` means the probe itself could not run.
    async fn health_check(&self) -> Result<HealthStatus, PactumError>;
}
