// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Pactum integration tests.
//!
//! Provides recording doubles for every external seam and a harness with a
//! temp SQLite database, so service tests run without network or processes.
//!
//! # Components
//!
//! - [`MockBroadcaster`] - captures realtime fan-out and fakes presence
//! - [`MockPayments`], [`MockTextGenerator`], [`MockPush`], [`MockEmail`] - external services
//! - [`TestHarness`] - storage plus all of the above, wired together

pub mod harness;
pub mod mock_broadcaster;
pub mod mock_services;

pub use harness::TestHarness;
pub use mock_broadcaster::MockBroadcaster;
pub use mock_services::{MockEmail, MockPayments, MockPush, MockTextGenerator};
