// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query functions, one module per table group. Each takes `&Database` and
//! runs on the single writer thread.

pub mod archive;
pub mod connections;
pub mod contracts;
pub mod escrow;
pub mod messages;
pub mod profiles;
pub mod sessions;
pub mod teams;
pub mod wallet;
