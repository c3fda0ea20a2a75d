// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model shared across adapter trait boundaries.

pub mod chat;
pub mod contract;
pub mod events;
pub mod wallet;

pub use chat::*;
pub use contract::*;
pub use events::RealtimeEvent;
pub use wallet::*;
