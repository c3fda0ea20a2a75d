// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat session manager for the Pactum marketplace backend.
//!
//! Owns the rules around peer and support sessions: who may open one, who
//! may read or act on one, and what is broadcast when something changes.
//! Persistence goes through [`pactum_core::StorageAdapter`] and fan-out
//! through [`pactum_core::Broadcaster`].

pub mod access;
pub mod connections;
pub mod manager;
pub mod messages;
pub mod teams;

pub use access::{can_access, ensure_access};
pub use connections::{ConnectionService, PeerStatus};
pub use manager::ChatManager;
pub use messages::SendMessage;
pub use teams::TeamService;
