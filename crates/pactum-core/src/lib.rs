// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Pactum marketplace backend.
//!
//! This crate provides the domain model, error taxonomy, and trait seams
//! shared by every Pactum crate. Storage, realtime fan-out, and external
//! services are all reached through traits defined here.

pub mod error;
pub mod model;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{ErrorKind, PactumError};
pub use types::{HealthStatus, Identity, Insertion, Role, Room};

// Re-export all adapter traits at crate root.
pub use traits::{
    Backend, Broadcaster, EmailSender, PaymentProcessor, PushNotifier, StorageAdapter,
    TextGenerator,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_reports_origin() {
        let created = Insertion::Created(1);
        let existing = Insertion::Existing(2);
        assert!(created.is_created());
        assert!(!existing.is_created());
        assert_eq!(existing.into_inner(), 2);
    }

    #[test]
    fn all_traits_are_object_safe() {
        fn _storage(_: &dyn StorageAdapter) {}
        fn _broadcaster(_: &dyn Broadcaster) {}
        fn _payments(_: &dyn PaymentProcessor) {}
        fn _text(_: &dyn TextGenerator) {}
        fn _push(_: &dyn PushNotifier) {}
        fn _email(_: &dyn EmailSender) {}
    }
}
