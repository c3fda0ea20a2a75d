// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between Pactum services and their backends.
//!
//! Backends use `#[async_trait]` so they can live behind `Arc<dyn ...>`.

pub mod backend;
pub mod realtime;
pub mod services;
pub mod storage;

pub use backend::Backend;
pub use realtime::{Broadcaster, broadcast_to};
pub use services::{
    EmailSender, PaymentIntent, PaymentProcessor, Payout, PayoutStatus, PromptMessage,
    PromptRole, PushNotifier, TextGenerator,
};
pub use storage::StorageAdapter;
