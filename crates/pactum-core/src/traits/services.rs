// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Narrow traits for the external services the core calls into.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::PactumError;

/// A processor-side payment intent the client completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

/// Processor state of a payout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    Pending,
    Paid,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub id: String,
    pub status: PayoutStatus,
}

/// Moves money; everything behind this trait is owned by the processor.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Creates a connected account for `email` and returns its id.
    async fn create_account(&self, email: &str) -> Result<String, PactumError>;

    /// Creates a payment intent for `amount_cents`, optionally routed to a connected account.
    async fn create_payment_intent(
        &self,
        amount_cents: i64,
        currency: &str,
        destination: Option<&str>,
    ) -> Result<PaymentIntent, PactumError>;

    /// Returns a hosted onboarding URL for `account_id`.
    async fn create_onboarding_link(&self, account_id: &str) -> Result<String, PactumError>;

    /// Pays `amount_cents` out to the connected account.
    async fn create_payout(
        &self,
        account_id: &str,
        amount_cents: i64,
        currency: &str,
    ) -> Result<Payout, PactumError>;
}

/// Speaker of a prompt message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::User,
            content: content.into(),
        }
    }
}

/// Produces a completion for a short conversation.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(
        &self,
        messages: &[PromptMessage],
        max_tokens: u32,
    ) -> Result<String, PactumError>;
}

/// Sends a push notification to a device token.
#[async_trait]
pub trait PushNotifier: Send + Sync {
    /// A missing or empty token is a successful no-op.
    async fn send(
        &self,
        token: Option<&str>,
        title: &str,
        body: &str,
        data: serde_json::Value,
    ) -> Result<(), PactumError>;
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), PactumError>;
}
