// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stand-ins for push, email, and payment integrations that only log.
//!
//! The server wires these in when no real integration is configured.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::{info, warn};

use pactum_core::PactumError;
use pactum_core::traits::{
    EmailSender, PaymentIntent, PaymentProcessor, Payout, PayoutStatus, PromptMessage,
    PushNotifier, TextGenerator,
};

pub struct LogOnlyPush;

#[async_trait]
impl PushNotifier for LogOnlyPush {
    async fn send(
        &self,
        token: Option<&str>,
        title: &str,
        body: &str,
        _data: serde_json::Value,
    ) -> Result<(), PactumError> {
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            info!(token = %token, title = %title, body_len = body.len(), "push (log only)");
        }
        Ok(())
    }
}

pub struct LogOnlyEmail {
    from: String,
}

impl LogOnlyEmail {
    pub fn new(from: &str) -> Self {
        Self {
            from: from.to_string(),
        }
    }
}

#[async_trait]
impl EmailSender for LogOnlyEmail {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), PactumError> {
        info!(from = %self.from, to = %to, subject = %subject, body_len = body.len(), "email (log only)");
        Ok(())
    }
}

/// Payment stand-in. Outside sandbox mode every call fails; in sandbox mode
/// it hands out sequential `*_sandbox_N` ids and pays out immediately.
pub struct LogOnlyPayments {
    sandbox: bool,
    counter: AtomicU64,
}

impl LogOnlyPayments {
    pub fn new(sandbox: bool) -> Self {
        Self {
            sandbox,
            counter: AtomicU64::new(0),
        }
    }

    fn next_id(&self, operation: &str, prefix: &str) -> Result<String, PactumError> {
        if !self.sandbox {
            warn!(operation, "payment processor not configured");
            return Err(PactumError::upstream(
                "payments",
                "payment processor not configured",
            ));
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("{prefix}_sandbox_{n}");
        info!(operation, id = %id, "sandbox payment call");
        Ok(id)
    }
}

#[async_trait]
impl PaymentProcessor for LogOnlyPayments {
    async fn create_account(&self, _email: &str) -> Result<String, PactumError> {
        self.next_id("create_account", "acct")
    }

    async fn create_payment_intent(
        &self,
        amount_cents: i64,
        currency: &str,
        destination: Option<&str>,
    ) -> Result<PaymentIntent, PactumError> {
        let id = self.next_id("create_payment_intent", "pi")?;
        info!(amount_cents, currency, destination = ?destination, "sandbox payment intent");
        Ok(PaymentIntent {
            client_secret: format!("{id}_secret"),
            id,
        })
    }

    async fn create_onboarding_link(&self, account_id: &str) -> Result<String, PactumError> {
        self.next_id("create_onboarding_link", "link")?;
        Ok(format!("https://sandbox.pactum.local/onboarding/{account_id}"))
    }

    async fn create_payout(
        &self,
        _account_id: &str,
        _amount_cents: i64,
        _currency: &str,
    ) -> Result<Payout, PactumError> {
        let id = self.next_id("create_payout", "po")?;
        Ok(Payout {
            id,
            status: PayoutStatus::Paid,
        })
    }
}

/// Used when no `[ai]` API key is configured.
pub struct UnconfiguredTextGenerator;

#[async_trait]
impl TextGenerator for UnconfiguredTextGenerator {
    async fn complete(
        &self,
        _messages: &[PromptMessage],
        _max_tokens: u32,
    ) -> Result<String, PactumError> {
        Err(PactumError::upstream(
            "ai",
            "text generation is not configured",
        ))
    }
}
