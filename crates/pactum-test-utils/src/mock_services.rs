// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock external services: payments, text generation, push, and email.
//!
//! Each mock records its calls for assertions and can be switched into a
//! failing mode to exercise upstream error paths.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use pactum_core::PactumError;
use pactum_core::traits::{
    EmailSender, PaymentIntent, PaymentProcessor, Payout, PayoutStatus, PromptMessage,
    PushNotifier, TextGenerator,
};

/// A call observed by [`MockPayments`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentCall {
    CreateAccount { email: String },
    PaymentIntent { amount_cents: i64, currency: String, destination: Option<String> },
    OnboardingLink { account_id: String },
    Payout { account_id: String, amount_cents: i64, currency: String },
}

/// Payment processor that issues sequential ids.
pub struct MockPayments {
    calls: Arc<Mutex<Vec<PaymentCall>>>,
    counter: AtomicUsize,
    failing: AtomicBool,
    payout_status: Mutex<PayoutStatus>,
}

impl MockPayments {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            counter: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            payout_status: Mutex::new(PayoutStatus::Pending),
        }
    }

    /// Make every subsequent call fail with an upstream error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Status reported for subsequent payouts.
    pub async fn set_payout_status(&self, status: PayoutStatus) {
        *self.payout_status.lock().await = status;
    }

    pub async fn calls(&self) -> Vec<PaymentCall> {
        self.calls.lock().await.clone()
    }

    async fn record(&self, call: PaymentCall) -> Result<usize, PactumError> {
        self.calls.lock().await.push(call);
        if self.failing.load(Ordering::SeqCst) {
            return Err(PactumError::Upstream {
                service: "payments".into(),
                status: Some(402),
                message: "card declined".into(),
            });
        }
        Ok(self.counter.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

impl Default for MockPayments {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentProcessor for MockPayments {
    async fn create_account(&self, email: &str) -> Result<String, PactumError> {
        let n = self
            .record(PaymentCall::CreateAccount {
                email: email.to_string(),
            })
            .await?;
        Ok(format!("acct_mock_{n}"))
    }

    async fn create_payment_intent(
        &self,
        amount_cents: i64,
        currency: &str,
        destination: Option<&str>,
    ) -> Result<PaymentIntent, PactumError> {
        let n = self
            .record(PaymentCall::PaymentIntent {
                amount_cents,
                currency: currency.to_string(),
                destination: destination.map(str::to_string),
            })
            .await?;
        Ok(PaymentIntent {
            id: format!("pi_mock_{n}"),
            client_secret: format!("pi_mock_{n}_secret"),
        })
    }

    async fn create_onboarding_link(&self, account_id: &str) -> Result<String, PactumError> {
        self.record(PaymentCall::OnboardingLink {
            account_id: account_id.to_string(),
        })
        .await?;
        Ok(format!("https://payments.test/onboard/{account_id}"))
    }

    async fn create_payout(
        &self,
        account_id: &str,
        amount_cents: i64,
        currency: &str,
    ) -> Result<Payout, PactumError> {
        let n = self
            .record(PaymentCall::Payout {
                account_id: account_id.to_string(),
                amount_cents,
                currency: currency.to_string(),
            })
            .await?;
        Ok(Payout {
            id: format!("po_mock_{n}"),
            status: *self.payout_status.lock().await,
        })
    }
}

/// Text generator with a FIFO queue of canned completions.
///
/// When the queue is empty, a default "mock completion" is returned.
pub struct MockTextGenerator {
    responses: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<Vec<PromptMessage>>>,
    failing: AtomicBool,
}

impl MockTextGenerator {
    pub fn new() -> Self {
        Self::with_responses(Vec::new())
    }

    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::from(responses)),
            prompts: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    pub async fn add_response(&self, text: String) {
        self.responses.lock().await.push_back(text);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Every prompt passed to `complete`, in call order.
    pub async fn prompts(&self) -> Vec<Vec<PromptMessage>> {
        self.prompts.lock().await.clone()
    }
}

impl Default for MockTextGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn complete(
        &self,
        messages: &[PromptMessage],
        _max_tokens: u32,
    ) -> Result<String, PactumError> {
        self.prompts.lock().await.push(messages.to_vec());
        if self.failing.load(Ordering::SeqCst) {
            return Err(PactumError::Upstream {
                service: "ai".into(),
                status: Some(500),
                message: "model overloaded".into(),
            });
        }
        Ok(self
            .responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| "mock completion".to_string()))
    }
}

/// A push that reached [`MockPush`] with a usable token.
#[derive(Debug, Clone, PartialEq)]
pub struct SentPush {
    pub token: String,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
}

#[derive(Default)]
pub struct MockPush {
    sent: Mutex<Vec<SentPush>>,
    failing: AtomicBool,
}

impl MockPush {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<SentPush> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl PushNotifier for MockPush {
    async fn send(
        &self,
        token: Option<&str>,
        title: &str,
        body: &str,
        data: serde_json::Value,
    ) -> Result<(), PactumError> {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return Ok(());
        };
        if self.failing.load(Ordering::SeqCst) {
            return Err(PactumError::upstream("push", "device unregistered"));
        }
        self.sent.lock().await.push(SentPush {
            token: token.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            data,
        });
        Ok(())
    }
}

/// An email captured by [`MockEmail`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Default)]
pub struct MockEmail {
    sent: Mutex<Vec<SentEmail>>,
    failing: AtomicBool,
}

impl MockEmail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl EmailSender for MockEmail {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), PactumError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PactumError::upstream("email", "smtp unavailable"));
        }
        self.sent.lock().await.push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn payments_issue_sequential_ids() {
        let payments = MockPayments::new();
        let account = payments.create_account("bob@x.io").await.unwrap();
        let intent = payments
            .create_payment_intent(10_000, "usd", Some(&account))
            .await
            .unwrap();
        assert_eq!(account, "acct_mock_1");
        assert_eq!(intent.id, "pi_mock_2");
        assert_eq!(payments.calls().await.len(), 2);
    }

    #[tokio::test]
    async fn failing_payments_return_upstream() {
        let payments = MockPayments::new();
        payments.set_failing(true);
        let err = payments.create_account("bob@x.io").await.unwrap_err();
        assert!(matches!(err, PactumError::Upstream { status: Some(402), .. }));
    }

    #[tokio::test]
    async fn text_generator_pops_queue_then_defaults() {
        let generator = MockTextGenerator::with_responses(vec!["first".into()]);
        let prompt = [PromptMessage::user("hi")];
        assert_eq!(generator.complete(&prompt, 10).await.unwrap(), "first");
        assert_eq!(generator.complete(&prompt, 10).await.unwrap(), "mock completion");
        assert_eq!(generator.prompts().await.len(), 2);
    }

    #[tokio::test]
    async fn push_without_token_is_a_noop() {
        let push = MockPush::new();
        push.send(None, "t", "b", serde_json::Value::Null).await.unwrap();
        push.send(Some(""), "t", "b", serde_json::Value::Null).await.unwrap();
        assert!(push.sent().await.is_empty());
        push.send(Some("tok"), "t", "b", serde_json::json!({"k": 1}))
            .await
            .unwrap();
        assert_eq!(push.sent().await[0].token, "tok");
    }
}
