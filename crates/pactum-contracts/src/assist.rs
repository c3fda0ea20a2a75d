// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text-generated contract summaries and reviews, for the contract's parties.

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::info;

use pactum_core::model::Contract;
use pactum_core::traits::PromptMessage;
use pactum_core::types::from_cents;
use pactum_core::{Identity, PactumError, StorageAdapter, TextGenerator};

use crate::service::ensure_party;

const SUMMARY_INSTRUCTION: &str = "You summarize freelance contracts for the people who signed them. \
Reply with a short plain-language summary: who does what, for how much, and by when.";

const REVIEW_INSTRUCTION: &str = "You review freelance contracts before signing. \
List missing terms, ambiguous clauses, and risks to either party as short bullet points.";

pub struct ContractAssistant {
    storage: Arc<dyn StorageAdapter>,
    generator: Arc<dyn TextGenerator>,
    max_tokens: u32,
}

impl ContractAssistant {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        generator: Arc<dyn TextGenerator>,
        max_tokens: u32,
    ) -> Self {
        Self {
            storage,
            generator,
            max_tokens,
        }
    }

    pub async fn summarize(&self, actor: &Identity, contract_id: &str) -> Result<String, PactumError> {
        self.ask(actor, contract_id, SUMMARY_INSTRUCTION).await
    }

    pub async fn review(&self, actor: &Identity, contract_id: &str) -> Result<String, PactumError> {
        self.ask(actor, contract_id, REVIEW_INSTRUCTION).await
    }

    async fn ask(
        &self,
        actor: &Identity,
        contract_id: &str,
        instruction: &str,
    ) -> Result<String, PactumError> {
        let contract = self
            .storage
            .get_contract(contract_id)
            .await?
            .ok_or_else(|| PactumError::not_found("contract", contract_id))?;
        ensure_party(&contract, actor)?;

        let messages = [
            PromptMessage::system(instruction),
            PromptMessage::user(render(&contract)),
        ];
        let text = self.generator.complete(&messages, self.max_tokens).await?;
        info!(contract_id, by = %actor.email, chars = text.len(), "contract assistance produced");
        Ok(text)
    }
}

/// Plain-text rendering of the fields a reader needs.
fn render(contract: &Contract) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Title: {}", contract.title);
    let _ = writeln!(
        out,
        "Originator: {} <{}>",
        contract.originator.name, contract.originator.email
    );
    let _ = writeln!(
        out,
        "Recipient: {} <{}>",
        contract.recipient.name, contract.recipient.email
    );
    let _ = writeln!(
        out,
        "Amount: {:.2} {}",
        from_cents(contract.amount),
        contract.currency.to_uppercase()
    );
    let _ = writeln!(out, "Deadline: {}", contract.deadline);
    let _ = writeln!(out, "Status: {}", contract.status);
    let _ = writeln!(out, "\nDescription:\n{}", contract.description);
    for (i, clause) in contract.clauses.iter().enumerate() {
        let _ = writeln!(out, "\n{}. {}\n{}", i + 1, clause.title, clause.body);
    }
    out
}
