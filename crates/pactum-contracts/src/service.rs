// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Drafting, sending, and signing contracts.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use pactum_core::model::{
    Contract, ContractInput, ContractStatus, PartyRole, RealtimeEvent, Signature,
};
use pactum_core::traits::broadcast_to;
use pactum_core::types::{from_cents, now_timestamp};
use pactum_core::{Broadcaster, EmailSender, Identity, PactumError, Room, StorageAdapter};

use crate::signing::{apply_patch, build_draft, signable_from, signed_contract};

/// Send request: an existing draft by id, a new contract inline, or an
/// existing draft with last-minute edits.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendContract {
    #[serde(default)]
    pub contract_id: Option<String>,
    #[serde(flatten)]
    pub contract: ContractInput,
    #[serde(default)]
    pub signature: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignContract {
    pub contract_id: String,
    pub role: PartyRole,
    pub signature: String,
}

pub struct ContractService {
    storage: Arc<dyn StorageAdapter>,
    broadcaster: Arc<dyn Broadcaster>,
    email: Arc<dyn EmailSender>,
    currency: String,
}

impl ContractService {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        broadcaster: Arc<dyn Broadcaster>,
        email: Arc<dyn EmailSender>,
        currency: &str,
    ) -> Self {
        Self {
            storage,
            broadcaster,
            email,
            currency: currency.to_string(),
        }
    }

    pub async fn create_draft(
        &self,
        actor: &Identity,
        input: ContractInput,
    ) -> Result<Contract, PactumError> {
        let contract = build_draft(&actor.email, input, &self.currency)?;
        self.storage.insert_contract(&contract).await?;
        info!(contract_id = %contract.id, originator = %actor.email, "contract drafted");
        self.announce(&contract).await;
        Ok(contract)
    }

    /// Edits a draft. Only the originator may edit, and only before sending.
    pub async fn update_draft(
        &self,
        actor: &Identity,
        id: &str,
        patch: ContractInput,
    ) -> Result<Contract, PactumError> {
        let contract = self.load(id).await?;
        if contract.originator.email != actor.email {
            return Err(PactumError::Forbidden(
                "only the originator can edit this contract".to_string(),
            ));
        }
        self.save_draft(&contract, patch).await
    }

    /// `draft -> sent`, appending the originator's signature.
    pub async fn send(&self, actor: &Identity, req: SendContract) -> Result<Contract, PactumError> {
        let signature = require_signature(&req.signature)?;
        let draft = match req.contract_id.as_deref() {
            Some(id) => {
                let existing = self.load(id).await?;
                signable_from(&existing, &actor.email, PartyRole::Originator)?;
                if req.contract == ContractInput::default() {
                    existing
                } else {
                    self.save_draft(&existing, req.contract).await?
                }
            }
            None => self.create_draft(actor, req.contract).await?,
        };

        let missing = ContractInput::from(&draft).missing_fields();
        if !missing.is_empty() {
            return Err(PactumError::MissingFields(missing));
        }
        self.append(actor, &draft, PartyRole::Originator, signature, &[ContractStatus::Draft])
            .await
    }

    /// Signs as `role`. An originator signing a draft sends it.
    pub async fn sign(&self, actor: &Identity, req: SignContract) -> Result<Contract, PactumError> {
        let signature = require_signature(&req.signature)?;
        let contract = self.load(&req.contract_id).await?;
        let expected = signable_from(&contract, &actor.email, req.role)?;
        self.append(actor, &contract, req.role, signature, expected)
            .await
    }

    pub async fn get(&self, actor: &Identity, id: &str) -> Result<Contract, PactumError> {
        let contract = self.load(id).await?;
        ensure_party(&contract, actor)?;
        Ok(contract)
    }

    pub async fn list(&self, actor: &Identity) -> Result<Vec<Contract>, PactumError> {
        self.storage.list_contracts_for(&actor.email).await
    }

    async fn load(&self, id: &str) -> Result<Contract, PactumError> {
        self.storage
            .get_contract(id)
            .await?
            .ok_or_else(|| PactumError::not_found("contract", id))
    }

    async fn save_draft(
        &self,
        contract: &Contract,
        patch: ContractInput,
    ) -> Result<Contract, PactumError> {
        if contract.status != ContractStatus::Draft {
            return Err(PactumError::Conflict("only drafts can be edited".to_string()));
        }
        let updated = apply_patch(contract, patch)?;
        let saved = self
            .storage
            .update_draft(&updated)
            .await?
            .ok_or_else(|| PactumError::Conflict("only drafts can be edited".to_string()))?;
        self.announce(&saved).await;
        Ok(saved)
    }

    async fn append(
        &self,
        actor: &Identity,
        contract: &Contract,
        role: PartyRole,
        signature: String,
        expected: &[ContractStatus],
    ) -> Result<Contract, PactumError> {
        let entry = Signature {
            email: actor.email.clone(),
            role,
            signature,
            signed_at: now_timestamp(),
        };
        let outcome = self
            .storage
            .append_signature(&contract.id, &entry, expected)
            .await?;
        let signed = signed_contract(outcome, &contract.id)?;
        info!(
            contract_id = %signed.id,
            signer = %actor.email,
            %role,
            from = %contract.status,
            to = %signed.status,
            "contract signed"
        );
        self.announce(&signed).await;

        if contract.status == ContractStatus::Draft {
            let body = format!(
                "{} sent you \"{}\" for {:.2} {}. Review and sign it in Pactum.",
                display_name(&signed.originator.name, &signed.originator.email),
                signed.title,
                from_cents(signed.amount),
                signed.currency.to_uppercase(),
            );
            self.notify(&signed.recipient.email, "A contract is waiting for your signature", &body)
                .await;
        } else if signed.status == ContractStatus::Signed {
            let body = format!("\"{}\" is signed by both parties.", signed.title);
            self.notify(&signed.originator.email, "Contract signed", &body)
                .await;
        }
        Ok(signed)
    }

    async fn notify(&self, to: &str, subject: &str, body: &str) {
        if let Err(e) = self.email.send(to, subject, body).await {
            warn!(to = %to, error = %e, "contract email failed");
        }
    }

    async fn announce(&self, contract: &Contract) {
        let rooms = contract.party_emails().map(|e| Room::User(e.to_string()));
        broadcast_to(
            self.broadcaster.as_ref(),
            &rooms,
            &RealtimeEvent::ContractUpdated(contract.clone()),
        )
        .await;
    }
}

/// Contracts are visible to their two parties only.
pub(crate) fn ensure_party(contract: &Contract, actor: &Identity) -> Result<(), PactumError> {
    if contract.is_party(&actor.email) {
        Ok(())
    } else {
        Err(PactumError::Forbidden(
            "not a party to this contract".to_string(),
        ))
    }
}

fn require_signature(signature: &str) -> Result<String, PactumError> {
    let signature = signature.trim();
    if signature.is_empty() {
        return Err(PactumError::MissingFields(vec!["signature".to_string()]));
    }
    Ok(signature.to_string())
}

fn display_name<'a>(name: &'a str, email: &'a str) -> &'a str {
    if name.trim().is_empty() { email } else { name }
}
