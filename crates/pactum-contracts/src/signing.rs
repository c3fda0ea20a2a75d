// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure signing rules: draft validation, who may sign when, and the
//! signature-to-status rule.

use pactum_core::PactumError;
use pactum_core::model::{
    Contract, ContractInput, ContractStatus, EscrowStatus, Party, PartyRole, SignatureOutcome,
};
use pactum_core::types::{new_id, normalize_email, now_timestamp, to_cents};

/// The canonical status rule: `signed` once both party emails have signed,
/// `sent` once the originator has, `draft` before that.
pub fn derive_status(contract: &Contract) -> ContractStatus {
    contract.status_after_signatures()
}

/// Validates `input` and builds a fresh draft owned by `originator`.
///
/// Every absent required field is reported at once.
pub fn build_draft(
    originator: &str,
    input: ContractInput,
    default_currency: &str,
) -> Result<Contract, PactumError> {
    let missing = input.missing_fields();
    if !missing.is_empty() {
        return Err(PactumError::MissingFields(missing));
    }

    let amount = input.amount.unwrap_or_default();
    if !amount.is_finite() || amount < 0.0 {
        return Err(PactumError::InvalidInput(
            "amount must be a non-negative number".to_string(),
        ));
    }

    let mut recipient = input.recipient.unwrap_or_default();
    recipient.email = normalize_email(&recipient.email);
    let originator = Party {
        email: normalize_email(originator),
        ..input.originator.unwrap_or_default()
    };
    if recipient.email == originator.email {
        return Err(PactumError::InvalidInput(
            "recipient must differ from the originator".to_string(),
        ));
    }

    let currency = input
        .currency
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| default_currency.to_string());
    let now = now_timestamp();

    Ok(Contract {
        id: new_id(),
        originator,
        recipient,
        title: input.title.unwrap_or_default().trim().to_string(),
        description: input.description.unwrap_or_default(),
        amount: to_cents(amount),
        currency,
        deadline: input.deadline.unwrap_or_default().trim().to_string(),
        clauses: input.clauses.unwrap_or_default(),
        status: ContractStatus::Draft,
        signatures: Vec::new(),
        escrow_status: EscrowStatus::PendingFunding,
        escrowed_amount: 0,
        released_amount: 0,
        payer_email: None,
        payment_intent_id: None,
        escrow_history: Vec::new(),
        created_at: now.clone(),
        updated_at: now,
    })
}

/// Overlays `patch` on a draft and re-validates the result.
pub fn apply_patch(contract: &Contract, patch: ContractInput) -> Result<Contract, PactumError> {
    let mut merged = ContractInput::from(contract);
    merged.merge(patch);
    let mut updated = build_draft(&contract.originator.email, merged, &contract.currency)?;
    updated.id = contract.id.clone();
    updated.created_at = contract.created_at.clone();
    Ok(updated)
}

/// Statuses `email` may sign from as `role`.
///
/// A draft signed by its originator is the send transition.
pub fn signable_from(
    contract: &Contract,
    email: &str,
    role: PartyRole,
) -> Result<&'static [ContractStatus], PactumError> {
    match contract.party_role(email) {
        None => {
            return Err(PactumError::Forbidden(
                "not a party to this contract".to_string(),
            ));
        }
        Some(actual) if actual != role => {
            return Err(PactumError::Forbidden(format!(
                "cannot sign as {role} on this contract"
            )));
        }
        Some(_) => {}
    }
    if contract
        .signatures
        .iter()
        .any(|s| s.email == email && s.role == role)
    {
        return Err(PactumError::Conflict("already signed".to_string()));
    }
    match (contract.status, role) {
        (ContractStatus::Draft, PartyRole::Originator) => Ok(&[ContractStatus::Draft]),
        (ContractStatus::Sent, _) => Ok(&[ContractStatus::Sent]),
        (status, _) => Err(status_conflict(status)),
    }
}

/// Maps a storage signature outcome to the signed contract or an error.
pub fn signed_contract(outcome: SignatureOutcome, id: &str) -> Result<Contract, PactumError> {
    match outcome {
        SignatureOutcome::Appended(contract) => Ok(contract),
        SignatureOutcome::AlreadySigned => Err(PactumError::Conflict("already signed".to_string())),
        SignatureOutcome::WrongStatus(status) => Err(status_conflict(status)),
        SignatureOutcome::NotFound => Err(PactumError::not_found("contract", id)),
    }
}

fn status_conflict(status: ContractStatus) -> PactumError {
    let message = match status {
        ContractStatus::Draft => "contract has not been sent",
        ContractStatus::Sent => "contract has already been sent",
        ContractStatus::Signed => "contract is already signed",
    };
    PactumError::Conflict(message.to_string())
}
