// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared fixtures for this crate's tests.

use pactum_core::Identity;
use pactum_core::model::{Contract, ContractInput, Party, PartyRole};
use pactum_test_utils::TestHarness;

use crate::escrow::{ConfirmFunding, EscrowLedger};
use crate::service::{ContractService, SignContract};

pub(crate) fn contract_input() -> ContractInput {
    ContractInput {
        recipient: Some(Party {
            name: "Bob".into(),
            email: "bob@x.io".into(),
            ..Party::default()
        }),
        title: Some("Logo".into()),
        description: Some("Design a logo".into()),
        amount: Some(100.0),
        deadline: Some("2026-12-01".into()),
        ..ContractInput::default()
    }
}

pub(crate) fn contracts(harness: &TestHarness) -> ContractService {
    ContractService::new(
        harness.storage.clone(),
        harness.broadcaster.clone(),
        harness.email.clone(),
        "usd",
    )
}

pub(crate) fn ledger(harness: &TestHarness) -> EscrowLedger {
    EscrowLedger::new(
        harness.storage.clone(),
        harness.broadcaster.clone(),
        harness.payments.clone(),
    )
}

/// A 100.00 usd contract alice drafted for bob, signed by both.
pub(crate) async fn signed_contract(harness: &TestHarness) -> Contract {
    let contracts = contracts(harness);
    let alice = Identity::user("alice@x.io");
    let draft = contracts
        .create_draft(&alice, contract_input())
        .await
        .unwrap();
    for (who, role) in [
        ("alice@x.io", PartyRole::Originator),
        ("bob@x.io", PartyRole::Recipient),
    ] {
        contracts
            .sign(
                &Identity::user(who),
                SignContract {
                    contract_id: draft.id.clone(),
                    role,
                    signature: "sig".into(),
                },
            )
            .await
            .unwrap();
    }
    contracts.get(&alice, &draft.id).await.unwrap()
}

/// Alice funds a signed contract in full and releases `amount` to bob.
pub(crate) async fn released_to_bob(harness: &TestHarness, amount: f64) -> Contract {
    let contract = signed_contract(harness).await;
    let escrow = ledger(harness);
    let alice = Identity::user("alice@x.io");
    escrow
        .confirm_funding(
            &alice,
            ConfirmFunding {
                contract_id: contract.id.clone(),
                amount: 100.0,
                currency: None,
                reference: None,
            },
        )
        .await
        .unwrap();
    escrow
        .release(&alice, &contract.id, Some(amount))
        .await
        .unwrap()
}
