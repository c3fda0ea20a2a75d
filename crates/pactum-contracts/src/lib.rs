// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contract lifecycle and money movement for Pactum.
//!
//! - [`signing`]: the pure signing rules and draft validation.
//! - [`service`]: drafting, sending, and signing contracts.
//! - [`escrow`]: funding and releasing escrowed amounts.
//! - [`wallet`]: balances, onboarding, and withdrawals.
//! - [`assist`]: text-generated summaries and reviews.
//! - [`textgen`] and [`logonly`]: built-in implementations of the service traits.

pub mod assist;
pub mod escrow;
pub mod logonly;
pub mod service;
pub mod signing;
pub mod textgen;
pub mod wallet;

#[cfg(test)]
mod testing;

pub use assist::ContractAssistant;
pub use escrow::{ConfirmFunding, EscrowLedger, LocalPayment};
pub use logonly::{LogOnlyEmail, LogOnlyPayments, LogOnlyPush, UnconfiguredTextGenerator};
pub use service::{ContractService, SendContract, SignContract};
pub use textgen::HttpTextGenerator;
pub use wallet::{OnboardingLink, WalletService};
