// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! REST handlers under `/v1`.
//!
//! Authenticated handlers read the caller from the [`pactum_core::Identity`]
//! extension set by the auth middleware and return `Result<_, ApiError>`.

pub mod connections;
pub mod contracts;
pub mod escrow;
pub mod health;
pub mod profile;
pub mod sessions;
pub mod teams;
pub mod wallet;

use crate::error::ApiError;

pub type ApiResult<T> = Result<axum::Json<T>, ApiError>;

#[cfg(test)]
mod tests;
