// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error taxonomy shared by every Pactum crate.

use strum::Display;
use thiserror::Error;

/// The primary error type used across Pactum services, stores, and adapters.
#[derive(Debug, Error)]
pub enum PactumError {
    /// A request field is missing or malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// One or more required fields were absent from a request.
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    /// The caller lacks permission for the target resource.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The addressed entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A state precondition failed (already signed, already assigned, ...).
    #[error("conflict: {0}")]
    Conflict(String),

    /// An external provider (payments, AI, email, push) failed.
    #[error("{service} service error (status {status:?}): {message}")]
    Upstream {
        service: String,
        status: Option<u16>,
        message: String,
    },

    /// Storage backend errors (connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration errors surfaced at runtime.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`PactumError`], used for response codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    Forbidden,
    NotFound,
    Conflict,
    UpstreamServiceError,
    InternalError,
}

impl PactumError {
    /// Shorthand for a [`PactumError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Shorthand for an [`PactumError::Upstream`] without a provider status.
    pub fn upstream(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upstream {
            service: service.into(),
            status: None,
            message: message.into(),
        }
    }

    /// Returns the taxonomy bucket this error falls into.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) | Self::MissingFields(_) => ErrorKind::InvalidInput,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Upstream { .. } => ErrorKind::UpstreamServiceError,
            Self::Storage { .. } | Self::Config(_) | Self::Internal(_) => ErrorKind::InternalError,
        }
    }

    /// Message that is safe to hand back to an untrusted client.
    ///
    /// Storage, config, and internal details stay in the server log; upstream
    /// errors keep the service name but drop the raw provider text.
    pub fn public_message(&self) -> String {
        match self {
            Self::Upstream { service, .. } => format!("{service} service request failed"),
            Self::Storage { .. } | Self::Config(_) | Self::Internal(_) => {
                "internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_cover_taxonomy() {
        assert_eq!(
            PactumError::InvalidInput("x".into()).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            PactumError::MissingFields(vec!["amount".into()]).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(PactumError::Forbidden("x".into()).kind(), ErrorKind::Forbidden);
        assert_eq!(
            PactumError::not_found("contract", "c1").kind(),
            ErrorKind::NotFound
        );
        assert_eq!(PactumError::Conflict("x".into()).kind(), ErrorKind::Conflict);
        assert_eq!(
            PactumError::upstream("payments", "boom").kind(),
            ErrorKind::UpstreamServiceError
        );
        assert_eq!(
            PactumError::Storage {
                source: Box::new(std::io::Error::other("disk")),
            }
            .kind(),
            ErrorKind::InternalError
        );
    }

    #[test]
    fn missing_fields_message_lists_fields() {
        let err = PactumError::MissingFields(vec!["amount".into(), "deadline".into()]);
        assert_eq!(err.to_string(), "missing required fields: amount, deadline");
    }

    #[test]
    fn public_message_hides_internal_details() {
        let err = PactumError::Storage {
            source: Box::new(std::io::Error::other("UNIQUE constraint failed: secrets")),
        };
        assert_eq!(err.public_message(), "internal server error");

        let err = PactumError::Upstream {
            service: "payments".into(),
            status: Some(402),
            message: "card_declined: raw provider payload".into(),
        };
        assert_eq!(err.public_message(), "payments service request failed");

        let err = PactumError::Conflict("already signed".into());
        assert_eq!(err.public_message(), "conflict: already signed");
    }

    #[test]
    fn error_kind_display_is_snake_case() {
        assert_eq!(ErrorKind::UpstreamServiceError.to_string(), "upstream_service_error");
        assert_eq!(ErrorKind::NotFound.to_string(), "not_found");
    }
}
