// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bearer-token authentication for the gateway.
//!
//! Tokens are `hex(claims).hex(hmac_sha256(secret, claims))`, where claims
//! is the JSON `{"sub", "role", "exp"}`. Requests without a valid token are
//! rejected before reaching a handler (fail-closed).

use std::sync::Arc;

use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::debug;

use pactum_core::types::Role;
use pactum_core::{Identity, PactumError};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing bearer token")]
    Missing,
    #[error("malformed token")]
    Malformed,
    #[error("invalid token signature")]
    BadSignature,
    #[error("token expired")]
    Expired,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    role: Role,
    exp: i64,
}

/// Issues and verifies signed bearer tokens.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Arc<[u8]>,
    ttl_secs: u64,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("secret", &"[redacted]")
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

impl TokenSigner {
    pub fn new(secret: &str, ttl_secs: u64) -> Result<Self, PactumError> {
        if secret.is_empty() {
            return Err(PactumError::Config(
                "auth.token_secret must not be empty".to_string(),
            ));
        }
        Ok(Self {
            secret: Arc::from(secret.as_bytes()),
            ttl_secs,
        })
    }

    /// Issues a token for `identity` expiring after the configured TTL.
    pub fn issue(&self, identity: &Identity) -> Result<String, PactumError> {
        let ttl = i64::try_from(self.ttl_secs).unwrap_or(i64::MAX);
        let exp = chrono::Utc::now().timestamp().saturating_add(ttl);
        self.issue_until(identity, exp)
    }

    /// Issues a token that expires at the unix timestamp `exp`.
    pub fn issue_until(&self, identity: &Identity, exp: i64) -> Result<String, PactumError> {
        let claims = Claims {
            sub: identity.email.clone(),
            role: identity.role,
            exp,
        };
        let payload =
            serde_json::to_vec(&claims).map_err(|e| PactumError::Internal(e.to_string()))?;
        let signature = self.mac()?.chain_update(&payload).finalize().into_bytes();
        Ok(format!("{}.{}", hex::encode(&payload), hex::encode(signature)))
    }

    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let (payload_hex, signature_hex) = token.trim().split_once('.').ok_or(AuthError::Malformed)?;
        let payload = hex::decode(payload_hex).map_err(|_| AuthError::Malformed)?;
        let signature = hex::decode(signature_hex).map_err(|_| AuthError::Malformed)?;

        self.mac()
            .map_err(|_| AuthError::BadSignature)?
            .chain_update(&payload)
            .verify_slice(&signature)
            .map_err(|_| AuthError::BadSignature)?;

        let claims: Claims = serde_json::from_slice(&payload).map_err(|_| AuthError::Malformed)?;
        if claims.exp <= chrono::Utc::now().timestamp() {
            return Err(AuthError::Expired);
        }
        Ok(Identity::new(&claims.sub, claims.role))
    }

    fn mac(&self) -> Result<HmacSha256, PactumError> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| PactumError::Config(format!("invalid token secret: {e}")))
    }
}

/// Extracts the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Middleware that verifies the bearer token and stores the [`Identity`] as
/// a request extension.
pub async fn auth_middleware(
    State(signer): State<TokenSigner>,
    mut request: Request,
    next: Next,
) -> Response {
    let verified = bearer_token(request.headers())
        .ok_or(AuthError::Missing)
        .and_then(|token| signer.verify(token));
    match verified {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(e) => {
            debug!(error = %e, path = %request.uri().path(), "request rejected");
            unauthorized(&e)
        }
    }
}

pub(crate) fn unauthorized(error: &AuthError) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "unauthorized",
            "message": error.to_string(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new("test-secret", 3600).unwrap()
    }

    #[test]
    fn issued_token_verifies_to_same_identity() {
        let signer = signer();
        let token = signer.issue(&Identity::agent("Agent@X.io")).unwrap();
        let identity = signer.verify(&token).unwrap();
        assert_eq!(identity.email, "agent@x.io");
        assert_eq!(identity.role, Role::Agent);
    }

    #[test]
    fn tampered_and_foreign_tokens_fail() {
        let signer = signer();
        let token = signer.issue(&Identity::user("alice@x.io")).unwrap();
        let (payload, sig) = token.split_once('.').unwrap();

        let forged = Claims {
            sub: "alice@x.io".into(),
            role: Role::Admin,
            exp: i64::MAX,
        };
        let forged_payload = hex::encode(serde_json::to_vec(&forged).unwrap());
        assert_eq!(
            signer.verify(&format!("{forged_payload}.{sig}")),
            Err(AuthError::BadSignature)
        );

        let other = TokenSigner::new("other-secret", 3600).unwrap();
        assert_eq!(other.verify(&token), Err(AuthError::BadSignature));
        assert_eq!(signer.verify(payload), Err(AuthError::Malformed));
        assert_eq!(signer.verify("zz.zz"), Err(AuthError::Malformed));
    }

    #[test]
    fn expired_token_is_rejected() {
        let signer = signer();
        let token = signer
            .issue_until(&Identity::user("alice@x.io"), chrono::Utc::now().timestamp() - 1)
            .unwrap();
        assert_eq!(signer.verify(&token), Err(AuthError::Expired));
    }

    #[test]
    fn debug_redacts_secret() {
        let debug = format!("{:?}", signer());
        assert!(!debug.contains("test-secret"));
        assert!(debug.contains("[redacted]"));
    }

    #[test]
    fn empty_secret_is_a_config_error() {
        assert!(matches!(TokenSigner::new("", 60), Err(PactumError::Config(_))));
    }

    #[test]
    fn bearer_prefix_is_required() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Token abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
        headers.insert("authorization", "Bearer abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc"));
    }
}
