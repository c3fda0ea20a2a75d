// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Who may read or act on a session.

use pactum_core::model::{ChatSession, SessionKind};
use pactum_core::{Identity, PactumError};

/// Participants, the support user, and the assigned agent always have access.
/// Any agent may pick up a support session nobody has claimed yet.
pub fn can_access(session: &ChatSession, who: &Identity) -> bool {
    if session.kind.involves(&who.email) {
        return true;
    }
    matches!(
        session.kind,
        SessionKind::Support {
            agent_email: None,
            ..
        }
    ) && who.is_agent()
}

pub fn ensure_access(session: &ChatSession, who: &Identity) -> Result<(), PactumError> {
    if can_access(session, who) {
        Ok(())
    } else {
        Err(PactumError::Forbidden(format!(
            "{} may not access session {}",
            who.email, session.id
        )))
    }
}
