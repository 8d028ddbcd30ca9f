//! Active-user gate: the single authorization check for protected endpoints.

use async_trait::async_trait;
use thiserror::Error;

use itembox_core::{User, UserId};

use crate::AuthResult;

/// Failure reported by a user lookup backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("user lookup failed: {0}")]
pub struct LookupError(pub String);

/// Storage seam used by the gate.
#[async_trait]
pub trait ActiveUserLookup: Send + Sync {
    /// Return the user only if it exists and is active.
    async fn find_active_user(&self, user_id: UserId) -> Result<Option<User>, LookupError>;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GateError {
    /// Missing, invalid, unknown or inactive credential. Deliberately
    /// indistinguishable between those cases.
    #[error("not authenticated")]
    NotAuthenticated,

    #[error(transparent)]
    Lookup(#[from] LookupError),
}

/// Require that the request's identity maps to an active user.
pub async fn require_active_user<L>(auth: &AuthResult, lookup: &L) -> Result<User, GateError>
where
    L: ActiveUserLookup + ?Sized,
{
    let Some(user_id) = auth.user_id() else {
        return Err(GateError::NotAuthenticated);
    };

    match lookup.find_active_user(user_id).await? {
        Some(user) if user.is_active => Ok(user),
        _ => Err(GateError::NotAuthenticated),
    }
}
