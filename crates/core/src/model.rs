//! Users and the items they own.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::id::{ItemId, UserId};

/// A user account.
///
/// # Invariants
/// - `email` is unique across all users.
/// - Once deactivation has been attempted, at least one user stays active
///   (enforced by the deactivation transition, not by this type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub is_active: bool,
}

/// An item owned by exactly one user. Ownership is reassignable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub description: Option<String>,
    pub owner_id: UserId,
}

/// Input for creating a user (the store assigns the id).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub hashed_password: String,
}

impl NewUser {
    /// Validate the email and derive the stored password value.
    ///
    /// Password hashing is a placeholder: the stored value is not a real hash.
    pub fn new(email: impl Into<String>, password: &str) -> Result<Self, DomainError> {
        let email = email.into().trim().to_string();
        if email.is_empty() {
            return Err(DomainError::validation("email must not be empty"));
        }
        if !email.contains('@') {
            return Err(DomainError::validation("email must contain '@'"));
        }
        Ok(Self {
            email,
            hashed_password: format!("{password}notreallyhashed"),
        })
    }
}

/// Input for creating an item.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewItem {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Pick the user that inherits a deactivated user's items.
///
/// Returns the smallest id among active users other than `target`, or `None`
/// when `target` is the only active user.
pub fn select_replacement_owner<'a>(
    users: impl IntoIterator<Item = &'a User>,
    target: UserId,
) -> Option<UserId> {
    users
        .into_iter()
        .filter(|u| u.is_active && u.id != target)
        .map(|u| u.id)
        .min()
}
