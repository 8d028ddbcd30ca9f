//! User deactivation with ownership transfer.
//!
//! `Active -> Inactive` is the only transition. Items owned by the target move
//! to the replacement owner (smallest id among the other active users) and the
//! target is flagged inactive, both in one transaction. A deactivation that
//! would leave no active user is refused outright.

use thiserror::Error;
use tracing::instrument;

use itembox_core::UserId;

use crate::store::{Store, StoreError, StoreTx};

/// Outcome of a successful deactivation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Deactivation {
    pub user_id: UserId,
    pub replacement_owner: UserId,
    pub items_reassigned: u64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeactivationError {
    /// The target does not exist or is already inactive (indistinguishable).
    #[error("user not found")]
    NotFound,

    /// The target is the only active user.
    #[error("cannot deactivate the only active user")]
    LastActiveUser,

    /// The store failed mid-transition; nothing was persisted.
    #[error("deactivation failed: {0}")]
    TransitionFailed(String),
}

impl From<StoreError> for DeactivationError {
    fn from(value: StoreError) -> Self {
        Self::TransitionFailed(value.to_string())
    }
}

/// Deactivate `user_id`, handing its items to the replacement owner.
#[instrument(skip(store), err)]
pub async fn deactivate_user<S>(store: &S, user_id: UserId) -> Result<Deactivation, DeactivationError>
where
    S: Store + ?Sized,
{
    let mut tx = store.begin().await?;

    match transition(tx.as_mut(), user_id).await {
        Ok(outcome) => {
            tx.commit().await?;
            tracing::info!(
                replacement_owner = %outcome.replacement_owner,
                items_reassigned = outcome.items_reassigned,
                "user deactivated"
            );
            Ok(outcome)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(error = %rollback_err, "rollback after failed deactivation failed");
            }
            Err(e)
        }
    }
}

async fn transition(tx: &mut dyn StoreTx, target: UserId) -> Result<Deactivation, DeactivationError> {
    if tx.active_user(target).await?.is_none() {
        return Err(DeactivationError::NotFound);
    }

    let replacement = tx
        .min_active_user_excluding(target)
        .await?
        .ok_or(DeactivationError::LastActiveUser)?;

    let items_reassigned = tx.reassign_items(target, replacement.id).await?;
    tx.set_active(target, false).await?;

    Ok(Deactivation {
        user_id: target,
        replacement_owner: replacement.id,
        items_reassigned,
    })
}
