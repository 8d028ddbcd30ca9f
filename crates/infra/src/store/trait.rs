use async_trait::async_trait;
use thiserror::Error;

use itembox_auth::ActiveUserLookup;
use itembox_core::{Item, NewItem, NewUser, Page, User, UserId};

/// Storage operation error.
///
/// These are **infrastructure errors** as opposed to domain errors
/// (validation) or authentication failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness or foreign-key constraint rejected the write.
    #[error("constraint violated: {0}")]
    Conflict(String),

    /// The backend failed (connection, query, commit).
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// User/item store.
///
/// Plain reads and single-row writes are individually atomic. Multi-step
/// state changes go through [`Store::begin`].
#[async_trait]
pub trait Store: ActiveUserLookup {
    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError>;

    async fn get_user(&self, user_id: UserId) -> Result<Option<User>, StoreError>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Users in ascending id order.
    async fn list_users(&self, page: Page) -> Result<Vec<User>, StoreError>;

    async fn create_item(&self, owner_id: UserId, new_item: NewItem) -> Result<Item, StoreError>;

    /// Items in ascending id order.
    async fn list_items(&self, page: Page) -> Result<Vec<Item>, StoreError>;

    /// Items owned by `owner_id`, in ascending id order.
    async fn list_user_items(&self, owner_id: UserId, page: Page) -> Result<Vec<Item>, StoreError>;

    /// Start a transaction. Dropping the returned handle without committing
    /// discards every change made through it.
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError>;
}

/// A store transaction. Other readers never observe its uncommitted writes.
#[async_trait]
pub trait StoreTx: Send {
    async fn active_user(&mut self, user_id: UserId) -> Result<Option<User>, StoreError>;

    /// Active user with the smallest id other than `excluded`.
    async fn min_active_user_excluding(&mut self, excluded: UserId) -> Result<Option<User>, StoreError>;

    /// Move every item owned by `from` to `to`. Returns the number of items moved.
    async fn reassign_items(&mut self, from: UserId, to: UserId) -> Result<u64, StoreError>;

    async fn set_active(&mut self, user_id: UserId, is_active: bool) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}
