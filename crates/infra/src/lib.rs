//! Infrastructure layer: user/item storage and the deactivation transition.

pub mod deactivation;
pub mod store;

pub use deactivation::{Deactivation, DeactivationError, deactivate_user};
pub use store::{InMemoryStore, PostgresStore, Store, StoreError, StoreTx};
