//! `itembox-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** types and rules (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod model;
pub mod page;

pub use error::{DomainError, DomainResult};
pub use id::{ItemId, UserId};
pub use model::{Item, NewItem, NewUser, User, select_replacement_owner};
pub use page::Page;
