//! `itembox-auth` — token authentication and the active-user gate.
//!
//! This crate is intentionally decoupled from HTTP and storage: the gate
//! reaches user records through the [`ActiveUserLookup`] seam.

pub mod claims;
pub mod codec;
pub mod gate;
pub mod identity;

pub use claims::ClaimSet;
pub use codec::{Hs256TokenCodec, TokenCodec, TokenError};
pub use gate::{ActiveUserLookup, GateError, LookupError, require_active_user};
pub use identity::{AuthResult, TOKEN_HEADER, resolve_identity};
