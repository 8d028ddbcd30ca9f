use itembox_core::UserId;

use crate::TokenCodec;

/// Request header carrying the API token.
pub const TOKEN_HEADER: &str = "x-api-token";

/// Outcome of resolving a request's credential. Produced once per request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AuthResult {
    Authenticated { user_id: UserId },
    Unauthenticated,
}

impl AuthResult {
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            AuthResult::Authenticated { user_id } => Some(*user_id),
            AuthResult::Unauthenticated => None,
        }
    }
}

/// Resolve the identity carried by a raw token header value.
///
/// Never fails: absent, empty, undecodable and identity-less tokens all
/// resolve to [`AuthResult::Unauthenticated`].
pub fn resolve_identity(codec: &dyn TokenCodec, token: Option<&str>) -> AuthResult {
    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return AuthResult::Unauthenticated;
    };

    let claims = match codec.decode(token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!(error = %e, "token rejected");
            return AuthResult::Unauthenticated;
        }
    };

    match claims.user_id {
        Some(user_id) => AuthResult::Authenticated { user_id },
        None => {
            tracing::debug!("token carries no user_id claim");
            AuthResult::Unauthenticated
        }
    }
}
