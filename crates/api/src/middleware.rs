//! Request pipeline: resolve identity (every route), then gate (protected routes).

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use itembox_auth::{AuthResult, GateError, TOKEN_HEADER, TokenCodec, require_active_user, resolve_identity};

use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::CurrentUser;

#[derive(Clone)]
pub struct AuthState {
    pub codec: Arc<dyn TokenCodec>,
}

/// Attach an [`AuthResult`] to every request. Never rejects.
pub async fn identity_middleware(State(state): State<AuthState>, mut req: Request, next: Next) -> Response {
    let auth = resolve_identity(state.codec.as_ref(), token_header(req.headers()));
    req.extensions_mut().insert(auth);
    next.run(req).await
}

/// Admit only requests whose identity maps to an active user.
///
/// A missing credential is answered with 403 and a rejected one with 401; the
/// body is the same in both cases.
pub async fn active_user_gate(
    State(services): State<Arc<AppServices>>,
    mut req: Request,
    next: Next,
) -> Response {
    if token_header(req.headers()).is_none() {
        return errors::not_authenticated(StatusCode::FORBIDDEN);
    }

    let auth = req
        .extensions()
        .get::<AuthResult>()
        .copied()
        .unwrap_or(AuthResult::Unauthenticated);

    match require_active_user(&auth, services.store.as_ref()).await {
        Ok(user) => {
            req.extensions_mut().insert(CurrentUser::new(user));
            next.run(req).await
        }
        Err(GateError::NotAuthenticated) => errors::not_authenticated(StatusCode::UNAUTHORIZED),
        Err(GateError::Lookup(e)) => {
            tracing::error!(error = %e, "active user lookup failed");
            errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", "internal error")
        }
    }
}

/// The raw token, or `None` when the header is absent or zero-length.
///
/// Whitespace and values that are not valid header text still count as
/// supplied; they fail decoding and end up as 401.
fn token_header(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(TOKEN_HEADER)?;
    match value.to_str() {
        Ok("") => None,
        Ok(s) => Some(s),
        Err(_) => Some(""),
    }
}
