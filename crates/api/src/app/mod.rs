//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store and token codec wiring
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// Every request first gets an `AuthResult` from the identity middleware;
/// protected routes then pass the active-user gate before their handler runs.
pub fn build_app(services: Arc<AppServices>) -> Router {
    let auth_state = middleware::AuthState {
        codec: services.codec.clone(),
    };

    let protected = routes::protected_router().route_layer(axum::middleware::from_fn_with_state(
        services.clone(),
        middleware::active_user_gate,
    ));

    Router::new()
        .merge(routes::public_router())
        .merge(protected)
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::identity_middleware,
        ))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

pub use services::AppServices;
