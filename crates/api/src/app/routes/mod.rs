use axum::{
    Router,
    extract::{Path, rejection::PathRejection},
    routing::{get, post},
};

use itembox_core::UserId;

use crate::app::errors;

pub mod items;
pub mod system;
pub mod users;

/// Endpoints reachable without a credential.
pub fn public_router() -> Router {
    Router::new()
        .route("/health-check", get(system::health_check))
        .route("/users/", post(users::create_user))
}

/// Endpoints behind the active-user gate.
pub fn protected_router() -> Router {
    Router::new()
        .route("/users/", get(users::list_users))
        .route("/users/:id", get(users::get_user).delete(users::deactivate_user))
        .route("/users/:id/items/", post(items::create_item_for_user))
        .route("/items/", get(items::list_items))
        .route("/me/items/", get(items::list_my_items))
}

/// Parse the `:id` segment, mapping every failure to a JSON 400.
fn user_id_from_path(path: Result<Path<String>, PathRejection>) -> Result<UserId, axum::response::Response> {
    let Path(raw) = path.map_err(errors::path_rejection_to_response)?;
    raw.parse().map_err(errors::domain_error_to_response)
}
