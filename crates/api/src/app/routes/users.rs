use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Extension, Path, Query,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};

use itembox_core::{NewUser, Page};
use itembox_infra::StoreError;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

use super::user_id_from_path;

/// Register a user and issue their API token.
///
/// This is the only place tokens are minted.
pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreateUserRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let new_user = match NewUser::new(body.email, &body.password) {
        Ok(u) => u,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.store.get_user_by_email(&new_user.email).await {
        Ok(Some(_)) => return email_registered(),
        Ok(None) => {}
        Err(e) => return errors::store_error_to_response(e),
    }

    let user = match services.store.create_user(new_user).await {
        Ok(u) => u,
        // Lost a race with a concurrent registration of the same email.
        Err(StoreError::Conflict(_)) => return email_registered(),
        Err(e) => return errors::store_error_to_response(e),
    };

    let token = match services.codec.encode(user.id) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, user_id = %user.id, "failed to issue token");
            return errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "token_error", "internal error");
        }
    };

    tracing::info!(user_id = %user.id, "user created");
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "user": dto::user_to_json(&user, &[]),
            "x_api_token": token,
        })),
    )
        .into_response()
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<Page>, QueryRejection>,
) -> axum::response::Response {
    let Query(page) = match query {
        Ok(q) => q,
        Err(rejection) => return errors::query_rejection_to_response(rejection),
    };

    let users = match services.store.list_users(page).await {
        Ok(u) => u,
        Err(e) => return errors::store_error_to_response(e),
    };

    let mut body = Vec::with_capacity(users.len());
    for user in &users {
        let items = match services.store.list_user_items(user.id, Page::new(0, u64::MAX)).await {
            Ok(i) => i,
            Err(e) => return errors::store_error_to_response(e),
        };
        body.push(dto::user_to_json(user, &items));
    }

    (StatusCode::OK, Json(body)).into_response()
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    path: Result<Path<String>, PathRejection>,
) -> axum::response::Response {
    let user_id = match user_id_from_path(path) {
        Ok(v) => v,
        Err(res) => return res,
    };

    let user = match services.store.get_user(user_id).await {
        Ok(Some(u)) => u,
        Ok(None) => return errors::user_not_found(),
        Err(e) => return errors::store_error_to_response(e),
    };

    let items = match services.store.list_user_items(user_id, Page::new(0, u64::MAX)).await {
        Ok(i) => i,
        Err(e) => return errors::store_error_to_response(e),
    };

    (StatusCode::OK, Json(dto::user_to_json(&user, &items))).into_response()
}

/// Deactivate a user, transferring their items to the lowest-id other active user.
pub async fn deactivate_user(
    Extension(services): Extension<Arc<AppServices>>,
    path: Result<Path<String>, PathRejection>,
) -> axum::response::Response {
    let user_id = match user_id_from_path(path) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match itembox_infra::deactivate_user(services.store.as_ref(), user_id).await {
        Ok(_) => (
            StatusCode::OK,
            Json(serde_json::json!({ "detail": "User deactivated successfully" })),
        )
            .into_response(),
        Err(e) => errors::deactivation_error_to_response(e),
    }
}

fn email_registered() -> axum::response::Response {
    errors::json_error(StatusCode::BAD_REQUEST, "email_registered", "Email already registered")
}
