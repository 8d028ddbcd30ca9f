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

use itembox_core::{Item, NewItem, Page};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::CurrentUser;

use super::user_id_from_path;

pub async fn create_item_for_user(
    Extension(services): Extension<Arc<AppServices>>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Json<dto::CreateItemRequest>, JsonRejection>,
) -> axum::response::Response {
    let owner_id = match user_id_from_path(path) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match services.store.get_user(owner_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return errors::user_not_found(),
        Err(e) => return errors::store_error_to_response(e),
    }

    let new_item = NewItem {
        title: body.title,
        description: body.description,
    };

    match services.store.create_item(owner_id, new_item).await {
        Ok(item) => (StatusCode::OK, Json(dto::item_to_json(&item))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<Page>, QueryRejection>,
) -> axum::response::Response {
    let Query(page) = match query {
        Ok(q) => q,
        Err(rejection) => return errors::query_rejection_to_response(rejection),
    };

    match services.store.list_items(page).await {
        Ok(items) => items_response(&items),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Items owned by the authenticated user.
pub async fn list_my_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    query: Result<Query<Page>, QueryRejection>,
) -> axum::response::Response {
    let Query(page) = match query {
        Ok(q) => q,
        Err(rejection) => return errors::query_rejection_to_response(rejection),
    };

    match services.store.list_user_items(current.user_id(), page).await {
        Ok(items) => items_response(&items),
        Err(e) => errors::store_error_to_response(e),
    }
}

fn items_response(items: &[Item]) -> axum::response::Response {
    let body = items.iter().map(dto::item_to_json).collect::<Vec<_>>();
    (StatusCode::OK, Json(body)).into_response()
}
