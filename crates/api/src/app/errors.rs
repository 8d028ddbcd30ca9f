use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use itembox_core::DomainError;
use itembox_infra::{DeactivationError, StoreError};

/// The one message every authentication failure carries.
pub const NOT_AUTHENTICATED: &str = "Not authenticated";

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn not_authenticated(status: StatusCode) -> axum::response::Response {
    json_error(status, "not_authenticated", NOT_AUTHENTICATED)
}

pub fn user_not_found() -> axum::response::Response {
    json_error(StatusCode::NOT_FOUND, "not_found", "User not found")
}

/// Body extraction failures keep axum's status (400/415/422) but use our shape.
pub fn json_rejection_to_response(rejection: JsonRejection) -> axum::response::Response {
    json_error(rejection.status(), "invalid_body", rejection.body_text())
}

pub fn query_rejection_to_response(rejection: QueryRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_query", rejection.body_text())
}

pub fn path_rejection_to_response(rejection: PathRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_path", rejection.body_text())
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        StoreError::Backend(msg) => {
            tracing::error!(error = %msg, "store operation failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", "internal error")
        }
    }
}

pub fn deactivation_error_to_response(err: DeactivationError) -> axum::response::Response {
    match err {
        DeactivationError::NotFound => user_not_found(),
        DeactivationError::LastActiveUser => json_error(
            StatusCode::BAD_REQUEST,
            "last_active_user",
            "Cannot deactivate the only active user",
        ),
        DeactivationError::TransitionFailed(msg) => {
            tracing::error!(error = %msg, "deactivation rolled back");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "transition_failed",
                "Failed to deactivate user",
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deactivation_errors_map_to_statuses() {
        let cases = [
            (DeactivationError::NotFound, StatusCode::NOT_FOUND),
            (DeactivationError::LastActiveUser, StatusCode::BAD_REQUEST),
            (
                DeactivationError::TransitionFailed("boom".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(deactivation_error_to_response(err).status(), status);
        }
    }

    #[test]
    fn backend_errors_are_opaque() {
        let res = store_error_to_response(StoreError::Backend("password=hunter2".to_string()));
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
