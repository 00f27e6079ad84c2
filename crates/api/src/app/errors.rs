use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use fieldops_auth::{AccessError, CredentialError, ShareTokenError};
use fieldops_core::StoreError;

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

/// The guard's two outward states, and only those: 401 means "no valid
/// session", 403 means "valid session, insufficient rights". Handlers run
/// existence checks after authorization, so a 404 never leaks whether a
/// record the caller may not see exists.
pub fn access_error_to_response(err: AccessError) -> axum::response::Response {
    match err {
        AccessError::Unauthenticated => {
            json_error(StatusCode::UNAUTHORIZED, "unauthenticated", "authentication required")
        }
        AccessError::Forbidden(msg) => json_error(StatusCode::FORBIDDEN, "forbidden", msg),
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    tracing::error!(error = %err, "store failure");
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "store_error",
        "data access failed",
    )
}

/// Credential failures never carry detail outward.
pub fn credential_error_to_response(err: CredentialError) -> axum::response::Response {
    tracing::error!(error = %err, "credential operation failed");
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "internal error",
    )
}

/// All share-link failures collapse to one message; the caller learns
/// nothing about which check failed or whether the record exists.
pub fn share_token_error_to_response(err: ShareTokenError) -> axum::response::Response {
    tracing::info!(error = %err, "share link rejected");
    json_error(
        StatusCode::FORBIDDEN,
        "forbidden",
        "share link is invalid or expired",
    )
}

pub fn not_found() -> axum::response::Response {
    json_error(StatusCode::NOT_FOUND, "not_found", "not found")
}

pub fn validation_error(field: &'static str, message: impl Into<String>) -> axum::response::Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        axum::Json(json!({
            "error": "validation_error",
            "field": field,
            "message": message.into(),
        })),
    )
        .into_response()
}
