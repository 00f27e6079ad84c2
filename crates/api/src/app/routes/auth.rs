//! Authentication flows: login, logout, password change and reset.
//!
//! Login failure is always the same 401 body whether the email is unknown,
//! the password wrong, or the account inactive — callers learn nothing about
//! which. A successful login regenerates the session id so a pre-login
//! session fixated on the client never survives authentication.

use std::sync::Arc;

use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::post,
    Extension, Json, Router,
};
use chrono::{Duration, Utc};
use serde_json::json;

use fieldops_audit::{AuditAction, AuditEntry};
use fieldops_auth::user::UserStore;
use fieldops_auth::CredentialStore;

use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::{PrincipalContext, RequestMeta};
use crate::middleware::session_cookie;
use crate::session::SESSION_COOKIE;

/// Reset tokens are single-use and short-lived.
const RESET_TOKEN_VALIDITY_MINUTES: i64 = 60;

pub fn router() -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/password", post(change_password))
        .route("/reset", post(request_reset))
        .route("/reset/confirm", post(confirm_reset))
}

fn invalid_credentials() -> axum::response::Response {
    errors::json_error(
        StatusCode::UNAUTHORIZED,
        "invalid_credentials",
        "invalid email or password",
    )
}

fn reset_rejected() -> axum::response::Response {
    errors::json_error(
        StatusCode::FORBIDDEN,
        "forbidden",
        "reset token invalid or expired",
    )
}

fn session_set_cookie(sid: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={sid}; Path=/; HttpOnly; SameSite=Lax"
    ))
    .ok()
}

fn session_clear_cookie() -> HeaderValue {
    HeaderValue::from_static("fieldops_session=; Path=/; HttpOnly; Max-Age=0")
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(meta): Extension<RequestMeta>,
    headers: HeaderMap,
    Json(body): Json<dto::LoginRequest>,
) -> axum::response::Response {
    let user = match services.store.find_by_email(&body.email) {
        Ok(Some(user)) => user,
        Ok(None) => return invalid_credentials(),
        Err(e) => return errors::store_error_to_response(e),
    };

    if !services
        .credentials
        .verify_password(&user.password_hash, &body.password)
    {
        return invalid_credentials();
    }

    if !user.active {
        tracing::info!(user_id = %user.id, "login rejected for inactive account");
        return invalid_credentials();
    }

    // Session fixation prevention: whatever id the client presented before
    // authentication is destroyed and replaced, never upgraded.
    let pre_login = session_cookie(&headers);
    let sid = services.sessions.regenerate(pre_login.as_deref(), user.id);

    services.record_audit(
        AuditEntry::new(Some(user.id), AuditAction::Login, "user")
            .entity(user.id, user.email.clone())
            .request(meta.ip, meta.user_agent),
    );

    let mut response = (StatusCode::OK, Json(dto::user_to_json(&user))).into_response();
    if let Some(cookie) = session_set_cookie(&sid) {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    response
}

pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(meta): Extension<RequestMeta>,
    headers: HeaderMap,
) -> axum::response::Response {
    if let Some(sid) = session_cookie(&headers) {
        // Capture the user before the session state is gone.
        if let Some(user_id) = services.sessions.destroy(&sid) {
            services.record_audit(
                AuditEntry::new(Some(user_id), AuditAction::Logout, "user")
                    .request(meta.ip, meta.user_agent),
            );
        }
    }

    let mut response = StatusCode::NO_CONTENT.into_response();
    response
        .headers_mut()
        .insert(header::SET_COOKIE, session_clear_cookie());
    response
}

pub async fn change_password(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Extension(meta): Extension<RequestMeta>,
    Json(body): Json<dto::ChangePasswordRequest>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    let mut user = match services.store.find(principal.id) {
        Ok(Some(user)) => user,
        Ok(None) => return errors::not_found(),
        Err(e) => return errors::store_error_to_response(e),
    };

    if !services
        .credentials
        .verify_password(&user.password_hash, &body.current_password)
    {
        return errors::json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            "current password is incorrect",
        );
    }

    if let Err(msg) = CredentialStore::check_password_policy(&body.new_password) {
        return errors::validation_error("new_password", msg);
    }

    user.password_hash = match services.credentials.hash_password(&body.new_password) {
        Ok(hash) => hash,
        Err(e) => return errors::credential_error_to_response(e),
    };
    user.reset_token_hash = None;
    user.reset_requested_at = None;

    let email = user.email.clone();
    if let Err(e) = services.store.update(user) {
        return errors::store_error_to_response(e);
    }

    services.record_audit(
        AuditEntry::new(Some(principal.id), AuditAction::PasswordChange, "user")
            .entity(principal.id, email)
            .request(meta.ip, meta.user_agent),
    );

    StatusCode::NO_CONTENT.into_response()
}

/// Always answers 202 with the same body; whether the account exists is not
/// observable. Token delivery happens out of band.
pub async fn request_reset(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(meta): Extension<RequestMeta>,
    Json(body): Json<dto::ResetRequest>,
) -> axum::response::Response {
    let accepted = (
        StatusCode::ACCEPTED,
        Json(json!({
            "message": "if the account exists, a reset link has been sent",
        })),
    )
        .into_response();

    let mut user = match services.store.find_by_email(&body.email) {
        Ok(Some(user)) if user.active => user,
        Ok(_) => return accepted,
        Err(e) => return errors::store_error_to_response(e),
    };

    let token = CredentialStore::generate_reset_token();
    user.reset_token_hash = match services.credentials.hash_reset_token(&token) {
        Ok(hash) => Some(hash),
        Err(e) => return errors::credential_error_to_response(e),
    };
    user.reset_requested_at = Some(Utc::now());

    let user_id = user.id;
    if let Err(e) = services.store.update(user) {
        return errors::store_error_to_response(e);
    }

    services.record_audit(
        AuditEntry::new(Some(user_id), AuditAction::PasswordResetRequest, "user")
            .request(meta.ip, meta.user_agent),
    );

    accepted
}

pub async fn confirm_reset(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(meta): Extension<RequestMeta>,
    Json(body): Json<dto::ResetConfirmRequest>,
) -> axum::response::Response {
    let mut user = match services.store.find_by_email(&body.email) {
        Ok(Some(user)) if user.active => user,
        Ok(_) => return reset_rejected(),
        Err(e) => return errors::store_error_to_response(e),
    };

    let Some(stored_hash) = user.reset_token_hash.clone() else {
        return reset_rejected();
    };

    let fresh = user
        .reset_requested_at
        .is_some_and(|at| Utc::now() - at <= Duration::minutes(RESET_TOKEN_VALIDITY_MINUTES));
    if !fresh {
        return reset_rejected();
    }

    if !services
        .credentials
        .verify_reset_token(&stored_hash, &body.token)
    {
        return reset_rejected();
    }

    if let Err(msg) = CredentialStore::check_password_policy(&body.new_password) {
        return errors::validation_error("new_password", msg);
    }

    user.password_hash = match services.credentials.hash_password(&body.new_password) {
        Ok(hash) => hash,
        Err(e) => return errors::credential_error_to_response(e),
    };
    user.reset_token_hash = None;
    user.reset_requested_at = None;

    let user_id = user.id;
    if let Err(e) = services.store.update(user) {
        return errors::store_error_to_response(e);
    }

    services.record_audit(
        AuditEntry::new(Some(user_id), AuditAction::PasswordResetConfirm, "user")
            .request(meta.ip, meta.user_agent),
    );

    StatusCode::NO_CONTENT.into_response()
}
