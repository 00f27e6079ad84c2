//! User administration.
//!
//! Deactivation and deletion both refuse the caller's own account, whatever
//! their role: lockout-by-accident is worse than the extra round trip of
//! asking another admin.

use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde_json::json;

use fieldops_audit::{AuditAction, AuditEntry};
use fieldops_auth::user::UserStore;
use fieldops_auth::{ensure_not_self, Capability, CredentialStore, UserRecord};
use fieldops_core::UserId;

use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::{PrincipalContext, RequestMeta};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", delete(delete_user))
        .route("/:id/deactivate", post(deactivate_user))
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    if let Err(resp) = common::require_capability(&principal, Capability::ViewUsers) {
        return resp;
    }

    let users = match services.store.list() {
        Ok(users) => users,
        Err(e) => return errors::store_error_to_response(e),
    };

    let items = users.iter().map(dto::user_to_json).collect::<Vec<_>>();
    (StatusCode::OK, Json(json!({ "items": items }))).into_response()
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Extension(meta): Extension<RequestMeta>,
    Json(body): Json<dto::CreateUserRequest>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    if let Err(resp) = common::require_capability(&principal, Capability::ManageUsers) {
        return resp;
    }

    if body.email.trim().is_empty() {
        return errors::validation_error("email", "email must not be empty");
    }
    if let Err(msg) = CredentialStore::check_password_policy(&body.password) {
        return errors::validation_error("password", msg);
    }

    match services.store.find_by_email(&body.email) {
        Ok(Some(_)) => {
            return errors::json_error(
                StatusCode::CONFLICT,
                "conflict",
                "a user with that email already exists",
            );
        }
        Ok(None) => {}
        Err(e) => return errors::store_error_to_response(e),
    }

    let hash = match services.credentials.hash_password(&body.password) {
        Ok(hash) => hash,
        Err(e) => return errors::credential_error_to_response(e),
    };

    let user = UserRecord::new(body.email, body.display_name, body.role, hash);
    if let Err(e) = services.store.insert(user.clone()) {
        return errors::store_error_to_response(e);
    }

    services.record_audit(
        AuditEntry::new(Some(principal.id), AuditAction::UserCreate, "user")
            .entity(user.id, user.email.clone())
            .details(json!({ "role": user.role }))
            .request(meta.ip, meta.user_agent),
    );

    (StatusCode::CREATED, Json(dto::user_to_json(&user))).into_response()
}

pub async fn deactivate_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Extension(meta): Extension<RequestMeta>,
    Path(id): Path<UserId>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    if let Err(resp) = common::require_capability(&principal, Capability::ManageUsers) {
        return resp;
    }
    if let Err(e) = ensure_not_self(&principal, id) {
        return errors::access_error_to_response(e);
    }

    let updated = match services.store.users.update(id, |user| user.active = false) {
        Ok(updated) => updated,
        Err(e) => return errors::store_error_to_response(e),
    };
    let Some(user) = updated else {
        return errors::not_found();
    };

    services.record_audit(
        AuditEntry::new(Some(principal.id), AuditAction::UserDeactivate, "user")
            .entity(user.id, user.email.clone())
            .request(meta.ip, meta.user_agent),
    );

    (StatusCode::OK, Json(dto::user_to_json(&user))).into_response()
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Extension(meta): Extension<RequestMeta>,
    Path(id): Path<UserId>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    if let Err(resp) = common::require_capability(&principal, Capability::ManageUsers) {
        return resp;
    }
    if let Err(e) = ensure_not_self(&principal, id) {
        return errors::access_error_to_response(e);
    }

    let removed = match services.store.users.remove(id) {
        Ok(removed) => removed,
        Err(e) => return errors::store_error_to_response(e),
    };
    let Some(user) = removed else {
        return errors::not_found();
    };

    services.record_audit(
        AuditEntry::new(Some(principal.id), AuditAction::UserDelete, "user")
            .entity(user.id, user.email)
            .request(meta.ip, meta.user_agent),
    );

    StatusCode::NO_CONTENT.into_response()
}
