//! Projects: list/get/update, comments, and share-link issuance.
//!
//! Ownership here is indirect (client or lead link) or by direct technician
//! assignment. An assigned technician holding only `projects.manage_own`
//! may update and comment without any CRM trace.

use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde_json::json;

use fieldops_audit::{AuditAction, AuditEntry};
use fieldops_auth::{AccessScope, Capability, CapabilityPair, Principal, ShareGrant};
use fieldops_core::ProjectId;
use fieldops_crm::sanitize::sanitize_project;
use fieldops_crm::{Communication, Project, ProjectStatus};

use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::{PrincipalContext, RequestMeta};

const VIEW: CapabilityPair =
    CapabilityPair::new(Capability::ViewAllProjects, Capability::ViewOwnProjects);
const MANAGE: CapabilityPair =
    CapabilityPair::new(Capability::ManageAllProjects, Capability::ManageOwnProjects);

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_projects).post(create_project))
        .route("/:id", get(get_project).patch(update_project))
        .route("/:id/comments", post(add_comment))
        .route("/:id/share", post(issue_share))
}

pub async fn list_projects(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    let projects = match services.store.projects.all() {
        Ok(projects) => projects,
        Err(e) => return errors::store_error_to_response(e),
    };

    let owned = services.owned_for(principal.id);
    let items = common::filter_visible(projects, &principal, VIEW, owned, |p| p.ownership())
        .into_iter()
        .map(|p| sanitize_project(p, principal.role))
        .collect::<Vec<_>>();
    (StatusCode::OK, Json(json!({ "items": items }))).into_response()
}

pub async fn create_project(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Extension(meta): Extension<RequestMeta>,
    Json(body): Json<dto::CreateProjectRequest>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let scope = match common::granted_scope(&principal, MANAGE) {
        Ok(scope) => scope,
        Err(resp) => return resp,
    };

    if body.number.trim().is_empty() {
        return errors::validation_error("number", "number must not be empty");
    }
    if body.name.trim().is_empty() {
        return errors::validation_error("name", "name must not be empty");
    }

    // Own-scope creators start as their own technician; linking to CRM
    // records is an "all"-scope action.
    let (client_id, lead_id, technician) = match scope {
        AccessScope::All => (body.client_id, body.lead_id, body.assigned_technician_id),
        AccessScope::Own => (None, None, Some(principal.id)),
    };

    let project = Project {
        id: ProjectId::new(),
        number: body.number,
        name: body.name,
        client_id,
        lead_id,
        assigned_technician_id: technician,
        status: ProjectStatus::Planned,
        internal_notes: None,
        communications: Vec::new(),
        share: None,
        created_at: Utc::now(),
    };

    // Numbers key the public share path; duplicates must never exist.
    let inserted = services
        .store
        .projects
        .insert_unique(project.id, project.clone(), |existing| {
            existing.number == project.number
        });
    match inserted {
        Ok(true) => {}
        Ok(false) => {
            return errors::json_error(
                StatusCode::CONFLICT,
                "conflict",
                "a project with that number already exists",
            );
        }
        Err(e) => return errors::store_error_to_response(e),
    }

    services.record_audit(
        AuditEntry::new(Some(principal.id), AuditAction::ProjectCreate, "project")
            .entity(project.id, project.number.clone())
            .request(meta.ip, meta.user_agent),
    );

    (
        StatusCode::CREATED,
        Json(sanitize_project(project, principal.role)),
    )
        .into_response()
}

fn load_guarded(
    services: &AppServices,
    principal: &Principal,
    id: ProjectId,
    pair: CapabilityPair,
) -> Result<(Project, AccessScope), axum::response::Response> {
    let scope = common::granted_scope(principal, pair)?;

    let project = match services.store.projects.get(id) {
        Ok(Some(project)) => project,
        Ok(None) => return Err(errors::not_found()),
        Err(e) => return Err(errors::store_error_to_response(e)),
    };

    let owned = services.owned_for(principal.id);
    common::require_in_scope(scope, principal, &project.ownership(), &owned, pair)?;
    Ok((project, scope))
}

pub async fn get_project(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Path(id): Path<ProjectId>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    match load_guarded(&services, &principal, id, VIEW) {
        Ok((project, _)) => (
            StatusCode::OK,
            Json(sanitize_project(project, principal.role)),
        )
            .into_response(),
        Err(resp) => resp,
    }
}

pub async fn update_project(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Extension(meta): Extension<RequestMeta>,
    Path(id): Path<ProjectId>,
    Json(body): Json<dto::UpdateProjectRequest>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    let scope = match load_guarded(&services, &principal, id, MANAGE) {
        Ok((_, scope)) => scope,
        Err(resp) => return resp,
    };

    // Internal notes are staff material even when a client may edit the
    // record itself; reassignment stays an "all"-scope action.
    let internal_notes = principal.role.is_staff().then_some(body.internal_notes).flatten();
    let technician = match scope {
        AccessScope::All => body.assigned_technician_id,
        AccessScope::Own => None,
    };

    let updated = services.store.projects.update(id, |project| {
        if let Some(name) = body.name {
            project.name = name;
        }
        if let Some(status) = body.status {
            project.status = status;
        }
        if let Some(user) = technician {
            project.assigned_technician_id = Some(user);
        }
        if let Some(notes) = internal_notes {
            project.internal_notes = Some(notes);
        }
    });

    let project = match updated {
        Ok(Some(project)) => project,
        Ok(None) => return errors::not_found(),
        Err(e) => return errors::store_error_to_response(e),
    };

    services.record_audit(
        AuditEntry::new(Some(principal.id), AuditAction::ProjectUpdate, "project")
            .entity(project.id, project.number.clone())
            .request(meta.ip, meta.user_agent),
    );

    (
        StatusCode::OK,
        Json(sanitize_project(project, principal.role)),
    )
        .into_response()
}

pub async fn add_comment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Extension(meta): Extension<RequestMeta>,
    Path(id): Path<ProjectId>,
    Json(body): Json<dto::CommentRequest>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    if let Err(resp) = load_guarded(&services, &principal, id, MANAGE) {
        return resp;
    }

    if body.body.trim().is_empty() {
        return errors::validation_error("body", "comment must not be empty");
    }
    if body.internal && !principal.role.is_staff() {
        return errors::validation_error("internal", "internal comments are staff-only");
    }

    let comment = Communication {
        author_id: Some(principal.id),
        body: body.body,
        internal: body.internal,
        sent_at: Utc::now(),
    };

    let updated = services.store.projects.update(id, |project| {
        project.communications.push(comment.clone());
    });

    let project = match updated {
        Ok(Some(project)) => project,
        Ok(None) => return errors::not_found(),
        Err(e) => return errors::store_error_to_response(e),
    };

    services.record_audit(
        AuditEntry::new(Some(principal.id), AuditAction::ProjectComment, "project")
            .entity(project.id, project.number.clone())
            .request(meta.ip, meta.user_agent),
    );

    (StatusCode::CREATED, Json(comment)).into_response()
}

pub async fn issue_share(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Extension(meta): Extension<RequestMeta>,
    Path(id): Path<ProjectId>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    let project = match load_guarded(&services, &principal, id, MANAGE) {
        Ok((project, _)) => project,
        Err(resp) => return resp,
    };

    let grant = ShareGrant::issue(project.number.clone(), Utc::now());
    let updated = services.store.projects.update(id, |project| {
        project.share = Some(grant.clone());
    });
    if let Err(e) = updated {
        return errors::store_error_to_response(e);
    }

    services.record_audit(
        AuditEntry::new(Some(principal.id), AuditAction::ProjectShare, "project")
            .entity(project.id, project.number.clone())
            .request(meta.ip, meta.user_agent),
    );

    // The issuer needs the raw token to hand out; this is the only place
    // it appears for a non-admin caller.
    (StatusCode::CREATED, Json(grant)).into_response()
}
