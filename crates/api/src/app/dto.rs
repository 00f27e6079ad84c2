//! Request DTOs and JSON mapping helpers.
//!
//! Responses mostly serialize sanitized domain records directly; the helpers
//! here exist where the stored record carries fields that must never leave
//! the process (password hashes).

use serde::Deserialize;
use serde_json::json;

use fieldops_auth::{Role, UserRecord};
use fieldops_core::{ClientId, LeadId, UserId};
use fieldops_crm::client::ContactInfo;
use fieldops_crm::{LeadStatus, ProjectStatus, QuoteStatus, TicketStatus};

// ── auth ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetConfirmRequest {
    pub email: String,
    pub token: String,
    pub new_password: String,
}

// ── users ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub password: String,
}

/// User representation safe to return: no hash material.
pub fn user_to_json(user: &UserRecord) -> serde_json::Value {
    json!({
        "id": user.id,
        "email": user.email,
        "display_name": user.display_name,
        "role": user.role,
        "active": user.active,
    })
}

// ── crm ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateClientRequest {
    pub name: String,
    #[serde(default)]
    pub contact: ContactInfo,
    pub user_id: Option<UserId>,
    pub internal_notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateClientRequest {
    pub name: Option<String>,
    pub contact: Option<ContactInfo>,
    pub user_id: Option<UserId>,
    pub internal_notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateLeadRequest {
    pub name: String,
    #[serde(default)]
    pub contact: ContactInfo,
    pub user_id: Option<UserId>,
    pub internal_notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLeadRequest {
    pub name: Option<String>,
    pub contact: Option<ContactInfo>,
    pub status: Option<LeadStatus>,
    pub user_id: Option<UserId>,
    pub internal_notes: Option<String>,
}

// ── work records ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateServiceRequestRequest {
    pub subject: String,
    pub description: String,
    pub client_id: Option<ClientId>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateServiceRequestRequest {
    pub subject: Option<String>,
    pub description: Option<String>,
    pub assigned_to: Option<UserId>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub number: String,
    pub name: String,
    pub client_id: Option<ClientId>,
    pub lead_id: Option<LeadId>,
    pub assigned_technician_id: Option<UserId>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub status: Option<ProjectStatus>,
    pub assigned_technician_id: Option<UserId>,
    pub internal_notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub body: String,
    #[serde(default)]
    pub internal: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateQuoteRequest {
    pub number: String,
    pub client_id: Option<ClientId>,
    pub lead_id: Option<LeadId>,
    pub total_cents: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuoteRequest {
    pub status: Option<QuoteStatus>,
    pub total_cents: Option<i64>,
    pub internal_notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateInvoiceRequest {
    pub number: String,
    pub client_id: Option<ClientId>,
    pub lead_id: Option<LeadId>,
    pub total_cents: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateInvoiceRequest {
    pub paid: Option<bool>,
    pub internal_notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTicketRequest {
    pub subject: String,
    pub client_id: Option<ClientId>,
    pub lead_id: Option<LeadId>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTicketRequest {
    pub status: Option<TicketStatus>,
    pub assigned_to: Option<UserId>,
    pub internal_notes: Option<String>,
}

// ── public ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct QuoteRequestSubmission {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: Option<String>,
}
