//! Audit entry model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fieldops_core::UserId;

/// Audited action kinds, `module.action` named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Login,
    Logout,
    PasswordChange,
    PasswordResetRequest,
    PasswordResetConfirm,

    UserCreate,
    UserDeactivate,
    UserDelete,

    ClientCreate,
    ClientUpdate,
    LeadCreate,
    LeadUpdate,

    ServiceRequestCreate,
    ServiceRequestUpdate,

    ProjectCreate,
    ProjectUpdate,
    ProjectComment,
    ProjectShare,

    QuoteCreate,
    QuoteUpdate,
    QuoteShare,
    QuoteApprove,

    InvoiceCreate,
    InvoiceUpdate,
    InvoiceShare,

    TicketCreate,
    TicketUpdate,
    TicketComment,
    TicketShare,

    InventoryCreate,
    InventoryUpdate,

    PublicQuoteRequest,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Login => "auth.login",
            AuditAction::Logout => "auth.logout",
            AuditAction::PasswordChange => "auth.password_change",
            AuditAction::PasswordResetRequest => "auth.password_reset_request",
            AuditAction::PasswordResetConfirm => "auth.password_reset_confirm",

            AuditAction::UserCreate => "user.create",
            AuditAction::UserDeactivate => "user.deactivate",
            AuditAction::UserDelete => "user.delete",

            AuditAction::ClientCreate => "client.create",
            AuditAction::ClientUpdate => "client.update",
            AuditAction::LeadCreate => "lead.create",
            AuditAction::LeadUpdate => "lead.update",

            AuditAction::ServiceRequestCreate => "service_request.create",
            AuditAction::ServiceRequestUpdate => "service_request.update",

            AuditAction::ProjectCreate => "project.create",
            AuditAction::ProjectUpdate => "project.update",
            AuditAction::ProjectComment => "project.comment",
            AuditAction::ProjectShare => "project.share",

            AuditAction::QuoteCreate => "quote.create",
            AuditAction::QuoteUpdate => "quote.update",
            AuditAction::QuoteShare => "quote.share",
            AuditAction::QuoteApprove => "quote.approve",

            AuditAction::InvoiceCreate => "invoice.create",
            AuditAction::InvoiceUpdate => "invoice.update",
            AuditAction::InvoiceShare => "invoice.share",

            AuditAction::TicketCreate => "ticket.create",
            AuditAction::TicketUpdate => "ticket.update",
            AuditAction::TicketComment => "ticket.comment",
            AuditAction::TicketShare => "ticket.share",

            AuditAction::InventoryCreate => "inventory.create",
            AuditAction::InventoryUpdate => "inventory.update",

            AuditAction::PublicQuoteRequest => "public.quote_request",
        }
    }
}

impl core::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One append-only audit record.
///
/// `user_id` is `None` for system or anonymous public actions (e.g. a quote
/// approved through a share link).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub user_id: Option<UserId>,
    pub action: AuditAction,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub entity_name: Option<String>,
    pub details: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        user_id: Option<UserId>,
        action: AuditAction,
        entity_type: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            action,
            entity_type: entity_type.into(),
            entity_id: None,
            entity_name: None,
            details: None,
            ip_address: None,
            user_agent: None,
            occurred_at: Utc::now(),
        }
    }

    pub fn entity(mut self, id: impl Into<Uuid>, name: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self.entity_name = Some(name.into());
        self
    }

    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn request(mut self, ip: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip;
        self.user_agent = user_agent;
        self
    }
}
