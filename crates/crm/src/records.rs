//! Transactional work records: service requests, projects, quotes, invoices,
//! tickets.
//!
//! Each record exposes its owner fields through [`ResourceOwnership`] so the
//! guard can run its scope check without knowing the record type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fieldops_auth::{ResourceOwnership, ShareGrant};
use fieldops_core::{
    ClientId, InvoiceId, LeadId, ProjectId, QuoteId, ServiceRequestId, TicketId, UserId,
};

/// A message attached to a project or ticket.
///
/// `internal` marks staff-only communications; the sanitizer drops these
/// whole for non-admin callers rather than redacting fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Communication {
    pub author_id: Option<UserId>,
    pub body: String,
    pub internal: bool,
    pub sent_at: DateTime<Utc>,
}

/// A service request filed by a client (or on their behalf).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub id: ServiceRequestId,
    /// The portal user who filed the request; direct ownership.
    pub created_by: Option<UserId>,
    pub client_id: Option<ClientId>,
    pub assigned_to: Option<UserId>,
    pub subject: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl ServiceRequest {
    pub fn ownership(&self) -> ResourceOwnership {
        ResourceOwnership {
            client_id: self.client_id,
            lead_id: None,
            created_by: self.created_by,
            assigned_to: self.assigned_to,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Planned,
    Active,
    OnHold,
    Completed,
}

/// A project, owned indirectly through a client or lead record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub number: String,
    pub name: String,
    pub client_id: Option<ClientId>,
    pub lead_id: Option<LeadId>,
    pub assigned_technician_id: Option<UserId>,
    pub status: ProjectStatus,
    pub internal_notes: Option<String>,
    pub communications: Vec<Communication>,
    pub share: Option<ShareGrant>,
    pub created_at: DateTime<Utc>,
}

impl Project {
    pub fn ownership(&self) -> ResourceOwnership {
        ResourceOwnership {
            client_id: self.client_id,
            lead_id: self.lead_id,
            created_by: None,
            assigned_to: self.assigned_technician_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    Draft,
    Sent,
    Approved,
    Declined,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub id: QuoteId,
    /// Human-readable number, e.g. "Q-1001"; share links re-validate it.
    pub number: String,
    pub client_id: Option<ClientId>,
    pub lead_id: Option<LeadId>,
    pub total_cents: i64,
    pub status: QuoteStatus,
    pub internal_notes: Option<String>,
    pub share: Option<ShareGrant>,
    pub created_at: DateTime<Utc>,
}

impl Quote {
    pub fn ownership(&self) -> ResourceOwnership {
        ResourceOwnership {
            client_id: self.client_id,
            lead_id: self.lead_id,
            created_by: None,
            assigned_to: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub number: String,
    pub client_id: Option<ClientId>,
    pub lead_id: Option<LeadId>,
    pub total_cents: i64,
    pub paid: bool,
    pub internal_notes: Option<String>,
    pub share: Option<ShareGrant>,
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    pub fn ownership(&self) -> ResourceOwnership {
        ResourceOwnership {
            client_id: self.client_id,
            lead_id: self.lead_id,
            created_by: None,
            assigned_to: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub number: String,
    pub subject: String,
    pub client_id: Option<ClientId>,
    pub lead_id: Option<LeadId>,
    pub created_by: Option<UserId>,
    pub assigned_to: Option<UserId>,
    pub status: TicketStatus,
    pub internal_notes: Option<String>,
    pub communications: Vec<Communication>,
    pub share: Option<ShareGrant>,
    pub created_at: DateTime<Utc>,
}

impl Ticket {
    pub fn ownership(&self) -> ResourceOwnership {
        ResourceOwnership {
            client_id: self.client_id,
            lead_id: self.lead_id,
            created_by: self.created_by,
            assigned_to: self.assigned_to,
        }
    }
}
