//! CRM records: clients and leads.
//!
//! Both carry an optional `user_id` foreign key linking the record to a
//! portal user account. That link is the ownership edge the resolver scans —
//! everything a client-role principal may see traces back through it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fieldops_core::{ClientId, LeadId, UserId};

/// Contact information shared by clients and leads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// An established client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    /// Portal account linked to this client, if any.
    pub user_id: Option<UserId>,
    pub name: String,
    pub contact: ContactInfo,
    /// Staff-only notes; stripped for non-admin callers on the way out.
    pub internal_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Client {
    pub fn new(name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: ClientId::new(),
            user_id: None,
            name: name.into(),
            contact: ContactInfo::default(),
            internal_notes: None,
            created_at: now,
        }
    }
}

/// Lead lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Converted,
    Lost,
}

/// A prospective client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    /// Portal account linked to this lead, if any.
    pub user_id: Option<UserId>,
    pub name: String,
    pub contact: ContactInfo,
    pub status: LeadStatus,
    pub internal_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Lead {
    pub fn new(name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: LeadId::new(),
            user_id: None,
            name: name.into(),
            contact: ContactInfo::default(),
            status: LeadStatus::New,
            internal_notes: None,
            created_at: now,
        }
    }
}
