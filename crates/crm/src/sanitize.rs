//! Outbound record sanitization.
//!
//! Pure functions, one per entity class with privileged fields. Admin is
//! always the identity transform. Non-admin output never carries internal
//! notes or share grants, and internal-only communications are dropped whole
//! rather than partially redacted.
//!
//! Sanitization shapes responses only; writes are restricted by the guard
//! and input validation, never here. These functions cannot fail — they
//! degrade by omission.

use fieldops_auth::Role;

use crate::client::{Client, Lead};
use crate::records::{Communication, Invoice, Project, Quote, Ticket};

fn is_privileged(role: Role) -> bool {
    role == Role::Admin
}

/// Drop staff-only communications for non-admin callers.
pub fn sanitize_communications(communications: Vec<Communication>, role: Role) -> Vec<Communication> {
    if is_privileged(role) {
        return communications;
    }
    communications.into_iter().filter(|c| !c.internal).collect()
}

pub fn sanitize_client(mut client: Client, role: Role) -> Client {
    if is_privileged(role) {
        return client;
    }
    client.internal_notes = None;
    client
}

pub fn sanitize_lead(mut lead: Lead, role: Role) -> Lead {
    if is_privileged(role) {
        return lead;
    }
    lead.internal_notes = None;
    lead
}

pub fn sanitize_project(mut project: Project, role: Role) -> Project {
    if is_privileged(role) {
        return project;
    }
    project.internal_notes = None;
    // The grant carries the share secret; only admins see it in payloads.
    project.share = None;
    project.communications = sanitize_communications(project.communications, role);
    project
}

pub fn sanitize_quote(mut quote: Quote, role: Role) -> Quote {
    if is_privileged(role) {
        return quote;
    }
    quote.internal_notes = None;
    quote.share = None;
    quote
}

pub fn sanitize_invoice(mut invoice: Invoice, role: Role) -> Invoice {
    if is_privileged(role) {
        return invoice;
    }
    invoice.internal_notes = None;
    invoice.share = None;
    invoice
}

pub fn sanitize_ticket(mut ticket: Ticket, role: Role) -> Ticket {
    if is_privileged(role) {
        return ticket;
    }
    ticket.internal_notes = None;
    ticket.share = None;
    ticket.communications = sanitize_communications(ticket.communications, role);
    ticket
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::ProjectStatus;
    use chrono::Utc;
    use fieldops_auth::ShareGrant;
    use fieldops_core::ProjectId;

    fn project_with_secrets() -> Project {
        Project {
            id: ProjectId::new(),
            number: "P-100".to_string(),
            name: "Rewire".to_string(),
            client_id: None,
            lead_id: None,
            assigned_technician_id: None,
            status: ProjectStatus::Active,
            internal_notes: Some("margin is thin".to_string()),
            communications: vec![
                Communication {
                    author_id: None,
                    body: "visible update".to_string(),
                    internal: false,
                    sent_at: Utc::now(),
                },
                Communication {
                    author_id: None,
                    body: "staff only".to_string(),
                    internal: true,
                    sent_at: Utc::now(),
                },
            ],
            share: Some(ShareGrant::issue("P-100", Utc::now())),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn admin_sanitization_is_identity() {
        let project = project_with_secrets();
        let sanitized = sanitize_project(project.clone(), Role::Admin);

        assert_eq!(sanitized.internal_notes, project.internal_notes);
        assert_eq!(sanitized.share, project.share);
        assert_eq!(sanitized.communications.len(), 2);
    }

    #[test]
    fn non_admin_output_never_contains_internal_fields() {
        for role in Role::ALL.into_iter().filter(|r| *r != Role::Admin) {
            let sanitized = sanitize_project(project_with_secrets(), role);

            assert!(sanitized.internal_notes.is_none());
            assert!(sanitized.share.is_none());
            // Internal communications are dropped whole, not redacted.
            assert_eq!(sanitized.communications.len(), 1);
            assert_eq!(sanitized.communications[0].body, "visible update");
        }
    }

    #[test]
    fn client_record_notes_are_stripped_for_staff_below_admin() {
        let mut client = Client::new("Acme", Utc::now());
        client.internal_notes = Some("slow payer".to_string());

        assert!(sanitize_client(client.clone(), Role::Manager)
            .internal_notes
            .is_none());
        assert!(sanitize_client(client, Role::Admin).internal_notes.is_some());
    }
}
