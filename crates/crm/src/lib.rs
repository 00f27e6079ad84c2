//! `fieldops-crm` — CRM and work records, their stores, ownership
//! resolution, and outbound sanitization.
//!
//! Records here are plain read/write rows with explicit owner fields; the
//! authorization guard in `fieldops-auth` consumes their ownership view and
//! never touches storage itself.

pub mod client;
pub mod inventory;
pub mod ownership;
pub mod records;
pub mod sanitize;
pub mod store;

pub use client::{Client, Lead, LeadStatus};
pub use inventory::InventoryItem;
pub use ownership::resolve_owned;
pub use records::{
    Communication, Invoice, Project, ProjectStatus, Quote, QuoteStatus, ServiceRequest, Ticket,
    TicketStatus,
};
pub use store::{ClientDirectory, CrmStore, Table};
