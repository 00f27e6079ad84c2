//! Named permission atoms.
//!
//! Capabilities use `module.action` names and come in explicit own/all
//! pairs for every resource class that supports
//! partial access. Holding the "all" variant never implicitly grants the
//! "own" variant — composing the two is the guard's job, not the table's.

use serde::{Deserialize, Serialize};

/// A named, boolean-valued permission atom assigned to roles.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ViewOwnServiceRequests,
    ManageOwnServiceRequests,
    ViewAllServiceRequests,
    ManageAllServiceRequests,

    ViewOwnProjects,
    ManageOwnProjects,
    ViewAllProjects,
    ManageAllProjects,

    ViewOwnQuotes,
    ManageOwnQuotes,
    ViewAllQuotes,
    ManageAllQuotes,

    ViewOwnInvoices,
    ManageOwnInvoices,
    ViewAllInvoices,
    ManageAllInvoices,

    ViewOwnTickets,
    ManageOwnTickets,
    ViewAllTickets,
    ManageAllTickets,

    ViewClients,
    ManageClients,
    ViewLeads,
    ManageLeads,

    ViewUsers,
    ManageUsers,

    ViewInventory,
    ManageInventory,

    ViewFinancial,
}

impl Capability {
    /// Every capability, for exhaustive table checks in tests.
    pub const ALL: [Capability; 29] = [
        Capability::ViewOwnServiceRequests,
        Capability::ManageOwnServiceRequests,
        Capability::ViewAllServiceRequests,
        Capability::ManageAllServiceRequests,
        Capability::ViewOwnProjects,
        Capability::ManageOwnProjects,
        Capability::ViewAllProjects,
        Capability::ManageAllProjects,
        Capability::ViewOwnQuotes,
        Capability::ManageOwnQuotes,
        Capability::ViewAllQuotes,
        Capability::ManageAllQuotes,
        Capability::ViewOwnInvoices,
        Capability::ManageOwnInvoices,
        Capability::ViewAllInvoices,
        Capability::ManageAllInvoices,
        Capability::ViewOwnTickets,
        Capability::ManageOwnTickets,
        Capability::ViewAllTickets,
        Capability::ManageAllTickets,
        Capability::ViewClients,
        Capability::ManageClients,
        Capability::ViewLeads,
        Capability::ManageLeads,
        Capability::ViewUsers,
        Capability::ManageUsers,
        Capability::ViewInventory,
        Capability::ManageInventory,
        Capability::ViewFinancial,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ViewOwnServiceRequests => "service_requests.view_own",
            Capability::ManageOwnServiceRequests => "service_requests.manage_own",
            Capability::ViewAllServiceRequests => "service_requests.view_all",
            Capability::ManageAllServiceRequests => "service_requests.manage_all",
            Capability::ViewOwnProjects => "projects.view_own",
            Capability::ManageOwnProjects => "projects.manage_own",
            Capability::ViewAllProjects => "projects.view_all",
            Capability::ManageAllProjects => "projects.manage_all",
            Capability::ViewOwnQuotes => "quotes.view_own",
            Capability::ManageOwnQuotes => "quotes.manage_own",
            Capability::ViewAllQuotes => "quotes.view_all",
            Capability::ManageAllQuotes => "quotes.manage_all",
            Capability::ViewOwnInvoices => "invoices.view_own",
            Capability::ManageOwnInvoices => "invoices.manage_own",
            Capability::ViewAllInvoices => "invoices.view_all",
            Capability::ManageAllInvoices => "invoices.manage_all",
            Capability::ViewOwnTickets => "tickets.view_own",
            Capability::ManageOwnTickets => "tickets.manage_own",
            Capability::ViewAllTickets => "tickets.view_all",
            Capability::ManageAllTickets => "tickets.manage_all",
            Capability::ViewClients => "clients.view",
            Capability::ManageClients => "clients.manage",
            Capability::ViewLeads => "leads.view",
            Capability::ManageLeads => "leads.manage",
            Capability::ViewUsers => "users.view",
            Capability::ManageUsers => "users.manage",
            Capability::ViewInventory => "inventory.view",
            Capability::ManageInventory => "inventory.manage",
            Capability::ViewFinancial => "financial.view",
        }
    }
}

impl core::fmt::Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn capability_names_are_globally_unique() {
        let names: HashSet<&str> = Capability::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(names.len(), Capability::ALL.len());
    }
}
