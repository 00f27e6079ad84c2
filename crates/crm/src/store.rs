//! In-memory record stores.
//!
//! [`Table`] is a lock-backed map with clone-out semantics, fallible so that
//! callers must handle data-access failures explicitly (the ownership
//! resolver turns them into fail-closed empty sets).

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::RwLock;

use fieldops_auth::{UserRecord, UserStore};
use fieldops_core::{
    ClientId, InventoryItemId, InvoiceId, LeadId, ProjectId, QuoteId, ServiceRequestId,
    StoreError, TicketId, UserId,
};

use crate::client::{Client, Lead};
use crate::inventory::InventoryItem;
use crate::records::{Invoice, Project, Quote, ServiceRequest, Ticket};

/// A single in-memory table.
#[derive(Debug)]
pub struct Table<Id, T> {
    rows: RwLock<HashMap<Id, T>>,
}

impl<Id, T> Table<Id, T>
where
    Id: Copy + Eq + Hash,
    T: Clone,
{
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, id: Id) -> Result<Option<T>, StoreError> {
        let rows = self.rows.read().map_err(|_| StoreError::Poisoned)?;
        Ok(rows.get(&id).cloned())
    }

    pub fn insert(&self, id: Id, row: T) -> Result<(), StoreError> {
        let mut rows = self.rows.write().map_err(|_| StoreError::Poisoned)?;
        rows.insert(id, row);
        Ok(())
    }

    /// Insert `row` unless an existing row matches `conflicts`. Returns
    /// whether the row went in; callers map `false` to a conflict response.
    ///
    /// Check and insert happen under one write lock, so two concurrent
    /// inserts with the same business key cannot both succeed.
    pub fn insert_unique(
        &self,
        id: Id,
        row: T,
        conflicts: impl Fn(&T) -> bool,
    ) -> Result<bool, StoreError> {
        let mut rows = self.rows.write().map_err(|_| StoreError::Poisoned)?;
        if rows.values().any(|existing| conflicts(existing)) {
            return Ok(false);
        }
        rows.insert(id, row);
        Ok(true)
    }

    /// Build and insert a row under one lock acquisition, passing the current
    /// row count to `make`. Server-generated sequence numbers go through here
    /// so the count cannot race the insert.
    pub fn insert_with(&self, id: Id, make: impl FnOnce(usize) -> T) -> Result<T, StoreError> {
        let mut rows = self.rows.write().map_err(|_| StoreError::Poisoned)?;
        let row = make(rows.len());
        rows.insert(id, row.clone());
        Ok(row)
    }

    /// Apply `mutate` to the stored row, if present. Returns the updated row.
    pub fn update(&self, id: Id, mutate: impl FnOnce(&mut T)) -> Result<Option<T>, StoreError> {
        let mut rows = self.rows.write().map_err(|_| StoreError::Poisoned)?;
        Ok(rows.get_mut(&id).map(|row| {
            mutate(row);
            row.clone()
        }))
    }

    pub fn remove(&self, id: Id) -> Result<Option<T>, StoreError> {
        let mut rows = self.rows.write().map_err(|_| StoreError::Poisoned)?;
        Ok(rows.remove(&id))
    }

    pub fn all(&self) -> Result<Vec<T>, StoreError> {
        let rows = self.rows.read().map_err(|_| StoreError::Poisoned)?;
        Ok(rows.values().cloned().collect())
    }

    pub fn find(&self, pred: impl Fn(&T) -> bool) -> Result<Option<T>, StoreError> {
        let rows = self.rows.read().map_err(|_| StoreError::Poisoned)?;
        Ok(rows.values().find(|row| pred(row)).cloned())
    }
}

impl<Id, T> Default for Table<Id, T>
where
    Id: Copy + Eq + Hash,
    T: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Read access to the CRM tables the ownership resolver scans.
///
/// Kept as a narrow trait so tests can substitute a failing directory and
/// prove the resolver fails closed.
pub trait ClientDirectory: Send + Sync {
    fn clients(&self) -> Result<Vec<Client>, StoreError>;
    fn leads(&self) -> Result<Vec<Lead>, StoreError>;
}

/// All application tables, one process-wide instance.
#[derive(Debug, Default)]
pub struct CrmStore {
    pub users: Table<UserId, UserRecord>,
    pub clients: Table<ClientId, Client>,
    pub leads: Table<LeadId, Lead>,
    pub service_requests: Table<ServiceRequestId, ServiceRequest>,
    pub projects: Table<ProjectId, Project>,
    pub quotes: Table<QuoteId, Quote>,
    pub invoices: Table<InvoiceId, Invoice>,
    pub tickets: Table<TicketId, Ticket>,
    pub inventory: Table<InventoryItemId, InventoryItem>,
}

impl CrmStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClientDirectory for CrmStore {
    fn clients(&self) -> Result<Vec<Client>, StoreError> {
        self.clients.all()
    }

    fn leads(&self) -> Result<Vec<Lead>, StoreError> {
        self.leads.all()
    }
}

impl UserStore for CrmStore {
    fn find(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        self.users.get(id)
    }

    fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let needle = email.trim().to_lowercase();
        self.users.find(|u| u.email == needle)
    }

    fn insert(&self, user: UserRecord) -> Result<(), StoreError> {
        self.users.insert(user.id, user)
    }

    fn update(&self, user: UserRecord) -> Result<(), StoreError> {
        self.users.insert(user.id, user)
    }

    fn remove(&self, id: UserId) -> Result<(), StoreError> {
        self.users.remove(id).map(|_| ())
    }

    fn list(&self) -> Result<Vec<UserRecord>, StoreError> {
        self.users.all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn table_round_trips_rows() {
        let table: Table<ClientId, Client> = Table::new();
        let client = Client::new("Acme", Utc::now());
        let id = client.id;

        table.insert(id, client).unwrap();
        assert_eq!(table.get(id).unwrap().unwrap().name, "Acme");

        let updated = table
            .update(id, |c| c.name = "Acme Ltd".to_string())
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Acme Ltd");

        assert!(table.remove(id).unwrap().is_some());
        assert!(table.get(id).unwrap().is_none());
    }

    #[test]
    fn insert_unique_refuses_a_colliding_row() {
        let table: Table<ClientId, Client> = Table::new();
        let first = Client::new("Acme", Utc::now());
        let second = Client::new("Acme", Utc::now());

        assert!(table
            .insert_unique(first.id, first.clone(), |c| c.name == "Acme")
            .unwrap());
        assert!(!table
            .insert_unique(second.id, second, |c| c.name == "Acme")
            .unwrap());
        assert_eq!(table.all().unwrap().len(), 1);
    }

    #[test]
    fn insert_with_sees_the_count_it_inserts_at() {
        let table: Table<ClientId, Client> = Table::new();
        for expected in 0..3 {
            let row = table
                .insert_with(ClientId::new(), |count| {
                    assert_eq!(count, expected);
                    Client::new(format!("client-{count}"), Utc::now())
                })
                .unwrap();
            assert_eq!(row.name, format!("client-{expected}"));
        }
    }

    #[test]
    fn find_by_email_is_case_insensitive() {
        let store = CrmStore::new();
        let user = UserRecord::new(
            "Alice@Example.com",
            "Alice",
            fieldops_auth::Role::Sales,
            "hash".to_string(),
        );
        UserStore::insert(&store, user).unwrap();

        assert!(store.find_by_email("alice@example.com").unwrap().is_some());
        assert!(store.find_by_email("ALICE@EXAMPLE.COM ").unwrap().is_some());
        assert!(store.find_by_email("bob@example.com").unwrap().is_none());
    }
}
