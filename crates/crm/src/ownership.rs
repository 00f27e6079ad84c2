//! The ownership resolver.
//!
//! Given a principal id, compute the complete set of CRM records (clients,
//! leads) linked to that user. Implemented as a full scan over both tables —
//! they are orders of magnitude smaller than the transactional tables. If
//! that stops being true the scan should become an indexed lookup, but the
//! contract (the *complete* linked set) must not change.
//!
//! Results are recomputed per request and never cached across requests;
//! ownership can change between requests.

use fieldops_auth::OwnedRecords;
use fieldops_core::UserId;

use crate::store::ClientDirectory;

/// Resolve the CRM records owned by `user_id`.
///
/// Fail-closed: on any data-access error this returns empty sets. An
/// authorization check that receives empty ownership naturally denies, so a
/// store outage can never widen access.
pub fn resolve_owned(directory: &dyn ClientDirectory, user_id: UserId) -> OwnedRecords {
    let (clients, leads) = match (directory.clients(), directory.leads()) {
        (Ok(clients), Ok(leads)) => (clients, leads),
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(user_id = %user_id, error = %e, "ownership scan failed; denying by default");
            return OwnedRecords::empty();
        }
    };

    let mut owned = OwnedRecords::empty();

    for client in clients {
        if client.user_id == Some(user_id) {
            owned.client_ids.insert(client.id);
        }
    }

    for lead in leads {
        if lead.user_id == Some(user_id) {
            owned.lead_ids.insert(lead.id);
        }
    }

    owned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{Client, Lead};
    use crate::store::CrmStore;
    use chrono::Utc;
    use fieldops_core::StoreError;

    struct FailingDirectory;

    impl ClientDirectory for FailingDirectory {
        fn clients(&self) -> Result<Vec<Client>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        fn leads(&self) -> Result<Vec<Lead>, StoreError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn collects_exactly_the_linked_records() {
        let store = CrmStore::new();
        let user = UserId::new();
        let other = UserId::new();

        let mut mine = Client::new("Mine", Utc::now());
        mine.user_id = Some(user);
        let mut theirs = Client::new("Theirs", Utc::now());
        theirs.user_id = Some(other);
        let unlinked = Client::new("Unlinked", Utc::now());

        store.clients.insert(mine.id, mine.clone()).unwrap();
        store.clients.insert(theirs.id, theirs).unwrap();
        store.clients.insert(unlinked.id, unlinked).unwrap();

        let mut lead = Lead::new("Prospect", Utc::now());
        lead.user_id = Some(user);
        store.leads.insert(lead.id, lead.clone()).unwrap();

        let owned = resolve_owned(&store, user);
        assert_eq!(owned.client_ids.len(), 1);
        assert!(owned.client_ids.contains(&mine.id));
        assert_eq!(owned.lead_ids.len(), 1);
        assert!(owned.lead_ids.contains(&lead.id));
    }

    #[test]
    fn no_links_means_empty_sets() {
        let store = CrmStore::new();
        let owned = resolve_owned(&store, UserId::new());
        assert!(owned.is_empty());
    }

    #[test]
    fn store_failure_yields_empty_sets_not_an_error() {
        let owned = resolve_owned(&FailingDirectory, UserId::new());
        assert!(owned.is_empty());
    }
}
