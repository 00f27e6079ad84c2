//! Server-side sessions.
//!
//! Session ids are opaque 128-bit random handles; all account state lives on
//! the server side. Login regenerates the id (the old one is destroyed first)
//! so a session fixated before authentication never survives it.

use std::collections::HashMap;
use std::sync::RwLock;

use rand::RngCore;

use fieldops_core::UserId;

const SESSION_ID_BYTES: usize = 16;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "fieldops_session";

/// In-memory session table.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, UserId>>,
}

fn new_session_id() -> String {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh session for `user_id` and return its id.
    pub fn create(&self, user_id: UserId) -> String {
        let sid = new_session_id();
        self.write().insert(sid.clone(), user_id);
        sid
    }

    pub fn get(&self, sid: &str) -> Option<UserId> {
        self.read().get(sid).copied()
    }

    /// Destroy a session, returning the user it belonged to.
    pub fn destroy(&self, sid: &str) -> Option<UserId> {
        self.write().remove(sid)
    }

    /// Replace any pre-login session with a fresh one for `user_id`.
    ///
    /// The old id is removed before the new one exists; there is no moment
    /// where both resolve.
    pub fn regenerate(&self, old_sid: Option<&str>, user_id: UserId) -> String {
        let mut sessions = self.write();
        if let Some(old) = old_sid {
            sessions.remove(old);
        }
        let sid = new_session_id();
        sessions.insert(sid.clone(), user_id);
        sid
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, UserId>> {
        match self.sessions.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, UserId>> {
        match self.sessions.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_long_and_unique() {
        let store = SessionStore::new();
        let a = store.create(UserId::new());
        let b = store.create(UserId::new());
        assert_eq!(a.len(), SESSION_ID_BYTES * 2);
        assert_ne!(a, b);
    }

    #[test]
    fn regenerate_invalidates_the_old_id() {
        let store = SessionStore::new();
        let user = UserId::new();

        let old = store.create(user);
        let new = store.regenerate(Some(&old), user);

        assert_ne!(old, new);
        assert_eq!(store.get(&old), None);
        assert_eq!(store.get(&new), Some(user));
    }

    #[test]
    fn destroy_removes_the_session() {
        let store = SessionStore::new();
        let user = UserId::new();
        let sid = store.create(user);

        assert_eq!(store.destroy(&sid), Some(user));
        assert_eq!(store.get(&sid), None);
    }
}
