//! Session state shared by every workflow.
//!
//! The handle is the single source of truth for auth state: mutation
//! funnels through `set`/`clear`, which persist through the local store
//! and notify subscribers over a watch channel. Nothing else in the
//! workspace touches the token.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{info, warn};

use voxid_store::{keys, LocalStore};

use crate::error::Result;
use crate::types::Identity;

/// Authentication state: token plus the identity it belongs to.
///
/// Invariant: an absent token implies an absent identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub token: Option<String>,
    pub identity: Option<Identity>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// Shared, cloneable handle to the session.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    state: RwLock<Session>,
    store: Arc<dyn LocalStore>,
    watch_tx: watch::Sender<Session>,
}

impl SessionHandle {
    /// Creates a handle, restoring any persisted session from the
    /// store (cold-start restore).
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        let restored = restore(store.as_ref());
        let (watch_tx, _) = watch::channel(restored.clone());
        Self {
            inner: Arc::new(SessionInner {
                state: RwLock::new(restored),
                store,
                watch_tx,
            }),
        }
    }

    /// Returns a copy of the current session.
    pub fn snapshot(&self) -> Session {
        self.inner.state.read().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.inner.state.read().token.clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.inner.state.read().identity.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.read().is_authenticated()
    }

    /// Subscribes to session changes. The receiver observes every
    /// login, logout, and expiry.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.watch_tx.subscribe()
    }

    /// Installs a fresh token and identity, persisting both.
    pub fn set(&self, token: String, identity: Identity) -> Result<()> {
        self.inner.store.set(keys::TOKEN, token.as_bytes())?;
        let encoded =
            serde_json::to_vec(&identity).map_err(|e| crate::Error::Store(e.to_string()))?;
        self.inner.store.set(keys::IDENTITY, &encoded)?;

        let session = Session {
            token: Some(token),
            identity: Some(identity),
        };
        *self.inner.state.write() = session.clone();
        self.inner.watch_tx.send_replace(session);
        Ok(())
    }

    /// Clears token and identity. Returns true if there was anything
    /// to clear; a second call is a no-op.
    pub fn clear(&self) -> bool {
        {
            let mut state = self.inner.state.write();
            if !state.is_authenticated() && state.identity.is_none() {
                return false;
            }
            *state = Session::default();
        }

        for key in [keys::TOKEN, keys::IDENTITY] {
            if let Err(e) = self.inner.store.delete(key) {
                warn!("failed to remove {} from store: {}", key, e);
            }
        }
        self.inner.watch_tx.send_replace(Session::default());
        true
    }

    /// Expiry path (401): clears at most once and logs the event.
    pub(crate) fn expire(&self) -> bool {
        let cleared = self.clear();
        if cleared {
            info!("session expired, credentials cleared");
        }
        cleared
    }
}

/// Reads the persisted session, enforcing the token/identity invariant.
fn restore(store: &dyn LocalStore) -> Session {
    let token = store
        .get(keys::TOKEN)
        .ok()
        .flatten()
        .and_then(|b| String::from_utf8(b).ok());

    if token.is_none() {
        return Session::default();
    }

    let identity = store
        .get(keys::IDENTITY)
        .ok()
        .flatten()
        .and_then(|b| serde_json::from_slice(&b).ok());

    Session { token, identity }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxid_store::MemoryStore;

    fn identity(name: &str) -> Identity {
        Identity {
            id: None,
            nick_name: name.to_string(),
            avatar_url: None,
        }
    }

    #[test]
    fn test_set_and_clear_persist() {
        let store = MemoryStore::new();
        let handle = SessionHandle::new(Arc::new(store.clone()));

        handle.set("tok-1".to_string(), identity("Ada")).unwrap();
        assert!(handle.is_authenticated());
        assert_eq!(store.get(keys::TOKEN).unwrap(), Some(b"tok-1".to_vec()));

        assert!(handle.clear());
        assert!(!handle.is_authenticated());
        assert_eq!(store.get(keys::TOKEN).unwrap(), None);
        assert_eq!(store.get(keys::IDENTITY).unwrap(), None);

        // second clear is a no-op
        assert!(!handle.clear());
    }

    #[test]
    fn test_cold_start_restore() {
        let store = MemoryStore::new();
        {
            let handle = SessionHandle::new(Arc::new(store.clone()));
            handle.set("tok-2".to_string(), identity("Grace")).unwrap();
        }

        let handle = SessionHandle::new(Arc::new(store));
        assert_eq!(handle.token().as_deref(), Some("tok-2"));
        assert_eq!(handle.identity().unwrap().nick_name, "Grace");
    }

    #[test]
    fn test_restore_drops_orphan_identity() {
        let store = MemoryStore::new();
        store
            .set(keys::IDENTITY, br#"{"nickName":"Orphan"}"#)
            .unwrap();

        // identity without a token violates the invariant and is dropped
        let handle = SessionHandle::new(Arc::new(store));
        assert!(handle.token().is_none());
        assert!(handle.identity().is_none());
    }

    #[test]
    fn test_watch_observes_changes() {
        let handle = SessionHandle::new(Arc::new(MemoryStore::new()));
        let rx = handle.subscribe();

        handle.set("tok-3".to_string(), identity("Lin")).unwrap();
        assert!(rx.borrow().is_authenticated());

        handle.clear();
        assert!(!rx.borrow().is_authenticated());
    }
}
