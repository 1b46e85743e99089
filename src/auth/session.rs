//! Session state and termination
//!
//! A `tokio::sync::watch` channel carries the in-memory "authenticated" flag.
//! `terminate` clears durable storage first and then flips the flag, so every
//! subscriber observes the logged-out state before the next protected call
//! can be issued. The flag is derived from storage at startup and only ever
//! changed alongside it, never independently.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use super::storage::CredentialStorage;

/// Shared authentication state
pub struct SessionState {
    storage: Arc<CredentialStorage>,
    tx: watch::Sender<bool>,
}

impl SessionState {
    /// Create session state, deriving the initial flag from storage
    pub fn new(storage: Arc<CredentialStorage>) -> Self {
        let authenticated = storage.load().is_some();
        let (tx, _) = watch::channel(authenticated);
        Self { storage, tx }
    }

    /// Whether a credential record is currently held
    pub fn is_authenticated(&self) -> bool {
        *self.tx.borrow()
    }

    /// Subscribe to authentication-state changes
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Mark the session as established after a successful exchange
    pub(crate) fn establish(&self) {
        let _ = self.tx.send(true);
    }

    /// End the session: clear stored credentials, then broadcast logged-out
    ///
    /// Called on explicit disconnect and by the gateway when the provider
    /// rejects the credential with a 401.
    pub fn terminate(&self) {
        self.storage.clear();
        let _ = self.tx.send(false);
        info!("Session terminated");
    }

    /// Access the underlying credential storage
    pub fn storage(&self) -> &CredentialStorage {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::storage::TokenSet;
    use tempfile::TempDir;

    fn state_with_store() -> (TempDir, SessionState, Arc<CredentialStorage>) {
        let dir = TempDir::new().unwrap();
        let storage = Arc::new(CredentialStorage::with_file(dir.path().join("tokens.json")));
        let state = SessionState::new(storage.clone());
        (dir, state, storage)
    }

    fn tokens() -> TokenSet {
        TokenSet {
            access_token: "tok".to_string(),
            refresh_token: None,
            expires_in: None,
            token_type: None,
            scope: None,
            created_at: None,
        }
    }

    #[test]
    fn test_initial_state_from_storage() {
        let (_dir, state, _) = state_with_store();
        assert!(!state.is_authenticated());
    }

    #[test]
    fn test_initial_state_with_existing_record() {
        let dir = TempDir::new().unwrap();
        let storage = Arc::new(CredentialStorage::with_file(dir.path().join("tokens.json")));
        storage.save(&tokens());

        let state = SessionState::new(storage);
        assert!(state.is_authenticated());
    }

    #[test]
    fn test_terminate_clears_storage_and_flag() {
        let (_dir, state, storage) = state_with_store();
        storage.save(&tokens());
        state.establish();
        assert!(state.is_authenticated());

        state.terminate();
        assert!(!state.is_authenticated());
        assert!(storage.load().is_none());
    }

    #[tokio::test]
    async fn test_subscribers_observe_termination() {
        let (_dir, state, storage) = state_with_store();
        storage.save(&tokens());
        state.establish();

        let mut rx = state.subscribe();
        assert!(*rx.borrow_and_update());

        state.terminate();
        rx.changed().await.unwrap();
        assert!(!*rx.borrow_and_update());
    }
}
