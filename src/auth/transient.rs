//! Transient pending-authorization store
//!
//! Holds the PKCE verifier (and the flow state value) between building the
//! authorization URL and completing the code exchange. Exactly one pending
//! record is live at a time; `take` removes it on first read so the verifier
//! is single-use whatever the exchange outcome.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::warn;

use crate::error::AuthError;

const PENDING_FILE: &str = "pending_auth.json";

/// The single pending authorization attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingAuth {
    pub verifier: String,
    pub state: String,
}

/// File-backed store for the pending authorization record
pub struct TransientStore {
    dir: PathBuf,
}

impl TransientStore {
    /// Create a store rooted at the application state directory
    pub fn new() -> Result<Self, AuthError> {
        let dir = crate::config::state_dir()
            .map_err(|e| AuthError::PendingStateUnavailable(e.to_string()))?;
        Ok(Self { dir })
    }

    /// Create a store rooted at an explicit directory (tests)
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self) -> PathBuf {
        self.dir.join(PENDING_FILE)
    }

    /// Persist a pending record, replacing any previous one
    ///
    /// A persistence failure must abort the authorization attempt before any
    /// redirect happens, so this propagates the error instead of degrading.
    pub fn put(&self, pending: &PendingAuth) -> Result<(), AuthError> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| AuthError::PendingStateUnavailable(e.to_string()))?;

        let data = serde_json::to_string(pending)
            .map_err(|e| AuthError::PendingStateUnavailable(e.to_string()))?;

        fs::write(self.path(), data)
            .map_err(|e| AuthError::PendingStateUnavailable(e.to_string()))
    }

    /// Read and immediately delete the pending record
    ///
    /// Returns None when no attempt is pending or the record is unreadable;
    /// either way nothing is left behind for a replayed callback to consume.
    pub fn take(&self) -> Option<PendingAuth> {
        let path = self.path();
        let contents = fs::read_to_string(&path).ok()?;

        if let Err(e) = fs::remove_file(&path) {
            warn!("Failed to remove pending authorization file: {}", e);
        }

        match serde_json::from_str(&contents) {
            Ok(pending) => Some(pending),
            Err(e) => {
                warn!("Discarding unreadable pending authorization: {}", e);
                None
            }
        }
    }
}
