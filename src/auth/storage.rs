//! Durable credential storage with keyring and file fallback
//!
//! A stored token set is the sole source of truth for authentication state:
//! the user is logged in iff `load` returns a record. Writes that fail are
//! logged and dropped - the safe default is to appear logged out - and
//! corrupted contents read back as "not authenticated" rather than an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

const SERVICE_NAME: &str = "screenscout-sync";
const TOKEN_KEY: &str = "oauth_tokens";
const TOKEN_FILE: &str = "tokens.json";

/// Storage backend type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// OS native keyring
    Keyring,
    /// JSON file in the application state directory
    File(PathBuf),
}

/// The credential record returned by the provider's token endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Recorded locally at save time, shown by the status command
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl TokenSet {
    /// Expiry instant, when the provider supplied a lifetime
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        match (self.created_at, self.expires_in) {
            (Some(created), Some(secs)) => Some(created + chrono::Duration::seconds(secs)),
            _ => None,
        }
    }
}

/// Manages the single stored credential record
pub struct CredentialStorage {
    backend: StorageBackend,
}

impl CredentialStorage {
    /// Create a credential store, preferring the OS keyring
    pub fn new() -> Self {
        if Self::keyring_available() {
            Self {
                backend: StorageBackend::Keyring,
            }
        } else {
            let path = Self::default_file_path();
            debug!("Keyring unavailable, using file storage at {:?}", path);
            Self {
                backend: StorageBackend::File(path),
            }
        }
    }

    /// Create a file-backed store at an explicit path (tests)
    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: StorageBackend::File(path.into()),
        }
    }

    fn keyring_available() -> bool {
        keyring::Entry::new(SERVICE_NAME, TOKEN_KEY).is_ok()
    }

    fn default_file_path() -> PathBuf {
        crate::config::state_dir()
            .map(|dir| dir.join(TOKEN_FILE))
            .unwrap_or_else(|_| PathBuf::from(TOKEN_FILE))
    }

    /// Persist the token set, replacing any previous record
    ///
    /// Write failures are logged and swallowed: the user simply stays
    /// logged out, which is safer than crashing mid-flow.
    pub fn save(&self, tokens: &TokenSet) {
        let data = match serde_json::to_string(tokens) {
            Ok(data) => data,
            Err(e) => {
                warn!("Failed to serialize credentials: {}", e);
                return;
            }
        };

        match &self.backend {
            StorageBackend::Keyring => {
                let entry = match keyring::Entry::new(SERVICE_NAME, TOKEN_KEY) {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!("Failed to open keyring entry: {}", e);
                        return;
                    }
                };
                if let Err(e) = entry.set_password(&data) {
                    warn!("Failed to store credentials in keyring: {}", e);
                }
            }
            StorageBackend::File(path) => {
                if let Some(parent) = path.parent() {
                    if let Err(e) = fs::create_dir_all(parent) {
                        warn!("Failed to create storage directory: {}", e);
                        return;
                    }
                }
                if let Err(e) = fs::write(path, &data) {
                    warn!("Failed to write credentials file: {}", e);
                    return;
                }
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    if let Ok(meta) = fs::metadata(path) {
                        let mut perms = meta.permissions();
                        perms.set_mode(0o600);
                        let _ = fs::set_permissions(path, perms);
                    }
                }
            }
        }
    }

    /// Load the stored token set
    ///
    /// Missing, unreadable or corrupted contents all read as None: a record
    /// that cannot be parsed is treated as "not authenticated".
    pub fn load(&self) -> Option<TokenSet> {
        let data = match &self.backend {
            StorageBackend::Keyring => {
                let entry = keyring::Entry::new(SERVICE_NAME, TOKEN_KEY).ok()?;
                entry.get_password().ok()?
            }
            StorageBackend::File(path) => fs::read_to_string(path).ok()?,
        };

        match serde_json::from_str::<TokenSet>(&data) {
            Ok(tokens) if !tokens.access_token.is_empty() => Some(tokens),
            Ok(_) => {
                warn!("Stored credential has empty access token, treating as logged out");
                None
            }
            Err(e) => {
                warn!("Stored credential is corrupted, treating as logged out: {}", e);
                None
            }
        }
    }

    /// Remove the stored record; best effort
    pub fn clear(&self) {
        match &self.backend {
            StorageBackend::Keyring => {
                if let Ok(entry) = keyring::Entry::new(SERVICE_NAME, TOKEN_KEY) {
                    let _ = entry.delete_password();
                }
            }
            StorageBackend::File(path) => {
                if path.exists() {
                    if let Err(e) = fs::remove_file(path) {
                        warn!("Failed to remove credentials file: {}", e);
                    }
                }
            }
        }
    }

    /// Get the storage backend type
    pub fn backend(&self) -> &StorageBackend {
        &self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn file_store() -> (TempDir, CredentialStorage) {
        let dir = TempDir::new().unwrap();
        let store = CredentialStorage::with_file(dir.path().join("tokens.json"));
        (dir, store)
    }

    fn sample_tokens() -> TokenSet {
        TokenSet {
            access_token: "tok_abc".to_string(),
            refresh_token: Some("ref_abc".to_string()),
            expires_in: Some(7776000),
            token_type: Some("bearer".to_string()),
            scope: Some("public".to_string()),
            created_at: Some(Utc::now()),
        }
    }

    #[test]
    fn test_save_load_roundtrip() {
        let (_dir, store) = file_store();
        store.save(&sample_tokens());

        let loaded = store.load().unwrap();
        assert_eq!(loaded.access_token, "tok_abc");
        assert_eq!(loaded.refresh_token.as_deref(), Some("ref_abc"));
        assert_eq!(loaded.expires_in, Some(7776000));
        assert_eq!(loaded.scope.as_deref(), Some("public"));
    }

    #[test]
    fn test_load_without_save() {
        let (_dir, store) = file_store();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_clear_removes_record() {
        let (_dir, store) = file_store();
        store.save(&sample_tokens());
        assert!(store.load().is_some());

        store.clear();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let (_dir, store) = file_store();
        store.clear();
        store.clear();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_corrupted_contents_read_as_logged_out() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tokens.json");
        fs::write(&path, "{{{ definitely not json").unwrap();

        let store = CredentialStorage::with_file(&path);
        assert!(store.load().is_none());
    }

    #[test]
    fn test_empty_access_token_reads_as_logged_out() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tokens.json");
        fs::write(&path, r#"{"access_token": ""}"#).unwrap();

        let store = CredentialStorage::with_file(&path);
        assert!(store.load().is_none());
    }

    #[test]
    fn test_save_to_unwritable_path_is_silent() {
        let store = CredentialStorage::with_file("/proc/screenscout-nope/tokens.json");
        // Must not panic; auth simply appears failed afterwards
        store.save(&sample_tokens());
        assert!(store.load().is_none());
    }

    #[test]
    fn test_expires_at() {
        let created = Utc::now();
        let tokens = TokenSet {
            access_token: "t".to_string(),
            refresh_token: None,
            expires_in: Some(3600),
            token_type: None,
            scope: None,
            created_at: Some(created),
        };
        assert_eq!(
            tokens.expires_at().unwrap(),
            created + chrono::Duration::seconds(3600)
        );

        let no_expiry = TokenSet {
            expires_in: None,
            ..tokens
        };
        assert!(no_expiry.expires_at().is_none());
    }
}
