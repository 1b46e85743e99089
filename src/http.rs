//! HTTP client utilities
//!
//! Provides a reqwest::Client configured with a timeout and the crate user-agent.
//! Every outbound client in the application goes through here so timeouts stay
//! consistent across the metadata, recommendation and sync providers.

use reqwest::Client;
use std::time::Duration;

/// Default timeout for provider requests
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Build a reqwest Client with the given timeout
pub fn client_with_timeout(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("screenscout/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("Failed to create HTTP client")
}

/// Build a reqwest Client with the default 30 second timeout
pub fn default_client() -> Client {
    client_with_timeout(DEFAULT_TIMEOUT)
}
