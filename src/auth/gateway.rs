//! Authenticated request gateway
//!
//! Every call that needs user data goes through here. The gateway reads the
//! stored credential on each request, attaches the bearer token plus the
//! provider's api-key headers, and enforces the automatic-logout contract: a
//! 401 terminates the session before the error is returned, so nothing in the
//! application keeps operating with a credential the provider has rejected.

use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::AuthError;
use crate::http;

use super::session::SessionState;

const API_VERSION_HEADER: &str = "trakt-api-version";
const API_VERSION: &str = "2";
const API_KEY_HEADER: &str = "trakt-api-key";

/// Successful response from a protected call
#[derive(Debug)]
pub struct ProtectedResponse {
    pub status: StatusCode,
    /// None for 204 / empty-body responses
    pub body: Option<Value>,
}

/// Gateway for protected provider calls
pub struct ApiGateway {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
    session: Arc<SessionState>,
}

impl ApiGateway {
    pub fn new(base_url: String, client_id: String, session: Arc<SessionState>) -> Self {
        Self {
            client: http::default_client(),
            base_url,
            client_id,
            session,
        }
    }

    /// Issue a protected GET request
    pub async fn get(&self, path: &str) -> Result<ProtectedResponse, AuthError> {
        self.call(Method::GET, path, None).await
    }

    /// Issue a protected POST request with a JSON body
    pub async fn post(&self, path: &str, body: Value) -> Result<ProtectedResponse, AuthError> {
        self.call(Method::POST, path, Some(body)).await
    }

    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<ProtectedResponse, AuthError> {
        // The stored record is the sole source of auth-state truth; never
        // attempt an unauthenticated protected call.
        let tokens = self
            .session
            .storage()
            .load()
            .ok_or(AuthError::NotAuthenticated)?;

        let url = format!("{}{}", self.base_url, path);
        debug!("Protected {} {}", method, url);

        let mut request = self
            .client
            .request(method, &url)
            .header("Authorization", format!("Bearer {}", tokens.access_token))
            .header("Content-Type", "application/json")
            .header(API_VERSION_HEADER, API_VERSION)
            .header(API_KEY_HEADER, &self.client_id);

        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            // Automatic-logout contract: terminate synchronously before
            // returning so every caller observes logged-out immediately.
            warn!("Provider rejected credential (401), terminating session");
            self.session.terminate();
            return Err(AuthError::Unauthorized);
        }

        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AuthError::RequestFailed {
                status: status.as_u16(),
                detail,
            });
        }

        // 204 and empty bodies are valid successes with no payload
        if status == StatusCode::NO_CONTENT {
            return Ok(ProtectedResponse { status, body: None });
        }

        let text = response
            .text()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let body = if text.trim().is_empty() {
            None
        } else {
            Some(serde_json::from_str(&text).map_err(|e| AuthError::RequestFailed {
                status: status.as_u16(),
                detail: format!("invalid JSON body: {}", e),
            })?)
        };

        Ok(ProtectedResponse { status, body })
    }
}
