//! OAuth client for the watch-history provider
//!
//! Builds the authorization redirect URL and performs the PKCE code exchange
//! against the provider's token endpoint.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::AppConfig;
use crate::error::AuthError;
use crate::http;

use super::storage::TokenSet;

/// OAuth client bound to one provider configuration
pub struct OAuthClient {
    client_id: String,
    redirect_uri: String,
    authorize_url: String,
    token_url: String,
    http_client: reqwest::Client,
}

/// Token endpoint success response
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

impl OAuthClient {
    /// Create a client from application config and the redirect URI in use
    ///
    /// The redirect URI must match the provider-registered value exactly and
    /// is sent byte-for-byte in both the authorization URL and the exchange.
    pub fn new(config: &AppConfig, redirect_uri: String) -> Self {
        Self {
            client_id: config.client_id.clone(),
            redirect_uri,
            authorize_url: config.authorize_url.clone(),
            token_url: config.token_url.clone(),
            http_client: http::default_client(),
        }
    }

    /// Build the provider authorization URL for the given challenge and state
    pub fn authorization_url(&self, code_challenge: &str, state: &str) -> String {
        let params = [
            ("response_type", "code"),
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("code_challenge", code_challenge),
            ("code_challenge_method", "S256"),
            ("state", state),
        ];

        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        format!("{}?{}", self.authorize_url, query)
    }

    /// Exchange a one-time authorization code plus the original verifier for tokens
    ///
    /// Any non-success status, transport failure or unusable body maps to
    /// `TokenExchangeFailed`; the caller must not retry with the same code.
    pub async fn exchange_code(&self, code: &str, verifier: &str) -> Result<TokenSet, AuthError> {
        let body = json!({
            "code": code,
            "client_id": self.client_id,
            "redirect_uri": self.redirect_uri,
            "grant_type": "authorization_code",
            "code_verifier": verifier,
        });

        let resp = self
            .http_client
            .post(&self.token_url)
            .json(&body)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| AuthError::TokenExchangeFailed(format!("token request failed: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(AuthError::TokenExchangeFailed(format!(
                "status {}: {}",
                status, detail
            )));
        }

        let token_resp: TokenResponse = resp.json().await.map_err(|e| {
            AuthError::TokenExchangeFailed(format!("failed to decode token response: {}", e))
        })?;

        if token_resp.access_token.is_empty() {
            return Err(AuthError::TokenExchangeFailed(
                "response contained no access token".to_string(),
            ));
        }

        Ok(TokenSet {
            access_token: token_resp.access_token,
            refresh_token: token_resp.refresh_token,
            expires_in: token_resp.expires_in,
            token_type: token_resp.token_type,
            scope: token_resp.scope,
            created_at: Some(Utc::now()),
        })
    }
}
