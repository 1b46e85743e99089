//! Error types for the screenscout CLI

use thiserror::Error;

/// Errors raised by the authentication subsystem
#[derive(Debug, Error)]
pub enum AuthError {
    /// Callback received with no pending PKCE state; the flow must restart
    #[error("No pending authorization found - start the connect flow again")]
    MissingVerifier,

    /// Provider rejected the code exchange (codes are single-use, do not retry)
    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    /// Protected call attempted with no stored credential
    #[error("Not authenticated - run 'screenscout connect' first")]
    NotAuthenticated,

    /// Provider rejected the stored credential; the session has been terminated
    #[error("Credential rejected by provider - session terminated")]
    Unauthorized,

    /// Non-success status on a protected call; says nothing about the credential
    #[error("Request failed with status {status}: {detail}")]
    RequestFailed { status: u16, detail: String },

    /// Transport-level failure before any HTTP status was observed
    #[error("Network error: {0}")]
    Network(String),

    /// Verifier length outside the 43-128 window required by RFC 7636
    #[error("Invalid verifier length {0}, must be 43-128")]
    InvalidVerifierLength(usize),

    /// Pending-auth state could not be persisted; authorization must not proceed
    #[error("Failed to persist pending authorization: {0}")]
    PendingStateUnavailable(String),
}

/// Application error types surfaced by CLI commands
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider request failed: {0}")]
    Provider(String),

    #[error("Response parse failed: {0}")]
    Parse(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable error code for diagnostics and exit-code mapping
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "invalid_input",
            AppError::Config(_) => "config_error",
            AppError::Provider(_) => "provider_error",
            AppError::Parse(_) => "parse_error",
            AppError::NotFound(_) => "not_found",
            AppError::Timeout(_) => "timeout",
            AppError::Auth(auth) => match auth {
                AuthError::MissingVerifier => "missing_verifier",
                AuthError::TokenExchangeFailed(_) => "token_exchange_failed",
                AuthError::NotAuthenticated => "not_authenticated",
                AuthError::Unauthorized => "unauthorized",
                AuthError::RequestFailed { .. } => "request_failed",
                AuthError::Network(_) => "network_error",
                AuthError::InvalidVerifierLength(_) => "invalid_verifier",
                AuthError::PendingStateUnavailable(_) => "pending_state_unavailable",
            },
            AppError::Internal(_) => "internal_error",
        }
    }

    /// Get the error message
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout(err.to_string())
        } else if err.is_connect() || err.is_request() {
            AppError::Provider(err.to_string())
        } else {
            AppError::Internal(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Parse(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_codes() {
        let cases: Vec<(AuthError, &str)> = vec![
            (AuthError::MissingVerifier, "missing_verifier"),
            (
                AuthError::TokenExchangeFailed("bad code".to_string()),
                "token_exchange_failed",
            ),
            (AuthError::NotAuthenticated, "not_authenticated"),
            (AuthError::Unauthorized, "unauthorized"),
            (
                AuthError::RequestFailed {
                    status: 500,
                    detail: "server error".to_string(),
                },
                "request_failed",
            ),
        ];

        for (err, code) in cases {
            assert_eq!(AppError::from(err).error_code(), code);
        }
    }

    #[test]
    fn test_request_failed_display() {
        let err = AuthError::RequestFailed {
            status: 404,
            detail: "no such list".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Request failed with status 404: no such list"
        );
    }

    #[test]
    fn test_app_error_message_not_empty() {
        let errors = vec![
            AppError::InvalidInput("x".to_string()),
            AppError::Config("x".to_string()),
            AppError::Provider("x".to_string()),
            AppError::NotFound("x".to_string()),
            AppError::Auth(AuthError::NotAuthenticated),
        ];
        for err in errors {
            assert!(!err.message().is_empty());
        }
    }
}
