//! Local HTTP server for the OAuth redirect
//!
//! A loopback listener on a localhost port receives the authorization code
//! when the provider redirects the user's browser back after consent.

use axum::{extract::Query, response::Html, routing::get, Router};
use serde::Deserialize;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use tokio::sync::oneshot;

/// Query parameters the provider may send to the redirect URI
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Outcome of waiting for the redirect
#[derive(Debug)]
pub enum CallbackResult {
    Success {
        code: String,
        state: String,
    },
    Denied {
        error: String,
        description: Option<String>,
    },
}

/// Loopback server receiving the authorization redirect
pub struct CallbackServer {
    addr: SocketAddr,
}

impl CallbackServer {
    /// Reserve a random localhost port for the redirect
    pub fn new() -> Result<Self, std::io::Error> {
        Self::bind_port(0)
    }

    /// Bind a specific localhost port, for providers with a fixed registered
    /// redirect URI
    pub fn on_port(port: u16) -> Result<Self, std::io::Error> {
        Self::bind_port(port)
    }

    fn bind_port(port: u16) -> Result<Self, std::io::Error> {
        let listener = TcpListener::bind(("127.0.0.1", port))?;
        let addr = listener.local_addr()?;
        // Release the port so the async listener can bind it
        drop(listener);
        Ok(Self { addr })
    }

    /// The redirect URI to register with the authorization request
    pub fn redirect_uri(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Serve until one redirect arrives or the timeout elapses
    pub async fn wait_for_callback(
        self,
        timeout: std::time::Duration,
    ) -> Result<CallbackResult, String> {
        let (tx, rx) = oneshot::channel();
        let tx = Arc::new(tokio::sync::Mutex::new(Some(tx)));

        let handler_tx = tx.clone();
        let handler = move |Query(params): Query<CallbackParams>| async move {
            let result = if let Some(error) = params.error {
                CallbackResult::Denied {
                    error,
                    description: params.error_description,
                }
            } else if let (Some(code), Some(state)) = (params.code, params.state) {
                CallbackResult::Success { code, state }
            } else {
                CallbackResult::Denied {
                    error: "invalid_request".to_string(),
                    description: Some("Missing code or state parameter".to_string()),
                }
            };

            if let Some(tx) = handler_tx.lock().await.take() {
                let _ = tx.send(result);
            }

            Html(DONE_PAGE)
        };

        // The registered redirect URI may carry any path on the loopback
        // host; accept the redirect wherever it lands.
        let app = Router::new().fallback(get(handler));

        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| format!("Failed to bind callback server: {}", e))?;

        tracing::debug!("Callback server listening on {}", self.addr);

        let server_handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .map_err(|e| format!("Callback server error: {}", e))
        });

        let result = tokio::select! {
            callback = rx => {
                callback.map_err(|_| "Callback channel closed".to_string())
            }
            _ = tokio::time::sleep(timeout) => {
                Err("Timed out waiting for the authorization redirect".to_string())
            }
        };

        server_handle.abort();
        let _ = tokio::time::timeout(std::time::Duration::from_secs(2), server_handle).await;

        result
    }
}

const DONE_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>screenscout</title>
    <style>
        body { font-family: sans-serif; display: flex; justify-content: center;
               align-items: center; min-height: 100vh; margin: 0; background: #14181c; }
        .card { background: #1f262d; color: #e3e6e8; padding: 2.5rem 3rem;
                border-radius: 0.75rem; text-align: center; }
        h1 { margin: 0 0 0.5rem; font-size: 1.5rem; }
        p { color: #9ab; margin: 0; }
    </style>
</head>
<body>
    <div class="card">
        <h1>Connected</h1>
        <p>You can close this window and return to the terminal.</p>
    </div>
</body>
</html>"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_redirect_uri_is_loopback() {
        let server = CallbackServer::new().unwrap();
        let uri = server.redirect_uri();
        assert!(uri.starts_with("http://127.0.0.1:"));
    }

    #[tokio::test]
    async fn test_receives_code_and_state() {
        let server = CallbackServer::new().unwrap();
        let uri = server.redirect_uri();

        let wait = tokio::spawn(server.wait_for_callback(Duration::from_secs(5)));

        // Give the server a moment to bind before hitting it
        tokio::time::sleep(Duration::from_millis(100)).await;
        let client = reqwest::Client::new();
        client
            .get(format!("{}/?code=abc123&state=st-1", uri))
            .send()
            .await
            .unwrap();

        match wait.await.unwrap().unwrap() {
            CallbackResult::Success { code, state } => {
                assert_eq!(code, "abc123");
                assert_eq!(state, "st-1");
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_receives_redirect_on_any_path() {
        let server = CallbackServer::new().unwrap();
        let uri = server.redirect_uri();

        let wait = tokio::spawn(server.wait_for_callback(Duration::from_secs(5)));

        // Providers registered with a path'd redirect URI send the code there
        tokio::time::sleep(Duration::from_millis(100)).await;
        let client = reqwest::Client::new();
        client
            .get(format!("{}/cb?code=xyz789&state=st-2", uri))
            .send()
            .await
            .unwrap();

        match wait.await.unwrap().unwrap() {
            CallbackResult::Success { code, state } => {
                assert_eq!(code, "xyz789");
                assert_eq!(state, "st-2");
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_denied_redirect() {
        let server = CallbackServer::new().unwrap();
        let uri = server.redirect_uri();

        let wait = tokio::spawn(server.wait_for_callback(Duration::from_secs(5)));

        tokio::time::sleep(Duration::from_millis(100)).await;
        let client = reqwest::Client::new();
        client
            .get(format!("{}/?error=access_denied", uri))
            .send()
            .await
            .unwrap();

        match wait.await.unwrap().unwrap() {
            CallbackResult::Denied { error, .. } => assert_eq!(error, "access_denied"),
            other => panic!("expected denied, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = CallbackServer::new().unwrap();
        let result = server.wait_for_callback(Duration::from_millis(50)).await;
        assert!(result.is_err());
    }
}
