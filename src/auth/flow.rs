//! Authorization flow orchestration
//!
//! `AuthFlow` carries the core protocol steps: `begin_authorization` builds
//! the redirect URL after persisting the PKCE verifier, and
//! `complete_authorization` performs the single-use code exchange. The
//! `run_connect` entry point wires those steps to the loopback callback
//! server and the user's browser for the interactive CLI flow.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::{AppError, AuthError};

use super::callback_server::{CallbackResult, CallbackServer};
use super::oauth::OAuthClient;
use super::pkce::PkcePair;
use super::session::SessionState;
use super::transient::{PendingAuth, TransientStore};

/// How long to wait for the user to authorize in the browser
const CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);

/// Values returned by `begin_authorization` that the caller needs in-process
#[derive(Debug)]
pub struct BeginState {
    pub auth_url: String,
    pub state: String,
}

/// The PKCE authorization flow against one provider
pub struct AuthFlow {
    oauth: OAuthClient,
    transient: TransientStore,
    session: Arc<SessionState>,
}

impl AuthFlow {
    /// Create a flow using the application state directory for pending auth
    pub fn new(
        config: &AppConfig,
        redirect_uri: String,
        session: Arc<SessionState>,
    ) -> Result<Self, AuthError> {
        Ok(Self {
            oauth: OAuthClient::new(config, redirect_uri),
            transient: TransientStore::new()?,
            session,
        })
    }

    /// Create a flow from explicit parts (tests)
    pub fn with_parts(
        oauth: OAuthClient,
        transient: TransientStore,
        session: Arc<SessionState>,
    ) -> Self {
        Self {
            oauth,
            transient,
            session,
        }
    }

    /// Start an authorization attempt
    ///
    /// Generates a verifier, persists it as the pending attempt, and only then
    /// produces the authorization URL. If the verifier cannot be persisted the
    /// attempt aborts here - redirecting without a retrievable verifier would
    /// guarantee a failed exchange later.
    pub fn begin_authorization(&self) -> Result<BeginState, AuthError> {
        let pkce = PkcePair::generate();
        let state = random_state();

        self.transient.put(&PendingAuth {
            verifier: pkce.verifier,
            state: state.clone(),
        })?;

        let auth_url = self.oauth.authorization_url(&pkce.challenge, &state);
        debug!("Authorization attempt pending, URL built");

        Ok(BeginState { auth_url, state })
    }

    /// Complete an authorization attempt with the provider's one-time code
    ///
    /// The pending verifier is consumed up front, before the exchange, so a
    /// replayed callback always fails with `MissingVerifier` regardless of how
    /// the first attempt ended. Nothing is persisted unless the exchange
    /// succeeds with a usable access token.
    pub async fn complete_authorization(&self, code: &str) -> Result<(), AuthError> {
        let pending = self.transient.take().ok_or(AuthError::MissingVerifier)?;

        let tokens = self.oauth.exchange_code(code, &pending.verifier).await?;

        self.session.storage().save(&tokens);
        self.session.establish();
        info!("Authorization complete, credential stored");
        Ok(())
    }

    /// Discard any pending attempt without exchanging
    pub fn abandon(&self) {
        if self.transient.take().is_some() {
            debug!("Discarded pending authorization attempt");
        }
    }
}

fn random_state() -> String {
    let bytes: [u8; 16] = rand::thread_rng().gen();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Interactive connect flow: browser redirect plus loopback callback
pub async fn run_connect(config: &AppConfig, session: Arc<SessionState>) -> Result<String, AppError> {
    if config.client_id.is_empty() {
        return Err(AppError::Config(
            "No client_id configured. Set SCREENSCOUT_CLIENT_ID or edit the config file."
                .to_string(),
        ));
    }

    let server = match &config.redirect_uri {
        Some(uri) => CallbackServer::on_port(loopback_port(uri)?)
            .map_err(|e| AppError::Config(format!("Failed to bind callback server: {}", e)))?,
        None => CallbackServer::new()
            .map_err(|e| AppError::Config(format!("Failed to start callback server: {}", e)))?,
    };

    let redirect_uri = config
        .redirect_uri
        .clone()
        .unwrap_or_else(|| server.redirect_uri());

    let flow = AuthFlow::new(config, redirect_uri.clone(), session)?;
    let begin = flow.begin_authorization()?;

    info!("Callback server listening at {}", redirect_uri);

    if webbrowser::open(&begin.auth_url).is_ok() {
        info!("Browser opened for authorization");
    } else {
        eprintln!("Please visit this URL in your browser:\n{}\n", begin.auth_url);
    }

    let callback = server.wait_for_callback(CALLBACK_TIMEOUT).await;

    let callback = match callback {
        Ok(result) => result,
        Err(e) => {
            flow.abandon();
            return Err(AppError::Auth(AuthError::TokenExchangeFailed(e)));
        }
    };

    match callback {
        CallbackResult::Success { code, state } => {
            if state != begin.state {
                flow.abandon();
                return Err(AppError::Auth(AuthError::TokenExchangeFailed(
                    "state parameter mismatch".to_string(),
                )));
            }

            info!("Authorization granted, exchanging code for tokens");
            flow.complete_authorization(&code).await?;

            Ok("✓ Connected to the watch-history provider".to_string())
        }
        CallbackResult::Denied { error, description } => {
            flow.abandon();
            warn!(
                "Authorization denied: {} - {}",
                error,
                description.as_deref().unwrap_or("no description")
            );
            Err(AppError::Auth(AuthError::TokenExchangeFailed(format!(
                "authorization denied: {}",
                error
            ))))
        }
    }
}

/// Extract the port from a configured loopback redirect URI
fn loopback_port(redirect_uri: &str) -> Result<u16, AppError> {
    let url = url::Url::parse(redirect_uri)
        .map_err(|e| AppError::Config(format!("Invalid redirect_uri: {}", e)))?;
    url.port_or_known_default()
        .ok_or_else(|| AppError::Config("redirect_uri has no port".to_string()))
}
