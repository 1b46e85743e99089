//! OAuth 2.0 PKCE authentication subsystem
//!
//! The stored credential record is the single source of truth for auth state:
//! it exists iff the user is connected. The flow module drives the
//! authorization redirect and code exchange, the gateway attaches the token
//! to protected calls and enforces automatic logout on 401.

pub mod callback_server;
pub mod flow;
pub mod gateway;
pub mod oauth;
pub mod pkce;
pub mod session;
pub mod storage;
pub mod transient;

pub use flow::run_connect;
pub use gateway::ApiGateway;
pub use session::SessionState;
pub use storage::{CredentialStorage, StorageBackend, TokenSet};
