//! screenscout CLI
//!
//! Browse and search movies/TV shows from a metadata provider, get AI
//! recommendations, and sync watchlist/history with an OAuth-PKCE protected
//! watch-history provider.

mod auth;
mod cli;
mod config;
mod error;
mod http;
mod library;
mod metadata;
mod recommend;
mod sync;

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::time::{timeout, Duration};

use auth::{ApiGateway, CredentialStorage, SessionState, StorageBackend};
use cli::{Cli, Commands, LibraryCommands, WatchlistCommands};
use config::AppConfig;
use error::{AppError, AuthError};
use library::{Library, SavedTitle, Shelf};
use metadata::{MediaKind, MetadataClient};
use recommend::RecommendClient;
use sync::SyncClient;

/// Outer timeout for commands that talk to providers
const COMMAND_TIMEOUT: Duration = Duration::from_secs(120);

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr) // keep stdout clean for command output
        .init();

    match run_command(cli.command).await {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", friendly_message(&e));
            std::process::exit(exit_code(&e));
        }
    }
}

async fn run_command(command: Commands) -> Result<String, AppError> {
    let config = AppConfig::load().map_err(|e| AppError::Config(e.to_string()))?;

    match command {
        Commands::Search(args) => {
            with_timeout(async {
                let client = MetadataClient::new(&config)?;
                let results = client.search(&args.query).await?;
                Ok(metadata::format_results(
                    &format!("Search: {}", args.query),
                    &results.results,
                ))
            })
            .await
        }
        Commands::Trending(args) => {
            with_timeout(async {
                let kind: MediaKind = args.kind.parse()?;
                let client = MetadataClient::new(&config)?;
                let results = client.trending(kind, &args.window).await?;
                Ok(metadata::format_results(
                    &format!("Trending this {}", args.window),
                    &results.results,
                ))
            })
            .await
        }
        Commands::Details(args) => {
            with_timeout(async {
                let kind: MediaKind = args.kind.parse()?;
                let client = MetadataClient::new(&config)?;
                let details = client.details(kind, args.id).await?;
                Ok(metadata::format_details(&details))
            })
            .await
        }
        Commands::Recommend(args) => {
            with_timeout(async {
                let client = RecommendClient::new(&config)?;
                let text = client.recommend(&args.taste, args.count).await?;
                Ok(format!("# Recommendations\n\n{}", text))
            })
            .await
        }
        Commands::Connect => {
            // The connect flow has its own 5 minute callback timeout
            let session = make_session();
            auth::run_connect(&config, session).await
        }
        Commands::Disconnect => {
            let session = make_session();
            if !session.is_authenticated() {
                return Ok("Not connected.".to_string());
            }
            session.terminate();
            Ok("✓ Disconnected and cleared stored credentials".to_string())
        }
        Commands::Status => {
            let session = make_session();
            Ok(format_status(&session))
        }
        Commands::Watchlist(args) => {
            with_timeout(async {
                let session = make_session();
                let gateway = make_gateway(&config, session);
                let client = SyncClient::new(&gateway);

                match args.command {
                    None => {
                        let entries = client.watchlist().await?;
                        Ok(sync::format_watchlist(&entries))
                    }
                    Some(WatchlistCommands::Add { kind, id }) => {
                        let kind: MediaKind = kind.parse()?;
                        client.add_to_watchlist(kind, id).await?;
                        Ok(format!("✓ Added {} {} to the remote watchlist", kind.as_path(), id))
                    }
                    Some(WatchlistCommands::Remove { kind, id }) => {
                        let kind: MediaKind = kind.parse()?;
                        client.remove_from_watchlist(kind, id).await?;
                        Ok(format!(
                            "✓ Removed {} {} from the remote watchlist",
                            kind.as_path(),
                            id
                        ))
                    }
                }
            })
            .await
        }
        Commands::History(args) => {
            with_timeout(async {
                let session = make_session();
                let gateway = make_gateway(&config, session);
                let client = SyncClient::new(&gateway);
                let entries = client.history(args.limit).await?;
                Ok(sync::format_history(&entries))
            })
            .await
        }
        Commands::Library(args) => run_library_command(args.command),
        Commands::Stats => {
            with_timeout(async {
                let session = make_session();
                let gateway = make_gateway(&config, session);
                let client = SyncClient::new(&gateway);
                let stats = client.stats().await?;
                Ok(format!(
                    "# Watch stats\n\n{}",
                    serde_json::to_string_pretty(&stats)?
                ))
            })
            .await
        }
        Commands::Setup(args) => run_setup(config, args),
    }
}

fn run_setup(mut config: AppConfig, args: cli::SetupArgs) -> Result<String, AppError> {
    if let Some(client_id) = args.client_id {
        config.client_id = client_id;
    }
    if let Some(key) = args.metadata_api_key {
        config.metadata_api_key = key;
    }
    if let Some(key) = args.ai_api_key {
        config.ai_api_key = key;
    }
    if args.redirect_uri.is_some() {
        config.redirect_uri = args.redirect_uri;
    }

    config
        .save()
        .map_err(|e| AppError::Config(e.to_string()))?;
    let path = config::config_path().map_err(|e| AppError::Config(e.to_string()))?;
    Ok(format!("✓ Wrote configuration to {}", path.display()))
}

fn run_library_command(command: LibraryCommands) -> Result<String, AppError> {
    let library = Library::open()?;

    match command {
        LibraryCommands::List { shelf } => {
            let shelf_kind: Shelf = shelf.parse()?;
            let titles = library.list(shelf_kind);
            Ok(library::format_shelf(&shelf, &titles))
        }
        LibraryCommands::Add {
            shelf,
            kind,
            id,
            title,
            year,
        } => {
            let shelf_kind: Shelf = shelf.parse()?;
            // Validates the kind string even though only its text is stored
            let _: MediaKind = kind.parse()?;
            let added = library.add(
                shelf_kind,
                SavedTitle {
                    id,
                    kind: kind.clone(),
                    title: title.clone(),
                    year,
                },
            )?;
            if added {
                Ok(format!("✓ Saved '{}' to local {}", title, shelf))
            } else {
                Ok(format!("'{}' is already in local {}", title, shelf))
            }
        }
        LibraryCommands::Remove { shelf, kind, id } => {
            let shelf_kind: Shelf = shelf.parse()?;
            let removed = library.remove(shelf_kind, &kind, id)?;
            if removed {
                Ok(format!("✓ Removed {} {} from local {}", kind, id, shelf))
            } else {
                Ok(format!("{} {} was not in local {}", kind, id, shelf))
            }
        }
    }
}

fn make_session() -> Arc<SessionState> {
    Arc::new(SessionState::new(Arc::new(CredentialStorage::new())))
}

fn make_gateway(config: &AppConfig, session: Arc<SessionState>) -> ApiGateway {
    ApiGateway::new(
        config.api_base_url.clone(),
        config.client_id.clone(),
        session,
    )
}

fn format_status(session: &SessionState) -> String {
    let mut out = String::from("# Connection status\n\n");

    match session.storage().load() {
        Some(tokens) => {
            out.push_str("Connected to the watch-history provider.\n\n");
            if let Some(scope) = tokens.scope.as_deref() {
                out.push_str(&format!("- Scope: {}\n", scope));
            }
            if let Some(created) = tokens.created_at {
                out.push_str(&format!("- Connected since: {}\n", created.to_rfc3339()));
            }
            if let Some(expires) = tokens.expires_at() {
                out.push_str(&format!("- Token expires: {}\n", expires.to_rfc3339()));
            }
            if tokens.refresh_token.is_some() {
                out.push_str("- Refresh token: stored\n");
            }
            out.push_str(&format!(
                "- Storage: {}\n",
                match session.storage().backend() {
                    StorageBackend::Keyring => "OS keyring".to_string(),
                    StorageBackend::File(path) => format!("file ({})", path.display()),
                }
            ));
        }
        None => {
            out.push_str("Not connected. Run 'screenscout connect' to sign in.\n");
        }
    }

    out
}

/// Soften auto-logout and not-connected messages without changing the
/// error's class, so auth failures keep their exit code
fn friendly_message(err: &AppError) -> String {
    match err {
        AppError::Auth(AuthError::Unauthorized | AuthError::NotAuthenticated) => {
            sync::describe_sync_error(err)
        }
        other => other.message(),
    }
}

async fn with_timeout<F>(fut: F) -> Result<String, AppError>
where
    F: std::future::Future<Output = Result<String, AppError>>,
{
    match timeout(COMMAND_TIMEOUT, fut).await {
        Ok(result) => result,
        Err(_) => Err(AppError::Timeout(
            "Request exceeded 120 second timeout".to_string(),
        )),
    }
}

/// Map AppError to exit code
fn exit_code(err: &AppError) -> i32 {
    match err.error_code() {
        "invalid_input" => 1,
        "provider_error" | "network_error" => 2,
        "not_found" => 3,
        "timeout" => 4,
        "not_authenticated" | "unauthorized" | "missing_verifier" | "token_exchange_failed" => 5,
        _ => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&AppError::InvalidInput("x".to_string())), 1);
        assert_eq!(exit_code(&AppError::Provider("x".to_string())), 2);
        assert_eq!(exit_code(&AppError::NotFound("x".to_string())), 3);
        assert_eq!(exit_code(&AppError::Timeout("x".to_string())), 4);
        assert_eq!(exit_code(&AppError::Auth(AuthError::NotAuthenticated)), 5);
        assert_eq!(exit_code(&AppError::Internal("x".to_string())), 6);
    }

    #[test]
    fn test_friendly_message_keeps_auth_class() {
        // Softened wording must not demote auth failures out of exit code 5
        let not_connected = AppError::Auth(AuthError::NotAuthenticated);
        assert_eq!(exit_code(&not_connected), 5);
        assert!(friendly_message(&not_connected).contains("connect"));

        let rejected = AppError::Auth(AuthError::Unauthorized);
        assert_eq!(exit_code(&rejected), 5);
        assert!(friendly_message(&rejected).contains("connect"));

        // Non-auth errors pass through untouched
        let provider = AppError::Provider("boom".to_string());
        assert_eq!(friendly_message(&provider), provider.message());
    }

    #[test]
    fn test_status_not_connected() {
        let dir = tempfile::TempDir::new().unwrap();
        let storage = Arc::new(CredentialStorage::with_file(dir.path().join("t.json")));
        let session = SessionState::new(storage);
        let out = format_status(&session);
        assert!(out.contains("Not connected"));
    }

    #[test]
    fn test_status_connected() {
        use crate::auth::TokenSet;

        let dir = tempfile::TempDir::new().unwrap();
        let storage = Arc::new(CredentialStorage::with_file(dir.path().join("t.json")));
        storage.save(&TokenSet {
            access_token: "tok".to_string(),
            refresh_token: Some("ref".to_string()),
            expires_in: Some(3600),
            token_type: Some("bearer".to_string()),
            scope: Some("public".to_string()),
            created_at: Some(chrono::Utc::now()),
        });
        let session = SessionState::new(storage);

        let out = format_status(&session);
        assert!(out.contains("Connected to the watch-history provider"));
        assert!(out.contains("Scope: public"));
        assert!(out.contains("Refresh token: stored"));
    }
}
