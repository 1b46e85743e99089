//! Watch-history provider client (Trakt-compatible)
//!
//! All calls here are protected and go through the authenticated request
//! gateway, which owns token attachment and the automatic-logout contract.

use serde::Deserialize;
use serde_json::json;

use crate::auth::ApiGateway;
use crate::error::{AppError, AuthError};
use crate::metadata::MediaKind;

/// Ids block attached to each listed title
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TitleIds {
    #[serde(default)]
    pub trakt: Option<u64>,
    #[serde(default)]
    pub tmdb: Option<u64>,
    #[serde(default)]
    pub imdb: Option<String>,
}

/// A movie or show object inside a list entry
#[derive(Debug, Clone, Deserialize)]
pub struct ListedTitle {
    pub title: String,
    #[serde(default)]
    pub year: Option<u32>,
    #[serde(default)]
    pub ids: TitleIds,
}

/// One entry of the remote watchlist
#[derive(Debug, Clone, Deserialize)]
pub struct WatchlistEntry {
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default)]
    pub listed_at: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub movie: Option<ListedTitle>,
    #[serde(default)]
    pub show: Option<ListedTitle>,
}

impl WatchlistEntry {
    pub fn title(&self) -> Option<&ListedTitle> {
        self.movie.as_ref().or(self.show.as_ref())
    }
}

/// One history entry (a play/scrobble)
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub watched_at: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub movie: Option<ListedTitle>,
    #[serde(default)]
    pub show: Option<ListedTitle>,
}

impl HistoryEntry {
    pub fn title(&self) -> Option<&ListedTitle> {
        self.movie.as_ref().or(self.show.as_ref())
    }
}

/// Client for the user's remote watchlist and history
pub struct SyncClient<'a> {
    gateway: &'a ApiGateway,
}

impl<'a> SyncClient<'a> {
    pub fn new(gateway: &'a ApiGateway) -> Self {
        Self { gateway }
    }

    /// Fetch the remote watchlist
    pub async fn watchlist(&self) -> Result<Vec<WatchlistEntry>, AppError> {
        let resp = self.gateway.get("/sync/watchlist").await?;
        parse_list(resp.body)
    }

    /// Add a title to the remote watchlist by its metadata-provider id
    pub async fn add_to_watchlist(&self, kind: MediaKind, tmdb_id: u64) -> Result<(), AppError> {
        let body = match kind {
            MediaKind::Movie => json!({ "movies": [{ "ids": { "tmdb": tmdb_id } }] }),
            MediaKind::Tv => json!({ "shows": [{ "ids": { "tmdb": tmdb_id } }] }),
            MediaKind::All => {
                return Err(AppError::InvalidInput(
                    "Watchlist add requires a specific kind: movie or tv".to_string(),
                ))
            }
        };

        self.gateway.post("/sync/watchlist", body).await?;
        Ok(())
    }

    /// Remove a title from the remote watchlist
    pub async fn remove_from_watchlist(
        &self,
        kind: MediaKind,
        tmdb_id: u64,
    ) -> Result<(), AppError> {
        let body = match kind {
            MediaKind::Movie => json!({ "movies": [{ "ids": { "tmdb": tmdb_id } }] }),
            MediaKind::Tv => json!({ "shows": [{ "ids": { "tmdb": tmdb_id } }] }),
            MediaKind::All => {
                return Err(AppError::InvalidInput(
                    "Watchlist remove requires a specific kind: movie or tv".to_string(),
                ))
            }
        };

        self.gateway.post("/sync/watchlist/remove", body).await?;
        Ok(())
    }

    /// Fetch recently watched titles
    pub async fn history(&self, limit: u32) -> Result<Vec<HistoryEntry>, AppError> {
        let resp = self
            .gateway
            .get(&format!("/sync/history?limit={}", limit))
            .await?;
        parse_list(resp.body)
    }

    /// Fetch the user's aggregate stats as raw JSON
    pub async fn stats(&self) -> Result<serde_json::Value, AppError> {
        let resp = self.gateway.get("/users/me/stats").await?;
        resp.body
            .ok_or_else(|| AppError::Parse("stats response was empty".to_string()))
    }
}

fn parse_list<T: serde::de::DeserializeOwned>(
    body: Option<serde_json::Value>,
) -> Result<Vec<T>, AppError> {
    match body {
        // A 204 or empty body is a valid empty list
        None => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value).map_err(AppError::from),
    }
}

/// Format watchlist entries as markdown
pub fn format_watchlist(entries: &[WatchlistEntry]) -> String {
    let mut out = String::from("# Watchlist\n\n");

    if entries.is_empty() {
        out.push_str("Your watchlist is empty.\n");
        return out;
    }

    for entry in entries {
        if let Some(title) = entry.title() {
            let year = title.year.map(|y| format!(" ({})", y)).unwrap_or_default();
            out.push_str(&format!("- **{}**{} [{}]\n", title.title, year, entry.kind));
        }
    }
    out
}

/// Format history entries as markdown
pub fn format_history(entries: &[HistoryEntry]) -> String {
    let mut out = String::from("# Recently watched\n\n");

    if entries.is_empty() {
        out.push_str("No watch history.\n");
        return out;
    }

    for entry in entries {
        if let Some(title) = entry.title() {
            let year = title.year.map(|y| format!(" ({})", y)).unwrap_or_default();
            let when = entry
                .watched_at
                .as_deref()
                .map(|w| format!(" - {}", w))
                .unwrap_or_default();
            out.push_str(&format!("- **{}**{}{}\n", title.title, year, when));
        }
    }
    out
}

/// Surface the auto-logout case with a friendlier message
pub fn describe_sync_error(err: &AppError) -> String {
    match err {
        AppError::Auth(AuthError::Unauthorized) => {
            "Your session was rejected by the provider and has been ended. \
             Run 'screenscout connect' to sign in again."
                .to_string()
        }
        AppError::Auth(AuthError::NotAuthenticated) => {
            "Not connected. Run 'screenscout connect' first.".to_string()
        }
        other => other.to_string(),
    }
}
