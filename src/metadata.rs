//! Metadata provider client (TMDB-compatible)
//!
//! Thin fetch wrappers around the documented search, trending and details
//! endpoints, plus markdown formatting for terminal output.

use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::http;

/// Media kind recognized by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Movie,
    Tv,
    All,
}

impl MediaKind {
    pub fn as_path(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Tv => "tv",
            MediaKind::All => "all",
        }
    }
}

impl std::str::FromStr for MediaKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "movie" | "movies" => Ok(MediaKind::Movie),
            "tv" | "show" | "shows" => Ok(MediaKind::Tv),
            "all" => Ok(MediaKind::All),
            other => Err(AppError::InvalidInput(format!(
                "Unknown media kind '{}', expected movie, tv or all",
                other
            ))),
        }
    }
}

/// One title in a search or trending response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MediaItem {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    /// TV results carry `name` instead of `title`
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
}

impl MediaItem {
    /// Display title regardless of movie/TV field naming
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("(untitled)")
    }

    /// Release year, from whichever date field is present
    pub fn year(&self) -> Option<&str> {
        self.release_date
            .as_deref()
            .or(self.first_air_date.as_deref())
            .and_then(|d| d.get(0..4))
    }
}

/// Paged list response
#[derive(Debug, Deserialize)]
pub struct PagedResults {
    #[serde(default)]
    pub page: u32,
    pub results: Vec<MediaItem>,
    #[serde(default)]
    pub total_results: Option<u64>,
}

/// Full details for one title
#[derive(Debug, Deserialize)]
pub struct TitleDetails {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub number_of_seasons: Option<u32>,
    #[serde(default)]
    pub genres: Vec<Genre>,
}

#[derive(Debug, Deserialize)]
pub struct Genre {
    pub name: String,
}

/// Metadata provider client
pub struct MetadataClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl MetadataClient {
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        if config.metadata_api_key.is_empty() {
            return Err(AppError::Config(
                "No metadata API key configured. Set SCREENSCOUT_METADATA_API_KEY.".to_string(),
            ));
        }
        Ok(Self {
            client: http::default_client(),
            base_url: config.metadata_base_url.clone(),
            api_key: config.metadata_api_key.clone(),
        })
    }

    /// Search movies and TV shows
    pub async fn search(&self, query: &str) -> Result<PagedResults, AppError> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput("Query cannot be empty".to_string()));
        }

        let url = format!("{}/search/multi", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("query", query)])
            .send()
            .await?;

        Self::read_json(response).await
    }

    /// Trending titles for a time window ("day" or "week")
    pub async fn trending(&self, kind: MediaKind, window: &str) -> Result<PagedResults, AppError> {
        if !matches!(window, "day" | "week") {
            return Err(AppError::InvalidInput(
                "Trending window must be 'day' or 'week'".to_string(),
            ));
        }

        let url = format!("{}/trending/{}/{}", self.base_url, kind.as_path(), window);
        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;

        Self::read_json(response).await
    }

    /// Full details for one title
    pub async fn details(&self, kind: MediaKind, id: u64) -> Result<TitleDetails, AppError> {
        if kind == MediaKind::All {
            return Err(AppError::InvalidInput(
                "Details require a specific kind: movie or tv".to_string(),
            ));
        }

        let url = format!("{}/{}/{}", self.base_url, kind.as_path(), id);
        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;

        if response.status().as_u16() == 404 {
            return Err(AppError::NotFound(format!(
                "No {} with id {}",
                kind.as_path(),
                id
            )));
        }

        Self::read_json(response).await
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Provider(format!(
                "metadata API error {}: {}",
                status, text
            )));
        }
        response
            .json()
            .await
            .map_err(|e| AppError::Parse(e.to_string()))
    }
}

/// Format a result list as markdown for the terminal
pub fn format_results(heading: &str, results: &[MediaItem]) -> String {
    let mut out = format!("# {}\n\n", heading);

    if results.is_empty() {
        out.push_str("No results.\n");
        return out;
    }

    for item in results {
        let year = item.year().map(|y| format!(" ({})", y)).unwrap_or_default();
        let kind = item
            .media_type
            .as_deref()
            .map(|k| format!(" [{}]", k))
            .unwrap_or_default();
        let rating = item
            .vote_average
            .filter(|v| *v > 0.0)
            .map(|v| format!(" - ★ {:.1}", v))
            .unwrap_or_default();

        out.push_str(&format!(
            "- **{}**{}{}{} (id {})\n",
            item.display_title(),
            year,
            kind,
            rating,
            item.id
        ));
    }

    out
}

/// Format title details as markdown
pub fn format_details(details: &TitleDetails) -> String {
    let title = details
        .title
        .as_deref()
        .or(details.name.as_deref())
        .unwrap_or("(untitled)");

    let mut out = format!("# {}\n\n", title);

    if let Some(tagline) = details.tagline.as_deref().filter(|t| !t.is_empty()) {
        out.push_str(&format!("_{}_\n\n", tagline));
    }
    if let Some(overview) = details.overview.as_deref().filter(|o| !o.is_empty()) {
        out.push_str(&format!("{}\n\n", overview));
    }
    if let Some(rating) = details.vote_average.filter(|v| *v > 0.0) {
        out.push_str(&format!("- Rating: ★ {:.1}\n", rating));
    }
    if let Some(date) = details
        .release_date
        .as_deref()
        .or(details.first_air_date.as_deref())
    {
        out.push_str(&format!("- Released: {}\n", date));
    }
    if let Some(runtime) = details.runtime {
        out.push_str(&format!("- Runtime: {} min\n", runtime));
    }
    if let Some(seasons) = details.number_of_seasons {
        out.push_str(&format!("- Seasons: {}\n", seasons));
    }
    if !details.genres.is_empty() {
        let genres: Vec<&str> = details.genres.iter().map(|g| g.name.as_str()).collect();
        out.push_str(&format!("- Genres: {}\n", genres.join(", ")));
    }

    out
}
