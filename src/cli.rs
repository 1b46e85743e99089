//! CLI argument definitions

use clap::{Parser, Subcommand};

/// screenscout CLI
#[derive(Parser)]
#[command(name = "screenscout")]
#[command(about = "Movie and TV discovery with AI recommendations and watch-history sync", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search movies and TV shows
    Search(SearchArgs),
    /// Show trending titles
    Trending(TrendingArgs),
    /// Show details for one title
    Details(DetailsArgs),
    /// Get AI recommendations for a mood or taste
    Recommend(RecommendArgs),
    /// Connect to the watch-history provider (OAuth)
    Connect,
    /// Disconnect and clear stored credentials
    Disconnect,
    /// Show connection status
    Status,
    /// Remote watchlist (requires connect)
    Watchlist(WatchlistArgs),
    /// Recently watched titles (requires connect)
    History(HistoryArgs),
    /// Local watchlist and favorites
    Library(LibraryArgs),
    /// Watch stats from the provider (requires connect)
    Stats,
    /// Write provider credentials to the config file
    Setup(SetupArgs),
}

/// Setup arguments
#[derive(Parser, Debug)]
pub struct SetupArgs {
    /// OAuth client id for the watch-history provider
    #[arg(long, env = "SCREENSCOUT_CLIENT_ID")]
    pub client_id: Option<String>,

    /// Metadata provider API key
    #[arg(long, env = "SCREENSCOUT_METADATA_API_KEY")]
    pub metadata_api_key: Option<String>,

    /// AI provider API key
    #[arg(long, env = "SCREENSCOUT_AI_API_KEY")]
    pub ai_api_key: Option<String>,

    /// Fixed loopback redirect URI registered with the provider
    #[arg(long)]
    pub redirect_uri: Option<String>,
}

/// Search arguments
#[derive(Parser, Debug)]
pub struct SearchArgs {
    /// Search terms
    pub query: String,
}

/// Trending arguments
#[derive(Parser, Debug)]
pub struct TrendingArgs {
    /// Media kind: movie, tv or all
    #[arg(short, long, default_value = "all")]
    pub kind: String,

    /// Time window: day or week
    #[arg(short, long, default_value = "week")]
    pub window: String,
}

/// Details arguments
#[derive(Parser, Debug)]
pub struct DetailsArgs {
    /// Media kind: movie or tv
    #[arg(short, long)]
    pub kind: String,

    /// Title id from the metadata provider
    pub id: u64,
}

/// Recommend arguments
#[derive(Parser, Debug)]
pub struct RecommendArgs {
    /// Describe what you are in the mood for
    pub taste: String,

    /// Number of recommendations
    #[arg(short, long, default_value_t = 5)]
    pub count: usize,
}

/// Remote watchlist arguments
#[derive(Parser, Debug)]
pub struct WatchlistArgs {
    #[command(subcommand)]
    pub command: Option<WatchlistCommands>,
}

#[derive(Subcommand, Debug)]
pub enum WatchlistCommands {
    /// Add a title by metadata-provider id
    Add {
        /// Media kind: movie or tv
        #[arg(short, long)]
        kind: String,
        /// Title id
        id: u64,
    },
    /// Remove a title by metadata-provider id
    Remove {
        /// Media kind: movie or tv
        #[arg(short, long)]
        kind: String,
        /// Title id
        id: u64,
    },
}

/// History arguments
#[derive(Parser, Debug)]
pub struct HistoryArgs {
    /// Maximum number of entries
    #[arg(short, long, default_value_t = 20)]
    pub limit: u32,
}

/// Local library arguments
#[derive(Parser, Debug)]
pub struct LibraryArgs {
    #[command(subcommand)]
    pub command: LibraryCommands,
}

#[derive(Subcommand, Debug)]
pub enum LibraryCommands {
    /// List a shelf: watchlist or favorites
    List {
        /// Shelf name
        #[arg(default_value = "watchlist")]
        shelf: String,
    },
    /// Save a title to a shelf
    Add {
        /// Shelf name: watchlist or favorites
        #[arg(short, long, default_value = "watchlist")]
        shelf: String,
        /// Media kind: movie or tv
        #[arg(short, long)]
        kind: String,
        /// Title id from the metadata provider
        id: u64,
        /// Title text to display
        #[arg(short, long)]
        title: String,
        /// Release year
        #[arg(short, long)]
        year: Option<String>,
    },
    /// Remove a title from a shelf
    Remove {
        /// Shelf name: watchlist or favorites
        #[arg(short, long, default_value = "watchlist")]
        shelf: String,
        /// Media kind: movie or tv
        #[arg(short, long)]
        kind: String,
        /// Title id
        id: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_assertions() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_search() {
        let cli = Cli::try_parse_from(["screenscout", "search", "blade runner"]).unwrap();
        match cli.command {
            Commands::Search(args) => assert_eq!(args.query, "blade runner"),
            _ => panic!("expected search"),
        }
    }

    #[test]
    fn test_parse_trending_defaults() {
        let cli = Cli::try_parse_from(["screenscout", "trending"]).unwrap();
        match cli.command {
            Commands::Trending(args) => {
                assert_eq!(args.kind, "all");
                assert_eq!(args.window, "week");
            }
            _ => panic!("expected trending"),
        }
    }

    #[test]
    fn test_parse_watchlist_add() {
        let cli =
            Cli::try_parse_from(["screenscout", "watchlist", "add", "--kind", "movie", "603"])
                .unwrap();
        match cli.command {
            Commands::Watchlist(args) => match args.command {
                Some(WatchlistCommands::Add { kind, id }) => {
                    assert_eq!(kind, "movie");
                    assert_eq!(id, 603);
                }
                _ => panic!("expected add"),
            },
            _ => panic!("expected watchlist"),
        }
    }
}
