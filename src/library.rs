//! Local library: offline watchlist and favorites
//!
//! A keyed JSON blob in the state directory, independent of the remote sync
//! provider. Corrupted or missing contents read back as an empty library.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::warn;

use crate::error::AppError;

const LIBRARY_FILE: &str = "library.json";

/// A title saved locally
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavedTitle {
    pub id: u64,
    pub kind: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
}

/// Library contents
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct LibraryData {
    #[serde(default)]
    pub watchlist: Vec<SavedTitle>,
    #[serde(default)]
    pub favorites: Vec<SavedTitle>,
}

/// Which local list to operate on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shelf {
    Watchlist,
    Favorites,
}

impl std::str::FromStr for Shelf {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "watchlist" => Ok(Shelf::Watchlist),
            "favorites" | "favourites" => Ok(Shelf::Favorites),
            other => Err(AppError::InvalidInput(format!(
                "Unknown shelf '{}', expected watchlist or favorites",
                other
            ))),
        }
    }
}

/// File-backed local library store
pub struct Library {
    path: PathBuf,
}

impl Library {
    /// Open the library in the application state directory
    pub fn open() -> Result<Self, AppError> {
        let dir = crate::config::state_dir().map_err(|e| AppError::Config(e.to_string()))?;
        Ok(Self {
            path: dir.join(LIBRARY_FILE),
        })
    }

    /// Open a library at an explicit path (tests)
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the library; corruption reads as empty
    pub fn read(&self) -> LibraryData {
        let Ok(contents) = fs::read_to_string(&self.path) else {
            return LibraryData::default();
        };
        match serde_json::from_str(&contents) {
            Ok(data) => data,
            Err(e) => {
                warn!("Library file is corrupted, starting empty: {}", e);
                LibraryData::default()
            }
        }
    }

    fn write(&self, data: &LibraryData) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }

    /// Add a title to a shelf; duplicates (same id and kind) are ignored
    pub fn add(&self, shelf: Shelf, title: SavedTitle) -> Result<bool, AppError> {
        let mut data = self.read();
        let list = match shelf {
            Shelf::Watchlist => &mut data.watchlist,
            Shelf::Favorites => &mut data.favorites,
        };

        if list.iter().any(|t| t.id == title.id && t.kind == title.kind) {
            return Ok(false);
        }

        list.push(title);
        self.write(&data)?;
        Ok(true)
    }

    /// Remove a title from a shelf by id and kind
    pub fn remove(&self, shelf: Shelf, kind: &str, id: u64) -> Result<bool, AppError> {
        let mut data = self.read();
        let list = match shelf {
            Shelf::Watchlist => &mut data.watchlist,
            Shelf::Favorites => &mut data.favorites,
        };

        let before = list.len();
        list.retain(|t| !(t.id == id && t.kind == kind));
        let removed = list.len() != before;

        if removed {
            self.write(&data)?;
        }
        Ok(removed)
    }

    /// List a shelf's contents
    pub fn list(&self, shelf: Shelf) -> Vec<SavedTitle> {
        let data = self.read();
        match shelf {
            Shelf::Watchlist => data.watchlist,
            Shelf::Favorites => data.favorites,
        }
    }
}

/// Format a shelf as markdown
pub fn format_shelf(name: &str, titles: &[SavedTitle]) -> String {
    let mut out = format!("# Local {}\n\n", name);

    if titles.is_empty() {
        out.push_str("Nothing saved yet.\n");
        return out;
    }

    for title in titles {
        let year = title
            .year
            .as_deref()
            .map(|y| format!(" ({})", y))
            .unwrap_or_default();
        out.push_str(&format!(
            "- **{}**{} [{}] (id {})\n",
            title.title, year, title.kind, title.id
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn library() -> (TempDir, Library) {
        let dir = TempDir::new().unwrap();
        let lib = Library::at(dir.path().join("library.json"));
        (dir, lib)
    }

    fn title(id: u64) -> SavedTitle {
        SavedTitle {
            id,
            kind: "movie".to_string(),
            title: format!("Title {}", id),
            year: Some("2020".to_string()),
        }
    }

    #[test]
    fn test_add_and_list() {
        let (_dir, lib) = library();
        assert!(lib.add(Shelf::Watchlist, title(1)).unwrap());
        assert!(lib.add(Shelf::Watchlist, title(2)).unwrap());

        let list = lib.list(Shelf::Watchlist);
        assert_eq!(list.len(), 2);
        assert!(lib.list(Shelf::Favorites).is_empty());
    }

    #[test]
    fn test_duplicate_add_ignored() {
        let (_dir, lib) = library();
        assert!(lib.add(Shelf::Favorites, title(1)).unwrap());
        assert!(!lib.add(Shelf::Favorites, title(1)).unwrap());
        assert_eq!(lib.list(Shelf::Favorites).len(), 1);
    }

    #[test]
    fn test_same_id_different_kind_allowed() {
        let (_dir, lib) = library();
        lib.add(Shelf::Watchlist, title(1)).unwrap();
        let mut show = title(1);
        show.kind = "tv".to_string();
        assert!(lib.add(Shelf::Watchlist, show).unwrap());
        assert_eq!(lib.list(Shelf::Watchlist).len(), 2);
    }

    #[test]
    fn test_remove() {
        let (_dir, lib) = library();
        lib.add(Shelf::Watchlist, title(1)).unwrap();

        assert!(lib.remove(Shelf::Watchlist, "movie", 1).unwrap());
        assert!(!lib.remove(Shelf::Watchlist, "movie", 1).unwrap());
        assert!(lib.list(Shelf::Watchlist).is_empty());
    }

    #[test]
    fn test_corrupted_file_reads_empty() {
        let (dir, lib) = library();
        fs::write(dir.path().join("library.json"), "][ nope").unwrap();

        assert!(lib.list(Shelf::Watchlist).is_empty());
        // And the library recovers on the next write
        assert!(lib.add(Shelf::Watchlist, title(5)).unwrap());
        assert_eq!(lib.list(Shelf::Watchlist).len(), 1);
    }

    #[test]
    fn test_shelf_parsing() {
        assert_eq!("watchlist".parse::<Shelf>().unwrap(), Shelf::Watchlist);
        assert_eq!("favourites".parse::<Shelf>().unwrap(), Shelf::Favorites);
        assert!("queue".parse::<Shelf>().is_err());
    }
}
