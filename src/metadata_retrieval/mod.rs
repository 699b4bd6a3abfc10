/// Data structures and traits for catalog and series metadata retrieval.
///
/// This module provides structures to represent catalog items, series outlines
/// and per-season episode records, as well as the trait a metadata provider
/// implements to serve them.
mod tmdb;
mod tmdb_types;

pub use tmdb::{DEFAULT_TMDB_BASE_URL, TmdbProvider};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a film or series in the catalog.
pub type MediaId = u64;

/// Shown in place of artwork when an item carries no image reference.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";

/// Errors that can occur during metadata retrieval operations.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// Request to the metadata provider failed
    #[error("Request failed: {0}")]
    RequestError(String),

    /// The provider answered with a non-success status
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Failed to parse the provider's JSON response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// The requested item was not found
    #[error("Not found: {0}")]
    NotFound(String),
}

/// The two kinds of items the catalog contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Film,
    Series,
}

impl MediaKind {
    /// Human readable label used by presentation layers.
    pub fn label(self) -> &'static str {
        match self {
            MediaKind::Film => "Movie",
            MediaKind::Series => "TV Show",
        }
    }
}

/// A searchable film or series record with display metadata.
///
/// Items are immutable once fetched and are owned by the search result list
/// they came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: MediaId,
    pub kind: MediaKind,
    /// Title for films, name for series. `None` when the catalog has neither.
    pub title: Option<String>,
    pub overview: String,
    /// Release date for films, first air date for series (`YYYY-MM-DD`).
    pub release_date: Option<String>,
    /// Average vote on a 0-10 scale
    pub rating: f32,
    /// Ranking signal used to order combined search results
    pub popularity: f32,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
}

impl CatalogItem {
    /// An item known only by id and kind, e.g. when opened directly by id.
    pub fn from_id(id: MediaId, kind: MediaKind) -> Self {
        Self {
            id,
            kind,
            title: None,
            overview: String::new(),
            release_date: None,
            rating: 0.0,
            popularity: 0.0,
            poster_path: None,
            backdrop_path: None,
        }
    }

    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or("Unknown Title")
    }

    /// Year part of the release date, if it has one.
    pub fn release_year(&self) -> Option<i32> {
        self.release_date
            .as_deref()
            .and_then(|date| date.split('-').next())
            .and_then(|year| year.parse().ok())
    }

    /// Full poster URL below `image_base_url`, or the placeholder.
    pub fn poster_url(&self, image_base_url: &str) -> String {
        image_url(image_base_url, self.poster_path.as_deref())
    }

    /// Full backdrop URL below `image_base_url`, or the placeholder.
    pub fn backdrop_url(&self, image_base_url: &str) -> String {
        image_url(image_base_url, self.backdrop_path.as_deref())
    }
}

fn image_url(image_base_url: &str, path: Option<&str>) -> String {
    match path {
        Some(path) if !path.is_empty() => {
            format!("{}{}", image_base_url.trim_end_matches('/'), path)
        }
        _ => PLACEHOLDER_IMAGE.to_string(),
    }
}

/// Season level summary of a series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonSummary {
    /// Season number; season 0 holds specials
    pub season_number: u32,
    pub episode_count: u32,
    pub name: String,
}

impl SeasonSummary {
    /// Number of episodes a user may pick from.
    ///
    /// A season that advertises no episodes still offers episode 1.
    pub fn selectable_episodes(&self) -> u32 {
        self.episode_count.max(1)
    }
}

/// The season structure of a series, independent of per-episode detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesOutline {
    pub series_id: MediaId,
    pub seasons: Vec<SeasonSummary>,
}

impl SeriesOutline {
    /// An outline without any seasons, committed when the outline fetch fails.
    pub fn empty(series_id: MediaId) -> Self {
        Self {
            series_id,
            seasons: Vec::new(),
        }
    }
}

/// A crew member credited on an episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrewCredit {
    pub person_id: u64,
    pub name: String,
    /// The job performed, e.g. "Director"
    pub role: String,
}

/// A guest star appearing in an episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestCredit {
    pub person_id: u64,
    pub name: String,
    /// The character played
    pub character: String,
}

/// Represents a single episode of one season of a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub episode_number: u32,
    pub name: String,
    pub overview: String,
    pub air_date: Option<String>,
    pub rating: f32,
    pub crew: Vec<CrewCredit>,
    pub guest_stars: Vec<GuestCredit>,
}

/// Trait for metadata providers serving catalog search and series metadata.
///
/// Implementors are shared between the caller and spawned fetch tasks, hence
/// the `Send + Sync` bound.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Searches films and series for `query`, ranked by popularity.
    ///
    /// An empty or whitespace-only query yields an empty list without
    /// touching the network.
    async fn search_catalog(&self, query: &str) -> Result<Vec<CatalogItem>, MetadataError>;

    /// Fetches the season outline of a series.
    async fn fetch_series_outline(
        &self,
        series_id: MediaId,
    ) -> Result<SeriesOutline, MetadataError>;

    /// Fetches every episode record of one season of a series.
    async fn fetch_season_episodes(
        &self,
        series_id: MediaId,
        season: u32,
    ) -> Result<Vec<EpisodeRecord>, MetadataError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: Option<&str>, date: Option<&str>) -> CatalogItem {
        CatalogItem {
            id: 1,
            kind: MediaKind::Film,
            title: title.map(str::to_string),
            overview: String::new(),
            release_date: date.map(str::to_string),
            rating: 7.5,
            popularity: 1.0,
            poster_path: Some("/poster.jpg".to_string()),
            backdrop_path: None,
        }
    }

    #[test]
    fn test_display_title_fallback() {
        assert_eq!(item(Some("Heat"), None).display_title(), "Heat");
        assert_eq!(item(None, None).display_title(), "Unknown Title");
        assert_eq!(item(Some("  "), None).display_title(), "Unknown Title");
    }

    #[test]
    fn test_release_year() {
        assert_eq!(item(None, Some("1995-12-15")).release_year(), Some(1995));
        assert_eq!(item(None, Some("")).release_year(), None);
        assert_eq!(item(None, None).release_year(), None);
    }

    #[test]
    fn test_image_urls() {
        let film = item(Some("Heat"), None);
        assert_eq!(
            film.poster_url("https://image.tmdb.org/t/p/w1280/"),
            "https://image.tmdb.org/t/p/w1280/poster.jpg"
        );
        assert_eq!(
            film.backdrop_url("https://image.tmdb.org/t/p/w1280"),
            PLACEHOLDER_IMAGE
        );
    }

    #[test]
    fn test_selectable_episodes_never_zero() {
        let season = SeasonSummary {
            season_number: 3,
            episode_count: 0,
            name: "Season 3".to_string(),
        };
        assert_eq!(season.selectable_episodes(), 1);
    }
}
