/// TMDB metadata provider implementation.
use super::tmdb_types::{
    TmdbEpisode, TmdbSearchPage, TmdbSearchResult, TmdbSeasonDetails, TmdbTvDetails,
};
use super::{
    CatalogItem, CrewCredit, EpisodeRecord, GuestCredit, MediaId, MediaKind, MetadataError,
    MetadataProvider, SeasonSummary, SeriesOutline,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Default endpoint of the TMDB v3 API.
pub const DEFAULT_TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";

/// Metadata provider for the TMDB API.
///
/// The API key is injected by the caller; this provider never owns a
/// credential of its own.
pub struct TmdbProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TmdbProvider {
    /// Creates a new TMDB provider talking to the public API.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_TMDB_BASE_URL)
    }

    /// Creates a provider against a custom API endpoint.
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Performs a GET request against `path` and decodes the JSON body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, MetadataError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "requesting TMDB resource");

        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .send()
            .await
            .map_err(|e| MetadataError::RequestError(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(MetadataError::NotFound(path.to_string()));
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(MetadataError::HttpStatus { status, body });
        }

        response
            .json()
            .await
            .map_err(|e| MetadataError::ParseError(e.to_string()))
    }

    /// Converts a TMDB search hit into a catalog item of the given kind.
    fn convert_search_result(result: TmdbSearchResult, kind: MediaKind) -> CatalogItem {
        let (title, release_date) = match kind {
            MediaKind::Film => (result.title.or(result.name), result.release_date),
            MediaKind::Series => (result.name.or(result.title), result.first_air_date),
        };

        CatalogItem {
            id: result.id,
            kind,
            title,
            overview: result.overview.unwrap_or_default(),
            release_date: non_empty(release_date),
            rating: result.vote_average,
            popularity: result.popularity,
            poster_path: non_empty(result.poster_path),
            backdrop_path: non_empty(result.backdrop_path),
        }
    }

    /// Merges film and series hits into one list, most popular first.
    fn merge_ranked(films: TmdbSearchPage, series: TmdbSearchPage) -> Vec<CatalogItem> {
        let mut items: Vec<CatalogItem> = films
            .results
            .into_iter()
            .map(|r| Self::convert_search_result(r, MediaKind::Film))
            .chain(
                series
                    .results
                    .into_iter()
                    .map(|r| Self::convert_search_result(r, MediaKind::Series)),
            )
            .collect();

        // Stable sort keeps films ahead of series on equal popularity
        items.sort_by(|a, b| b.popularity.total_cmp(&a.popularity));
        items
    }

    fn convert_outline(details: TmdbTvDetails) -> SeriesOutline {
        SeriesOutline {
            series_id: details.id,
            seasons: details
                .seasons
                .into_iter()
                .map(|s| SeasonSummary {
                    season_number: s.season_number,
                    episode_count: s.episode_count,
                    name: s.name,
                })
                .collect(),
        }
    }

    fn convert_episode(episode: TmdbEpisode) -> EpisodeRecord {
        EpisodeRecord {
            episode_number: episode.episode_number,
            name: episode.name.unwrap_or_else(|| "Unknown".to_string()),
            overview: episode.overview.unwrap_or_default(),
            air_date: non_empty(episode.air_date),
            rating: episode.vote_average,
            crew: episode
                .crew
                .into_iter()
                .map(|c| CrewCredit {
                    person_id: c.id,
                    name: c.name,
                    role: c.job,
                })
                .collect(),
            guest_stars: episode
                .guest_stars
                .into_iter()
                .map(|g| GuestCredit {
                    person_id: g.id,
                    name: g.name,
                    character: g.character,
                })
                .collect(),
        }
    }
}

/// TMDB reports missing dates and images as empty strings.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[async_trait]
impl MetadataProvider for TmdbProvider {
    async fn search_catalog(&self, query: &str) -> Result<Vec<CatalogItem>, MetadataError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let params = [("query", query)];
        let (films, series) = tokio::try_join!(
            self.get_json::<TmdbSearchPage>("/search/movie", &params),
            self.get_json::<TmdbSearchPage>("/search/tv", &params),
        )?;

        Ok(Self::merge_ranked(films, series))
    }

    async fn fetch_series_outline(
        &self,
        series_id: MediaId,
    ) -> Result<SeriesOutline, MetadataError> {
        let details: TmdbTvDetails = self.get_json(&format!("/tv/{series_id}"), &[]).await?;
        Ok(Self::convert_outline(details))
    }

    async fn fetch_season_episodes(
        &self,
        series_id: MediaId,
        season: u32,
    ) -> Result<Vec<EpisodeRecord>, MetadataError> {
        let details: TmdbSeasonDetails = self
            .get_json(&format!("/tv/{series_id}/season/{season}"), &[])
            .await?;

        let mut episodes: Vec<EpisodeRecord> = details
            .episodes
            .into_iter()
            .map(Self::convert_episode)
            .collect();
        episodes.sort_by_key(|e| e.episode_number);

        Ok(episodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(json: &str) -> TmdbSearchPage {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_merge_ranked_orders_by_popularity_and_tags_kind() {
        let films = page(
            r#"{"results": [
                {"id": 1, "title": "Dune", "release_date": "2021-09-15", "vote_average": 7.8, "popularity": 50.0, "poster_path": "/dune.jpg", "backdrop_path": ""},
                {"id": 2, "title": "Dune", "release_date": "", "vote_average": 6.3, "popularity": 5.0}
            ]}"#,
        );
        let series = page(
            r#"{"results": [
                {"id": 3, "name": "Dune: Prophecy", "first_air_date": "2024-11-17", "vote_average": 7.1, "popularity": 20.0}
            ]}"#,
        );

        let items = TmdbProvider::merge_ranked(films, series);
        let ids: Vec<_> = items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 3, 2]);

        assert_eq!(items[0].kind, MediaKind::Film);
        assert_eq!(items[0].release_year(), Some(2021));
        assert_eq!(items[0].backdrop_path, None);
        assert_eq!(items[1].kind, MediaKind::Series);
        assert_eq!(items[1].display_title(), "Dune: Prophecy");
        assert_eq!(items[1].release_date.as_deref(), Some("2024-11-17"));
        assert_eq!(items[2].release_date, None);
    }

    #[test]
    fn test_convert_outline_keeps_specials() {
        let details: TmdbTvDetails = serde_json::from_str(
            r#"{"id": 1399, "name": "Game of Thrones", "seasons": [
                {"season_number": 0, "episode_count": 14, "name": "Specials"},
                {"season_number": 1, "episode_count": 10, "name": "Season 1"}
            ]}"#,
        )
        .unwrap();

        let outline = TmdbProvider::convert_outline(details);
        assert_eq!(outline.series_id, 1399);
        assert_eq!(outline.seasons.len(), 2);
        assert_eq!(outline.seasons[1].episode_count, 10);
    }

    #[test]
    fn test_convert_episode_with_credits() {
        let details: TmdbSeasonDetails = serde_json::from_str(
            r#"{"episodes": [{
                "episode_number": 9,
                "name": "Baelor",
                "overview": "Robb takes a prisoner.",
                "air_date": "2011-06-12",
                "vote_average": 8.9,
                "crew": [{"id": 7, "name": "Alan Taylor", "job": "Director"}],
                "guest_stars": [{"id": 8, "name": "Ian McElhinney", "character": "Barristan Selmy"}]
            }, {
                "episode_number": 10,
                "name": null,
                "overview": null,
                "air_date": null
            }]}"#,
        )
        .unwrap();

        let mut episodes = details.episodes.into_iter().map(TmdbProvider::convert_episode);
        let baelor = episodes.next().unwrap();
        assert_eq!(baelor.name, "Baelor");
        assert_eq!(baelor.crew[0].role, "Director");
        assert_eq!(baelor.guest_stars[0].character, "Barristan Selmy");

        let unnamed = episodes.next().unwrap();
        assert_eq!(unnamed.name, "Unknown");
        assert_eq!(unnamed.overview, "");
        assert!(unnamed.crew.is_empty());
    }

    #[tokio::test]
    async fn test_blank_query_skips_network() {
        // Unroutable base URL: any request would fail
        let provider = TmdbProvider::with_base_url("key", "http://127.0.0.1:9");
        let results = provider.search_catalog("   ").await.unwrap();
        assert!(results.is_empty());
    }
}
