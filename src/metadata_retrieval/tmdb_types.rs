/// TMDB API response types for deserialization.
///
/// These structures mirror the JSON response format of the TMDB v3 API.
use serde::Deserialize;

/// A page of results from the `/search/movie` or `/search/tv` endpoints.
#[derive(Debug, Deserialize)]
pub(super) struct TmdbSearchPage {
    #[serde(default)]
    pub results: Vec<TmdbSearchResult>,
}

/// A single search hit. Films carry `title`/`release_date`, series carry
/// `name`/`first_air_date`.
#[derive(Debug, Deserialize)]
pub(super) struct TmdbSearchResult {
    pub id: u64,
    pub title: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub vote_average: f32,
    #[serde(default)]
    pub popularity: f32,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
}

/// Response of the `/tv/{id}` endpoint, reduced to the season list.
#[derive(Debug, Deserialize)]
pub(super) struct TmdbTvDetails {
    pub id: u64,
    #[serde(default)]
    pub seasons: Vec<TmdbSeasonSummary>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TmdbSeasonSummary {
    pub season_number: u32,
    #[serde(default)]
    pub episode_count: u32,
    #[serde(default)]
    pub name: String,
}

/// Response of the `/tv/{id}/season/{n}` endpoint.
#[derive(Debug, Deserialize)]
pub(super) struct TmdbSeasonDetails {
    #[serde(default)]
    pub episodes: Vec<TmdbEpisode>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TmdbEpisode {
    pub episode_number: u32,
    /// Episode title (may be null for unannounced episodes)
    pub name: Option<String>,
    pub overview: Option<String>,
    pub air_date: Option<String>,
    #[serde(default)]
    pub vote_average: f32,
    #[serde(default)]
    pub crew: Vec<TmdbCrewMember>,
    #[serde(default)]
    pub guest_stars: Vec<TmdbGuestStar>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TmdbCrewMember {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub job: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct TmdbGuestStar {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub character: String,
}
