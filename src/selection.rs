//! Selection state machine
//!
//! Tracks which catalog item is open and, for series, which season and episode
//! are selected. Transitions are validated before anything is mutated, so a
//! rejected request always leaves the state as it was. Transitions that need
//! data from the network hand back an [`Effect`] instead of fetching anything
//! themselves.

use crate::metadata_retrieval::{CatalogItem, MediaId, MediaKind, SeasonSummary, SeriesOutline};
use crate::sync::SeasonKey;
use thiserror::Error;

/// Season number conventionally used for specials; never selectable.
pub const SPECIALS_SEASON: u32 = 0;

/// Season picked when an outline arrives, if the series has it.
pub const DEFAULT_SEASON: u32 = 1;

/// Reasons a selection request is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// The season is not part of the loaded outline (or is season 0)
    #[error("Season {season} is not available for this series")]
    UnknownSeason { season: u32 },

    /// The episode is outside `1..=max` for the selected season
    #[error("Episode {episode} is out of range (1-{max})")]
    EpisodeOutOfRange { episode: u32, max: u32 },

    /// Season and episode selection only apply once a series outline is loaded
    #[error("No series season is currently selectable")]
    NoSeriesSelected,

    /// An outline arrived while no series was waiting for one
    #[error("Unexpected outline for series {series_id}")]
    UnexpectedOutline { series_id: MediaId },
}

/// A fetch the caller has to perform after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Load the season outline of a series
    FetchOutline { series_id: MediaId },
    /// Load the episode list of one season
    FetchSeason(SeasonKey),
}

/// Where the user is in the item → season → episode hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SelectionState {
    /// Nothing is open
    #[default]
    NoSelection,

    /// A film is open; it is playable without further choices
    FilmChosen { film_id: MediaId },

    /// A series is open and its outline is being fetched
    SeriesChosen { series_id: MediaId },

    /// The outline arrived but offers no selectable season
    OutlineLoaded {
        series_id: MediaId,
        seasons: Vec<SeasonSummary>,
    },

    /// A season and episode of the series are selected
    SeasonSelected {
        series_id: MediaId,
        seasons: Vec<SeasonSummary>,
        season: u32,
        episode: u32,
    },
}

impl SelectionState {
    /// Opens a catalog item, replacing whatever was selected before.
    ///
    /// Films become playable immediately. Series wait for their outline,
    /// which the returned effect asks for.
    pub fn choose_item(&mut self, item: &CatalogItem) -> Option<Effect> {
        match item.kind {
            MediaKind::Film => {
                *self = SelectionState::FilmChosen { film_id: item.id };
                None
            }
            MediaKind::Series => {
                *self = SelectionState::SeriesChosen { series_id: item.id };
                Some(Effect::FetchOutline { series_id: item.id })
            }
        }
    }

    /// Applies a freshly fetched outline.
    ///
    /// Only valid while the matching series is waiting for it. Season 0 is
    /// dropped; the default season (or else the first remaining one) is
    /// selected at episode 1 and its episode list requested.
    pub fn on_outline_loaded(
        &mut self,
        outline: SeriesOutline,
    ) -> Result<Option<Effect>, SelectionError> {
        let series_id = match self {
            SelectionState::SeriesChosen { series_id } if *series_id == outline.series_id => {
                *series_id
            }
            _ => {
                return Err(SelectionError::UnexpectedOutline {
                    series_id: outline.series_id,
                });
            }
        };

        let seasons: Vec<SeasonSummary> = outline
            .seasons
            .into_iter()
            .filter(|s| s.season_number != SPECIALS_SEASON)
            .collect();

        let initial = seasons
            .iter()
            .find(|s| s.season_number == DEFAULT_SEASON)
            .or_else(|| seasons.first())
            .map(|s| s.season_number);

        match initial {
            Some(season) => {
                *self = SelectionState::SeasonSelected {
                    series_id,
                    seasons,
                    season,
                    episode: 1,
                };
                Ok(Some(Effect::FetchSeason(SeasonKey { series_id, season })))
            }
            None => {
                *self = SelectionState::OutlineLoaded { series_id, seasons };
                Ok(None)
            }
        }
    }

    /// Switches to another season of the loaded outline.
    ///
    /// The episode always resets to 1. A fetch is requested only when the
    /// season actually changes.
    pub fn select_season(&mut self, season: u32) -> Result<Option<Effect>, SelectionError> {
        let (series_id, seasons, current_season, episode) = match self {
            SelectionState::SeasonSelected {
                series_id,
                seasons,
                season: current_season,
                episode,
            } => (series_id, seasons, current_season, episode),
            SelectionState::OutlineLoaded { .. } => {
                return Err(SelectionError::UnknownSeason { season });
            }
            _ => return Err(SelectionError::NoSeriesSelected),
        };

        if season == SPECIALS_SEASON || !seasons.iter().any(|s| s.season_number == season) {
            return Err(SelectionError::UnknownSeason { season });
        }

        let changed = *current_season != season;
        *current_season = season;
        *episode = 1;

        Ok(changed.then_some(Effect::FetchSeason(SeasonKey {
            series_id: *series_id,
            season,
        })))
    }

    /// Selects an episode of the current season. Never triggers a fetch.
    pub fn select_episode(&mut self, episode: u32) -> Result<(), SelectionError> {
        let max = self
            .episode_count()
            .ok_or(SelectionError::NoSeriesSelected)?;

        if episode < 1 || episode > max {
            return Err(SelectionError::EpisodeOutOfRange { episode, max });
        }

        if let SelectionState::SeasonSelected { episode: current, .. } = self {
            *current = episode;
        }
        Ok(())
    }

    /// Leaves the details view.
    pub fn navigate_away(&mut self) {
        *self = SelectionState::NoSelection;
    }

    pub fn series_id(&self) -> Option<MediaId> {
        match self {
            SelectionState::SeriesChosen { series_id }
            | SelectionState::OutlineLoaded { series_id, .. }
            | SelectionState::SeasonSelected { series_id, .. } => Some(*series_id),
            _ => None,
        }
    }

    /// Seasons the user may choose from (season 0 excluded).
    pub fn seasons(&self) -> &[SeasonSummary] {
        match self {
            SelectionState::OutlineLoaded { seasons, .. }
            | SelectionState::SeasonSelected { seasons, .. } => seasons,
            _ => &[],
        }
    }

    pub fn selected_season(&self) -> Option<u32> {
        match self {
            SelectionState::SeasonSelected { season, .. } => Some(*season),
            _ => None,
        }
    }

    pub fn selected_episode(&self) -> Option<u32> {
        match self {
            SelectionState::SeasonSelected { episode, .. } => Some(*episode),
            _ => None,
        }
    }

    /// Number of selectable episodes in the selected season.
    pub fn episode_count(&self) -> Option<u32> {
        match self {
            SelectionState::SeasonSelected {
                seasons, season, ..
            } => seasons
                .iter()
                .find(|s| s.season_number == *season)
                .map(SeasonSummary::selectable_episodes),
            _ => None,
        }
    }

    /// The (series, season) pair whose episode list is authoritative.
    pub fn season_key(&self) -> Option<SeasonKey> {
        match self {
            SelectionState::SeasonSelected {
                series_id, season, ..
            } => Some(SeasonKey {
                series_id: *series_id,
                season: *season,
            }),
            _ => None,
        }
    }
}
