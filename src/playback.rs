//! Playback target resolution and embed URL construction

use crate::metadata_retrieval::MediaId;
use crate::selection::SelectionState;
use serde::{Deserialize, Serialize};

/// Default base of the embed player.
pub const DEFAULT_EMBED_BASE_URL: &str = "https://vidsrc.to/embed";

/// The minimal data needed to request playback of a film or an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PlaybackTarget {
    Film {
        id: MediaId,
    },
    Series {
        id: MediaId,
        season: u32,
        episode: u32,
    },
}

impl PlaybackTarget {
    /// Short "now playing" label.
    pub fn label(&self) -> String {
        match self {
            PlaybackTarget::Film { .. } => "Movie".to_string(),
            PlaybackTarget::Series {
                season, episode, ..
            } => format!("S{season} E{episode}"),
        }
    }
}

/// Derives the playback target from the current selection.
///
/// Series are only playable once a season is selected. This is a pure
/// function; call it again after every selection change rather than keeping
/// its result around.
pub fn resolve_target(selection: &SelectionState) -> Option<PlaybackTarget> {
    match selection {
        SelectionState::FilmChosen { film_id } => Some(PlaybackTarget::Film { id: *film_id }),
        SelectionState::SeasonSelected {
            series_id,
            season,
            episode,
            ..
        } => Some(PlaybackTarget::Series {
            id: *series_id,
            season: *season,
            episode: *episode,
        }),
        _ => None,
    }
}

/// Trait for players that turn a playback target into an embeddable URL.
///
/// The returned URL is opaque to the rest of the crate.
pub trait EmbedPlayer {
    fn playback_url(&self, target: &PlaybackTarget) -> String;
}

/// Player backed by the VidSrc embed endpoints.
#[derive(Debug, Clone)]
pub struct VidSrcPlayer {
    base_url: String,
}

impl VidSrcPlayer {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl Default for VidSrcPlayer {
    fn default() -> Self {
        Self::new(DEFAULT_EMBED_BASE_URL)
    }
}

impl EmbedPlayer for VidSrcPlayer {
    fn playback_url(&self, target: &PlaybackTarget) -> String {
        match target {
            PlaybackTarget::Film { id } => format!("{}/movie/{}", self.base_url, id),
            PlaybackTarget::Series {
                id,
                season,
                episode,
            } => format!("{}/tv/{}/{}/{}", self.base_url, id, season, episode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata_retrieval::SeasonSummary;

    #[test]
    fn test_film_target_has_no_episode() {
        let target = resolve_target(&SelectionState::FilmChosen { film_id: 603 });
        assert_eq!(target, Some(PlaybackTarget::Film { id: 603 }));
        assert_eq!(target.map(|t| t.label()).as_deref(), Some("Movie"));
    }

    #[test]
    fn test_series_target_follows_selection() {
        let selection = SelectionState::SeasonSelected {
            series_id: 1399,
            seasons: vec![SeasonSummary {
                season_number: 2,
                episode_count: 10,
                name: "Season 2".to_string(),
            }],
            season: 2,
            episode: 5,
        };

        let target = resolve_target(&selection).unwrap();
        assert_eq!(
            target,
            PlaybackTarget::Series {
                id: 1399,
                season: 2,
                episode: 5
            }
        );
        assert_eq!(target.label(), "S2 E5");
    }

    #[test]
    fn test_nothing_playable_before_season_selected() {
        assert_eq!(resolve_target(&SelectionState::NoSelection), None);
        assert_eq!(
            resolve_target(&SelectionState::SeriesChosen { series_id: 1 }),
            None
        );
    }

    #[test]
    fn test_vidsrc_urls() {
        let player = VidSrcPlayer::new("https://vidsrc.to/embed/");
        assert_eq!(
            player.playback_url(&PlaybackTarget::Film { id: 603 }),
            "https://vidsrc.to/embed/movie/603"
        );
        assert_eq!(
            player.playback_url(&PlaybackTarget::Series {
                id: 1399,
                season: 3,
                episode: 9
            }),
            "https://vidsrc.to/embed/tv/1399/3/9"
        );
    }

    #[test]
    fn test_target_serializes_with_kind_tag() {
        let json = serde_json::to_value(PlaybackTarget::Film { id: 1 }).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "film", "id": 1}));
    }
}
