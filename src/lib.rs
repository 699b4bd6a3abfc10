//! LunaStream - search a media catalog and resolve what to play
//!
//! This library provides the core of a media browser: searching a catalog of
//! films and series, keeping season and episode selection consistent with
//! asynchronously fetched series metadata, and resolving the selection into a
//! playback target for an embedded player.

pub mod config;
mod metadata_retrieval;
pub mod playback;
pub mod selection;
pub mod session;
pub mod sync;

pub use config::{Config, ConfigError};
pub use metadata_retrieval::{
    CatalogItem, CrewCredit, DEFAULT_TMDB_BASE_URL, EpisodeRecord, GuestCredit, MediaId,
    MediaKind, MetadataError, MetadataProvider, PLACEHOLDER_IMAGE, SeasonSummary, SeriesOutline,
    TmdbProvider,
};
pub use playback::{EmbedPlayer, PlaybackTarget, VidSrcPlayer, resolve_target};
pub use selection::{SelectionError, SelectionState};
pub use session::{DetailsSession, FetchScope, SessionEvent};
pub use sync::SeasonKey;

use std::sync::Arc;
use thiserror::Error;

/// Top-level error type for LunaStream operations
#[derive(Debug, Error)]
pub enum LunaStreamError {
    /// Error during configuration loading
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error during metadata retrieval
    #[error("Metadata retrieval error: {0}")]
    MetadataRetrieval(#[from] MetadataError),

    /// A season or episode outside the known outline was requested
    #[error("Invalid selection: {0}")]
    InvalidSelection(#[from] SelectionError),

    /// The item has nothing playable, e.g. a series without regular seasons
    #[error("Nothing playable for {0}")]
    NothingPlayable(String),
}

/// Everything needed to start playback of one film or episode
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackPlan {
    /// The item that was opened
    pub item: CatalogItem,

    /// The resolved film or episode
    pub target: PlaybackTarget,

    /// Embed URL built by the player
    pub url: String,

    /// Episode details, when they could be fetched
    pub episode: Option<EpisodeRecord>,
}

/// Opens an item, applies a season/episode choice and resolves playback
///
/// This drives a [`DetailsSession`] the way a details view would: the item is
/// opened, the outline and default season are fetched, then the requested
/// season and episode are selected and their episode list fetched. Progress
/// events are emitted through the provided callback.
///
/// For films `season` and `episode` are ignored. For series they default to
/// the session's initial selection when `None`.
///
/// # Examples
///
/// ```no_run
/// use luna_stream::{prepare_playback, CatalogItem, TmdbProvider, VidSrcPlayer};
/// use std::sync::Arc;
///
/// # async fn run(item: CatalogItem) -> Result<(), luna_stream::LunaStreamError> {
/// let provider = Arc::new(TmdbProvider::new("api-key"));
/// let plan = prepare_playback(
///     provider,
///     &VidSrcPlayer::default(),
///     item,
///     Some(2),
///     Some(5),
///     |event| println!("{event:?}"),
/// )
/// .await?;
/// println!("{}", plan.url);
/// # Ok(())
/// # }
/// ```
pub async fn prepare_playback<F>(
    provider: Arc<dyn MetadataProvider>,
    player: &dyn EmbedPlayer,
    item: CatalogItem,
    season: Option<u32>,
    episode: Option<u32>,
    mut progress_callback: F,
) -> Result<PlaybackPlan, LunaStreamError>
where
    F: FnMut(SessionEvent),
{
    let mut session = DetailsSession::open(provider, item.clone());
    for event in session.drain().await {
        progress_callback(event);
    }

    if item.kind == MediaKind::Series {
        if let Some(season) = season {
            session.select_season(season)?;
        }
        if let Some(episode) = episode {
            session.select_episode(episode)?;
        }
        for event in session.drain().await {
            progress_callback(event);
        }
    }

    let target = session
        .playback_target()
        .ok_or_else(|| LunaStreamError::NothingPlayable(item.display_title().to_string()))?;

    Ok(PlaybackPlan {
        url: player.playback_url(&target),
        episode: session.current_episode().cloned(),
        item,
        target,
    })
}
