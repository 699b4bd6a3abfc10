//! Details view session
//!
//! A [`DetailsSession`] owns everything that lives while a details view is
//! open: the chosen item, the selection state and the synchronized episode
//! list. User actions are applied synchronously through `&mut self`; network
//! results come back as tagged completions on a channel and are applied one
//! at a time through [`DetailsSession::next_event`], so a user action can make
//! a pending fetch irrelevant but never interleaves with its application.

use crate::metadata_retrieval::{
    CatalogItem, EpisodeRecord, MediaId, MetadataError, MetadataProvider, SeriesOutline,
};
use crate::playback::{PlaybackTarget, resolve_target};
use crate::selection::{Effect, SelectionError, SelectionState};
use crate::sync::{EpisodeSynchronizer, FetchCompletion, SeasonKey, SyncOutcome};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

/// What a discarded result had been fetched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchScope {
    Outline(MediaId),
    Season(SeasonKey),
}

/// Progress reported while fetch results are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The outline arrived and the default season (if any) was selected
    OutlineLoaded {
        series_id: MediaId,
        season_count: usize,
    },

    /// The outline fetch failed; the series has no selectable seasons
    OutlineFailed { series_id: MediaId, reason: String },

    /// The episode list of the selected season was committed
    EpisodesCommitted { key: SeasonKey, count: usize },

    /// The season fetch failed; an empty episode list was committed
    EpisodesFailed { key: SeasonKey, reason: String },

    /// A result arrived for something no longer selected and was dropped
    Discarded(FetchScope),
}

/// State owned by one open details view.
pub struct DetailsSession {
    provider: Arc<dyn MetadataProvider>,
    item: Option<CatalogItem>,
    selection: SelectionState,
    episodes: EpisodeSynchronizer,
    sender: UnboundedSender<FetchCompletion>,
    completions: UnboundedReceiver<FetchCompletion>,
    /// Fetches issued on the current channel whose completion is pending
    in_flight: usize,
}

impl DetailsSession {
    /// Creates a session with nothing selected.
    pub fn new(provider: Arc<dyn MetadataProvider>) -> Self {
        let (sender, completions) = mpsc::unbounded_channel();
        let episodes = EpisodeSynchronizer::new(Arc::clone(&provider), sender.clone());

        Self {
            provider,
            item: None,
            selection: SelectionState::NoSelection,
            episodes,
            sender,
            completions,
            in_flight: 0,
        }
    }

    /// Creates a session and opens `item` in it.
    ///
    /// Must be called from within a Tokio runtime when `item` is a series.
    pub fn open(provider: Arc<dyn MetadataProvider>, item: CatalogItem) -> Self {
        let mut session = Self::new(provider);
        session.choose_item(item);
        session
    }

    /// Opens a catalog item, discarding the previously open one.
    pub fn choose_item(&mut self, item: CatalogItem) {
        self.reset_channel();

        info!(id = item.id, kind = ?item.kind, title = item.display_title(), "opening item");
        let effect = self.selection.choose_item(&item);
        self.item = Some(item);

        if let Some(effect) = effect {
            self.run_effect(effect);
        }
    }

    /// Selects a season; the episode resets to 1.
    pub fn select_season(&mut self, season: u32) -> Result<(), SelectionError> {
        if let Some(effect) = self.selection.select_season(season)? {
            self.run_effect(effect);
        }
        Ok(())
    }

    /// Selects an episode of the current season.
    pub fn select_episode(&mut self, episode: u32) -> Result<(), SelectionError> {
        self.selection.select_episode(episode)
    }

    /// Closes the details view. Results of fetches still in flight are
    /// never applied.
    pub fn navigate_back(&mut self) {
        self.reset_channel();
        self.selection.navigate_away();
        self.item = None;
    }

    /// Waits for the next fetch result and applies it.
    ///
    /// Returns `None` immediately when no fetch is in flight.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        if self.in_flight == 0 {
            return None;
        }

        let completion = self.completions.recv().await?;
        self.in_flight -= 1;
        Some(self.apply(completion))
    }

    /// Applies a fetch result if one is ready, without waiting.
    pub fn try_next_event(&mut self) -> Option<SessionEvent> {
        let completion = self.completions.try_recv().ok()?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(self.apply(completion))
    }

    /// Applies fetch results until nothing is in flight.
    ///
    /// Fetches issued while applying (the first season after an outline)
    /// are waited for as well.
    pub async fn drain(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.next_event().await {
            events.push(event);
        }
        events
    }

    pub fn item(&self) -> Option<&CatalogItem> {
        self.item.as_ref()
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Episode list committed for the selected season, if it has landed.
    pub fn episodes(&self) -> Option<&[EpisodeRecord]> {
        self.episodes.episodes()
    }

    pub fn resolve_episode(&self, episode_number: u32) -> Option<&EpisodeRecord> {
        self.episodes.resolve_episode(episode_number)
    }

    /// Record of the selected episode, when its details are available.
    pub fn current_episode(&self) -> Option<&EpisodeRecord> {
        self.resolve_episode(self.selection.selected_episode()?)
    }

    /// Playback target for the current selection, recomputed on every call.
    pub fn playback_target(&self) -> Option<PlaybackTarget> {
        resolve_target(&self.selection)
    }

    /// Number of fetches whose results are still pending.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Drops the completion channel so results of earlier fetches fall on
    /// the floor, and starts over with a fresh synchronizer.
    fn reset_channel(&mut self) {
        let (sender, completions) = mpsc::unbounded_channel();
        self.episodes = EpisodeSynchronizer::new(Arc::clone(&self.provider), sender.clone());
        self.sender = sender;
        self.completions = completions;
        self.in_flight = 0;
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::FetchOutline { series_id } => {
                debug!(series_id, "requesting outline");
                let provider = Arc::clone(&self.provider);
                let sender = self.sender.clone();
                tokio::spawn(async move {
                    let result = provider.fetch_series_outline(series_id).await;
                    let _ = sender.send(FetchCompletion::Outline { series_id, result });
                });
            }
            Effect::FetchSeason(key) => {
                self.episodes.request_season(key);
            }
        }
        self.in_flight += 1;
    }

    fn apply(&mut self, completion: FetchCompletion) -> SessionEvent {
        match completion {
            FetchCompletion::Outline { series_id, result } => {
                self.apply_outline(series_id, result)
            }
            FetchCompletion::Season {
                key,
                generation,
                result,
            } => match self.episodes.accept(key, generation, result) {
                SyncOutcome::Committed { key, count } => {
                    SessionEvent::EpisodesCommitted { key, count }
                }
                SyncOutcome::Failed { key, reason } => SessionEvent::EpisodesFailed { key, reason },
                SyncOutcome::Stale { key } => SessionEvent::Discarded(FetchScope::Season(key)),
            },
        }
    }

    fn apply_outline(
        &mut self,
        series_id: MediaId,
        result: Result<SeriesOutline, MetadataError>,
    ) -> SessionEvent {
        if self.selection != (SelectionState::SeriesChosen { series_id }) {
            debug!(series_id, "dropping stale outline");
            return SessionEvent::Discarded(FetchScope::Outline(series_id));
        }

        let (outline, failure) = match result {
            Ok(outline) if outline.series_id == series_id => (outline, None),
            Ok(outline) => (
                SeriesOutline::empty(series_id),
                Some(format!(
                    "Outline for series {} returned for series {}",
                    outline.series_id, series_id
                )),
            ),
            Err(e) => (SeriesOutline::empty(series_id), Some(e.to_string())),
        };

        let effect = match self.selection.on_outline_loaded(outline) {
            Ok(effect) => effect,
            Err(_) => return SessionEvent::Discarded(FetchScope::Outline(series_id)),
        };
        if let Some(effect) = effect {
            self.run_effect(effect);
        }

        match failure {
            Some(reason) => {
                warn!(series_id, error = %reason, "outline fetch failed");
                SessionEvent::OutlineFailed { series_id, reason }
            }
            None => {
                let season_count = self.selection.seasons().len();
                info!(series_id, season_count, "outline loaded");
                SessionEvent::OutlineLoaded {
                    series_id,
                    season_count,
                }
            }
        }
    }
}

impl std::fmt::Debug for DetailsSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetailsSession")
            .field("item", &self.item.as_ref().map(|i| i.id))
            .field("selection", &self.selection)
            .field("episodes", &self.episodes)
            .field("in_flight", &self.in_flight)
            .finish()
    }
}
