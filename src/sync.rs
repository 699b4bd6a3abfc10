//! Episode data synchronizer
//!
//! Keeps the committed episode list in step with the selected season while
//! season fetches complete in arbitrary order. Every fetch is tagged with the
//! [`SeasonKey`] it was issued for and the generation of the request; on
//! arrival both are compared with the request that is active at that moment
//! and mismatches are dropped. Re-selecting a season issues a new generation,
//! so an older fetch for the same season can never overwrite the newer one.

use crate::metadata_retrieval::{
    EpisodeRecord, MediaId, MetadataError, MetadataProvider, SeriesOutline,
};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

/// Identifies the episode list of one season of one series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeasonKey {
    pub series_id: MediaId,
    pub season: u32,
}

impl fmt::Display for SeasonKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/S{}", self.series_id, self.season)
    }
}

/// A finished fetch, tagged with what it was issued for.
#[derive(Debug)]
pub enum FetchCompletion {
    Outline {
        series_id: MediaId,
        result: Result<SeriesOutline, MetadataError>,
    },
    Season {
        key: SeasonKey,
        generation: u64,
        result: Result<Vec<EpisodeRecord>, MetadataError>,
    },
}

/// What happened to a season fetch result on arrival.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The episode list became the committed list
    Committed { key: SeasonKey, count: usize },
    /// The fetch failed; an empty list was committed in its place
    Failed { key: SeasonKey, reason: String },
    /// The result belongs to a season that is no longer selected
    Stale { key: SeasonKey },
}

/// Maps the active season key to its authoritative episode list.
pub struct EpisodeSynchronizer {
    provider: Arc<dyn MetadataProvider>,
    completions: UnboundedSender<FetchCompletion>,
    /// Key whose result will be committed on arrival
    active: Option<SeasonKey>,
    /// Generation of the latest request; bumped by every `request_season`
    generation: u64,
    /// List committed for `active`; `None` until its fetch lands
    committed: Option<Vec<EpisodeRecord>>,
}

impl EpisodeSynchronizer {
    /// Creates a synchronizer that delivers fetch results to `completions`.
    pub fn new(
        provider: Arc<dyn MetadataProvider>,
        completions: UnboundedSender<FetchCompletion>,
    ) -> Self {
        Self {
            provider,
            completions,
            active: None,
            generation: 0,
            committed: None,
        }
    }

    /// Starts fetching the episode list for `key` and makes it the active key.
    ///
    /// Returns immediately; the result arrives on the completion channel and
    /// must be handed to [`accept`](Self::accept). Must be called from within
    /// a Tokio runtime. A result of any earlier request becomes stale, even
    /// one for the same key. Returns the generation the fetch is tagged with.
    pub fn request_season(&mut self, key: SeasonKey) -> u64 {
        if self.active != Some(key) {
            self.committed = None;
        }
        self.active = Some(key);
        self.generation += 1;
        let generation = self.generation;

        debug!(
            series_id = key.series_id,
            season = key.season,
            generation,
            "requesting season"
        );

        let provider = Arc::clone(&self.provider);
        let completions = self.completions.clone();
        tokio::spawn(async move {
            let result = provider
                .fetch_season_episodes(key.series_id, key.season)
                .await;
            // The receiving session may be gone already
            let _ = completions.send(FetchCompletion::Season {
                key,
                generation,
                result,
            });
        });

        generation
    }

    /// Applies a season fetch result if it belongs to the latest request.
    ///
    /// Failures commit an empty list so the previous season's episodes never
    /// stay visible. Nothing here is ever returned as an error.
    pub fn accept(
        &mut self,
        key: SeasonKey,
        generation: u64,
        result: Result<Vec<EpisodeRecord>, MetadataError>,
    ) -> SyncOutcome {
        if self.active != Some(key) || self.generation != generation {
            debug!(
                series_id = key.series_id,
                season = key.season,
                generation,
                "dropping stale season result"
            );
            return SyncOutcome::Stale { key };
        }

        match result {
            Ok(episodes) => {
                let count = episodes.len();
                info!(series_id = key.series_id, season = key.season, count, "committed episode list");
                self.committed = Some(episodes);
                SyncOutcome::Committed { key, count }
            }
            Err(e) => {
                warn!(series_id = key.series_id, season = key.season, error = %e, "season fetch failed");
                self.committed = Some(Vec::new());
                SyncOutcome::Failed {
                    key,
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Looks up an episode in the committed list.
    ///
    /// `None` means "details unavailable": nothing committed yet, the fetch
    /// failed, or the number is not in the list.
    pub fn resolve_episode(&self, episode_number: u32) -> Option<&EpisodeRecord> {
        self.committed
            .as_deref()?
            .iter()
            .find(|e| e.episode_number == episode_number)
    }

    /// The committed list for the active key, if it has landed.
    pub fn episodes(&self) -> Option<&[EpisodeRecord]> {
        self.committed.as_deref()
    }

    pub fn active_key(&self) -> Option<SeasonKey> {
        self.active
    }

    /// Forgets the active key and committed list; any in-flight result
    /// becomes stale.
    pub fn clear(&mut self) {
        self.active = None;
        self.committed = None;
    }
}

impl fmt::Debug for EpisodeSynchronizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EpisodeSynchronizer")
            .field("active", &self.active)
            .field("generation", &self.generation)
            .field("committed", &self.committed.as_ref().map(Vec::len))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata_retrieval::{CatalogItem, MediaId};
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    /// Provider that never answers; these tests feed results by hand.
    struct SilentProvider;

    #[async_trait]
    impl MetadataProvider for SilentProvider {
        async fn search_catalog(&self, _query: &str) -> Result<Vec<CatalogItem>, MetadataError> {
            Ok(Vec::new())
        }

        async fn fetch_series_outline(
            &self,
            _series_id: MediaId,
        ) -> Result<SeriesOutline, MetadataError> {
            std::future::pending().await
        }

        async fn fetch_season_episodes(
            &self,
            _series_id: MediaId,
            _season: u32,
        ) -> Result<Vec<EpisodeRecord>, MetadataError> {
            std::future::pending().await
        }
    }

    fn synchronizer() -> EpisodeSynchronizer {
        let (tx, _rx) = mpsc::unbounded_channel();
        EpisodeSynchronizer::new(Arc::new(SilentProvider), tx)
    }

    fn episodes(count: u32) -> Vec<EpisodeRecord> {
        (1..=count)
            .map(|n| EpisodeRecord {
                episode_number: n,
                name: format!("Episode {n}"),
                overview: String::new(),
                air_date: None,
                rating: 0.0,
                crew: Vec::new(),
                guest_stars: Vec::new(),
            })
            .collect()
    }

    const S1: SeasonKey = SeasonKey {
        series_id: 1,
        season: 1,
    };
    const S2: SeasonKey = SeasonKey {
        series_id: 1,
        season: 2,
    };

    #[tokio::test]
    async fn test_resolve_before_and_after_commit() {
        let mut sync = synchronizer();
        let generation = sync.request_season(S1);
        assert!(sync.resolve_episode(1).is_none());

        let outcome = sync.accept(S1, generation, Ok(episodes(3)));
        assert_eq!(outcome, SyncOutcome::Committed { key: S1, count: 3 });
        assert_eq!(sync.resolve_episode(2).map(|e| e.name.as_str()), Some("Episode 2"));
        assert!(sync.resolve_episode(4).is_none());
    }

    #[tokio::test]
    async fn test_superseded_result_is_stale() {
        let mut sync = synchronizer();
        let first = sync.request_season(S1);
        let second = sync.request_season(S2);

        assert_eq!(
            sync.accept(S2, second, Ok(episodes(6))),
            SyncOutcome::Committed { key: S2, count: 6 }
        );
        assert_eq!(sync.accept(S1, first, Ok(episodes(10))), SyncOutcome::Stale { key: S1 });
        assert_eq!(sync.episodes().map(<[_]>::len), Some(6));
    }

    #[tokio::test]
    async fn test_older_request_for_reselected_season_is_stale() {
        let mut sync = synchronizer();
        let old = sync.request_season(S1);
        sync.request_season(S2);
        let fresh = sync.request_season(S1);

        sync.accept(S1, fresh, Ok(episodes(10)));
        let outcome = sync.accept(S1, old, Err(MetadataError::RequestError("timed out".into())));

        assert_eq!(outcome, SyncOutcome::Stale { key: S1 });
        assert_eq!(sync.resolve_episode(1).map(|e| e.name.as_str()), Some("Episode 1"));
    }

    #[tokio::test]
    async fn test_new_season_hides_previous_list() {
        let mut sync = synchronizer();
        let generation = sync.request_season(S1);
        sync.accept(S1, generation, Ok(episodes(10)));
        sync.request_season(S2);

        assert!(sync.episodes().is_none());
        assert!(sync.resolve_episode(1).is_none());
    }

    #[tokio::test]
    async fn test_failure_commits_empty_list() {
        let mut sync = synchronizer();
        let generation = sync.request_season(S1);
        let outcome = sync.accept(
            S1,
            generation,
            Err(MetadataError::RequestError("offline".to_string())),
        );

        assert!(matches!(outcome, SyncOutcome::Failed { key, .. } if key == S1));
        assert_eq!(sync.episodes(), Some(&[][..]));
        assert!(sync.resolve_episode(1).is_none());
    }

    #[test]
    fn test_result_without_request_is_stale() {
        let mut sync = synchronizer();
        assert_eq!(sync.accept(S1, 0, Ok(episodes(1))), SyncOutcome::Stale { key: S1 });
    }
}
