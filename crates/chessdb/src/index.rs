//! The main entry point: one call per view or query.

use std::sync::Arc;

use chessdb_core::{LiveView, Reducer};
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};

use crate::builder::ChessIndexBuilder;
use crate::config::IndexConfig;
use crate::error::IndexError;
use crate::event::{AuthorId, Event, EventKey, EventKind};
use crate::log::EventLog;
use crate::queries::{self, Participation, PlayFrequency};
use crate::views::{self, Direction, GameScope, GamesReducer, InviteSummary, PendingReducer};

/// Stream returned by every live view.
pub type ViewStream<T> = BoxStream<'static, Result<T, IndexError>>;

/// Materialized views over a chess event log.
///
/// Every call builds an independent pipeline with its own accumulator;
/// views share nothing but the log. A view ends when the consumer drops it
/// or after it yields an error.
///
/// # Example
///
/// ```rust,ignore
/// let log = Arc::new(MemoryLog::new());
/// let index = ChessIndex::new(log.clone());
/// let mut games = index.games_in_progress(&"@alice".into());
/// while let Some(snapshot) = games.next().await {
///     println!("{:?}", snapshot?);
/// }
/// ```
#[derive(Clone)]
pub struct ChessIndex {
    log: Arc<dyn EventLog>,
    config: IndexConfig,
}

impl std::fmt::Debug for ChessIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChessIndex")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ChessIndex {
    /// Creates an index over `log` with default settings.
    #[must_use]
    pub fn new(log: Arc<dyn EventLog>) -> Self {
        Self::with_config(log, IndexConfig::default())
    }

    /// Creates an index over `log` with custom settings.
    #[must_use]
    pub fn with_config(log: Arc<dyn EventLog>, config: IndexConfig) -> Self {
        Self { log, config }
    }

    /// Returns a builder.
    #[must_use]
    pub fn builder() -> ChessIndexBuilder {
        ChessIndexBuilder::new()
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Open invites `player` sent.
    pub fn pending_challenges_sent(&self, player: &AuthorId) -> ViewStream<Vec<InviteSummary>> {
        self.live_view(
            &[EventKind::Invite, EventKind::Accept],
            PendingReducer::new(player.clone(), Direction::Sent),
        )
    }

    /// Open invites `player` received.
    pub fn pending_challenges_received(
        &self,
        player: &AuthorId,
    ) -> ViewStream<Vec<InviteSummary>> {
        self.live_view(
            &[EventKind::Invite, EventKind::Accept],
            PendingReducer::new(player.clone(), Direction::Received),
        )
    }

    /// Live games `player` plays in.
    pub fn games_in_progress(&self, player: &AuthorId) -> ViewStream<Vec<EventKey>> {
        self.live_view(
            &EventKind::ALL,
            GamesReducer::new(player.clone(), GameScope::Playing),
        )
    }

    /// Live games `player` could watch.
    pub fn observable_games(&self, player: &AuthorId) -> ViewStream<Vec<EventKey>> {
        self.live_view(
            &EventKind::ALL,
            GamesReducer::new(player.clone(), GameScope::Observing),
        )
    }

    /// Ids of `player`'s games, one per end record.
    pub fn games_finished(&self, player: &AuthorId) -> ViewStream<EventKey> {
        views::games_finished(Arc::clone(&self.log), player.clone(), self.config.live)
            .map_err(IndexError::from)
            .boxed()
    }

    /// Every stored game id, once.
    pub fn all_games(&self) -> ViewStream<EventKey> {
        queries::all_games(self.log.as_ref())
            .map_err(IndexError::from)
            .boxed()
    }

    /// Whether `player` takes part in `game`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Log`] if the lookup fails.
    pub async fn game_has_player(
        &self,
        game: &EventKey,
        player: &AuthorId,
    ) -> Result<Participation, IndexError> {
        Ok(queries::game_has_player(self.log.as_ref(), game, player).await?)
    }

    /// `player`'s opponents ranked by shared invites.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Log`] if the backlog cannot be read.
    pub async fn weighted_play_frequency(
        &self,
        player: &AuthorId,
    ) -> Result<Vec<PlayFrequency>, IndexError> {
        Ok(queries::weighted_play_frequency(self.log.as_ref(), player).await?)
    }

    fn live_view<R, T>(&self, kinds: &[EventKind], reducer: R) -> ViewStream<Vec<T>>
    where
        R: Reducer<Event = Event, Output = Vec<T>> + Send + 'static,
        R::State: Send + 'static,
        T: PartialEq + Clone + Send + 'static,
    {
        let tails = kinds
            .iter()
            .map(|&kind| (kind, self.log.tail(kind, self.config.live)));
        tracing::debug!(?kinds, live = self.config.live, "opening view");
        LiveView::new(tails, reducer, self.config.dedup.equivalence::<T>())
            .map_err(IndexError::from)
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Color;
    use crate::memory::MemoryLog;

    fn snapshot_index(log: &Arc<MemoryLog>) -> ChessIndex {
        ChessIndex::builder().live(false).build(log.clone())
    }

    #[tokio::test]
    async fn test_empty_log_emits_one_empty_snapshot() {
        let log = Arc::new(MemoryLog::new());
        let index = snapshot_index(&log);
        let snapshots: Vec<_> = index.games_in_progress(&"@a".into()).collect().await;
        assert_eq!(snapshots, vec![Ok(vec![])]);
    }

    #[tokio::test]
    async fn test_backlog_folds_to_one_snapshot() {
        let log = Arc::new(MemoryLog::new());
        log.append_all([
            Event::invite("%g1", "@a", "@b", Color::White, 1),
            Event::invite("%g2", "@a", "@c", Color::White, 2),
            Event::accept("%x1", "@b", "%g1", 3),
        ]);
        let index = snapshot_index(&log);

        let sent: Vec<_> = index.pending_challenges_sent(&"@a".into()).collect().await;
        assert_eq!(sent.len(), 1);
        let open = sent[0].as_ref().unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].game_id, EventKey::from("%g2"));

        let playing: Vec<_> = index.games_in_progress(&"@b".into()).collect().await;
        assert_eq!(playing, vec![Ok(vec![EventKey::from("%g1")])]);

        let watching: Vec<_> = index.observable_games(&"@c".into()).collect().await;
        assert_eq!(watching, vec![Ok(vec![EventKey::from("%g1")])]);
    }

    #[tokio::test]
    async fn test_point_queries_through_facade() {
        let log = Arc::new(MemoryLog::new());
        log.append(Event::invite("%g", "@a", "@b", Color::White, 1));
        let index = ChessIndex::new(log.clone());

        assert_eq!(
            index.game_has_player(&"%g".into(), &"@a".into()).await,
            Ok(Participation::Player)
        );
        let ranked = index.weighted_play_frequency(&"@b".into()).await.unwrap();
        assert_eq!(ranked[0].opponent, AuthorId::from("@a"));

        let ids: Vec<_> = index.all_games().collect().await;
        assert_eq!(ids, vec![Ok(EventKey::from("%g"))]);
    }

    #[tokio::test]
    async fn test_log_fault_surfaces_as_index_error() {
        let log = Arc::new(MemoryLog::new());
        log.fail(crate::log::LogError::Closed);
        let index = ChessIndex::new(log.clone());
        let items: Vec<_> = index.games_in_progress(&"@a".into()).collect().await;
        assert_eq!(items, vec![Err(IndexError::Log(crate::log::LogError::Closed))]);
    }
}
