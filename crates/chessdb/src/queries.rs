//! One-shot queries over the stored backlog.
//!
//! These never wait for the live tail: they read what is stored when they
//! are called and finish.

use std::future::ready;

use chessdb_core::{fold_to_end, Reducer, StopOnErrorExt, TailItem};
use futures::stream::BoxStream;
use futures::StreamExt;
use fxhash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::event::{AuthorId, Event, EventKey, EventKind};
use crate::log::{EventLog, LogError};

/// Answer of [`game_has_player`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Participation {
    /// The player sent or received the invite.
    Player,
    /// The game exists and the player is not in it.
    NotPlayer,
    /// No invite with that id is stored.
    UnknownGame,
}

impl Participation {
    /// Returns `true` for [`Participation::Player`].
    #[must_use]
    pub fn is_player(self) -> bool {
        self == Self::Player
    }
}

/// Streams the id of every stored invite, each once.
///
/// The stream ends after the backlog, or after the first upstream failure.
pub fn all_games(log: &dyn EventLog) -> BoxStream<'static, Result<EventKey, LogError>> {
    let mut seen = FxHashSet::default();
    log.tail(EventKind::Invite, false)
        .filter_map(move |item| {
            ready(match item {
                Ok(TailItem::Record(invite)) => seen
                    .insert(invite.key.clone())
                    .then_some(Ok(invite.key)),
                Ok(TailItem::Sync) => None,
                Err(error) => Some(Err(error)),
            })
        })
        .boxed()
        .stop_on_error()
        .boxed()
}

/// Checks whether `player` sent or received the invite `game`.
///
/// # Errors
///
/// Propagates lookup failures from the log.
pub async fn game_has_player(
    log: &dyn EventLog,
    game: &EventKey,
    player: &AuthorId,
) -> Result<Participation, LogError> {
    Ok(match log.resolve(game).await? {
        None => Participation::UnknownGame,
        Some(invite) if invite.involves(player) => Participation::Player,
        Some(invite) if invite.as_invite().is_none() => {
            tracing::debug!(%game, kind = %invite.kind(), "key does not name an invite");
            Participation::UnknownGame
        }
        Some(_) => Participation::NotPlayer,
    })
}

/// How often `player` has played one opponent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayFrequency {
    /// The other side of the invites.
    pub opponent: AuthorId,
    /// Number of invites shared with the opponent.
    pub games: u32,
    /// Timestamp of the most recent shared invite.
    pub last_played: u64,
}

/// Fold counting invites per opponent.
#[derive(Debug, Clone)]
pub struct PlayFrequencyReducer {
    player: AuthorId,
}

impl PlayFrequencyReducer {
    /// Creates a reducer for `player`.
    #[must_use]
    pub fn new(player: AuthorId) -> Self {
        Self { player }
    }
}

impl Reducer for PlayFrequencyReducer {
    type Event = Event;
    type State = FxHashMap<AuthorId, (u32, u64)>;
    type Output = Vec<PlayFrequency>;

    fn apply(&self, state: &mut Self::State, event: &Event) {
        let Some(invite) = event.as_invite() else {
            return;
        };
        let opponent = if event.author == self.player {
            &invite.invitee
        } else if invite.invitee == self.player {
            &event.author
        } else {
            return;
        };
        if *opponent == self.player {
            return;
        }
        let entry = state.entry(opponent.clone()).or_insert((0, 0));
        entry.0 = entry.0.saturating_add(1);
        entry.1 = entry.1.max(event.timestamp);
    }

    fn project(&self, state: &Self::State) -> Vec<PlayFrequency> {
        let mut list: Vec<PlayFrequency> = state
            .iter()
            .map(|(opponent, &(games, last_played))| PlayFrequency {
                opponent: opponent.clone(),
                games,
                last_played,
            })
            .collect();
        list.sort_by(|a, b| {
            b.games
                .cmp(&a.games)
                .then_with(|| b.last_played.cmp(&a.last_played))
                .then_with(|| a.opponent.cmp(&b.opponent))
        });
        list
    }
}

/// Ranks `player`'s opponents by number of shared invites, most frequent
/// first. Ties go to the more recent opponent.
///
/// # Errors
///
/// Returns the first failure of the invite tail.
pub async fn weighted_play_frequency(
    log: &dyn EventLog,
    player: &AuthorId,
) -> Result<Vec<PlayFrequency>, LogError> {
    let reducer = PlayFrequencyReducer::new(player.clone());
    fold_to_end(&reducer, log.tail(EventKind::Invite, false)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Color, Content};
    use crate::log::EventTail;
    use crate::memory::MemoryLog;
    use async_trait::async_trait;
    use futures::stream;

    fn seeded() -> MemoryLog {
        let log = MemoryLog::new();
        log.append_all([
            Event::invite("%g1", "@a", "@b", Color::White, 10),
            Event::invite("%g2", "@c", "@a", Color::Black, 20),
            Event::invite("%g3", "@a", "@b", Color::White, 30),
            Event::invite("%g4", "@d", "@e", Color::White, 40),
            Event::invite("%g5", "@a", "@d", Color::Black, 50),
            Event::accept("%x1", "@b", "%g1", 11),
            Event::end("%e1", "@a", "%g1", 12),
        ]);
        log
    }

    #[tokio::test]
    async fn test_all_games_lists_every_invite() {
        let log = seeded();
        let mut ids: Vec<EventKey> = all_games(&log)
            .map(Result::unwrap)
            .collect()
            .await;
        ids.sort();
        let expected: Vec<EventKey> = ["%g1", "%g2", "%g3", "%g4", "%g5"]
            .into_iter()
            .map(EventKey::from)
            .collect();
        assert_eq!(ids, expected);
    }

    /// Log whose invite tail repeats a record, as a replica merge might.
    struct Repeating;

    #[async_trait]
    impl EventLog for Repeating {
        fn tail(&self, _kind: EventKind, _live: bool) -> EventTail {
            let invite = Event::invite("%g", "@a", "@b", Color::White, 1);
            stream::iter([
                Ok(TailItem::Record(invite.clone())),
                Ok(TailItem::Record(invite)),
                Ok(TailItem::Sync),
                Err(LogError::Closed),
                Ok(TailItem::Record(Event::invite("%h", "@a", "@b", Color::White, 2))),
            ])
            .boxed()
        }

        async fn resolve(&self, _key: &EventKey) -> Result<Option<Event>, LogError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_all_games_suppresses_duplicates_and_stops_on_error() {
        let ids: Vec<_> = all_games(&Repeating).collect().await;
        assert_eq!(ids, vec![Ok("%g".into()), Err(LogError::Closed)]);
    }

    #[tokio::test]
    async fn test_game_has_player() {
        let log = seeded();
        let g1 = EventKey::from("%g1");
        assert_eq!(
            game_has_player(&log, &g1, &"@b".into()).await,
            Ok(Participation::Player)
        );
        assert_eq!(
            game_has_player(&log, &g1, &"@c".into()).await,
            Ok(Participation::NotPlayer)
        );
        assert_eq!(
            game_has_player(&log, &"%nope".into(), &"@a".into()).await,
            Ok(Participation::UnknownGame)
        );
        assert_eq!(
            game_has_player(&log, &"%x1".into(), &"@b".into()).await,
            Ok(Participation::UnknownGame)
        );
        assert!(Participation::Player.is_player());
    }

    #[tokio::test]
    async fn test_weighted_play_frequency_ranking() {
        let log = seeded();
        let ranked = weighted_play_frequency(&log, &"@a".into()).await.unwrap();
        let order: Vec<(&str, u32)> = ranked
            .iter()
            .map(|f| (f.opponent.as_str(), f.games))
            .collect();
        assert_eq!(order, vec![("@b", 2), ("@d", 1), ("@c", 1)]);
        assert_eq!(ranked[0].last_played, 30);
    }

    #[tokio::test]
    async fn test_weighted_play_frequency_ignores_malformed_and_self() {
        let log = MemoryLog::new();
        log.append_all([
            Event::invite("%self", "@a", "@a", Color::White, 1),
            Event {
                key: "%bad".into(),
                author: "@a".into(),
                timestamp: 2,
                content: Content::Malformed(EventKind::Invite),
            },
        ]);
        let ranked = weighted_play_frequency(&log, &"@a".into()).await.unwrap();
        assert!(ranked.is_empty());
    }

    #[tokio::test]
    async fn test_weighted_play_frequency_fails_with_log() {
        let log = seeded();
        log.fail(LogError::Unavailable("offline".into()));
        let result = weighted_play_frequency(&log, &"@a".into()).await;
        assert_eq!(result, Err(LogError::Unavailable("offline".into())));
    }
}
