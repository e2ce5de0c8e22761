//! Finished games view.
//!
//! Unlike the other views this one keeps no accumulator. Every end record is
//! judged on its own: the invite it points at is resolved through the log
//! and the game id is passed on if the player took part.

use std::future::ready;
use std::sync::Arc;

use chessdb_core::{StopOnErrorExt, TailItem};
use futures::stream::BoxStream;
use futures::StreamExt;

use crate::event::{AuthorId, Event, EventKey, EventKind};
use crate::log::{EventLog, LogError};

/// Resolves the invite `end` refers to and returns its id if `player` sent or
/// received it.
///
/// # Errors
///
/// Propagates lookup failures from the log.
pub async fn finished_game(
    log: &dyn EventLog,
    player: &AuthorId,
    end: &Event,
) -> Result<Option<EventKey>, LogError> {
    let Some(game) = end.refers_to() else {
        tracing::debug!(key = %end.key, "end record has no game");
        return Ok(None);
    };
    match log.resolve(game).await? {
        Some(invite) if invite.involves(player) => Ok(Some(game.clone())),
        Some(_) => Ok(None),
        None => {
            tracing::debug!(%game, "ended game has no stored invite");
            Ok(None)
        }
    }
}

/// Streams the ids of `player`'s games as their end records are read.
///
/// Ends seen during backlog replay are emitted too. The stream ends after the
/// first upstream or lookup failure.
pub fn games_finished(
    log: Arc<dyn EventLog>,
    player: AuthorId,
    live: bool,
) -> BoxStream<'static, Result<EventKey, LogError>> {
    log.tail(EventKind::End, live)
        .then(move |item| {
            let log = Arc::clone(&log);
            let player = player.clone();
            async move {
                match item {
                    Ok(TailItem::Record(end)) => {
                        finished_game(log.as_ref(), &player, &end).await.transpose()
                    }
                    Ok(TailItem::Sync) => None,
                    Err(error) => Some(Err(error)),
                }
            }
        })
        .filter_map(ready)
        .boxed()
        .stop_on_error()
        .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Color;
    use crate::memory::MemoryLog;

    fn seeded() -> Arc<MemoryLog> {
        let log = Arc::new(MemoryLog::new());
        log.append_all([
            Event::invite("%g1", "@a", "@b", Color::White, 1),
            Event::invite("%g2", "@c", "@d", Color::White, 2),
            Event::invite("%g3", "@b", "@a", Color::Black, 3),
            Event::end("%e1", "@a", "%g1", 4),
            Event::end("%e2", "@c", "%g2", 5),
            Event::end("%e9", "@a", "%missing", 6),
            Event::end("%e3", "@b", "%g3", 7),
        ]);
        log
    }

    #[tokio::test]
    async fn test_emits_only_relevant_games() {
        let log = seeded();
        let ids: Vec<_> = games_finished(log, "@a".into(), false).collect().await;
        assert_eq!(ids, vec![Ok("%g1".into()), Ok("%g3".into())]);
    }

    #[tokio::test]
    async fn test_non_player_sees_nothing() {
        let ids: Vec<_> = games_finished(seeded(), "@z".into(), false).collect().await;
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn test_lookup_failure_ends_stream() {
        let log = seeded();
        let mut finished = games_finished(log.clone(), "@a".into(), true);
        assert_eq!(finished.next().await, Some(Ok("%g1".into())));
        assert_eq!(finished.next().await, Some(Ok("%g3".into())));

        log.fail(LogError::Unavailable("gone".into()));
        assert_eq!(
            finished.next().await,
            Some(Err(LogError::Unavailable("gone".into())))
        );
        assert_eq!(finished.next().await, None);
    }

    #[tokio::test]
    async fn test_live_end_after_backlog() {
        let log = Arc::new(MemoryLog::new());
        log.append(Event::invite("%g", "@a", "@b", Color::White, 1));
        let mut finished = games_finished(log.clone(), "@b".into(), true);

        log.append(Event::end("%e", "@a", "%g", 2));
        let next = tokio::time::timeout(std::time::Duration::from_secs(1), finished.next())
            .await
            .unwrap();
        assert_eq!(next, Some(Ok("%g".into())));
    }
}
